use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod config;
pub mod gateway;
pub mod mods;
pub mod poller;
pub mod sessions;
pub mod simulation;
pub mod utils;

#[cfg(test)]
mod testing;

pub use gateway::{Delay, HttpGateway, NotifyKind, UiSink};
pub use mods::ModToken;
pub use poller::{PollOutcome, PollState, RecalcPoller};
pub use simulation::{submit_simulation, RawFields, SimulationRequestBuilder};

use config::{POLL_INTERVAL_MS, PP_CHECK_PATH, PP_REQUEST_PATH, PROFILE_PATH, SIMULATE_PATH};

/// Status of a recalculation job as reported by the server.
///
/// Unknown values are kept verbatim instead of failing deserialization, so a
/// newer server cannot break the polling loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum JobStatus {
    Accepted,
    Pending,
    Calculating,
    Done,
    Error,
    CantForce,
    Unknown(String),
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "accepted" => JobStatus::Accepted,
            "pending" => JobStatus::Pending,
            "calculating" => JobStatus::Calculating,
            "done" => JobStatus::Done,
            "error" => JobStatus::Error,
            "cant_force" => JobStatus::CantForce,
            _ => JobStatus::Unknown(raw),
        }
    }
}

impl JobStatus {
    /// `done` and `error` end a polling session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Accepted => write!(f, "accepted"),
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Calculating => write!(f, "calculating"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Error => write!(f, "error"),
            JobStatus::CantForce => write!(f, "cant_force"),
            JobStatus::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// Accuracy of a simulated play.
///
/// Either a *Percentage*, or the number of non-perfect hits of the play:
/// good (100s) and meh (50s). Serialized untagged, the way the scoring
/// endpoint expects it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Accuracy {
    Percentage(f64),
    HitCounts { good: u32, meh: u32 },
}

/// Everything the scoring endpoint needs to simulate a play, apart from the beatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub accuracy: Accuracy,
    pub mods: Vec<ModToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combo: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub misses: Option<u32>,
}

/// Body of `POST /simulate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub beatmap_id: u64,
    pub params: SimulationParams,
}

/// Judgement counts and combo figures of a simulated play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayInfo {
    pub accuracy: f64,
    pub combo: u32,
    pub max_combo: u32,
    #[serde(default)]
    pub great: u32,
    #[serde(default)]
    pub good: u32,
    #[serde(default)]
    pub meh: u32,
    #[serde(default)]
    pub miss: u32,
}

/// The result of a play simulation, rendered as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub beatmap_info: String,
    pub mods: Vec<ModToken>,
    pub play_info: PlayInfo,
    #[serde(default)]
    pub category_attribs: BTreeMap<String, f64>,
    pub pp: f64,
}

impl SimulationResult {
    pub fn accuracy(&self) -> f64 {
        self.play_info.accuracy
    }

    pub fn combo(&self) -> u32 {
        self.play_info.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.play_info.max_combo
    }
}

/// Input rejected before anything is sent to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidBeatmap,
    AccuracyOutOfRange(f64),
    MissingAccuracy,
    InvalidMods(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidBeatmap => {
                write!(f, "Beatmap field invalid: use a beatmap id or a beatmap URL")
            }
            ValidationError::AccuracyOutOfRange(pct) => {
                write!(f, "Accuracy out of range: {} (must be 0-100)", pct)
            }
            ValidationError::MissingAccuracy => {
                write!(f, "Fill either accuracy or hit counts (100s/50s)")
            }
            ValidationError::InvalidMods(token) => {
                write!(f, "Mods field invalid: unknown mod '{}'", token)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// A request that never produced a usable answer.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The request could not be sent or the connection failed.
    Network(String),
    /// The server answered with a non-success HTTP status.
    Status(u16),
    /// The body was not the JSON we expected.
    Decode(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(msg) => write!(f, "Network error: {}", msg),
            TransportError::Status(code) => write!(f, "Server answered with HTTP {}", code),
            TransportError::Decode(msg) => write!(f, "Malformed server response: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Why a simulation submission produced no result.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulateError {
    Validation(ValidationError),
    Computation,
    Transport(TransportError),
}

impl fmt::Display for SimulateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulateError::Validation(err) => write!(f, "{}", err),
            SimulateError::Computation => write!(f, "Error while simulating the play"),
            SimulateError::Transport(err) => write!(f, "Could not reach the server ({})", err),
        }
    }
}

impl std::error::Error for SimulateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulateError::Validation(err) => Some(err),
            SimulateError::Transport(err) => Some(err),
            SimulateError::Computation => None,
        }
    }
}

impl From<ValidationError> for SimulateError {
    fn from(err: ValidationError) -> Self {
        SimulateError::Validation(err)
    }
}

impl From<TransportError> for SimulateError {
    fn from(err: TransportError) -> Self {
        SimulateError::Transport(err)
    }
}

/// A recalculation that was refused before it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    EmptyUser,
    AlreadyPolling(String),
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollError::EmptyUser => write!(f, "User name cannot be empty"),
            PollError::AlreadyPolling(user) => {
                write!(f, "A recalculation for '{}' is already being tracked", user)
            }
        }
    }
}

impl std::error::Error for PollError {}

/// Where the client talks to and how often it polls.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Prefix for every endpoint; empty means same origin.
    pub base_url: String,
    pub poll_interval_ms: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            poll_interval_ms: POLL_INTERVAL_MS,
        }
    }
}

impl ClientConfig {
    pub fn request_url(&self, user: &str, force: bool) -> String {
        format!(
            "{}{}?user={}&force={}",
            self.base_url,
            PP_REQUEST_PATH,
            urlencoding::encode(user),
            force
        )
    }

    pub fn check_url(&self, user: &str) -> String {
        format!("{}{}?user={}", self.base_url, PP_CHECK_PATH, urlencoding::encode(user))
    }

    pub fn simulate_url(&self) -> String {
        format!("{}{}", self.base_url, SIMULATE_PATH)
    }

    /// Profile page the browser is sent to once the recalculation is done.
    pub fn profile_url(&self, user: &str) -> String {
        format!("{}{}?user={}", self.base_url, PROFILE_PATH, urlencoding::encode(user))
    }
}
