//! Turns the raw simulation form into a validated request and submits it.

use log::{debug, warn};

use crate::gateway::{HttpGateway, NotifyKind, SimulateStatus, UiSink};
use crate::mods::parse_mods;
use crate::utils::{parse_optional_int, parse_percentage, resolve_beatmap_id};
use crate::{
    Accuracy, SimulateError, SimulationParams, SimulationRequest, SimulationResult,
    ValidationError,
};

/// Field values exactly as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub beatmap: String,
    pub accuracy: String,
    pub good: String,
    pub meh: String,
    pub combo: String,
    pub misses: String,
    pub mods: String,
}

/// Validates [`RawFields`] into a [`SimulationRequest`] without any network access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationRequestBuilder {
    fields: RawFields,
}

impl From<RawFields> for SimulationRequestBuilder {
    fn from(fields: RawFields) -> Self {
        Self { fields }
    }
}

impl SimulationRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beatmap(mut self, value: impl Into<String>) -> Self {
        self.fields.beatmap = value.into();
        self
    }

    pub fn accuracy(mut self, value: impl Into<String>) -> Self {
        self.fields.accuracy = value.into();
        self
    }

    pub fn hit_counts(mut self, good: impl Into<String>, meh: impl Into<String>) -> Self {
        self.fields.good = good.into();
        self.fields.meh = meh.into();
        self
    }

    pub fn combo(mut self, value: impl Into<String>) -> Self {
        self.fields.combo = value.into();
        self
    }

    pub fn misses(mut self, value: impl Into<String>) -> Self {
        self.fields.misses = value.into();
        self
    }

    pub fn mods(mut self, value: impl Into<String>) -> Self {
        self.fields.mods = value.into();
        self
    }

    pub fn fields(&self) -> &RawFields {
        &self.fields
    }

    /// Build the request; the first failing check wins.
    ///
    /// # Order
    /// 1. Beatmap id (literal or URL)
    /// 2. Accuracy (percentage, else hit counts)
    /// 3. Combo and misses, dropped silently when unparsable
    /// 4. Mods
    pub fn build(&self) -> Result<SimulationRequest, ValidationError> {
        let fields = &self.fields;

        let beatmap_id =
            resolve_beatmap_id(&fields.beatmap).ok_or(ValidationError::InvalidBeatmap)?;
        let accuracy = resolve_accuracy(fields)?;
        let combo = parse_optional_int::<u32>(&fields.combo);
        let misses = parse_optional_int::<u32>(&fields.misses);
        let mods = parse_mods(&fields.mods)?;

        Ok(SimulationRequest {
            beatmap_id,
            params: SimulationParams {
                accuracy,
                mods,
                combo,
                misses,
            },
        })
    }
}

fn resolve_accuracy(fields: &RawFields) -> Result<Accuracy, ValidationError> {
    if let Some(pct) = parse_percentage(&fields.accuracy) {
        if !(0.0..=100.0).contains(&pct) {
            return Err(ValidationError::AccuracyOutOfRange(pct));
        }
        return Ok(Accuracy::Percentage(pct));
    }

    let good = parse_optional_int::<u32>(&fields.good);
    let meh = parse_optional_int::<u32>(&fields.meh);
    if good.is_none() && meh.is_none() {
        return Err(ValidationError::MissingAccuracy);
    }

    Ok(Accuracy::HitCounts {
        good: good.unwrap_or(0),
        meh: meh.unwrap_or(0),
    })
}

async fn simulate<G: HttpGateway>(
    gateway: &G,
    builder: &SimulationRequestBuilder,
) -> Result<SimulationResult, SimulateError> {
    let request = builder.build()?;
    debug!("Simulating beatmap {} with {:?}", request.beatmap_id, request.params);

    let response = gateway.simulate(&request).await?;
    match (response.status, response.results) {
        (SimulateStatus::Ok, Some(results)) => Ok(results),
        (status, _) => {
            warn!("Simulation of beatmap {} failed: {:?}", request.beatmap_id, status);
            Err(SimulateError::Computation)
        }
    }
}

/// Validate the form, send exactly one simulate request and report the outcome.
///
/// Validation failures never reach the gateway. Every failure is also sent to
/// the sink as a non-persistent error notification.
pub async fn submit_simulation<G: HttpGateway, S: UiSink>(
    gateway: &G,
    sink: &S,
    builder: &SimulationRequestBuilder,
) -> Result<SimulationResult, SimulateError> {
    let outcome = simulate(gateway, builder).await;
    match &outcome {
        Ok(result) => sink.on_simulation_result(result),
        Err(err) => sink.on_notify(NotifyKind::Error, &err.to_string(), false),
    }
    outcome
}
