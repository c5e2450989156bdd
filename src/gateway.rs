//! Seams between the client logic and the outside world.
//!
//! The polling loop and the simulation submission only talk to the network
//! through [`HttpGateway`], wait through [`Delay`] and report through
//! [`UiSink`]. The browser implementations live in [`browser`]; tests plug in
//! in-memory versions.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{JobStatus, SimulationRequest, SimulationResult, TransportError};

/// Answer of `GET /pp_request`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecalcResponse {
    pub status: JobStatus,
    /// Seconds until a forced recalculation is allowed again (`cant_force` only).
    #[serde(default)]
    pub remaining: Option<u64>,
}

/// Answer of `GET /pp_check`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResponse {
    pub status: JobStatus,
    /// Queue position, meaningful only while `pending`.
    #[serde(default)]
    pub pos: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulateStatus {
    Ok,
    Error,
    #[serde(other)]
    Unknown,
}

/// Answer of `POST /simulate`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulateResponse {
    pub status: SimulateStatus,
    #[serde(default)]
    pub results: Option<SimulationResult>,
}

/// Decode a JSON response body.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, TransportError> {
    serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))
}

/// Performs the actual requests against the recalculation service.
#[allow(async_fn_in_trait)]
pub trait HttpGateway {
    async fn request_recalc(
        &self,
        user: &str,
        force: bool,
    ) -> Result<RecalcResponse, TransportError>;

    async fn check_status(&self, user: &str) -> Result<StatusResponse, TransportError>;

    async fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulateResponse, TransportError>;
}

/// Suspends the current task between two poll ticks.
#[allow(async_fn_in_trait)]
pub trait Delay {
    async fn wait(&self, ms: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Info,
    Error,
}

impl NotifyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyKind::Info => "info",
            NotifyKind::Error => "error",
        }
    }
}

/// Receives everything the user should see.
pub trait UiSink {
    fn on_notify(&self, kind: NotifyKind, message: &str, persistent: bool);

    /// The recalculation finished; the browser should go to `redirect_url`.
    fn on_terminal_success(&self, redirect_url: &str);

    fn on_terminal_failure(&self, message: &str);

    fn on_simulation_result(&self, result: &SimulationResult);
}

/// `fetch`-backed gateway and timer-backed delay; only functional in a browser.
pub mod browser {
    use log::debug;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, Response};

    use super::{decode, Delay, HttpGateway, RecalcResponse, SimulateResponse, StatusResponse};
    use crate::{ClientConfig, SimulationRequest, TransportError};

    fn describe(err: &JsValue) -> String {
        err.as_string().unwrap_or_else(|| format!("{:?}", err))
    }

    #[derive(Debug, Clone, Default)]
    pub struct FetchGateway {
        config: ClientConfig,
    }

    impl FetchGateway {
        pub fn new(config: ClientConfig) -> Self {
            Self { config }
        }

        async fn send(&self, request: Request) -> Result<String, TransportError> {
            let started = js_sys::Date::now();
            let url = request.url();

            let value = JsFuture::from(gloo_utils::window().fetch_with_request(&request))
                .await
                .map_err(|e| TransportError::Network(describe(&e)))?;
            let response: Response = value
                .dyn_into()
                .map_err(|_| {
                    TransportError::Network("fetch did not yield a Response".to_string())
                })?;

            if !response.ok() {
                return Err(TransportError::Status(response.status()));
            }

            let text_promise = response
                .text()
                .map_err(|e| TransportError::Decode(describe(&e)))?;
            let body = JsFuture::from(text_promise)
                .await
                .map_err(|e| TransportError::Decode(describe(&e)))?;

            debug!("{} answered in {:.0} ms", url, js_sys::Date::now() - started);

            body.as_string()
                .ok_or_else(|| TransportError::Decode("response body is not text".to_string()))
        }

        async fn get(&self, url: &str) -> Result<String, TransportError> {
            let request =
                Request::new_with_str(url).map_err(|e| TransportError::Network(describe(&e)))?;
            self.send(request).await
        }
    }

    impl HttpGateway for FetchGateway {
        async fn request_recalc(
            &self,
            user: &str,
            force: bool,
        ) -> Result<RecalcResponse, TransportError> {
            let body = self.get(&self.config.request_url(user, force)).await?;
            decode(&body)
        }

        async fn check_status(&self, user: &str) -> Result<StatusResponse, TransportError> {
            let body = self.get(&self.config.check_url(user)).await?;
            decode(&body)
        }

        async fn simulate(
            &self,
            request: &SimulationRequest,
        ) -> Result<SimulateResponse, TransportError> {
            let payload =
                serde_json::to_string(request).map_err(|e| TransportError::Decode(e.to_string()))?;

            let init = RequestInit::new();
            init.set_method("POST");
            init.set_body(&JsValue::from_str(&payload));

            let request = Request::new_with_str_and_init(&self.config.simulate_url(), &init)
                .map_err(|e| TransportError::Network(describe(&e)))?;
            request
                .headers()
                .set("Content-Type", "application/json")
                .map_err(|e| TransportError::Network(describe(&e)))?;

            let body = self.send(request).await?;
            decode(&body)
        }
    }

    /// Waits on a browser timer without blocking the event loop.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct TimeoutDelay;

    impl Delay for TimeoutDelay {
        async fn wait(&self, ms: u32) {
            gloo_timers::future::TimeoutFuture::new(ms).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_cooldown_answer() {
        let resp: RecalcResponse = decode(r#"{"status":"cant_force","remaining":120}"#).unwrap();
        assert_eq!(resp.status, JobStatus::CantForce);
        assert_eq!(resp.remaining, Some(120));

        let resp: RecalcResponse = decode(r#"{"status":"accepted"}"#).unwrap();
        assert_eq!(resp.status, JobStatus::Accepted);
        assert_eq!(resp.remaining, None);
    }

    #[test]
    fn decodes_queue_position() {
        let resp: StatusResponse = decode(r#"{"status":"pending","pos":4}"#).unwrap();
        assert_eq!(resp.status, JobStatus::Pending);
        assert_eq!(resp.pos, Some(4));
    }

    #[test]
    fn decodes_simulate_error_without_results() {
        let resp: SimulateResponse = decode(r#"{"status":"error"}"#).unwrap();
        assert_eq!(resp.status, SimulateStatus::Error);
        assert!(resp.results.is_none());

        let resp: SimulateResponse = decode(r#"{"status":"busy"}"#).unwrap();
        assert_eq!(resp.status, SimulateStatus::Unknown);
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = decode::<StatusResponse>("<html>502</html>").unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }
}
