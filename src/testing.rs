//! In-memory gateway, delay and sink used by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use crate::gateway::{
    Delay, HttpGateway, NotifyKind, RecalcResponse, SimulateResponse, StatusResponse, UiSink,
};
use crate::{JobStatus, SimulationRequest, SimulationResult, TransportError};

pub fn status(status: JobStatus, pos: Option<u32>) -> Result<StatusResponse, TransportError> {
    Ok(StatusResponse { status, pos })
}

#[derive(Default)]
pub struct MockGateway {
    pub recalc: RefCell<Option<Result<RecalcResponse, TransportError>>>,
    pub checks: RefCell<VecDeque<Result<StatusResponse, TransportError>>>,
    pub simulate_answer: RefCell<Option<Result<SimulateResponse, TransportError>>>,
    pub recalc_calls: RefCell<Vec<(String, bool)>>,
    pub check_calls: Cell<usize>,
    pub simulate_calls: RefCell<Vec<SimulationRequest>>,
}

impl MockGateway {
    pub fn recalc_answer(status: JobStatus, remaining: Option<u64>) -> Self {
        let gateway = Self::default();
        *gateway.recalc.borrow_mut() = Some(Ok(RecalcResponse { status, remaining }));
        gateway
    }

    pub fn with_checks(self, checks: Vec<Result<StatusResponse, TransportError>>) -> Self {
        *self.checks.borrow_mut() = checks.into();
        self
    }

    pub fn with_simulate(self, answer: Result<SimulateResponse, TransportError>) -> Self {
        *self.simulate_answer.borrow_mut() = Some(answer);
        self
    }
}

fn unscripted<T>(call: &str) -> Result<T, TransportError> {
    Err(TransportError::Network(format!("no {} answer scripted", call)))
}

impl HttpGateway for MockGateway {
    async fn request_recalc(
        &self,
        user: &str,
        force: bool,
    ) -> Result<RecalcResponse, TransportError> {
        self.recalc_calls.borrow_mut().push((user.to_string(), force));
        self.recalc
            .borrow_mut()
            .take()
            .unwrap_or_else(|| unscripted("recalc"))
    }

    async fn check_status(&self, _user: &str) -> Result<StatusResponse, TransportError> {
        self.check_calls.set(self.check_calls.get() + 1);
        self.checks
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| unscripted("check"))
    }

    async fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulateResponse, TransportError> {
        self.simulate_calls.borrow_mut().push(request.clone());
        self.simulate_answer
            .borrow_mut()
            .take()
            .unwrap_or_else(|| unscripted("simulate"))
    }
}

/// Returns immediately, remembering every requested wait.
#[derive(Default)]
pub struct InstantDelay {
    pub waits: RefCell<Vec<u32>>,
    /// Cancel this user's session when the n-th wait (1-based) starts.
    pub cancel_on_wait: Option<(usize, String)>,
}

impl Delay for InstantDelay {
    async fn wait(&self, ms: u32) {
        self.waits.borrow_mut().push(ms);
        if let Some((n, user)) = &self.cancel_on_wait {
            if self.waits.borrow().len() == *n {
                crate::sessions::cancel(user);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Notify(NotifyKind, String, bool),
    Success(String),
    Failure(String),
    Result(SimulationResult),
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: RefCell<Vec<UiEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.borrow().clone()
    }

    pub fn terminal_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, UiEvent::Success(_) | UiEvent::Failure(_)))
            .count()
    }
}

impl UiSink for RecordingSink {
    fn on_notify(&self, kind: NotifyKind, message: &str, persistent: bool) {
        self.events
            .borrow_mut()
            .push(UiEvent::Notify(kind, message.to_string(), persistent));
    }

    fn on_terminal_success(&self, redirect_url: &str) {
        self.events.borrow_mut().push(UiEvent::Success(redirect_url.to_string()));
    }

    fn on_terminal_failure(&self, message: &str) {
        self.events.borrow_mut().push(UiEvent::Failure(message.to_string()));
    }

    fn on_simulation_result(&self, result: &SimulationResult) {
        self.events.borrow_mut().push(UiEvent::Result(result.clone()));
    }
}
