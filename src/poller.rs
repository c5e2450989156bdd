//! Recalculation request and status polling.
//!
//! One call to [`RecalcPoller::start`] sends the initiating request, then
//! checks the job status every `poll_interval_ms` until the server reports a
//! terminal status. The loop state is an explicit [`PollState`] value that is
//! folded over each status answer, so the notification rules can be tested
//! without a network or a timer.

use log::{debug, info, warn};

use crate::gateway::{Delay, HttpGateway, NotifyKind, StatusResponse, UiSink};
use crate::sessions::{self, SessionGuard};
use crate::utils::normalize_user;
use crate::{ClientConfig, JobStatus, PollError, TransportError};

pub const CALCULATION_ERROR_MESSAGE: &str = "Error while calculating";
pub const UNREACHABLE_MESSAGE: &str = "Could not reach the server, please try again";

/// What one poll session remembers between ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    pub user: String,
    pub last_status: Option<JobStatus>,
    pub last_queue_pos: Option<u32>,
}

/// A message for the user produced by a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotifyKind,
    pub message: String,
    pub persistent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not finished; poll again with this state.
    Continue(PollState),
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub notification: Option<Notification>,
    pub outcome: TickOutcome,
}

impl PollState {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            last_status: None,
            last_queue_pos: None,
        }
    }

    /// Fold one status answer into the state.
    ///
    /// A notification is produced when the status changed, or when it is
    /// still `pending` but the queue position moved. `done` and `error` end
    /// the session; their terminal event is reported by the caller. Any other
    /// status, including unknown ones, keeps polling.
    pub fn advance(self, response: &StatusResponse) -> Tick {
        let status = &response.status;

        match status {
            JobStatus::Done => {
                return Tick {
                    notification: None,
                    outcome: TickOutcome::Done,
                }
            }
            JobStatus::Error => {
                return Tick {
                    notification: None,
                    outcome: TickOutcome::Failed,
                }
            }
            _ => {}
        }

        let changed = self.last_status.as_ref() != Some(status);
        let is_pending = *status == JobStatus::Pending;
        let moved = is_pending && self.last_queue_pos != response.pos;

        let notification = if changed || moved {
            Some(status_notification(status, response.pos))
        } else {
            None
        };

        let last_queue_pos = if is_pending {
            response.pos
        } else {
            self.last_queue_pos
        };

        Tick {
            notification,
            outcome: TickOutcome::Continue(PollState {
                user: self.user,
                last_status: Some(status.clone()),
                last_queue_pos,
            }),
        }
    }
}

fn status_notification(status: &JobStatus, pos: Option<u32>) -> Notification {
    let (message, persistent) = match (status, pos) {
        (JobStatus::Pending, Some(pos)) => (format!("In queue... (position {})", pos), false),
        (JobStatus::Pending, None) => ("In queue...".to_string(), false),
        (JobStatus::Calculating, _) => ("Calculating new PP...".to_string(), true),
        (other, _) => (format!("Waiting for the server (status: {})...", other), false),
    };

    Notification {
        kind: NotifyKind::Info,
        message,
        persistent,
    }
}

/// How a recalculation session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Profile is up to date; the sink was sent to this URL.
    Redirected(String),
    /// A forced recalculation was refused; `remaining` seconds of cooldown left.
    Cooldown { remaining: Option<u64> },
    Failed,
    Unreachable(TransportError),
    /// Stopped through [`sessions::cancel`]; no terminal event was emitted.
    Cancelled,
}

pub fn cooldown_message(remaining: Option<u64>) -> String {
    match remaining {
        Some(secs) => format!(
            "You can't force a recalculation yet, try again in {} seconds",
            secs
        ),
        None => "You can't force a recalculation yet, try again later".to_string(),
    }
}

/// Drives recalculation sessions against a gateway and reports to a sink.
pub struct RecalcPoller<G, D, S> {
    gateway: G,
    delay: D,
    sink: S,
    config: ClientConfig,
}

impl<G: HttpGateway, D: Delay, S: UiSink> RecalcPoller<G, D, S> {
    pub fn new(gateway: G, delay: D, sink: S, config: ClientConfig) -> Self {
        Self {
            gateway,
            delay,
            sink,
            config,
        }
    }

    #[cfg(test)]
    pub(crate) fn gateway(&self) -> &G {
        &self.gateway
    }

    #[cfg(test)]
    pub(crate) fn delay(&self) -> &D {
        &self.delay
    }

    #[cfg(test)]
    pub(crate) fn sink(&self) -> &S {
        &self.sink
    }

    /// Request a recalculation for `user` and follow it to the end.
    ///
    /// Refuses to start, without touching the network or the sink, when the
    /// user name is empty or a session for the same user is still running.
    /// Otherwise exactly one terminal event reaches the sink, unless the
    /// session is cancelled.
    pub async fn start(&self, user: &str, force: bool) -> Result<PollOutcome, PollError> {
        let user = normalize_user(user);
        if user.is_empty() {
            return Err(PollError::EmptyUser);
        }

        let session = sessions::acquire(&user).ok_or_else(|| {
            warn!("Recalculation for {} is already being polled", user);
            PollError::AlreadyPolling(user.clone())
        })?;

        info!(
            "Starting recalculation session {} for {} (force: {})",
            session.id(),
            user,
            force
        );
        let outcome = self.run(&session, force).await;
        info!("Session {} for {} ended: {:?}", session.id(), user, outcome);

        Ok(outcome)
    }

    async fn run(&self, session: &SessionGuard, force: bool) -> PollOutcome {
        let user = session.user();

        let response = match self.gateway.request_recalc(user, force).await {
            Ok(response) => response,
            Err(err) => return self.unreachable(err),
        };
        if session.is_cancelled() {
            return PollOutcome::Cancelled;
        }

        match response.status {
            JobStatus::Done => return self.succeed(user),
            JobStatus::CantForce => {
                self.sink
                    .on_terminal_failure(&cooldown_message(response.remaining));
                return PollOutcome::Cooldown {
                    remaining: response.remaining,
                };
            }
            other => debug!("Recalculation for {} {}, waiting...", user, other),
        }

        let mut state = PollState::new(user);
        loop {
            let response = match self.gateway.check_status(user).await {
                Ok(response) => response,
                Err(err) => return self.unreachable(err),
            };
            if session.is_cancelled() {
                return PollOutcome::Cancelled;
            }

            debug!("{}: {} (pos {:?})", user, response.status, response.pos);
            let tick = state.advance(&response);

            if let Some(notification) = &tick.notification {
                self.sink.on_notify(
                    notification.kind,
                    &notification.message,
                    notification.persistent,
                );
            }

            match tick.outcome {
                TickOutcome::Continue(next) => state = next,
                TickOutcome::Done => return self.succeed(user),
                TickOutcome::Failed => {
                    warn!("Recalculation for {} failed on the server", user);
                    self.sink.on_terminal_failure(CALCULATION_ERROR_MESSAGE);
                    return PollOutcome::Failed;
                }
            }

            self.delay.wait(self.config.poll_interval_ms).await;
            if session.is_cancelled() {
                return PollOutcome::Cancelled;
            }
        }
    }

    fn succeed(&self, user: &str) -> PollOutcome {
        let url = self.config.profile_url(user);
        self.sink.on_terminal_success(&url);
        PollOutcome::Redirected(url)
    }

    fn unreachable(&self, err: TransportError) -> PollOutcome {
        warn!("Recalculation request failed: {}", err);
        self.sink.on_terminal_failure(UNREACHABLE_MESSAGE);
        PollOutcome::Unreachable(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{status, InstantDelay, MockGateway, RecordingSink, UiEvent};
    use futures::executor::block_on;

    fn poller(gateway: MockGateway) -> RecalcPoller<MockGateway, InstantDelay, RecordingSink> {
        RecalcPoller::new(
            gateway,
            InstantDelay::default(),
            RecordingSink::default(),
            ClientConfig::default(),
        )
    }

    fn pending(pos: u32) -> StatusResponse {
        StatusResponse {
            status: JobStatus::Pending,
            pos: Some(pos),
        }
    }

    #[test]
    fn stable_queue_position_is_not_repeated() {
        let state = PollState::new("rafis");

        let tick = state.advance(&pending(5));
        assert!(tick.notification.is_some());
        let TickOutcome::Continue(state) = tick.outcome else {
            panic!("pending must keep polling");
        };
        assert_eq!(state.last_queue_pos, Some(5));

        let tick = state.advance(&pending(5));
        assert!(tick.notification.is_none());
        let TickOutcome::Continue(state) = tick.outcome else {
            panic!("pending must keep polling");
        };

        let tick = state.advance(&pending(3));
        assert_eq!(
            tick.notification.map(|n| n.message),
            Some("In queue... (position 3)".to_string())
        );
    }

    #[test]
    fn calculating_notifies_once() {
        let state = PollState::new("rafis");
        let calculating = StatusResponse {
            status: JobStatus::Calculating,
            pos: None,
        };

        let tick = state.advance(&calculating);
        let n = tick.notification.clone().unwrap();
        assert_eq!(n.message, "Calculating new PP...");
        assert!(n.persistent);

        let TickOutcome::Continue(state) = tick.outcome else {
            panic!("calculating must keep polling");
        };
        assert!(state.clone().advance(&calculating).notification.is_none());
        assert_eq!(state.last_status, Some(JobStatus::Calculating));
    }

    #[test]
    fn unknown_status_keeps_polling() {
        let tick = PollState::new("rafis").advance(&StatusResponse {
            status: JobStatus::Unknown("paused".to_string()),
            pos: None,
        });
        assert!(matches!(tick.outcome, TickOutcome::Continue(_)));
        assert!(tick.notification.unwrap().message.contains("paused"));
    }

    #[test]
    fn queue_then_done_fires_three_notifications() {
        let gateway = MockGateway::recalc_answer(JobStatus::Accepted, None).with_checks(vec![
            status(JobStatus::Pending, Some(5)),
            status(JobStatus::Pending, Some(5)),
            status(JobStatus::Pending, Some(3)),
            status(JobStatus::Done, None),
        ]);
        let poller = poller(gateway);

        let outcome = block_on(poller.start("Rafis", false)).unwrap();

        assert_eq!(outcome, PollOutcome::Redirected("/pp?user=rafis".to_string()));
        assert_eq!(
            poller.sink().events(),
            vec![
                UiEvent::Notify(NotifyKind::Info, "In queue... (position 5)".to_string(), false),
                UiEvent::Notify(NotifyKind::Info, "In queue... (position 3)".to_string(), false),
                UiEvent::Success("/pp?user=rafis".to_string()),
            ]
        );
        assert_eq!(poller.gateway().check_calls.get(), 4);
        assert_eq!(*poller.delay().waits.borrow(), vec![2000, 2000, 2000]);
        assert_eq!(
            *poller.gateway().recalc_calls.borrow(),
            vec![("rafis".to_string(), false)]
        );
        assert!(!sessions::is_active("rafis"));
    }

    #[test]
    fn cant_force_never_polls() {
        let poller = poller(MockGateway::recalc_answer(JobStatus::CantForce, Some(300)));

        let outcome = block_on(poller.start("mathi", true)).unwrap();

        assert_eq!(outcome, PollOutcome::Cooldown { remaining: Some(300) });
        assert_eq!(poller.gateway().check_calls.get(), 0);
        assert_eq!(
            poller.sink().events(),
            vec![UiEvent::Failure(
                "You can't force a recalculation yet, try again in 300 seconds".to_string()
            )]
        );

        let poller = self::poller(MockGateway::recalc_answer(JobStatus::CantForce, None));

        let outcome = block_on(poller.start("mathi", true)).unwrap();

        assert_eq!(outcome, PollOutcome::Cooldown { remaining: None });
        assert_eq!(poller.gateway().check_calls.get(), 0);
        assert_eq!(
            poller.sink().events(),
            vec![UiEvent::Failure(
                "You can't force a recalculation yet, try again later".to_string()
            )]
        );
    }

    #[test]
    fn cached_profile_redirects_immediately() {
        let poller = poller(MockGateway::recalc_answer(JobStatus::Done, None));

        let outcome = block_on(poller.start("freedomdiver", false)).unwrap();

        assert_eq!(outcome, PollOutcome::Redirected("/pp?user=freedomdiver".to_string()));
        assert_eq!(poller.gateway().check_calls.get(), 0);
        assert_eq!(poller.sink().terminal_count(), 1);
    }

    #[test]
    fn server_error_is_terminal() {
        let gateway = MockGateway::recalc_answer(JobStatus::Accepted, None).with_checks(vec![
            status(JobStatus::Calculating, None),
            status(JobStatus::Error, None),
            status(JobStatus::Pending, Some(1)),
        ]);
        let poller = poller(gateway);

        let outcome = block_on(poller.start("yeahbennou", false)).unwrap();

        assert_eq!(outcome, PollOutcome::Failed);
        assert_eq!(poller.gateway().check_calls.get(), 2);
        assert_eq!(poller.sink().terminal_count(), 1);
        assert_eq!(
            poller.sink().events().last(),
            Some(&UiEvent::Failure(CALCULATION_ERROR_MESSAGE.to_string()))
        );
    }

    #[test]
    fn transport_failure_mid_poll_is_reported() {
        let gateway = MockGateway::recalc_answer(JobStatus::Accepted, None).with_checks(vec![
            status(JobStatus::Pending, Some(2)),
            Err(TransportError::Status(502)),
        ]);
        let poller = poller(gateway);

        let outcome = block_on(poller.start("cookiezi", false)).unwrap();

        assert_eq!(outcome, PollOutcome::Unreachable(TransportError::Status(502)));
        assert_eq!(poller.sink().terminal_count(), 1);
        assert_eq!(
            poller.sink().events().last(),
            Some(&UiEvent::Failure(UNREACHABLE_MESSAGE.to_string()))
        );
        assert!(!sessions::is_active("cookiezi"));
    }

    #[test]
    fn transport_failure_on_request_is_reported() {
        let poller = poller(MockGateway::default());

        let outcome = block_on(poller.start("nobody", false)).unwrap();

        assert!(matches!(outcome, PollOutcome::Unreachable(TransportError::Network(_))));
        assert_eq!(poller.gateway().check_calls.get(), 0);
        assert_eq!(poller.sink().terminal_count(), 1);
    }

    #[test]
    fn overlapping_session_for_same_user_is_rejected() {
        let _running = sessions::acquire("whitecat").unwrap();
        let poller = poller(MockGateway::recalc_answer(JobStatus::Done, None));

        let err = block_on(poller.start("WhiteCat", false)).unwrap_err();

        assert_eq!(err, PollError::AlreadyPolling("whitecat".to_string()));
        assert!(poller.gateway().recalc_calls.borrow().is_empty());
        assert!(poller.sink().events().is_empty());
    }

    #[test]
    fn empty_user_is_rejected() {
        let poller = poller(MockGateway::recalc_answer(JobStatus::Done, None));
        assert_eq!(block_on(poller.start("   ", false)), Err(PollError::EmptyUser));
        assert!(poller.gateway().recalc_calls.borrow().is_empty());
    }

    #[test]
    fn cancelled_session_stops_without_terminal_event() {
        let gateway = MockGateway::recalc_answer(JobStatus::Accepted, None).with_checks(vec![
            status(JobStatus::Pending, Some(9)),
            status(JobStatus::Pending, Some(8)),
            status(JobStatus::Done, None),
        ]);
        let delay = InstantDelay {
            cancel_on_wait: Some((1, "mrekk".to_string())),
            ..InstantDelay::default()
        };
        let poller = RecalcPoller::new(
            gateway,
            delay,
            RecordingSink::default(),
            ClientConfig::default(),
        );

        let outcome = block_on(poller.start("mrekk", false)).unwrap();

        assert_eq!(outcome, PollOutcome::Cancelled);
        assert_eq!(poller.gateway().check_calls.get(), 1);
        assert_eq!(poller.sink().terminal_count(), 0);
        assert!(!sessions::is_active("mrekk"));
    }

    #[test]
    fn cancel_accepts_the_name_as_typed() {
        let gateway = MockGateway::recalc_answer(JobStatus::Accepted, None).with_checks(vec![
            status(JobStatus::Pending, Some(2)),
            status(JobStatus::Pending, Some(1)),
            status(JobStatus::Done, None),
        ]);
        let delay = InstantDelay {
            cancel_on_wait: Some((1, "  RaFis ".to_string())),
            ..InstantDelay::default()
        };
        let poller = RecalcPoller::new(
            gateway,
            delay,
            RecordingSink::default(),
            ClientConfig::default(),
        );

        let outcome = block_on(poller.start("Rafis", false)).unwrap();

        assert_eq!(outcome, PollOutcome::Cancelled);
        assert_eq!(poller.gateway().check_calls.get(), 1);
        assert_eq!(poller.sink().terminal_count(), 0);
        assert!(!sessions::is_active("Rafis"));
    }

    #[test]
    fn sessions_for_different_users_run_side_by_side() {
        let a = poller(MockGateway::recalc_answer(JobStatus::Accepted, None).with_checks(vec![
            status(JobStatus::Calculating, None),
            status(JobStatus::Done, None),
        ]));
        let b = poller(MockGateway::recalc_answer(JobStatus::Accepted, None).with_checks(vec![
            status(JobStatus::Pending, Some(1)),
            status(JobStatus::Error, None),
        ]));

        let (outcome_a, outcome_b) =
            block_on(futures::future::join(a.start("vaxei", false), b.start("ryuk", false)));

        assert_eq!(outcome_a.unwrap(), PollOutcome::Redirected("/pp?user=vaxei".to_string()));
        assert_eq!(outcome_b.unwrap(), PollOutcome::Failed);
        assert_eq!(a.sink().terminal_count(), 1);
        assert_eq!(b.sink().terminal_count(), 1);
    }
}
