//! The VIP payment flow.
//!
//! `Idle → Submitting → AwaitingConfirmation → {Success | Failed | TimedOut}`.
//! Submission fires one initiation request, then the transaction status is
//! re-checked on a fixed schedule until a terminal status arrives or the
//! attempt budget runs out. Checks are strictly sequential: there is never
//! more than one in flight, and a new submission cannot start while a flow
//! is running (the controller is held by `&mut` for the whole cycle).
//!
//! Every path through the flow leaves exactly one visible notice behind.

use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::api::{PaymentApi, PaymentStatus};
use crate::config::Config;
use crate::notify::{NoticeKind, Notifier};

const GENERIC_DECLINE: &str = "Payment failed. Please try again.";
const GENERIC_NETWORK_ERROR: &str =
    "Could not reach the server. Check your connection and try again.";
const TIMEOUT_WARNING: &str =
    "Payment confirmation timed out. If you approved the payment on your phone, refresh in a moment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Submitting,
    AwaitingConfirmation,
}

/// Terminal result of one submission cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Rejected client-side; no request was made.
    Invalid,
    /// The server declined the initiation, or it never reached the server.
    Declined,
    /// Payment confirmed. The caller should refresh to pick up the
    /// unlocked content.
    Completed,
    /// The backend reported the payment as failed.
    Failed,
    /// The attempt budget ran out without a terminal status.
    TimedOut,
}

/// Scheduling knobs for the confirmation loop.
#[derive(Debug, Clone)]
pub struct FlowOptions {
    /// Delay between initiation and the first status check.
    pub first_check_delay: Duration,
    /// Fixed interval between status checks.
    pub poll_interval: Duration,
    /// Total status checks before giving up (60 × 5 s ≈ 5 minutes).
    pub max_attempts: u32,
    /// Pause after a confirmed payment, so the backend finishes unlocking
    /// before the caller refreshes.
    pub unlock_grace: Duration,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            first_check_delay: Duration::from_secs(3),
            poll_interval: Duration::from_secs(5),
            max_attempts: 60,
            unlock_grace: Duration::from_millis(1500),
        }
    }
}

impl FlowOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            first_check_delay: Duration::from_secs(config.first_check_delay_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_attempts: config.max_poll_attempts,
            ..Self::default()
        }
    }
}

pub struct PaymentFlow<A> {
    api: A,
    opts: FlowOptions,
    notifier: Notifier,
    state: FlowState,
}

impl<A: PaymentApi> PaymentFlow<A> {
    pub fn new(api: A, opts: FlowOptions) -> Self {
        Self {
            api,
            opts,
            notifier: Notifier::new(),
            state: FlowState::Idle,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run one complete submission cycle and return its terminal outcome.
    pub async fn submit(&mut self, phone_number: &str) -> FlowOutcome {
        let phone = phone_number.trim();
        if phone.is_empty() {
            self.notifier
                .push(NoticeKind::Error, "Please enter your phone number.");
            return FlowOutcome::Invalid;
        }

        self.state = FlowState::Submitting;
        info!("initiating payment for {phone}");

        let response = match self.api.initiate_payment(phone).await {
            Ok(response) => response,
            Err(e) => {
                warn!("payment initiation failed: {e}");
                self.notifier.push(NoticeKind::Error, GENERIC_NETWORK_ERROR);
                self.state = FlowState::Idle;
                return FlowOutcome::Declined;
            }
        };

        // A success without a transaction id is unusable; treat it like a
        // decline and surface whatever the server said.
        let transaction_id = match (response.success, response.transaction_id) {
            (true, Some(id)) => id,
            (_, _) => {
                let message = response
                    .error
                    .unwrap_or_else(|| GENERIC_DECLINE.to_string());
                self.notifier.push(NoticeKind::Error, message);
                self.state = FlowState::Idle;
                return FlowOutcome::Declined;
            }
        };

        if let Some(message) = response.message {
            self.notifier.push(NoticeKind::Info, message);
        }

        self.state = FlowState::AwaitingConfirmation;
        let outcome = self.await_confirmation(&transaction_id).await;
        self.state = FlowState::Idle;
        outcome
    }

    /// Unlock the VIP prediction through the demo endpoint. The backend
    /// grants access synchronously, so there is nothing to poll.
    pub async fn demo(&mut self) -> FlowOutcome {
        self.state = FlowState::Submitting;

        let outcome = match self.api.demo_payment().await {
            Ok(ack) if ack.success => {
                let message = ack
                    .message
                    .unwrap_or_else(|| "Demo payment successful! VIP prediction unlocked.".to_string());
                self.notifier.push(NoticeKind::Success, message);
                FlowOutcome::Completed
            }
            Ok(ack) => {
                let message = ack.error.unwrap_or_else(|| GENERIC_DECLINE.to_string());
                self.notifier.push(NoticeKind::Error, message);
                FlowOutcome::Declined
            }
            Err(e) => {
                warn!("demo payment failed: {e}");
                self.notifier.push(NoticeKind::Error, GENERIC_NETWORK_ERROR);
                FlowOutcome::Declined
            }
        };

        self.state = FlowState::Idle;
        outcome
    }

    /// Poll the status endpoint until a terminal status or the budget is
    /// spent. Transport and decode errors burn an attempt but never end the
    /// flow on their own.
    async fn await_confirmation(&mut self, transaction_id: &str) -> FlowOutcome {
        sleep(self.opts.first_check_delay).await;

        for attempt in 1..=self.opts.max_attempts {
            match self.api.check_payment(transaction_id).await {
                Ok(PaymentStatus::Completed) => {
                    info!("payment {transaction_id} confirmed after {attempt} checks");
                    self.notifier.push(
                        NoticeKind::Success,
                        "Payment successful! Unlocking your VIP prediction...",
                    );
                    sleep(self.opts.unlock_grace).await;
                    return FlowOutcome::Completed;
                }
                Ok(PaymentStatus::Failed) => {
                    self.notifier.push(
                        NoticeKind::Error,
                        "Payment failed or was cancelled. Please try again.",
                    );
                    return FlowOutcome::Failed;
                }
                Ok(status) => {
                    debug!(
                        "payment {transaction_id} still {status:?} (check {attempt}/{})",
                        self.opts.max_attempts
                    );
                }
                Err(e) => {
                    warn!("status check {attempt} failed: {e}");
                }
            }

            if attempt < self.opts.max_attempts {
                sleep(self.opts.poll_interval).await;
            }
        }

        self.notifier.push(NoticeKind::Warning, TIMEOUT_WARNING);
        FlowOutcome::TimedOut
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::api::{AckResponse, CountdownResponse, InitiateResponse};
    use crate::errors::{ClientError, Result};

    /// Stand-in for a transport failure. `ClientError` wraps foreign error
    /// types that can't be constructed directly, so a decode error plays
    /// the part.
    fn transport_error() -> ClientError {
        serde_json::from_str::<serde_json::Value>("").unwrap_err().into()
    }

    #[derive(Clone)]
    enum CheckScript {
        Status(PaymentStatus),
        TransportError,
    }

    enum InitiateScript {
        Response(InitiateResponse),
        TransportError,
    }

    /// Scripted [`PaymentApi`] that counts calls and panics when polled
    /// past the end of its script.
    struct ScriptedApi {
        initiate: Mutex<Option<InitiateScript>>,
        checks: Mutex<VecDeque<CheckScript>>,
        demo: Mutex<Option<AckResponse>>,
        initiate_calls: AtomicUsize,
        check_calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(initiate: InitiateScript, checks: Vec<CheckScript>) -> Self {
            Self {
                initiate: Mutex::new(Some(initiate)),
                checks: Mutex::new(checks.into()),
                demo: Mutex::new(None),
                initiate_calls: AtomicUsize::new(0),
                check_calls: AtomicUsize::new(0),
            }
        }

        fn accepting(transaction_id: &str, checks: Vec<CheckScript>) -> Self {
            Self::new(
                InitiateScript::Response(InitiateResponse {
                    success: true,
                    message: Some("Payment initiated. Please complete on your phone.".into()),
                    transaction_id: Some(transaction_id.into()),
                    error: None,
                }),
                checks,
            )
        }

        fn initiate_calls(&self) -> usize {
            self.initiate_calls.load(Ordering::SeqCst)
        }

        fn check_calls(&self) -> usize {
            self.check_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentApi for ScriptedApi {
        async fn initiate_payment(&self, _phone_number: &str) -> Result<InitiateResponse> {
            self.initiate_calls.fetch_add(1, Ordering::SeqCst);
            match self.initiate.lock().unwrap().take().expect("unexpected initiation") {
                InitiateScript::Response(response) => Ok(response),
                InitiateScript::TransportError => Err(transport_error()),
            }
        }

        async fn check_payment(&self, _transaction_id: &str) -> Result<PaymentStatus> {
            self.check_calls.fetch_add(1, Ordering::SeqCst);
            match self
                .checks
                .lock()
                .unwrap()
                .pop_front()
                .expect("status check past end of script")
            {
                CheckScript::Status(status) => Ok(status),
                CheckScript::TransportError => Err(transport_error()),
            }
        }

        async fn demo_payment(&self) -> Result<AckResponse> {
            Ok(self.demo.lock().unwrap().take().expect("unexpected demo payment"))
        }

        async fn generate_predictions(&self) -> Result<AckResponse> {
            unimplemented!("not used by the flow")
        }

        async fn fetch_countdown(&self) -> Result<CountdownResponse> {
            unimplemented!("not used by the flow")
        }
    }

    fn pending(n: usize) -> Vec<CheckScript> {
        vec![CheckScript::Status(PaymentStatus::Pending); n]
    }

    #[tokio::test]
    async fn blank_phone_is_rejected_without_any_request() {
        for phone in ["", "   ", "\t\n"] {
            let api = ScriptedApi::accepting("TX-1", vec![]);
            let mut flow = PaymentFlow::new(api, FlowOptions::default());

            assert_eq!(flow.submit(phone).await, FlowOutcome::Invalid);
            assert_eq!(flow.api().initiate_calls(), 0);
            assert_eq!(flow.notifier().current().unwrap().kind, NoticeKind::Error);
            assert_eq!(flow.state(), FlowState::Idle);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_check_waits_for_the_initial_delay() {
        let api = ScriptedApi::accepting(
            "TX-1",
            vec![CheckScript::Status(PaymentStatus::Completed)],
        );
        let mut flow = PaymentFlow::new(api, FlowOptions::default());

        let started = Instant::now();
        assert_eq!(flow.submit("0772123456").await, FlowOutcome::Completed);

        assert_eq!(flow.api().check_calls(), 1);
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(
            flow.notifier().current().unwrap().kind,
            NoticeKind::Success
        );
    }

    #[tokio::test(start_paused = true)]
    async fn polling_stops_at_the_first_completed() {
        let mut checks = pending(2);
        checks.push(CheckScript::Status(PaymentStatus::Completed));
        let api = ScriptedApi::accepting("TX-1", checks);
        let mut flow = PaymentFlow::new(api, FlowOptions::default());

        assert_eq!(flow.submit("0772123456").await, FlowOutcome::Completed);
        // The script would panic on a fourth check; the count pins it down.
        assert_eq!(flow.api().check_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_ends_the_flow() {
        let mut checks = pending(1);
        checks.push(CheckScript::Status(PaymentStatus::Failed));
        let api = ScriptedApi::accepting("TX-1", checks);
        let mut flow = PaymentFlow::new(api, FlowOptions::default());

        assert_eq!(flow.submit("0772123456").await, FlowOutcome::Failed);
        assert_eq!(flow.api().check_calls(), 2);
        assert_eq!(flow.notifier().current().unwrap().kind, NoticeKind::Error);
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn budget_of_sixty_checks_then_timeout() {
        let api = ScriptedApi::accepting("TX-1", pending(60));
        let mut flow = PaymentFlow::new(api, FlowOptions::default());

        let started = Instant::now();
        assert_eq!(flow.submit("0772123456").await, FlowOutcome::TimedOut);

        assert_eq!(flow.api().check_calls(), 60);
        // 3 s lead-in plus 59 gaps of 5 s.
        assert!(started.elapsed() >= Duration::from_secs(3 + 59 * 5));
        assert_eq!(
            flow.notifier().current().unwrap().kind,
            NoticeKind::Warning
        );
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[tokio::test]
    async fn declined_initiation_never_polls() {
        let api = ScriptedApi::new(
            InitiateScript::Response(InitiateResponse {
                success: false,
                message: None,
                transaction_id: None,
                error: Some("No VIP prediction available".into()),
            }),
            vec![],
        );
        let mut flow = PaymentFlow::new(api, FlowOptions::default());

        assert_eq!(flow.submit("0772123456").await, FlowOutcome::Declined);
        assert_eq!(flow.api().check_calls(), 0);

        let visible = flow.notifier().current().unwrap();
        assert_eq!(visible.message, "No VIP prediction available");
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[tokio::test]
    async fn accepted_initiation_without_id_is_declined() {
        let api = ScriptedApi::new(
            InitiateScript::Response(InitiateResponse {
                success: true,
                message: Some("Payment initiated".into()),
                transaction_id: None,
                error: None,
            }),
            vec![],
        );
        let mut flow = PaymentFlow::new(api, FlowOptions::default());

        assert_eq!(flow.submit("0772123456").await, FlowOutcome::Declined);
        assert_eq!(flow.api().check_calls(), 0);
        assert_eq!(flow.notifier().current().unwrap().message, GENERIC_DECLINE);
    }

    #[tokio::test]
    async fn unreachable_server_at_initiation_is_declined() {
        let api = ScriptedApi::new(InitiateScript::TransportError, vec![]);
        let mut flow = PaymentFlow::new(api, FlowOptions::default());

        assert_eq!(flow.submit("0772123456").await, FlowOutcome::Declined);
        assert_eq!(
            flow.notifier().current().unwrap().message,
            GENERIC_NETWORK_ERROR
        );
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_while_polling_consume_attempts_only() {
        let api = ScriptedApi::accepting(
            "TX-1",
            vec![
                CheckScript::TransportError,
                CheckScript::Status(PaymentStatus::Pending),
                CheckScript::TransportError,
                CheckScript::Status(PaymentStatus::Completed),
            ],
        );
        let mut flow = PaymentFlow::new(api, FlowOptions::default());

        assert_eq!(flow.submit("0772123456").await, FlowOutcome::Completed);
        assert_eq!(flow.api().check_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_status_counts_like_pending() {
        let api = ScriptedApi::accepting(
            "TX-1",
            vec![
                CheckScript::Status(PaymentStatus::Unknown),
                CheckScript::Status(PaymentStatus::Completed),
            ],
        );
        let mut flow = PaymentFlow::new(api, FlowOptions::default());

        assert_eq!(flow.submit("0772123456").await, FlowOutcome::Completed);
        assert_eq!(flow.api().check_calls(), 2);
    }

    #[tokio::test]
    async fn demo_unlocks_without_polling() {
        let api = ScriptedApi::accepting("TX-1", vec![]);
        *api.demo.lock().unwrap() = Some(AckResponse {
            success: true,
            message: Some("Demo payment successful! VIP prediction unlocked.".into()),
            error: None,
        });
        let mut flow = PaymentFlow::new(api, FlowOptions::default());

        assert_eq!(flow.demo().await, FlowOutcome::Completed);
        assert_eq!(flow.api().check_calls(), 0);
        assert_eq!(
            flow.notifier().current().unwrap().kind,
            NoticeKind::Success
        );
    }
}
