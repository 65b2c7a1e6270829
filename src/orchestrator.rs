//! Handshake orchestrator
//!
//! Runs the five steps strictly in order, applies each step's tokens to the
//! session state, and stops at the first failure. Between the confirmation
//! request and the status poll the run suspends on the confirmation gate.
//!
//! ```text
//! Init → IssueTicket → Exchange → SubmitIdentity → ConfirmRequest
//!      → ManualConfirm → PollResult → Authenticated | Rejected
//!
//! any failure (or a declined gate) → Aborted
//! ```
//!
//! Failed steps are never retried; a new run starts from an empty state.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::HandshakeConfig;
use crate::confirm::{wait_for_confirmation, ConfirmationGate};
use crate::domain::{Applicant, SessionState};
use crate::error::HandshakeError;
use crate::steps::{self, status, StepContext, StepKind};
use crate::transport::HttpTransport;

/// Steps executed before the confirmation gate
const PRE_CONFIRM_STEPS: [StepKind; 4] = [
    StepKind::IssueTicket,
    StepKind::Exchange,
    StepKind::SubmitIdentity,
    StepKind::ConfirmRequest,
];

/// Non-terminal states of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandshakePhase {
    Init,
    IssueTicket,
    Exchange,
    SubmitIdentity,
    ConfirmRequest,
    ManualConfirm,
    PollResult,
}

impl From<StepKind> for HandshakePhase {
    fn from(step: StepKind) -> Self {
        match step {
            StepKind::IssueTicket => Self::IssueTicket,
            StepKind::Exchange => Self::Exchange,
            StepKind::SubmitIdentity => Self::SubmitIdentity,
            StepKind::ConfirmRequest => Self::ConfirmRequest,
            StepKind::PollResult => Self::PollResult,
        }
    }
}

impl fmt::Display for HandshakePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::ManualConfirm => write!(f, "manual-confirm"),
            Self::IssueTicket => write!(f, "{}", StepKind::IssueTicket),
            Self::Exchange => write!(f, "{}", StepKind::Exchange),
            Self::SubmitIdentity => write!(f, "{}", StepKind::SubmitIdentity),
            Self::ConfirmRequest => write!(f, "{}", StepKind::ConfirmRequest),
            Self::PollResult => write!(f, "{}", StepKind::PollResult),
        }
    }
}

/// Terminal state of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HandshakeOutcome {
    /// The status poll returned the success code
    Authenticated,
    /// The status poll completed with any other code
    Rejected {
        result_code: Option<String>,
        result_msg: Option<String>,
    },
    /// A step failed or the confirmation was declined
    Aborted {
        phase: HandshakePhase,
        error: HandshakeError,
    },
}

impl HandshakeOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Authenticated => "authenticated",
            Self::Rejected { .. } => "rejected",
            Self::Aborted { .. } => "aborted",
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Everything a finished run reports
#[derive(Debug, Clone, Serialize)]
pub struct HandshakeReport {
    pub run_id: Uuid,
    pub outcome: HandshakeOutcome,
    /// Tokens harvested before the run ended
    pub state: SessionState,
    /// Phases entered, in order, starting with `Init`
    pub visited: Vec<HandshakePhase>,
}

/// Drives one handshake run
///
/// Owns the transport for the duration of [`run`](Self::run), so the HTTP
/// session is released however the run ends.
pub struct HandshakeOrchestrator<T, G> {
    config: Arc<HandshakeConfig>,
    transport: T,
    gate: G,
}

impl<T, G> HandshakeOrchestrator<T, G>
where
    T: HttpTransport,
    G: ConfirmationGate,
{
    pub fn new(config: Arc<HandshakeConfig>, transport: T, gate: G) -> Self {
        Self {
            config,
            transport,
            gate,
        }
    }

    pub async fn run(mut self, applicant: &Applicant) -> HandshakeReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("handshake", %run_id);
        let (outcome, state, visited) = self.drive(applicant).instrument(span.clone()).await;

        span.in_scope(|| match &outcome {
            HandshakeOutcome::Authenticated => info!("handshake authenticated"),
            HandshakeOutcome::Rejected { result_code, .. } => warn!(
                result_code = result_code.as_deref().unwrap_or("none"),
                "handshake rejected"
            ),
            HandshakeOutcome::Aborted { phase, error } => {
                warn!(%phase, %error, "handshake aborted")
            }
        });

        HandshakeReport {
            run_id,
            outcome,
            state,
            visited,
        }
    }

    async fn drive(
        &mut self,
        applicant: &Applicant,
    ) -> (HandshakeOutcome, SessionState, Vec<HandshakePhase>) {
        let mut state = SessionState::new();
        let mut visited = vec![HandshakePhase::Init];
        let ctx = StepContext::new(&self.transport, self.config.as_ref(), applicant);

        for step in PRE_CONFIRM_STEPS {
            visited.push(step.into());
            let applied = match steps::execute(step, &ctx, &state).await {
                Ok(output) => state.apply(&output),
                Err(error) => Err(error),
            };
            match applied {
                Ok(()) => info!(step = %step, number = step.number(), "step completed"),
                Err(error) => return (abort(step.into(), error), state, visited),
            }
        }

        visited.push(HandshakePhase::ManualConfirm);
        let timeout = self.config.confirmation.timeout_secs.map(Duration::from_secs);
        if let Err(error) = wait_for_confirmation(&mut self.gate, timeout).await {
            return (abort(HandshakePhase::ManualConfirm, error), state, visited);
        }

        visited.push(HandshakePhase::PollResult);
        let outcome = match status::poll_result(&ctx, &state).await {
            Ok(reply) if reply.is_code(&self.config.form.success_code) => {
                HandshakeOutcome::Authenticated
            }
            Ok(reply) => HandshakeOutcome::Rejected {
                result_code: reply.result_code,
                result_msg: reply.result_msg,
            },
            Err(error) => abort(HandshakePhase::PollResult, error),
        };
        (outcome, state, visited)
    }
}

fn abort(phase: HandshakePhase, error: HandshakeError) -> HandshakeOutcome {
    match error.raw_body() {
        Some(body) => warn!(%phase, %error, raw_body = %body, "step failed"),
        None => warn!(%phase, %error, "step failed"),
    }
    HandshakeOutcome::Aborted { phase, error }
}
