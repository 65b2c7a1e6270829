//! Step executors
//!
//! One executor per handshake step. Each checks the session tokens it needs
//! before sending anything, issues exactly one request, and turns the
//! response into a [`StepOutput`]. Executors read the session state but never
//! write it; the orchestrator applies their output.

pub mod exchange;
pub mod identity;
pub mod status;
pub mod ticket;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::HandshakeConfig;
use crate::domain::{Applicant, SessionState, StepOutput};
use crate::error::HandshakeError;
use crate::extract::{FieldSpec, Matcher};
use crate::payload::Form;
use crate::transport::{HttpResponse, HttpTransport, TransportFailure};

/// The five handshake steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    IssueTicket,
    Exchange,
    SubmitIdentity,
    ConfirmRequest,
    PollResult,
}

impl StepKind {
    pub const ALL: [StepKind; 5] = [
        StepKind::IssueTicket,
        StepKind::Exchange,
        StepKind::SubmitIdentity,
        StepKind::ConfirmRequest,
        StepKind::PollResult,
    ];

    /// 1-based position in the handshake
    pub fn number(self) -> usize {
        match self {
            Self::IssueTicket => 1,
            Self::Exchange => 2,
            Self::SubmitIdentity => 3,
            Self::ConfirmRequest => 4,
            Self::PollResult => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::IssueTicket => "issue-ticket",
            Self::Exchange => "exchange",
            Self::SubmitIdentity => "submit-identity",
            Self::ConfirmRequest => "confirm-request",
            Self::PollResult => "poll-result",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Everything a step reads besides the session state
pub struct StepContext<'a, T: HttpTransport + ?Sized> {
    pub transport: &'a T,
    pub config: &'a HandshakeConfig,
    pub applicant: &'a Applicant,
}

impl<'a, T: HttpTransport + ?Sized> StepContext<'a, T> {
    pub fn new(transport: &'a T, config: &'a HandshakeConfig, applicant: &'a Applicant) -> Self {
        Self {
            transport,
            config,
            applicant,
        }
    }

    /// GET the step's endpoint and return the body of a 2xx response
    async fn get(&self, step: StepKind) -> Result<String, HandshakeError> {
        let url = self.config.endpoints.for_step(step);
        let headers = self.config.headers.for_step(step);
        info!(%step, url, "sending request");
        checked(step, self.transport.get(url, &headers).await)
    }

    /// POST `form` to the step's endpoint and return the body of a 2xx response
    async fn post(&self, step: StepKind, form: &Form) -> Result<String, HandshakeError> {
        let url = self.config.endpoints.for_step(step);
        let headers = self.config.headers.for_step(step);
        info!(%step, url, "sending request");
        checked(step, self.transport.post_form(url, &headers, form).await)
    }
}

fn checked(
    step: StepKind,
    result: Result<HttpResponse, TransportFailure>,
) -> Result<String, HandshakeError> {
    let response = result.map_err(|failure| HandshakeError::Transport {
        step,
        status: None,
        message: failure.to_string(),
    })?;

    if !response.is_success() {
        warn!(%step, status = response.status, "non-success status");
        return Err(HandshakeError::status(step, response.status, &response.body));
    }
    Ok(response.body)
}

/// Compile a static field list
fn field_specs(defs: &[(&str, Matcher)]) -> Vec<FieldSpec> {
    defs.iter()
        .map(|(name, matcher)| {
            FieldSpec::new(*name, *matcher).expect("escaped field pattern compiles")
        })
        .collect()
}

/// Run one step against the current session state
pub async fn execute<T: HttpTransport + ?Sized>(
    step: StepKind,
    ctx: &StepContext<'_, T>,
    state: &SessionState,
) -> Result<StepOutput, HandshakeError> {
    match step {
        StepKind::IssueTicket => ticket::issue_ticket(ctx).await,
        StepKind::Exchange => exchange::exchange(ctx, state).await,
        StepKind::SubmitIdentity => identity::submit_identity(ctx, state).await,
        StepKind::ConfirmRequest => identity::confirm_request(ctx, state).await,
        StepKind::PollResult => status::poll_result(ctx, state).await.map(StepOutput::Polled),
    }
}
