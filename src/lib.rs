//! PASS identity-verification handshake client
//!
//! Drives the five-step sign-service handshake: ticket issue, transaction
//! exchange, identity submission, confirmation request and the final status
//! poll. Every step scrapes its tokens out of HTML / inline script responses
//! and hands them forward to the next step.
//!
//! ## Architecture
//!
//! ```text
//! HandshakeOrchestrator → steps::* → HttpTransport → extract → SessionState
//!                              ↑
//!                          payload::*
//! ```
//!
//! The orchestrator owns the transport and the session state for exactly one
//! run. A `ConfirmationGate` suspends the run between the confirmation request
//! and the status poll while the applicant approves the push on their phone.

pub mod config;
pub mod confirm;
pub mod domain;
pub mod error;
pub mod extract;
pub mod orchestrator;
pub mod payload;
pub mod steps;
pub mod transport;

// Re-exports for convenience
pub use config::{ConfigLoader, HandshakeConfig, IdentityCheckPolicy};
pub use confirm::{ChannelGate, ConfirmationGate, FixedGate, TerminalGate};
pub use domain::{Applicant, ServiceReply, ServiceTicket, SessionState, StepOutput};
pub use error::{ApplicantError, HandshakeError};
pub use orchestrator::{HandshakeOrchestrator, HandshakeOutcome, HandshakePhase, HandshakeReport};
pub use steps::StepKind;
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportFailure};
