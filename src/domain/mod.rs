//! Domain types carried through a handshake run

pub mod applicant;
pub mod session;

pub use applicant::Applicant;
pub use session::{ServiceReply, ServiceTicket, SessionState, StepOutput};
