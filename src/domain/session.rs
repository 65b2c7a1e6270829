//! Session state accumulated across the handshake

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HandshakeError;
use crate::steps::StepKind;

/// Tokens issued by the ticket page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTicket {
    /// Merchant/service id (`mid`)
    pub service_id: String,
    /// Requested service code (`reqSvcCd`)
    pub requested_service_code: String,
    /// Merchant transaction reference (`mTxId`)
    pub transaction_ref: String,
    pub auth_hash: String,
}

/// Decoded JSON reply from the identity or status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceReply {
    pub result_code: Option<String>,
    pub result_msg: Option<String>,
    /// Whole decoded body
    pub body: Value,
}

impl ServiceReply {
    pub fn is_code(&self, code: &str) -> bool {
        self.result_code.as_deref() == Some(code)
    }
}

/// What a step produced
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    Ticket(ServiceTicket),
    Exchanged { session_tx_id: String },
    IdentityAccepted(ServiceReply),
    Confirmed { device_tx_id: String },
    Polled(ServiceReply),
}

impl StepOutput {
    pub fn step(&self) -> StepKind {
        match self {
            Self::Ticket(_) => StepKind::IssueTicket,
            Self::Exchanged { .. } => StepKind::Exchange,
            Self::IdentityAccepted(_) => StepKind::SubmitIdentity,
            Self::Confirmed { .. } => StepKind::ConfirmRequest,
            Self::Polled(_) => StepKind::PollResult,
        }
    }

    fn writes(&self) -> Vec<(Field, &str)> {
        match self {
            Self::Ticket(ticket) => vec![
                (Field::ServiceId, ticket.service_id.as_str()),
                (
                    Field::RequestedServiceCode,
                    ticket.requested_service_code.as_str(),
                ),
                (Field::TransactionRef, ticket.transaction_ref.as_str()),
                (Field::AuthHash, ticket.auth_hash.as_str()),
            ],
            Self::Exchanged { session_tx_id } => vec![(Field::SessionTxId, session_tx_id.as_str())],
            Self::Confirmed { device_tx_id } => vec![(Field::DeviceTxId, device_tx_id.as_str())],
            Self::IdentityAccepted(_) | Self::Polled(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ServiceId,
    RequestedServiceCode,
    TransactionRef,
    AuthHash,
    SessionTxId,
    DeviceTxId,
}

impl Field {
    /// Wire name of the token
    fn name(self) -> &'static str {
        match self {
            Self::ServiceId => "mid",
            Self::RequestedServiceCode => "reqSvcCd",
            Self::TransactionRef => "mTxId",
            Self::AuthHash => "authHash",
            Self::SessionTxId => "txId",
            Self::DeviceTxId => "hex_txId",
        }
    }
}

/// Tokens harvested so far; every field is written at most once
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    service_id: Option<String>,
    requested_service_code: Option<String>,
    transaction_ref: Option<String>,
    auth_hash: Option<String>,
    session_tx_id: Option<String>,
    device_tx_id: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::ServiceId => &self.service_id,
            Field::RequestedServiceCode => &self.requested_service_code,
            Field::TransactionRef => &self.transaction_ref,
            Field::AuthHash => &self.auth_hash,
            Field::SessionTxId => &self.session_tx_id,
            Field::DeviceTxId => &self.device_tx_id,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::ServiceId => &mut self.service_id,
            Field::RequestedServiceCode => &mut self.requested_service_code,
            Field::TransactionRef => &mut self.transaction_ref,
            Field::AuthHash => &mut self.auth_hash,
            Field::SessionTxId => &mut self.session_tx_id,
            Field::DeviceTxId => &mut self.device_tx_id,
        }
    }

    /// Record a step's tokens
    ///
    /// Either every field the step owns is written or none is. Re-applying the
    /// same value is a no-op; a different value for a set field is a conflict.
    pub fn apply(&mut self, output: &StepOutput) -> Result<(), HandshakeError> {
        let writes = output.writes();

        for (field, incoming) in &writes {
            if let Some(existing) = self.slot(*field) {
                if existing != incoming {
                    return Err(HandshakeError::StateConflict {
                        field: field.name(),
                        existing: existing.clone(),
                        incoming: incoming.to_string(),
                    });
                }
            }
        }

        for (field, incoming) in writes {
            let slot = self.slot_mut(field);
            if slot.is_none() {
                *slot = Some(incoming.to_string());
            }
        }
        Ok(())
    }

    fn require(&self, step: StepKind, field: Field) -> Result<&str, HandshakeError> {
        self.slot(field)
            .as_deref()
            .ok_or_else(|| HandshakeError::MissingToken {
                step,
                field: field.name().to_string(),
            })
    }

    /// Ticket tokens, as needed by the exchange step
    pub fn require_ticket(&self, step: StepKind) -> Result<ServiceTicket, HandshakeError> {
        Ok(ServiceTicket {
            service_id: self.require(step, Field::ServiceId)?.to_string(),
            requested_service_code: self.require(step, Field::RequestedServiceCode)?.to_string(),
            transaction_ref: self.require(step, Field::TransactionRef)?.to_string(),
            auth_hash: self.require(step, Field::AuthHash)?.to_string(),
        })
    }

    pub fn require_session_tx_id(&self, step: StepKind) -> Result<&str, HandshakeError> {
        self.require(step, Field::SessionTxId)
    }

    pub fn require_device_tx_id(&self, step: StepKind) -> Result<&str, HandshakeError> {
        self.require(step, Field::DeviceTxId)
    }

    pub fn service_id(&self) -> Option<&str> {
        self.service_id.as_deref()
    }

    pub fn requested_service_code(&self) -> Option<&str> {
        self.requested_service_code.as_deref()
    }

    pub fn transaction_ref(&self) -> Option<&str> {
        self.transaction_ref.as_deref()
    }

    pub fn auth_hash(&self) -> Option<&str> {
        self.auth_hash.as_deref()
    }

    pub fn session_tx_id(&self) -> Option<&str> {
        self.session_tx_id.as_deref()
    }

    pub fn device_tx_id(&self) -> Option<&str> {
        self.device_tx_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket() -> StepOutput {
        StepOutput::Ticket(ServiceTicket {
            service_id: "INIiasTest".to_string(),
            requested_service_code: "02".to_string(),
            transaction_ref: "mtx-1".to_string(),
            auth_hash: "hash-1".to_string(),
        })
    }

    #[test]
    fn test_apply_sets_fields() {
        let mut state = SessionState::new();
        state.apply(&ticket()).unwrap();
        state
            .apply(&StepOutput::Exchanged {
                session_tx_id: "tx-1".to_string(),
            })
            .unwrap();

        assert_eq!(state.service_id(), Some("INIiasTest"));
        assert_eq!(state.auth_hash(), Some("hash-1"));
        assert_eq!(state.session_tx_id(), Some("tx-1"));
        assert_eq!(state.device_tx_id(), None);
    }

    #[test]
    fn test_reapplying_same_output_is_noop() {
        let mut state = SessionState::new();
        state.apply(&ticket()).unwrap();
        let before = state.clone();
        state.apply(&ticket()).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_divergent_value_is_rejected_atomically() {
        let mut state = SessionState::new();
        state.apply(&ticket()).unwrap();

        let diverging = StepOutput::Ticket(ServiceTicket {
            service_id: "INIiasTest".to_string(),
            requested_service_code: "02".to_string(),
            transaction_ref: "mtx-1".to_string(),
            auth_hash: "hash-2".to_string(),
        });
        let before = state.clone();
        let err = state.apply(&diverging).unwrap_err();

        assert!(matches!(
            err,
            HandshakeError::StateConflict { field: "authHash", .. }
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_replies_do_not_touch_state() {
        let mut state = SessionState::new();
        let reply = ServiceReply {
            result_code: Some("0000".to_string()),
            result_msg: None,
            body: serde_json::json!({"resultCode": "0000"}),
        };
        state.apply(&StepOutput::Polled(reply.clone())).unwrap();
        state.apply(&StepOutput::IdentityAccepted(reply)).unwrap();
        assert_eq!(state, SessionState::new());
    }

    #[test]
    fn test_require_reports_missing_field() {
        let state = SessionState::new();
        let err = state.require_session_tx_id(StepKind::PollResult).unwrap_err();
        assert_eq!(
            err,
            HandshakeError::MissingToken {
                step: StepKind::PollResult,
                field: "txId".to_string(),
            }
        );
        assert!(state.require_ticket(StepKind::Exchange).is_err());
    }
}
