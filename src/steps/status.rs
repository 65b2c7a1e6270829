//! Step 5: poll the signature status

use tracing::info;

use super::{StepContext, StepKind};
use crate::domain::{ServiceReply, SessionState};
use crate::error::HandshakeError;
use crate::extract::decode_reply;
use crate::payload::status_form;
use crate::transport::HttpTransport;

/// Poll once; the verdict is judged by the orchestrator
pub async fn poll_result<T: HttpTransport + ?Sized>(
    ctx: &StepContext<'_, T>,
    state: &SessionState,
) -> Result<ServiceReply, HandshakeError> {
    let step = StepKind::PollResult;
    let tx_id = state.require_session_tx_id(step)?;
    let device_tx_id = state.require_device_tx_id(step)?;

    let form = status_form(ctx.applicant, tx_id, device_tx_id, ctx.config);
    let body = ctx.post(step, &form).await?;
    let reply = decode_reply(step, &body)?;

    info!(
        %step,
        result_code = reply.result_code.as_deref().unwrap_or("none"),
        "status polled"
    );
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandshakeConfig;
    use crate::domain::{Applicant, StepOutput};
    use crate::payload::field;
    use crate::steps::testing::CannedTransport;

    fn confirmed_state() -> SessionState {
        let mut state = SessionState::new();
        state
            .apply(&StepOutput::Exchanged {
                session_tx_id: "TX0001".to_string(),
            })
            .unwrap();
        state
            .apply(&StepOutput::Confirmed {
                device_tx_id: "beef".to_string(),
            })
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_poll_sends_both_transaction_ids() {
        let transport = CannedTransport::new(200, r#"{"resultCode":"0000"}"#);
        let config = HandshakeConfig::default();
        let applicant = Applicant::new("Kim", "20000101", "01012345678").unwrap();
        let ctx = StepContext::new(&transport, &config, &applicant);

        let reply = poll_result(&ctx, &confirmed_state()).await.unwrap();
        assert!(reply.is_code("0000"));

        let sent = transport.sent();
        let form = sent[0].form.as_ref().unwrap();
        assert_eq!(field(form, "txId"), Some("TX0001"));
        assert_eq!(field(form, "hex_txId"), Some("beef"));
        assert_eq!(
            sent[0].headers.get("X-Requested-With").map(String::as_str),
            Some("XMLHttpRequest")
        );
    }

    #[tokio::test]
    async fn test_poll_requires_device_tx() {
        let transport = CannedTransport::new(200, r#"{"resultCode":"0000"}"#);
        let config = HandshakeConfig::default();
        let applicant = Applicant::new("Kim", "20000101", "01012345678").unwrap();
        let ctx = StepContext::new(&transport, &config, &applicant);

        let mut state = SessionState::new();
        state
            .apply(&StepOutput::Exchanged {
                session_tx_id: "TX0001".to_string(),
            })
            .unwrap();

        let err = poll_result(&ctx, &state).await.unwrap_err();
        assert_eq!(
            err,
            HandshakeError::MissingToken {
                step: StepKind::PollResult,
                field: "hex_txId".to_string(),
            }
        );
        assert!(transport.sent().is_empty());
    }
}
