//! Steps 3 and 4: submit the applicant identity, then request the push
//! confirmation on the applicant's phone

use std::sync::LazyLock;

use tracing::{info, warn};

use super::{field_specs, StepContext, StepKind};
use crate::config::IdentityCheckPolicy;
use crate::domain::{SessionState, StepOutput};
use crate::error::HandshakeError;
use crate::extract::{decode_reply, extract, FieldSpec, Matcher};
use crate::payload::{identity_form, IdentityMode};
use crate::transport::HttpTransport;

static CONFIRM_FIELDS: LazyLock<Vec<FieldSpec>> =
    LazyLock::new(|| field_specs(&[("hex_txId", Matcher::ScriptVariable)]));

pub async fn submit_identity<T: HttpTransport + ?Sized>(
    ctx: &StepContext<'_, T>,
    state: &SessionState,
) -> Result<StepOutput, HandshakeError> {
    let step = StepKind::SubmitIdentity;
    let tx_id = state.require_session_tx_id(step)?;

    let form = identity_form(ctx.applicant, tx_id, ctx.config, IdentityMode::Submit);
    let body = ctx.post(step, &form).await?;
    let reply = decode_reply(step, &body)?;

    let success_code = ctx.config.form.success_code.as_str();
    if !reply.is_code(success_code) {
        let code = reply.result_code.clone().unwrap_or_default();
        let message = reply.result_msg.clone().unwrap_or_default();
        match ctx.config.identity_policy {
            IdentityCheckPolicy::Strict => {
                return Err(HandshakeError::ServiceRejected {
                    step,
                    code,
                    message,
                })
            }
            IdentityCheckPolicy::Advisory => {
                warn!(%step, code = %code, message = %message, "identity reply not successful, continuing")
            }
        }
    }

    info!(
        %step,
        result_code = reply.result_code.as_deref().unwrap_or("none"),
        "identity submitted"
    );
    Ok(StepOutput::IdentityAccepted(reply))
}

pub async fn confirm_request<T: HttpTransport + ?Sized>(
    ctx: &StepContext<'_, T>,
    state: &SessionState,
) -> Result<StepOutput, HandshakeError> {
    let step = StepKind::ConfirmRequest;
    let tx_id = state.require_session_tx_id(step)?;

    let form = identity_form(ctx.applicant, tx_id, ctx.config, IdentityMode::Confirm);
    let html = ctx.post(step, &form).await?;
    let tokens = extract(&html, &CONFIRM_FIELDS);
    let device_tx_id = tokens.require(step, "hex_txId")?.to_string();

    info!(%step, "confirmation pushed to device");
    Ok(StepOutput::Confirmed { device_tx_id })
}
