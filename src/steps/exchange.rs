//! Step 2: exchange the ticket for a session transaction id

use std::sync::LazyLock;

use tracing::info;

use super::{field_specs, StepContext, StepKind};
use crate::domain::{SessionState, StepOutput};
use crate::error::HandshakeError;
use crate::extract::{extract, FieldSpec, Matcher};
use crate::payload::exchange_form;
use crate::transport::HttpTransport;

static EXCHANGE_FIELDS: LazyLock<Vec<FieldSpec>> =
    LazyLock::new(|| field_specs(&[("txId", Matcher::InputAttribute)]));

pub async fn exchange<T: HttpTransport + ?Sized>(
    ctx: &StepContext<'_, T>,
    state: &SessionState,
) -> Result<StepOutput, HandshakeError> {
    let step = StepKind::Exchange;
    let ticket = state.require_ticket(step)?;

    let html = ctx.post(step, &exchange_form(&ticket, ctx.config)).await?;
    let tokens = extract(&html, &EXCHANGE_FIELDS);
    let session_tx_id = tokens.require(step, "txId")?.to_string();

    info!(%step, "session transaction opened");
    Ok(StepOutput::Exchanged { session_tx_id })
}
