//! Step 1: fetch the service ticket page

use std::sync::LazyLock;

use tracing::info;

use super::{field_specs, StepContext, StepKind};
use crate::domain::{ServiceTicket, StepOutput};
use crate::error::HandshakeError;
use crate::extract::{extract, FieldSpec, Matcher};
use crate::transport::HttpTransport;

static TICKET_FIELDS: LazyLock<Vec<FieldSpec>> = LazyLock::new(|| {
    field_specs(&[
        ("mid", Matcher::FormValue),
        ("reqSvcCd", Matcher::FormValue),
        ("mTxId", Matcher::FormValue),
        ("authHash", Matcher::FormValue),
    ])
});

pub async fn issue_ticket<T: HttpTransport + ?Sized>(
    ctx: &StepContext<'_, T>,
) -> Result<StepOutput, HandshakeError> {
    let step = StepKind::IssueTicket;
    let html = ctx.get(step).await?;
    let tokens = extract(&html, &TICKET_FIELDS);

    let ticket = ServiceTicket {
        service_id: tokens.require(step, "mid")?.to_string(),
        requested_service_code: tokens.require(step, "reqSvcCd")?.to_string(),
        transaction_ref: tokens.require(step, "mTxId")?.to_string(),
        auth_hash: tokens.require(step, "authHash")?.to_string(),
    };
    info!(%step, mid = %ticket.service_id, "ticket issued");
    Ok(StepOutput::Ticket(ticket))
}
