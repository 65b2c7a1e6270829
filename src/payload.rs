//! Form payloads for each step
//!
//! Pure functions: no I/O, no defaults for dynamic values. Tokens arrive as
//! concrete strings, so a step has to resolve them from the session state
//! before a payload can be built at all.

use crate::config::HandshakeConfig;
use crate::domain::{Applicant, ServiceTicket};

/// Ordered form fields, url-encoded by the transport
pub type Form = Vec<(&'static str, String)>;

/// Which identity request is being built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMode {
    /// Step 3: blank result code and message
    Submit,
    /// Step 4: the configured success code and message
    Confirm,
}

fn blank<'a>(keys: &'a [&'static str]) -> impl Iterator<Item = (&'static str, String)> + 'a {
    keys.iter().map(|key| (*key, String::new()))
}

/// Step 2: trade the ticket for a session transaction
pub fn exchange_form(ticket: &ServiceTicket, config: &HandshakeConfig) -> Form {
    let mut form: Form = vec![
        ("mid", ticket.service_id.clone()),
        ("reqSvcCd", ticket.requested_service_code.clone()),
        ("mTxId", ticket.transaction_ref.clone()),
        ("authHash", ticket.auth_hash.clone()),
        ("flgFixedUser", "N".to_string()),
    ];
    form.extend(blank(&[
        "userName",
        "userPhone",
        "userBirth",
        "userHash",
        "directAgency",
    ]));
    form.extend([
        ("identifier", config.disclosure.clone()),
        ("successUrl", config.success_url.clone()),
        ("failUrl", config.fail_url.clone()),
    ]);
    form
}

/// Steps 3 and 4: applicant identity plus consent flags
pub fn identity_form(
    applicant: &Applicant,
    session_tx_id: &str,
    config: &HandshakeConfig,
    mode: IdentityMode,
) -> Form {
    let fixed = &config.form;
    let (result_code, result_msg) = match mode {
        IdentityMode::Submit => (String::new(), String::new()),
        IdentityMode::Confirm => (fixed.success_code.clone(), fixed.success_msg.clone()),
    };

    let mut form: Form = vec![
        ("name", applicant.name().to_string()),
        ("birth", applicant.birth_digits()),
        ("phone", applicant.phone().to_string()),
        ("all_check", "on".to_string()),
        ("terms_1", "on".to_string()),
        ("terms_2", "on".to_string()),
        ("isDirect", "false".to_string()),
        ("directAgency", String::new()),
        ("txId", session_tx_id.to_string()),
        ("reqSvcCd", fixed.req_svc_cd.clone()),
        ("sa_svc_cd", fixed.sa_svc_cd.clone()),
        ("agency", fixed.agency.clone()),
        ("agencyDisplayName", fixed.agency_display_name.clone()),
        ("myOS", fixed.my_os.clone()),
        ("myBrowser", fixed.my_browser.clone()),
        ("redirectUrl", String::new()),
        ("identifier", config.disclosure.clone()),
        ("logoUrl", config.logo_path.clone()),
        ("resultCode", result_code),
        ("resultMsg", result_msg),
    ];
    form.extend(blank(&["schemeURL", "exceptionFlag"]));
    form.push(("flgFixedUser", "N".to_string()));
    form.push(("userHash", String::new()));
    form.push(("req_url", fixed.req_url.clone()));
    form.extend(blank(&[
        "isBlockBack",
        "genderAndNation",
        "composite_key",
        "trx_key",
    ]));
    form
}

/// Step 5: poll the signature status
pub fn status_form(
    applicant: &Applicant,
    session_tx_id: &str,
    device_tx_id: &str,
    config: &HandshakeConfig,
) -> Form {
    let fixed = &config.form;
    let mut form: Form = vec![
        ("txId", session_tx_id.to_string()),
        ("reqSvcCd", fixed.req_svc_cd.clone()),
        ("sa_svc_cd", fixed.sa_svc_cd.clone()),
        ("agency", fixed.agency.clone()),
        ("agencyDisplayName", fixed.agency_display_name.clone()),
        ("name", applicant.name().to_string()),
        ("phone", applicant.phone().to_string()),
        ("birth", applicant.birth_digits()),
        ("logoUrl", config.logo_path.clone()),
        ("myOS", fixed.my_os.clone()),
        ("myBrowser", fixed.my_browser.clone()),
    ];
    form.extend(blank(&[
        "resultCode",
        "resultMsg",
        "redirectUrl",
        "gender",
        "nation",
    ]));
    form.push(("hex_txId", device_tx_id.to_string()));
    form.extend(blank(&["signedData", "signedData2", "access_token"]));
    form
}

/// Value of `key` in a form
pub fn field<'a>(form: &'a Form, key: &str) -> Option<&'a str> {
    form.iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.as_str())
}
