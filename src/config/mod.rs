//! Handshake configuration
//!
//! Endpoints, fixed form fields, browser headers and run policies. Every
//! section deserializes with defaults so a YAML file only needs to name what
//! it overrides.

pub mod loader;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::steps::StepKind;

pub use loader::ConfigLoader;

const DEFAULT_DISCLOSURE: &str = "본인은 위 내용을 확인하였으며 전자서명에 동의합니다.";

/// Immutable configuration for one or more handshake runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeConfig {
    pub endpoints: Endpoints,
    /// Landing page the service redirects to after a successful signature
    pub success_url: String,
    /// Landing page the service redirects to after a failed signature
    pub fail_url: String,
    /// Logo resource path shown on the signing page
    pub logo_path: String,
    /// Disclosure statement shown to the signer
    pub disclosure: String,
    pub form: FormConstants,
    pub headers: HeaderProfile,
    pub http: HttpSettings,
    pub identity_policy: IdentityCheckPolicy,
    pub confirmation: ConfirmationSettings,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            success_url: "https://sign-service.inicis.com/sample/result.php".to_string(),
            fail_url: "https://sign-service.inicis.com/sample/result.php".to_string(),
            logo_path: "/resources/images/logo_INICIS.png".to_string(),
            disclosure: DEFAULT_DISCLOSURE.to_string(),
            form: FormConstants::default(),
            headers: HeaderProfile::default(),
            http: HttpSettings::default(),
            identity_policy: IdentityCheckPolicy::default(),
            confirmation: ConfirmationSettings::default(),
        }
    }
}

/// The five service endpoints, in handshake order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub ticket: String,
    pub exchange: String,
    pub identity: String,
    pub confirm: String,
    pub status: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            ticket: "https://sign-service.inicis.com/sample/request.php?reqSvcCd=02".to_string(),
            exchange: "https://sa.inicis.com/auth".to_string(),
            identity: "https://kssa.inicis.com/api/request".to_string(),
            confirm: "https://kssa.inicis.com/progress".to_string(),
            status: "https://kssa.inicis.com/api/status".to_string(),
        }
    }
}

impl Endpoints {
    /// Endpoint URL used by a step
    pub fn for_step(&self, step: StepKind) -> &str {
        match step {
            StepKind::IssueTicket => &self.ticket,
            StepKind::Exchange => &self.exchange,
            StepKind::SubmitIdentity => &self.identity,
            StepKind::ConfirmRequest => &self.confirm,
            StepKind::PollResult => &self.status,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (StepKind, &str)> {
        StepKind::ALL.into_iter().map(|step| (step, self.for_step(step)))
    }
}

/// Fixed form fields merged into the request payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConstants {
    pub req_svc_cd: String,
    pub sa_svc_cd: String,
    pub agency: String,
    pub agency_display_name: String,
    pub my_os: String,
    pub my_browser: String,
    /// Origin page reported to the identity endpoints
    pub req_url: String,
    /// Result code the service uses for success; also sent with the confirmation request
    pub success_code: String,
    /// Result message sent alongside `success_code` in the confirmation request
    pub success_msg: String,
}

impl Default for FormConstants {
    fn default() -> Self {
        Self {
            req_svc_cd: "02".to_string(),
            sa_svc_cd: "AF".to_string(),
            agency: "PASS".to_string(),
            agency_display_name: "PASS".to_string(),
            my_os: "windows".to_string(),
            my_browser: "chrome".to_string(),
            req_url: "https://sign-service.inicis.com/".to_string(),
            success_code: "0000".to_string(),
            success_msg: "성공".to_string(),
        }
    }
}

/// Browser-like request headers
///
/// `common` goes on every request; the per-step maps are layered on top and
/// win on conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderProfile {
    pub common: BTreeMap<String, String>,
    pub ticket: BTreeMap<String, String>,
    pub exchange: BTreeMap<String, String>,
    pub identity: BTreeMap<String, String>,
    pub confirm: BTreeMap<String, String>,
    pub status: BTreeMap<String, String>,
}

impl HeaderProfile {
    /// Merged header set for a step
    pub fn for_step(&self, step: StepKind) -> BTreeMap<String, String> {
        let extra = match step {
            StepKind::IssueTicket => &self.ticket,
            StepKind::Exchange => &self.exchange,
            StepKind::SubmitIdentity => &self.identity,
            StepKind::ConfirmRequest => &self.confirm,
            StepKind::PollResult => &self.status,
        };
        let mut merged = self.common.clone();
        merged.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

fn header_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for HeaderProfile {
    fn default() -> Self {
        Self {
            common: header_map(&[
                (
                    "Accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
                ),
                ("Accept-Language", "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
                ("Connection", "keep-alive"),
            ]),
            ticket: header_map(&[("Referer", "https://sign-service.inicis.com/")]),
            exchange: BTreeMap::new(),
            identity: BTreeMap::new(),
            confirm: header_map(&[
                ("Origin", "https://kssa.inicis.com"),
                ("Referer", "https://kssa.inicis.com/request"),
                ("Cache-Control", "max-age=0"),
                (
                    "sec-ch-ua",
                    "\"Google Chrome\";v=\"137\", \"Chromium\";v=\"137\", \"Not/A)Brand\";v=\"24\"",
                ),
                ("sec-ch-ua-mobile", "?0"),
                ("sec-ch-ua-platform", "\"Windows\""),
                ("Sec-Fetch-Dest", "document"),
                ("Sec-Fetch-Mode", "navigate"),
                ("Sec-Fetch-Site", "same-origin"),
                ("Sec-Fetch-User", "?1"),
                ("Upgrade-Insecure-Requests", "1"),
            ]),
            status: header_map(&[
                ("Accept", "application/json, text/javascript, */*; q=0.01"),
                ("Origin", "https://kssa.inicis.com"),
                ("Referer", "https://kssa.inicis.com/progress"),
                ("X-Requested-With", "XMLHttpRequest"),
            ]),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    /// Keep service cookies between steps
    pub cookie_store: bool,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            cookie_store: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36".to_string(),
        }
    }
}

/// How the identity submission reply is judged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityCheckPolicy {
    /// Only an undecodable reply aborts; application codes are logged
    #[default]
    Advisory,
    /// Any result code other than the success code aborts
    Strict,
}

/// Manual confirmation gate settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationSettings {
    /// Give up waiting after this many seconds; wait forever when unset
    pub timeout_secs: Option<u64>,
    /// Answers the terminal prompt accepts as "confirmed"
    pub affirmatives: Vec<String>,
}

impl Default for ConfirmationSettings {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            affirmatives: vec!["네".to_string(), "yes".to_string(), "y".to_string()],
        }
    }
}
