//! Scripted transport and canned service responses for handshake tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sign_handshake::payload::Form;
use sign_handshake::transport::Headers;
use sign_handshake::{Applicant, HandshakeConfig, HttpResponse, HttpTransport, TransportFailure};

pub const SERVICE_ID: &str = "INIiasTest";
pub const SERVICE_CODE: &str = "02";
pub const TRANSACTION_REF: &str = "T1-mtx-20240611";
pub const AUTH_HASH: &str = "T2-5f1c9e0b7a";
pub const SESSION_TX_ID: &str = "T3-SA-0000412";
pub const DEVICE_TX_ID: &str = "T4-8e02fa1c";

/// One request as the service saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub url: String,
    pub form: Option<Form>,
}

/// Shared view of the requests a transport received
#[derive(Clone, Default)]
pub struct RequestLog(Arc<Mutex<Vec<Recorded>>>);

impl RequestLog {
    pub fn urls(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|r| r.url.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn form_for(&self, url: &str) -> Option<Form> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.url == url)
            .and_then(|r| r.form.clone())
    }

    fn push(&self, recorded: Recorded) {
        self.0.lock().unwrap().push(recorded);
    }
}

/// Answers by URL; unknown URLs fail like a refused connection
pub struct ScriptedTransport {
    routes: HashMap<String, HttpResponse>,
    log: RequestLog,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            log: RequestLog::default(),
        }
    }

    /// Transport answering every endpoint with a well-formed success page
    pub fn happy(config: &HandshakeConfig) -> Self {
        Self::new()
            .route(&config.endpoints.ticket, 200, &ticket_page())
            .route(&config.endpoints.exchange, 200, &exchange_page())
            .route(&config.endpoints.identity, 200, IDENTITY_OK)
            .route(&config.endpoints.confirm, 200, &confirm_page())
            .route(&config.endpoints.status, 200, STATUS_OK)
    }

    pub fn route(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes
            .insert(url.to_string(), HttpResponse::new(status, body));
        self
    }

    pub fn log(&self) -> RequestLog {
        self.log.clone()
    }

    fn answer(&self, url: &str) -> Result<HttpResponse, TransportFailure> {
        self.routes
            .get(url)
            .cloned()
            .ok_or_else(|| TransportFailure::Connect(format!("no route to {url}")))
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str, _headers: &Headers) -> Result<HttpResponse, TransportFailure> {
        self.log.push(Recorded {
            method: "GET",
            url: url.to_string(),
            form: None,
        });
        self.answer(url)
    }

    async fn post_form(
        &self,
        url: &str,
        _headers: &Headers,
        form: &Form,
    ) -> Result<HttpResponse, TransportFailure> {
        self.log.push(Recorded {
            method: "POST",
            url: url.to_string(),
            form: Some(form.clone()),
        });
        self.answer(url)
    }
}

pub fn applicant() -> Applicant {
    Applicant::new("홍길동", "20000101", "01012345678").unwrap()
}

pub fn ticket_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html><body>
<form name="saForm" method="post" action="https://sa.inicis.com/auth">
    <input type="hidden" name="mid" value="{SERVICE_ID}">
    <input type="hidden" name="reqSvcCd" value="{SERVICE_CODE}">
    <input type="hidden" name="mTxId" value="{TRANSACTION_REF}">
    <input type="hidden" name="authHash" value="{AUTH_HASH}">
    <input type="hidden" name="flgFixedUser" value="N">
</form>
</body></html>"#
    )
}

pub fn exchange_page() -> String {
    format!(
        r#"<html><body onload="document.reqForm.submit()">
<form name="reqForm" method="post" action="/request">
    <input type="hidden" id="txId" name="txId" class="tx" value="{SESSION_TX_ID}">
</form>
</body></html>"#
    )
}

pub fn confirm_page() -> String {
    format!(
        r#"<html><head>
<script type="text/javascript">
    var txId = "{SESSION_TX_ID}";
    var hex_txId = "{DEVICE_TX_ID}";
    var pollInterval = 3000;
</script>
</head><body>Check your phone</body></html>"#
    )
}

pub const IDENTITY_OK: &str = r#"{"resultCode":"0000","resultMsg":"성공"}"#;
pub const STATUS_OK: &str = r#"{"resultCode":"0000","resultMsg":"인증성공"}"#;
