//! Token extraction from semi-structured responses
//!
//! The service answers with HTML forms and inline scripts rather than a clean
//! API. Each token is located by a small per-field pattern; a miss yields
//! [`TokenValue::Absent`] and a log line, never an error. Whether a miss is
//! fatal is decided by the step that needs the token.

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::ServiceReply;
use crate::error::HandshakeError;
use crate::steps::StepKind;

/// Quote delimiter accepted around names and values
const Q: &str = r#"["']"#;
/// Captured value: anything up to the closing quote
const VALUE: &str = r#"([^"']*)"#;

/// Result of looking up one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValue {
    Found(String),
    /// No match in the response; distinct from an empty value
    Absent,
}

impl TokenValue {
    pub fn as_found(&self) -> Option<&str> {
        match self {
            Self::Found(value) => Some(value),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// How a field is located in the response text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// `name="field" value="..."` with only whitespace in between
    FormValue,
    /// `<input ... name="field" ... value="...">` within a single tag
    InputAttribute,
    /// `var field = "..."` (the `var`/`let`/`const` keyword is optional)
    ScriptVariable,
}

impl Matcher {
    fn pattern(self, field: &str) -> String {
        let field = regex::escape(field);
        match self {
            Self::FormValue => format!(r"name={Q}{field}{Q}\s*value={Q}{VALUE}{Q}"),
            Self::InputAttribute => {
                format!(r"<input[^>]+name={Q}{field}{Q}[^>]+value={Q}{VALUE}{Q}")
            }
            Self::ScriptVariable => {
                format!(r"(?:\b(?:var|let|const)\s+)?\b{field}\s*=\s*{Q}{VALUE}{Q}")
            }
        }
    }
}

/// A named field and its compiled matcher
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    matcher: Matcher,
    regex: Regex,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, matcher: Matcher) -> Result<Self, regex::Error> {
        let name = name.into();
        let regex = Regex::new(&matcher.pattern(&name))?;
        Ok(Self {
            name,
            matcher,
            regex,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matcher(&self) -> Matcher {
        self.matcher
    }

    /// First match in `text`
    pub fn find(&self, text: &str) -> TokenValue {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| TokenValue::Found(m.as_str().to_string()))
            .unwrap_or(TokenValue::Absent)
    }
}

/// Extracted tokens in field-spec order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMap {
    entries: Vec<(String, TokenValue)>,
}

impl TokenMap {
    pub fn get(&self, field: &str) -> Option<&TokenValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Value of a field the step cannot proceed without
    ///
    /// Absent and blank values are both missing tokens.
    pub fn require(&self, step: StepKind, field: &str) -> Result<&str, HandshakeError> {
        match self.get(field).and_then(TokenValue::as_found) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(HandshakeError::MissingToken {
                step,
                field: field.to_string(),
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Look up every field in `text`
pub fn extract(text: &str, specs: &[FieldSpec]) -> TokenMap {
    let entries = specs
        .iter()
        .map(|spec| {
            let value = spec.find(text);
            match &value {
                TokenValue::Found(token) => {
                    info!(field = spec.name(), "token extracted");
                    debug!(field = spec.name(), value = %token);
                }
                TokenValue::Absent => warn!(field = spec.name(), "token not found"),
            }
            (spec.name().to_string(), value)
        })
        .collect();
    TokenMap { entries }
}

/// Decode a JSON object reply and pull out `resultCode` / `resultMsg`
pub fn decode_reply(step: StepKind, body: &str) -> Result<ServiceReply, HandshakeError> {
    let value: Value = serde_json::from_str(body).map_err(|e| HandshakeError::Decode {
        step,
        message: e.to_string(),
        raw_body: body.to_string(),
    })?;

    let Value::Object(fields) = &value else {
        return Err(HandshakeError::Decode {
            step,
            message: "expected a JSON object".to_string(),
            raw_body: body.to_string(),
        });
    };

    let text_field = |key: &str| {
        fields.get(key).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    };

    Ok(ServiceReply {
        result_code: text_field("resultCode"),
        result_msg: text_field("resultMsg"),
        body: value.clone(),
    })
}
