//! The person being verified

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ApplicantError;

const BIRTH_FORMAT: &str = "%Y%m%d";

/// Applicant identity, validated once and read-only afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Applicant {
    name: String,
    birth: NaiveDate,
    phone: String,
}

impl Applicant {
    /// Validate and build an applicant
    ///
    /// `birth` must be `YYYYMMDD`. Spaces and dashes in `phone` are dropped;
    /// what remains must be 10 or 11 digits.
    pub fn new(
        name: impl AsRef<str>,
        birth: impl AsRef<str>,
        phone: impl AsRef<str>,
    ) -> Result<Self, ApplicantError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(ApplicantError::EmptyName);
        }

        let birth_raw = birth.as_ref().trim();
        if birth_raw.len() != 8 || !birth_raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ApplicantError::BirthFormat(birth_raw.to_string()));
        }
        let birth = NaiveDate::parse_from_str(birth_raw, BIRTH_FORMAT)
            .map_err(|_| ApplicantError::BirthDate(birth_raw.to_string()))?;

        let phone_raw = phone.as_ref();
        let phone: String = phone_raw
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();
        if !(10..=11).contains(&phone.len()) || !phone.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ApplicantError::Phone(phone_raw.trim().to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            birth,
            phone,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn birth(&self) -> NaiveDate {
        self.birth
    }

    /// Birth date in the 8-digit wire format
    pub fn birth_digits(&self) -> String {
        self.birth.format(BIRTH_FORMAT).to_string()
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }
}
