use once_cell::sync::Lazy;
use regex::Regex;

use crate::appointment::{AppointmentDraft, AppointmentField};
use crate::error::ValidationError;

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^9[0-9]{8}$").expect("phone pattern compiles"));

/// Checks a draft at submit time. Completeness is checked before the phone format.
pub fn validate(draft: &AppointmentDraft) -> Result<(), ValidationError> {
    if AppointmentField::all().any(|field| draft.get(field).trim().is_empty()) {
        return Err(ValidationError::MissingFields);
    }
    if !is_valid_phone(&draft.phone) {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(())
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}
