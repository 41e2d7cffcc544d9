//! Input validation utilities.
//!
//! This module contains functions for validating user inputs to ensure they meet
//! safety and correctness requirements before being written to the database.

use crate::constants::{DEFAULT_IMAGE_CONTENT_TYPE, PERSON_TEXT_MAX_LEN};
use crate::{HopitalError, HopitalResult};

/// Validates the shape of an email address.
///
/// This is a structural check only: a single `@`, a non-empty local part and a
/// dotted domain, no whitespace.
///
/// # Errors
///
/// Returns a `HopitalError::InvalidInput` if the address is malformed.
pub fn validate_email(email: &str) -> HopitalResult<()> {
    if email.chars().count() > PERSON_TEXT_MAX_LEN {
        return Err(HopitalError::InvalidInput(format!(
            "email exceeds maximum length of {} characters",
            PERSON_TEXT_MAX_LEN
        )));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(HopitalError::InvalidInput(
            "email must not contain whitespace".into(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(HopitalError::InvalidInput("email must contain '@'".into()));
    };

    let domain_ok = !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.');

    if local.is_empty() || !domain_ok {
        return Err(HopitalError::InvalidInput(format!(
            "email is not a valid address: {email}"
        )));
    }

    Ok(())
}

/// Reduces an uploaded file name to a safe, stored image name.
///
/// Directory components sent by some clients are dropped, and control
/// characters are rejected.
///
/// # Errors
///
/// Returns a `HopitalError::InvalidInput` if no usable name remains.
pub fn sanitize_file_name(name: Option<&str>) -> HopitalResult<String> {
    let base = name
        .unwrap_or_default()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "." || base == ".." {
        return Err(HopitalError::InvalidInput(
            "uploaded file must have a name".into(),
        ));
    }

    if base.chars().count() > PERSON_TEXT_MAX_LEN {
        return Err(HopitalError::InvalidInput(format!(
            "file name exceeds maximum length of {} characters",
            PERSON_TEXT_MAX_LEN
        )));
    }

    if base.chars().any(char::is_control) {
        return Err(HopitalError::InvalidInput(
            "file name contains control characters".into(),
        ));
    }

    Ok(base.to_string())
}

/// Normalises a declared content type, falling back to
/// [`DEFAULT_IMAGE_CONTENT_TYPE`] when it is absent or not of the form
/// `type/subtype`.
pub fn normalize_content_type(content_type: Option<&str>) -> String {
    let Some(ct) = content_type.map(str::trim).filter(|ct| !ct.is_empty()) else {
        return DEFAULT_IMAGE_CONTENT_TYPE.to_string();
    };

    let essence = ct.split(';').next().unwrap_or_default().trim();
    let well_formed = essence.split_once('/').is_some_and(|(kind, sub)| {
        let token = |s: &str| {
            !s.is_empty()
                && s.bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+".contains(&b))
        };
        token(kind) && token(sub)
    });

    if well_formed {
        ct.to_ascii_lowercase()
    } else {
        DEFAULT_IMAGE_CONTENT_TYPE.to_string()
    }
}
