// Field validation applied on every write
//
// Storage enforces uniqueness; these checks cover shape rules the schema
// cannot express (blank strings, license format, password length).

use crate::error::{Error, Result};

/// Length of a driver's license number.
pub const LICENSE_NUMBER_LEN: usize = 8;

/// Minimum password length accepted for new identities.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Trim `value` and reject it if nothing is left.
pub fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, "this field is required"));
    }
    Ok(trimmed.to_string())
}

/// License numbers are exactly 3 uppercase ASCII letters followed by 5 digits.
pub fn validate_license_number(value: &str) -> Result<()> {
    if !value.is_ascii() || value.len() != LICENSE_NUMBER_LEN {
        return Err(Error::validation(
            "license_number",
            format!("license number must be exactly {LICENSE_NUMBER_LEN} characters"),
        ));
    }

    let (letters, digits) = value.split_at(3);

    if !letters.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(Error::validation(
            "license_number",
            "first 3 characters must be uppercase letters",
        ));
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::validation(
            "license_number",
            "last 5 characters must be digits",
        ));
    }

    Ok(())
}

pub fn validate_password(value: &str) -> Result<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}
