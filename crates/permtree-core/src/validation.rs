//! Syntax checks for delimiters, handles and pagination parameters.
//!
//! Permission strings are built by plain concatenation, so these checks
//! are what keep a derived permission unambiguous: delimiters come from a
//! closed set and a handle may never contain its server's delimiter.

use thiserror::Error;

/// Characters a resource server may use as its delimiter.
pub const VALID_DELIMITER_CHARACTERS: &str = "._:-/";

/// Maximum handle length in bytes.
pub const MAX_HANDLE_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("delimiter must be a single character from `._:-/`")]
    InvalidDelimiter,

    #[error("handle must be at most 100 characters of a-z A-Z 0-9 . _ : - /")]
    InvalidHandle,

    #[error("handle cannot contain the delimiter character")]
    DelimiterInHandle,

    #[error("limit must be between 1 and the maximum page size")]
    InvalidLimit,

    #[error("offset must be a non-negative integer")]
    InvalidOffset,
}

fn is_valid_permission_character(c: char) -> bool {
    c.is_ascii_alphanumeric() || VALID_DELIMITER_CHARACTERS.contains(c)
}

/// Accepts exactly one character from [`VALID_DELIMITER_CHARACTERS`].
pub fn validate_delimiter(delimiter: &str) -> Result<(), ValidationError> {
    let mut chars = delimiter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if VALID_DELIMITER_CHARACTERS.contains(c) => Ok(()),
        _ => Err(ValidationError::InvalidDelimiter),
    }
}

/// Checks handle length and character class, then rejects handles that
/// contain `delimiter`.
///
/// Emptiness is not checked here; callers treat an empty handle as a
/// malformed request before reaching this point.
pub fn validate_handle(handle: &str, delimiter: &str) -> Result<(), ValidationError> {
    if handle.len() > MAX_HANDLE_LENGTH {
        return Err(ValidationError::InvalidHandle);
    }
    if !handle.chars().all(is_valid_permission_character) {
        return Err(ValidationError::InvalidHandle);
    }
    if !delimiter.is_empty() && handle.contains(delimiter) {
        return Err(ValidationError::DelimiterInHandle);
    }
    Ok(())
}

/// Bounds-checks a page request: `1 <= limit <= max_page_size`, `offset >= 0`.
pub fn validate_pagination(
    limit: i64,
    offset: i64,
    max_page_size: u64,
) -> Result<(), ValidationError> {
    if limit < 1 || limit as u64 > max_page_size {
        return Err(ValidationError::InvalidLimit);
    }
    if offset < 0 {
        return Err(ValidationError::InvalidOffset);
    }
    Ok(())
}
