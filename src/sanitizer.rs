use thiserror::Error;

use crate::{Tainted, Verified};

/// Longest raw id we bother parsing; `i64::MAX` has 19 digits.
const MAX_ID_LEN: usize = 19;

/// Error returned when a tainted value cannot be promoted to `Verified`.
///
/// The message names the field but never echoes the rejected input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} rejected ({kind})")]
pub struct SanitizationError {
    kind: SanitizationErrorKind,
    field: &'static str,
}

impl SanitizationError {
    /// Creates a new sanitization error.
    pub fn new(kind: SanitizationErrorKind, field: &'static str) -> Self {
        Self { kind, field }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> SanitizationErrorKind {
        self.kind
    }

    /// Returns the name of the rejected field.
    pub fn field(&self) -> &'static str {
        self.field
    }
}

/// Why sanitization failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SanitizationErrorKind {
    /// Input is empty or whitespace only.
    #[error("empty")]
    Empty,
    /// Input contains something other than ASCII digits.
    #[error("not numeric")]
    NotNumeric,
    /// Input is numeric but zero or does not fit the id range.
    #[error("out of range")]
    OutOfRange,
}

/// Converts tainted values into verified values.
///
/// Implementations validate first and only then call `Verified::new_unchecked`.
pub trait Sanitizer<T, U = T> {
    /// Sanitizes a tainted value.
    ///
    /// # Errors
    ///
    /// Returns `SanitizationError` if the input fails validation.
    fn sanitize(&self, input: Tainted<T>) -> Result<Verified<U>, SanitizationError>;
}

/// Parses the Telegram subject id header into a positive integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectIdSanitizer;

impl Sanitizer<String, i64> for SubjectIdSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<i64>, SanitizationError> {
        parse_positive_id(&input.into_inner(), "telegram subject id").map(Verified::new_unchecked)
    }
}

/// Parses the browser-claimed admin id header into a positive integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminIdSanitizer;

impl Sanitizer<String, i64> for AdminIdSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<i64>, SanitizationError> {
        parse_positive_id(&input.into_inner(), "admin id").map(Verified::new_unchecked)
    }
}

fn parse_positive_id(raw: &str, field: &'static str) -> Result<i64, SanitizationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SanitizationError::new(SanitizationErrorKind::Empty, field));
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SanitizationError::new(
            SanitizationErrorKind::NotNumeric,
            field,
        ));
    }
    if trimmed.len() > MAX_ID_LEN {
        return Err(SanitizationError::new(
            SanitizationErrorKind::OutOfRange,
            field,
        ));
    }
    match trimmed.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(SanitizationError::new(
            SanitizationErrorKind::OutOfRange,
            field,
        )),
    }
}
