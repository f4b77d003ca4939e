use std::str::FromStr;
use thiserror::Error;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;
use validator::{Validate, ValidationError, ValidationErrors};

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Error, PartialEq)]
pub enum ValidateContentError {
    #[error("Invalid `{field}`: {reason}")]
    Expected { field: &'static str, reason: String },
}

impl ValidateContentError {
    pub fn new(field: &'static str, reason: impl ToString) -> Self {
        Self::Expected {
            field,
            reason: reason.to_string(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::Expected { field, .. } => field,
        }
    }
}

impl From<ValidationErrors> for ValidateContentError {
    /// Reports the first offending field, sorted so the message is stable.
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<_> = field_errors.into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);
        match fields.first() {
            Some((field, errs)) => {
                let reason = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "value out of range".to_string());
                Self::new(*field, reason)
            }
            None => Self::new("query", "invalid request"),
        }
    }
}

/// Records a range violation for `field` unless `value` is finite and lies within `[min, max]`.
pub fn check_range(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: f64,
    min: Option<f64>,
    max: Option<f64>,
) {
    if value.is_finite() && validator::validate_range(value, min, max) {
        return;
    }
    let bounds = match (min, max) {
        (Some(min), Some(max)) => format!("must be within [{min}, {max}]"),
        (Some(min), None) => format!("must be at least {min}"),
        (None, Some(max)) => format!("must be at most {max}"),
        (None, None) => "is out of range".to_string(),
    };
    let mut error = ValidationError::new("range");
    error.message = Some(bounds.into());
    errors.add(field, error);
}

pub fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub trait ValidateContent {
    fn validate_content(&self) -> Result<(), ValidateContentError>;
}

impl<T: Validate> ValidateContent for T {
    fn validate_content(&self) -> Result<(), ValidateContentError> {
        self.validate().map_err(ValidateContentError::from)
    }
}

/// Parses an optional raw query value, naming `field` when it does not parse.
pub fn parse_field<T>(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, ValidateContentError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| ValidateContentError::new(field, format!("`{value}` {e}"))),
    }
}

pub fn require_field<T>(field: &'static str, raw: Option<&str>) -> Result<T, ValidateContentError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_field(field, raw)?.ok_or_else(|| ValidateContentError::new(field, "is required"))
}

pub fn parse_date(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<Date>, ValidateContentError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => Date::parse(value, DATE_FORMAT).map(Some).map_err(|_| {
            ValidateContentError::new(field, format!("`{value}` is not a YYYY-MM-DD date"))
        }),
    }
}

/// Query flags arrive as text; accepts the usual spellings of true/false.
pub fn parse_flag(field: &'static str, raw: Option<&str>) -> Result<bool, ValidateContentError> {
    match raw.map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("") => Ok(false),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(ValidateContentError::new(
            field,
            format!("`{other}` is not a boolean"),
        )),
    }
}
