use serde_json::{from_slice, Map, Value};
use thiserror::Error;

use crate::models::Submission;

pub const MAX_NAME_CHARS: usize = 30;
pub const MAX_EMAIL_CHARS: usize = 100;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("malformed JSON: {0}")]
    Malformed(String),

    #[error("body is not a non-empty JSON object")]
    NotAnObject,

    #[error("`{0}` is missing or blank")]
    Missing(&'static str),

    #[error("`{0}` must be a string")]
    NotText(&'static str),

    #[error("`score` must be a non-negative integer, got {0}")]
    InvalidScore(Value),
}

/// Validates a raw submission body into a typed [`Submission`].
///
/// `name` and `email` accept JSON strings (numbers are taken as their text),
/// are trimmed and then cut to their maximum length in characters. `score`
/// must be a JSON integer in `0..=i64::MAX`; floats and booleans are refused
/// rather than converted.
pub fn parse_submission(body: &[u8]) -> Result<Submission, ValidationError> {
    let value: Value = from_slice(body).map_err(|e| ValidationError::Malformed(e.to_string()))?;

    let fields = match value {
        Value::Object(fields) if !fields.is_empty() => fields,
        _ => return Err(ValidationError::NotAnObject),
    };

    Ok(Submission {
        name: text_field(&fields, "name", MAX_NAME_CHARS)?,
        email: text_field(&fields, "email", MAX_EMAIL_CHARS)?,
        score: score_field(&fields)?,
    })
}

fn text_field(
    fields: &Map<String, Value>,
    key: &'static str,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let text: String = match fields.get(key) {
        Some(Value::String(text)) => text.trim().chars().take(max_chars).collect(),
        Some(Value::Number(number)) => number.to_string().chars().take(max_chars).collect(),
        Some(Value::Null) | None => return Err(ValidationError::Missing(key)),
        Some(_) => return Err(ValidationError::NotText(key)),
    };

    if text.is_empty() {
        return Err(ValidationError::Missing(key));
    }

    Ok(text)
}

fn score_field(fields: &Map<String, Value>) -> Result<i64, ValidationError> {
    let value = fields.get("score").ok_or(ValidationError::Missing("score"))?;

    match value.as_i64() {
        Some(score) if score >= 0 => Ok(score),
        _ => Err(ValidationError::InvalidScore(value.clone())),
    }
}
