//! Request-shape validation.
//!
//! Every failure is an [`ApiError::BadRequest`] with a stable message of the
//! form `<field> is required`, `<field> must be ...`, `<field> too long` or
//! `<field> contains invalid characters`.

use crate::error::ApiError;
use axum::http::{header, HeaderMap};
use ragvault_memory::metadata::coerce_value;
use ragvault_security::{SanitizeError, Sanitizer};
use serde_json::{Map, Value};

/// Results returned when a query omits `num_docs`.
pub const DEFAULT_NUM_DOCS: usize = 10;
/// Upper bound on `num_docs`.
pub const MAX_NUM_DOCS: usize = 100;
/// Upper bound on documents per `add_documents` call.
pub const MAX_BATCH_DOCS: usize = 100;

/// A JSON request body.
pub type Body = Map<String, Value>;

/// Check the content type and parse the body as a JSON object.
pub fn json_body(headers: &HeaderMap, bytes: &[u8]) -> Result<Body, ApiError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let mime = v.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("application/json")
        })
        .unwrap_or(false);
    if !is_json {
        return Err(ApiError::bad_request("Content-Type must be application/json"));
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::bad_request("Request body must be a JSON object")),
        Err(_) => Err(ApiError::bad_request("Request body is not valid JSON")),
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

fn check_text(sanitizer: &Sanitizer, field: &str, text: &str) -> Result<(), ApiError> {
    sanitizer.validate(text).map_err(|e| match e {
        SanitizeError::TooLong => ApiError::bad_request(format!("{field} too long")),
        SanitizeError::ControlCharacters => {
            ApiError::bad_request(format!("{field} contains invalid characters"))
        }
    })
}

/// A required, non-empty string field within the size and character policy.
pub fn required_text(body: &Body, field: &str, sanitizer: &Sanitizer) -> Result<String, ApiError> {
    let value = body.get(field);
    if is_missing(value) {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    let Some(text) = value.and_then(Value::as_str) else {
        return Err(ApiError::bad_request(format!("{field} must be a string")));
    };
    check_text(sanitizer, field, text)?;
    Ok(text.to_string())
}

/// An optional boolean field, `false` when absent.
pub fn optional_bool(body: &Body, field: &str) -> Result<bool, ApiError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ApiError::bad_request(format!("{field} must be a boolean"))),
    }
}

/// `num_docs`, defaulting to [`DEFAULT_NUM_DOCS`].
pub fn num_docs(body: &Body) -> Result<usize, ApiError> {
    let Some(value) = body.get("num_docs").filter(|v| !v.is_null()) else {
        return Ok(DEFAULT_NUM_DOCS);
    };
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .filter(|n| (1..=MAX_NUM_DOCS).contains(n))
        .ok_or_else(|| {
            ApiError::bad_request(format!(
                "num_docs must be an integer between 1 and {MAX_NUM_DOCS}"
            ))
        })
}

/// Allowed values for a filtered query. Absent means no filtering.
///
/// Scalars are coerced to strings the same way stored metadata is.
pub fn filter_values(body: &Body, field: &str, sanitizer: &Sanitizer) -> Result<Vec<String>, ApiError> {
    let invalid = || ApiError::bad_request(format!("{field} must be a list of strings"));
    let items = match body.get(field) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(invalid()),
    };
    if items.len() > MAX_NUM_DOCS {
        return Err(ApiError::bad_request(format!("{field} too long")));
    }
    items
        .iter()
        .map(|item| match item {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                let value = coerce_value(item);
                check_text(sanitizer, field, &value)?;
                Ok(value)
            }
            _ => Err(invalid()),
        })
        .collect()
}

/// One `[text, {metadata}]` pair. The metadata element may be omitted or null.
pub fn document(
    value: &Value,
    field: &str,
    sanitizer: &Sanitizer,
) -> Result<(String, Map<String, Value>), ApiError> {
    let shape = || {
        ApiError::bad_request(format!(
            "{field} must be a list of [text, metadata] with a string text"
        ))
    };
    let Value::Array(parts) = value else {
        return Err(shape());
    };
    let (text, metadata) = match parts.as_slice() {
        [Value::String(text)] | [Value::String(text), Value::Null] => (text, Map::new()),
        [Value::String(text), Value::Object(meta)] => (text, meta.clone()),
        _ => return Err(shape()),
    };
    if text.is_empty() {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    check_text(sanitizer, field, text)?;
    if Value::Object(metadata.clone()).to_string().chars().count() > sanitizer.max_chars() {
        return Err(ApiError::bad_request(format!("{field} too long")));
    }
    Ok((text.clone(), metadata))
}

/// A required document field.
pub fn required_document(
    body: &Body,
    field: &str,
    sanitizer: &Sanitizer,
) -> Result<(String, Map<String, Value>), ApiError> {
    match body.get(field) {
        value if is_missing(value) => Err(ApiError::bad_request(format!("{field} is required"))),
        Some(value) => document(value, field, sanitizer),
        None => Err(ApiError::bad_request(format!("{field} is required"))),
    }
}

/// A required, non-empty list of documents.
pub fn required_documents(
    body: &Body,
    field: &str,
    sanitizer: &Sanitizer,
) -> Result<Vec<(String, Map<String, Value>)>, ApiError> {
    let value = body.get(field);
    if is_missing(value) {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    let Some(items) = value.and_then(Value::as_array) else {
        return Err(ApiError::bad_request(format!("{field} must be a list")));
    };
    if items.len() > MAX_BATCH_DOCS {
        return Err(ApiError::bad_request(format!(
            "{field} must contain at most {MAX_BATCH_DOCS} documents"
        )));
    }
    items
        .iter()
        .map(|item| document(item, field, sanitizer))
        .collect()
}
