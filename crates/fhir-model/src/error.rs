use thiserror::Error;

/// Errors raised while reading a per-patient clinical extract.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The document is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document root is not a JSON object.
    #[error("extract root must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// A named collection is present but is not an array.
    #[error("collection '{name}' must be an array, found {found}")]
    InvalidCollection { name: String, found: &'static str },
}

pub type Result<T> = std::result::Result<T, ExtractError>;

/// Short JSON type name used in error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
