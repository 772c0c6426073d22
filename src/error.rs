use redis::RedisError;
use thiserror::Error;

/// Errors raised when a schema is loaded from disk or sent to the search engine.
///
/// Building a [`Schema`](crate::schema::Schema) never fails; every shape problem
/// surfaces here, at transmission time.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index name must not be empty")]
    EmptyIndexName,

    #[error("index '{0}' has no fields")]
    EmptySchema(String),

    #[error("field at position {0} has an empty name")]
    EmptyFieldName(usize),

    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("field '{field}' has invalid weight {weight}, expected a positive number")]
    InvalidWeight {
        field: String,
        weight: f32,
    },

    #[error("field '{field}' has invalid tag separator {separator:?}")]
    InvalidSeparator {
        field: String,
        separator: char,
    },

    #[error("unsupported index store type: {0}")]
    UnsupportedStore(String),

    #[error("redis error: {0}")]
    Redis(#[from] RedisError),

    #[error("schema file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("schema file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
