//! Configuration errors
//!
//! Resolution itself never fails; only compiling the lookup tables can.

use thiserror::Error;

use crate::fields::CourseField;

/// Errors raised while loading or compiling resolver tables
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Table JSON could not be parsed
    #[error("Invalid table JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A CSS selector in a table failed to parse
    #[error("Invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A text pattern or validator regex failed to compile
    #[error("Invalid pattern for {field}: {source}")]
    InvalidPattern {
        field: CourseField,
        #[source]
        source: regex::Error,
    },

    /// A canonical field has no spec in the table
    #[error("No field spec for {0}")]
    MissingField(CourseField),

    /// A canonical field is specified twice
    #[error("Field {0} is specified more than once")]
    DuplicateField(CourseField),

    /// A field name in the table is not a canonical field
    #[error("Unknown field name: {0}")]
    UnknownField(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
