//! Error types for attribute declaration and accessor invocation.
//!
//! # Invariants
//! - `ConfigurationError` is only produced at declaration time.
//! - `AccessError` is only produced by instance-level reads/writes and is
//!   propagated unchanged through accessor pipelines.

use thiserror::Error;

/// Declaration-time failure. The attribute is not registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unknown attribute option `{0}`")]
    UnknownOption(String),
    #[error("attribute option `{key}` is invalid: expected {expected}")]
    InvalidOption {
        key: &'static str,
        expected: &'static str,
    },
    #[error("attribute options must be a JSON object")]
    OptionsNotAnObject,
    #[error("attribute name must not be blank")]
    BlankName,
    #[error("invalid datastream descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("unsupported validation rule `{rule}` for attribute `{attribute}`")]
    UnsupportedValidation { attribute: String, rule: String },
}

/// Instance-level accessor failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("no accessor registered for `{attribute}` on `{model}`")]
    UnknownAttribute { model: String, attribute: String },
    #[error("undefined method `{method}` on `{model}`")]
    UndefinedMethod { model: String, method: String },
    #[error("transform failed for `{attribute}`: {message}")]
    Transform { attribute: String, message: String },
}

impl AccessError {
    /// Shorthand for a failure raised inside a reader/writer transform.
    pub fn transform(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessError, ConfigurationError};

    #[test]
    fn configuration_errors_render_offending_key() {
        let err = ConfigurationError::UnknownOption("colour".to_string());
        assert_eq!(err.to_string(), "unknown attribute option `colour`");

        let err = ConfigurationError::InvalidOption {
            key: "multiple",
            expected: "a boolean",
        };
        assert!(err.to_string().contains("expected a boolean"));
    }

    #[test]
    fn transform_shorthand_builds_transform_variant() {
        let err = AccessError::transform("title", "boom");
        assert_eq!(
            err,
            AccessError::Transform {
                attribute: "title".to_string(),
                message: "boom".to_string(),
            }
        );
    }
}
