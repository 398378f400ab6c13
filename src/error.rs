//! Error types for the worksheet engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure a scheduling, update or reporting operation can hit.

use thiserror::Error;

/// The main error type for the worksheet engine.
///
/// Every core operation returns this error type. A failing operation never
/// commits partial writes, so callers can surface the error as-is.
///
/// # Example
///
/// ```
/// use worksheet_engine::error::EngineError;
///
/// let error = EngineError::NotFound {
///     entity: "worksheet".to_string(),
///     id: "ws-1".to_string(),
/// };
/// assert_eq!(error.to_string(), "worksheet not found: ws-1");
/// assert_eq!(error.kind(), "NOT_FOUND");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input was malformed (bad time string, empty batch, zero target...).
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity that was looked up.
        entity: String,
        /// The identifier that was not found.
        id: String,
    },

    /// The write collides with existing or concurrently changed state.
    #[error("Conflict: {message}")]
    Conflict {
        /// A description of the conflict.
        message: String,
    },

    /// The actor lacks the role or leadership needed for the operation.
    #[error("Permission denied for actor '{actor_id}': {message}")]
    PermissionDenied {
        /// The actor that was refused.
        actor_id: String,
        /// Why the actor was refused.
        message: String,
    },

    /// The request is well-formed but inconsistent with stored data.
    #[error("Bad request: {message}")]
    BadRequest {
        /// A description of the inconsistency.
        message: String,
    },

    /// A configuration value or shift type code is not recognised.
    #[error("Configuration error: {message}")]
    Configuration {
        /// A description of the configuration problem.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl EngineError {
    /// Returns the stable taxonomy code for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation { .. } => "VALIDATION_ERROR",
            EngineError::NotFound { .. } => "NOT_FOUND",
            EngineError::Conflict { .. } => "CONFLICT",
            EngineError::PermissionDenied { .. } => "PERMISSION_DENIED",
            EngineError::BadRequest { .. } => "BAD_REQUEST",
            EngineError::Configuration { .. }
            | EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. } => "CONFIGURATION_ERROR",
        }
    }

    /// Shorthand for a [`EngineError::Validation`].
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`EngineError::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`EngineError::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        EngineError::Conflict {
            message: message.into(),
        }
    }

    /// Shorthand for a [`EngineError::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        EngineError::BadRequest {
            message: message.into(),
        }
    }

    /// Shorthand for a [`EngineError::PermissionDenied`].
    pub fn permission_denied(actor_id: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::PermissionDenied {
            actor_id: actor_id.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_displays_field_and_message() {
        let error = EngineError::validation("plannedOutput", "must be greater than zero");
        assert_eq!(
            error.to_string(),
            "Validation failed for 'plannedOutput': must be greater than zero"
        );
        assert_eq!(error.kind(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_not_found_displays_entity_and_id() {
        let error = EngineError::not_found("group", "g-7");
        assert_eq!(error.to_string(), "group not found: g-7");
    }

    #[test]
    fn test_conflict_displays_message() {
        let error = EngineError::conflict("worksheet already exists for w-1 on 2026-01-15");
        assert_eq!(
            error.to_string(),
            "Conflict: worksheet already exists for w-1 on 2026-01-15"
        );
        assert_eq!(error.kind(), "CONFLICT");
    }

    #[test]
    fn test_permission_denied_displays_actor() {
        let error = EngineError::permission_denied("u-9", "not the leader of group g-1");
        assert_eq!(
            error.to_string(),
            "Permission denied for actor 'u-9': not the leader of group g-1"
        );
    }

    #[test]
    fn test_config_errors_share_kind() {
        let missing = EngineError::ConfigNotFound {
            path: "/missing/engine.yaml".to_string(),
        };
        let parse = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        let unknown = EngineError::Configuration {
            message: "unknown shift type 'NIGHT_12H'".to_string(),
        };
        assert_eq!(missing.kind(), "CONFIGURATION_ERROR");
        assert_eq!(parse.kind(), "CONFIGURATION_ERROR");
        assert_eq!(unknown.kind(), "CONFIGURATION_ERROR");
        assert_eq!(
            parse.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_bad_request() -> EngineResult<()> {
            Err(EngineError::bad_request("hour 9 missing"))
        }

        fn propagates_error() -> EngineResult<()> {
            returns_bad_request()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
