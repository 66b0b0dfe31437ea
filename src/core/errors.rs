//! ATR-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, AttractorError>;

/// Top-level error type for the view engine.
#[derive(Debug, Error)]
pub enum AttractorError {
    #[error("[ATR-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[ATR-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[ATR-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[ATR-2001] dataset load failed: {0}")]
    Load(LoadError),

    #[error("[ATR-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[ATR-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[ATR-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[ATR-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl AttractorError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "ATR-1001",
            Self::MissingConfig { .. } => "ATR-1002",
            Self::ConfigParse { .. } => "ATR-1003",
            Self::Load(_) => "ATR-2001",
            Self::Serialization { .. } => "ATR-2101",
            Self::Io { .. } => "ATR-3002",
            Self::ChannelClosed { .. } => "ATR-3003",
            Self::Runtime { .. } => "ATR-3900",
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for AttractorError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for AttractorError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<LoadError> for AttractorError {
    fn from(value: LoadError) -> Self {
        Self::Load(value)
    }
}

// ──────────────────── load errors ────────────────────

/// Which part of a load cycle reported the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// The metric list request.
    Values,
    /// The file-prefix metadata request.
    FilePrefix,
    /// The runtime could not start the worker that runs the load.
    Worker,
}

impl LoadSource {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Values => "values request",
            Self::FilePrefix => "file_prefix request",
            Self::Worker => "load worker",
        }
    }
}

/// A failed dataset load.
///
/// Network failures and server-reported `{error}` payloads share this one
/// shape; the controller only ever turns it into an error flag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} failed: {message}", .part.label())]
pub struct LoadError {
    pub part: LoadSource,
    pub message: String,
}

impl LoadError {
    #[must_use]
    pub fn new(part: LoadSource, message: impl Into<String>) -> Self {
        Self {
            part,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_errors() -> Vec<AttractorError> {
        vec![
            AttractorError::InvalidConfig {
                details: String::new(),
            },
            AttractorError::MissingConfig {
                path: PathBuf::new(),
            },
            AttractorError::ConfigParse {
                context: "",
                details: String::new(),
            },
            AttractorError::Load(LoadError::new(LoadSource::Values, "")),
            AttractorError::Serialization {
                context: "",
                details: String::new(),
            },
            AttractorError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            AttractorError::ChannelClosed { component: "" },
            AttractorError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = all_errors();
        let codes: Vec<&str> = errors.iter().map(AttractorError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_atr_prefix() {
        for err in &all_errors() {
            assert!(
                err.code().starts_with("ATR-"),
                "code {} must start with ATR-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = AttractorError::InvalidConfig {
            details: "bad value".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ATR-1001"), "display should contain code: {msg}");
        assert!(msg.contains("bad value"), "display should contain details: {msg}");
    }

    #[test]
    fn load_error_converts_and_names_its_source() {
        let err: AttractorError = LoadError::new(LoadSource::FilePrefix, "not found").into();
        assert_eq!(err.code(), "ATR-2001");
        let msg = err.to_string();
        assert!(msg.contains("file_prefix request failed: not found"), "{msg}");
    }

    #[test]
    fn worker_failures_are_not_reported_as_requests() {
        let err = LoadError::new(LoadSource::Worker, "resource temporarily unavailable");
        assert_eq!(
            err.to_string(),
            "load worker failed: resource temporarily unavailable"
        );
        assert!(!err.to_string().contains("request"));
    }

    #[test]
    fn io_convenience_constructor() {
        let err = AttractorError::io(
            "/tmp/values.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "ATR-3002");
        assert!(err.to_string().contains("/tmp/values.json"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: AttractorError = json_err.into();
        assert_eq!(err.code(), "ATR-2101");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: AttractorError = toml_err.into();
        assert_eq!(err.code(), "ATR-1003");
    }
}
