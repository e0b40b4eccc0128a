// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for bindery.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all bindery operations.
///
/// Every variant is fatal to the run: the converter is a single-pass batch
/// tool, so there is no partial-page or partial-file recovery.
#[derive(Debug, Error)]
pub enum BinderyError {
    // -- Configuration errors (detected before any page is produced) --
    #[error("invalid setting `{key}`: {reason}")]
    Config { key: String, reason: String },

    #[error("invalid value for `{key}`: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("binding edge must be 'l', 's' or 'n', but got {0:?}")]
    UnknownBindingEdge(String),

    #[error("unknown paper: {0}")]
    UnknownPaper(String),

    #[error("{path} line {line}: {reason}")]
    ConfigFile {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    // -- Resource exhaustion --
    #[error("pushback buffer overflow (capacity {capacity} bytes)")]
    PushbackOverflow { capacity: usize },

    // -- I/O --
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("font error: {0}")]
    Font(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BinderyError {
    /// Whether this error was caused by user-supplied configuration.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::InvalidValue { .. }
                | Self::UnknownBindingEdge(_)
                | Self::UnknownPaper(_)
                | Self::ConfigFile { .. }
        )
    }

    /// Process exit status for this error. Always non-zero.
    pub fn exit_code(&self) -> i32 {
        if self.is_config() { 2 } else { 1 }
    }

    pub(crate) fn invalid(key: &str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.into(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BinderyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_with_two() {
        let err = BinderyError::UnknownBindingEdge("x".into());
        assert!(err.is_config());
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn io_errors_exit_with_one() {
        let err = BinderyError::Read {
            path: PathBuf::from("missing.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(!err.is_config());
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("missing.txt"));
    }

    #[test]
    fn pushback_overflow_is_fatal_not_config() {
        let err = BinderyError::PushbackOverflow { capacity: 256 };
        assert_eq!(err.exit_code(), 1);
    }
}
