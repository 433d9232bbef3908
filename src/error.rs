//! Centralized error handling for Vellum
//!
//! This module provides a unified error type that covers all error scenarios
//! in the crate: range arithmetic, tree consistency, decoration building,
//! widget rendering, and frontmatter metadata parsing.

use log::warn;
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Custom Result Type Alias
// ─────────────────────────────────────────────────────────────────────────────

/// A specialized `Result` type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The centralized error type for the crate.
#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Document / Range Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// A byte range does not fit inside the document.
    InvalidRange { from: usize, to: usize, len: usize },

    // ─────────────────────────────────────────────────────────────────────────
    // Tree / Decoration Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The syntax tree violated one of its structural invariants.
    TreeInconsistency { message: String },

    /// Building the decoration set failed.
    DecorationBuild { message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Widget Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Rendering a widget to a fragment failed.
    Render { message: String },

    /// Frontmatter content was present but could not be parsed as YAML.
    Frontmatter {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

// Implement From traits for convenient error conversion
impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Frontmatter {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display trait implementation for user-friendly error messages
// ─────────────────────────────────────────────────────────────────────────────
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidRange { from, to, len } => {
                write!(
                    f,
                    "Invalid range {}..{} for document of length {}",
                    from, to, len
                )
            }
            Error::TreeInconsistency { message } => {
                write!(f, "Syntax tree inconsistency: {}", message)
            }
            Error::DecorationBuild { message } => {
                write!(f, "Failed to build decorations: {}", message)
            }
            Error::Render { message } => {
                write!(f, "Failed to render widget: {}", message)
            }
            Error::Frontmatter { message, .. } => {
                write!(f, "Invalid frontmatter: {}", message)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// std::error::Error trait implementation for error chaining
// ─────────────────────────────────────────────────────────────────────────────
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Frontmatter { source, .. } => source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn std::error::Error + 'static)),
            Error::InvalidRange { .. }
            | Error::TreeInconsistency { .. }
            | Error::DecorationBuild { .. }
            | Error::Render { .. } => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graceful Degradation Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for Result to support graceful degradation.
pub trait ResultExt<T> {
    /// If the result is an error, log it at warning level and return the provided default.
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                warn!("{}: {}. Using default.", context, err);
                default
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
