//! Core error types for compdeps.
//!
//! [`DepsError`] covers every server-side failure: marker parsing, registry
//! lookups and conflicts, content cache misses, configuration, and IO.
//! Per-component failures are reported through this type but are never
//! allowed to abort a whole-page rewrite; see `compdeps-html` for that
//! policy.

use std::fmt;
use std::ops::Range;

use thiserror::Error;

/// A rendering marker whose payload could not be parsed.
///
/// Carries the byte range of the offending comment in the source HTML so
/// the caller can report it or strip it.
///
/// # Examples
///
/// ```
/// use compdeps_core::error::MarkerFormatError;
///
/// let err = MarkerFormatError::new("missing instance id", 4..30);
/// assert_eq!(err.span, 4..30);
/// assert!(err.to_string().contains("missing instance id"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerFormatError {
    /// What was wrong with the payload.
    pub message: String,
    /// Byte range of the whole marker comment in the source.
    pub span: Range<usize>,
}

impl MarkerFormatError {
    /// Creates a new `MarkerFormatError`.
    pub fn new(message: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for MarkerFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (bytes {}..{})",
            self.message, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for MarkerFormatError {}

/// The primary error type for compdeps.
///
/// Each variant maps to an HTTP status code via [`DepsError::status_code`],
/// which the fetch endpoint uses directly.
#[derive(Error, Debug)]
pub enum DepsError {
    // ── Markers ──────────────────────────────────────────────────────

    /// A rendering marker had an unparsable payload.
    #[error("Malformed marker: {0}")]
    MarkerFormat(#[from] MarkerFormatError),

    // ── Registry ─────────────────────────────────────────────────────

    /// No component is registered under the given class hash.
    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    /// A component hash was registered again with different assets.
    #[error("Registry conflict: {0}")]
    RegistryConflict(String),

    /// An asset definition is invalid (empty URL, bad kind, ...).
    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    // ── Content cache ────────────────────────────────────────────────

    /// The requested content key and script type were never cached.
    #[error("Cache miss: {0}")]
    CacheMiss(String),

    // ── Input ────────────────────────────────────────────────────────

    /// Input to a rewrite entrypoint was not valid text.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DepsError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `MarkerFormat`, `InvalidInput`, `InvalidAsset` -> 400
    /// - `UnknownComponent`, `CacheMiss` -> 404
    /// - `RegistryConflict` -> 409
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MarkerFormat(_) | Self::InvalidInput(_) | Self::InvalidAsset(_) => 400,
            Self::UnknownComponent(_) | Self::CacheMiss(_) => 404,
            Self::RegistryConflict(_) => 409,
            Self::Configuration(_) | Self::Serialization(_) | Self::Io(_) => 500,
        }
    }
}

/// A convenience type alias for `Result<T, DepsError>`.
pub type DepsResult<T> = Result<T, DepsError>;
