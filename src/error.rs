//! Error types for section loads and panel preloads.
//!
//! The load coordinator treats every loader rejection uniformly regardless of
//! cause; the variants exist so loaders can report what actually went wrong
//! and the message survives into the section record.

use thiserror::Error;

/// Errors produced by section loader functions.
///
/// These errors never escape the coordinator boundary: an exhausted load is
/// converted into section state and the message is stored on the record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The remote data platform was unreachable or returned a transport error
    #[error("network error: {0}")]
    Network(String),

    /// The caller's session was rejected by the data platform
    #[error("authorization error: {0}")]
    Unauthorized(String),

    /// The response arrived but could not be interpreted
    #[error("malformed payload: {0}")]
    Parse(String),

    /// Any other loader failure
    #[error("loader failed: {0}")]
    Other(String),
}

/// Error produced by a deferred UI panel loader.
///
/// Preloading is best-effort: these errors are recorded against the entry and
/// logged, never surfaced to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("preload failed: {0}")]
pub struct PreloadError(pub String);
