//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`SinewError`] covers the failure modes of the animation
//! pipeline:
//! - Construction-time validation of channels, skeletons and skins
//! - Joint lookups that fall outside a skeleton
//! - Missing collaborators required by the per-frame update
//! - Clip (de)serialization
//!
//! Lookups by name never fail with an error; they return `Option` and let the
//! caller decide whether absence matters.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sinew::errors::{SinewError, Result};
//!
//! fn build() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the animation engine.
#[derive(Error, Debug)]
pub enum SinewError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Input data rejected at construction time (mismatched parallel arrays,
    /// empty sample times, badly ordered joints...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A joint index does not exist in the skeleton being addressed.
    #[error("Joint index out of bounds: {context} (index: {index})")]
    JointIndexOutOfBounds {
        /// Description of what was being accessed
        context: String,
        /// The invalid index
        index: usize,
    },

    // ========================================================================
    // Wiring Errors
    // ========================================================================
    /// A collaborator that the update loop cannot run without was never set.
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SinewError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SinewError::InvalidArgument(msg.into())
    }
}

/// Alias for `Result<T, SinewError>`.
pub type Result<T> = std::result::Result<T, SinewError>;
