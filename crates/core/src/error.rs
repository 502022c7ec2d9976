//! Error types for the staging store
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::document::TypeName;
use thiserror::Error;

/// Result type alias for staging-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the staging store
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed identity/version declarations: zero or multiple fields,
    /// or a field value of the wrong type
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Document not found by id within a collection
    #[error("document '{id}' not found in collection '{collection}'")]
    DocumentNotFound {
        /// Collection searched
        collection: String,
        /// Document id requested
        id: String,
    },

    /// Name-keyed collection lookup for a collection that was never created
    #[error("collection '{0}' does not exist")]
    CollectionNotFound(String),

    /// Type has not been registered with the metadata registry
    #[error("document type '{0}' is not registered")]
    UnknownType(TypeName),

    /// A dependent store or dependent document could not be located
    /// while a cascade was in flight
    #[error("reference resolution failed: {0}")]
    ReferenceResolution(String),
}

impl Error {
    /// Configuration error with a formatted message
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Reference-resolution error with a formatted message
    pub fn reference(msg: impl Into<String>) -> Self {
        Error::ReferenceResolution(msg.into())
    }
}
