//! Core types for the anteroom staging store
//!
//! This crate holds the pieces every other layer builds on:
//! - [`Document`]: a typed JSON record with path-based mutation
//! - [`DocumentDescriptor`]: the explicit per-type declaration surface
//! - [`Metadata`]: identity/version resolution and the reverse embedding graph
//! - [`Error`]: the shared error taxonomy

pub mod descriptor;
pub mod document;
pub mod error;
pub mod metadata;

pub use descriptor::{
    extract_field, DescriptorBuilder, DocumentDescriptor, FieldDecl, FieldRole, IndexDecl,
    KeyExtractor,
};
pub use document::{Document, TypeName};
pub use error::{Error, Result};
pub use metadata::{
    DependentDescriptor, IdentityAccessor, Metadata, MetadataBuilder, VersionAccessor,
};
