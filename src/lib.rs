//! Anteroom - an in-memory, metadata-driven staging document store
//!
//! Anteroom holds a working set of typed documents in memory, keeps
//! denormalized copies of related documents consistent through one-hop
//! cascade updates, and periodically flushes the whole set to a durable
//! backend as a destructive full resync.
//!
//! # Quick Start
//!
//! ```ignore
//! use anteroom::{
//!     CascadeUpdater, Database, Document, DocumentDescriptor, Metadata, TypeName,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let metadata = Arc::new(
//!     Metadata::builder()
//!         .register(
//!             DocumentDescriptor::builder("user", "users")
//!                 .identity("UserId")
//!                 .build(),
//!         )
//!         .build(),
//! );
//! let db = Arc::new(Database::new(metadata));
//!
//! let users = db.collection_of(&TypeName::from("user"))?;
//! users.save("user1", Document::new("user", json!({ "UserId": "user1" }))?);
//! let doc = users.get_by_id("user1")?;
//! ```
//!
//! # Architecture
//!
//! The in-memory layer (metadata registry, collections, cascade updater)
//! runs synchronously on the caller's thread. Only [`Flusher`] fans out,
//! one worker per collection, joined before it returns.

pub use anteroom_core::{
    extract_field, DependentDescriptor, DescriptorBuilder, Document, DocumentDescriptor, Error,
    FieldDecl, FieldRole, IdentityAccessor, IndexDecl, KeyExtractor, Metadata, MetadataBuilder,
    Result, TypeName, VersionAccessor,
};
pub use anteroom_engine::{
    BackendError, CascadeUpdater, DurableBackend, FlushError, FlushFailure, Flusher,
};
pub use anteroom_storage::{Collection, Database, Queryable};
