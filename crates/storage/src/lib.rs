//! In-memory storage layer for the anteroom staging store
//!
//! - [`Collection`]: keyed document container with secondary indexes
//! - [`Database`]: the store registry, create-on-first-use for typed lookups
//! - [`index`]: append-only secondary-index buckets

pub mod collection;
pub mod database;
pub mod index;

pub use collection::{Collection, Queryable};
pub use database::Database;
pub use index::{bucket_key, SecondaryIndex};
