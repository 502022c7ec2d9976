//! Engine layer for the anteroom staging store
//!
//! - [`CascadeUpdater`]: path mutation plus one-hop denormalized-copy
//!   propagation
//! - [`Flusher`]: concurrent full-resync of every collection to a
//!   [`DurableBackend`]

pub mod cascade;
pub mod flush;

pub use cascade::CascadeUpdater;
pub use flush::{BackendError, DurableBackend, FlushError, FlushFailure, Flusher};
