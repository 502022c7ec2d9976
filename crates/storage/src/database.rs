//! Store registry
//!
//! A [`Database`] maps logical collection names to live [`Collection`]
//! instances. Type-keyed lookups create the collection on first use;
//! name-keyed lookups never create, so asking for a name that was never
//! populated is `Error::CollectionNotFound`. Repeated lookups hand back the
//! same `Arc` — cascades rely on that reference identity.

use crate::collection::Collection;
use anteroom_core::{Error, Metadata, Result, TypeName};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of collections, exclusive owner of all in-memory state
pub struct Database {
    metadata: Arc<Metadata>,
    collections: DashMap<String, Arc<Collection>>,
}

impl Database {
    /// Create an empty database over the given metadata registry
    pub fn new(metadata: Arc<Metadata>) -> Self {
        Database {
            metadata,
            collections: DashMap::new(),
        }
    }

    /// The metadata registry this database was built over
    pub fn metadata(&self) -> &Arc<Metadata> {
        &self.metadata
    }

    /// Existing collection by name
    ///
    /// Fails with `Error::CollectionNotFound` when no collection with that
    /// name has been created; name-keyed lookup never creates.
    pub fn collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.collections
            .get(name)
            .map(|entry| entry.clone())
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    /// Collection for a registered type, created on first use
    ///
    /// The key is the type's declared collection name. Every call returns
    /// the same `Arc<Collection>` instance.
    pub fn collection_of(&self, type_name: &TypeName) -> Result<Arc<Collection>> {
        let name = self.metadata.collection_name(type_name)?;
        let collection = self
            .collections
            .entry(name.clone())
            .or_insert_with(|| {
                debug!(collection = %name, %type_name, "collection created");
                Arc::new(Collection::new(name.clone(), self.metadata.clone()))
            })
            .clone();
        Ok(collection)
    }

    /// Every registered collection, for the flusher
    pub fn collections(&self) -> Vec<(String, Arc<Collection>)> {
        self.collections
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of live collections
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// True when no collection has been created yet
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("collections", &self.collections.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anteroom_core::{Document, DocumentDescriptor};
    use serde_json::json;

    fn database() -> Database {
        let metadata = Arc::new(
            Metadata::builder()
                .register(
                    DocumentDescriptor::builder("user", "users")
                        .identity("UserId")
                        .build(),
                )
                .register(
                    DocumentDescriptor::builder("comment", "comments")
                        .identity("CommentId")
                        .reference("UserId", "user")
                        .build(),
                )
                .build(),
        );
        Database::new(metadata)
    }

    #[test]
    fn test_collection_of_creates_on_first_use() {
        let db = database();
        assert!(db.is_empty());

        let users = db.collection_of(&TypeName::from("user")).unwrap();
        assert_eq!(users.name(), "users");
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_collection_of_returns_identical_instance() {
        let db = database();
        let first = db.collection_of(&TypeName::from("comment")).unwrap();
        let second = db.collection_of(&TypeName::from("comment")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_collection_of_unregistered_type_fails() {
        let db = database();
        assert!(matches!(
            db.collection_of(&TypeName::from("vote")),
            Err(Error::UnknownType(_))
        ));
    }

    #[test]
    fn test_name_lookup_does_not_create() {
        let db = database();
        assert!(matches!(
            db.collection("comments"),
            Err(Error::CollectionNotFound(_))
        ));
        assert!(db.is_empty());
    }

    #[test]
    fn test_name_lookup_finds_created_collection() {
        let db = database();
        let created = db.collection_of(&TypeName::from("comment")).unwrap();
        let by_name = db.collection("comments").unwrap();
        assert!(Arc::ptr_eq(&created, &by_name));
    }

    #[test]
    fn test_collections_lists_all() {
        let db = database();
        db.collection_of(&TypeName::from("user")).unwrap();
        db.collection_of(&TypeName::from("comment")).unwrap();

        let users = db.collection("users").unwrap();
        users.save(
            "user1",
            Document::new("user", json!({ "UserId": "user1" })).unwrap(),
        );

        let mut names: Vec<String> = db.collections().into_iter().map(|(n, _)| n).collect();
        names.sort();
        assert_eq!(names, vec!["comments", "users"]);
    }
}
