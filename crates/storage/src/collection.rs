//! Indexed in-memory document collection
//!
//! A [`Collection`] owns an `id → Document` map plus zero or more named
//! secondary indexes, all behind one `RwLock`. Operations execute on the
//! caller's thread; the lock makes sharing an `Arc<Collection>` across
//! threads sound, but `update` is still a read-modify-write and two
//! concurrent updates on the same id can lose one writer's change. Callers
//! needing stronger guarantees serialize per identity.
//!
//! ## Index fixing
//!
//! The set of indexes a collection maintains is fixed by the first document
//! ever saved into it: that document's declared type contributes its index
//! declarations, and every later save (any type) is keyed through that same
//! fixed set. First-writer-wins, not per-type binding.

use crate::index::{bucket_key, SecondaryIndex};
use anteroom_core::{Document, Error, IndexDecl, Metadata, Result};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Default)]
struct CollectionInner {
    documents: FxHashMap<String, Document>,
    /// Fixed on first save; `None` until then
    index_set: Option<Arc<[IndexDecl]>>,
    indexes: FxHashMap<String, SecondaryIndex>,
}

/// A keyed container for documents, plus its secondary indexes
pub struct Collection {
    name: String,
    metadata: Arc<Metadata>,
    inner: RwLock<CollectionInner>,
}

impl Collection {
    /// Create an empty collection
    pub fn new(name: impl Into<String>, metadata: Arc<Metadata>) -> Self {
        Collection {
            name: name.into(),
            metadata,
            inner: RwLock::new(CollectionInner::default()),
        }
    }

    /// Logical name of this collection
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetch a document by id
    ///
    /// Fails with `Error::DocumentNotFound` when absent. Returns a clone;
    /// the collection keeps exclusive ownership of the stored instance.
    pub fn get_by_id(&self, id: &str) -> Result<Document> {
        self.inner
            .read()
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| Error::DocumentNotFound {
                collection: self.name.clone(),
                id: id.to_string(),
            })
    }

    /// Upsert a document under `id`, then maintain the indexes
    pub fn save(&self, id: &str, document: Document) {
        let mut inner = self.inner.write();
        trace!(collection = %self.name, id, kind = %document.kind(), "save");

        self.ensure_index_set(&mut inner, &document);
        Self::apply_indexes(&mut inner, id, &document);
        inner.documents.insert(id.to_string(), document);
    }

    /// Read-modify-write a document in place
    ///
    /// Reads the current document (`Error::DocumentNotFound` when absent),
    /// applies `mutate`, and writes the result back through [`save`], index
    /// maintenance included. Not atomic against concurrent updaters of the
    /// same id.
    ///
    /// [`save`]: Collection::save
    pub fn update(&self, id: &str, mutate: impl FnOnce(&mut Document)) -> Result<()> {
        let mut document = self.get_by_id(id)?;
        mutate(&mut document);
        self.save(id, document);
        Ok(())
    }

    /// Point-in-time iterable over every document currently stored
    ///
    /// The snapshot is restartable: iterate it as many times as needed.
    /// Filtering and ordering are the caller's business.
    pub fn as_queryable(&self) -> Queryable {
        let inner = self.inner.read();
        Queryable {
            documents: inner.documents.values().cloned().collect::<Vec<_>>().into(),
        }
    }

    /// Snapshot of `(id, document)` pairs, for the flusher
    pub fn snapshot(&self) -> Vec<(String, Document)> {
        self.inner
            .read()
            .documents
            .iter()
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect()
    }

    /// Ids in the bucket keyed by `values` for index `name`
    ///
    /// Bucket lists are append-only, so the result can contain ids whose
    /// current key tuple no longer matches, and repeated saves of one id
    /// repeat it.
    pub fn index_bucket(&self, name: &str, values: &[Value]) -> Vec<String> {
        let key = bucket_key(values);
        self.inner
            .read()
            .indexes
            .get(name)
            .map(|index| index.get(key).to_vec())
            .unwrap_or_default()
    }

    /// Number of documents stored
    pub fn len(&self) -> usize {
        self.inner.read().documents.len()
    }

    /// True when no documents are stored
    pub fn is_empty(&self) -> bool {
        self.inner.read().documents.is_empty()
    }

    /// Names of the indexes the collection has fixed, declaration order not
    /// guaranteed; empty until the first save
    pub fn index_names(&self) -> Vec<String> {
        self.inner
            .read()
            .index_set
            .as_deref()
            .map(|decls| decls.iter().map(|d| d.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Fix the index set from the first saved document's declared type
    fn ensure_index_set(&self, inner: &mut CollectionInner, document: &Document) {
        if inner.index_set.is_some() {
            return;
        }

        let declared = self
            .metadata
            .descriptor(document.kind())
            .map(|descriptor| descriptor.indexes().to_vec())
            .unwrap_or_default();
        debug!(
            collection = %self.name,
            kind = %document.kind(),
            indexes = declared.len(),
            "index set fixed by first saved document"
        );

        for decl in &declared {
            inner
                .indexes
                .insert(decl.name.clone(), SecondaryIndex::new());
        }
        inner.index_set = Some(declared.into());
    }

    /// Evaluate every fixed index against `document` and append to buckets
    fn apply_indexes(inner: &mut CollectionInner, id: &str, document: &Document) {
        let Some(index_set) = inner.index_set.clone() else {
            return;
        };

        for decl in index_set.iter() {
            let values: Vec<Value> = decl
                .extractors
                .iter()
                .map(|extract| extract(document))
                .collect();
            let key = bucket_key(&values);
            if let Some(index) = inner.indexes.get_mut(&decl.name) {
                index.append(key, id);
            }
        }
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("documents", &inner.documents.len())
            .field("indexes", &inner.indexes.len())
            .finish()
    }
}

/// Restartable snapshot of a collection's documents
///
/// Cheap to clone; every iteration walks the same snapshot.
#[derive(Debug, Clone)]
pub struct Queryable {
    documents: Arc<Vec<Document>>,
}

impl Queryable {
    /// Iterate the snapshot
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    /// Number of documents in the snapshot
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<'a> IntoIterator for &'a Queryable {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}
