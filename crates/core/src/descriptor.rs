//! Document type descriptors
//!
//! The declaration surface for the metadata registry. Each registered type
//! supplies one [`DocumentDescriptor`]: the destination collection name, the
//! ordered field declarations (identity / version / reference / embedded),
//! and zero or more named secondary-index declarations.
//!
//! Descriptors are built explicitly through [`DescriptorBuilder`] at startup.
//! Nothing is discovered from instance data at runtime: index keys are plain
//! extractor closures registered here, and the identity/version declarations
//! are validated when the metadata registry first resolves them (a builder
//! will happily record a malformed declaration, so misconfiguration surfaces
//! as `Error::Configuration` at resolution time rather than as a panic here).

use crate::document::{Document, TypeName};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Role a declared field plays for its document type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRole {
    /// The string-valued primary id of the document
    Identity,
    /// An integer-valued version counter, at most one per type
    Version,
    /// A string foreign key referencing another type's identity
    Reference(TypeName),
    /// A denormalized copy of another type's document
    Embedded(TypeName),
}

/// One declared field: its name and role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Field name as it appears in the document body
    pub name: String,
    /// The field's declared role
    pub role: FieldRole,
}

/// Extracts one index-key component from a document
///
/// Evaluated on every save against the fixed index set of a collection.
/// Absent fields should yield `Value::Null` so the key tuple keeps its arity.
pub type KeyExtractor = Arc<dyn Fn(&Document) -> Value + Send + Sync>;

/// Extractor reading a single top-level field, `Null` when absent
pub fn extract_field(name: &str) -> KeyExtractor {
    let name = name.to_string();
    Arc::new(move |doc: &Document| doc.field(&name).cloned().unwrap_or(Value::Null))
}

/// A named secondary-index declaration: an ordered list of key extractors
#[derive(Clone)]
pub struct IndexDecl {
    /// Index name, unique within the declaring type
    pub name: String,
    /// Ordered extractors; their outputs form the bucket key tuple
    pub extractors: Vec<KeyExtractor>,
}

impl IndexDecl {
    /// Declare an index with the given name and extractors
    pub fn new(name: impl Into<String>, extractors: Vec<KeyExtractor>) -> Self {
        IndexDecl {
            name: name.into(),
            extractors,
        }
    }
}

impl fmt::Debug for IndexDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexDecl")
            .field("name", &self.name)
            .field("extractors", &self.extractors.len())
            .finish()
    }
}

/// Full declaration of one document type
#[derive(Debug, Clone)]
pub struct DocumentDescriptor {
    type_name: TypeName,
    collection: String,
    fields: Vec<FieldDecl>,
    indexes: Vec<IndexDecl>,
}

impl DocumentDescriptor {
    /// Start building a descriptor for `type_name`, stored in `collection`
    pub fn builder(type_name: impl Into<TypeName>, collection: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder {
            type_name: type_name.into(),
            collection: collection.into(),
            fields: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// The declared type name
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// Destination collection name for documents of this type
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// All field declarations, in declaration order
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// All index declarations, in declaration order
    pub fn indexes(&self) -> &[IndexDecl] {
        &self.indexes
    }

    /// Names of fields declared with the given role filter
    pub fn fields_with<'a>(
        &'a self,
        filter: impl Fn(&FieldRole) -> bool + 'a,
    ) -> impl Iterator<Item = &'a FieldDecl> {
        self.fields.iter().filter(move |f| filter(&f.role))
    }

    /// The first declared reference field targeting `source`, if any
    pub fn reference_to(&self, source: &TypeName) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| matches!(&f.role, FieldRole::Reference(t) if t == source))
            .map(|f| f.name.as_str())
    }
}

/// Builder for [`DocumentDescriptor`]
#[derive(Debug)]
pub struct DescriptorBuilder {
    type_name: TypeName,
    collection: String,
    fields: Vec<FieldDecl>,
    indexes: Vec<IndexDecl>,
}

impl DescriptorBuilder {
    /// Declare the identity field
    pub fn identity(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            role: FieldRole::Identity,
        });
        self
    }

    /// Declare the version field
    pub fn version(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            role: FieldRole::Version,
        });
        self
    }

    /// Declare a reference field (string foreign key) targeting `target`
    pub fn reference(mut self, name: impl Into<String>, target: impl Into<TypeName>) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            role: FieldRole::Reference(target.into()),
        });
        self
    }

    /// Declare a field holding a denormalized copy of `source`
    pub fn embeds(mut self, name: impl Into<String>, source: impl Into<TypeName>) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            role: FieldRole::Embedded(source.into()),
        });
        self
    }

    /// Declare a named index over the given extractors
    pub fn index(mut self, name: impl Into<String>, extractors: Vec<KeyExtractor>) -> Self {
        self.indexes.push(IndexDecl::new(name, extractors));
        self
    }

    /// Finish the descriptor
    pub fn build(self) -> DocumentDescriptor {
        DocumentDescriptor {
            type_name: self.type_name,
            collection: self.collection,
            fields: self.fields,
            indexes: self.indexes,
        }
    }
}
