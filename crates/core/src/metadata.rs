//! Type metadata registry
//!
//! Resolves identity/version accessors and the reverse "who embeds me"
//! dependency graph for every registered document type.
//!
//! The registry is constructed once at startup from explicit
//! [`DocumentDescriptor`] registrations and is immutable afterwards.
//! Resolution results are cached per type behind an `RwLock`; two callers
//! racing to resolve the same type may both compute the entry, which is
//! harmless because resolution is a deterministic, idempotent function of
//! the static declarations.

use crate::descriptor::{DocumentDescriptor, FieldRole};
use crate::document::{value_type_name, Document, TypeName};
use crate::error::{Error, Result};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;

/// Reads and writes a type's string identity field
#[derive(Debug)]
pub struct IdentityAccessor {
    type_name: TypeName,
    field: String,
}

impl IdentityAccessor {
    /// Name of the identity field
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Identity value of `doc`
    ///
    /// Fails with `Error::Configuration` when the field is absent or holds
    /// a non-string value.
    pub fn get(&self, doc: &Document) -> Result<String> {
        match doc.field(&self.field) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(Error::configuration(format!(
                "identity field '{}' of type '{}' must be a string, got {}",
                self.field,
                self.type_name,
                value_type_name(other)
            ))),
            None => Err(Error::configuration(format!(
                "identity field '{}' is missing on document of type '{}'",
                self.field, self.type_name
            ))),
        }
    }

    /// Overwrite the identity value of `doc`
    pub fn set(&self, doc: &mut Document, id: &str) {
        doc.set_field(&self.field, Value::String(id.to_string()));
    }
}

/// Reads and writes a type's integer version field
#[derive(Debug)]
pub struct VersionAccessor {
    type_name: TypeName,
    field: String,
}

impl VersionAccessor {
    /// Name of the version field
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Version value of `doc`; `None` when the field is absent or null
    ///
    /// Fails with `Error::Configuration` for non-integer values.
    pub fn get(&self, doc: &Document) -> Result<Option<i64>> {
        match doc.field(&self.field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) if n.is_i64() => Ok(n.as_i64()),
            Some(other) => Err(Error::configuration(format!(
                "version field '{}' of type '{}' must be an integer, got {}",
                self.field,
                self.type_name,
                value_type_name(other)
            ))),
        }
    }

    /// Overwrite the version value of `doc`
    pub fn set(&self, doc: &mut Document, version: i64) {
        doc.set_field(&self.field, Value::from(version));
    }
}

/// Reverse embedding edge: `dependent` holds a copy of `source` at `embed_field`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentDescriptor {
    /// Type whose documents get copied
    pub source: TypeName,
    /// Type holding the denormalized copy
    pub dependent: TypeName,
    /// Field on the dependent where the copy lives
    pub embed_field: String,
    /// The dependent's declared foreign-key field to the source, if any.
    /// When absent, cascade matching falls back to the embedded copy's
    /// identity value.
    pub reference_field: Option<String>,
}

/// Immutable registry of document type metadata
pub struct Metadata {
    descriptors: Vec<Arc<DocumentDescriptor>>,
    by_type: FxHashMap<TypeName, Arc<DocumentDescriptor>>,
    identity_cache: RwLock<FxHashMap<TypeName, Arc<IdentityAccessor>>>,
    version_cache: RwLock<FxHashMap<TypeName, Option<Arc<VersionAccessor>>>>,
    dependents_cache: RwLock<FxHashMap<TypeName, Arc<[DependentDescriptor]>>>,
}

impl Metadata {
    /// Start registering descriptors
    pub fn builder() -> MetadataBuilder {
        MetadataBuilder {
            descriptors: Vec::new(),
        }
    }

    /// Descriptor for `type_name`, `Error::UnknownType` if never registered
    pub fn descriptor(&self, type_name: &TypeName) -> Result<Arc<DocumentDescriptor>> {
        self.by_type
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::UnknownType(type_name.clone()))
    }

    /// All registered descriptors, in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<DocumentDescriptor>> {
        self.descriptors.iter()
    }

    /// Destination collection name for `type_name`
    pub fn collection_name(&self, type_name: &TypeName) -> Result<String> {
        Ok(self.descriptor(type_name)?.collection().to_string())
    }

    /// Resolve the identity accessor for `type_name`
    ///
    /// Fails with `Error::Configuration` when the type declares zero or
    /// more than one identity field. Repeated calls return the same cached
    /// accessor instance.
    pub fn identity(&self, type_name: &TypeName) -> Result<Arc<IdentityAccessor>> {
        if let Some(accessor) = self.identity_cache.read().get(type_name) {
            return Ok(accessor.clone());
        }

        let descriptor = self.descriptor(type_name)?;
        let fields: Vec<&str> = descriptor
            .fields_with(|r| matches!(r, FieldRole::Identity))
            .map(|f| f.name.as_str())
            .collect();

        let field = match fields.as_slice() {
            [one] => one.to_string(),
            [] => {
                return Err(Error::configuration(format!(
                    "document type '{type_name}' declares no identity field"
                )))
            }
            many => {
                return Err(Error::configuration(format!(
                    "document type '{type_name}' declares {} identity fields, exactly one is allowed",
                    many.len()
                )))
            }
        };

        let accessor = Arc::new(IdentityAccessor {
            type_name: type_name.clone(),
            field,
        });
        // Benign race: a concurrent resolver may have inserted an equivalent
        // accessor; keep whichever landed first so callers see a stable Arc.
        let mut cache = self.identity_cache.write();
        Ok(cache
            .entry(type_name.clone())
            .or_insert(accessor)
            .clone())
    }

    /// Resolve the version accessor for `type_name`
    ///
    /// Zero version declarations is valid and yields `None`; more than one
    /// is `Error::Configuration`.
    pub fn version(&self, type_name: &TypeName) -> Result<Option<Arc<VersionAccessor>>> {
        if let Some(entry) = self.version_cache.read().get(type_name) {
            return Ok(entry.clone());
        }

        let descriptor = self.descriptor(type_name)?;
        let fields: Vec<&str> = descriptor
            .fields_with(|r| matches!(r, FieldRole::Version))
            .map(|f| f.name.as_str())
            .collect();

        let accessor = match fields.as_slice() {
            [] => None,
            [one] => Some(Arc::new(VersionAccessor {
                type_name: type_name.clone(),
                field: one.to_string(),
            })),
            many => {
                return Err(Error::configuration(format!(
                    "document type '{type_name}' declares {} version fields, at most one is allowed",
                    many.len()
                )))
            }
        };

        let mut cache = self.version_cache.write();
        Ok(cache
            .entry(type_name.clone())
            .or_insert(accessor)
            .clone())
    }

    /// Types that embed a copy of `type_name`, in registration order
    ///
    /// Scans every registered descriptor for `Embedded(type_name)` fields,
    /// one [`DependentDescriptor`] per matching field. Empty for leaf types.
    pub fn dependents(&self, type_name: &TypeName) -> Arc<[DependentDescriptor]> {
        if let Some(entry) = self.dependents_cache.read().get(type_name) {
            return entry.clone();
        }

        let mut dependents = Vec::new();
        for descriptor in &self.descriptors {
            for field in
                descriptor.fields_with(|r| matches!(r, FieldRole::Embedded(t) if t == type_name))
            {
                dependents.push(DependentDescriptor {
                    source: type_name.clone(),
                    dependent: descriptor.type_name().clone(),
                    embed_field: field.name.clone(),
                    reference_field: descriptor.reference_to(type_name).map(str::to_string),
                });
            }
        }

        let dependents: Arc<[DependentDescriptor]> = dependents.into();
        let mut cache = self.dependents_cache.write();
        cache
            .entry(type_name.clone())
            .or_insert(dependents)
            .clone()
    }
}

impl std::fmt::Debug for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metadata")
            .field("types", &self.descriptors.len())
            .finish()
    }
}

/// Builder collecting descriptor registrations
#[derive(Debug, Default)]
pub struct MetadataBuilder {
    descriptors: Vec<Arc<DocumentDescriptor>>,
}

impl MetadataBuilder {
    /// Register one document type
    pub fn register(mut self, descriptor: DocumentDescriptor) -> Self {
        self.descriptors.push(Arc::new(descriptor));
        self
    }

    /// Freeze the registry
    pub fn build(self) -> Metadata {
        let by_type = self
            .descriptors
            .iter()
            .map(|d| (d.type_name().clone(), d.clone()))
            .collect();
        Metadata {
            descriptors: self.descriptors,
            by_type,
            identity_cache: RwLock::new(FxHashMap::default()),
            version_cache: RwLock::new(FxHashMap::default()),
            dependents_cache: RwLock::new(FxHashMap::default()),
        }
    }
}
