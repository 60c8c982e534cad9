//! Record type schemas and the registry that owns them.
//!
//! # Design
//! Each remote resource is described once by a `RecordType`: its field
//! descriptors plus static facts such as the resource path and identity
//! field. Types are collected by a `RegistryBuilder`, checked for dangling
//! nested-type references, and frozen into a `Registry`. After `build` the
//! registry is read-only and hands out `Arc<RecordType>` so record instances
//! can share a schema without copying it.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RemoteError, Result};
use crate::http::HttpMethod;

/// The semantic type a field's value is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    String,
    Boolean,
    Int,
    Float,
    Date,
    Object,
}

impl LogicalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalType::String => "string",
            LogicalType::Boolean => "boolean",
            LogicalType::Int => "int",
            LogicalType::Float => "float",
            LogicalType::Date => "date",
            LogicalType::Object => "object",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes one field of a record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub required: bool,
    pub logical_type: LogicalType,
    /// Names the contained record type when `logical_type` is `Object`.
    pub nested_type: Option<String>,
    pub is_collection: bool,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            required: false,
            logical_type,
            nested_type: None,
            is_collection: false,
        }
    }

    pub fn object(name: impl Into<String>, nested_type: impl Into<String>) -> Self {
        Self {
            nested_type: Some(nested_type.into()),
            ..Self::new(name, LogicalType::Object)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }

    /// Human readable form used in type mismatch errors, e.g. `date[]`.
    pub fn expected(&self) -> String {
        let base = match (&self.logical_type, &self.nested_type) {
            (LogicalType::Object, Some(nested)) => nested.clone(),
            (ty, _) => ty.to_string(),
        };
        if self.is_collection {
            format!("{base}[]")
        } else {
            base
        }
    }
}

/// API family a resource lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStem {
    Core,
    Payroll,
    Files,
    Assets,
}

impl ApiStem {
    pub fn path(&self) -> &'static str {
        match self {
            ApiStem::Core => "api.xro/2.0",
            ApiStem::Payroll => "payroll.xro/1.0",
            ApiStem::Files => "files.xro/1.0",
            ApiStem::Assets => "assets.xro/1.0",
        }
    }
}

/// Static description of a remote resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordType {
    pub name: String,
    pub resource_path: String,
    pub root_element: String,
    pub identity_field: String,
    pub api_stem: ApiStem,
    pub pageable: bool,
    pub supported_methods: Vec<HttpMethod>,
    pub properties: BTreeMap<String, PropertyDescriptor>,
}

impl RecordType {
    /// Starts a type with `root_element = name`, `identity_field = <name>ID`,
    /// the core API stem, no paging and GET as the only verb.
    pub fn new(name: impl Into<String>, resource_path: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            root_element: name.clone(),
            identity_field: format!("{name}ID"),
            name,
            resource_path: resource_path.into(),
            api_stem: ApiStem::Core,
            pageable: false,
            supported_methods: vec![HttpMethod::Get],
            properties: BTreeMap::new(),
        }
    }

    pub fn root_element(mut self, root: impl Into<String>) -> Self {
        self.root_element = root.into();
        self
    }

    pub fn identity_field(mut self, field: impl Into<String>) -> Self {
        self.identity_field = field.into();
        self
    }

    pub fn api_stem(mut self, stem: ApiStem) -> Self {
        self.api_stem = stem;
        self
    }

    pub fn pageable(mut self, pageable: bool) -> Self {
        self.pageable = pageable;
        self
    }

    pub fn methods(mut self, methods: &[HttpMethod]) -> Self {
        self.supported_methods = methods.to_vec();
        self
    }

    pub fn property(mut self, descriptor: PropertyDescriptor) -> Self {
        self.properties.insert(descriptor.name.clone(), descriptor);
        self
    }

    pub fn descriptor(&self, field: &str) -> Result<&PropertyDescriptor> {
        self.properties
            .get(field)
            .ok_or_else(|| RemoteError::UnknownField {
                record_type: self.name.clone(),
                field: field.to_string(),
            })
    }

    pub fn supports(&self, method: HttpMethod) -> bool {
        self.supported_methods.contains(&method)
    }
}

/// Frozen set of record types keyed by name.
#[derive(Debug, Default)]
pub struct Registry {
    types: HashMap<String, Arc<RecordType>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn record_type(&self, name: &str) -> Result<Arc<RecordType>> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| RemoteError::UnknownType {
                name: name.to_string(),
            })
    }

    /// Field descriptors of `name`, keyed by field name.
    pub fn describe(&self, name: &str) -> Result<&BTreeMap<String, PropertyDescriptor>> {
        self.types
            .get(name)
            .map(|ty| &ty.properties)
            .ok_or_else(|| RemoteError::UnknownType {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    types: Vec<RecordType>,
}

impl RegistryBuilder {
    /// A later registration under the same name replaces the earlier one.
    pub fn register(mut self, record_type: RecordType) -> Self {
        self.types.retain(|t| t.name != record_type.name);
        self.types.push(record_type);
        self
    }

    /// Freezes the registry. Fails if an object field names a nested type
    /// that was never registered.
    pub fn build(self) -> Result<Registry> {
        let names: Vec<&str> = self.types.iter().map(|t| t.name.as_str()).collect();
        for ty in &self.types {
            for prop in ty.properties.values() {
                if prop.logical_type != LogicalType::Object {
                    continue;
                }
                match prop.nested_type.as_deref() {
                    Some(nested) if names.contains(&nested) => {}
                    Some(nested) => {
                        return Err(RemoteError::UnknownType {
                            name: nested.to_string(),
                        })
                    }
                    None => {
                        return Err(RemoteError::mismatch(
                            &prop.name,
                            "a nested record type",
                            "none",
                        ))
                    }
                }
            }
        }

        debug!(types = self.types.len(), "record type registry built");
        Ok(Registry {
            types: self
                .types
                .into_iter()
                .map(|t| (t.name.clone(), Arc::new(t)))
                .collect(),
        })
    }
}
