//! Record instances: field storage, dirty tracking and identity.
//!
//! # Design
//! A `Record` holds coerced values for one remote object and the set of
//! fields written through `set` since it was created or last hydrated. It
//! carries no type-specific logic; everything it knows about its fields comes
//! from the shared `RecordType`. Hydration applies server state atomically:
//! if any recognized field fails coercion, the record is left untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::trace;

use crate::error::{RemoteError, Result};
use crate::schema::{RecordType, Registry};
use crate::value::{self, FieldValue, RawElement};

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    record_type: Arc<RecordType>,
    values: BTreeMap<String, FieldValue>,
    dirty: BTreeSet<String>,
}

impl Record {
    pub fn new(record_type: Arc<RecordType>) -> Self {
        Self {
            record_type,
            values: BTreeMap::new(),
            dirty: BTreeSet::new(),
        }
    }

    /// Builds a record of `record_type` from a raw response element.
    pub fn from_raw(registry: &Registry, record_type: Arc<RecordType>, raw: &RawElement) -> Result<Self> {
        let mut record = Self::new(record_type);
        record.hydrate(registry, raw)?;
        Ok(record)
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    pub fn type_name(&self) -> &str {
        &self.record_type.name
    }

    /// Coerces and stores `value`, marking `field` dirty.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> Result<&mut Self> {
        let desc = self.record_type.descriptor(field)?;
        let value = value::coerce(desc, value.into())?;
        self.values.insert(desc.name.clone(), value);
        self.dirty.insert(desc.name.clone());
        Ok(self)
    }

    /// Current value of `field`, `None` if it was never written.
    pub fn get(&self, field: &str) -> Result<Option<&FieldValue>> {
        self.record_type.descriptor(field)?;
        Ok(self.values.get(field))
    }

    /// Applies server state. Unknown keys are ignored and the dirty set is
    /// cleared; no field becomes dirty.
    pub fn hydrate(&mut self, registry: &Registry, raw: &RawElement) -> Result<()> {
        let mut staged = Vec::with_capacity(raw.len());
        for (key, raw_value) in raw {
            let Some(desc) = self.record_type.properties.get(key) else {
                trace!(record_type = %self.record_type.name, key = %key, "ignoring unknown field");
                continue;
            };
            staged.push((key, value::from_raw(registry, desc, raw_value)?));
        }

        for (key, value) in staged {
            match value {
                Some(value) => self.values.insert(key.clone(), value),
                None => self.values.remove(key),
            };
        }
        self.dirty.clear();
        Ok(())
    }

    /// Value of the identity field, `None` until the server assigns one.
    pub fn identity(&self) -> Option<&FieldValue> {
        self.values.get(&self.record_type.identity_field)
    }

    pub fn dirty_fields(&self) -> &BTreeSet<String> {
        &self.dirty
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Raw form of the record. With `dirty_only`, only fields written via
    /// `set` are included.
    pub fn to_raw(&self, dirty_only: bool) -> RawElement {
        self.values
            .iter()
            .filter(|(name, _)| !dirty_only || self.dirty.contains(*name))
            .map(|(name, value)| (name.clone(), value.to_raw()))
            .collect()
    }

    /// Fails with `MissingRequired` if a required field is unset. Nested
    /// records that are present are validated too.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<String> = self
            .record_type
            .properties
            .values()
            .filter(|desc| desc.required && !self.values.contains_key(&desc.name))
            .map(|desc| desc.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(RemoteError::MissingRequired {
                record_type: self.record_type.name.clone(),
                fields: missing,
            });
        }

        for value in self.values.values() {
            match value {
                FieldValue::Object(nested) => nested.validate()?,
                FieldValue::List(items) => {
                    for nested in items.iter().filter_map(FieldValue::as_record) {
                        nested.validate()?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
