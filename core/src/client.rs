//! Entry point binding configuration to a record type registry.
//!
//! # Design
//! `RemoteClient` carries no mutable state: a `ClientConfig` and a shared,
//! read-only `Registry`. It hands out queries and fresh records; the
//! network round-trip stays with whatever `Transport` the caller passes to
//! `Query::execute`.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::query::Query;
use crate::record::Record;
use crate::schema::Registry;
use crate::value::RawElement;

#[derive(Debug, Clone)]
pub struct RemoteClient {
    config: ClientConfig,
    registry: Arc<Registry>,
}

impl RemoteClient {
    pub fn new(config: ClientConfig, registry: impl Into<Arc<Registry>>) -> Self {
        Self {
            config,
            registry: registry.into(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// An unbound query; call `from` before building it.
    pub fn query(&self) -> Query<'_> {
        Query::new(self)
    }

    /// A query already bound to `record_type`.
    pub fn load(&self, record_type: &str) -> Result<Query<'_>> {
        let mut query = Query::new(self);
        query.from(record_type)?;
        Ok(query)
    }

    /// An empty, unsaved record of `record_type`.
    pub fn new_record(&self, record_type: &str) -> Result<Record> {
        Ok(Record::new(self.registry.record_type(record_type)?))
    }

    /// Hydrates a single raw element, e.g. one returned by a save.
    pub fn hydrate(&self, record_type: &str, raw: &RawElement) -> Result<Record> {
        Record::from_raw(&self.registry, self.registry.record_type(record_type)?, raw)
    }
}
