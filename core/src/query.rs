//! Fluent fetch queries.
//!
//! # Design
//! A `Query` is a mutable builder over one record type. Filter, order,
//! modification cutoff and paging directives only change builder state;
//! `build_request` derives the wire request from that state and `execute`
//! sends it through a `Transport` and hydrates the response. Both take
//! `&self`, so executing twice with unchanged state sends the same request.
//! A query is single-owner and is not meant to be shared across threads
//! while it is being built.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, trace, warn};

use crate::client::RemoteClient;
use crate::error::{RemoteError, Result};
use crate::filter::{BoolOp, Condition, FilterBuilder, FilterValue};
use crate::http::{HttpMethod, HttpRequest};
use crate::record::Record;
use crate::schema::RecordType;
use crate::transport::Transport;

pub const WHERE_PARAM: &str = "where";
pub const ORDER_PARAM: &str = "order";
pub const PAGE_PARAM: &str = "page";
pub const OFFSET_PARAM: &str = "offset";
pub const IF_MODIFIED_SINCE: &str = "If-Modified-Since";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("ASC"),
            Direction::Desc => f.write_str("DESC"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Query<'a> {
    client: &'a RemoteClient,
    target: Option<Arc<RecordType>>,
    filter: FilterBuilder,
    order: Option<String>,
    modified_after: Option<String>,
    page: Option<u32>,
    offset: Option<u64>,
}

impl<'a> Query<'a> {
    pub fn new(client: &'a RemoteClient) -> Self {
        Self {
            client,
            target: None,
            filter: FilterBuilder::new(),
            order: None,
            modified_after: None,
            page: None,
            offset: None,
        }
    }

    /// Binds the record type to fetch.
    pub fn from(&mut self, record_type: &str) -> Result<&mut Self> {
        let record_type = self.client.registry().record_type(record_type)?;
        debug!(record_type = %record_type.name, "query bound");
        self.target = Some(record_type);
        Ok(self)
    }

    pub fn target(&self) -> Option<&Arc<RecordType>> {
        self.target.as_ref()
    }

    /// Adds `field` compared to `value`, joined with AND.
    pub fn where_(&mut self, field: &str, value: impl Into<FilterValue>) -> &mut Self {
        self.add_where(BoolOp::And, Condition::compare(field, value))
    }

    /// Same as `where_`; reads better in the middle of a chain.
    pub fn and_where(&mut self, field: &str, value: impl Into<FilterValue>) -> &mut Self {
        self.add_where(BoolOp::And, Condition::compare(field, value))
    }

    pub fn or_where(&mut self, field: &str, value: impl Into<FilterValue>) -> &mut Self {
        self.add_where(BoolOp::Or, Condition::compare(field, value))
    }

    /// Adds a pre-built fragment verbatim, joined with AND.
    pub fn where_raw(&mut self, fragment: &str) -> &mut Self {
        self.add_where(BoolOp::And, Condition::raw(fragment))
    }

    pub fn and_where_raw(&mut self, fragment: &str) -> &mut Self {
        self.add_where(BoolOp::And, Condition::raw(fragment))
    }

    pub fn or_where_raw(&mut self, fragment: &str) -> &mut Self {
        self.add_where(BoolOp::Or, Condition::raw(fragment))
    }

    pub fn add_where(&mut self, op: BoolOp, condition: Condition) -> &mut Self {
        self.filter.add_condition(op, condition);
        self
    }

    /// The rendered filter expression, empty when no condition was added.
    pub fn where_clause(&self) -> String {
        self.filter.render()
    }

    pub fn order_by(&mut self, field: &str, direction: Direction) -> &mut Self {
        self.order = Some(format!("{field} {direction}"));
        self
    }

    /// Only fetch records modified after `since`. `None` means the epoch,
    /// which still sends the header.
    pub fn modified_after(&mut self, since: Option<DateTime<Utc>>) -> &mut Self {
        let since = since.unwrap_or_default();
        self.modified_after = Some(since.to_rfc3339_opts(SecondsFormat::Secs, false));
        self
    }

    /// Fails with `UnsupportedOperation` if the bound type cannot page; the
    /// query is left as it was.
    pub fn page(&mut self, page: u32) -> Result<&mut Self> {
        let target = self.target.as_ref().ok_or(RemoteError::UnboundQuery)?;
        if !target.pageable {
            return Err(RemoteError::UnsupportedOperation {
                record_type: target.name.clone(),
                operation: "paging",
            });
        }
        self.page = Some(page);
        Ok(self)
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// The request `execute` would send.
    pub fn build_request(&self) -> Result<HttpRequest> {
        let target = self.target.as_ref().ok_or(RemoteError::UnboundQuery)?;
        if !target.supports(HttpMethod::Get) {
            return Err(RemoteError::UnsupportedMethod {
                record_type: target.name.clone(),
                method: HttpMethod::Get,
            });
        }

        let config = self.client.config();
        let path = format!(
            "{}/{}/{}",
            config.base_url,
            target.api_stem.path(),
            target.resource_path
        );
        let mut request = HttpRequest::new(HttpMethod::Get, path);

        let filter = self.filter.render();
        if !filter.is_empty() {
            request.set_param(WHERE_PARAM, filter);
        }
        if let Some(order) = &self.order {
            request.set_param(ORDER_PARAM, order.as_str());
        }
        if let Some(since) = &self.modified_after {
            request.set_header(IF_MODIFIED_SINCE, since.as_str());
        }
        if let Some(page) = self.page {
            request.set_param(PAGE_PARAM, page.to_string());
        }
        if let Some(offset) = self.offset {
            request.set_param(OFFSET_PARAM, offset.to_string());
        }
        if let Some(user_agent) = &config.user_agent {
            request.set_header("User-Agent", user_agent.as_str());
        }

        debug!(
            record_type = %target.name,
            path = %request.path,
            params = ?request.params.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            "built fetch request"
        );
        Ok(request)
    }

    /// Sends one GET and hydrates every returned element, in response order.
    /// Transport failures are returned unchanged.
    pub fn execute<T: Transport + ?Sized>(&self, transport: &T) -> Result<Vec<Record>> {
        let request = self.build_request()?;
        let target = self.target.as_ref().ok_or(RemoteError::UnboundQuery)?;

        let elements = transport.send(&request).map_err(|e| {
            warn!(record_type = %target.name, error = %e, "fetch failed");
            RemoteError::Transport(e)
        })?;

        let registry = self.client.registry();
        let records = elements
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                trace!(record_type = %target.name, index = i, "hydrating element");
                Record::from_raw(registry, Arc::clone(target), raw)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(record_type = %target.name, count = records.len(), "fetch complete");
        Ok(records)
    }
}
