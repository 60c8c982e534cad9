//! Remote object mapping for a REST accounting API.
//!
//! # Overview
//! Maps typed records to and from the provider's raw element maps, tracks
//! which fields were changed locally, and turns a fluent filter/order/paging
//! description into the provider's query grammar. Requests are built as
//! plain data and handed to a caller-supplied `Transport` (host-does-IO), so
//! the core stays deterministic and easy to test.
//!
//! # Design
//! - `Registry` holds one immutable `RecordType` per resource, built once
//!   and shared behind an `Arc`.
//! - `Record` stores coerced values plus a dirty set; it has no
//!   resource-specific code.
//! - `FilterBuilder` renders `where` expressions; `Query` composes filter,
//!   order, `If-Modified-Since` and paging into an `HttpRequest` and
//!   hydrates the response.
//! - Nothing here is synchronized. A query or record belongs to one caller.
//!
//! ```no_run
//! use remote_core::{models, ClientConfig, Direction, RemoteClient};
//! # fn run(transport: &impl remote_core::Transport) -> remote_core::Result<()> {
//! let client = RemoteClient::new(ClientConfig::from_env()?, models::registry()?);
//! let mut query = client.load(models::BANK_TRANSFER)?;
//! query
//!     .where_("HasAttachments", true)
//!     .or_where("Amount", "20.00")
//!     .order_by("Date", Direction::Desc);
//! let transfers = query.execute(transport)?;
//! # let _ = transfers;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod models;
pub mod query;
pub mod record;
pub mod schema;
pub mod transport;
pub mod value;

pub use client::RemoteClient;
pub use config::ClientConfig;
pub use error::{RemoteError, Result};
pub use filter::{BoolOp, Condition, FilterBuilder, FilterValue};
pub use http::{HttpMethod, HttpRequest};
pub use query::{Direction, Query};
pub use record::Record;
pub use schema::{ApiStem, LogicalType, PropertyDescriptor, RecordType, Registry};
pub use transport::{Transport, TransportError};
pub use value::{FieldValue, RawElement};
