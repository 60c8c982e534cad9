//! The transport collaborator.
//!
//! # Design
//! The core never performs I/O. A `Transport` receives a fully built
//! `HttpRequest`, executes it however it likes (blocking HTTP client, test
//! double, recorded fixture) and returns the response envelope already
//! unwrapped into raw element maps. Retries, auth and timeouts live behind
//! this trait.

use thiserror::Error;

use crate::http::HttpRequest;
use crate::value::RawElement;

/// Opaque failure reported by a transport. The core passes it through
/// untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", describe(.status, .message))]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

fn describe(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("HTTP {status}: {message}"),
        None => message.to_string(),
    }
}

/// Sends one request and returns the raw elements of the response, in the
/// order the provider returned them. Blocks until the response arrives.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<Vec<RawElement>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<Vec<RawElement>, TransportError> {
        (**self).send(request)
    }
}
