//! Error types for the GoCD transport.
//!
//! # Design
//! Every way a call can end other than success gets its own variant, so
//! callers can tell "the server said no" (`Status`) from "we never got an
//! answer" (`Network`) from "we got an answer we could not use"
//! (`BodyRead`, `Deserialize`). A stale `If-Match` is an ordinary `Status`
//! with code 412; `is_precondition_failed` exists so callers do not have to
//! hard-code the number.

use thiserror::Error;

/// Errors returned by `Transport` operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The base address cannot be used to build requests.
    #[error("invalid server address '{address}': {reason}")]
    Configuration { address: String, reason: String },

    /// A request could not be built at call time (bad endpoint or header value).
    #[error("failed to create request object, url: {url}: {source}")]
    InvalidRequest {
        url: String,
        #[source]
        source: ureq::Error,
    },

    /// Connection, DNS, TLS or timeout failure. Never carries a status code.
    #[error("request failed, url: {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: ureq::Error,
    },

    /// The server answered with a status outside `200..300`.
    #[error("{status} {reason}{}", body_suffix(.body))]
    Status {
        status: u16,
        reason: String,
        body: Option<String>,
    },

    /// A read that should have carried an `ETag` did not, or a write was
    /// attempted without one.
    #[error("missing or empty ETag header, url: {url}")]
    MissingETag { url: String },

    /// The outbound payload could not be encoded as JSON.
    #[error("failed to encode payload: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The response body could not be read to the end.
    #[error("failed to read response body, url: {url}: {source}")]
    BodyRead {
        url: String,
        #[source]
        source: ureq::Error,
    },

    /// The response body was read but is not valid JSON for the target type.
    #[error("failed to parse response body, url: {url}: {source}")]
    Deserialize {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

fn body_suffix(body: &Option<String>) -> String {
    match body {
        Some(body) => format!(": '{body}'"),
        None => String::new(),
    }
}

impl TransportError {
    /// HTTP status of a `Status` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the call gave up because the client-wide timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransportError::Network {
                source: ureq::Error::Timeout(_),
                ..
            }
        )
    }

    /// Whether the server rejected an `If-Match` precondition (412).
    pub fn is_precondition_failed(&self) -> bool {
        self.status() == Some(412)
    }
}

pub type Result<T, E = TransportError> = std::result::Result<T, E>;
