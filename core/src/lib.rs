//! Typed, blocking HTTP client for the GoCD REST API.
//!
//! # Overview
//! `Transport` turns REST endpoints into typed calls: `fetch`,
//! `fetch_with_etag`, `replace`, `create` and `delete`, each generic over the
//! serde types the caller wants on the wire. Authentication (basic or bearer)
//! and optimistic concurrency through `ETag` / `If-Match` are handled here;
//! `GocdClient` is a thin façade that maps GoCD resources onto those calls.
//!
//! # Design
//! - Calls block and never retry. Every failure is a distinct
//!   `TransportError` variant returned to the caller.
//! - The transport never stores ETags; callers thread the tag they last saw
//!   into the next `replace`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod transport;
pub mod types;

pub use auth::Auth;
pub use client::GocdClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{Result, TransportError};
pub use http::{HttpMethod, ACCEPT_V1, ACCEPT_V2, ACCEPT_V3, ACCEPT_V4};
pub use transport::{Transport, TransportBuilder, DEFAULT_TIMEOUT};
pub use types::{AllPackages, CurrentUser, Links, Package, PackageRepo, Property, Version};
