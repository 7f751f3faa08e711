//! HTTP vocabulary shared by the transport and the GoCD façade.
//!
//! # Design
//! GoCD negotiates API versions through the `Accept` header rather than the
//! URL, so every call names the media type it expects. The constants below
//! cover the versions the façade uses; callers talking to other resource
//! families pass their own string straight to the transport.

/// `Accept` value for v1 resources (version, current user).
pub const ACCEPT_V1: &str = "application/vnd.go.cd.v1+json";
/// `Accept` value for v2 resources (packages).
pub const ACCEPT_V2: &str = "application/vnd.go.cd.v2+json";
pub const ACCEPT_V3: &str = "application/vnd.go.cd.v3+json";
pub const ACCEPT_V4: &str = "application/vnd.go.cd.v4+json";

/// Content type of every request body the transport sends.
pub const APPLICATION_JSON: &str = "application/json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}
