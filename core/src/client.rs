//! GoCD API façade over `Transport`.
//!
//! # Design
//! `GocdClient` only picks the endpoint, the `Accept` version and the DTO for
//! each call; all request building, auth and error classification live in
//! `Transport`. Endpoints are relative to the server's `/go` root, so the
//! base address passed to `new` should include it
//! (e.g. `https://ci.example.com/go`).

use crate::error::Result;
use crate::http::{ACCEPT_V1, ACCEPT_V2};
use crate::transport::Transport;
use crate::types::{AllPackages, CurrentUser, Package, Version};

const VERSION_ENDPOINT: &str = "/api/version";
const CURRENT_USER_ENDPOINT: &str = "/api/current_user";
const PACKAGES_ENDPOINT: &str = "/api/admin/packages";

/// Typed client for the GoCD resources this crate knows about.
#[derive(Debug, Clone)]
pub struct GocdClient {
    transport: Transport,
}

impl GocdClient {
    pub fn new(server_url: &str) -> Result<Self> {
        Ok(Self::from_transport(Transport::new(server_url)?))
    }

    pub fn from_transport(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn set_basic_auth(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.transport.set_basic_auth(username, password);
    }

    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.transport.set_access_token(token);
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.transport.set_debug(debug);
    }

    pub fn version(&self) -> Result<Version> {
        self.transport.fetch(VERSION_ENDPOINT, ACCEPT_V1)
    }

    pub fn current_user(&self) -> Result<CurrentUser> {
        self.transport.fetch(CURRENT_USER_ENDPOINT, ACCEPT_V1)
    }

    pub fn all_packages(&self) -> Result<AllPackages> {
        self.transport.fetch(PACKAGES_ENDPOINT, ACCEPT_V2)
    }

    pub fn package(&self, package_id: &str) -> Result<Package> {
        self.transport.fetch(&package_endpoint(package_id), ACCEPT_V2)
    }

    /// Fetch a package together with the ETag needed to update it.
    pub fn package_with_etag(&self, package_id: &str) -> Result<(Package, String)> {
        self.transport
            .fetch_with_etag(&package_endpoint(package_id), ACCEPT_V2)
    }

    pub fn create_package(&self, package: &Package) -> Result<Package> {
        self.transport.create(package, PACKAGES_ENDPOINT, ACCEPT_V2)
    }

    /// Replace the package identified by `package.id`.
    pub fn update_package(&self, package: &Package, etag: &str) -> Result<Package> {
        self.transport
            .replace(package, etag, &package_endpoint(&package.id), ACCEPT_V2)
    }

    pub fn delete_package(&self, package_id: &str) -> Result<String> {
        self.transport
            .delete(&package_endpoint(package_id), ACCEPT_V2)
    }
}

fn package_endpoint(package_id: &str) -> String {
    format!("{PACKAGES_ENDPOINT}/{package_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Auth;

    #[test]
    fn package_endpoint_appends_id() {
        assert_eq!(package_endpoint("pkg-1"), "/api/admin/packages/pkg-1");
    }

    #[test]
    fn setters_reach_the_transport() {
        let mut client = GocdClient::new("http://localhost:8153/go").unwrap();
        client.set_access_token("t");
        assert_eq!(client.transport().auth(), &Auth::bearer("t"));

        client.set_basic_auth("u", "p");
        assert_eq!(client.transport().auth(), &Auth::basic("u", "p"));

        client.set_debug(true);
        assert!(client.transport().is_debug());
    }

    #[test]
    fn new_propagates_configuration_errors() {
        assert!(GocdClient::new("localhost:8153").is_err());
    }
}
