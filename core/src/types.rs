//! GoCD resource DTOs.
//!
//! # Design
//! These mirror the JSON GoCD returns but are defined independently of the
//! mock-server crate; the integration tests catch schema drift between the
//! two. Optional string fields default to empty and are skipped when empty,
//! matching how GoCD omits them.

use serde::{Deserialize, Serialize};

/// A single hypermedia link.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Href {
    pub href: String,
}

/// `_links` block attached to most GoCD resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Links {
    #[serde(rename = "self", default)]
    pub self_link: Href,
    #[serde(default)]
    pub doc: Href,
}

/// Server version, from `GET /api/version`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Version {
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub build_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub git_sha: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub full_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub commit_url: String,
}

/// The authenticated user, from `GET /api/current_user`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub login_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default)]
    pub email_me: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checkin_aliases: Vec<String>,
}

/// One configuration key of a package. Secure values come back encrypted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Property {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_value: Option<String>,
}

impl Property {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            encrypted_value: None,
        }
    }
}

/// Reference from a package to the repository that defines it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageRepo {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A package definition, from `/api/admin/packages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Package {
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub auto_update: bool,
    pub package_repo: PackageRepo,
    #[serde(default)]
    pub configuration: Vec<Property>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbeddedPackages {
    #[serde(default)]
    pub packages: Vec<Package>,
}

/// Listing returned by `GET /api/admin/packages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllPackages {
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(rename = "_embedded", default)]
    pub embedded: EmbeddedPackages,
}

impl AllPackages {
    pub fn packages(&self) -> &[Package] {
        &self.embedded.packages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn version_parses_server_payload() {
        let json = r#"{
            "_links": {
                "self": {"href": "https://ci.example.com/go/api/version"},
                "doc": {"href": "https://api.gocd.org/#version"}
            },
            "version": "16.6.0",
            "build_number": "3348",
            "git_sha": "a7a5717cbd60c30006314fb8dd529796c93adaf0",
            "full_version": "16.6.0 (3348-a7a5717cbd60c30006314fb8dd529796c93adaf0)",
            "commit_url": "https://github.com/gocd/gocd/commits/a7a5717cbd60c30006314fb8dd529796c93adaf0"
        }"#;
        let version: Version = serde_json::from_str(json).unwrap();
        assert_eq!(version.version, "16.6.0");
        assert_eq!(version.build_number, "3348");
        assert_eq!(
            version.links.unwrap().self_link.href,
            "https://ci.example.com/go/api/version"
        );
    }

    #[test]
    fn package_omits_absent_optional_fields() {
        let package = Package {
            links: None,
            id: "pkg-1".to_string(),
            name: "nginx".to_string(),
            auto_update: true,
            package_repo: PackageRepo {
                id: "repo-1".to_string(),
                name: "yum".to_string(),
            },
            configuration: vec![Property::new("PACKAGE_SPEC", "nginx-1.*")],
        };
        let json = serde_json::to_value(&package).unwrap();
        assert!(json.get("_links").is_none());
        assert_eq!(json["configuration"][0]["value"], "nginx-1.*");
        assert!(json["configuration"][0].get("encrypted_value").is_none());
    }

    #[test]
    fn package_requires_repo_reference() {
        let result: Result<Package, _> = serde_json::from_str(r#"{"id":"p","name":"n"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn all_packages_reads_embedded_list() {
        let json = r#"{"_embedded":{"packages":[
            {"id":"p1","name":"a","auto_update":false,"package_repo":{"id":"r","name":"r"},"configuration":[]}
        ]}}"#;
        let all: AllPackages = serde_json::from_str(json).unwrap();
        assert_eq!(all.packages().len(), 1);
        assert_eq!(all.packages()[0].id, "p1");
    }

    fn property() -> impl Strategy<Value = Property> {
        ("[A-Z_]{1,12}", proptest::option::of(".*"), proptest::option::of("[a-zA-Z0-9+/=]{0,24}"))
            .prop_map(|(key, value, encrypted_value)| Property {
                key,
                value,
                encrypted_value,
            })
    }

    fn package() -> impl Strategy<Value = Package> {
        (
            ".*",
            ".*",
            any::<bool>(),
            ".*",
            ".*",
            proptest::collection::vec(property(), 0..4),
        )
            .prop_map(|(id, name, auto_update, repo_id, repo_name, configuration)| Package {
                links: None,
                id,
                name,
                auto_update,
                package_repo: PackageRepo {
                    id: repo_id,
                    name: repo_name,
                },
                configuration,
            })
    }

    proptest! {
        #[test]
        fn package_survives_json(package in package()) {
            let json = serde_json::to_vec(&package).unwrap();
            let back: Package = serde_json::from_slice(&json).unwrap();
            prop_assert_eq!(back, package);
        }
    }
}
