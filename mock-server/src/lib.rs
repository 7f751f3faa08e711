//! In-process stand-in for the parts of the GoCD API the client talks to.
//!
//! Behaves like the real server where it matters to the client: resources
//! are only served for the exact `Accept` version they were registered
//! under, package representations carry an `ETag`, updates require a
//! matching `If-Match`, and deletes answer with a `{"message": ...}` body.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const ACCEPT_V1: &str = "application/vnd.go.cd.v1+json";
pub const ACCEPT_V2: &str = "application/vnd.go.cd.v2+json";

pub const SERVER_VERSION: &str = "16.6.0";
pub const BUILD_NUMBER: &str = "3348";
const GIT_SHA: &str = "a7a5717cbd60c30006314fb8dd529796c93adaf0";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageRepo {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Property {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_value: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Package {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub auto_update: bool,
    pub package_repo: PackageRepo,
    #[serde(default)]
    pub configuration: Vec<Property>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

struct StoredPackage {
    package: Package,
    revision: u64,
}

impl StoredPackage {
    fn etag(&self) -> String {
        format!("\"{}-{}\"", self.package.id, self.revision)
    }
}

type Db = Arc<RwLock<HashMap<String, StoredPackage>>>;

type Tagged = ([(HeaderName, String); 1], Json<Package>);

/// Error response in GoCD's `{"message": ...}` shape.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "Either the resource you requested was not found, or you are not authorized to perform this action.",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(Message { message: self.message })).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::default();
    Router::new()
        .route("/go/api/version", get(version))
        .route("/go/api/current_user", get(current_user))
        .route("/go/api/admin/packages", get(list_packages).post(create_package))
        .route(
            "/go/api/admin/packages/{id}",
            get(get_package).put(update_package).delete(delete_package),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// GoCD answers 404 when the requested API version does not exist.
fn require_accept(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if accept == expected {
        Ok(())
    } else {
        Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "The url you are trying to reach appears to be incorrect.",
        ))
    }
}

/// Login name behind the `Authorization` header. Any basic password and any
/// non-empty token are accepted; tokens belong to `admin`.
fn login_name(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    if let Some(token) = value.strip_prefix("Bearer ") {
        return (!token.is_empty()).then(|| "admin".to_string());
    }
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (user, _password) = decoded.split_once(':')?;
    (!user.is_empty()).then(|| user.to_string())
}

fn tagged(stored: &StoredPackage) -> Tagged {
    ([(header::ETAG, stored.etag())], Json(stored.package.clone()))
}

async fn version(headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    require_accept(&headers, ACCEPT_V1)?;
    Ok(Json(json!({
        "_links": {
            "self": {"href": "http://localhost/go/api/version"},
            "doc": {"href": "https://api.gocd.org/#version"}
        },
        "version": SERVER_VERSION,
        "build_number": BUILD_NUMBER,
        "git_sha": GIT_SHA,
        "full_version": format!("{SERVER_VERSION} ({BUILD_NUMBER}-{GIT_SHA})"),
        "commit_url": format!("https://github.com/gocd/gocd/commits/{GIT_SHA}")
    })))
}

async fn current_user(headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    require_accept(&headers, ACCEPT_V1)?;
    let login = login_name(&headers)
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "You are not authenticated!"))?;
    Ok(Json(json!({
        "login_name": login,
        "display_name": login,
        "enabled": true,
        "email_me": false,
        "checkin_aliases": []
    })))
}

async fn list_packages(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    require_accept(&headers, ACCEPT_V2)?;
    let packages = db.read().await;
    let mut listed: Vec<&Package> = packages.values().map(|stored| &stored.package).collect();
    listed.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(Json(json!({ "_embedded": { "packages": listed } })))
}

async fn create_package(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(mut input): Json<Package>,
) -> Result<Tagged, ApiError> {
    require_accept(&headers, ACCEPT_V2)?;
    if input.id.is_empty() {
        input.id = Uuid::new_v4().to_string();
    }
    let mut packages = db.write().await;
    if packages.contains_key(&input.id) {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Failed to add package '{}'. Another package with the same id already exists.", input.id),
        ));
    }
    let stored = StoredPackage {
        package: input,
        revision: 1,
    };
    let response = tagged(&stored);
    packages.insert(stored.package.id.clone(), stored);
    Ok(response)
}

async fn get_package(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Tagged, ApiError> {
    require_accept(&headers, ACCEPT_V2)?;
    let packages = db.read().await;
    packages.get(&id).map(tagged).ok_or_else(ApiError::not_found)
}

async fn update_package(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(mut input): Json<Package>,
) -> Result<Tagged, ApiError> {
    require_accept(&headers, ACCEPT_V2)?;
    let mut packages = db.write().await;
    let stored = packages.get_mut(&id).ok_or_else(ApiError::not_found)?;

    let if_match = headers
        .get(header::IF_MATCH)
        .and_then(|value| value.to_str().ok());
    if if_match != Some(stored.etag().as_str()) {
        return Err(ApiError::new(
            StatusCode::PRECONDITION_FAILED,
            format!(
                "Someone has modified the configuration for package '{id}'. Please update your copy of the config with the changes and try again."
            ),
        ));
    }

    if input.id.is_empty() {
        input.id = id.clone();
    } else if input.id != id {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Renaming the package id is not supported by this API.",
        ));
    }

    stored.package = input;
    stored.revision += 1;
    Ok(tagged(stored))
}

async fn delete_package(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Message>, ApiError> {
    require_accept(&headers, ACCEPT_V2)?;
    let mut packages = db.write().await;
    packages.remove(&id).ok_or_else(ApiError::not_found)?;
    Ok(Json(Message {
        message: format!("The package definition '{id}' was deleted successfully."),
    }))
}
