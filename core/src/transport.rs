//! Blocking, typed HTTP transport for a GoCD server.
//!
//! # Design
//! `Transport` holds a validated base address, a ureq `Agent`, the active
//! authentication strategy and a debug flag. Every operation follows the
//! same path: build the request, decorate it with `Accept` and credentials,
//! send it, read the whole body, classify the status, then decode JSON into
//! the caller's type. Nothing is retried and nothing is cached between calls;
//! an ETag read by `fetch_with_etag` is handed back to the caller, who passes
//! it to `replace`.
//!
//! The agent is built with `http_status_as_error(false)` and redirects
//! disabled, so every status code reaches `check_status` untouched.
//!
//! Operations take `&self` and the transport is `Send + Sync`, so one
//! instance can serve many threads. The auth setters take `&mut self`, which
//! means credentials are configured before the transport is shared.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use ureq::http::{header, StatusCode, Uri};
use ureq::{Agent, RequestBuilder};

use crate::auth::Auth;
use crate::error::{Result, TransportError};
use crate::http::{HttpMethod, APPLICATION_JSON};

/// Client-wide bound on a single call, body included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Typed HTTP transport bound to one server.
#[derive(Clone)]
pub struct Transport {
    base_url: String,
    agent: Agent,
    auth: Auth,
    debug: bool,
}

/// Builder for a `Transport` with non-default settings.
pub struct TransportBuilder {
    base_url: String,
    timeout: Duration,
    agent: Option<Agent>,
    auth: Auth,
    debug: bool,
}

/// A 2xx response whose body has been read to the end.
struct Exchange {
    url: String,
    etag: Option<String>,
    body: Vec<u8>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DeleteReply {
    message: String,
}

impl TransportBuilder {
    /// Overall timeout of the default agent. Ignored when `agent` is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a caller-configured agent instead of the default one.
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Credentials attached to every request.
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    /// Emit a `debug!` event describing each outgoing request.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Validate the base address and assemble the transport.
    pub fn build(self) -> Result<Transport> {
        let base_url = validate_base_url(&self.base_url)?;
        let agent = self.agent.unwrap_or_else(|| default_agent(self.timeout));
        Ok(Transport {
            base_url,
            agent,
            auth: self.auth,
            debug: self.debug,
        })
    }
}

impl Transport {
    /// Transport with the default one minute timeout and no credentials.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::builder(base_url).build()
    }

    /// Start configuring a transport for `base_url`.
    pub fn builder(base_url: &str) -> TransportBuilder {
        TransportBuilder {
            base_url: base_url.to_string(),
            timeout: DEFAULT_TIMEOUT,
            agent: None,
            auth: Auth::None,
            debug: false,
        }
    }

    /// Base address without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credentials currently in use.
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn set_basic_auth(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.auth = Auth::basic(username, password);
    }

    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.auth = Auth::bearer(token);
    }

    pub fn set_auth(&mut self, auth: Auth) {
        self.auth = auth;
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Absolute URL of `endpoint` on this server.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    /// GET `endpoint` and decode the JSON body.
    pub fn fetch<T: DeserializeOwned>(&self, endpoint: &str, accept: &str) -> Result<T> {
        let exchange = self.execute(HttpMethod::Get, endpoint, accept, None, None)?;
        self.decode(HttpMethod::Get, &exchange)
    }

    /// GET `endpoint`, decode the JSON body and return it with the `ETag`
    /// the server attached to this representation.
    pub fn fetch_with_etag<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        accept: &str,
    ) -> Result<(T, String)> {
        let exchange = self.execute(HttpMethod::Get, endpoint, accept, None, None)?;
        let value = self.decode(HttpMethod::Get, &exchange)?;
        match exchange.etag {
            Some(etag) if !etag.is_empty() => Ok((value, etag)),
            _ => Err(self.fail(
                HttpMethod::Get,
                &exchange.url,
                TransportError::MissingETag { url: exchange.url.clone() },
            )),
        }
    }

    /// PUT `payload` to `endpoint` with `If-Match: etag`.
    ///
    /// A stale tag comes back as a 412 `Status` error; fetch again to get a
    /// fresh tag before retrying.
    pub fn replace<P, R>(&self, payload: &P, etag: &str, endpoint: &str, accept: &str) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        if etag.is_empty() {
            let url = self.url_for(endpoint);
            return Err(self.fail(
                HttpMethod::Put,
                &url,
                TransportError::MissingETag { url: url.clone() },
            ));
        }
        let body = self.encode(HttpMethod::Put, endpoint, payload)?;
        let exchange = self.execute(HttpMethod::Put, endpoint, accept, Some(etag), Some(body))?;
        self.decode(HttpMethod::Put, &exchange)
    }

    /// POST `payload` to `endpoint`.
    pub fn create<P, R>(&self, payload: &P, endpoint: &str, accept: &str) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = self.encode(HttpMethod::Post, endpoint, payload)?;
        let exchange = self.execute(HttpMethod::Post, endpoint, accept, None, Some(body))?;
        self.decode(HttpMethod::Post, &exchange)
    }

    /// DELETE `endpoint` and return the server's `message`.
    pub fn delete(&self, endpoint: &str, accept: &str) -> Result<String> {
        let exchange = self.execute(HttpMethod::Delete, endpoint, accept, None, None)?;
        let reply: DeleteReply = self.decode(HttpMethod::Delete, &exchange)?;
        Ok(reply.message)
    }

    fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        accept: &str,
        if_match: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<Exchange> {
        let url = self.url_for(endpoint);

        if self.debug {
            debug!(
                method = method.as_str(),
                url = %url,
                accept,
                if_match = if_match.is_some(),
                auth = self.auth.kind(),
                body_len = body.as_ref().map_or(0, Vec::len),
                "sending request"
            );
        }

        let sent = match method {
            HttpMethod::Get => self.decorate(self.agent.get(url.as_str()), accept).call(),
            HttpMethod::Delete => self.decorate(self.agent.delete(url.as_str()), accept).call(),
            HttpMethod::Post | HttpMethod::Put => {
                let request = if method == HttpMethod::Post {
                    self.agent.post(url.as_str())
                } else {
                    self.agent.put(url.as_str())
                };
                let mut request = self
                    .decorate(request, accept)
                    .header("Content-Type", APPLICATION_JSON);
                if let Some(etag) = if_match {
                    request = request.header("If-Match", etag);
                }
                request.send(body.as_deref().unwrap_or_default())
            }
        };

        let mut response = match sent {
            Ok(response) => response,
            Err(source) => return Err(self.fail(method, &url, send_error(&url, source))),
        };

        let status = response.status();
        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        // Drain the body on every path so the connection can be released.
        // GoCD listings have no size bound, so neither does the read.
        let body = match response.body_mut().with_config().limit(u64::MAX).read_to_vec() {
            Err(source @ ureq::Error::Timeout(_)) => {
                return Err(self.fail(method, &url, TransportError::Network { url: url.clone(), source }))
            }
            body => body,
        };

        if let Err(err) = check_status(status.as_u16(), body.as_deref().ok()) {
            return Err(self.fail(method, &url, err));
        }

        let body = body.map_err(|source| {
            self.fail(method, &url, TransportError::BodyRead { url: url.clone(), source })
        })?;

        info!(
            method = method.as_str(),
            url = %url,
            status = status.as_u16(),
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        );

        Ok(Exchange { url, etag, body })
    }

    fn decorate<B>(&self, request: RequestBuilder<B>, accept: &str) -> RequestBuilder<B> {
        self.auth.apply(request.header("Accept", accept))
    }

    fn encode<P: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: &P,
    ) -> Result<Vec<u8>> {
        serde_json::to_vec(payload)
            .map_err(|e| self.fail(method, &self.url_for(endpoint), TransportError::Serialization(e)))
    }

    fn decode<T: DeserializeOwned>(&self, method: HttpMethod, exchange: &Exchange) -> Result<T> {
        serde_json::from_slice(&exchange.body).map_err(|source| {
            self.fail(
                method,
                &exchange.url,
                TransportError::Deserialize {
                    url: exchange.url.clone(),
                    source,
                },
            )
        })
    }

    fn fail(&self, method: HttpMethod, url: &str, err: TransportError) -> TransportError {
        error!(method = method.as_str(), url = %url, status = err.status(), "{err}");
        err
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

fn default_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .max_redirects(0)
        .build()
        .new_agent()
}

/// Accept only absolute `http`/`https` addresses with a host. Strips a
/// trailing slash so endpoints can always start with `/`.
fn validate_base_url(base_url: &str) -> Result<String> {
    let invalid = |reason: String| TransportError::Configuration {
        address: base_url.to_string(),
        reason,
    };

    let uri: Uri = base_url.parse().map_err(|e| invalid(format!("{e}")))?;
    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        Some(other) => return Err(invalid(format!("unsupported protocol scheme '{other}'"))),
        None => return Err(invalid("missing protocol scheme".to_string())),
    }
    if uri.host().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(base_url.trim_end_matches('/').to_string())
}

/// Map a failed send onto the error taxonomy.
fn send_error(url: &str, source: ureq::Error) -> TransportError {
    match source {
        // Only reachable with a caller-supplied agent that still treats
        // statuses as errors.
        ureq::Error::StatusCode(status) => TransportError::Status {
            status,
            reason: reason_phrase(status).to_string(),
            body: None,
        },
        ureq::Error::Http(_) | ureq::Error::BadUri(_) => TransportError::InvalidRequest {
            url: url.to_string(),
            source,
        },
        source => TransportError::Network {
            url: url.to_string(),
            source,
        },
    }
}

/// Everything outside `200..300` is an error carrying the body, if it was read.
pub(crate) fn check_status(status: u16, body: Option<&[u8]>) -> Result<()> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    Err(TransportError::Status {
        status,
        reason: reason_phrase(status).to_string(),
        body: body.map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
    })
}

fn reason_phrase(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or_default()
}
