//! JSON-oriented HTTP transport.
//!
//! [`HttpTransport`] issues GET, POST, PUT, PATCH and DELETE requests with a
//! uniform set of headers, optionally through an HTTP digest handshake, and
//! classifies every response against a set of accepted status codes.
//!
//! # Building a transport
//!
//! ```
//! use std::time::Duration;
//! use opsman::timeouts::RequestTimeouts;
//! use opsman::transport::HttpTransport;
//!
//! let transport = HttpTransport::builder()
//!     .timeouts(RequestTimeouts::new().with_global(Duration::from_secs(60)))
//!     .digest_auth("public-key", "private-key")
//!     .build()?;
//! # Ok::<(), opsman::error::ClientError>(())
//! ```
//!
//! Builder calls are applied in order, so a later call overrides an earlier one.
//!
//! # Security
//!
//! Digest credentials are never logged and are redacted from `Debug` output.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use digest_auth::{AuthContext, HttpMethod};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT, WWW_AUTHENTICATE,
};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ClientError;
use crate::timeouts::RequestTimeouts;

/// Content type sent along with every request body.
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=UTF-8";

/// Accept header: JSON is preferred, anything else is still accepted.
pub const PREFER_JSON: &str = "application/json;q=0.9, */*;q=0.8";

/// Status codes accepted by a transport unless configured otherwise.
pub const DEFAULT_ACCEPTED_STATUS_CODES: [StatusCode; 2] = [StatusCode::OK, StatusCode::CREATED];

/// Product token used in the user agent.
const PRODUCT: &str = "opsman";

/// Maximum length of a non-JSON error body carried in a status error.
const MAX_ERROR_BODY_LEN: usize = 500;

/// User agent identifying this library, the build platform and its version.
///
/// Computed once and handed to each transport explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent(String);

impl UserAgent {
    /// Returns the user agent for the running build.
    pub fn current() -> Self {
        Self::for_version(option_env!("CARGO_PKG_VERSION"))
    }

    /// Builds a user agent for `version`, or `unknown` if no version is known.
    pub fn for_version(version: Option<&str>) -> Self {
        let version = version
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("unknown");
        Self(format!(
            "{}/{} ({}; {})",
            PRODUCT,
            version,
            std::env::consts::OS,
            std::env::consts::ARCH
        ))
    }

    /// Returns the header value as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserAgent {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully prepared request.
///
/// The body is buffered so the request can be replayed after an
/// authentication challenge.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// Request verb.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Headers sent with the request.
    pub headers: HeaderMap,
    /// Encoded request body, if any.
    pub body: Option<Vec<u8>>,
}

impl PreparedRequest {
    fn to_builder(&self, http: &Client) -> reqwest::RequestBuilder {
        let builder = http
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone());
        match &self.body {
            Some(body) => builder.body(body.clone()),
            None => builder,
        }
    }

    /// Returns the request target (path and query) used in digest responses.
    fn digest_uri(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }

    async fn send(&self, http: &Client) -> Result<Response, ClientError> {
        self.to_builder(http)
            .send()
            .await
            .map_err(|e| ClientError::from_transport(self.method.clone(), self.url.as_str(), e))
    }
}

/// Executes one HTTP exchange.
///
/// Implementations decide how a prepared request reaches the server; the
/// transport applies status validation on top.
#[async_trait]
pub trait Exchange: Send + Sync + fmt::Debug {
    /// Sends `request` and returns the final response.
    async fn execute(
        &self,
        http: &Client,
        request: &PreparedRequest,
    ) -> Result<Response, ClientError>;
}

/// Sends requests as they are, without authentication.
#[derive(Debug, Clone, Default)]
pub struct PlainExchange;

#[async_trait]
impl Exchange for PlainExchange {
    async fn execute(
        &self,
        http: &Client,
        request: &PreparedRequest,
    ) -> Result<Response, ClientError> {
        request.send(http).await
    }
}

/// Answers HTTP digest challenges transparently.
///
/// The request is first sent without credentials. A `401` carrying a
/// `Digest` challenge is answered once by replaying the request with an
/// `Authorization` header; any other response is returned unchanged.
#[derive(Clone)]
pub struct DigestExchange {
    username: String,
    secret: String,
}

impl DigestExchange {
    /// Creates a digest exchange for the given credential pair.
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// Computes the `Authorization` header answering `challenge`.
    fn authorization(
        &self,
        request: &PreparedRequest,
        challenge: &str,
    ) -> Result<HeaderValue, ClientError> {
        let mut prompt = digest_auth::parse(challenge)
            .map_err(|e| ClientError::digest(format!("malformed challenge: {}", e)))?;

        let uri = request.digest_uri();
        let context = AuthContext::new_with_method(
            self.username.as_str(),
            self.secret.as_str(),
            uri.as_str(),
            request.body.as_deref(),
            HttpMethod::from(request.method.as_str()),
        );

        let answer = prompt
            .respond(&context)
            .map_err(|e| ClientError::digest(format!("cannot answer challenge: {}", e)))?;

        HeaderValue::from_str(&answer.to_header_string())
            .map_err(|e| ClientError::digest(format!("invalid authorization header: {}", e)))
    }
}

impl fmt::Debug for DigestExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestExchange")
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl Exchange for DigestExchange {
    async fn execute(
        &self,
        http: &Client,
        request: &PreparedRequest,
    ) -> Result<Response, ClientError> {
        let response = request.send(http).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = response
            .headers()
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| {
                value
                    .get(..6)
                    .is_some_and(|scheme| scheme.eq_ignore_ascii_case("digest"))
            })
            .map(str::to_string);

        let Some(challenge) = challenge else {
            tracing::debug!(url = %request.url, "Unauthorized response without a digest challenge");
            return Ok(response);
        };

        tracing::debug!(method = %request.method, url = %request.url, "Answering digest challenge");

        // The challenge body must be consumed for the connection to return to the pool.
        if let Err(e) = response.bytes().await {
            tracing::warn!(url = %request.url, error = %e, "Failed to drain challenge response body");
        }

        let mut authenticated = request.clone();
        authenticated
            .headers
            .insert(AUTHORIZATION, self.authorization(request, &challenge)?);
        authenticated.send(http).await
    }
}

/// Response envelope returned by every transport verb.
///
/// Holds either a response whose status was accepted or the error that
/// prevented it. Check [`HttpResponse::is_error`] before reading the body.
#[derive(Debug)]
pub struct HttpResponse {
    method: Method,
    url: String,
    result: Result<Response, ClientError>,
}

impl HttpResponse {
    /// Returns true if the exchange failed or the status was rejected.
    pub fn is_error(&self) -> bool {
        self.result.is_err()
    }

    /// Returns the failure, if any.
    pub fn error(&self) -> Option<&ClientError> {
        self.result.as_ref().err()
    }

    /// Returns the accepted response, if any.
    pub fn response(&self) -> Option<&Response> {
        self.result.as_ref().ok()
    }

    /// Returns the status of the accepted response, or of the rejected one.
    pub fn status(&self) -> Option<StatusCode> {
        match &self.result {
            Ok(response) => Some(response.status()),
            Err(e) => e.status(),
        }
    }

    /// Returns the request verb.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the absolute request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Converts the envelope into a plain `Result`.
    pub fn into_result(self) -> Result<Response, ClientError> {
        self.result
    }

    /// Reads the whole body.
    ///
    /// # Errors
    ///
    /// Returns the envelope's error, or `ClientError::Http`/`Timeout` if
    /// the body cannot be read.
    pub async fn bytes(self) -> Result<Vec<u8>, ClientError> {
        let Self {
            method,
            url,
            result,
        } = self;
        let response = result?;
        response
            .bytes()
            .await
            .map(|body| body.to_vec())
            .map_err(|e| ClientError::from_transport(method, url, e))
    }

    /// Decodes the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Returns the envelope's error unchanged without touching the body,
    /// or `ClientError::Decode` if the body does not match `T`.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let url = self.url.clone();
        let body = self.bytes().await?;

        // Bodies may carry API keys; only the size is logged.
        tracing::trace!(bytes = body.len(), "Response body");

        serde_json::from_slice(&body).map_err(|source| ClientError::Decode { url, source })
    }

    /// Drains and drops the body of an accepted response.
    ///
    /// A failure while draining is logged and does not change the outcome.
    ///
    /// # Errors
    ///
    /// Returns the envelope's error, if any.
    pub async fn discard(self) -> Result<(), ClientError> {
        let response = self.result?;
        if let Err(e) = response.bytes().await {
            tracing::warn!(url = %self.url, error = %e, "Failed to drain response body");
        }
        Ok(())
    }
}

/// Builder for [`HttpTransport`].
///
/// Starts from the default timeouts and the default accepted status codes.
#[derive(Debug, Clone)]
pub struct TransportBuilder {
    timeouts: RequestTimeouts,
    accepted_status_codes: Vec<StatusCode>,
    digest: Option<DigestExchange>,
    user_agent: UserAgent,
}

impl Default for TransportBuilder {
    fn default() -> Self {
        Self {
            timeouts: RequestTimeouts::default(),
            accepted_status_codes: DEFAULT_ACCEPTED_STATUS_CODES.to_vec(),
            digest: None,
            user_agent: UserAgent::current(),
        }
    }
}

impl TransportBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the timeout set.
    pub fn timeouts(mut self, timeouts: RequestTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Restores the default timeout set.
    pub fn default_timeouts(self) -> Self {
        self.timeouts(RequestTimeouts::default())
    }

    /// Replaces the accepted status codes. An empty set accepts every status.
    pub fn accepted_status_codes(mut self, codes: impl IntoIterator<Item = StatusCode>) -> Self {
        self.accepted_status_codes = codes.into_iter().collect();
        self
    }

    /// Accepts every status code.
    pub fn accept_any_status(self) -> Self {
        self.accepted_status_codes(Vec::new())
    }

    /// Authenticates all requests with HTTP digest credentials.
    pub fn digest_auth(mut self, username: impl Into<String>, secret: impl Into<String>) -> Self {
        self.digest = Some(DigestExchange::new(username, secret));
        self
    }

    /// Overrides the user agent.
    pub fn user_agent(mut self, user_agent: UserAgent) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Builds the transport.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::HttpClient` if the HTTP client fails to
    /// initialize, or `ClientError::Config` if the user agent is not a valid
    /// header value.
    pub fn build(self) -> Result<HttpTransport, ClientError> {
        let http = self
            .timeouts
            .apply(Client::builder())
            .build()
            .map_err(ClientError::HttpClient)?;

        let user_agent = HeaderValue::from_str(self.user_agent.as_str())
            .map_err(|e| ClientError::config(format!("invalid user agent: {}", e)))?;

        let exchange: Arc<dyn Exchange> = match self.digest {
            Some(digest) => Arc::new(digest),
            None => Arc::new(PlainExchange),
        };

        Ok(HttpTransport {
            http,
            exchange,
            accepted_status_codes: self.accepted_status_codes,
            user_agent,
            timeouts: self.timeouts,
        })
    }
}

/// HTTP transport for JSON APIs.
///
/// Immutable once built. Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    exchange: Arc<dyn Exchange>,
    accepted_status_codes: Vec<StatusCode>,
    user_agent: HeaderValue,
    timeouts: RequestTimeouts,
}

impl HttpTransport {
    /// Creates an unauthenticated transport with default settings.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::HttpClient` if the HTTP client fails to initialize.
    pub fn new() -> Result<Self, ClientError> {
        Self::builder().build()
    }

    /// Returns a builder with default settings.
    pub fn builder() -> TransportBuilder {
        TransportBuilder::new()
    }

    /// Returns the accepted status codes. Empty means every status is accepted.
    pub fn accepted_status_codes(&self) -> &[StatusCode] {
        &self.accepted_status_codes
    }

    /// Returns the timeouts this transport was built with.
    pub fn timeouts(&self) -> &RequestTimeouts {
        &self.timeouts
    }

    /// Issues a GET request.
    pub async fn get_json(&self, url: &str) -> HttpResponse {
        self.request(Method::GET, url, None).await
    }

    /// Issues a POST request carrying a JSON body.
    pub async fn post_json(&self, url: &str, body: Vec<u8>) -> HttpResponse {
        self.request(Method::POST, url, Some(body)).await
    }

    /// Issues a PUT request carrying a JSON body.
    pub async fn put_json(&self, url: &str, body: Vec<u8>) -> HttpResponse {
        self.request(Method::PUT, url, Some(body)).await
    }

    /// Issues a PATCH request carrying a JSON body.
    pub async fn patch_json(&self, url: &str, body: Vec<u8>) -> HttpResponse {
        self.request(Method::PATCH, url, Some(body)).await
    }

    /// Issues a DELETE request.
    pub async fn delete(&self, url: &str) -> HttpResponse {
        self.request(Method::DELETE, url, None).await
    }

    /// Issues a request with an arbitrary verb.
    pub async fn request(&self, method: Method, url: &str, body: Option<Vec<u8>>) -> HttpResponse {
        let result = self.execute(method.clone(), url, body).await;
        HttpResponse {
            method,
            url: url.to_string(),
            result,
        }
    }

    fn accepts(&self, status: StatusCode) -> bool {
        self.accepted_status_codes.is_empty() || self.accepted_status_codes.contains(&status)
    }

    fn prepare(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> PreparedRequest {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(PREFER_JSON));
        headers.insert(USER_AGENT, self.user_agent.clone());
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        }

        PreparedRequest {
            method,
            url,
            headers,
            body,
        }
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Response, ClientError> {
        let parsed = Url::parse(url).map_err(|source| ClientError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let request = self.prepare(method, parsed, body);

        tracing::debug!(method = %request.method, url = %request.url, "Sending request");

        let response = self.exchange.execute(&self.http, &request).await?;
        let status = response.status();

        tracing::trace!(status = %status, "Received response");

        if self.accepts(status) {
            return Ok(response);
        }

        Err(Self::rejection(request, response).await)
    }

    /// Builds the status error for a rejected response, consuming its body.
    async fn rejection(request: PreparedRequest, response: Response) -> ClientError {
        let status = response.status();
        let details = match response.bytes().await {
            Ok(body) => describe_error_body(&body),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "Failed to read error response body");
                String::new()
            }
        };

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = %status,
            "Request rejected"
        );

        ClientError::Status {
            method: request.method,
            url: request.url.to_string(),
            status,
            details,
        }
    }
}

/// Renders an error body: compact JSON when it parses, truncated text otherwise.
fn describe_error_body(body: &[u8]) -> String {
    if body.iter().all(u8::is_ascii_whitespace) {
        return "<empty>".to_string();
    }

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        return value.to_string();
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.len() > MAX_ERROR_BODY_LEN {
        let cut = (0..=MAX_ERROR_BODY_LEN)
            .rev()
            .find(|&i| text.is_char_boundary(i))
            .unwrap_or(0);
        format!("{}...[truncated]", &text[..cut])
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_with_version() {
        let ua = UserAgent::for_version(Some("1.2.3"));
        assert_eq!(
            ua.as_str(),
            format!(
                "opsman/1.2.3 ({}; {})",
                std::env::consts::OS,
                std::env::consts::ARCH
            )
        );
    }

    #[test]
    fn test_user_agent_without_version() {
        assert!(UserAgent::for_version(None)
            .as_str()
            .starts_with("opsman/unknown ("));
        assert!(UserAgent::for_version(Some(""))
            .as_str()
            .starts_with("opsman/unknown ("));
    }

    #[test]
    fn test_user_agent_current_uses_package_version() {
        let ua = UserAgent::current();
        assert!(ua.to_string().contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_default_accepted_status_codes() {
        let transport = HttpTransport::new().unwrap();
        assert_eq!(
            transport.accepted_status_codes(),
            &[StatusCode::OK, StatusCode::CREATED]
        );
        assert!(transport.accepts(StatusCode::OK));
        assert!(transport.accepts(StatusCode::CREATED));
        assert!(!transport.accepts(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_empty_accepted_set_accepts_everything() {
        let transport = HttpTransport::builder().accept_any_status().build().unwrap();
        assert!(transport.accepts(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(transport.accepts(StatusCode::NO_CONTENT));
    }

    #[test]
    fn test_later_builder_calls_override_earlier_ones() {
        let custom = RequestTimeouts::new().with_global(std::time::Duration::from_secs(90));
        let transport = HttpTransport::builder()
            .timeouts(custom)
            .default_timeouts()
            .accepted_status_codes([StatusCode::ACCEPTED])
            .build()
            .unwrap();
        assert_eq!(transport.timeouts(), &RequestTimeouts::default());
        assert_eq!(transport.accepted_status_codes(), &[StatusCode::ACCEPTED]);
    }

    #[test]
    fn test_prepare_sets_json_headers() {
        let transport = HttpTransport::new().unwrap();
        let url = Url::parse("http://localhost/groups").unwrap();

        let with_body = transport.prepare(Method::POST, url.clone(), Some(b"{}".to_vec()));
        assert_eq!(with_body.headers[ACCEPT], PREFER_JSON);
        assert_eq!(with_body.headers[CONTENT_TYPE], CONTENT_TYPE_JSON);
        assert_eq!(
            with_body.headers[USER_AGENT],
            UserAgent::current().as_str()
        );

        let without_body = transport.prepare(Method::GET, url, None);
        assert!(without_body.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_digest_uri_includes_query() {
        let transport = HttpTransport::new().unwrap();
        let url = Url::parse("http://localhost/unauth/users?whitelist=1.2.3.4").unwrap();
        let request = transport.prepare(Method::POST, url, None);
        assert_eq!(request.digest_uri(), "/unauth/users?whitelist=1.2.3.4");
    }

    #[test]
    fn test_digest_exchange_debug_redacts_secret() {
        let exchange = DigestExchange::new("public", "very-secret");
        let debug = format!("{:?}", exchange);
        assert!(debug.contains("public"));
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_describe_error_body_json() {
        let body = br#"{ "error": 404, "reason": "Not Found", "detail": "No group." }"#;
        let details = describe_error_body(body);
        assert!(details.contains(r#""detail":"No group.""#));
    }

    #[test]
    fn test_describe_error_body_text_is_truncated() {
        let body = "x".repeat(MAX_ERROR_BODY_LEN * 2);
        let details = describe_error_body(body.as_bytes());
        assert!(details.ends_with("...[truncated]"));
        assert!(details.len() < body.len());
    }

    #[test]
    fn test_describe_error_body_empty() {
        assert_eq!(describe_error_body(b""), "<empty>");
        assert_eq!(describe_error_body(b"  \n"), "<empty>");
    }
}
