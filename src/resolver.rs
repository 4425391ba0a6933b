//! URL resolution for API endpoints.
//!
//! A [`UrlResolver`] owns a parsed base URL and an optional path prefix and
//! turns relative path patterns such as `/groups/{}` into absolute request
//! URLs. Positional values are percent-encoded before substitution, and the
//! expanded path is cleaned lexically before it is resolved against the base.
//!
//! # Example
//!
//! ```
//! use opsman::resolver::{UrlResolver, PUBLIC_API_PREFIX};
//!
//! let resolver = UrlResolver::with_prefix("http://localhost:8080", PUBLIC_API_PREFIX)?;
//! assert_eq!(
//!     resolver.of("/groups/{}", &["5e1a"])?,
//!     "http://localhost:8080/api/public/v1.0/groups/5e1a"
//! );
//! # Ok::<(), opsman::error::ClientError>(())
//! ```

use url::Url;

use crate::error::ClientError;

/// Root path of the Ops Manager public API.
pub const PUBLIC_API_PREFIX: &str = "/api/public/v1.0";

/// Allow-list entry that admits every IPv4 address.
pub const WHITELIST_ALLOW_ALL: &str = "0.0.0.0/0";

/// Placeholder replaced by positional values in path patterns.
const PLACEHOLDER: &str = "{}";

/// Resolves relative API paths against a fixed base URL.
///
/// Immutable after construction; cloning is cheap enough to hand one to
/// every client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResolver {
    base: Url,
    prefix: Option<String>,
}

impl UrlResolver {
    /// Creates a resolver rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidBaseUrl` if `base` is not an absolute URL.
    pub fn new(base: &str) -> Result<Self, ClientError> {
        Ok(Self {
            base: Self::parse_base(base)?,
            prefix: None,
        })
    }

    /// Creates a resolver which joins `prefix` in front of every prefixed path.
    ///
    /// An empty prefix behaves exactly like [`UrlResolver::new`].
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidBaseUrl` if `base` is not an absolute URL.
    pub fn with_prefix(base: &str, prefix: &str) -> Result<Self, ClientError> {
        let prefix = (!prefix.is_empty()).then(|| prefix.to_string());
        Ok(Self {
            base: Self::parse_base(base)?,
            prefix,
        })
    }

    fn parse_base(base: &str) -> Result<Url, ClientError> {
        let url = Url::parse(base).map_err(|source| ClientError::InvalidBaseUrl {
            url: base.to_string(),
            source,
        })?;
        if url.cannot_be_a_base() {
            return Err(ClientError::config(format!(
                "base URL {:?} cannot be used to resolve paths",
                base
            )));
        }
        Ok(url)
    }

    /// Returns the parsed base URL.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Returns the configured prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Builds an absolute URL for `pattern` below the configured prefix.
    ///
    /// Each `{}` in `pattern` is replaced by the next value in `values`.
    /// The request path is cleaned as a rooted path before the prefix is
    /// joined, so `..` segments never climb above the prefix.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if the joined reference cannot be resolved.
    pub fn of(&self, pattern: &str, values: &[&str]) -> Result<String, ClientError> {
        let (path, query) = split_query(expand(pattern, values));

        let path = match &self.prefix {
            Some(prefix) => {
                let contained = clean_path(&format!("/{}", path));
                clean_path(&format!("{}/{}", prefix, contained))
            }
            None => clean_path(&path),
        };

        self.resolve(path, query)
    }

    /// Builds an absolute URL for `pattern` without joining the prefix.
    ///
    /// Used for endpoints that live outside the public API root.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if the reference cannot be resolved.
    pub fn of_unprefixed(&self, pattern: &str, values: &[&str]) -> Result<String, ClientError> {
        let (path, query) = split_query(expand(pattern, values));
        self.resolve(clean_path(&path), query)
    }

    fn resolve(&self, path: String, query: Option<String>) -> Result<String, ClientError> {
        let reference = match query {
            Some(query) => format!("{}?{}", path, query),
            None => path,
        };
        self.base
            .join(&reference)
            .map(String::from)
            .map_err(|source| ClientError::InvalidUrl {
                url: reference,
                source,
            })
    }
}

/// Substitutes `{}` placeholders with percent-encoded values, in order.
///
/// Placeholders without a matching value are kept verbatim; surplus values
/// are ignored.
fn expand(pattern: &str, values: &[&str]) -> String {
    let mut result = String::with_capacity(pattern.len());
    let mut values = values.iter();
    let mut rest = pattern;

    while let Some(index) = rest.find(PLACEHOLDER) {
        result.push_str(&rest[..index]);
        match values.next() {
            Some(value) => result.push_str(&urlencoding::encode(value)),
            None => result.push_str(PLACEHOLDER),
        }
        rest = &rest[index + PLACEHOLDER.len()..];
    }
    result.push_str(rest);

    result
}

/// Splits a reference into its path and (optional) query string.
fn split_query(reference: String) -> (String, Option<String>) {
    match reference.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (reference, None),
    }
}

/// Lexically cleans a slash-separated path.
///
/// - Duplicate separators collapse into one
/// - `.` segments are dropped
/// - `..` removes the preceding segment, and is dropped at a rooted start
/// - Trailing separators are removed
///
/// An empty result becomes `/` for rooted paths and `.` otherwise.
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&"..") | None if !rooted => segments.push(".."),
                Some(_) => {
                    segments.pop();
                }
                None => {}
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCALHOST: &str = "http://localhost";

    #[test]
    fn test_resolve_path_without_expansions() {
        let resolver = UrlResolver::new(LOCALHOST).unwrap();
        assert_eq!(resolver.of("/groups", &[]).unwrap(), "http://localhost/groups");
    }

    #[test]
    fn test_resolve_path_with_expansions() {
        let resolver = UrlResolver::new(LOCALHOST).unwrap();
        assert_eq!(
            resolver.of("/groups/{}", &["1"]).unwrap(),
            "http://localhost/groups/1"
        );
    }

    #[test]
    fn test_resolve_path_with_prefix_without_expansions() {
        let resolver = UrlResolver::with_prefix(LOCALHOST, "prefix").unwrap();
        assert_eq!(
            resolver.of("/groups", &[]).unwrap(),
            "http://localhost/prefix/groups"
        );
    }

    #[test]
    fn test_resolve_path_with_prefix_with_expansions() {
        let resolver = UrlResolver::with_prefix(LOCALHOST, "prefix").unwrap();
        assert_eq!(
            resolver.of("/groups/{}", &["1"]).unwrap(),
            "http://localhost/prefix/groups/1"
        );
    }

    #[test]
    fn test_relative_paths_are_cleaned() {
        let resolver = UrlResolver::new(LOCALHOST).unwrap();
        assert_eq!(
            resolver.of("/../../groups", &[]).unwrap(),
            "http://localhost/groups"
        );
    }

    #[test]
    fn test_dot_segments_cannot_escape_prefix() {
        let resolver = UrlResolver::with_prefix(LOCALHOST, PUBLIC_API_PREFIX).unwrap();
        assert_eq!(
            resolver.of("/../../admin", &[]).unwrap(),
            "http://localhost/api/public/v1.0/admin"
        );
    }

    #[test]
    fn test_base_plus_path_concatenation() {
        for base in ["http://localhost", "http://localhost/", "https://om.example.com:8443"] {
            let resolver = UrlResolver::new(base).unwrap();
            for path in ["/groups", "groups", "/groups/", "//groups//abc/"] {
                let got = resolver.of(path, &[]).unwrap();
                let expected = format!("{}/groups", base.trim_end_matches('/'));
                let expected = if path.contains("abc") {
                    format!("{}/abc", expected)
                } else {
                    expected
                };
                assert_eq!(got, expected, "base={} path={}", base, path);
            }
        }
    }

    #[test]
    fn test_prefix_equals_joined_path() {
        let prefixed = UrlResolver::with_prefix(LOCALHOST, "/api/public/v1.0").unwrap();
        let bare = UrlResolver::with_prefix(LOCALHOST, "").unwrap();
        for path in ["/groups", "/groups/abc/hosts", "agents/MONITORING"] {
            let joined = format!("/api/public/v1.0/{}", path);
            assert_eq!(
                prefixed.of(path, &[]).unwrap(),
                bare.of(&joined, &[]).unwrap()
            );
        }
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let resolver = UrlResolver::with_prefix(LOCALHOST, PUBLIC_API_PREFIX).unwrap();
        let first = resolver.of("/groups/{}/hosts", &["abc"]).unwrap();
        let second = resolver.of("/groups/{}/hosts", &["abc"]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unprefixed_ignores_prefix() {
        let resolver = UrlResolver::with_prefix(LOCALHOST, PUBLIC_API_PREFIX).unwrap();
        assert_eq!(
            resolver
                .of_unprefixed("/agents/api/automation/conf/v1/{}", &["abc"])
                .unwrap(),
            "http://localhost/agents/api/automation/conf/v1/abc"
        );
    }

    #[test]
    fn test_query_is_preserved() {
        let resolver = UrlResolver::with_prefix(LOCALHOST, PUBLIC_API_PREFIX).unwrap();
        assert_eq!(
            resolver
                .of("/unauth/users?whitelist={}", &[WHITELIST_ALLOW_ALL])
                .unwrap(),
            "http://localhost/api/public/v1.0/unauth/users?whitelist=0.0.0.0%2F0"
        );
    }

    #[test]
    fn test_values_are_encoded() {
        let resolver = UrlResolver::new(LOCALHOST).unwrap();
        assert_eq!(
            resolver.of("/groups/byName/{}", &["my project"]).unwrap(),
            "http://localhost/groups/byName/my%20project"
        );
        assert_eq!(
            resolver.of("/groups/{}", &["../admin"]).unwrap(),
            "http://localhost/groups/..%2Fadmin"
        );
    }

    #[test]
    fn test_missing_values_keep_placeholder() {
        assert_eq!(expand("/groups/{}/agents/{}", &["a"]), "/groups/a/agents/{}");
        assert_eq!(expand("/groups", &["a", "b"]), "/groups");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = UrlResolver::new("not a url").unwrap_err();
        assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_opaque_base_url_rejected() {
        let err = UrlResolver::new("mailto:ops@example.com").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("/a/b/../c"), "/a/c");
        assert_eq!(clean_path("/a/./b/"), "/a/b");
        assert_eq!(clean_path("a//b"), "a/b");
        assert_eq!(clean_path("../a"), "../a");
        assert_eq!(clean_path("a/../.."), "..");
        assert_eq!(clean_path("/.."), "/");
        assert_eq!(clean_path(""), ".");
    }
}
