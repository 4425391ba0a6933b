//! Common types shared across API models.
//!
//! This module defines hypermedia links and the pagination envelope
//! returned by every collection endpoint.

use serde::{Deserialize, Serialize};

/// A hypermedia link attached to API resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Target URL.
    #[serde(default)]
    pub href: String,

    /// Relation to the enclosing resource, e.g. `self`.
    #[serde(default)]
    pub rel: String,
}

/// A page of results from a collection endpoint.
///
/// Collections return a results array, an optional set of pagination
/// links and the total number of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Pagination and self-reference links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,

    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,

    /// Total number of items across all pages.
    #[serde(default)]
    pub total_count: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            links: None,
            results: Vec::new(),
            total_count: 0,
        }
    }
}

impl<T> Page<T> {
    /// Returns true if the page holds no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns the link with the given relation, if present.
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.as_ref()?.iter().find(|link| link.rel == rel)
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_when_fields_missing() {
        let page: Page<serde_json::Value> = serde_json::from_str("{}").unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total_count, 0);
        assert!(page.links.is_none());
    }

    #[test]
    fn test_page_link_lookup() {
        let page: Page<serde_json::Value> = serde_json::from_str(
            r#"{
                "links": [
                    {"href": "http://localhost/groups?pageNum=1", "rel": "self"},
                    {"href": "http://localhost/groups?pageNum=2", "rel": "next"}
                ],
                "results": [],
                "totalCount": 150
            }"#,
        )
        .unwrap();
        assert_eq!(
            page.link("next").map(|l| l.href.as_str()),
            Some("http://localhost/groups?pageNum=2")
        );
        assert!(page.link("previous").is_none());
        assert_eq!(page.total_count, 150);
    }

    #[test]
    fn test_page_without_links_omits_them() {
        let page: Page<u32> = Page {
            links: None,
            results: vec![1, 2],
            total_count: 2,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("links").is_none());
        assert_eq!(json["totalCount"], 2);
        assert_eq!(page.into_iter().sum::<u32>(), 3);
    }
}
