//! Project (group) models.
//!
//! Ops Manager calls projects "groups" on the wire; the types here use the
//! project terminology.

use serde::{Deserialize, Serialize};

use super::{Link, Page};

/// Number of processes per type in a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCounts {
    /// Arbiters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arbiter: Option<u32>,
    /// Config servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<u32>,
    /// Legacy masters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master: Option<u32>,
    /// Query routers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mongos: Option<u32>,
    /// Replica set primaries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<u32>,
    /// Replica set secondaries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<u32>,
    /// Legacy slaves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slave: Option<u32>,
}

/// A project as returned by the project endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project identifier.
    #[serde(default)]
    pub id: String,

    /// Unique project name.
    #[serde(default)]
    pub name: String,

    /// Owning organization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,

    /// Number of active agents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_agent_count: Option<u32>,

    /// Process counts by type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_counts: Option<HostCounts>,

    /// Hostname of the last agent to report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_agent: Option<String>,

    /// Whether the public API is enabled for this project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_api_enabled: Option<bool>,

    /// Number of replica sets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_set_count: Option<u32>,

    /// Number of shards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_count: Option<u32>,

    /// Tags attached to the project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// Hypermedia links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
}

/// Collection of projects.
pub type Projects = Page<Project>;

/// Body of a create-project request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    /// Name of the new project.
    pub name: String,

    /// Organization to create the project in; the server picks one when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
}

/// Body of a set-tags request. Only the tags are transmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectTagsRequest {
    /// Complete replacement tag list.
    pub tags: Vec<String>,
}
