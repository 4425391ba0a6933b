//! Agent models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Page;

/// Kind of agent installed on managed hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentType {
    /// Monitoring agent.
    Monitoring,
    /// Backup agent.
    Backup,
    /// Automation agent.
    Automation,
}

impl AgentType {
    /// All agent types.
    pub const ALL: [AgentType; 3] = [Self::Monitoring, Self::Backup, Self::Automation];

    /// Path segment used by the agents endpoint.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monitoring => "MONITORING",
            Self::Backup => "BACKUP",
            Self::Automation => "AUTOMATION",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown agent type '{s}', expected one of MONITORING, BACKUP, AUTOMATION")
            })
    }
}

/// An agent reporting to Ops Manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Number of configuration calls made by the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conf_count: Option<u64>,

    /// Host the agent runs on.
    #[serde(default)]
    pub hostname: String,

    /// Time of the last configuration call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_conf: Option<String>,

    /// Agent state, e.g. `ACTIVE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,

    /// Agent type name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

/// Collection of agents.
pub type Agents = Page<Agent>;

/// An agent API key.
///
/// The `key` field is only populated in the response to key creation.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentApiKey {
    /// Key identifier.
    #[serde(rename = "_id", default)]
    pub id: String,

    /// Creator of the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    /// Address the key was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_ip_addr: Option<String>,

    /// Creation time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<i64>,

    /// User who created the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_user_id: Option<String>,

    /// Description supplied at creation.
    #[serde(default)]
    pub desc: String,

    /// Secret key value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl fmt::Debug for AgentApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentApiKey")
            .field("id", &self.id)
            .field("created_by", &self.created_by)
            .field("created_time", &self.created_time)
            .field("desc", &self.desc)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

/// Body of a create-agent-API-key request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateAgentApiKeyRequest {
    /// Key description.
    pub desc: String,
}
