//! Backup configuration models.

use serde::{Deserialize, Serialize};

use super::{Link, Page};

/// Backup settings of a replica set or sharded cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupConfig {
    /// Cluster the configuration applies to.
    #[serde(default)]
    pub cluster_id: String,

    /// Owning project.
    #[serde(default)]
    pub group_id: String,

    /// Backup state, e.g. `STARTED` or `INACTIVE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_name: Option<String>,

    /// Storage engine of the snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_engine_name: Option<String>,

    /// Mechanism the backup agent authenticates with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_mechanism_name: Option<String>,

    /// Database user the backup agent authenticates as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Whether snapshots are encrypted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_enabled: Option<bool>,

    /// Whether the agent connects over TLS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_enabled: Option<bool>,

    /// Namespaces left out of snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_namespaces: Option<Vec<String>>,

    /// Hypermedia links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
}

impl BackupConfig {
    /// Returns true if snapshots are being taken.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.status_name.as_deref() == Some("STARTED")
    }
}

/// Collection of backup configurations.
pub type BackupConfigs = Page<BackupConfig>;
