//! Monitored host models.

use serde::{Deserialize, Serialize};

use super::{Link, Page};

/// A MongoDB process monitored by Ops Manager.
///
/// Field names follow the API's host resource one to one.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_mechanism_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deactivated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_startup_warnings: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_secondary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_enabled: Option<bool>,
    #[serde(default)]
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journaling_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_data_size_bytes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_index_size_bytes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ping: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_restart: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_u_limit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub munin_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub munin_port: Option<u16>,
    #[serde(default)]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiler_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_set_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_state_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slave_delay_sec: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_msec: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Host {
    /// Returns `hostname:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

/// Collection of hosts.
pub type Hosts = Page<Host>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hosts_page() {
        let hosts: Hosts = serde_json::from_str(
            r#"{
                "results": [{
                    "id": "22a66f8b4d6e2b4b0ba1ad0e5b5e1d2a",
                    "alertsEnabled": true,
                    "clusterId": "5e1a4c3e79358e4e8f7b0d3a",
                    "groupId": "5e1a4c3e79358e4e8f7b0d39",
                    "hostname": "rs0-0.example.com",
                    "ipAddress": "10.0.0.4",
                    "lastDataSizeBytes": 6.0555e7,
                    "lowULimit": false,
                    "port": 27017,
                    "replicaSetName": "rs0",
                    "replicaStateName": "PRIMARY",
                    "typeName": "REPLICA_PRIMARY",
                    "version": "4.2.3"
                }],
                "totalCount": 1
            }"#,
        )
        .unwrap();
        let host = &hosts.results[0];
        assert_eq!(host.address(), "rs0-0.example.com:27017");
        assert_eq!(host.replica_state_name.as_deref(), Some("PRIMARY"));
        assert_eq!(host.low_u_limit, Some(false));
        assert!(host.shard_name.is_none());
    }
}
