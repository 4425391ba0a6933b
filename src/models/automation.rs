//! Automation configuration models.
//!
//! The automation configuration is a large document whose schema evolves
//! independently of this client. Every struct here keeps the fields it does
//! not declare in an `extra` map, and loosely specified substructures are
//! plain JSON maps, so a document survives a decode, edit, encode cycle
//! without losing data. Loosely typed top-level sections are [`Nullable`]
//! and write an explicit `null` back, and numbers the server may send in
//! either integer or float form are kept as [`serde_json::Number`].
//!
//! # Example
//!
//! ```
//! use opsman::models::AutomationConfig;
//!
//! let json = r#"{"version": 4, "processes": [{"name": "rs0_0"}], "futureField": {"a": 1}}"#;
//! let mut config: AutomationConfig = serde_json::from_str(json)?;
//! if let Some(process) = config.process_mut("rs0_0") {
//!     process.disabled = Some(true);
//! }
//! let encoded = serde_json::to_value(&config)?;
//! assert_eq!(encoded["futureField"]["a"], 1);
//! assert_eq!(encoded["processes"][0]["disabled"], true);
//! # Ok::<(), serde_json::Error>(())
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// An open JSON object.
pub type JsonMap = serde_json::Map<String, Value>;

/// A field that tells an explicit `null` apart from an absent one.
///
/// `None` is absent and is not written back; `Some(None)` is encoded as `null`.
pub type Nullable<T> = Option<Option<T>>;

/// Deserializes a [`Nullable`] field. Pair with `#[serde(default)]` so that
/// absence stays `None`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Nullable<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// The public automation configuration of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationConfig {
    /// Deployment authentication settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth>,

    /// LDAP settings.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub ldap: Nullable<JsonMap>,

    /// Managed processes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processes: Option<Vec<Process>>,

    /// Replica set definitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_sets: Option<Vec<ReplicaSet>>,

    /// Custom roles.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub roles: Nullable<Vec<JsonMap>>,

    /// Monitoring agent placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_versions: Option<Vec<AgentVersion>>,

    /// Backup agent placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_versions: Option<Vec<AgentVersion>>,

    /// BI connector processes.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub mongosqlds: Nullable<Vec<JsonMap>>,

    /// Available MongoDB builds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mongo_db_versions: Option<Vec<MongoDbVersion>>,

    /// Automation agent version.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub agent_version: Nullable<JsonMap>,

    /// Sharded cluster balancer settings.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub balancer: Nullable<JsonMap>,

    /// Cloud backup modules.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub cps_modules: Nullable<Vec<JsonMap>>,

    /// Indexes managed by automation.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub index_configs: Nullable<Vec<JsonMap>>,

    /// Kerberos settings.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub kerberos: Nullable<JsonMap>,

    /// Full-text search processes.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub mongots: Nullable<Vec<JsonMap>>,

    /// Download options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,

    /// TLS settings.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub ssl: Nullable<JsonMap>,

    /// Configuration version; must be sent back unchanged on update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    /// Sharded cluster definitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharding: Option<Vec<Sharding>>,

    /// Base URL of the Ops Manager UI.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub ui_base_url: Nullable<String>,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl AutomationConfig {
    /// Returns the process with the given name.
    pub fn process(&self, name: &str) -> Option<&Process> {
        self.processes
            .as_ref()?
            .iter()
            .find(|process| process.name.as_deref() == Some(name))
    }

    /// Returns the process with the given name for editing.
    pub fn process_mut(&mut self, name: &str) -> Option<&mut Process> {
        self.processes
            .as_mut()?
            .iter_mut()
            .find(|process| process.name.as_deref() == Some(name))
    }

    /// Appends a process to the deployment.
    pub fn add_process(&mut self, process: Process) {
        self.processes.get_or_insert_with(Vec::new).push(process);
    }
}

/// Deployment authentication settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auth {
    /// User the automation agent authenticates as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_user: Option<String>,

    /// Password of the automation user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_pwd: Option<String>,

    /// Mechanism used by the automation agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_auth_mechanism: Option<String>,

    /// Mechanisms enabled for the deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_auth_mechanisms: Option<Vec<String>>,

    /// Whether authentication is disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,

    /// Keyfile contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Keyfile path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyfile: Option<String>,

    /// Keyfile path on Windows hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyfile_windows: Option<String>,

    /// Users to remove.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users_deleted: Option<Vec<Value>>,

    /// Users to create or keep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users_wanted: Option<Vec<UserWanted>>,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// A database user managed by automation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWanted {
    /// Authentication database.
    #[serde(default)]
    pub db: String,

    /// User name.
    #[serde(default)]
    pub user: String,

    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Initial password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_pwd: Option<String>,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// A role granted on a database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Role {
    /// Database name.
    #[serde(default)]
    pub db: String,

    /// Role name.
    #[serde(default)]
    pub role: String,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// A managed `mongod` or `mongos` process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    /// Unique process name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// `mongod` or `mongos`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_type: Option<String>,

    /// MongoDB version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Authentication schema version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_schema_version: Option<i64>,

    /// Feature compatibility version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_compatibility_version: Option<String>,

    /// Whether the process is shut down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,

    /// Whether the process is excluded from automation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_mode: Option<bool>,

    /// Host the process runs on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Startup options in the MongoDB 2.6+ configuration file format.
    #[serde(rename = "args2_6", default, skip_serializing_if = "Option::is_none")]
    pub args: Option<JsonMap>,

    /// Log rotation settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_rotate: Option<LogRotate>,

    /// Sharded cluster the process belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Log rotation thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRotate {
    /// Rotate once the log grows past this size.
    #[serde(rename = "sizeThresholdMB", default, skip_serializing_if = "Option::is_none")]
    pub size_threshold_mb: Option<Number>,

    /// Rotate once the log is older than this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_threshold_hrs: Option<i64>,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// A replica set definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaSet {
    /// Replica set name.
    #[serde(rename = "_id")]
    pub id: String,

    /// Replication protocol version (sent as a string by recent servers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<Value>,

    /// Members of the set.
    #[serde(default)]
    pub members: Vec<Member>,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// A replica set member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Member ordinal.
    #[serde(rename = "_id")]
    pub id: i64,

    /// Name of the process backing this member.
    #[serde(default)]
    pub host: String,

    /// Whether the member is an arbiter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arbiter_only: Option<bool>,

    /// Whether the member is hidden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    /// Election priority; integral values stay integral on re-encoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Number>,

    /// Replication delay in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slave_delay: Option<i64>,

    /// Number of votes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<i64>,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// A sharded cluster definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sharding {
    /// Cluster name.
    #[serde(default)]
    pub name: String,

    /// Shards of the cluster.
    #[serde(default)]
    pub shards: Vec<Shard>,

    /// Replica set hosting the config servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_server_replica: Option<String>,

    /// Legacy mirrored config servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_server: Option<Vec<Value>>,

    /// Sharded collections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<Value>>,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// A single shard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shard {
    /// Shard name.
    #[serde(rename = "_id")]
    pub id: String,

    /// Replica set backing the shard.
    #[serde(default)]
    pub rs: String,

    /// Zone tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Value>>,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Download options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Directory binaries are downloaded to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_base: Option<String>,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Placement of a monitoring or backup agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentVersion {
    /// Agent version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Host the agent runs on.
    #[serde(default)]
    pub hostname: String,

    /// Log file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<String>,

    /// Log rotation settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_rotate: Option<LogRotate>,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// A MongoDB version and its downloadable builds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MongoDbVersion {
    /// Version name, e.g. `4.2.3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Platform builds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builds: Option<Vec<Build>>,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// A downloadable MongoDB build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    /// CPU architecture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,

    /// Word size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits: Option<u32>,

    /// Distribution flavor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,

    /// Git revision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_version: Option<String>,

    /// Target platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// Download URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Enterprise modules included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<String>>,

    /// Fields not declared above, including the Windows runtime details.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// The automation configuration as the automation agent consumes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAutomationConfig {
    /// Counter used to allocate process identifiers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_counter: Option<i64>,

    /// Publication state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Configuration version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    /// Owning project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    /// User who last saved the configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Publication time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_timestamp: Option<i64>,

    /// Published version identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_version: Option<String>,

    /// Save time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_timestamp: Option<i64>,

    /// Latest automation agent version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_automation_agent_version_name: Option<String>,

    /// Latest monitoring agent version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_monitoring_agent_version_name: Option<String>,

    /// Latest backup agent version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_backup_agent_version_name: Option<String>,

    /// Latest BI connector version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_bi_connector_version_name: Option<String>,

    /// Deployment topology.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<Box<AutomationConfig>>,

    /// Version manifest settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_config: Option<JsonMap>,

    /// Agent log rotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_rotate: Option<JsonMap>,

    /// Monitoring agent template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_agent_template: Option<JsonMap>,

    /// Backup agent template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_agent_template: Option<JsonMap>,

    /// Cloud backup module template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cps_module_template: Option<JsonMap>,

    /// Status of running deployment jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_job_statuses: Option<Vec<Value>>,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Goal-state progress of a single process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStatus {
    /// Process name.
    #[serde(default)]
    pub name: String,

    /// Host the process runs on.
    #[serde(default)]
    pub hostname: String,

    /// Remaining plan steps.
    #[serde(default)]
    pub plan: Vec<String>,

    /// Last configuration version this process reached.
    #[serde(default)]
    pub last_goal_version_achieved: i64,

    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Automation progress of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationStatus {
    /// Per-process progress.
    #[serde(default)]
    pub processes: Vec<ProcessStatus>,

    /// Configuration version the processes are converging to.
    #[serde(default)]
    pub goal_version: i64,
}

impl AutomationStatus {
    /// Returns true once every process has reached the goal version.
    pub fn is_goal_state(&self) -> bool {
        self.processes
            .iter()
            .all(|process| process.last_goal_version_achieved == self.goal_version)
    }
}

/// Monitoring or backup agent settings.
///
/// Only fields that are set are transmitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAttributes {
    /// Log file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<String>,

    /// Log file on Windows hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path_windows: Option<String>,

    /// Log rotation settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_rotate: Option<LogRotate>,

    /// Database user the agent authenticates as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password of that user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Kerberos principal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kerberos_principal: Option<String>,

    /// Kerberos keytab path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kerberos_keytab: Option<String>,

    /// Kerberos user on Windows hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kerberos_windows_username: Option<String>,

    /// Kerberos password on Windows hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kerberos_windows_password: Option<String>,

    /// Client certificate.
    #[serde(rename = "sslPEMKeyFile", default, skip_serializing_if = "Option::is_none")]
    pub ssl_pem_key_file: Option<String>,

    /// Client certificate on Windows hosts.
    #[serde(
        rename = "sslPEMKeyFileWindows",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ssl_pem_key_file_windows: Option<String>,

    /// Client certificate password.
    #[serde(rename = "sslPEMKeyPwd", default, skip_serializing_if = "Option::is_none")]
    pub ssl_pem_key_pwd: Option<String>,
}
