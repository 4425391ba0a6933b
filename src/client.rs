//! Typed client for the Ops Manager public API.
//!
//! [`OpsManagerClient`] pairs a [`UrlResolver`] with an [`HttpTransport`]
//! and exposes one async method per supported endpoint. Every method
//! follows the same pipeline: encode the body, resolve the URL, issue the
//! request, then decode the response or drain it.
//!
//! # Example
//!
//! ```no_run
//! use opsman::client::OpsManagerClient;
//! use opsman::resolver::{UrlResolver, PUBLIC_API_PREFIX};
//!
//! # async fn run() -> Result<(), opsman::error::ClientError> {
//! let resolver = UrlResolver::with_prefix("http://localhost:8080", PUBLIC_API_PREFIX)?;
//! let client = OpsManagerClient::with_digest_auth(resolver, "public-key", "private-key")?;
//!
//! for project in client.get_all_projects().await? {
//!     println!("{} {}", project.id, project.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! Identifiers are checked locally and an empty one fails with
//! `ClientError::Validation` before any request is sent. All other failures
//! come from the transport or from decoding.

use serde::Serialize;
use serde_json::Value;

use crate::error::ClientError;
use crate::models::{
    AgentApiKey, AgentAttributes, AgentType, Agents, AutomationConfig, AutomationStatus,
    BackupConfigs, CreateAgentApiKeyRequest, CreateFirstUserResponse, CreateProjectRequest, Hosts,
    Project, ProjectTagsRequest, Projects, RawAutomationConfig, User,
};
use crate::resolver::UrlResolver;
use crate::transport::HttpTransport;

const UNAUTH_USERS: &str = "/unauth/users";
const UNAUTH_USERS_WHITELIST: &str = "/unauth/users?whitelist={}";
const PROJECTS: &str = "/groups";
const PROJECT_BY_ID: &str = "/groups/{}";
const PROJECT_BY_NAME: &str = "/groups/byName/{}";
const AUTOMATION_CONFIG: &str = "/groups/{}/automationConfig";
const RAW_AUTOMATION_CONFIG: &str = "/agents/api/automation/conf/v1/{}";
const AUTOMATION_STATUS: &str = "/groups/{}/automationStatus";
const MONITORING_AGENT_CONFIG: &str = "/groups/{}/automationConfig/monitoringAgentConfig";
const BACKUP_AGENT_CONFIG: &str = "/groups/{}/automationConfig/backupAgentConfig";
const HOSTS: &str = "/groups/{}/hosts";
const AGENTS_BY_TYPE: &str = "/groups/{}/agents/{}";
const AGENT_API_KEYS: &str = "/groups/{}/agentapikeys";
const BACKUP_CONFIGS: &str = "/groups/{}/backupConfigs";

/// Client for the Ops Manager public API.
///
/// Immutable once built; clones share the transport's connection pool and
/// may be used from several tasks at once.
#[derive(Debug, Clone)]
pub struct OpsManagerClient {
    resolver: UrlResolver,
    transport: HttpTransport,
}

/// Builder for [`OpsManagerClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    resolver: Option<UrlResolver>,
    transport: Option<HttpTransport>,
}

impl ClientBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the URL resolver.
    pub fn resolver(mut self, resolver: UrlResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the transport.
    pub fn transport(mut self, transport: HttpTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the resolver or the transport was
    /// not supplied.
    pub fn build(self) -> Result<OpsManagerClient, ClientError> {
        let resolver = self
            .resolver
            .ok_or_else(|| ClientError::config("the client requires a URL resolver"))?;
        let transport = self
            .transport
            .ok_or_else(|| ClientError::config("the client requires an HTTP transport"))?;
        Ok(OpsManagerClient {
            resolver,
            transport,
        })
    }
}

impl OpsManagerClient {
    /// Returns an empty builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client with an unauthenticated default transport.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::HttpClient` if the HTTP client fails to initialize.
    pub fn new_default(resolver: UrlResolver) -> Result<Self, ClientError> {
        Self::builder()
            .resolver(resolver)
            .transport(HttpTransport::new()?)
            .build()
    }

    /// Creates a client authenticating with a programmatic API key pair.
    ///
    /// # Arguments
    ///
    /// * `resolver` - Resolver for the Ops Manager instance
    /// * `username` - Public API key
    /// * `secret` - Private API key
    ///
    /// # Errors
    ///
    /// Returns `ClientError::HttpClient` if the HTTP client fails to initialize.
    pub fn with_digest_auth(
        resolver: UrlResolver,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let transport = HttpTransport::builder()
            .digest_auth(username, secret)
            .build()?;
        Self::builder()
            .resolver(resolver)
            .transport(transport)
            .build()
    }

    /// Returns the URL resolver, for calls to endpoints without a typed method.
    pub fn resolver(&self) -> &UrlResolver {
        &self.resolver
    }

    /// Returns the transport, for calls to endpoints without a typed method.
    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Registers the first user of a fresh Ops Manager installation.
    ///
    /// The returned response carries a programmatic API key for the new
    /// global owner. When `whitelist` is `None` the query parameter is
    /// omitted entirely; pass
    /// [`WHITELIST_ALLOW_ALL`](crate::resolver::WHITELIST_ALLOW_ALL) to allow
    /// every address.
    pub async fn create_first_user(
        &self,
        user: &User,
        whitelist: Option<&str>,
    ) -> Result<CreateFirstUserResponse, ClientError> {
        tracing::debug!(username = %user.username, "Creating first user");

        let body = encode(user)?;
        let url = match whitelist {
            Some(whitelist) => self.resolver.of(UNAUTH_USERS_WHITELIST, &[whitelist])?,
            None => self.resolver.of(UNAUTH_USERS, &[])?,
        };
        self.transport.post_json(&url, body).await.json().await
    }

    /// Lists all projects visible to the caller.
    pub async fn get_all_projects(&self) -> Result<Projects, ClientError> {
        tracing::debug!("Listing projects");

        let url = self.resolver.of(PROJECTS, &[])?;
        self.transport.get_json(&url).await.json().await
    }

    /// Retrieves a project by identifier.
    pub async fn get_project_by_id(&self, project_id: &str) -> Result<Project, ClientError> {
        validate_id(project_id, "project_id")?;
        tracing::debug!(project_id = %project_id, "Getting project");

        let url = self.resolver.of(PROJECT_BY_ID, &[project_id])?;
        self.transport.get_json(&url).await.json().await
    }

    /// Retrieves a project by its unique name.
    pub async fn get_project_by_name(&self, name: &str) -> Result<Project, ClientError> {
        validate_id(name, "name")?;
        tracing::debug!(name = %name, "Getting project by name");

        let url = self.resolver.of(PROJECT_BY_NAME, &[name])?;
        self.transport.get_json(&url).await.json().await
    }

    /// Creates a project, in `org_id` when given.
    pub async fn create_project(
        &self,
        name: &str,
        org_id: Option<&str>,
    ) -> Result<Project, ClientError> {
        validate_id(name, "name")?;
        tracing::debug!(name = %name, org_id = ?org_id, "Creating project");

        let body = encode(&CreateProjectRequest {
            name: name.to_string(),
            org_id: org_id.map(str::to_string),
        })?;
        let url = self.resolver.of(PROJECTS, &[])?;
        self.transport.post_json(&url, body).await.json().await
    }

    /// Deletes a project. The response body is ignored.
    pub async fn delete_project(&self, project_id: &str) -> Result<(), ClientError> {
        validate_id(project_id, "project_id")?;
        tracing::debug!(project_id = %project_id, "Deleting project");

        let url = self.resolver.of(PROJECT_BY_ID, &[project_id])?;
        self.transport.delete(&url).await.discard().await
    }

    /// Replaces the tags of a project. Only the tags are transmitted.
    pub async fn set_project_tags(
        &self,
        project_id: &str,
        tags: &[String],
    ) -> Result<Project, ClientError> {
        validate_id(project_id, "project_id")?;
        tracing::debug!(project_id = %project_id, count = tags.len(), "Setting project tags");

        let body = encode(&ProjectTagsRequest {
            tags: tags.to_vec(),
        })?;
        let url = self.resolver.of(PROJECT_BY_ID, &[project_id])?;
        self.transport.patch_json(&url, body).await.json().await
    }

    /// Retrieves the automation configuration of a project.
    pub async fn get_automation_config(
        &self,
        project_id: &str,
    ) -> Result<AutomationConfig, ClientError> {
        validate_id(project_id, "project_id")?;
        tracing::debug!(project_id = %project_id, "Getting automation config");

        let url = self.resolver.of(AUTOMATION_CONFIG, &[project_id])?;
        self.transport.get_json(&url).await.json().await
    }

    /// Replaces the automation configuration of a project.
    ///
    /// The configuration should come from [`Self::get_automation_config`];
    /// its `version` is what the server checks for concurrent edits.
    pub async fn update_automation_config(
        &self,
        project_id: &str,
        config: &AutomationConfig,
    ) -> Result<AutomationConfig, ClientError> {
        validate_id(project_id, "project_id")?;
        tracing::debug!(project_id = %project_id, version = ?config.version, "Updating automation config");

        let body = encode(config)?;
        let url = self.resolver.of(AUTOMATION_CONFIG, &[project_id])?;
        self.transport.put_json(&url, body).await.json().await
    }

    /// Replaces the automation configuration with an arbitrary document.
    pub async fn update_deployments(
        &self,
        project_id: &str,
        document: &Value,
    ) -> Result<Value, ClientError> {
        validate_id(project_id, "project_id")?;
        tracing::debug!(project_id = %project_id, "Updating deployments");

        let body = encode(document)?;
        let url = self.resolver.of(AUTOMATION_CONFIG, &[project_id])?;
        self.transport.put_json(&url, body).await.json().await
    }

    /// Retrieves the configuration as served to automation agents.
    ///
    /// This endpoint lives outside the public API prefix.
    pub async fn get_raw_automation_config(
        &self,
        project_id: &str,
    ) -> Result<RawAutomationConfig, ClientError> {
        validate_id(project_id, "project_id")?;
        tracing::debug!(project_id = %project_id, "Getting raw automation config");

        let url = self
            .resolver
            .of_unprefixed(RAW_AUTOMATION_CONFIG, &[project_id])?;
        self.transport.get_json(&url).await.json().await
    }

    /// Retrieves automation goal-state progress.
    pub async fn get_automation_status(
        &self,
        project_id: &str,
    ) -> Result<AutomationStatus, ClientError> {
        validate_id(project_id, "project_id")?;
        tracing::debug!(project_id = %project_id, "Getting automation status");

        let url = self.resolver.of(AUTOMATION_STATUS, &[project_id])?;
        self.transport.get_json(&url).await.json().await
    }

    /// Updates monitoring agent settings. Only set fields are transmitted.
    pub async fn update_monitoring_config(
        &self,
        project_id: &str,
        attributes: &AgentAttributes,
    ) -> Result<(), ClientError> {
        self.update_agent_config(MONITORING_AGENT_CONFIG, project_id, attributes)
            .await
    }

    /// Updates backup agent settings. Only set fields are transmitted.
    pub async fn update_backup_config(
        &self,
        project_id: &str,
        attributes: &AgentAttributes,
    ) -> Result<(), ClientError> {
        self.update_agent_config(BACKUP_AGENT_CONFIG, project_id, attributes)
            .await
    }

    /// Lists the hosts monitored in a project.
    pub async fn get_hosts(&self, project_id: &str) -> Result<Hosts, ClientError> {
        validate_id(project_id, "project_id")?;
        tracing::debug!(project_id = %project_id, "Listing hosts");

        let url = self.resolver.of(HOSTS, &[project_id])?;
        self.transport.get_json(&url).await.json().await
    }

    /// Lists the agents of one type in a project.
    pub async fn get_agents_by_type(
        &self,
        project_id: &str,
        agent_type: AgentType,
    ) -> Result<Agents, ClientError> {
        validate_id(project_id, "project_id")?;
        tracing::debug!(project_id = %project_id, agent_type = %agent_type, "Listing agents");

        let url = self
            .resolver
            .of(AGENTS_BY_TYPE, &[project_id, agent_type.as_str()])?;
        self.transport.get_json(&url).await.json().await
    }

    /// Creates an agent API key. The secret is only returned by this call.
    pub async fn create_agent_api_key(
        &self,
        project_id: &str,
        desc: &str,
    ) -> Result<AgentApiKey, ClientError> {
        validate_id(project_id, "project_id")?;
        tracing::debug!(project_id = %project_id, "Creating agent API key");

        let body = encode(&CreateAgentApiKeyRequest {
            desc: desc.to_string(),
        })?;
        let url = self.resolver.of(AGENT_API_KEYS, &[project_id])?;
        self.transport.post_json(&url, body).await.json().await
    }

    /// Lists the backup configurations of a project.
    pub async fn get_backup_configs(&self, project_id: &str) -> Result<BackupConfigs, ClientError> {
        validate_id(project_id, "project_id")?;
        tracing::debug!(project_id = %project_id, "Listing backup configs");

        let url = self.resolver.of(BACKUP_CONFIGS, &[project_id])?;
        self.transport.get_json(&url).await.json().await
    }

    async fn update_agent_config(
        &self,
        pattern: &str,
        project_id: &str,
        attributes: &AgentAttributes,
    ) -> Result<(), ClientError> {
        validate_id(project_id, "project_id")?;
        tracing::debug!(project_id = %project_id, endpoint = %pattern, "Updating agent config");

        let body = encode(attributes)?;
        let url = self.resolver.of(pattern, &[project_id])?;
        self.transport.put_json(&url, body).await.discard().await
    }
}

fn encode<T: Serialize + ?Sized>(body: &T) -> Result<Vec<u8>, ClientError> {
    serde_json::to_vec(body).map_err(ClientError::Encode)
}

/// Rejects blank identifiers before they are interpolated into a URL.
fn validate_id(id: &str, field_name: &str) -> Result<(), ClientError> {
    if id.trim().is_empty() {
        return Err(ClientError::validation(format!(
            "{} must not be empty",
            field_name
        )));
    }
    Ok(())
}
