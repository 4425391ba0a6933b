//! Typed client operations against a mock Ops Manager.

use std::io;
use std::sync::{Arc, Mutex};

use opsman::client::OpsManagerClient;
use opsman::error::ClientError;
use opsman::models::{AgentAttributes, AgentType, AutomationConfig, User};
use opsman::resolver::{UrlResolver, PUBLIC_API_PREFIX, WHITELIST_ALLOW_ALL};
use opsman::transport::HttpTransport;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{any, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT_ID: &str = "56a10a80e4b0fd3b9a9bb0c2";

async fn setup() -> (MockServer, OpsManagerClient) {
    let server = MockServer::start().await;
    let resolver = UrlResolver::new(&server.uri()).unwrap();
    let client = OpsManagerClient::new_default(resolver).unwrap();
    (server, client)
}

fn first_user() -> User {
    User {
        username: "jane.doe@example.com".to_string(),
        password: Some("Passw0rd!".to_string()),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email_address: None,
    }
}

fn first_user_response() -> Value {
    json!({
        "apiKey": "1234abcd",
        "user": {
            "id": "533dc19ce4b00835ff81e2eb",
            "username": "jane.doe@example.com",
            "firstName": "Jane",
            "lastName": "Doe",
            "roles": [{"roleName": "GLOBAL_OWNER"}]
        }
    })
}

#[tokio::test]
async fn test_get_project_by_id() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path(format!("/groups/{PROJECT_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": PROJECT_ID,
            "name": "X",
            "orgId": "Y",
            "publicApiEnabled": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let project = client.get_project_by_id(PROJECT_ID).await.unwrap();
    assert_eq!(project.id, PROJECT_ID);
    assert_eq!(project.name, "X");
    assert_eq!(project.org_id.as_deref(), Some("Y"));
    assert_eq!(project.public_api_enabled, Some(true));
}

#[tokio::test]
async fn test_get_all_projects() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "links": [{"href": "http://localhost/groups", "rel": "self"}],
            "results": [{"id": "1", "name": "a"}, {"id": "2", "name": "b"}],
            "totalCount": 2
        })))
        .mount(&server)
        .await;

    let projects = client.get_all_projects().await.unwrap();
    assert_eq!(projects.total_count, 2);
    let names: Vec<String> = projects.into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn test_get_project_by_name_encodes_name() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/groups/byName/my%20project"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1", "name": "my project"})))
        .expect(1)
        .mount(&server)
        .await;

    let project = client.get_project_by_name("my project").await.unwrap();
    assert_eq!(project.name, "my project");
}

#[tokio::test]
async fn test_create_project() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/groups"))
        .and(body_json(json!({"name": "X", "orgId": "Y"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": PROJECT_ID,
            "name": "X",
            "orgId": "Y",
            "agentApiKey": "ignored-by-the-model"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let project = client.create_project("X", Some("Y")).await.unwrap();
    assert_eq!(project.id, PROJECT_ID);
}

#[tokio::test]
async fn test_delete_project_with_empty_body() {
    let (server, client) = setup().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/groups/{PROJECT_ID}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_project(PROJECT_ID).await.unwrap();
}

#[tokio::test]
async fn test_set_project_tags_sends_only_tags() {
    let (server, client) = setup().await;
    Mock::given(method("PATCH"))
        .and(path(format!("/groups/{PROJECT_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": PROJECT_ID,
            "name": "X",
            "tags": ["prod", "eu"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tags = vec!["prod".to_string(), "eu".to_string()];
    let project = client.set_project_tags(PROJECT_ID, &tags).await.unwrap();
    assert_eq!(project.tags, Some(tags));

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body, json!({"tags": ["prod", "eu"]}));
}

#[tokio::test]
async fn test_create_first_user_without_whitelist_omits_query() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/unauth/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(first_user_response()))
        .expect(1)
        .mount(&server)
        .await;

    let response = client.create_first_user(&first_user(), None).await.unwrap();
    assert_eq!(response.api_key.as_deref(), Some("1234abcd"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), None);

    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["username"], "jane.doe@example.com");
    assert_eq!(body["password"], "Passw0rd!");
    assert!(body.get("emailAddress").is_none());
}

#[tokio::test]
async fn test_create_first_user_with_whitelist() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/unauth/users"))
        .and(query_param("whitelist", WHITELIST_ALLOW_ALL))
        .respond_with(ResponseTemplate::new(201).set_body_json(first_user_response()))
        .expect(1)
        .mount(&server)
        .await;

    client
        .create_first_user(&first_user(), Some(WHITELIST_ALLOW_ALL))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("whitelist=0.0.0.0%2F0"));
}

#[tokio::test]
async fn test_empty_whitelist_differs_from_absent_whitelist() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(first_user_response()))
        .mount(&server)
        .await;

    client.create_first_user(&first_user(), Some("")).await.unwrap();
    client.create_first_user(&first_user(), None).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("whitelist="));
    assert_eq!(requests[1].url.query(), None);
}

#[tokio::test]
async fn test_automation_config_read_modify_write_keeps_unknown_fields() {
    let (server, client) = setup().await;
    let document = json!({
        "version": 7,
        "processes": [{
            "name": "rs0_0",
            "processType": "mongod",
            "args2_6": {"net": {"port": 27017}},
            "horizons": {"external": "rs0.example.com:27017"}
        }],
        "replicaSets": [{"_id": "rs0", "members": [{"_id": 0, "host": "rs0_0"}]}],
        "onlineArchiveModules": []
    });
    let path_pattern = format!("/groups/{PROJECT_ID}/automationConfig");

    Mock::given(method("GET"))
        .and(path(path_pattern.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(document.clone()))
        .mount(&server)
        .await;

    let mut expected = document.clone();
    expected["processes"][0]["disabled"] = json!(true);
    Mock::given(method("PUT"))
        .and(path(path_pattern.as_str()))
        .and(body_json(expected.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(expected.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let mut config: AutomationConfig = client.get_automation_config(PROJECT_ID).await.unwrap();
    config.process_mut("rs0_0").unwrap().disabled = Some(true);

    let updated = client
        .update_automation_config(PROJECT_ID, &config)
        .await
        .unwrap();
    assert_eq!(updated, config);
}

#[tokio::test]
async fn test_update_deployments_sends_document_verbatim() {
    let (server, client) = setup().await;
    let document = json!({"version": 3, "anything": {"goes": [1, 2, 3]}});
    Mock::given(method("PUT"))
        .and(path(format!("/groups/{PROJECT_ID}/automationConfig")))
        .and(body_json(document.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(document.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let response = client.update_deployments(PROJECT_ID, &document).await.unwrap();
    assert_eq!(response, document);
}

#[tokio::test]
async fn test_raw_automation_config_bypasses_prefix() {
    let server = MockServer::start().await;
    let resolver = UrlResolver::with_prefix(&server.uri(), PUBLIC_API_PREFIX).unwrap();
    let client = OpsManagerClient::new_default(resolver).unwrap();

    Mock::given(method("GET"))
        .and(path(format!("/agents/api/automation/conf/v1/{PROJECT_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "groupId": PROJECT_ID,
            "version": 7,
            "cluster": {"version": 7}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/public/v1.0/groups/{PROJECT_ID}/automationStatus")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "goalVersion": 7,
            "processes": [{"name": "rs0_0", "hostname": "h0", "plan": [], "lastGoalVersionAchieved": 7}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let raw = client.get_raw_automation_config(PROJECT_ID).await.unwrap();
    assert_eq!(raw.group_id.as_deref(), Some(PROJECT_ID));

    let status = client.get_automation_status(PROJECT_ID).await.unwrap();
    assert!(status.is_goal_state());
}

#[tokio::test]
async fn test_agent_config_updates_send_partial_documents() {
    let (server, client) = setup().await;
    Mock::given(method("PUT"))
        .and(path(format!(
            "/groups/{PROJECT_ID}/automationConfig/monitoringAgentConfig"
        )))
        .and(body_json(json!({"logPath": "/var/log/mongodb-mms-automation/monitoring-agent.log"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!(
            "/groups/{PROJECT_ID}/automationConfig/backupAgentConfig"
        )))
        .and(body_json(json!({"username": "backup", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let monitoring = AgentAttributes {
        log_path: Some("/var/log/mongodb-mms-automation/monitoring-agent.log".to_string()),
        ..AgentAttributes::default()
    };
    client
        .update_monitoring_config(PROJECT_ID, &monitoring)
        .await
        .unwrap();

    let backup = AgentAttributes {
        username: Some("backup".to_string()),
        password: Some("secret".to_string()),
        ..AgentAttributes::default()
    };
    client.update_backup_config(PROJECT_ID, &backup).await.unwrap();
}

#[tokio::test]
async fn test_hosts_agents_and_backup_configs() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path(format!("/groups/{PROJECT_ID}/hosts")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "h1", "hostname": "rs0-0.example.com", "port": 27017}],
            "totalCount": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/groups/{PROJECT_ID}/agents/AUTOMATION")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"hostname": "rs0-0.example.com", "stateName": "ACTIVE", "typeName": "AUTOMATION"}],
            "totalCount": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/groups/{PROJECT_ID}/backupConfigs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"clusterId": "c1", "groupId": PROJECT_ID, "statusName": "STARTED"}],
            "totalCount": 1
        })))
        .mount(&server)
        .await;

    let hosts = client.get_hosts(PROJECT_ID).await.unwrap();
    assert_eq!(hosts.results[0].address(), "rs0-0.example.com:27017");

    let agents = client
        .get_agents_by_type(PROJECT_ID, AgentType::Automation)
        .await
        .unwrap();
    assert_eq!(agents.results[0].state_name.as_deref(), Some("ACTIVE"));

    let backups = client.get_backup_configs(PROJECT_ID).await.unwrap();
    assert!(backups.results[0].is_started());
}

#[tokio::test]
async fn test_create_agent_api_key() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("/groups/{PROJECT_ID}/agentapikeys")))
        .and(body_json(json!({"desc": "ci"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "5c47503320eef5699e1cce8d",
            "createdBy": "PUBLIC_API",
            "desc": "ci",
            "key": "generated-secret"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let key = client.create_agent_api_key(PROJECT_ID, "ci").await.unwrap();
    assert_eq!(key.key.as_deref(), Some("generated-secret"));
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_trace_logs_omit_issued_keys() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("opsman=trace"))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("/groups/{PROJECT_ID}/agentapikeys")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "k",
            "desc": "ci",
            "key": "TOPSECRETAGENTKEY"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/unauth/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "apiKey": "TOPSECRETUSERKEY",
            "user": {"id": "u1", "username": "jane.doe@example.com", "firstName": "Jane", "lastName": "Doe"}
        })))
        .mount(&server)
        .await;

    let key = client.create_agent_api_key(PROJECT_ID, "ci").await.unwrap();
    assert_eq!(key.key.as_deref(), Some("TOPSECRETAGENTKEY"));
    let response = client.create_first_user(&first_user(), None).await.unwrap();
    assert_eq!(response.api_key.as_deref(), Some("TOPSECRETUSERKEY"));

    let output = logs.contents();
    assert!(output.contains("Response body"), "{output}");
    assert!(!output.contains("TOPSECRETAGENTKEY"), "{output}");
    assert!(!output.contains("TOPSECRETUSERKEY"), "{output}");
    assert!(!output.contains("Passw0rd!"), "{output}");
}

#[tokio::test]
async fn test_server_error_fails_every_operation() {
    let (server, client) = setup().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": 500,
            "reason": "Internal Server Error"
        })))
        .mount(&server)
        .await;

    let attributes = AgentAttributes::default();
    let errors = vec![
        client.create_first_user(&first_user(), None).await.map(drop).unwrap_err(),
        client.get_all_projects().await.map(drop).unwrap_err(),
        client.get_project_by_id(PROJECT_ID).await.map(drop).unwrap_err(),
        client.get_project_by_name("X").await.map(drop).unwrap_err(),
        client.create_project("X", None).await.map(drop).unwrap_err(),
        client.delete_project(PROJECT_ID).await.unwrap_err(),
        client.set_project_tags(PROJECT_ID, &[]).await.map(drop).unwrap_err(),
        client.get_automation_config(PROJECT_ID).await.map(drop).unwrap_err(),
        client
            .update_automation_config(PROJECT_ID, &AutomationConfig::default())
            .await
            .map(drop)
            .unwrap_err(),
        client
            .update_deployments(PROJECT_ID, &json!({}))
            .await
            .map(drop)
            .unwrap_err(),
        client.get_raw_automation_config(PROJECT_ID).await.map(drop).unwrap_err(),
        client.get_automation_status(PROJECT_ID).await.map(drop).unwrap_err(),
        client.update_monitoring_config(PROJECT_ID, &attributes).await.unwrap_err(),
        client.update_backup_config(PROJECT_ID, &attributes).await.unwrap_err(),
        client.get_hosts(PROJECT_ID).await.map(drop).unwrap_err(),
        client
            .get_agents_by_type(PROJECT_ID, AgentType::Monitoring)
            .await
            .map(drop)
            .unwrap_err(),
        client.create_agent_api_key(PROJECT_ID, "ci").await.map(drop).unwrap_err(),
        client.get_backup_configs(PROJECT_ID).await.map(drop).unwrap_err(),
    ];

    assert_eq!(errors.len(), 18);
    for err in errors {
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(err.to_string().contains("500"), "{err}");
        assert!(err.is_retryable());
    }
}

#[tokio::test]
async fn test_decode_error_is_recoverable() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/groups/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/groups/{PROJECT_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": PROJECT_ID, "name": "X"})))
        .mount(&server)
        .await;

    let err = client.get_project_by_id("broken").await.unwrap_err();
    assert!(matches!(err, ClientError::Decode { .. }), "{err:?}");

    let project = client.get_project_by_id(PROJECT_ID).await.unwrap();
    assert_eq!(project.name, "X");
}

#[tokio::test]
async fn test_empty_identifier_sends_nothing() {
    let (server, client) = setup().await;

    let err = client.get_hosts("").await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_client_builder_requires_both_parts() {
    let server = MockServer::start().await;
    let resolver = UrlResolver::new(&server.uri()).unwrap();

    let missing_transport = OpsManagerClient::builder()
        .resolver(resolver.clone())
        .build()
        .unwrap_err();
    assert!(matches!(missing_transport, ClientError::Config(_)));

    let missing_resolver = OpsManagerClient::builder()
        .transport(HttpTransport::new().unwrap())
        .build()
        .unwrap_err();
    assert!(matches!(missing_resolver, ClientError::Config(_)));

    let client = OpsManagerClient::builder()
        .resolver(resolver)
        .transport(HttpTransport::new().unwrap())
        .build()
        .unwrap();
    assert_eq!(client.resolver().base().as_str(), format!("{}/", server.uri()));
}
