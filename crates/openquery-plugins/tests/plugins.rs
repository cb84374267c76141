#![cfg(all(feature = "n8n", feature = "openapi"))]

use httpmock::{
    Method::{GET, POST},
    MockServer,
};
use async_trait::async_trait;
use openquery_core::{
    EngineError, EngineResult, ErrorKind, Executor, HttpResponse, HttpTransport, PreparedRequest,
    ResponseBody,
};
use openquery_plugins::{
    default_registry, n8n_plugin, registry_with_executor, ActionData, ConfigValues,
    DataSourcePlugin, OpenApiPlugin, PluginRegistry,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

fn object(value: Value) -> ConfigValues {
    value.as_object().cloned().unwrap_or_default()
}

fn n8n_values(server: &MockServer) -> ConfigValues {
    object(json!({
        "serverURL": server.base_url(),
        "apiKey": "secret123",
        "specVersion": "v1.0"
    }))
}

#[test]
fn test_default_registry() {
    let registry = default_registry().unwrap();
    let ids: Vec<&str> = registry.ids().collect();
    assert_eq!(ids, vec!["n8n", "openapi"]);
    assert_eq!(registry.require("n8n").unwrap().category(), "Workflow");
    let err = registry.require("jira").err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(err.to_string().contains("unknown plugin: jira"));
}

/// Transport that records request URLs and answers `204`
#[derive(Default)]
struct RecordingTransport {
    urls: Mutex<Vec<String>>,
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: &PreparedRequest) -> EngineResult<HttpResponse> {
        self.urls.lock().unwrap().push(request.url.to_string());
        Ok(HttpResponse {
            status: 204,
            headers: Default::default(),
            body: Vec::new(),
        })
    }
}

#[tokio::test]
async fn test_registered_plugins_share_executor() {
    let transport = Arc::new(RecordingTransport::default());
    let registry = registry_with_executor(&Executor::new(transport.clone())).unwrap();

    let n8n = registry.require("n8n").ok().unwrap();
    n8n.run(
        &ActionData::new("getWorkflows", ConfigValues::new()),
        &object(json!({"serverURL": "https://n8n.example.com", "apiKey": "k"})),
    )
    .await
    .unwrap();

    let spec = json!({
        "openapi": "3.0.0",
        "paths": {"/pets": {"get": {"operationId": "listPets"}}}
    });
    let openapi = registry.require("openapi").ok().unwrap();
    openapi
        .run(
            &ActionData::new("listPets", ConfigValues::new()),
            &object(json!({"specContent": spec.to_string(), "serverURL": "https://pets.example.com"})),
        )
        .await
        .unwrap();

    assert_eq!(
        *transport.urls.lock().unwrap(),
        vec![
            "https://n8n.example.com/api/v1/workflows".to_string(),
            "https://pets.example.com/pets".to_string()
        ]
    );
}

#[test]
fn test_duplicate_plugin_rejected() {
    let plugin: Arc<dyn DataSourcePlugin> = Arc::new(OpenApiPlugin::new().unwrap());
    let err = PluginRegistry::from_plugins([plugin.clone(), plugin]).unwrap_err();
    assert!(err.to_string().contains("openapi"));
}

#[tokio::test]
async fn test_n8n_list_workflows() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/workflows")
                .header("X-N8N-API-KEY", "secret123")
                .query_param("active", "true");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"data": [{"id": "wf1", "name": "Nightly"}], "nextCursor": null}));
        })
        .await;

    let plugin = n8n_plugin().unwrap();
    let result = plugin
        .run(
            &ActionData::new("getWorkflows", object(json!({"active": true}))),
            &n8n_values(&server),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.body.as_json().unwrap()["data"][0]["id"], "wf1");
}

#[tokio::test]
async fn test_n8n_server_url_with_api_v1_not_doubled() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/workflows/wf1/activate");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"id": "wf1", "active": true}));
        })
        .await;

    let mut values = n8n_values(&server);
    values.insert(
        "serverURL".into(),
        json!(format!("{}/api/v1/", server.base_url())),
    );

    let plugin = n8n_plugin().unwrap();
    plugin
        .run(
            &ActionData::new("activateWorkflow", object(json!({"id": "wf1"}))),
            &values,
        )
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_n8n_upstream_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/executions/42");
            then.status(401)
                .header("content-type", "application/json")
                .body(r#"{"message":"unauthorized"}"#);
        })
        .await;

    let plugin = n8n_plugin().unwrap();
    let err = plugin
        .run(
            &ActionData::new("getExecution", object(json!({"id": 42}))),
            &n8n_values(&server),
        )
        .await
        .unwrap_err();

    let classified = err.classify();
    assert_eq!(classified.kind, ErrorKind::Upstream);
    assert_eq!(classified.status, Some(401));
    assert!(matches!(err, EngineError::UpstreamError { status: 401, .. }));
}

#[tokio::test]
async fn test_n8n_concurrent_runs_share_catalog() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/tags");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"data": []}));
        })
        .await;

    let plugin = Arc::new(n8n_plugin().unwrap());
    let values = n8n_values(&server);
    let runs = (0..8).map(|_| {
        let plugin = plugin.clone();
        let values = values.clone();
        async move {
            plugin
                .run(&ActionData::new("getTags", ConfigValues::new()), &values)
                .await
        }
    });

    let results = futures::future::join_all(runs).await;
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(mock.hits_async().await, 8);
}

#[tokio::test]
async fn test_openapi_plugin_run() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/pets/7")
                .query_param("api_key", "k1");
            then.status(200).header("content-type", "text/plain").body("Rex");
        })
        .await;

    let spec = json!({
        "openapi": "3.0.0",
        "info": {"title": "Pets", "version": "1"},
        "servers": [{"url": "/v1"}],
        "security": [{"QueryKey": []}],
        "paths": {"/pets/{petId}": {"get": {"operationId": "getPet",
            "parameters": [{"name": "petId", "in": "path", "required": true}]}}},
        "components": {"securitySchemes": {"QueryKey": {"type": "apiKey", "in": "query", "name": "api_key"}}}
    });

    let values = object(json!({
        "specContent": spec.to_string(),
        "serverURL": server.base_url(),
        "credentials": {"QueryKey.value": "k1"}
    }));

    let plugin = OpenApiPlugin::new().unwrap();
    let result = plugin
        .run(&ActionData::new("getPet", object(json!({"petId": 7}))), &values)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.body, ResponseBody::Text("Rex".to_string()));
}
