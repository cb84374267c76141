use httpmock::{Method::GET, MockServer};
use openquery_cli::{
    cli::OutputFormat,
    commands::{build_registry, run::RunOptions, ActionsCommand, PluginsCommand, RunCommand},
    config::ConfigLoader,
    CliError,
};
use openquery_core::{EngineError, ErrorKind, TransportCause};
use openquery_plugins::{ActionData, ConfigValues};
use serde_json::{json, Value};
use std::io::Write;
use std::time::Duration;
use tempfile::Builder;

fn object(value: Value) -> ConfigValues {
    value.as_object().cloned().unwrap_or_default()
}

async fn n8n_values(server: &MockServer) -> ConfigValues {
    std::env::set_var("OPENQUERY_IT_N8N_KEY", "secret123");
    let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "serverURL: {}\napiKey: ${{OPENQUERY_IT_N8N_KEY}}\nspecVersion: v1.0",
        server.base_url()
    )
    .unwrap();
    ConfigLoader::new().load_from_file(file.path()).await.unwrap()
}

fn options(action: &str, parameters: Value, dry_run: bool) -> RunOptions {
    RunOptions {
        plugin: "n8n".to_string(),
        action: ActionData::new(action, object(parameters)),
        format: OutputFormat::Json,
        show_metadata: false,
        dry_run,
    }
}

#[test]
fn test_plugins_json() {
    let registry = build_registry(Duration::from_secs(5)).unwrap();
    let output = PluginsCommand::render(&registry, OutputFormat::Json).unwrap();
    let value: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["plugins"][0]["id"], "n8n");
    assert_eq!(value["plugins"][1]["id"], "openapi");
    assert_eq!(value["plugins"][0]["dataSourceConfig"]["type"], "dataSource");
}

#[tokio::test]
async fn test_actions_json() {
    let server = MockServer::start_async().await;
    let registry = build_registry(Duration::from_secs(5)).unwrap();
    let values = n8n_values(&server).await;

    let output = ActionsCommand::render(&registry, "n8n", &values, OutputFormat::Json).unwrap();
    let value: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["type"], "query");
    assert_eq!(value["actions"].as_array().unwrap().len(), 27);
}

#[tokio::test]
async fn test_run_against_mock() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/workflows/wf1")
                .header("X-N8N-API-KEY", "secret123");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"id": "wf1", "name": "Nightly"}));
        })
        .await;

    let registry = build_registry(Duration::from_secs(5)).unwrap();
    let values = n8n_values(&server).await;

    let output = RunCommand::render(&registry, &values, &options("getWorkflow", json!({"id": "wf1"}), false))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(output, r#"{"id":"wf1","name":"Nightly"}"#);
}

#[tokio::test]
async fn test_dry_run_is_redacted_and_offline() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.path_contains("workflows");
            then.status(500);
        })
        .await;

    let registry = build_registry(Duration::from_secs(5)).unwrap();
    let values = n8n_values(&server).await;

    let output = RunCommand::render(&registry, &values, &options("getWorkflow", json!({"id": "wf1"}), true))
        .await
        .unwrap();
    let value: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["method"], "GET");
    assert!(value["url"].as_str().unwrap().ends_with("/api/v1/workflows/wf1"));
    assert_eq!(value["headers"]["X-N8N-API-KEY"], "***");
    assert!(!output.contains("secret123"));
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_missing_parameter_surfaces_engine_error() {
    let server = MockServer::start_async().await;
    let registry = build_registry(Duration::from_secs(5)).unwrap();
    let values = n8n_values(&server).await;

    let err = RunCommand::render(&registry, &values, &options("getWorkflow", json!({}), false))
        .await
        .unwrap_err();

    let engine = err.engine().unwrap();
    assert_eq!(engine.kind(), ErrorKind::Validation);
    assert!(engine.to_string().contains("id"));
}

#[tokio::test]
async fn test_unknown_plugin() {
    let registry = build_registry(Duration::from_secs(5)).unwrap();
    let err = ActionsCommand::render(&registry, "jira", &ConfigValues::new(), OutputFormat::Json)
        .unwrap_err();
    assert!(matches!(err, CliError::Engine(_)));
    assert_eq!(err.engine().unwrap().kind(), ErrorKind::Config);
}

#[tokio::test]
async fn test_registry_plugins_use_cli_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/workflows/wf1");
            then.status(200).delay(Duration::from_secs(3)).body("{}");
        })
        .await;

    let registry = build_registry(Duration::from_millis(200)).unwrap();
    let values = n8n_values(&server).await;

    let err = RunCommand::render(&registry, &values, &options("getWorkflow", json!({"id": "wf1"}), false))
        .await
        .unwrap_err();

    match err.engine() {
        Some(EngineError::TransportError { cause, .. }) => assert_eq!(*cause, TransportCause::Timeout),
        other => panic!("unexpected error: {:?}", other),
    }
}
