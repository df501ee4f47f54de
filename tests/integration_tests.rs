//! Integration tests for the devops-queries library
//!
//! These tests drive the public API end to end: configuration from the
//! environment, the HTTP client against a mock Azure DevOps server, the
//! saved query database and command dispatch.

use devops_queries::{
    AzureDevOpsClient, Config, DEFAULT_QUERY_TEXT, ExitCode, QueryLibrary, QueryRunner,
    SavedQueryStore,
    commands::{self, CommandContext},
    models::{Commands, OutputFormat, RunArgs},
};
use mockito::{Matcher, Server};
use serde_json::json;
use serial_test::file_serial;
use std::env;
use tempfile::TempDir;

const ENV_VARS: [&str; 8] = [
    "DEVOPS_QUERIES_ORGANIZATION",
    "DEVOPS_QUERIES_PROJECT",
    "DEVOPS_QUERIES_PAT",
    "DEVOPS_QUERIES_AREA_PATH",
    "DEVOPS_QUERIES_API_ENDPOINT",
    "DEVOPS_QUERIES_TIMEOUT",
    "DEVOPS_QUERIES_DB_PATH",
    "XDG_CONFIG_HOME",
];

fn clear_env() {
    for var in ENV_VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

/// Points every setting at the mock server and a temporary database.
fn configure_env(endpoint: &str, dir: &TempDir) {
    clear_env();
    unsafe {
        env::set_var("DEVOPS_QUERIES_ORGANIZATION", "org");
        env::set_var("DEVOPS_QUERIES_PROJECT", "proj");
        env::set_var("DEVOPS_QUERIES_PAT", "pat");
        env::set_var("DEVOPS_QUERIES_AREA_PATH", "proj\\team");
        env::set_var("DEVOPS_QUERIES_API_ENDPOINT", endpoint);
        env::set_var(
            "DEVOPS_QUERIES_DB_PATH",
            dir.path().join("data").join("saved.db"),
        );
        env::set_var("XDG_CONFIG_HOME", dir.path().join("config"));
    }
}

fn resolve_from_env(dir: &TempDir) -> devops_queries::DevOpsConfig {
    Config::default()
        .merge(Config::load_from_file().expect("missing config file falls back to defaults"))
        .merge(Config::load_from_env().unwrap())
        .resolve(dir.path())
        .expect("environment provides every required setting")
}

async fn mock_work_item(server: &mut Server, id: u32, title: &str) -> mockito::Mock {
    server
        .mock("GET", format!("/org/proj/_apis/wit/workitems/{id}").as_str())
        .match_query(Matcher::UrlEncoded(
            "api-version".to_string(),
            "6.0".to_string(),
        ))
        .match_header("authorization", "Basic OnBhdA==")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": id,
                "fields": {
                    "System.Title": title,
                    "System.Description": format!("<p>About {title}</p><ul><li>first</li></ul>")
                }
            })
            .to_string(),
        )
        .create_async()
        .await
}

#[tokio::test]
#[file_serial(env_tests)]
async fn test_default_query_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new_async().await;
    configure_env(&server.url(), &dir);

    let expected_query = DEFAULT_QUERY_TEXT.replace("@AREAPATH@", "proj\\team");
    let wiql = server
        .mock("POST", "/org/proj/_apis/wit/wiql")
        .match_query(Matcher::UrlEncoded(
            "api-version".to_string(),
            "6.0".to_string(),
        ))
        .match_header("authorization", "Basic OnBhdA==")
        .match_body(Matcher::Json(json!({ "query": expected_query })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"workItems":[{"id":1},{"id":2},{"id":3}]}"#)
        .create_async()
        .await;
    let first = mock_work_item(&mut server, 1, "A").await;
    let second = mock_work_item(&mut server, 2, "B").await;
    let missing = server
        .mock("GET", "/org/proj/_apis/wit/workitems/3")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let config = resolve_from_env(&dir);
    assert_eq!(*config.db_path, dir.path().join("data").join("saved.db"));
    assert!(dir.path().join("data").is_dir());

    let client = AzureDevOpsClient::new(&config).unwrap();
    let items = QueryRunner::new(&client)
        .run(DEFAULT_QUERY_TEXT)
        .await
        .unwrap();

    wiql.assert_async().await;
    first.assert_async().await;
    second.assert_async().await;
    missing.assert_async().await;

    let lines: Vec<String> = items.iter().map(|i| i.list_item()).collect();
    assert_eq!(lines, vec!["#1: A", "#2: B", "#3: Error fetching details"]);
    assert_eq!(items[0].description(), Some("About A\n- first"));

    clear_env();
}

#[tokio::test]
#[file_serial(env_tests)]
async fn test_query_failure_yields_single_placeholder() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new_async().await;
    configure_env(&server.url(), &dir);

    let _wiql = server
        .mock("POST", "/org/proj/_apis/wit/wiql")
        .match_query(Matcher::Any)
        .with_status(401)
        .create_async()
        .await;

    let config = resolve_from_env(&dir);
    let client = AzureDevOpsClient::new(&config).unwrap();
    let items = QueryRunner::new(&client).run("SELECT 1").await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].list_item(), "#Error: Error executing query");

    clear_env();
}

#[tokio::test]
#[file_serial(env_tests)]
async fn test_saved_query_command_as_json() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new_async().await;
    configure_env(&server.url(), &dir);

    let config = resolve_from_env(&dir);
    let store = SavedQueryStore::open(config.db_path.value()).unwrap();
    QueryLibrary::new(&store)
        .save(
            "Team bugs",
            "SELECT [System.Id] FROM WorkItems WHERE [System.AreaPath] UNDER '@AREAPATH@'",
        )
        .unwrap();

    let _wiql = server
        .mock("POST", "/org/proj/_apis/wit/wiql")
        .match_query(Matcher::Any)
        .match_body(Matcher::Json(json!({
            "query": "SELECT [System.Id] FROM WorkItems WHERE [System.AreaPath] UNDER 'proj\\team'"
        })))
        .with_status(200)
        .with_body(r#"{"workItems":[{"id":"5"}]}"#)
        .create_async()
        .await;
    let _item = mock_work_item(&mut server, 5, "E").await;

    let client = AzureDevOpsClient::new(&config).unwrap();
    let ctx = CommandContext {
        config: &config,
        client: &client,
        store: &store,
    };
    let mut out = Vec::new();
    let command = Commands::Run(RunArgs {
        saved: Some("Team bugs".to_string()),
        output: OutputFormat::Json,
        ..RunArgs::default()
    });
    let code = commands::execute(Some(command), &ctx, &mut out)
        .await
        .unwrap();

    assert_eq!(code, ExitCode::Success);
    let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(parsed, json!([{ "id": "5", "title": "E" }]));

    clear_env();
}

#[test]
#[file_serial(env_tests)]
fn test_missing_settings_are_reported() {
    let dir = TempDir::new().unwrap();
    clear_env();
    unsafe {
        env::set_var("XDG_CONFIG_HOME", dir.path());
        env::set_var("DEVOPS_QUERIES_ORGANIZATION", "org");
    }

    let err = Config::default()
        .merge(Config::load_from_file().unwrap())
        .merge(Config::load_from_env().unwrap())
        .resolve(dir.path())
        .unwrap_err();
    assert!(err.to_string().contains("Project is required"));

    clear_env();
}

#[test]
#[file_serial(env_tests)]
fn test_non_numeric_timeout_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    configure_env("https://dev.azure.com", &dir);
    unsafe {
        env::set_var("DEVOPS_QUERIES_TIMEOUT", "abc");
    }

    let err = Config::load_from_env().unwrap_err();
    assert!(err.to_string().contains("Invalid value for Timeout"));
    assert_eq!(
        commands::exit_code_for(&err.into()),
        ExitCode::ConfigError
    );

    clear_env();
}

#[test]
fn test_library_version() {
    let version = devops_queries::VERSION;
    assert!(!version.is_empty());
    assert!(version.contains('.'));
    assert!(devops_queries::LONG_VERSION.starts_with(version));
}
