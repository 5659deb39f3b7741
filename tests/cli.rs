mod common;

use common::spawn_backend;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tokio::sync::Mutex;

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn unique_prefs_path() -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "pantry_cli_{}_{}.json",
        std::process::id(),
        uuid::Uuid::new_v4()
    ));
    path
}

async fn run_pantry(base_url: &str, token: Option<&str>) -> Output {
    run_pantry_with_prefs(base_url, token, &unique_prefs_path()).await
}

async fn run_pantry_with_prefs(base_url: &str, token: Option<&str>, prefs: &Path) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_pantry"));
    command
        .env("PANTRY_API_BASE_URL", base_url)
        .env("PANTRY_PREFS_PATH", prefs)
        .env("RUST_LOG", "info")
        .env_remove("PANTRY_ID_TOKEN")
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    if let Some(token) = token {
        command.env("PANTRY_ID_TOKEN", token);
    }

    tokio::task::spawn_blocking(move || command.output().expect("failed to run pantry"))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cli_lists_inventory_from_backend() {
    let _guard = TEST_LOCK.lock().await;
    let server = spawn_backend().await;

    let output = run_pantry(&server.base_url, Some("tok-123")).await;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Milk"));
    assert!(stdout.contains("Spinach"));
    assert!(stdout.contains("total=2 fresh=1 expiring_soon=0 expired=1"));

    let requests = server.backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/fridge/items");
    assert_eq!(requests[1].path, "/settings/gemini-api-key/status");
    assert!(requests
        .iter()
        .all(|r| r.authorization.as_deref() == Some("Bearer tok-123")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cli_reads_cached_preferences_from_configured_path() {
    let _guard = TEST_LOCK.lock().await;
    let server = spawn_backend().await;

    let prefs = unique_prefs_path();
    std::fs::write(&prefs, r#"{"api_key": "cached-key"}"#).unwrap();
    let output = run_pantry_with_prefs(&server.base_url, None, &prefs).await;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("api_key_configured=false api_key_cached=true"));

    let output = run_pantry(&server.base_url, None).await;
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("api_key_cached=false"));

    let _ = std::fs::remove_file(prefs);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cli_without_token_sends_no_authorization() {
    let _guard = TEST_LOCK.lock().await;
    let server = spawn_backend().await;

    let output = run_pantry(&server.base_url, None).await;
    assert!(output.status.success());
    assert_eq!(server.backend.requests()[0].authorization, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cli_falls_back_to_demo_items() {
    let _guard = TEST_LOCK.lock().await;

    let output = run_pantry("http://127.0.0.1:9", None).await;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("total=4"));
}
