//! Integration tests for the preview server supervisor
//!
//! These tests spawn real short-lived processes and only run on unix.

#![cfg(unix)]

use site_mirror::config::ServerConfig;
use site_mirror::supervisor::{build_probe_client, wait_until_ready, ServerProcess};
use site_mirror::ExportError;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn shell_server(script: &str, origin: &str) -> ServerConfig {
    ServerConfig {
        command: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        working_dir: PathBuf::from("."),
        origin: origin.to_string(),
        spawn: true,
    }
}

#[tokio::test]
async fn test_early_exit_does_not_wait_for_timeout() {
    let origin = Url::parse("http://127.0.0.1:1/").unwrap();
    let mut server =
        ServerProcess::start(&shell_server("sleep 1; exit 1", origin.as_str()), 1024).unwrap();
    let client = build_probe_client().unwrap();

    let started = Instant::now();
    let result = wait_until_ready(
        &client,
        &origin,
        Duration::from_secs(60),
        Duration::from_millis(100),
        Some(server.exit_watch()),
    )
    .await;

    assert!(matches!(result, Err(ExportError::ProcessExitedEarly { .. })));
    assert!(started.elapsed() < Duration::from_secs(10));

    let status = server.shutdown().await.unwrap();
    assert_eq!(status.code, Some(1));
}

#[tokio::test]
async fn test_ready_while_server_runs() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/en/"))
        .mount(&mock_server)
        .await;

    let origin = Url::parse(&mock_server.uri()).unwrap();
    let mut server = ServerProcess::start(
        &shell_server("echo ready; exec sleep 30", origin.as_str()),
        1024,
    )
    .unwrap();
    let client = build_probe_client().unwrap();

    wait_until_ready(
        &client,
        &origin,
        Duration::from_secs(5),
        Duration::from_millis(50),
        Some(server.exit_watch()),
    )
    .await
    .expect("server should be ready");

    let status = tokio::time::timeout(Duration::from_secs(10), server.shutdown())
        .await
        .expect("shutdown should not hang")
        .unwrap();
    assert!(!status.success());
    assert_eq!(server.tails().stdout, "ready\n");
}

#[tokio::test]
async fn test_server_ignoring_sigterm_is_killed() {
    let mut server = ServerProcess::start(
        &shell_server("trap '' TERM; echo trapped; while true; do sleep 1; done", "http://127.0.0.1:1"),
        1024,
    )
    .unwrap();

    // Give the shell time to install the trap
    tokio::time::sleep(Duration::from_millis(300)).await;

    let status = tokio::time::timeout(Duration::from_secs(20), server.shutdown())
        .await
        .expect("shutdown should fall back to a hard kill")
        .unwrap();

    assert!(!status.success());
    assert!(server.has_exited().is_some());
}

#[tokio::test]
async fn test_missing_working_dir_fails_to_spawn() {
    let config = ServerConfig {
        working_dir: PathBuf::from("/definitely/not/a/real/dir"),
        ..shell_server("exit 0", "http://127.0.0.1:1")
    };

    let result = ServerProcess::start(&config, 1024);

    assert!(matches!(result, Err(ExportError::Spawn { .. })));
}
