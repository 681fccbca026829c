//! Integration tests for a full export run
//!
//! These tests use wiremock as the site origin and write the mirror into a
//! temporary directory. Tests that start a preview server use `sh`/`sleep`
//! and only run on unix.

use site_mirror::config::Config;
use site_mirror::{run_export, ExportError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGO: &[u8] = &[0x89, b'P', b'N', b'G', 0x00, 0xff, 0x10];

/// Creates a configuration exporting `origin` into `workspace`
fn create_test_config(origin: &str, workspace: &Path) -> Config {
    let mut config = Config::default();
    config.server.origin = origin.to_string();
    config.server.spawn = false;
    config.timing.startup_timeout_ms = 5_000;
    config.timing.poll_interval_ms = 50;
    config.export.output_dir = workspace.join("dist");
    config.export.static_dir = workspace.join("static");
    config.export.asset_concurrency = 4;
    config
}

/// Uses a long-running dummy process as the preview server
fn with_dummy_server(mut config: Config) -> Config {
    config.server.spawn = true;
    config.server.command = "sleep".to_string();
    config.server.args = vec!["30".to_string()];
    config
}

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

/// Mounts a small site: home, about, a logo and the dev client script
async fn mount_site(server: &MockServer) {
    mount_html(
        server,
        "/",
        r#"<html><head><script src="/_frsh/fresh_dev_client.js"></script></head><body><a href="/about">About</a><img src="/logo.png"></body></html>"#,
    )
    .await;
    mount_html(
        server,
        "/about",
        r#"<html><body><a href="/">Home</a><a href="/about/">Self</a><img src="/logo.png"></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(LOGO.to_vec(), "image/png"))
        .expect(1)
        .mount(server)
        .await;
}

/// Reads every file of a tree into memory, keyed by relative path
fn read_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap().to_path_buf();
            (relative, std::fs::read(entry.path()).unwrap())
        })
        .collect()
}

#[cfg(unix)]
#[tokio::test]
async fn test_end_to_end_export() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let workspace = TempDir::new().unwrap();
    let config = with_dummy_server(create_test_config(&mock_server.uri(), workspace.path()));

    let stats = run_export(&config).await.expect("export should succeed");

    assert_eq!(stats.pages.written, 2);
    assert_eq!(stats.assets.written, 1);
    assert_eq!(stats.pages_visited, 2);
    assert_eq!(stats.assets.discovered, 1);
    assert_eq!(stats.summary(), "Export completed. Pages: 2, Assets: 1");

    let dist = workspace.path().join("dist");
    let index = std::fs::read_to_string(dist.join("index.html")).unwrap();
    assert!(!index.contains("fresh_dev_client"));
    assert!(index.contains(r#"<a href="/about">About</a>"#));
    assert!(dist.join("about/index.html").is_file());
    assert_eq!(std::fs::read(dist.join("logo.png")).unwrap(), LOGO);
    assert!(!dist.join("_frsh").exists());
}

#[tokio::test]
async fn test_export_rewrites_image_loader_urls() {
    let mock_server = MockServer::start().await;
    mount_html(
        &mock_server,
        "/",
        r#"<img src="/live/invoke/website/loaders/image.ts?src=%2Fimg%2Fhero.jpg&amp;width=640" srcset="/live/invoke/website/loaders/image.ts?src=%2Fimg%2Fhero.jpg&amp;width=1280 2x">"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/img/hero.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"jpeg".to_vec(), "image/jpeg"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let workspace = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), workspace.path());

    let stats = run_export(&config).await.unwrap();

    let index = std::fs::read_to_string(workspace.path().join("dist/index.html")).unwrap();
    assert_eq!(index, r#"<img src="/img/hero.jpg" srcset="/img/hero.jpg 2x">"#);
    assert_eq!(stats.assets.written, 1);
    assert_eq!(
        std::fs::read(workspace.path().join("dist/img/hero.jpg")).unwrap(),
        b"jpeg"
    );
}

#[tokio::test]
async fn test_non_html_page_is_skipped() {
    let mock_server = MockServer::start().await;
    mount_html(&mock_server, "/", r#"<a href="/feed">RSS</a><a href="/missing">Gone</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<rss></rss>", "application/xml"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let workspace = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), workspace.path());

    let stats = run_export(&config).await.unwrap();

    assert_eq!(stats.pages_visited, 3);
    assert_eq!(stats.pages.written, 1);
    assert_eq!(stats.pages.unsupported, 1);
    assert_eq!(stats.pages.failed, 1);
    assert_eq!(stats.summary(), "Export completed. Pages: 3, Assets: 0");
    assert!(!workspace.path().join("dist/feed").exists());
    assert!(!workspace.path().join("dist/missing").exists());
}

#[tokio::test]
async fn test_export_is_idempotent() {
    let mock_server = MockServer::start().await;
    mount_html(
        &mock_server,
        "/",
        r#"<a href="/a">A</a><a href="/b/">B</a><link href="/styles.css" rel="stylesheet">"#,
    )
    .await;
    mount_html(&mock_server, "/a", r#"<a href="/b">B</a><a href="/">Home</a>"#).await;
    mount_html(&mock_server, "/b", r#"<a href="/a">A</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/styles.css"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("body{margin:0}", "text/css"))
        .mount(&mock_server)
        .await;

    let workspace = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), workspace.path());
    let dist = workspace.path().join("dist");

    run_export(&config).await.unwrap();
    let first = read_tree(&dist);

    std::fs::write(dist.join("stale.html"), "from a previous run").unwrap();

    run_export(&config).await.unwrap();
    let second = read_tree(&dist);

    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
    assert!(!dist.join("stale.html").exists());
}

#[tokio::test]
async fn test_static_files_override_generated_ones() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let workspace = TempDir::new().unwrap();
    let static_dir = workspace.path().join("static");
    std::fs::create_dir_all(static_dir.join("fonts")).unwrap();
    std::fs::write(static_dir.join("logo.png"), "hand-made logo").unwrap();
    std::fs::write(static_dir.join("fonts/inter.woff2"), [1u8, 2, 3]).unwrap();

    let config = create_test_config(&mock_server.uri(), workspace.path());

    let stats = run_export(&config).await.unwrap();

    let dist = workspace.path().join("dist");
    assert_eq!(stats.static_files, 2);
    assert_eq!(
        std::fs::read_to_string(dist.join("logo.png")).unwrap(),
        "hand-made logo"
    );
    assert_eq!(std::fs::read(dist.join("fonts/inter.woff2")).unwrap(), vec![1u8, 2, 3]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_server_crash_reports_stderr() {
    let workspace = TempDir::new().unwrap();
    let mut config = create_test_config("http://127.0.0.1:1", workspace.path());
    config.server.spawn = true;
    config.server.command = "sh".to_string();
    config.server.args = vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()];
    config.timing.startup_timeout_ms = 30_000;

    let started = std::time::Instant::now();
    let failure = run_export(&config).await.unwrap_err();

    assert!(started.elapsed() < std::time::Duration::from_secs(15));
    assert!(matches!(failure.error, ExportError::ProcessExitedEarly { .. }));
    assert!(failure.tails.stderr.contains("boom"));
    assert!(failure.to_string().contains("boom"));

    let dist = workspace.path().join("dist");
    assert!(dist.is_dir());
    assert!(!dist.join("index.html").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_startup_timeout() {
    let workspace = TempDir::new().unwrap();
    let mut config = with_dummy_server(create_test_config("http://127.0.0.1:1", workspace.path()));
    config.timing.startup_timeout_ms = 300;

    let failure = run_export(&config).await.unwrap_err();

    assert!(matches!(
        failure.error,
        ExportError::StartupTimeout { timeout_ms: 300 }
    ));
    assert!(!workspace.path().join("dist/index.html").exists());
}

#[tokio::test]
async fn test_startup_timeout_without_spawn() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let workspace = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), workspace.path());
    config.timing.startup_timeout_ms = 200;

    let failure = run_export(&config).await.unwrap_err();

    assert!(matches!(failure.error, ExportError::StartupTimeout { .. }));
    assert_eq!(failure.tails, Default::default());
}
