//! Integration tests for the mirroring session
//!
//! These tests use wiremock to serve pages and assets, and a renderer that
//! loads page markup over plain HTTP in place of the headless browser.

use async_trait::async_trait;
use site_mirror::config::MirrorConfig;
use site_mirror::crawler::content_name;
use site_mirror::{MirrorSession, PageRenderer, VisitState};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Loads markup with a plain GET and records every URL it renders
struct HttpRenderer {
    client: reqwest::Client,
    rendered: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&mut self, url: &Url) -> Result<String, site_mirror::RenderError> {
        self.rendered.lock().unwrap().push(url.path().to_string());

        let navigation = |message: String| site_mirror::RenderError::Navigation {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| navigation(e.to_string()))?;
        if !response.status().is_success() {
            return Err(navigation(format!("HTTP {}", response.status())));
        }
        response.text().await.map_err(|e| navigation(e.to_string()))
    }
}

/// Creates a test configuration with no politeness delay and fast retries
fn create_test_config(max_pages: u32) -> MirrorConfig {
    let mut config = MirrorConfig::default();
    config.crawler.max_pages = max_pages;
    config.crawler.delay_ms = 0;
    config.http.backoff_ms = 1;
    config.http.max_retries = 0;
    config
}

fn create_session(config: MirrorConfig, dir: &TempDir) -> (MirrorSession, Arc<Mutex<Vec<String>>>) {
    let rendered = Arc::new(Mutex::new(Vec::new()));
    let renderer = HttpRenderer {
        client: reqwest::Client::new(),
        rendered: Arc::clone(&rendered),
    };
    let session = MirrorSession::with_renderer(config, dir.path(), Box::new(renderer))
        .expect("Failed to build session");
    (session, rendered)
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

async fn mount_asset(server: &MockServer, asset_path: &str, content_type: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(asset_path))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", content_type)
                .set_body_bytes(body),
        )
        .mount(server)
        .await;
}

/// Lists every regular file under `root`, relative and sorted
fn list_files(root: &Path) -> Vec<String> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, root, out);
            } else {
                let relative = path.strip_prefix(root).unwrap();
                out.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
    }

    let mut files = Vec::new();
    walk(root, root, &mut files);
    files.sort();
    files
}

fn read(root: &Path, file: &str) -> String {
    std::fs::read_to_string(root.join(file)).unwrap()
}

#[tokio::test]
async fn test_single_page_round_trip() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<!DOCTYPE html><html><head><title>Home</title>
        <style>h1 { color: navy; }</style>
        </head><body><h1>Hello</h1>
        <img src="/media/photo.jpg" alt="photo">
        <script>document.title = "ready";</script>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_asset(&server, "/media/photo.jpg", "image/jpeg", vec![0xFF; 512]).await;

    let dir = TempDir::new().unwrap();
    let (mut session, _) = create_session(create_test_config(1), &dir);
    session.start(&server.uri()).await.unwrap();
    session.shutdown().await;

    let css = format!("css/{}", content_name(b"h1 { color: navy; }", ".css"));
    let js = format!("js/{}", content_name(br#"document.title = "ready";"#, ".js"));

    let mut expected = vec![
        css.clone(),
        "images/photo.jpg".to_string(),
        "index.html".to_string(),
        js.clone(),
    ];
    expected.sort();
    assert_eq!(list_files(dir.path()), expected);
    assert_eq!(session.files_written(), 4);
    assert_eq!(session.bytes_written(), 512);

    let page = read(dir.path(), "index.html");
    assert!(page.contains(&format!(r#"href="{}""#, css)));
    assert!(page.contains(&format!(r#"<script src="{}"></script>"#, js)));
    assert!(page.contains(r#"src="images/photo.jpg""#));
    assert!(!page.contains("color: navy"));
    assert!(!page.contains("/media/photo.jpg"));
}

#[tokio::test]
async fn test_link_cycle_terminates() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/",
        format!(r#"<html><body><a href="{}/page2">Next</a></body></html>"#, base),
    )
    .await;
    mount_page(
        &server,
        "/page2",
        format!(r#"<html><body><a href="{}/">Home</a></body></html>"#, base),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let (mut session, rendered) = create_session(create_test_config(2), &dir);
    session.start(&format!("{}/", base)).await.unwrap();

    assert_eq!(*rendered.lock().unwrap(), vec!["/", "/page2"]);
    assert_eq!(list_files(dir.path()), vec!["index.html", "page2.html"]);
    assert_eq!(session.stats().pages_saved, 2);
}

#[tokio::test]
async fn test_cycle_with_spare_budget_never_rerenders_root() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/page2">Next</a>"#.to_string()).await;
    mount_page(&server, "/page2", r#"<a href="/">Home</a><a href="/#top">Top</a>"#.to_string()).await;

    let dir = TempDir::new().unwrap();
    let (mut session, rendered) = create_session(create_test_config(10), &dir);
    session.start(&server.uri()).await.unwrap();

    assert_eq!(*rendered.lock().unwrap(), vec!["/", "/page2"]);
    assert_eq!(session.pages_visited(), 2);
}

#[tokio::test]
async fn test_external_links_are_not_visited() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(&other)
        .await;

    mount_page(
        &server,
        "/",
        format!(
            r#"<html><body><a href="{}/elsewhere">Elsewhere</a><a href="/local">Local</a></body></html>"#,
            other.uri()
        ),
    )
    .await;
    mount_page(&server, "/local", "<html><body>local</body></html>".to_string()).await;

    let dir = TempDir::new().unwrap();
    let (mut session, rendered) = create_session(create_test_config(10), &dir);
    session.start(&server.uri()).await.unwrap();

    assert_eq!(*rendered.lock().unwrap(), vec!["/", "/local"]);
    assert_eq!(session.stats().links_denied, 1);
    other.verify().await;
}

#[tokio::test]
async fn test_disabled_images_stay_remote() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><img src="/a.png"><img src="/b.gif"></body></html>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 16]))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(1);
    config.downloads.images = false;

    let dir = TempDir::new().unwrap();
    let (mut session, _) = create_session(config, &dir);
    session.start(&server.uri()).await.unwrap();

    assert_eq!(std::fs::read_dir(dir.path().join("images")).unwrap().count(), 0);
    let page = read(dir.path(), "index.html");
    assert!(page.contains(r#"<img src="/a.png">"#));
    assert!(page.contains(r#"<img src="/b.gif">"#));
    assert_eq!(session.files_written(), 1);
}

#[tokio::test]
async fn test_oversized_asset_is_not_written() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><img src="/big.png"><img src="/small.png"></body></html>"#.to_string(),
    )
    .await;
    mount_asset(&server, "/big.png", "image/png", vec![7u8; 4096]).await;
    mount_asset(&server, "/small.png", "image/png", vec![7u8; 64]).await;

    let mut config = create_test_config(1);
    config.limits.max_file_size = 1024;

    let dir = TempDir::new().unwrap();
    let (mut session, _) = create_session(config, &dir);
    session.start(&server.uri()).await.unwrap();

    assert!(!dir.path().join("images/big.png").exists());
    assert!(dir.path().join("images/small.png").exists());

    let page = read(dir.path(), "index.html");
    assert!(page.contains(r#"<img src="/big.png">"#));
    assert!(page.contains(r#"<img src="images/small.png">"#));
    assert_eq!(session.stats().assets_left_remote, 1);
    assert_eq!(session.stats().assets_localized, 1);
}

#[tokio::test]
async fn test_shared_assets_are_written_once() {
    let server = MockServer::start().await;
    let shared = r#"<link rel="stylesheet" href="/site.css"><style>p { margin: 0 }</style>"#;
    mount_page(
        &server,
        "/",
        format!(r#"<html><head>{}</head><body><a href="/about">About</a></body></html>"#, shared),
    )
    .await;
    mount_page(
        &server,
        "/about",
        format!(r#"<html><head>{}</head><body>About</body></html>"#, shared),
    )
    .await;
    mount_asset(&server, "/site.css", "text/css", b"body { margin: 0 }".to_vec()).await;

    let dir = TempDir::new().unwrap();
    let (mut session, _) = create_session(create_test_config(5), &dir);
    session.start(&server.uri()).await.unwrap();

    let inline = format!("css/{}", content_name(b"p { margin: 0 }", ".css"));
    let mut expected = vec![
        "about.html".to_string(),
        "css/site.css".to_string(),
        inline,
        "index.html".to_string(),
    ];
    expected.sort();
    assert_eq!(list_files(dir.path()), expected);
    assert_eq!(session.files_written(), 4);
    assert_eq!(session.bytes_written(), "body { margin: 0 }".len() as u64);
}

#[tokio::test]
async fn test_budget_limits_rendered_pages() {
    let server = MockServer::start().await;
    let links: String = (1..=8)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", format!("<html><body>{}</body></html>", links)).await;
    for i in 1..=8 {
        mount_page(&server, &format!("/p{}", i), links.clone()).await;
    }

    let dir = TempDir::new().unwrap();
    let (mut session, rendered) = create_session(create_test_config(3), &dir);
    let progress = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&progress);
    session.set_progress_callback(move |p| sink.lock().unwrap().push((p.current_page, p.total_pages)));

    session.start(&server.uri()).await.unwrap();

    assert_eq!(*rendered.lock().unwrap(), vec!["/", "/p1", "/p2"]);
    assert_eq!(*progress.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(list_files(dir.path()), vec!["index.html", "p1.html", "p2.html"]);
}

#[tokio::test]
async fn test_failed_render_is_skipped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/gone">Gone</a><a href="/here">Here</a>"#.to_string(),
    )
    .await;
    mount_page(&server, "/here", "<p>here</p>".to_string()).await;

    let dir = TempDir::new().unwrap();
    let (mut session, rendered) = create_session(create_test_config(5), &dir);
    session.start(&server.uri()).await.unwrap();

    assert_eq!(*rendered.lock().unwrap(), vec!["/", "/gone", "/here"]);
    let gone = Url::parse(&format!("{}/gone", server.uri())).unwrap();
    assert_eq!(session.visit_state(&gone), VisitState::Skipped);
    assert_eq!(list_files(dir.path()), vec!["here.html", "index.html"]);
}

#[tokio::test]
async fn test_revisiting_a_page_is_a_noop() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<p>root</p>".to_string()).await;

    let dir = TempDir::new().unwrap();
    let (mut session, rendered) = create_session(create_test_config(5), &dir);
    let root = Url::parse(&format!("{}/", server.uri())).unwrap();

    session.scrape_page(&root).await;
    let files = session.files_written();
    let links = session.scrape_page(&root).await;

    assert!(links.is_empty());
    assert_eq!(rendered.lock().unwrap().len(), 1);
    assert_eq!(session.files_written(), files);
    assert_eq!(session.visit_state(&root), VisitState::Saved);
}
