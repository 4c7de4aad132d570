use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, ServerGuard};
use serde_json::{Value, json};
use tempfile::TempDir;
use tiered_templates::{
    BundledDir, CollectionType, Config, ConfigUpdate, DiskMirror, GitHubClient, Item, Origin,
    SourceMode, TemplateLoader,
};

struct Fixture {
    mirror: TempDir,
    bundled: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            mirror: TempDir::new().unwrap(),
            bundled: TempDir::new().unwrap(),
        }
    }

    fn bundle(&self, kind: CollectionType, name: &str, body: &str) {
        let dir = self.bundled.path().join(kind.as_str());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), body).unwrap();
    }

    fn loader(&self, config: Config, api_base: &str) -> TemplateLoader {
        let client = GitHubClient::with_base_url(api_base, Duration::from_secs(2)).unwrap();
        TemplateLoader::with_sources(
            config,
            Arc::new(client),
            Arc::new(DiskMirror::new(self.mirror.path())),
            Arc::new(BundledDir::new(self.bundled.path())),
        )
        .unwrap()
    }

    fn mirrored(&self, kind: CollectionType, id: &str) -> Option<Value> {
        let path = self
            .mirror
            .path()
            .join(kind.as_str())
            .join(format!("{}.json", id));
        let text = std::fs::read_to_string(path).ok()?;
        Some(serde_json::from_str(&text).unwrap())
    }
}

fn config() -> Config {
    Config::new("acme/templates".parse().unwrap())
}

fn item(value: Value) -> Item {
    Item::from_value(value).unwrap()
}

async fn mock_listing(server: &mut ServerGuard, status: usize, body: &str) -> mockito::Mock {
    server
        .mock("GET", "/repos/acme/templates/contents/templates/steps")
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .with_status(status)
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn test_remote_load_is_mirrored_and_cached() {
    let fixture = Fixture::new();
    let mut server = mockito::Server::new_async().await;

    let listing = server
        .mock("GET", "/repos/acme/templates/contents/templates/steps")
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .with_status(200)
        .with_body(r#"[{"name":"a.json","type":"file"}]"#)
        .expect(1)
        .create_async()
        .await;
    let content = server
        .mock("GET", "/repos/acme/templates/contents/templates/steps/a.json")
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .with_status(200)
        .with_body(r#"{"type":"file","encoding":"base64","content":"eyJpZCI6ImEifQ=="}"#)
        .expect(1)
        .create_async()
        .await;

    let loader = fixture.loader(config(), &server.url());

    let first = loader.load(CollectionType::Steps).await;
    assert_eq!(first, vec![item(json!({"id": "a"}))]);
    assert_eq!(
        fixture.mirrored(CollectionType::Steps, "a"),
        Some(json!({"id": "a"}))
    );

    let second = loader.load(CollectionType::Steps).await;
    assert_eq!(second, first);

    listing.assert_async().await;
    content.assert_async().await;
}

#[tokio::test]
async fn test_network_error_without_mirror_falls_back_to_bundled() {
    let fixture = Fixture::new();
    fixture.bundle(CollectionType::Steps, "b.json", r#"{"id":"b"}"#);

    // Nothing listens on port 1.
    let loader = fixture.loader(config(), "http://127.0.0.1:1");

    let items = loader.load(CollectionType::Steps).await;
    assert_eq!(items, vec![item(json!({"id": "b"}))]);
    assert!(!fixture.mirror.path().join("steps").exists());
    assert_eq!(loader.status().steps_origin, Some(Origin::Bundled));
}

#[tokio::test]
async fn test_remote_failure_serves_previous_fetch_from_mirror() {
    let fixture = Fixture::new();
    fixture.bundle(CollectionType::Steps, "b.json", r#"{"id":"b"}"#);
    let mut server = mockito::Server::new_async().await;

    let ok = mock_listing(
        &mut server,
        200,
        r#"[{"name":"a.json","type":"file","path":"templates/steps/a.json"}]"#,
    )
    .await;
    server
        .mock("GET", "/repos/acme/templates/contents/templates/steps/a.json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"type":"file","content":"eyJpZCI6ImEifQ=="}"#)
        .create_async()
        .await;

    let mut config = config();
    config.cache_ttl = Duration::ZERO;
    let loader = fixture.loader(config, &server.url());

    assert_eq!(
        loader.load(CollectionType::Steps).await,
        vec![item(json!({"id": "a"}))]
    );

    ok.remove_async().await;
    let failing = mock_listing(&mut server, 503, "unavailable").await;

    assert_eq!(
        loader.load(CollectionType::Steps).await,
        vec![item(json!({"id": "a"}))]
    );
    assert_eq!(loader.status().steps_origin, Some(Origin::Mirror));
    failing.assert_async().await;
}

#[tokio::test]
async fn test_local_only_never_calls_remote() {
    let fixture = Fixture::new();
    fixture.bundle(CollectionType::Workflows, "deploy.json", r#"{"id":"deploy"}"#);
    let mut server = mockito::Server::new_async().await;
    let remote = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let loader = fixture.loader(config(), &server.url());
    loader
        .update_config(ConfigUpdate::source(SourceMode::LocalOnly))
        .unwrap();

    assert_eq!(
        loader.load_workflows().await,
        vec![item(json!({"id": "deploy"}))]
    );
    assert!(loader.get_workflow("deploy").await.is_some());
    assert!(loader.get_workflow("missing").await.is_none());
    assert!(loader.load_steps().await.is_empty());

    let status = loader.status();
    assert_eq!(status.mode, SourceMode::LocalOnly);
    assert_eq!(status.source, "bundled");
    remote.assert_async().await;
}
