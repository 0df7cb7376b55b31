//! Integration tests using mock HTTP server
//!
//! Tests the full flow: config → session → REST backend → pager, and the CLI
//! runner on top of it

use clap::Parser;
use lms_client::backend::{HttpSearchBackend, SearchFilters};
use lms_client::cli::{Cli, Runner};
use lms_client::config::ClientConfig;
use lms_client::http::HttpClient;
use lms_client::pager::{PagerPhase, ResultPager, REQUEST_FAILED_MESSAGE};
use lms_client::session::{
    FileTokenStore, HttpAuthApi, MemoryTokenStore, Session, SessionManager, TokenStore,
    UserIdentity,
};
use lms_client::types::{FeedbackResult, RequestMethod};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn feedback(activity: &str, cohort: &str) -> Value {
    json!({
        "program": "Data Science",
        "cohort": cohort,
        "level": "Beginner",
        "topic": "Feedback",
        "activityName": activity,
        "executed": true
    })
}

fn page_body(activities: &[&str], total: u64, has_more: bool) -> Value {
    json!({
        "results": activities.iter().map(|a| feedback(a, "C1")).collect::<Vec<_>>(),
        "total": total,
        "hasMore": has_more
    })
}

async fn mount_page(server: &MockServer, page: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path("/feedback/results"))
        .and(query_param("cohort", "C1"))
        .and(query_param("page", page.to_string()))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

fn rest_pager(
    server: &MockServer,
    page_size: u32,
) -> ResultPager<HttpSearchBackend<FeedbackResult>> {
    let config = ClientConfig::new(server.uri()).with_page_size(page_size);
    let client = HttpClient::with_config(config.http_config()).unwrap();
    ResultPager::with_page_size(HttpSearchBackend::from_config(client, &config), page_size)
}

fn activities(results: &[FeedbackResult]) -> Vec<&str> {
    results.iter().map(|r| r.activity_name.as_str()).collect()
}

// ============================================================================
// Pager over REST
// ============================================================================

#[tokio::test]
async fn test_pager_loads_all_pages_over_http() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, page_body(&["a", "b"], 5, true)).await;
    mount_page(&mock_server, 2, page_body(&["c", "d"], 5, true)).await;
    mount_page(&mock_server, 3, page_body(&["e"], 5, false)).await;

    let pager = rest_pager(&mock_server, 2);
    let filters = SearchFilters::new().with("cohort", "C1");

    assert_ok!(pager.search(filters).await);
    assert_eq!(activities(&pager.snapshot().results), vec!["a", "b"]);

    while let Some(next) = pager.load_more() {
        assert_ok!(next.await);
    }

    let state = pager.snapshot();
    assert_eq!(activities(&state.results), vec!["a", "b", "c", "d", "e"]);
    assert_eq!(state.total, 5);
    assert_eq!(state.current_page, 3);
    assert!(!state.has_more);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_slow_superseded_search_never_lands() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feedback/results"))
        .and(query_param("cohort", "A"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "results": [feedback("slow", "A")],
                    "total": 1,
                    "hasMore": false
                }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/feedback/results"))
        .and(query_param("cohort", "B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"results": [feedback("fast", "B")], "total": 1, "hasMore": false}),
        ))
        .mount(&mock_server)
        .await;

    let pager = rest_pager(&mock_server, 2);

    let slow = pager.search(SearchFilters::new().with("cohort", "A"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    let fast = pager.search(SearchFilters::new().with("cohort", "B"));

    assert_ok!(fast.await);
    assert_ok!(slow.await);
    tokio::time::sleep(Duration::from_millis(400)).await;

    let state = pager.snapshot();
    assert_eq!(activities(&state.results), vec!["fast"]);
    assert_eq!(state.results[0].cohort, "B");
    assert!(!state.loading);
}

#[tokio::test]
async fn test_failed_second_page_keeps_first() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, page_body(&["a", "b"], 4, true)).await;

    Mock::given(method("GET"))
        .and(path("/feedback/results"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
        .mount(&mock_server)
        .await;

    let pager = rest_pager(&mock_server, 2);
    assert_ok!(pager.search(SearchFilters::new().with("cohort", "C1")).await);
    assert_ok!(pager.load_more().unwrap().await);

    let state = pager.snapshot();
    assert_eq!(activities(&state.results), vec!["a", "b"]);
    assert_eq!(state.current_page, 1);
    assert_eq!(state.phase, PagerPhase::Ready);
    assert_eq!(state.error.as_deref(), Some(REQUEST_FAILED_MESSAGE));
    assert!(state.has_more);
}

#[tokio::test]
async fn test_failed_first_page_clears() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feedback/results"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let pager = rest_pager(&mock_server, 2);
    assert_ok!(pager.search(SearchFilters::new()).await);

    let state = pager.snapshot();
    assert!(state.is_empty());
    assert_eq!(state.phase, PagerPhase::Failed);
    assert_eq!(state.error.as_deref(), Some(REQUEST_FAILED_MESSAGE));
    assert!(pager.load_more().is_none());
}

#[tokio::test]
async fn test_success_without_page_fields_fails() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, 1, page_body(&["Quiz 1", "Quiz 2"], 3, true)).await;
    Mock::given(method("GET"))
        .and(path("/feedback/results"))
        .and(query_param("cohort", "C2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "db down"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pager = rest_pager(&mock_server, 2);
    assert_ok!(pager.search(SearchFilters::new().with("cohort", "C1")).await);
    assert_eq!(pager.snapshot().len(), 2);

    assert_ok!(pager.search(SearchFilters::new().with("cohort", "C2")).await);

    let state = pager.snapshot();
    assert!(state.is_empty());
    assert_eq!(state.total, 0);
    assert!(!state.has_more);
    assert_eq!(state.phase, PagerPhase::Failed);
    assert_eq!(state.error.as_deref(), Some(REQUEST_FAILED_MESSAGE));
}

#[tokio::test]
async fn test_post_search_from_yaml_config() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/feedback/search"))
        .and(body_json(json!({"level": "Advanced", "page": 1, "limit": 10})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [feedback("Capstone", "C3")],
            "total": 1,
            "hasMore": false
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let yaml = format!(
        "baseUrl: {}\npageSize: 10\nsearchPath: /api/feedback/search\nsearchMethod: POST\n",
        mock_server.uri()
    );
    let config = ClientConfig::from_yaml(&yaml).unwrap();
    assert_ok!(config.validate());
    assert_eq!(config.search_method, RequestMethod::POST);

    let client = HttpClient::with_config(config.http_config()).unwrap();
    let backend: HttpSearchBackend<FeedbackResult> =
        HttpSearchBackend::from_config(client, &config);
    let pager = ResultPager::with_page_size(backend, config.page_size);

    assert_ok!(pager.search(SearchFilters::new().with("level", "Advanced")).await);
    assert_eq!(activities(&pager.snapshot().results), vec!["Capstone"]);
}

// ============================================================================
// Session + search
// ============================================================================

#[tokio::test]
async fn test_search_carries_session_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feedback/results"))
        .and(header("Authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["a"], 1, false)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::new(mock_server.uri());
    let client = HttpClient::with_config(config.http_config()).unwrap();
    let store = MemoryTokenStore::with_session(Session::new(
        "session-token",
        UserIdentity::new("42"),
    ));
    let session = Arc::new(SessionManager::new(
        store,
        HttpAuthApi::from_config(client.clone(), &config),
    ));
    assert!(session.init(false).await.unwrap().is_some());

    let backend: HttpSearchBackend<FeedbackResult> =
        HttpSearchBackend::from_config(client.with_token_source(session), &config);
    let pager = ResultPager::new(backend);

    assert_ok!(pager.search(SearchFilters::new()).await);
    assert_eq!(pager.snapshot().len(), 1);
}

#[tokio::test]
async fn test_session_survives_restart() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "email": "alice@example.com",
            "name": "Alice"
        })))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let config = ClientConfig::new(mock_server.uri()).with_session_file(&session_path);
    let client = HttpClient::with_config(config.http_config()).unwrap();

    let first = SessionManager::new(
        FileTokenStore::new(&session_path),
        HttpAuthApi::from_config(client.clone(), &config),
    );
    let established = first.establish("tok-1").await.unwrap();
    assert_eq!(established.user.display_name.as_deref(), Some("Alice"));
    drop(first);

    let second = SessionManager::new(
        FileTokenStore::new(&session_path),
        HttpAuthApi::from_config(client, &config),
    );
    let restored = second.init(true).await.unwrap().unwrap();
    assert_eq!(restored.token, "tok-1");
    assert_eq!(restored.user.id, "42");
    assert!(second.is_authenticated().await);
}

// ============================================================================
// CLI runner
// ============================================================================

fn cli(server: &MockServer, session_file: &std::path::Path, args: &[&str]) -> Runner {
    let uri = server.uri();
    let session = session_file.to_string_lossy().to_string();
    let mut argv = vec![
        "lms-client",
        "--base-url",
        uri.as_str(),
        "--session-file",
        session.as_str(),
        "--page-size",
        "2",
    ];
    argv.extend_from_slice(args);
    Runner::new(Cli::parse_from(argv))
}

#[tokio::test]
async fn test_cli_login_search_logout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("Authorization", "Bearer cli-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u-7"})))
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, 1, page_body(&["a", "b"], 3, true)).await;
    mount_page(&mock_server, 2, page_body(&["c"], 3, false)).await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("Authorization", "Bearer cli-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");

    assert_ok!(cli(&mock_server, &session_path, &["login", "--token", "cli-token"]).run().await);
    assert!(session_path.exists());

    assert_ok!(cli(&mock_server, &session_path, &["whoami"]).run().await);

    assert_ok!(
        cli(&mock_server, &session_path, &["search", "--filter", "cohort=C1", "--all"])
            .run()
            .await
    );

    assert_ok!(cli(&mock_server, &session_path, &["logout"]).run().await);
    assert!(!session_path.exists());
    assert!(FileTokenStore::new(&session_path).load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_cli_search_failure_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feedback/results"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let runner = cli(&mock_server, &dir.path().join("none.json"), &["search"]);

    let err = runner.run().await.unwrap_err();
    assert_eq!(err.to_string(), REQUEST_FAILED_MESSAGE);
}
