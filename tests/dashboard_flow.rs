//! End-to-end flows against an in-process mock of the insights API.

use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use chrono::Local;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use insights_dashboard::session::{TENANT_KEY, TOKEN_KEY};
use insights_dashboard::view::{display_date, INVALID_DATE, LOADING};
use insights_dashboard::{
    App, AppError, Config, CredentialStore, DashboardPage, FileStore, LoadOutcome, MemoryStore,
    Navigation, Route,
};

// ============================================
// Mock API
// ============================================

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    query: Option<String>,
    authorization: Option<String>,
    content_type: Option<String>,
    cache_control: Option<String>,
    body: String,
}

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    body: String,
    delay: Duration,
}

#[derive(Default)]
struct MockApi {
    routes: Mutex<HashMap<String, Canned>>,
    requests: Mutex<Vec<Recorded>>,
}

impl MockApi {
    /// Respond to `key` ("/path" or "/path?query") with `status` and `body`
    fn respond(&self, key: &str, status: u16, body: impl Into<String>) {
        self.respond_after(key, status, body, Duration::ZERO);
    }

    fn respond_after(&self, key: &str, status: u16, body: impl Into<String>, delay: Duration) {
        self.routes.lock().unwrap().insert(
            key.to_string(),
            Canned {
                status: StatusCode::from_u16(status).unwrap(),
                body: body.into(),
                delay,
            },
        );
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

async fn handle(State(mock): State<Arc<MockApi>>, req: Request) -> Response {
    let (method, path, query, authorization, content_type, cache_control) = {
        let header_value = |name: header::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(str::to_string);
        let authorization = header_value(header::AUTHORIZATION);
        let content_type = header_value(header::CONTENT_TYPE);
        let cache_control = header_value(header::CACHE_CONTROL);
        (method, path, query, authorization, content_type, cache_control)
    };
    let body = to_bytes(req.into_body(), usize::MAX).await.unwrap();

    mock.requests.lock().unwrap().push(Recorded {
        method,
        path: path.clone(),
        query: query.clone(),
        authorization,
        content_type,
        cache_control,
        body: String::from_utf8_lossy(&body).to_string(),
    });

    let full = match &query {
        Some(q) => format!("{}?{}", path, q),
        None => path.clone(),
    };
    let canned = {
        let routes = mock.routes.lock().unwrap();
        routes.get(&full).or_else(|| routes.get(&path)).cloned()
    };

    match canned {
        Some(canned) => {
            if !canned.delay.is_zero() {
                tokio::time::sleep(canned.delay).await;
            }
            (
                canned.status,
                [(header::CONTENT_TYPE, "application/json")],
                canned.body,
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "no such route").into_response(),
    }
}

async fn start_mock() -> (Arc<MockApi>, String) {
    let mock = Arc::new(MockApi::default());
    let router = Router::new().fallback(handle).with_state(Arc::clone(&mock));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (mock, format!("http://{}", addr))
}

/// Healthy responses for every insights endpoint
fn seed_insights(mock: &MockApi) {
    mock.respond(
        "/insights/summary",
        200,
        json!({ "customers": 42, "orders": 120, "revenue": 15230.5, "averageOrderValue": 126.92 })
            .to_string(),
    );
    mock.respond(
        "/insights/orders-by-date",
        200,
        json!([
            { "orderDate": "2024-01-01T00:00:00Z", "total": 3 },
            { "orderDate": "2024-01-02T00:00:00Z", "total": 5 }
        ])
        .to_string(),
    );
    mock.respond(
        "/insights/top-customers",
        200,
        json!([
            { "id": 1, "name": "Asha", "spend": 900 },
            { "id": 2, "name": "Ben", "spend": "450.5" }
        ])
        .to_string(),
    );
    mock.respond(
        "/insights/top-products",
        200,
        json!([{ "title": "Kettle", "revenue": 480, "units": 12 }]).to_string(),
    );
    mock.respond(
        "/insights/new-vs-repeat",
        200,
        json!({ "new": 30, "repeat": 12 }).to_string(),
    );
}

fn app_for(base_url: &str) -> (App, Arc<MemoryStore>) {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    let store = Arc::new(MemoryStore::new());
    let app = App::new(config, store.clone()).unwrap();
    (app, store)
}

/// Admit a session; the returned page's entry cycle is still running
async fn admitted(app: &App, store: &MemoryStore) -> DashboardPage {
    store.set_item(TOKEN_KEY, "tok-1").await.unwrap();
    match app.navigate(Route::Dashboard).await.unwrap() {
        Navigation::Dashboard(page) => page,
        Navigation::Login { .. } => panic!("expected the dashboard to be admitted"),
    }
}

// ============================================
// Tests
// ============================================

#[tokio::test]
async fn test_full_load_sequence() {
    let (mock, base) = start_mock().await;
    seed_insights(&mock);
    let (app, store) = app_for(&base);
    let mut page = admitted(&app, &store).await;

    // Entering the dashboard loads it; no explicit reload
    assert_eq!(page.loaded().await, LoadOutcome::Completed);

    let paths: Vec<String> = mock.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            "/insights/summary",
            "/insights/orders-by-date",
            "/insights/top-customers",
            "/insights/top-products",
            "/insights/new-vs-repeat",
        ]
    );

    for request in mock.requests() {
        assert_eq!(request.method, "GET");
        assert_eq!(request.authorization.as_deref(), Some("Bearer tok-1"));
        assert_eq!(request.content_type.as_deref(), Some("application/json"));
        assert_eq!(request.cache_control.as_deref(), Some("no-store"));
    }

    let view = page.view().await;
    assert!(!view.loading);
    assert!(view.error.is_none());
    assert_eq!(view.cards[0].value, "42");
    assert_eq!(view.cards[2].value, "₹15230.50");
    assert_eq!(view.series.len(), 2);
    assert_eq!(view.customers[1].value, 450.5);
    assert_eq!(view.products[0].name, "Kettle");
    assert_eq!(view.split[0].value, 30.0);

    let text = page.render().await;
    assert!(!text.contains(LOADING));
    assert!(text.contains("Top 5 customers by spend"));
    assert!(text.contains("Asha"));
}

#[tokio::test]
async fn test_missing_summary_fields_render_zero() {
    let (mock, base) = start_mock().await;
    seed_insights(&mock);
    mock.respond("/insights/summary", 200, r#"{"customers": 5}"#);
    let (app, store) = app_for(&base);
    let mut page = admitted(&app, &store).await;

    assert_eq!(page.loaded().await, LoadOutcome::Completed);

    let state = page.state().await;
    assert_eq!(state.summary.customers, 5.0);
    assert_eq!(state.summary.orders, 0.0);
    assert_eq!(state.summary.revenue, 0.0);
    assert_eq!(state.summary.average_order_value, 0.0);

    let cards: Vec<String> = page.view().await.cards.into_iter().map(|c| c.value).collect();
    assert_eq!(cards, vec!["5", "0", "₹0.00", "₹0.00"]);
}

#[tokio::test]
async fn test_string_total_is_numeric_in_series() {
    let (mock, base) = start_mock().await;
    seed_insights(&mock);
    mock.respond(
        "/insights/orders-by-date",
        200,
        r#"[{"orderDate":"2024-01-01T00:00:00Z","total":"3"}]"#,
    );
    let (app, store) = app_for(&base);
    let mut page = admitted(&app, &store).await;
    page.loaded().await;

    let series = page.view().await.series;
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].total, 3.0);
    assert_ne!(series[0].date, INVALID_DATE);
    assert_eq!(
        series[0].date,
        display_date("2024-01-01T00:00:00Z", &Local, "%-m/%-d/%Y")
    );
}

#[tokio::test]
async fn test_filter_changes_and_clear_omit_empty_params() {
    let (mock, base) = start_mock().await;
    seed_insights(&mock);
    let (app, store) = app_for(&base);
    let mut page = admitted(&app, &store).await;

    page.loaded().await;

    let cycle = page.set_from("2024-01-01").expect("filter changed");
    assert_eq!(cycle.await.unwrap(), LoadOutcome::Completed);

    let cycle = page.set_to("2024-01-31").expect("filter changed");
    assert_eq!(cycle.await.unwrap(), LoadOutcome::Completed);

    // Same value again: no new cycle
    assert!(page.set_to("2024-01-31").is_none());

    let cycle = page.clear_filter().expect("filter changed");
    assert_eq!(cycle.await.unwrap(), LoadOutcome::Completed);

    // Clearing an already clear filter does nothing
    assert!(page.clear_filter().is_none());

    let queries: Vec<Option<String>> = mock
        .requests_to("/insights/orders-by-date")
        .into_iter()
        .map(|r| r.query)
        .collect();
    assert_eq!(
        queries,
        vec![
            None,
            Some("from=2024-01-01".to_string()),
            Some("from=2024-01-01&to=2024-01-31".to_string()),
            None,
        ]
    );

    // The other endpoints never carry the filter
    for path in [
        "/insights/summary",
        "/insights/top-customers",
        "/insights/top-products",
        "/insights/new-vs-repeat",
    ] {
        assert!(mock.requests_to(path).iter().all(|r| r.query.is_none()));
    }
}

#[tokio::test]
async fn test_error_body_shown_verbatim() {
    let (mock, base) = start_mock().await;
    seed_insights(&mock);
    mock.respond("/insights/summary", 401, "Invalid or expired token");
    let (app, store) = app_for(&base);
    let mut page = admitted(&app, &store).await;

    let outcome = page.loaded().await;
    assert_eq!(
        outcome,
        LoadOutcome::Failed("Invalid or expired token".to_string())
    );

    // The first failure stops the sequence
    assert_eq!(mock.requests().len(), 1);

    let view = page.view().await;
    assert!(!view.loading);
    assert_eq!(view.error.as_deref(), Some("Invalid or expired token"));
    assert!(page.render().await.contains("! Invalid or expired token"));
}

#[tokio::test]
async fn test_empty_error_body_uses_status() {
    let (mock, base) = start_mock().await;
    seed_insights(&mock);
    mock.respond("/insights/top-products", 500, "");
    let (app, store) = app_for(&base);
    let mut page = admitted(&app, &store).await;

    assert_eq!(
        page.loaded().await,
        LoadOutcome::Failed("HTTP 500".to_string())
    );

    // Steps before the failure keep what they wrote
    let state = page.state().await;
    assert_eq!(state.summary.customers, 42.0);
    assert_eq!(state.series.len(), 2);
    assert_eq!(state.top_customers.len(), 2);
    assert!(state.top_products.is_empty());
    assert_eq!(state.error.as_deref(), Some("HTTP 500"));

    // No automatic retry
    assert_eq!(mock.requests_to("/insights/top-products").len(), 1);
    assert!(mock.requests_to("/insights/new-vs-repeat").is_empty());
}

#[tokio::test]
async fn test_next_cycle_clears_error() {
    let (mock, base) = start_mock().await;
    seed_insights(&mock);
    mock.respond("/insights/new-vs-repeat", 503, "");
    let (app, store) = app_for(&base);
    let mut page = admitted(&app, &store).await;

    assert!(matches!(page.loaded().await, LoadOutcome::Failed(_)));

    mock.respond("/insights/new-vs-repeat", 200, r#"{"new": 1, "repeat": 2}"#);
    let cycle = page.set_from("2024-02-01").expect("filter changed");
    assert_eq!(cycle.await.unwrap(), LoadOutcome::Completed);
    assert!(page.state().await.error.is_none());
}

#[tokio::test]
async fn test_no_token_redirects_without_requests() {
    let (mock, base) = start_mock().await;
    seed_insights(&mock);
    let (app, _store) = app_for(&base);

    let nav = app.navigate(Route::Dashboard).await.unwrap();
    assert!(matches!(nav, Navigation::Login { redirected: true }));

    let nav = app.navigate(Route::Root).await.unwrap();
    assert_eq!(nav.route(), Route::Login);

    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_login_persists_session() {
    let (mock, base) = start_mock().await;
    seed_insights(&mock);
    mock.respond("/auth/login", 200, r#"{"token": "tok-9", "tenantId": 12}"#);
    let (app, store) = app_for(&base);

    let route = app.login("you@example.com", "Strong@123").await.unwrap();
    assert_eq!(route, Route::Dashboard);

    assert_eq!(store.get_item(TOKEN_KEY).await.unwrap().as_deref(), Some("tok-9"));
    assert_eq!(store.get_item(TENANT_KEY).await.unwrap().as_deref(), Some("12"));

    let login = &mock.requests_to("/auth/login")[0];
    assert_eq!(login.method, "POST");
    assert!(login.authorization.is_none());
    let body: serde_json::Value = serde_json::from_str(&login.body).unwrap();
    assert_eq!(
        body,
        json!({ "email": "you@example.com", "password": "Strong@123" })
    );

    match app.navigate(route).await.unwrap() {
        Navigation::Dashboard(mut page) => {
            assert_eq!(page.session().token(), "tok-9");
            assert_eq!(page.loaded().await, LoadOutcome::Completed);
            assert_eq!(
                mock.requests_to("/insights/summary")[0].authorization.as_deref(),
                Some("Bearer tok-9")
            );
        }
        Navigation::Login { .. } => panic!("expected dashboard after login"),
    }
}

#[tokio::test]
async fn test_login_failure_keeps_no_session() {
    let (mock, base) = start_mock().await;
    mock.respond("/auth/login", 401, "Invalid credentials");
    let (app, store) = app_for(&base);

    match app.login("you@example.com", "wrong").await {
        Err(AppError::Login(message)) => assert_eq!(message, "Invalid credentials"),
        other => panic!("expected login error, got {:?}", other.map(|r| r.to_string())),
    }
    assert_eq!(store.get_item(TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_logout_then_dashboard_redirects() {
    let (mock, base) = start_mock().await;
    seed_insights(&mock);
    let (app, store) = app_for(&base);
    admitted(&app, &store).await;
    store.set_item(TENANT_KEY, "12").await.unwrap();

    assert_eq!(app.logout().await.unwrap(), Route::Login);
    assert_eq!(store.get_item(TOKEN_KEY).await.unwrap(), None);
    assert_eq!(store.get_item(TENANT_KEY).await.unwrap(), None);

    let nav = app.navigate(Route::Dashboard).await.unwrap();
    assert!(matches!(nav, Navigation::Login { redirected: true }));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_superseded_cycle_does_not_overwrite() {
    let (mock, base) = start_mock().await;
    seed_insights(&mock);
    // The filtered series is slow and would land after the newer cycle
    mock.respond_after(
        "/insights/orders-by-date?from=2024-01-01",
        200,
        r#"[{"orderDate":"2023-06-01","total":999}]"#,
        Duration::from_millis(300),
    );
    let (app, store) = app_for(&base);
    let mut page = admitted(&app, &store).await;
    assert_eq!(page.loaded().await, LoadOutcome::Completed);

    let slow = page.set_from("2024-01-01").expect("filter changed");
    tokio::time::sleep(Duration::from_millis(100)).await;
    let fast = page.clear_filter().expect("filter changed");

    assert_eq!(fast.await.unwrap(), LoadOutcome::Completed);
    assert_eq!(slow.await.unwrap(), LoadOutcome::Superseded);

    let state = page.state().await;
    assert_eq!(state.series.len(), 2);
    assert!(state.series.iter().all(|p| p.total != 999.0));
    assert!(!state.loading);
    assert!(state.error.is_none());

    // The stale cycle stopped before its remaining steps
    assert_eq!(mock.requests_to("/insights/summary").len(), 3);
    assert_eq!(mock.requests_to("/insights/top-customers").len(), 2);
}

#[tokio::test]
async fn test_unreachable_api_surfaces_error() {
    let (app, store) = app_for("http://127.0.0.1:9");
    let mut page = admitted(&app, &store).await;

    match page.loaded().await {
        LoadOutcome::Failed(message) => assert!(!message.is_empty()),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(page.render().await.contains("! "));
}

#[tokio::test]
async fn test_session_file_survives_restart() {
    let (mock, base) = start_mock().await;
    seed_insights(&mock);
    mock.respond("/auth/login", 200, r#"{"token": "tok-file", "tenantId": "acme"}"#);

    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.api.base_url = base.clone();
    config.session.path = Some(dir.path().join("session.toml").to_string_lossy().to_string());

    let first = App::from_config(config.clone()).unwrap();
    first.login("a@b.c", "pw").await.unwrap();

    let second = App::from_config(config.clone()).unwrap();
    match second.navigate(Route::Root).await.unwrap() {
        Navigation::Dashboard(page) => {
            assert_eq!(page.session().token(), "tok-file");
            assert_eq!(page.session().tenant_id(), Some("acme"));
        }
        Navigation::Login { .. } => panic!("expected persisted session"),
    }

    second.logout().await.unwrap();
    let store = FileStore::new(dir.path().join("session.toml"));
    assert_eq!(store.get_item(TOKEN_KEY).await.unwrap(), None);
    assert_eq!(store.get_item(TENANT_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_entry_cycle_runs_without_reload() {
    let (mock, base) = start_mock().await;
    seed_insights(&mock);
    let (app, store) = app_for(&base);
    let mut page = admitted(&app, &store).await;

    let cycle = page.take_mount().expect("entry cycle started");
    assert_eq!(cycle.await.unwrap(), LoadOutcome::Completed);
    assert_eq!(mock.requests().len(), 5);
    assert_eq!(page.state().await.summary.customers, 42.0);

    // Once taken, waiting for the page runs a fresh cycle
    assert_eq!(page.loaded().await, LoadOutcome::Completed);
    assert_eq!(mock.requests().len(), 10);
}

#[tokio::test]
async fn test_corrupt_session_file_recovers_on_logout_and_login() {
    let (mock, base) = start_mock().await;
    seed_insights(&mock);
    mock.respond("/auth/login", 200, r#"{"token": "tok-new", "tenantId": 4}"#);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.toml");
    let mut config = Config::default();
    config.api.base_url = base;
    config.session.path = Some(path.to_string_lossy().to_string());
    let app = App::from_config(config).unwrap();

    // Truncated mid-write
    std::fs::write(&path, "token = \"abc").unwrap();
    assert!(app.navigate(Route::Dashboard).await.is_err());

    assert_eq!(app.logout().await.unwrap(), Route::Login);
    assert!(!path.exists());
    let nav = app.navigate(Route::Dashboard).await.unwrap();
    assert!(matches!(nav, Navigation::Login { redirected: true }));

    std::fs::write(&path, "token = \"abc").unwrap();
    assert_eq!(app.login("a@b.c", "pw").await.unwrap(), Route::Dashboard);
    match app.navigate(Route::Dashboard).await.unwrap() {
        Navigation::Dashboard(page) => {
            assert_eq!(page.session().token(), "tok-new");
            assert_eq!(page.session().tenant_id(), Some("4"));
        }
        Navigation::Login { .. } => panic!("expected login to replace the corrupt session"),
    }
}
