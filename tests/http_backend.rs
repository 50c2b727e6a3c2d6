//! End-to-end session flows against an in-process fake auth backend.

use std::sync::{Arc, Mutex};

use authsession::config::SessionConfig;
use authsession::{AuthOutcome, FileTokenStore, RecordingNavigator, Route, TokenStore};
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use serde_json::{Value, json};

// =============================================================================
// FAKE BACKEND
// =============================================================================

#[derive(Clone, Default)]
struct Backend {
    requests: Arc<Mutex<Vec<(&'static str, Option<String>)>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
    fail_logout: bool,
}

impl Backend {
    fn record(&self, endpoint: &'static str, headers: &HeaderMap) {
        self.requests.lock().unwrap().push((endpoint, bearer(headers)));
    }

    fn requests(&self) -> Vec<(&'static str, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(ToOwned::to_owned)
}

async fn me(State(backend): State<Backend>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    backend.record("me", &headers);
    match bearer(&headers).as_deref() {
        Some("good") => (StatusCode::OK, Json(json!({ "user": { "role": "user", "email": "a@b.com" } }))),
        Some("rotate") => (
            StatusCode::OK,
            Json(json!({ "user": { "role": "admin", "email": "root@b.com" }, "access_token": "rotated" })),
        ),
        Some("bare") => (StatusCode::OK, Json(json!({ "role": "user", "email": "bare@b.com" }))),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "invalid token" }))),
    }
}

async fn login(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    backend.record("login", &headers);
    backend.bodies.lock().unwrap().push(body.clone());
    let email = body["email"].as_str().unwrap_or_default();
    if body["password"] != "pw" {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad creds" })));
    }
    let role = if email.starts_with("admin") { "admin" } else { "user" };
    (StatusCode::OK, Json(json!({ "user": { "role": role, "email": email }, "access_token": "good" })))
}

async fn register(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    backend.record("register", &headers);
    backend.bodies.lock().unwrap().push(body.clone());
    if body["email"] == "taken@b.com" {
        return (StatusCode::CONFLICT, Json(json!({ "message": "email taken" })));
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "user": { "role": body["role"], "email": body["email"], "name": body["name"] },
            "access_token": "fresh",
        })),
    )
}

async fn logout(State(backend): State<Backend>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    backend.record("logout", &headers);
    if backend.fail_logout {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "boom" })));
    }
    (StatusCode::OK, Json(json!({ "ok": true })))
}

async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/auth/me/", get(me))
        .route("/api/auth/login/", post(login))
        .route("/api/auth/register/", post(register))
        .route("/api/auth/logout/", post(logout))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

struct Harness {
    _dir: tempfile::TempDir,
    store: FileTokenStore,
    session: authsession::SessionManager<authsession::HttpAuthApi, RecordingNavigator>,
}

async fn harness(backend: Backend, seed_token: Option<&str>) -> Harness {
    let base = spawn_backend(backend).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = SessionConfig::with_api_url(&base).unwrap();
    config.token_path = dir.path().join("token.json");

    let store = FileTokenStore::new(config.token_path.clone());
    if let Some(token) = seed_token {
        store.save(token).unwrap();
    }
    let session = authsession::connect(config, RecordingNavigator::new()).unwrap();
    Harness { _dir: dir, store, session }
}

// =============================================================================
// initialize
// =============================================================================

#[tokio::test]
async fn initialize_without_token_makes_no_request() {
    let backend = Backend::default();
    let h = harness(backend.clone(), None).await;

    h.session.initialize().await;

    let state = h.session.snapshot();
    assert_eq!(state.user, None);
    assert!(!state.loading);
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn initialize_restores_from_persisted_token() {
    let backend = Backend::default();
    let h = harness(backend.clone(), Some("good")).await;

    h.session.initialize().await;

    let state = h.session.snapshot();
    assert_eq!(state.user.as_ref().and_then(|u| u.field("email")), Some("a@b.com"));
    assert_eq!(state.token.as_deref(), Some("good"));
    assert_eq!(backend.requests(), vec![("me", Some("good".to_owned()))]);
}

#[tokio::test]
async fn initialize_accepts_bare_user_body() {
    let h = harness(Backend::default(), Some("bare")).await;

    h.session.initialize().await;

    let state = h.session.snapshot();
    assert_eq!(state.user.as_ref().and_then(|u| u.field("email")), Some("bare@b.com"));
    assert_eq!(state.token.as_deref(), Some("bare"));
}

#[tokio::test]
async fn initialize_persists_rotated_token() {
    let h = harness(Backend::default(), Some("rotate")).await;

    h.session.initialize().await;

    assert_eq!(h.session.snapshot().token.as_deref(), Some("rotated"));
    assert_eq!(h.store.load().unwrap().as_deref(), Some("rotated"));
    assert!(h.session.is_admin());
}

#[tokio::test]
async fn initialize_with_invalid_token_clears_slot() {
    let h = harness(Backend::default(), Some("junk")).await;

    h.session.initialize().await;

    let state = h.session.snapshot();
    assert_eq!(state.user, None);
    assert_eq!(state.token, None);
    assert!(!state.loading);
    assert_eq!(h.store.load().unwrap(), None);
}

// =============================================================================
// login / register
// =============================================================================

#[tokio::test]
async fn login_then_logout_round_trip() {
    let backend = Backend::default();
    let h = harness(backend.clone(), None).await;

    let outcome = h.session.login("admin@b.com", "pw").await;
    assert!(matches!(outcome, AuthOutcome::Success { route: Route::AdminDashboard, .. }));
    assert_eq!(h.store.load().unwrap().as_deref(), Some("good"));

    h.session.logout().await;

    assert_eq!(h.store.load().unwrap(), None);
    assert_eq!(h.session.snapshot().user, None);
    assert_eq!(h.session.navigator().history(), vec![Route::AdminDashboard, Route::Home]);
    assert_eq!(
        backend.requests(),
        vec![("login", None), ("logout", Some("good".to_owned()))],
        "bearer attached once a token is stored"
    );
    assert_eq!(backend.bodies.lock().unwrap()[0], json!({ "email": "admin@b.com", "password": "pw" }));
}

#[tokio::test]
async fn login_rejection_surfaces_backend_message() {
    let h = harness(Backend::default(), Some("prior")).await;

    let outcome = h.session.login("a@b.com", "nope").await;

    assert_eq!(outcome, AuthOutcome::Failure { error: "bad creds".to_owned() });
    assert_eq!(h.store.load().unwrap(), None);
    assert!(h.session.navigator().history().is_empty());
}

#[tokio::test]
async fn register_sends_default_role() {
    let backend = Backend::default();
    let h = harness(backend.clone(), None).await;

    let outcome = h.session.register("new@b.com", "pw", "Newbie", None).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.user().and_then(|u| u.field("name")), Some("Newbie"));
    assert_eq!(
        backend.bodies.lock().unwrap()[0],
        json!({ "email": "new@b.com", "password": "pw", "name": "Newbie", "role": "user" })
    );
    assert_eq!(h.store.load().unwrap().as_deref(), Some("fresh"));
    assert_eq!(h.session.navigator().last(), Some(Route::Dashboard));
}

#[tokio::test]
async fn register_conflict_surfaces_message() {
    let h = harness(Backend::default(), None).await;

    let outcome = h.session.register("taken@b.com", "pw", "Dup", Some("user")).await;

    assert_eq!(outcome.error(), Some("email taken"));
}

// =============================================================================
// logout
// =============================================================================

#[tokio::test]
async fn logout_failure_still_clears_and_goes_home() {
    let backend = Backend { fail_logout: true, ..Backend::default() };
    let h = harness(backend.clone(), Some("good")).await;
    h.session.initialize().await;
    assert!(h.session.is_authenticated());

    h.session.logout().await;

    assert!(!h.session.is_authenticated());
    assert_eq!(h.store.load().unwrap(), None);
    assert_eq!(h.session.navigator().last(), Some(Route::Home));
    assert_eq!(backend.requests().last(), Some(&("logout", Some("good".to_owned()))));
}

#[tokio::test]
async fn unreachable_backend_is_a_failure_outcome() {
    let dir = tempfile::tempdir().unwrap();
    // Port 9 (discard) on loopback is not expected to accept HTTP.
    let mut config = SessionConfig::with_api_url("http://127.0.0.1:9/api").unwrap();
    config.token_path = dir.path().join("token.json");
    let session = authsession::connect(config, RecordingNavigator::new()).unwrap();

    let outcome = session.login("a@b.com", "pw").await;

    assert!(!outcome.is_success());
    assert!(outcome.error().is_some_and(|e| e.starts_with("request failed")));
}
