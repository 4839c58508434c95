//! HTTP routes through the router, without a socket

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use kubeship::server::serve::router;
use kubeship::server::state::ServerState;

use crate::fakes::{app_state, user, FakeBuilder, FakeCluster, FakeGit, GOOD_CODE};

struct Harness {
    router: Router,
    state: Arc<ServerState>,
    builder: Arc<FakeBuilder>,
    cluster: Arc<FakeCluster>,
    _work: tempfile::TempDir,
}

impl Harness {
    fn new(git: FakeGit, cluster_enabled: bool) -> Self {
        let work = tempfile::tempdir().unwrap();
        let builder = Arc::new(FakeBuilder::default());
        let cluster = Arc::new(FakeCluster::default());
        let app = app_state(
            work.path(),
            Arc::new(git),
            builder.clone(),
            cluster_enabled.then(|| cluster.clone()),
        );
        let state = Arc::new(ServerState::from(app));

        Self {
            router: router(state.clone()),
            state,
            builder,
            cluster,
            _work: work,
        }
    }

    async fn login(&self) -> String {
        let id = self
            .state
            .sessions
            .create(SecretString::from("gho_test".to_string()), user())
            .await;
        format!("kubeship_session={}", id)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn deploy_request(cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/deploy")
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete_request(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let harness = Harness::new(FakeGit::default(), true);
    let (status, body) = harness.send(get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], "0.0.0-test");
    assert_eq!(body["cluster_configured"], true);
}

#[tokio::test]
async fn test_api_requires_session() {
    let harness = Harness::new(FakeGit::default(), true);

    for uri in ["/api/repos", "/api/deployments", "/api/deployment/web"] {
        let (status, body) = harness.send(get(uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "Not authenticated");
    }

    let (status, _) = harness
        .send(get("/api/deployments", Some("kubeship_session=forged")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_flow() {
    let harness = Harness::new(FakeGit::default(), true);

    let response = harness.router.clone().oneshot(get("/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://github.example/login/oauth/authorize"));

    let uri = format!("/callback?code={}", GOOD_CODE);
    let response = harness.router.clone().oneshot(get(&uri, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let (status, body) = harness.send(get("/", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["login"], "alice");

    let (status, body) = harness.send(get("/api/repos", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["repos"][0]["full_name"], "alice/my-site");

    let response = harness
        .router
        .clone()
        .oneshot(get("/logout", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let (_, body) = harness.send(get("/", Some(&cookie))).await;
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn test_callback_errors() {
    let harness = Harness::new(FakeGit::default(), true);

    let (status, body) = harness.send(get("/callback", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No authorization code received");

    let (status, body) = harness.send(get("/callback?code=stale", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Failed to get access token");
    assert_eq!(harness.state.sessions.len().await, 0);
}

#[tokio::test]
async fn test_deploy_requires_url_and_name() {
    let harness = Harness::new(FakeGit::default(), true);
    let cookie = harness.login().await;

    let (status, body) = harness
        .send(deploy_request(&cookie, json!({ "repo_url": "https://github.com/alice/x.git" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Repository URL and name required");
    assert!(harness.builder.calls().is_empty());
}

#[tokio::test]
async fn test_deploy_and_manage() {
    let harness = Harness::new(FakeGit::with_files(&[("index.html", "")]), true);
    let cookie = harness.login().await;

    let (status, body) = harness
        .send(deploy_request(
            &cookie,
            json!({ "repo_url": "https://github.com/alice/my-site.git", "repo_name": "My Site" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["image"], "alice/my-site:latest");
    assert_eq!(body["deployment"], "my-site");
    assert_eq!(body["port"], 80);

    let (status, body) = harness.send(get("/api/deployments", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deployments"][0]["name"], "my-site");
    assert_eq!(body["deployments"][0]["replicas"], 2);

    let (status, body) = harness
        .send(get("/api/deployment/my-site", Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["port"], 80);

    let (status, body) = harness
        .send(delete_request("/api/deployment/my-site", &cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Deleted deployment and service: my-site and cleaned up Docker image"
    );
    assert_eq!(harness.cluster.deployment_count(), 0);

    let (status, _) = harness
        .send(get("/api/deployment/my-site", Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deploy_failure_reports_stage() {
    let harness = Harness::new(FakeGit::with_files(&[("index.html", "")]), true);
    harness.builder.fail_build.store(true, Ordering::SeqCst);
    let cookie = harness.login().await;

    let (status, body) = harness
        .send(deploy_request(&cookie, json!({ "repo_url": "u", "repo_name": "site" })))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["stage"], "docker_build");
    assert!(body["error"].as_str().unwrap().contains("step 3/5 failed"));
}

#[tokio::test]
async fn test_disabled_cluster_is_unavailable() {
    let harness = Harness::new(FakeGit::default(), false);
    let cookie = harness.login().await;

    let (_, body) = harness.send(get("/health", None)).await;
    assert_eq!(body["cluster_configured"], false);

    let (status, body) = harness.send(get("/api/deployments", Some(&cookie))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Kubernetes is not configured");

    let (status, _) = harness
        .send(delete_request("/api/deployment/web", &cookie))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_deploy_without_cluster_is_a_k8s_deploy_failure() {
    let harness = Harness::new(FakeGit::with_files(&[("index.html", "")]), false);
    let cookie = harness.login().await;

    let (status, body) = harness
        .send(deploy_request(&cookie, json!({ "repo_url": "u", "repo_name": "site" })))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["stage"], "k8s_deploy");
    assert_eq!(body["error"], "Kubernetes is not configured");
}

#[tokio::test]
async fn test_deploy_with_unusable_name_is_a_docker_build_failure() {
    let harness = Harness::new(FakeGit::default(), true);
    let cookie = harness.login().await;

    let (status, body) = harness
        .send(deploy_request(&cookie, json!({ "repo_url": "u", "repo_name": "..." })))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["stage"], "docker_build");
    assert!(harness.builder.calls().is_empty());
}
