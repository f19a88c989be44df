mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode;
use tcp_balancer::admin::handlers::{BackendResponse, CooldownResponse, ListResponse, SystemStatus};
use tcp_balancer::config::BalancerConfig;
use tcp_balancer::load_balancer::Registry;
use tcp_balancer::BalancerServer;
use tokio::net::TcpListener;

use common::{dead_address, start_mock_backend};

struct Admin {
    base: String,
    registry: Arc<Registry>,
    client: reqwest::Client,
}

impl Admin {
    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .unwrap()
    }
}

async fn start_admin(api_key: Option<&str>) -> Admin {
    let mut config = BalancerConfig::default();
    config.health_check.timeout_ms = 500;
    config.health_check.cooldown_secs = 3600;
    config.admin.api_key = api_key.map(str::to_string);

    let server = BalancerServer::new(config);
    let registry = server.registry();
    let router = server.admin_router();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Admin {
        base: format!("http://{}", addr),
        registry,
        client: reqwest::Client::new(),
    }
}

#[tokio::test]
async fn test_root_answers_ok() {
    let admin = start_admin(None).await;
    let res = admin.get("/").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_add_list_remove() {
    let admin = start_admin(None).await;
    let a = start_mock_backend("a").await;
    let b = start_mock_backend("b").await;

    for backend in [&a, &b] {
        let res = admin.get(&format!("/add?identity={}", backend.identity())).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: BackendResponse = res.json().await.unwrap();
        assert!(body.success);
        assert_eq!(body.identity, backend.identity());
    }

    let list: ListResponse = admin.get("/list").await.json().await.unwrap();
    assert_eq!(list.count, 2);
    assert_eq!(list.backends, format!("{},{}", a.identity(), b.identity()));

    let res = admin.get(&format!("/remove?identity={}", a.identity())).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(admin.registry.identities(), vec![b.identity()]);

    let res = admin.get(&format!("/remove?identity={}", a.identity())).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: BackendResponse = res.json().await.unwrap();
    assert!(!body.success);
}

#[tokio::test]
async fn test_legacy_ip_parameter_accepted() {
    let admin = start_admin(None).await;
    let a = start_mock_backend("a").await;

    let res = admin.get(&format!("/add?ip={}", a.identity())).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(admin.registry.contains(&a.identity()));
}

#[tokio::test]
async fn test_add_rejects_duplicate_and_unhealthy() {
    let admin = start_admin(None).await;
    let a = start_mock_backend("a").await;
    let sick = start_mock_backend("sick").await;
    sick.set_healthy(false);
    let dead = dead_address().await;

    admin.get(&format!("/add?identity={}", a.identity())).await;
    let res = admin.get(&format!("/add?identity={}", a.identity())).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = admin.get(&format!("/add?identity={}", sick.identity())).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: BackendResponse = res.json().await.unwrap();
    assert!(!body.success);
    assert!(body.reason.is_some());

    let res = admin.get(&format!("/add?identity={}", dead)).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(admin.registry.identities(), vec![a.identity()]);
}

#[tokio::test]
async fn test_cooldown_and_status() {
    let admin = start_admin(None).await;

    let status: SystemStatus = admin.get("/status").await.json().await.unwrap();
    assert_eq!(status.cooldown_secs, 3600);
    assert!(!status.health_check_running);

    let res = admin.get("/cooldown?seconds=0").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = admin.get("/cooldown?seconds=12").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: CooldownResponse = res.json().await.unwrap();
    assert!(body.success);
    assert_eq!(body.seconds, 12);

    let status: SystemStatus = admin.get("/status").await.json().await.unwrap();
    assert_eq!(status.cooldown_secs, 12);
    assert!(status.health_check_running);
    assert_eq!(status.backends, 0);
}

#[tokio::test]
async fn test_malformed_query_answers_json() {
    let admin = start_admin(None).await;

    for path in ["/cooldown?seconds=abc", "/cooldown?seconds=-1", "/cooldown"] {
        let res = admin.get(path).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", path);
        let body: CooldownResponse = res.json().await.unwrap();
        assert!(!body.success);
        assert!(body.reason.is_some());
    }

    for path in ["/add", "/remove"] {
        let res = admin.get(path).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", path);
        let body: BackendResponse = res.json().await.unwrap();
        assert!(!body.success);
        assert!(body.reason.is_some());
    }
}

#[tokio::test]
async fn test_oversized_cooldown_rejected() {
    let admin = start_admin(None).await;

    let res = admin.get(&format!("/cooldown?seconds={}", u64::MAX)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let status: SystemStatus = admin.get("/status").await.json().await.unwrap();
    assert_eq!(status.cooldown_secs, 3600);
    assert!(!status.health_check_running);
}

#[tokio::test]
async fn test_api_key_required_when_configured() {
    let admin = start_admin(Some("secret")).await;

    assert_eq!(admin.get("/").await.status(), StatusCode::OK);
    assert_eq!(admin.get("/list").await.status(), StatusCode::UNAUTHORIZED);

    let res = admin
        .client
        .get(format!("{}/list", admin.base))
        .header("Authorization", "Bearer wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = admin
        .client
        .get(format!("{}/list", admin.base))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let list: ListResponse = res.json().await.unwrap();
    assert_eq!(list.count, 0);
}
