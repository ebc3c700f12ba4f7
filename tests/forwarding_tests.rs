// tests/forwarding_tests.rs
use dub::load_balancer::{BackendPool, RoundRobinPool};
use dub::proxy::{Forwarder, HttpForwarder, Proxy};
use dub::server::Frontend;
use hyper::{Body, Client, Request, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

async fn start_frontend(pool: Arc<dyn BackendPool>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let frontend = Frontend {
        name: "test".to_string(),
        bind: addr.to_string(),
        strategy: "roundrobin".to_string(),
        backends: pool,
    };
    let forwarder: Arc<dyn Forwarder> = Arc::new(HttpForwarder::new());
    tokio::spawn(frontend.start_on(listener, forwarder, None));
    addr
}

#[tokio::test]
async fn test_http_forwarder_reaches_backend_with_real_ip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/hello?name=dub")
        .match_header("x-real-ip", "127.0.0.1")
        .match_header("x-custom", "kept")
        .with_status(200)
        .with_header("x-upstream", "yes")
        .with_body("hi")
        .create_async()
        .await;

    let pool = Arc::new(RoundRobinPool::new([("b1", server.host_with_port())]));
    let proxy = Proxy::new("web", pool, Arc::new(HttpForwarder::new()));

    let req = Request::builder()
        .uri("/hello?name=dub")
        .header("host", "lb.local")
        .header("x-custom", "kept")
        .body(Body::empty())
        .unwrap();
    let response = proxy
        .handle(req, "127.0.0.1:40000".parse().unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-upstream"], "yes");
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    assert_eq!(&body[..], b"hi");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_http_forwarder_error_on_unreachable_backend() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let pool = Arc::new(RoundRobinPool::new([("gone", addr.to_string())]));
    let proxy = Proxy::new("web", pool, Arc::new(HttpForwarder::new()));

    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let result = proxy.handle(req, "127.0.0.1:40000".parse().unwrap()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_frontend_proxies_over_tcp() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/echo")
        .match_header("x-real-ip", "127.0.0.1")
        .match_body("ping")
        .with_status(201)
        .with_body("pong")
        .expect(2)
        .create_async()
        .await;

    let pool = Arc::new(RoundRobinPool::new([("b1", server.host_with_port())]));
    let addr = start_frontend(pool).await;

    let client = Client::new();
    for _ in 0..2 {
        let req = Request::builder()
            .method("POST")
            .uri(format!("http://{}/echo", addr))
            .body(Body::from("ping"))
            .unwrap();
        let response = client.request(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"pong");
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_frontend_with_empty_pool_answers_503_and_keeps_serving() {
    let pool: Arc<dyn BackendPool> = Arc::new(RoundRobinPool::empty());
    let addr = start_frontend(pool.clone()).await;
    let client = Client::new();

    for _ in 0..3 {
        let response = client
            .get(format!("http://{}/", addr).parse().unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert!(body.is_empty());
    }

    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("GET", "/").with_status(200).create_async().await;
    pool.add("late", &server.host_with_port());

    let response = client
        .get(format!("http://{}/", addr).parse().unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_forwarding_fault_drops_client_connection() {
    let dead = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let pool = Arc::new(RoundRobinPool::new([("gone", dead.to_string())]));
    let addr = start_frontend(pool).await;
    let client = Client::new();

    // No 502 is synthesized; the frontend keeps accepting afterwards.
    for _ in 0..2 {
        let result = client
            .get(format!("http://{}/", addr).parse().unwrap())
            .await;
        assert!(result.is_err());
    }
}
