// tests/server_tests.rs
use async_trait::async_trait;
use dub::load_balancer::RoundRobinPool;
use dub::proxy::{Forwarder, HttpForwarder};
use dub::server::{Accept, Frontend};
use hyper::{Client, StatusCode};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// Wraps a real listener and fails the next `errors` accepts.
struct FailingListener {
    inner: TcpListener,
    errors: Vec<io::Error>,
    failed: Arc<AtomicUsize>,
}

#[async_trait]
impl Accept for FailingListener {
    type Stream = TcpStream;

    async fn accept(&mut self) -> io::Result<(TcpStream, SocketAddr)> {
        if let Some(err) = self.errors.pop() {
            self.failed.fetch_add(1, Ordering::SeqCst);
            return Err(err);
        }
        self.inner.accept().await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

async fn failing_frontend(
    errors: Vec<io::Error>,
) -> (SocketAddr, Arc<AtomicUsize>, tokio::task::JoinHandle<anyhow::Result<()>>) {
    let inner = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = inner.local_addr().unwrap();
    let failed = Arc::new(AtomicUsize::new(0));
    let listener = FailingListener {
        inner,
        errors,
        failed: failed.clone(),
    };

    let frontend = Frontend {
        name: "flaky".to_string(),
        bind: addr.to_string(),
        strategy: "roundrobin".to_string(),
        backends: Arc::new(RoundRobinPool::empty()),
    };
    let forwarder: Arc<dyn Forwarder> = Arc::new(HttpForwarder::new());
    let task = tokio::spawn(frontend.start_on(listener, forwarder, None));
    (addr, failed, task)
}

#[tokio::test]
async fn test_frontend_survives_accept_errors() {
    let errors = vec![
        io::Error::new(io::ErrorKind::Other, "Too many open files"),
        io::Error::from(io::ErrorKind::ConnectionAborted),
        io::Error::new(io::ErrorKind::Other, "Too many open files in system"),
    ];
    let (addr, failed, task) = failing_frontend(errors).await;

    let response = Client::new()
        .get(format!("http://{}/", addr).parse().unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(failed.load(Ordering::SeqCst), 3);
    assert!(!task.is_finished());
    task.abort();
}

#[tokio::test]
async fn test_unusable_listener_stops_frontend() {
    let errors = vec![io::Error::from(io::ErrorKind::InvalidInput)];
    let (_, failed, task) = failing_frontend(errors).await;

    let result = task.await.unwrap();
    assert!(result.is_err());
    assert_eq!(failed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_frontend_start_binds_host_name() {
    let frontend = Frontend {
        name: "named".to_string(),
        bind: "localhost:0".to_string(),
        strategy: "roundrobin".to_string(),
        backends: Arc::new(RoundRobinPool::empty()),
    };
    let forwarder: Arc<dyn Forwarder> = Arc::new(HttpForwarder::new());
    let task = tokio::spawn(frontend.start(forwarder, None));

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    // Still running means the host name resolved and bound.
    assert!(!task.is_finished());
    task.abort();
}
