//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use statuswatch::notification::{AlertDispatcher, NotificationError, Notifier};
use statuswatch::http_probe::prelude::*;
use statuswatch::store::{LogEntry, ResultStore, SqliteResultStore, StoreError};
use statuswatch::{EndpointRegistry, MonitorEngine};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves `/ok` (200), `/error` (500), `/slow` (never answers in time) and 404 otherwise.
pub async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service_fn(route))
                    .await;
            });
        }
    });

    addr
}

/// Answers every connection with bytes that are not an HTTP response.
pub async fn spawn_garbage_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0u8; 1024];
                let _ = stream.read(&mut request).await;
                let _ = stream.write_all(b"SSH-2.0-OpenSSH_9.6\r\n\r\n").await;
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}

async fn route(req: Request<Incoming>) -> Result<Response<String>, Infallible> {
    let status = match req.uri().path() {
        "/ok" => StatusCode::OK,
        "/error" => StatusCode::INTERNAL_SERVER_ERROR,
        "/slow" => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            StatusCode::OK
        }
        _ => StatusCode::NOT_FOUND,
    };
    Ok(Response::builder()
        .status(status)
        .body(String::new())
        .unwrap())
}

/// A prober that ignores proxy settings from the environment.
pub fn prober(timeout: Duration) -> HttpProber {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    HttpProber::with_client(client, timeout)
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}

/// An address nothing listens on.
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Records every alert it is asked to show.
#[derive(Default)]
pub struct RecordingNotifier {
    pub shown: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.shown.lock().unwrap().len()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn show(
        &self,
        title: &str,
        body: &str,
        _duration: Duration,
    ) -> Result<(), NotificationError> {
        self.shown
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

/// A store whose writes always fail.
pub struct BrokenStore;

#[async_trait]
impl ResultStore for BrokenStore {
    async fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn append(&self, result: &ProbeResult) -> Result<i64, StoreError> {
        Err(StoreError::Append {
            url: result.url.clone(),
            source: sqlx::Error::PoolClosed,
        })
    }

    async fn recent(&self, _limit: u32) -> Result<Vec<LogEntry>, StoreError> {
        Ok(Vec::new())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(0)
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub engine: Arc<MonitorEngine>,
    pub store: Arc<SqliteResultStore>,
    pub alerts: Arc<RecordingNotifier>,
}

/// An engine over a fresh registry file and SQLite log inside a temporary directory.
pub async fn fixture(urls: &[String], timeout: Duration) -> Fixture {
    let dir = TempDir::new().unwrap();
    let registry = Arc::new(EndpointRegistry::new(dir.path().join("urls.txt")));
    for url in urls {
        registry.add(url).unwrap();
    }

    let database_url = format!("sqlite://{}", dir.path().join("status_log.db").display());
    let store = Arc::new(SqliteResultStore::open(&database_url).await.unwrap());
    let alerts = Arc::new(RecordingNotifier::default());
    let dispatcher = AlertDispatcher::new(
        alerts.clone(),
        alerts.clone(),
        Duration::from_secs(1),
    );

    let engine = Arc::new(MonitorEngine::new(
        registry,
        prober(timeout),
        store.clone(),
        dispatcher,
    ));

    Fixture {
        dir,
        engine,
        store,
        alerts,
    }
}
