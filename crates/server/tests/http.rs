use cpuwatch_core::{CpuWatchError, ProcessRecord, ProcessStatus, Result, SnapshotProvider};
use cpuwatch_server::{build_router, run_server};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;

// ── Fixtures ──────────────────────────────────────────────────────────────────

struct FixedProvider(Vec<ProcessRecord>);

impl SnapshotProvider for FixedProvider {
    fn current_processes(&self) -> Result<Vec<ProcessRecord>> {
        Ok(self.0.clone())
    }
}

struct BrokenStore;

impl SnapshotProvider for BrokenStore {
    fn current_processes(&self) -> Result<Vec<ProcessRecord>> {
        Err(CpuWatchError::StoreRead {
            path:   PathBuf::from("cpu_usage.json"),
            reason: "truncated".into(),
        })
    }
}

fn record(pid: u32, name: &str, user_avg: f64) -> ProcessRecord {
    ProcessRecord {
        pid,
        name: name.into(),
        status: ProcessStatus::Sleeping,
        user_avg,
        sys_avg: 0.5,
    }
}

struct TestServer {
    addr:     SocketAddr,
    shutdown: watch::Sender<bool>,
    handle:   JoinHandle<std::io::Result<()>>,
    _static:  tempfile::TempDir,
}

async fn start(provider: Arc<dyn SnapshotProvider>) -> TestServer {
    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(static_dir.path().join("stats.html"), "<html>dashboard</html>").unwrap();
    std::fs::write(static_dir.path().join("client.js"), "poll();").unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown, shutdown_rx) = watch::channel(false);
    let app = build_router(provider, static_dir.path());
    let handle = tokio::spawn(run_server(listener, app, shutdown_rx));

    TestServer {
        addr,
        shutdown,
        handle,
        _static: static_dir,
    }
}

struct Reply {
    status: u16,
    headers: String,
    body: String,
}

async fn get(addr: SocketAddr, path: &str) -> Reply {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap();
    Reply {
        status,
        headers: head.to_ascii_lowercase(),
        body: body.to_string(),
    }
}

// ── Routes ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cpu_usage_serves_json_records() {
    let server = start(Arc::new(FixedProvider(vec![
        record(4, "bash", 1.25),
        record(1, "init", 0.5),
    ])))
    .await;

    let reply = get(server.addr, "/cpu_usage").await;

    assert_eq!(reply.status, 200);
    assert!(reply.headers.contains("content-type: application/json"));
    let body: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
    assert_eq!(body[0]["pid"], 4);
    assert_eq!(body[0]["name"], "bash");
    assert_eq!(body[0]["status"], "sleeping");
    assert_eq!(body[0]["user_avg"], 1.25);
    assert_eq!(body[1]["name"], "init");
}

#[tokio::test]
async fn cpu_usage_accepts_trailing_slash() {
    let server = start(Arc::new(FixedProvider(Vec::new()))).await;
    let reply = get(server.addr, "/cpu_usage/").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "[]");
}

#[tokio::test]
async fn broken_store_is_a_server_error() {
    let server = start(Arc::new(BrokenStore)).await;
    let reply = get(server.addr, "/cpu_usage").await;
    assert_eq!(reply.status, 500);
    assert!(reply.body.contains("truncated"));
}

#[tokio::test]
async fn stats_serves_dashboard() {
    let server = start(Arc::new(FixedProvider(Vec::new()))).await;
    let reply = get(server.addr, "/stats").await;
    assert_eq!(reply.status, 200);
    assert!(reply.headers.contains("content-type: text/html"));
    assert_eq!(reply.body, "<html>dashboard</html>");
}

#[tokio::test]
async fn static_scripts_are_served() {
    let server = start(Arc::new(FixedProvider(Vec::new()))).await;
    let reply = get(server.addr, "/static/client.js").await;
    assert_eq!(reply.status, 200);
    assert!(reply.headers.contains("content-type: application/javascript"));
    assert_eq!(reply.body, "poll();");
}

#[tokio::test]
async fn unreadable_asset_is_a_server_error() {
    let server = start(Arc::new(FixedProvider(Vec::new()))).await;
    let reply = get(server.addr, "/static/missing.css").await;
    assert_eq!(reply.status, 500);
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let server = start(Arc::new(FixedProvider(Vec::new()))).await;
    for path in ["/", "/nope", "/favicon.ico", "/static/notes.txt"] {
        assert_eq!(get(server.addr, path).await.status, 404, "{path}");
    }
}

#[tokio::test]
async fn health_reports_tracked_count() {
    let server = start(Arc::new(FixedProvider(vec![record(1, "init", 0.0)]))).await;
    let reply = get(server.addr, "/health").await;
    let body: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tracked"], 1);
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn shutdown_signal_stops_the_server() {
    let server = start(Arc::new(FixedProvider(Vec::new()))).await;
    assert_eq!(get(server.addr, "/cpu_usage").await.status, 200);

    server.shutdown.send(true).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server did not shut down")
        .unwrap();
    assert!(result.is_ok());
}
