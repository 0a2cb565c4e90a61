//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::net::{SocketAddr, TcpListener};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::routing::get;
use mainspring::{Application, BoxError, Bundle, DefaultConfiguration, Environment};

/// An address nothing listens on right now.
pub fn free_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// A listener holding its port, plus the address it occupies.
pub fn occupied_addr() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Write `contents` to a temporary file that lives as long as the handle.
pub fn temp_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// GET `url` until something answers, returning status and body.
pub async fn get_when_ready(url: &str) -> (u16, String) {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    get_when_ready_with(&client, url).await
}

/// Like `get_when_ready`, with a caller-configured client.
pub async fn get_when_ready_with(client: &reqwest::Client, url: &str) -> (u16, String) {
    for _ in 0..100 {
        if let Ok(res) = client.get(url).send().await {
            let status = res.status().as_u16();
            return (status, res.text().await.unwrap());
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("{} never became reachable", url);
}

/// Self-signed certificate and key for `localhost` / `127.0.0.1`.
pub fn tls_fixture() -> (PathBuf, PathBuf) {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    (dir.join("localhost.crt"), dir.join("localhost.key"))
}

/// Shared log of which extension ran, in order.
pub type Journal = Arc<Mutex<Vec<String>>>;

/// Bundle that records itself and optionally fails.
pub struct RecordingBundle {
    pub name: &'static str,
    pub journal: Journal,
    pub fail: bool,
}

impl Bundle<DefaultConfiguration> for RecordingBundle {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, _: &DefaultConfiguration, _: &mut Environment) -> Result<(), BoxError> {
        self.journal.lock().unwrap().push(self.name.to_string());
        if self.fail {
            return Err(format!("{} refused to run", self.name).into());
        }
        Ok(())
    }
}

/// Application registering `GET /hello` and recording its run.
pub struct TestApplication {
    pub journal: Journal,
}

impl Application<DefaultConfiguration> for TestApplication {
    fn name(&self) -> &str {
        "test-app"
    }

    fn run(&self, _: &DefaultConfiguration, environment: &mut Environment) -> Result<(), BoxError> {
        self.journal.lock().unwrap().push("application".to_string());
        environment
            .application()
            .handle("/hello", get(|| async { "hello" }));
        Ok(())
    }
}

/// Panic unless `addr` can be bound again.
pub async fn assert_released(addr: SocketAddr) {
    if let Err(e) = tokio::net::TcpListener::bind(addr).await {
        panic!("{} is still bound: {}", addr, e);
    }
}
