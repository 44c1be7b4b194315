//! Shared utilities for integration tests.

#![allow(dead_code)]

use alloy::primitives::{Address, U256};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use humanwork_engine::config::EngineConfig;
use humanwork_engine::content::InMemoryContentStore;
use humanwork_engine::jobs::{JobMetadata, ProjectRecord, ProjectStatus};
use humanwork_engine::ledger::InMemoryLedger;
use humanwork_engine::Marketplace;

pub const CHAIN_ID: u64 = 296;

pub fn escrow() -> Address {
    Address::repeat_byte(0xee)
}

pub fn alice() -> Address {
    Address::repeat_byte(0x0a)
}

pub fn bob() -> Address {
    Address::repeat_byte(0x0b)
}

pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.ledger.chain_id = CHAIN_ID;
    config.ledger.escrow_address = escrow().to_string();
    config.sync.max_concurrent_fetches = 4;
    config
}

/// Marketplace over an in-memory ledger (which also signs) and store.
pub struct Fixture {
    pub ledger: Arc<InMemoryLedger>,
    pub store: Arc<InMemoryContentStore>,
    pub marketplace: Marketplace,
}

impl Fixture {
    pub fn new() -> Self {
        let ledger = Arc::new(InMemoryLedger::new(CHAIN_ID, escrow()));
        let store = Arc::new(InMemoryContentStore::new());
        let marketplace =
            Marketplace::new(ledger.clone(), store.clone(), ledger.clone(), &test_config())
                .unwrap();
        Self {
            ledger,
            store,
            marketplace,
        }
    }

    /// Seed a record whose metadata is stored under `bafy<id-hint>`.
    pub fn seed_job(&self, client: Address, status: ProjectStatus, title: &str) -> u64 {
        let cid = format!("bafy-{}", title.to_lowercase().replace(' ', "-"));
        let metadata = JobMetadata {
            title: title.to_string(),
            description: format!("{} in detail", title),
            budget: "1.5".to_string(),
            ..JobMetadata::default()
        };
        self.store
            .insert_raw(&cid, serde_json::to_vec(&metadata).unwrap());
        self.seed_record(client, status, &cid)
    }

    /// Seed a record without publishing any metadata for it.
    pub fn seed_record(&self, client: Address, status: ProjectStatus, cid: &str) -> u64 {
        self.ledger.seed(ProjectRecord {
            project_id: 0,
            client,
            freelancer: Address::ZERO,
            amount: U256::from(1_500_000_000_000_000_000u64),
            description_cid: cid.to_string(),
            deliverable_cid: String::new(),
            status,
            created_at: 1_700_000_000,
            deadline: 1_800_000_000,
        })
    }
}

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MockRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Start a programmable mock backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            401 => "401 Unauthorized",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            504 => "504 Gateway Timeout",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(MockRequest {
        method,
        path,
        headers,
        body: buf[header_end..].to_vec(),
    })
}
