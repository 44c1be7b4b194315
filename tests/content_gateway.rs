//! HTTP gateway content store against a mock gateway.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use humanwork_engine::config::ContentConfig;
use humanwork_engine::content::{ContentResolver, ContentStore, HttpContentStore};
use humanwork_engine::jobs::NOT_AVAILABLE;
use humanwork_engine::EngineError;

mod common;

fn config_for(addr: std::net::SocketAddr) -> ContentConfig {
    ContentConfig {
        gateway_url: format!("http://{}", addr),
        upload_url: format!("http://{}/upload", addr),
        timeout_secs: 5,
        cache_enabled: true,
    }
}

#[tokio::test]
async fn test_gateway_get() {
    let addr = common::start_programmable_backend(|req| async move {
        if req.method == "GET" && req.path == "/ipfs/bafy-job" {
            (200, r#"{"title":"Mobile app","description":"iOS","budget":3}"#.to_string())
        } else {
            (404, "not found".to_string())
        }
    })
    .await;

    let store = Arc::new(HttpContentStore::new(&config_for(addr), None).unwrap());
    let resolver = ContentResolver::new(store.clone(), false);

    let meta = resolver.resolve("bafy-job").await.unwrap();
    assert_eq!(meta.title, "Mobile app");
    assert_eq!(meta.budget, "3");

    let err = store.get("bafy-other").await.unwrap_err();
    assert!(matches!(err, EngineError::ContentUnavailable { .. }));
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_gateway_error_degrades_to_placeholder() {
    let addr = common::start_programmable_backend(|_| async { (504, "timeout".to_string()) }).await;

    let store = Arc::new(HttpContentStore::new(&config_for(addr), None).unwrap());
    let resolver = ContentResolver::new(store, true);

    assert!(resolver.resolve_or_placeholder(7, "bafy-slow").await.is_none());
    assert_eq!(resolver.cached_entries(), 0);
}

#[tokio::test]
async fn test_gateway_malformed_payload() {
    let addr = common::start_programmable_backend(|_| async { (200, "<html>".to_string()) }).await;

    let store = Arc::new(HttpContentStore::new(&config_for(addr), None).unwrap());
    let resolver = ContentResolver::new(store, false);

    let err = resolver.resolve("bafy-html").await.unwrap_err();
    assert!(matches!(err, EngineError::ContentUnavailable { .. }));
}

#[tokio::test]
async fn test_cache_avoids_second_fetch() {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let addr = common::start_programmable_backend(move |_| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (200, r#"{"title":"Cached"}"#.to_string())
        }
    })
    .await;

    let store = Arc::new(HttpContentStore::new(&config_for(addr), None).unwrap());
    let resolver = ContentResolver::new(store, true);

    let first = resolver.resolve("bafy-cached").await.unwrap();
    let second = resolver.resolve("bafy-cached").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.description, NOT_AVAILABLE);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_upload_sends_token_and_returns_cid() {
    let seen = Arc::new(Mutex::new(None));
    let capture = seen.clone();
    let addr = common::start_programmable_backend(move |req| {
        let capture = capture.clone();
        async move {
            let authorized = req.header("authorization") == Some("Bearer test-token");
            *capture.lock().unwrap() = Some(req);
            if authorized {
                (200, r#"{"cid":"bafy-uploaded"}"#.to_string())
            } else {
                (401, "unauthorized".to_string())
            }
        }
    })
    .await;

    let store = HttpContentStore::new(&config_for(addr), Some("test-token".to_string())).unwrap();
    let cid = store.put("job.json", br#"{"title":"Upload"}"#.to_vec()).await.unwrap();
    assert_eq!(cid, "bafy-uploaded");

    let request = seen.lock().unwrap().clone().unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/upload");
    assert_eq!(request.body, br#"{"title":"Upload"}"#.to_vec());
}

#[tokio::test]
async fn test_upload_rejected() {
    let addr = common::start_programmable_backend(|_| async { (401, "unauthorized".to_string()) }).await;

    let store = HttpContentStore::new(&config_for(addr), Some("wrong".to_string())).unwrap();
    let err = store.put("job.json", b"{}".to_vec()).await.unwrap_err();
    assert!(matches!(err, EngineError::PublishFailed(_)));
}
