//! End-to-end worker scenarios against a scriptable origin.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use sw_cache::{CacheStorage, CacheStore, FsCacheStorage, MemoryCacheStorage};
use sw_core::{FetchRequest, Method, ResponseSnapshot, StatusCode, Url, WorkerConfig, WorkerState};
use sw_fetch::{FetchError, Fetcher, RetryPolicy};
use sw_worker::{
    ClickOutcome, InstallError, ServiceWorker, VersionReply, WorkerError, WorkerHandle,
};

/// An origin that can go offline and change its content.
struct Origin {
    online: AtomicBool,
    content: Mutex<String>,
    broken_path: Mutex<Option<String>>,
    posts: AtomicUsize,
}

impl Origin {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(true),
            content: Mutex::new("v1".into()),
            broken_path: Mutex::new(None),
            posts: AtomicUsize::new(0),
        })
    }

    fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn set_content(&self, content: &str) {
        *self.content.lock().unwrap() = content.into();
    }

    fn break_path(&self, path: &str) {
        *self.broken_path.lock().unwrap() = Some(path.into());
    }
}

#[async_trait]
impl Fetcher for Origin {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, FetchError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(FetchError::Offline);
        }
        if request.method == Method::POST {
            self.posts.fetch_add(1, Ordering::SeqCst);
            return Ok(ResponseSnapshot::ok("sent"));
        }
        let path = request.url.path().to_string();
        if self.broken_path.lock().unwrap().as_deref() == Some(path.as_str()) {
            return Ok(ResponseSnapshot::new(StatusCode::INTERNAL_SERVER_ERROR, "boom"));
        }
        let body = format!("{} {}", self.content.lock().unwrap(), path);
        Ok(ResponseSnapshot::html(body))
    }
}

fn origin_url() -> Url {
    Url::parse("https://hotel.example/").unwrap()
}

fn config() -> WorkerConfig {
    WorkerConfig::for_origin(origin_url()).with_precache(&["/", "/manifest.json"])
}

fn navigate(path: &str) -> FetchRequest {
    FetchRequest::navigate(origin_url().join(path).unwrap())
}

fn get(path: &str) -> FetchRequest {
    FetchRequest::get(origin_url().join(path).unwrap())
}

fn spawn(
    config: WorkerConfig,
    storage: Arc<dyn CacheStorage>,
    origin: Arc<Origin>,
) -> WorkerHandle {
    let worker = ServiceWorker::new(config, storage, origin)
        .unwrap()
        .with_retry_policy(RetryPolicy::none());
    WorkerHandle::spawn(worker)
}

#[tokio::test]
async fn test_precached_root_served_offline() {
    let origin = Origin::new();
    let handle = spawn(config(), Arc::new(MemoryCacheStorage::new()), origin.clone());

    assert_eq!(handle.install().await.unwrap(), 2);
    assert_eq!(handle.worker().state(), WorkerState::Installed);
    assert!(handle.worker().skip_waiting_requested());

    let report = handle.activate().await.unwrap();
    assert!(report.deleted.is_empty());
    assert_eq!(handle.worker().state(), WorkerState::Activated);

    origin.set_online(false);
    let response = handle.fetch(navigate("/")).await.unwrap();
    assert_eq!(response.text(), "v1 /");
    assert!(!response.text().contains("You are offline"));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_stale_page_then_fresh_page() {
    let origin = Origin::new();
    let handle = spawn(config(), Arc::new(MemoryCacheStorage::new()), origin.clone());
    handle.install().await.unwrap();
    handle.activate().await.unwrap();

    let first = handle.fetch(navigate("/rooms")).await.unwrap();
    assert_eq!(first.text(), "v1 /rooms");

    origin.set_content("v2");
    let stale = handle.fetch(navigate("/rooms")).await.unwrap();
    assert_eq!(stale.text(), "v1 /rooms");

    handle.worker().tasks().drain().await;
    let fresh = handle.fetch(navigate("/rooms")).await.unwrap();
    assert_eq!(fresh.text(), "v2 /rooms");

    let metrics = handle.worker().metrics().snapshot();
    assert_eq!(metrics.misses, 1);
    assert_eq!(metrics.hits, 2);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_offline_navigation_without_cache_gets_offline_page() {
    let origin = Origin::new();
    let storage = Arc::new(MemoryCacheStorage::new());
    let handle = spawn(config().with_precache(&[]), storage, origin.clone());
    handle.install().await.unwrap();
    handle.activate().await.unwrap();

    origin.set_online(false);
    let response = handle.fetch(navigate("/dining")).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.content_type().unwrap().starts_with("text/html"));
    assert!(response.text().contains("You are offline"));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_offline_asset_failure_propagates() {
    let origin = Origin::new();
    let handle = spawn(config(), Arc::new(MemoryCacheStorage::new()), origin.clone());
    handle.install().await.unwrap();
    handle.activate().await.unwrap();

    origin.set_online(false);
    let err = handle.fetch(get("/images/pool.jpg")).await.unwrap_err();
    assert!(matches!(err, WorkerError::Fetch(FetchError::Offline)));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_fetch_before_activation_is_not_cached() {
    let origin = Origin::new();
    let storage = Arc::new(MemoryCacheStorage::new());
    let handle = spawn(config(), storage.clone(), origin.clone());

    let response = handle.fetch(get("/images/pool.jpg")).await.unwrap();
    assert_eq!(response.text(), "v1 /images/pool.jpg");
    assert!(storage.keys().await.unwrap().is_empty());

    handle.shutdown().await;
}

#[tokio::test]
async fn test_failed_install_writes_nothing() {
    let origin = Origin::new();
    origin.break_path("/manifest.json");
    let storage = Arc::new(MemoryCacheStorage::new());
    let handle = spawn(config(), storage.clone(), origin.clone());

    let err = handle.install().await.unwrap_err();
    assert!(matches!(
        err,
        WorkerError::Install(InstallError::BadStatus { .. })
    ));
    assert_eq!(handle.worker().state(), WorkerState::Redundant);
    assert!(storage.keys().await.unwrap().is_empty());

    let err = handle.activate().await.unwrap_err();
    assert!(matches!(
        err,
        WorkerError::InvalidState {
            state: WorkerState::Redundant,
            ..
        }
    ));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_version_bump_sweeps_old_generation() {
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::new();

    {
        let storage = Arc::new(FsCacheStorage::new(dir.path()));
        let handle = spawn(config(), storage, origin.clone());
        handle.install().await.unwrap();
        handle.activate().await.unwrap();
        handle.fetch(get("/api/rooms")).await.unwrap();
        handle.shutdown().await;
    }

    let storage = Arc::new(FsCacheStorage::new(dir.path()));
    assert_eq!(storage.keys().await.unwrap(), ["dynamic-v1", "static-v1"]);

    let handle = spawn(config().with_version("v2"), storage.clone(), origin.clone());
    handle.install().await.unwrap();
    let mut report = handle.activate().await.unwrap();
    report.deleted.sort();
    assert_eq!(report.deleted, ["dynamic-v1", "static-v1"]);
    assert_eq!(storage.keys().await.unwrap(), ["static-v2"]);

    let store = storage.open("static-v2").await.unwrap();
    assert_eq!(store.entries().await.unwrap().len(), 2);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_client_messages() {
    let origin = Origin::new();
    let handle = spawn(config(), Arc::new(MemoryCacheStorage::new()), origin);

    let reply = handle
        .post_message(json!({"type": "GET_VERSION"}))
        .await
        .unwrap()
        .expect("version reply");
    let reply: VersionReply = serde_json::from_value(reply).unwrap();
    assert_eq!(reply.version, "static-v1");

    assert!(!handle.worker().skip_waiting_requested());
    let reply = handle
        .post_message(json!({"type": "SKIP_WAITING"}))
        .await
        .unwrap();
    assert_eq!(reply, None);
    assert!(handle.worker().skip_waiting_requested());

    let reply = handle
        .post_message(json!({"type": "CLEAR_EVERYTHING"}))
        .await
        .unwrap();
    assert_eq!(reply, None);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_activation_claims_clients() {
    let origin = Origin::new();
    let handle = spawn(config(), Arc::new(MemoryCacheStorage::new()), origin);
    let page = handle.worker().clients().register(origin_url());
    assert!(!handle.worker().clients().is_controlled(page));

    handle.install().await.unwrap();
    let report = handle.activate().await.unwrap();
    assert_eq!(report.claimed, 1);
    assert!(handle.worker().clients().is_controlled(page));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_skip_waiting_activates_installed_worker() {
    let origin = Origin::new();
    let storage = Arc::new(MemoryCacheStorage::new());
    storage.open("static-v0").await.unwrap();
    let handle = spawn(config(), storage.clone(), origin);
    let page = handle.worker().clients().register(origin_url());

    handle.install().await.unwrap();
    assert_eq!(handle.worker().state(), WorkerState::Installed);

    let reply = handle
        .post_message(json!({"type": "SKIP_WAITING"}))
        .await
        .unwrap();
    assert_eq!(reply, None);
    assert_eq!(handle.worker().state(), WorkerState::Activated);
    assert!(handle.worker().clients().is_controlled(page));
    assert!(!storage.has("static-v0").await.unwrap());

    // Already active: the message changes nothing.
    handle
        .post_message(json!({"type": "SKIP_WAITING"}))
        .await
        .unwrap();
    assert_eq!(handle.worker().state(), WorkerState::Activated);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_sync_replays_deferred_submissions() {
    let origin = Origin::new();
    let handle = spawn(config(), Arc::new(MemoryCacheStorage::new()), origin.clone());
    let outbox = handle.worker().outbox().clone();

    let booking = FetchRequest::new(
        Method::POST,
        Url::parse("https://api.emailjs.com/api/v1.0/email/send").unwrap(),
    )
    .with_body(r#"{"template":"booking"}"#);
    outbox.enqueue("booking-inquiry", booking);

    origin.set_online(false);
    let err = handle.sync("booking-inquiry").await.unwrap_err();
    assert!(matches!(err, WorkerError::SyncFailed { failed: 1, .. }));
    let pending = outbox.take("booking-inquiry");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].attempts, 1);
    outbox.requeue(pending);

    origin.set_online(true);
    let report = handle.sync("booking-inquiry").await.unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 0);
    assert!(outbox.is_empty());
    assert_eq!(origin.posts.load(Ordering::SeqCst), 1);

    let report = handle.sync("contact-form").await.unwrap();
    assert_eq!(report.delivered, 0);
    let report = handle.sync("unregistered").await.unwrap();
    assert_eq!(report.delivered, 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_push_and_notification_click() {
    let origin = Origin::new();
    let handle = spawn(config(), Arc::new(MemoryCacheStorage::new()), origin);

    let payload = handle.push(Some(b"anything".to_vec())).await.unwrap();
    assert_eq!(payload, handle.push(None).await.unwrap());
    assert_eq!(payload.actions[0].action, "view");

    assert_eq!(
        handle
            .notification_click(Some("view".into()))
            .await
            .unwrap(),
        ClickOutcome::OpenWindow(origin_url())
    );
    assert_eq!(
        handle.notification_click(None).await.unwrap(),
        ClickOutcome::Close
    );

    handle.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_fetches() {
    let origin = Origin::new();
    let handle = Arc::new(spawn(
        config(),
        Arc::new(MemoryCacheStorage::new()),
        origin,
    ));
    handle.install().await.unwrap();
    handle.activate().await.unwrap();

    let requests = (0..16).map(|i| {
        let handle = handle.clone();
        async move { handle.fetch(get(&format!("/api/rooms/{i}"))).await }
    });
    let responses = futures::future::join_all(requests).await;
    assert!(responses.iter().all(|r| r.is_ok()));
    assert_eq!(handle.worker().metrics().snapshot().misses, 16);

    if let Ok(handle) = Arc::try_unwrap(handle) {
        handle.shutdown().await;
    }
}

#[tokio::test]
async fn test_resume_installed_generation() {
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::new();

    let fresh = ServiceWorker::new(
        config(),
        Arc::new(FsCacheStorage::new(dir.path())),
        origin.clone(),
    )
    .unwrap();
    assert!(!fresh.resume().await.unwrap());
    assert_eq!(fresh.state(), WorkerState::Parsed);

    fresh.install().await.unwrap();
    fresh.activate().await.unwrap();

    let restarted = ServiceWorker::new(
        config(),
        Arc::new(FsCacheStorage::new(dir.path())),
        origin.clone(),
    )
    .unwrap();
    assert!(restarted.resume().await.unwrap());
    assert_eq!(restarted.state(), WorkerState::Activated);

    origin.set_online(false);
    let response = restarted.fetch(get("/manifest.json")).await.unwrap();
    assert_eq!(response.text(), "v1 /manifest.json");
    restarted.tasks().drain().await;
}
