//! Integration tests for the HTTP API.
//!
//! Each test spins up the full router on a random port backed by an
//! in-memory libSQL store and the real parser, then drives it with reqwest.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use uuid::Uuid;

use gobbler::api::{self, AppState};
use gobbler::config::{RunnerConfig, ServerConfig};
use gobbler::error::DatabaseError;
use gobbler::parser::{BbrzParser, Record};
use gobbler::processor::{Registry, WorkerDeps};
use gobbler::store::{LibSqlBackend, ReplayStore};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

struct TestServer {
    base: String,
    registry: Arc<Registry>,
    _data_dir: tempfile::TempDir,
}

/// In-memory libSQL store whose saves wait until the test opens the gate.
struct GatedStore {
    inner: LibSqlBackend,
    gate: Semaphore,
}

#[async_trait]
impl ReplayStore for GatedStore {
    async fn save_replay(&self, record: &Record) -> Result<(), DatabaseError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;
        self.inner.save_replay(record).await
    }

    async fn list_replays(&self) -> Result<Vec<Record>, DatabaseError> {
        self.inner.list_replays().await
    }

    async fn get_replay(&self, id: Uuid) -> Result<Option<Record>, DatabaseError> {
        self.inner.get_replay(id).await
    }
}

/// Start the app on a random port.
async fn start_server(max_upload_bytes: usize) -> TestServer {
    let store: Arc<dyn ReplayStore> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    start_server_with(max_upload_bytes, 4, store).await
}

async fn start_server_with(
    max_upload_bytes: usize,
    max_concurrent_workers: usize,
    store: Arc<dyn ReplayStore>,
) -> TestServer {
    let data_dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(Registry::new(
        RunnerConfig {
            task_interval: Duration::from_millis(50),
            max_concurrent_workers,
        },
        WorkerDeps {
            parser: Arc::new(BbrzParser::new()),
            store: Arc::clone(&store),
            data_dir: data_dir.path().to_path_buf(),
        },
    ));

    let config = ServerConfig {
        data_dir: data_dir.path().to_path_buf(),
        max_upload_bytes,
        ..ServerConfig::default()
    };
    let app = api::router(
        AppState {
            registry: Arc::clone(&registry),
            store,
            data_dir: data_dir.path().to_path_buf(),
        },
        &config,
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        base: format!("http://127.0.0.1:{port}"),
        registry,
        _data_dir: data_dir,
    }
}

fn replay_form(filename: &str, bytes: Vec<u8>) -> Form {
    Form::new().part("replay", Part::bytes(bytes).file_name(filename.to_string()))
}

async fn upload(client: &reqwest::Client, base: &str, form: Form) -> (u16, Value) {
    let resp = client
        .post(format!("{base}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

/// Poll a task until it reaches a terminal status.
async fn wait_for_task(client: &reqwest::Client, base: &str, task_id: &str) -> Value {
    loop {
        let task: Value = client
            .get(format!("{base}/api/tasks/{task_id}"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if task["status"] == "ok" || task["status"] == "failed" {
            return task;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn health_check() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1024 * 1024).await;
        let body: Value = reqwest::get(format!("{}/health", server.base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn upload_is_processed_and_stored() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1024 * 1024).await;
        let client = reqwest::Client::new();

        let archive = common::match_archive("Reavers", "Gutters");
        let (status, body) = upload(&client, &server.base, replay_form("cup.bbrz", archive)).await;
        assert_eq!(status, 202);
        assert_eq!(body["status"], "waiting");
        let task_id = body["task_id"].as_str().unwrap().to_string();

        let task = wait_for_task(&client, &server.base, &task_id).await;
        assert_eq!(task["status"], "ok", "task: {task}");
        assert_eq!(task["filename"], body["filename"]);
        assert!(task["filename"].as_str().unwrap().ends_with("-cup.bbrz"));
        assert!(task.get("error").is_none());

        let replays: Value = client
            .get(format!("{}/api/replays", server.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let replays = replays.as_array().unwrap();
        assert_eq!(replays.len(), 1);
        assert_eq!(replays[0]["home"]["name"], "Reavers");
        assert_eq!(replays[0]["home"]["race"], "Human");
        assert_eq!(replays[0]["home"]["mvp"], "Griff");
        assert_eq!(replays[0]["away"]["name"], "Gutters");

        let replay_id = replays[0]["id"].as_str().unwrap();
        let resp = client
            .get(format!("{}/api/replays/{replay_id}", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let replay: Value = resp.json().await.unwrap();
        assert_eq!(replay["away"]["coach_name"], "bob");
        assert_eq!(replay["home"]["players"][0]["type"], "7");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn same_match_uploaded_twice_fails_second_time() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1024 * 1024).await;
        let client = reqwest::Client::new();
        let archive = common::match_archive("Reavers", "Gutters");

        let (_, first) =
            upload(&client, &server.base, replay_form("first.bbrz", archive.clone())).await;
        let first = wait_for_task(&client, &server.base, first["task_id"].as_str().unwrap()).await;
        assert_eq!(first["status"], "ok");

        let (_, second) = upload(&client, &server.base, replay_form("second.bbrz", archive)).await;
        let second =
            wait_for_task(&client, &server.base, second["task_id"].as_str().unwrap()).await;
        assert_eq!(second["status"], "failed");
        assert!(
            second["error"].as_str().unwrap().contains("Constraint violation"),
            "task: {second}"
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn uploads_sharing_a_name_keep_their_own_content() {
    timeout(TEST_TIMEOUT, async {
        let store = Arc::new(GatedStore {
            inner: LibSqlBackend::new_memory().await.unwrap(),
            gate: Semaphore::new(0),
        });
        let server = start_server_with(1024 * 1024, 1, store.clone()).await;
        let client = reqwest::Client::new();

        // Occupies the only worker so the next two uploads stay queued.
        let (_, blocker) = upload(
            &client,
            &server.base,
            replay_form("blocker.bbrz", common::match_archive("Blockers", "Visitors")),
        )
        .await;
        let (_, first) = upload(
            &client,
            &server.base,
            replay_form("match.bbrz", common::match_archive("Reavers", "Gutters")),
        )
        .await;
        let (_, second) = upload(
            &client,
            &server.base,
            replay_form("match.bbrz", common::match_archive("Ironjaws", "Stunties")),
        )
        .await;
        assert_ne!(first["filename"], second["filename"]);

        store.gate.add_permits(3);
        for body in [&blocker, &first, &second] {
            let task =
                wait_for_task(&client, &server.base, body["task_id"].as_str().unwrap()).await;
            assert_eq!(task["status"], "ok", "task: {task}");
        }

        let mut homes: Vec<String> = store
            .list_replays()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.home.name)
            .collect();
        homes.sort();
        assert_eq!(homes, ["Blockers", "Ironjaws", "Reavers"]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn corrupt_upload_is_accepted_then_fails() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1024 * 1024).await;
        let client = reqwest::Client::new();

        let (status, body) = upload(
            &client,
            &server.base,
            replay_form("broken.bbrz", b"not a zip".to_vec()),
        )
        .await;
        assert_eq!(status, 202);

        let task = wait_for_task(&client, &server.base, body["task_id"].as_str().unwrap()).await;
        assert_eq!(task["status"], "failed");
        assert!(!task["error"].as_str().unwrap().is_empty());

        let replays: Value = client
            .get(format!("{}/api/replays", server.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(replays.as_array().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn upload_path_components_are_stripped() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1024 * 1024).await;
        let client = reqwest::Client::new();

        let archive = common::match_archive("Reavers", "Gutters");
        let (status, body) =
            upload(&client, &server.base, replay_form("../../escape.bbrz", archive)).await;
        assert_eq!(status, 202);

        let task = wait_for_task(&client, &server.base, body["task_id"].as_str().unwrap()).await;
        let stored = task["filename"].as_str().unwrap();
        assert!(stored.ends_with("-escape.bbrz"), "stored as {stored}");
        assert!(!stored.contains('/') && !stored.contains(".."));
        assert_eq!(task["status"], "ok");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn upload_without_replay_field_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1024 * 1024).await;
        let client = reqwest::Client::new();

        let form = Form::new().text("comment", "no file here");
        let (status, body) = upload(&client, &server.base, form).await;
        assert_eq!(status, 400);
        assert!(body["error"].as_str().unwrap().contains("replay"));
        assert!(server.registry.tasks().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1024).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/upload", server.base))
            .multipart(replay_form("big.bbrz", vec![0u8; 8 * 1024]))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 413);
        assert!(server.registry.tasks().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn invalid_and_unknown_ids() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1024 * 1024).await;
        let client = reqwest::Client::new();
        let unknown = Uuid::new_v4();

        for (path, expected) in [
            ("/api/tasks/not-a-uuid".to_string(), 400),
            (format!("/api/tasks/{unknown}"), 404),
            ("/api/replays/not-a-uuid".to_string(), 400),
            (format!("/api/replays/{unknown}"), 404),
        ] {
            let resp = client
                .get(format!("{}{path}", server.base))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status().as_u16(), expected, "GET {path}");
            let body: Value = resp.json().await.unwrap();
            assert!(body["error"].is_string(), "GET {path}");
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn task_list_includes_every_upload() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1024 * 1024).await;
        let client = reqwest::Client::new();

        let mut ids = Vec::new();
        for (i, (home, away)) in [("A", "B"), ("C", "D")].into_iter().enumerate() {
            let (_, body) = upload(
                &client,
                &server.base,
                replay_form(&format!("{i}.bbrz"), common::match_archive(home, away)),
            )
            .await;
            ids.push(body["task_id"].as_str().unwrap().to_string());
        }
        for id in &ids {
            wait_for_task(&client, &server.base, id).await;
        }

        let tasks: Value = client
            .get(format!("{}/api/tasks", server.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let listed: Vec<&str> = tasks
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap())
            .collect();
        assert_eq!(listed, ids);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn cors_allows_any_origin() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1024 * 1024).await;
        let client = reqwest::Client::new();

        let resp = client
            .request(reqwest::Method::OPTIONS, format!("{}/api/replays", server.base))
            .header("Origin", "http://example.com")
            .header("Access-Control-Request-Method", "GET")
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers()["access-control-allow-origin"].to_str().unwrap(),
            "*"
        );
        assert_eq!(
            resp.headers()["access-control-max-age"].to_str().unwrap(),
            "86400"
        );
    })
    .await
    .expect("test timed out");
}
