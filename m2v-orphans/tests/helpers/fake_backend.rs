//! In-process stand-in for the MythTV services API
//!
//! Serves the four calls the client uses on 127.0.0.1 with an ephemeral
//! port. `Video/AddVideo` inserts into the backend's own catalog database
//! (`mythconverg.db`, separate from the orphan store), the way the real
//! backend writes to mythconverg.

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Channel as the fake backend reports it
#[derive(Debug, Clone)]
pub struct FakeChannel {
    pub chan_num: String,
    pub call_sign: String,
    pub channel_name: String,
}

pub struct BackendState {
    /// The backend's catalog database
    pub catalog_db: SqlitePool,
    /// (group, host, dir)
    pub storage_groups: Mutex<Vec<(String, String, String)>>,
    pub recordings: Mutex<Vec<String>>,
    pub channels: Mutex<HashMap<String, FakeChannel>>,
    pub accept_add_video: AtomicBool,
    pub storage_group_calls: AtomicUsize,
    pub recorded_list_calls: AtomicUsize,
    pub channel_calls: AtomicUsize,
    pub add_video_calls: AtomicUsize,
}

impl BackendState {
    pub fn add_storage_group(&self, group: &str, host: &str, dir: &str) {
        self.storage_groups
            .lock()
            .unwrap()
            .push((group.to_string(), host.to_string(), dir.to_string()));
    }

    pub fn add_recording(&self, filename: &str) {
        self.recordings.lock().unwrap().push(filename.to_string());
    }

    pub fn add_channel(&self, chan_id: &str, chan_num: &str, call_sign: &str) {
        self.channels.lock().unwrap().insert(
            chan_id.to_string(),
            FakeChannel {
                chan_num: chan_num.to_string(),
                call_sign: call_sign.to_string(),
                channel_name: format!("{} Channel", call_sign),
            },
        );
    }
}

/// Create the backend's catalog database with its `videometadata` table
pub async fn create_catalog_database(path: &Path) -> SqlitePool {
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let pool = SqlitePool::connect(&url).await.unwrap();
    sqlx::query(
        r#"
        CREATE TABLE videometadata (
            intid INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL DEFAULT '',
            subtitle TEXT NOT NULL DEFAULT '',
            year INTEGER NOT NULL DEFAULT 1895,
            releasedate DATE,
            length INTEGER NOT NULL DEFAULT 0,
            filename TEXT NOT NULL,
            host TEXT NOT NULL DEFAULT '',
            contenttype TEXT NOT NULL DEFAULT 'MOVIE',
            insertdate TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();
    pool
}

/// Running fake backend
pub struct FakeBackend {
    pub addr: SocketAddr,
    pub state: Arc<BackendState>,
}

impl FakeBackend {
    /// Start serving; the server lives until the test's runtime shuts down
    pub async fn start(catalog_db: SqlitePool) -> Self {
        let state = Arc::new(BackendState {
            catalog_db,
            storage_groups: Mutex::new(Vec::new()),
            recordings: Mutex::new(Vec::new()),
            channels: Mutex::new(HashMap::new()),
            accept_add_video: AtomicBool::new(true),
            storage_group_calls: AtomicUsize::new(0),
            recorded_list_calls: AtomicUsize::new(0),
            channel_calls: AtomicUsize::new(0),
            add_video_calls: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/Myth/GetStorageGroupDirs", get(storage_group_dirs))
            .route("/Dvr/GetRecordedList", get(recorded_list))
            .route("/Channel/GetChannelInfo", post(channel_info))
            .route("/Video/AddVideo", post(add_video))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

async fn storage_group_dirs(State(state): State<Arc<BackendState>>) -> Json<Value> {
    state.storage_group_calls.fetch_add(1, Ordering::SeqCst);
    let dirs: Vec<Value> = state
        .storage_groups
        .lock()
        .unwrap()
        .iter()
        .map(|(group, host, dir)| json!({"GroupName": group, "HostName": host, "DirName": dir}))
        .collect();
    Json(json!({"StorageGroupDirList": {"StorageGroupDirs": dirs}}))
}

async fn recorded_list(State(state): State<Arc<BackendState>>) -> Json<Value> {
    state.recorded_list_calls.fetch_add(1, Ordering::SeqCst);
    let programs: Vec<Value> = state
        .recordings
        .lock()
        .unwrap()
        .iter()
        .map(|f| json!({"FileName": f, "HostName": "mythbox", "Title": "Known", "SubTitle": ""}))
        .collect();
    Json(json!({"ProgramList": {"Count": programs.len().to_string(), "Programs": programs}}))
}

async fn channel_info(
    State(state): State<Arc<BackendState>>,
    Form(params): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    state.channel_calls.fetch_add(1, Ordering::SeqCst);
    let chan_id = params.get("ChanID").cloned().unwrap_or_default();
    let channel = state.channels.lock().unwrap().get(&chan_id).cloned();
    match channel {
        Some(c) => (
            StatusCode::OK,
            Json(json!({"ChannelInfo": {
                "ChanId": chan_id,
                "ChanNum": c.chan_num,
                "CallSign": c.call_sign,
                "ChannelName": c.channel_name,
            }})),
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"Exception": {"Message": format!("Channel ID appears invalid: {}", chan_id)}})),
        ),
    }
}

async fn add_video(
    State(state): State<Arc<BackendState>>,
    Form(params): Form<HashMap<String, String>>,
) -> Json<Value> {
    state.add_video_calls.fetch_add(1, Ordering::SeqCst);
    if !state.accept_add_video.load(Ordering::SeqCst) {
        return Json(json!({"bool": "false"}));
    }

    let filename = params.get("FileName").cloned().unwrap_or_default();
    let host = params.get("HostName").cloned().unwrap_or_default();
    sqlx::query("INSERT INTO videometadata (filename, host) VALUES (?, ?)")
        .bind(&filename)
        .bind(&host)
        .execute(&state.catalog_db)
        .await
        .unwrap();
    Json(json!({"bool": "true"}))
}
