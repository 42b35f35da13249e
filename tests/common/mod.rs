//! Shared test utilities

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use mavis::audit::MemoryAuditLog;
use mavis::{AuditSink, Config, Engine, StaticLocator};

/// How the stub corrector answers
#[derive(Debug, Clone)]
pub enum StubBehavior {
    /// Reply with this JSON body
    Reply(serde_json::Value),
    /// Reply with the uppercased text after a delay
    EchoUpper(Duration),
    /// Reply with a body that is not a corrector reply
    Malformed,
}

struct StubState {
    behavior: StubBehavior,
    received: Mutex<Vec<String>>,
}

/// A throwaway corrector service on a random local port
pub struct StubCorrector {
    pub addr: String,
    state: Arc<StubState>,
}

impl StubCorrector {
    /// Texts received so far, oldest first
    pub fn received(&self) -> Vec<String> {
        self.state.received.lock().unwrap().clone()
    }
}

async fn correct(
    State(state): State<Arc<StubState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let text = params.get("text").cloned().unwrap_or_default();
    state.received.lock().unwrap().push(text.clone());

    match &state.behavior {
        StubBehavior::Reply(body) => axum::Json(body.clone()).into_response(),
        StubBehavior::EchoUpper(delay) => {
            tokio::time::sleep(*delay).await;
            axum::Json(serde_json::json!({ "return": [text.to_uppercase()] })).into_response()
        }
        StubBehavior::Malformed => (StatusCode::OK, "<html>not json</html>").into_response(),
    }
}

/// Start a stub corrector bound to `127.0.0.1:0`
pub async fn spawn_corrector(behavior: StubBehavior) -> StubCorrector {
    let state = Arc::new(StubState {
        behavior,
        received: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/correct", get(correct))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubCorrector { addr, state }
}

/// Config rooted in `dir` with the corrector disabled
pub fn test_config(dir: &Path) -> Config {
    Config::with_dirs(dir.join("Documents"), dir.join("data"))
}

/// Config rooted in `dir` using the corrector at `addr`
pub fn corrector_config(dir: &Path, addr: &str, timeout: Duration) -> Config {
    let mut config = test_config(dir);
    config.corrector.enabled = true;
    config.corrector.address = Some(addr.to_string());
    config.corrector.timeout = timeout;
    config
}

/// Engine wired to an in-memory audit log and a static locator
pub struct TestEngine {
    pub engine: Engine,
    pub audit: Arc<MemoryAuditLog>,
    pub locator: Arc<StaticLocator>,
}

pub fn test_engine(config: Config) -> TestEngine {
    let audit = Arc::new(MemoryAuditLog::default());
    let locator = Arc::new(StaticLocator::new(config.corrector.address.clone()));
    let engine = Engine::with_parts(
        config,
        Arc::clone(&locator) as Arc<dyn mavis::CorrectorLocator>,
        Arc::clone(&audit) as Arc<dyn AuditSink>,
    )
    .unwrap();

    TestEngine {
        engine,
        audit,
        locator,
    }
}

/// Write `lines` as the phrase file
pub fn write_phrases(config: &Config, lines: &[&str]) {
    let path = config.locations().path(mavis::UserFile::Phrases);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, lines.join("\n")).unwrap();
}

/// Create empty soundbite clips with the given file names
pub fn write_soundbites(config: &Config, file_names: &[&str]) {
    let dir = config.locations().path(mavis::UserFile::Soundbites);
    std::fs::create_dir_all(&dir).unwrap();
    for name in file_names {
        std::fs::write(dir.join(name), b"").unwrap();
    }
}
