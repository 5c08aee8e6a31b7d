use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread;

use anyhow::{anyhow, Result};
use media_organizer_core::{
    load_config, organize_files, save_config, AppConfig, ContentClassifier, KeywordClassifier,
    OrganizeOptions, OrganizeOutcome, Strategy,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One background organize run requested by an embedding shell (GUI or
/// otherwise). The shell stays responsive; the core runs on its own thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub source: PathBuf,
    pub target: PathBuf,
    #[serde(default = "default_strategies")]
    pub strategies: Vec<Strategy>,
    #[serde(default)]
    pub keep_originals: bool,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub max_depth: Option<usize>,
    /// Back the by_content strategy with the built-in keyword classifier.
    #[serde(default = "default_use_keyword_classifier")]
    pub use_keyword_classifier: bool,
}

fn default_strategies() -> Vec<Strategy> {
    vec![Strategy::ByType]
}

fn default_use_keyword_classifier() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub status: SessionStatus,
    pub outcome: Option<OrganizeOutcome>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub session_id: String,
    pub status: SessionStatus,
}

#[derive(Debug, Clone)]
struct Session {
    status: SessionStatus,
    outcome: Option<OrganizeOutcome>,
    error: Option<String>,
    cancel_flag: Arc<AtomicBool>,
}

static SESSIONS: Lazy<Mutex<HashMap<String, Session>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Starts an organize run on a worker thread and returns its session id.
pub fn start_organize(request: OrganizeRequest) -> Result<String> {
    let session_id = request
        .session_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let cancel_flag = Arc::new(AtomicBool::new(false));

    {
        let mut sessions = lock_sessions()?;
        sessions.insert(
            session_id.clone(),
            Session {
                status: SessionStatus::Running,
                outcome: None,
                error: None,
                cancel_flag: Arc::clone(&cancel_flag),
            },
        );
    }

    let thread_session_id = session_id.clone();
    thread::spawn(move || {
        let options = OrganizeOptions {
            strategies: request.strategies,
            keep_originals: request.keep_originals,
            custom_rules: None,
            excludes: request.excludes,
            max_depth: request.max_depth,
            cancel_flag: Some(Arc::clone(&cancel_flag)),
        };

        let keyword = KeywordClassifier;
        let classifier: Option<&dyn ContentClassifier> = request
            .use_keyword_classifier
            .then_some(&keyword as &dyn ContentClassifier);

        let outcome = organize_files(&request.source, &request.target, &options, classifier);

        if let Ok(mut sessions) = lock_sessions() {
            if let Some(session) = sessions.get_mut(&thread_session_id) {
                session.status = if cancel_flag.load(Ordering::Relaxed) {
                    SessionStatus::Cancelled
                } else if outcome.success {
                    SessionStatus::Completed
                } else {
                    SessionStatus::Failed
                };
                session.error = if outcome.success {
                    None
                } else {
                    outcome.message.clone()
                };
                session.outcome = Some(outcome);
            }
        }
    });

    Ok(session_id)
}

pub fn get_session(session_id: &str) -> Result<SessionSnapshot> {
    let sessions = lock_sessions()?;
    let session = sessions
        .get(session_id)
        .ok_or_else(|| anyhow!("organize session not found: {session_id}"))?;

    Ok(SessionSnapshot {
        session_id: session_id.to_string(),
        status: session.status.clone(),
        outcome: session.outcome.clone(),
        error: session.error.clone(),
    })
}

/// Flips the session's cancel flag; files already relocated stay in place.
pub fn cancel_organize(session_id: &str) -> Result<CancelResponse> {
    let mut sessions = lock_sessions()?;
    let session = sessions
        .get_mut(session_id)
        .ok_or_else(|| anyhow!("organize session not found: {session_id}"))?;

    session.cancel_flag.store(true, Ordering::Relaxed);
    if session.status == SessionStatus::Running {
        session.status = SessionStatus::Cancelled;
    }

    Ok(CancelResponse {
        session_id: session_id.to_string(),
        status: session.status.clone(),
    })
}

/// Settings surface for embedding shells: explicit path in, value out.
pub fn load_settings(path: impl AsRef<std::path::Path>) -> AppConfig {
    load_config(path.as_ref())
}

pub fn save_settings(config: &AppConfig, path: impl AsRef<std::path::Path>) -> Result<()> {
    save_config(config, path.as_ref())
}

fn lock_sessions() -> Result<std::sync::MutexGuard<'static, HashMap<String, Session>>> {
    SESSIONS
        .lock()
        .map_err(|_| anyhow!("organize session registry lock poisoned"))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::{Duration, Instant};

    use super::{cancel_organize, get_session, start_organize, OrganizeRequest, SessionStatus};
    use media_organizer_core::Strategy;

    fn wait_terminal(session_id: &str) -> super::SessionSnapshot {
        let started = Instant::now();
        loop {
            let snapshot = get_session(session_id).expect("session exists");
            if snapshot.status != SessionStatus::Running {
                return snapshot;
            }
            assert!(started.elapsed() < Duration::from_secs(30));
            std::thread::sleep(Duration::from_millis(25));
        }
    }

    #[test]
    fn background_run_completes_and_exposes_outcome() {
        let source = tempfile::tempdir().expect("source");
        let target = tempfile::tempdir().expect("target");
        fs::write(source.path().join("pic.png"), b"png").expect("write");

        let session_id = start_organize(OrganizeRequest {
            session_id: None,
            source: source.path().to_path_buf(),
            target: target.path().to_path_buf(),
            strategies: vec![Strategy::ByType],
            keep_originals: true,
            excludes: Vec::new(),
            max_depth: None,
            use_keyword_classifier: true,
        })
        .expect("start succeeds");

        let snapshot = wait_terminal(&session_id);
        assert_eq!(snapshot.status, SessionStatus::Completed);
        let outcome = snapshot.outcome.expect("outcome recorded");
        assert!(outcome.success);
        assert_eq!(outcome.plans.len(), 1);
        assert!(target.path().join("by_type/png/pic.png").exists());

        let cancel = cancel_organize(&session_id).expect("cancel response");
        assert_eq!(cancel.session_id, session_id);
    }

    #[test]
    fn empty_source_surfaces_as_failed_session() {
        let source = tempfile::tempdir().expect("source");
        let target = tempfile::tempdir().expect("target");

        let session_id = start_organize(OrganizeRequest {
            session_id: Some("empty-run".to_string()),
            source: source.path().to_path_buf(),
            target: target.path().to_path_buf(),
            strategies: vec![Strategy::ByType],
            keep_originals: false,
            excludes: Vec::new(),
            max_depth: None,
            use_keyword_classifier: false,
        })
        .expect("start succeeds");

        let snapshot = wait_terminal(&session_id);
        assert_eq!(snapshot.status, SessionStatus::Failed);
        let error = snapshot.error.expect("failure message");
        assert!(error.contains("no files found"));
    }
}
