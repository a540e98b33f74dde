//! Process-wide structured debug event stream.
//!
//! One JSON object per line: `{"timestamp", "event_type", "data"}`, `data`
//! always carrying the active session id (or the sentinel `"none"`).
//! Disabled is the fast path: every entry point returns immediately with no
//! allocation when `debug_logging` is off.

use chrono::Utc;
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

const NO_SESSION: &str = "none";

#[derive(Debug, Clone)]
pub struct DebugSession {
    pub session_id: String,
    pub position_fen: String,
    pub start_timestamp: chrono::DateTime<Utc>,
    pub active: bool,
}

/// Output sinks a logger instance can write to, toggled independently.
struct Sinks {
    file: Option<std::fs::File>,
    file_path: Option<PathBuf>,
    diagnostic_channel: bool,
}

struct LoggerState {
    session: Option<DebugSession>,
    sinks: Sinks,
}

/// Process-wide structured event logger. Construct via [`DebugLogger::global`];
/// reconfigure via [`DebugLogger::init`] at any time, including mid-session.
pub struct DebugLogger {
    enabled: AtomicBool,
    state: Mutex<LoggerState>,
}

static GLOBAL: OnceCell<DebugLogger> = OnceCell::new();

#[derive(Debug, Clone, Default)]
pub struct LoggerOptions {
    pub enabled: bool,
    pub file_path: Option<PathBuf>,
    pub diagnostic_channel: bool,
}

impl DebugLogger {
    fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            state: Mutex::new(LoggerState {
                session: None,
                sinks: Sinks {
                    file: None,
                    file_path: None,
                    diagnostic_channel: true,
                },
            }),
        }
    }

    /// Returns the process-wide logger, creating it (disabled) on first use.
    pub fn global() -> &'static DebugLogger {
        GLOBAL.get_or_init(DebugLogger::new)
    }

    /// Explicit initialization entry point: configures sinks and
    /// enable/disable state. Safe to call again later to reconfigure.
    pub fn init(opts: LoggerOptions) {
        let logger = Self::global();
        logger.enabled.store(opts.enabled, Ordering::Release);
        let mut state = logger.state.lock().expect("logger mutex poisoned");
        state.sinks.diagnostic_channel = opts.diagnostic_channel;
        state.sinks.file = None;
        state.sinks.file_path = None;
        if let Some(path) = opts.file_path {
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => {
                    state.sinks.file_path = Some(path);
                    state.sinks.file = Some(file);
                }
                Err(e) => {
                    drop(state);
                    logger.emit_raw("error", json!({"session_id": NO_SESSION, "message": format!("failed to open metrics file {}: {e}", path.display())}));
                }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Explicit teardown entry point (§9): ends any session still active
    /// and flushes the file sink, without touching the enabled flag. A
    /// caller that tears down mid-process can still `init` again later.
    pub fn teardown(&self) {
        self.end_session();
        let mut state = self.state.lock().expect("logger mutex poisoned");
        if let Some(file) = state.sinks.file.as_mut() {
            let _ = file.flush();
        }
    }

    /// Starts a new session, implicitly ending any currently active one.
    pub fn start_session(&self, position_fen: &str) -> String {
        if !self.is_enabled() {
            return String::new();
        }
        let session_id = format_session_id(Uuid::new_v4());
        let session = DebugSession {
            session_id: session_id.clone(),
            position_fen: position_fen.to_string(),
            start_timestamp: Utc::now(),
            active: true,
        };
        {
            let mut state = self.state.lock().expect("logger mutex poisoned");
            if let Some(prev) = state.session.take() {
                if prev.active {
                    drop(state);
                    self.end_session_inner(&prev.session_id);
                    state = self.state.lock().expect("logger mutex poisoned");
                }
            }
            state.session = Some(session);
        }
        self.emit(
            "session_start",
            json!({"session_id": session_id, "position_fen": position_fen}),
        );
        session_id
    }

    pub fn end_session(&self) {
        if !self.is_enabled() {
            return;
        }
        let session_id = {
            let state = self.state.lock().expect("logger mutex poisoned");
            state.session.as_ref().map(|s| s.session_id.clone())
        };
        if let Some(id) = session_id {
            self.end_session_inner(&id);
        }
    }

    fn end_session_inner(&self, session_id: &str) {
        {
            let mut state = self.state.lock().expect("logger mutex poisoned");
            if let Some(session) = state.session.as_mut() {
                session.active = false;
            }
        }
        self.emit("session_end", json!({"session_id": session_id}));
    }

    pub fn current_session_id(&self) -> String {
        let state = self.state.lock().expect("logger mutex poisoned");
        state
            .session
            .as_ref()
            .filter(|s| s.active)
            .map(|s| s.session_id.clone())
            .unwrap_or_else(|| NO_SESSION.to_string())
    }

    /// Emits an event, merging `session_id` into `data` automatically.
    pub fn emit(&self, event_type: &str, mut data: Value) {
        if !self.is_enabled() {
            return;
        }
        let session_id = self.current_session_id();
        if let Value::Object(map) = &mut data {
            map.insert("session_id".to_string(), Value::String(session_id));
        }
        self.emit_raw(event_type, data);
    }

    /// Emits an event with an already-complete `data` object (used for the
    /// out-of-session error path, where the sentinel is inserted by hand).
    fn emit_raw(&self, event_type: &str, data: Value) {
        let line = json!({
            "timestamp": format_timestamp(Utc::now()),
            "event_type": event_type,
            "data": data,
        });
        let rendered = line.to_string();

        let mut state = self.state.lock().expect("logger mutex poisoned");
        if state.sinks.diagnostic_channel {
            tracing::debug!(target: "pis::debug_log", "{rendered}");
        }
        if let Some(file) = state.sinks.file.as_mut() {
            if let Err(e) = writeln!(file, "{rendered}") {
                let path = state.sinks.file_path.clone();
                state.sinks.file = None;
                drop(state);
                tracing::error!(
                    "debug logger file sink failed ({}): {e}; continuing with diagnostic sink only",
                    path.map(|p| p.display().to_string()).unwrap_or_default()
                );
                return;
            }
        }
    }

    pub fn warn_once(&self, message: &str) {
        self.emit("warning", json!({"message": message}));
    }

    pub fn error(&self, message: &str) {
        self.emit("error", json!({"message": message}));
    }

    pub fn info(&self, message: &str) {
        self.emit("info", json!({"message": message}));
    }
}

fn format_session_id(id: Uuid) -> String {
    id.hyphenated().to_string()
}

fn format_timestamp(ts: chrono::DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Helper for building the event-specific `data` payloads described in the
/// log event grammar, kept here so call sites in `controller`/`evaluation`
/// stay terse.
pub fn event_data<T: Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or_else(|_| json!({}))
}
