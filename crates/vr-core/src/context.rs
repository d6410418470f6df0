//! Per-context logging
//!
//! Every proxied request carries a context identifier (`ctxid`) naming the
//! chat/session it belongs to. Failures are reported to that context's log
//! so the client can show them next to the conversation; each entry is
//! also emitted through `tracing`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Context used when a request carries an empty identifier
pub const DEFAULT_CONTEXT_ID: &str = "default";

/// Entries kept per context before the oldest are dropped
pub const DEFAULT_LOG_CAPACITY: usize = 500;

/// Severity of a context log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single context log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Sink for messages tied to one context
pub trait ContextLogger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Bounded in-memory log for one context
pub struct ContextLog {
    id: String,
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl ContextLog {
    pub fn new(id: impl Into<String>, capacity: usize) -> Self {
        Self {
            id: id.into(),
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Snapshot of the entries, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ContextLogger for ContextLog {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => info!(ctxid = %self.id, "{}", message),
            LogLevel::Warning => warn!(ctxid = %self.id, "{}", message),
            LogLevel::Error => error!(ctxid = %self.id, "{}", message),
        }

        let mut entries = self.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(LogEntry {
            level,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }
}

/// Lookup of context logs by identifier
pub struct ContextRegistry {
    logs: DashMap<String, Arc<ContextLog>>,
    capacity: usize,
}

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// Registry whose logs keep at most `capacity` entries each
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            logs: DashMap::new(),
            capacity,
        }
    }

    /// Logger for `ctxid` that creates the context on its first entry
    pub fn logger(&self, ctxid: &str) -> ContextHandle<'_> {
        ContextHandle {
            registry: self,
            ctxid: normalize(ctxid).to_string(),
        }
    }

    /// Get or create the log for `ctxid`
    pub fn resolve(&self, ctxid: &str) -> Arc<ContextLog> {
        let key = normalize(ctxid);
        self.logs
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(ContextLog::new(key, self.capacity)))
            .clone()
    }

    /// Entries for `ctxid`, empty if the context has never logged
    pub fn entries(&self, ctxid: &str) -> Vec<LogEntry> {
        self.logs
            .get(normalize(ctxid))
            .map(|log| log.entries())
            .unwrap_or_default()
    }

    /// Drop a context; returns whether it existed
    pub fn clear(&self, ctxid: &str) -> bool {
        self.logs.remove(normalize(ctxid)).is_some()
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

/// Deferred reference to a context in a [`ContextRegistry`]
pub struct ContextHandle<'a> {
    registry: &'a ContextRegistry,
    ctxid: String,
}

impl ContextHandle<'_> {
    pub fn ctxid(&self) -> &str {
        &self.ctxid
    }
}

impl ContextLogger for ContextHandle<'_> {
    fn log(&self, level: LogLevel, message: &str) {
        self.registry.resolve(&self.ctxid).log(level, message);
    }
}

fn normalize(ctxid: &str) -> &str {
    let trimmed = ctxid.trim();
    if trimmed.is_empty() {
        DEFAULT_CONTEXT_ID
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_keeps_entries_in_order() {
        let log = ContextLog::new("chat-1", 10);
        log.log(LogLevel::Info, "first");
        log.log(LogLevel::Error, "second");

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].level, LogLevel::Error);
    }

    #[test]
    fn test_log_drops_oldest_over_capacity() {
        let log = ContextLog::new("chat-1", 2);
        log.log(LogLevel::Info, "a");
        log.log(LogLevel::Info, "b");
        log.log(LogLevel::Info, "c");

        let messages: Vec<_> = log.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["b", "c"]);
    }

    #[test]
    fn test_registry_resolves_same_log() {
        let registry = ContextRegistry::new();
        registry.resolve("abc").log(LogLevel::Warning, "hello");

        assert_eq!(registry.resolve("abc").len(), 1);
        assert_eq!(registry.entries("abc")[0].message, "hello");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_id_maps_to_default() {
        let registry = ContextRegistry::new();
        let log = registry.resolve("  ");
        assert_eq!(log.id(), DEFAULT_CONTEXT_ID);

        log.log(LogLevel::Error, "boom");
        assert_eq!(registry.entries("").len(), 1);
        assert_eq!(registry.entries(DEFAULT_CONTEXT_ID).len(), 1);
    }

    #[test]
    fn test_handle_creates_context_on_first_entry() {
        let registry = ContextRegistry::new();
        let handle = registry.logger("");
        assert_eq!(handle.ctxid(), DEFAULT_CONTEXT_ID);
        assert!(registry.is_empty());

        for i in 0..100 {
            let _ = registry.logger(&format!("chat-{}", i));
        }
        assert!(registry.is_empty());

        handle.log(LogLevel::Error, "upstream down");
        handle.log(LogLevel::Info, "retrying later");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entries(DEFAULT_CONTEXT_ID).len(), 2);
    }

    #[test]
    fn test_clear_removes_context() {
        let registry = ContextRegistry::new();
        registry.resolve("gone").log(LogLevel::Info, "x");

        assert!(registry.clear("gone"));
        assert!(!registry.clear("gone"));
        assert!(registry.entries("gone").is_empty());
    }

    #[test]
    fn test_log_level_serializes_lowercase() {
        let json = serde_json::to_string(&LogLevel::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
        assert_eq!(LogLevel::Error.to_string(), "error");
    }
}
