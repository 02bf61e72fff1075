//! Testing utilities for domwire.
//!
//! This module provides stand-ins for the host collaborators and helpers to
//! build requests, so applications can exercise their callables end to end.
//!
//! # Features
//!
//! - [`CallRecorder`]: Records the order in which methods, hooks and callbacks run
//! - [`RecordingLogger`]: A logger keeping every record
//! - [`MemorySession`]: An in-memory session store
//! - [`StaticView`]: A renderer returning canned templates
//! - [`FixedUploads`]: An upload manager returning a fixed file list
//! - [`call_request`]: Builds a request calling a target with type-tagged arguments

use domwire_core::{
    BoxError, LogLevel, Logger, Request, SessionStore, UploadManager, UploadedFile, ViewRenderer,
};
use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
};

// ============================================================================
// Call Recorder
// ============================================================================

/// Records labels in call order.
///
/// Clones share the same record, so a clone can be bound in the container or
/// captured by a callback while the test keeps the original.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = CallRecorder::new();
/// let inner = recorder.clone();
/// app.callbacks().boot(move || inner.record("boot"));
///
/// app.callbacks().on_boot();
/// assert_eq!(recorder.calls(), ["boot"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallRecorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a label.
    pub fn record(&self, label: impl Into<String>) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(label.into());
    }

    /// Get a copy of the recorded labels.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Clear the record.
    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

// ============================================================================
// Recording Logger
// ============================================================================

/// A logger that keeps every record.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    records: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl RecordingLogger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the records.
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns `true` if a record at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).push((level, message.to_string()));
    }
}

// ============================================================================
// Memory Session
// ============================================================================

/// A session store backed by a map.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemorySession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).remove(key);
    }
}

// ============================================================================
// Static View
// ============================================================================

/// A renderer substituting `{{key}}` placeholders in canned templates.
#[derive(Debug, Clone, Default)]
pub struct StaticView {
    templates: HashMap<String, String>,
}

impl StaticView {
    /// Create a renderer without templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template.
    pub fn with_template(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(name.into(), template.into());
        self
    }
}

impl ViewRenderer for StaticView {
    fn render(&self, name: &str, data: &Map<String, Value>) -> Result<String, BoxError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| format!("no template named `{name}`"))?;
        let mut out = template.clone();
        for (key, value) in data {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out = out.replace(&format!("{{{{{key}}}}}"), &text);
        }
        Ok(out)
    }
}

// ============================================================================
// Fixed Uploads
// ============================================================================

/// An upload manager returning the same files for every request.
#[derive(Debug, Clone, Default)]
pub struct FixedUploads {
    files: Vec<UploadedFile>,
}

impl FixedUploads {
    /// Return `files` for every request.
    pub fn new(files: Vec<UploadedFile>) -> Self {
        Self { files }
    }

    /// Return one small text file uploaded under `field`.
    pub fn single(field: &str, name: &str) -> Self {
        Self::new(vec![UploadedFile {
            field: field.to_string(),
            name: name.to_string(),
            path: PathBuf::from("/tmp").join(name),
            mime: "text/plain".to_string(),
            size: 4,
        }])
    }
}

impl UploadManager for FixedUploads {
    fn files_for_request(&self, _request: &Request) -> Result<Vec<UploadedFile>, BoxError> {
        Ok(self.files.clone())
    }
}

// ============================================================================
// Requests
// ============================================================================

/// A POST request calling `name` with type-tagged or JSON arguments.
///
/// ```rust,ignore
/// let request = call_request("Sample.hello", ["SWorld"]);
/// ```
pub fn call_request<I, S>(name: &str, args: I) -> Request
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Request::post().with_call(name).with_args(args)
}
