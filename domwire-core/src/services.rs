//! Interfaces of the external collaborators.
//!
//! Rendering, sessions, uploads, translation and log sinks are supplied by the
//! host application. The framework only depends on these traits; the null
//! implementations here back a detached [`Context`](crate::Context).

use crate::{
    error::BoxError,
    request::{Request, UploadedFile},
};
use serde_json::{Map, Value};
use std::{fmt, sync::Arc};

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Fine-grained diagnostics.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected that was recovered.
    Warning,
    /// A failure.
    Error,
}

/// A log sink.
pub trait Logger: Send + Sync {
    /// Record a message.
    fn log(&self, level: LogLevel, message: &str);
}

/// A template renderer.
pub trait ViewRenderer: Send + Sync {
    /// Render the named view with `data`.
    fn render(&self, name: &str, data: &Map<String, Value>) -> Result<String, BoxError>;
}

/// A session store.
pub trait SessionStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<Value>;
    /// Write a value.
    fn set(&self, key: &str, value: Value);
    /// Delete a value.
    fn remove(&self, key: &str);
}

/// The upload manager owning file storage.
pub trait UploadManager: Send + Sync {
    /// The files sent with `request`, or referenced by its upload parameter.
    fn files_for_request(&self, request: &Request) -> Result<Vec<UploadedFile>, BoxError>;
}

/// Produces human-readable messages.
pub trait Translator: Send + Sync {
    /// Translate `key`, substituting `:name` placeholders with `params`.
    fn trans(&self, key: &str, params: &[(&str, String)]) -> String;
}

/// A logger discarding every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: LogLevel, _message: &str) {}
}

/// A renderer producing empty output.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullView;

impl ViewRenderer for NullView {
    fn render(&self, _name: &str, _data: &Map<String, Value>) -> Result<String, BoxError> {
        Ok(String::new())
    }
}

/// A session that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSession;

impl SessionStore for NullSession {
    fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    fn set(&self, _key: &str, _value: Value) {}

    fn remove(&self, _key: &str) {}
}

/// A translator echoing the key and its parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyTranslator;

impl Translator for KeyTranslator {
    fn trans(&self, key: &str, params: &[(&str, String)]) -> String {
        let mut out = key.to_string();
        for (name, value) in params {
            out.push_str(&format!(" {name}={value}"));
        }
        out
    }
}

/// The collaborators handed to every callable instance.
#[derive(Clone)]
pub struct Services {
    /// The log sink.
    pub logger: Arc<dyn Logger>,
    /// The template renderer.
    pub view: Arc<dyn ViewRenderer>,
    /// The session store.
    pub session: Arc<dyn SessionStore>,
    /// The message translator.
    pub translator: Arc<dyn Translator>,
}

impl Services {
    /// Services backed by the null implementations.
    pub fn detached() -> Self {
        Self {
            logger: Arc::new(NullLogger),
            view: Arc::new(NullView),
            session: Arc::new(NullSession),
            translator: Arc::new(KeyTranslator),
        }
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::detached()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
