//! # Request Plugins
//!
//! A request plugin recognizes one kind of call and executes it. Plugins are
//! registered under a unique name with a priority; dispatch asks them in
//! ascending priority order and the first one whose
//! [`RequestPlugin::can_process_request`] returns `true` handles the request.
//!
//! # Priority Bands
//!
//! | Range | Use |
//! |---|---|
//! | 0–999 | framework plugins ([`FUNCTION_PRIORITY`], [`CLASS_PRIORITY`]) |
//! | 1000–8999 | user plugins |
//! | 9000–9999 | plugins that must run last |
//!
//! The upload plugin takes no part in dispatch: when uploads are enabled it
//! runs before the winning plugin.

mod class;
mod function;
mod upload;

pub use class::ClassPlugin;
pub use function::{FunctionOptions, FunctionPlugin, FunctionRegistry, RegisteredFunction};
pub use upload::UploadPlugin;

use crate::{decoder::IncomingCall, scope::RequestScope};
use domwire_core::{Error, Response, SetupError, Target};
use std::{
    fmt,
    ops::RangeInclusive,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::{debug, info};

/// Priority of the function plugin.
pub const FUNCTION_PRIORITY: i32 = 101;
/// Priority of the class plugin.
pub const CLASS_PRIORITY: i32 = 102;
/// Priorities reserved for framework plugins.
pub const CORE_BAND: RangeInclusive<i32> = 0..=999;
/// Priorities for user plugins.
pub const USER_BAND: RangeInclusive<i32> = 1000..=8999;
/// Priorities for plugins that must run last.
pub const LAST_BAND: RangeInclusive<i32> = 9000..=9999;

/// Recognizes and executes one kind of call.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a request plugin",
    label = "missing `RequestPlugin` implementation",
    note = "Request plugins implement `can_process_request`, `resolve_target` and `process_request`."
)]
pub trait RequestPlugin: Send + Sync {
    /// Returns `true` if this plugin handles `call`.
    fn can_process_request(&self, call: &IncomingCall) -> bool;

    /// The target `call` addresses.
    fn resolve_target(&self, call: &IncomingCall) -> Result<Target, Error>;

    /// Execute `target`.
    fn process_request(
        &self,
        target: &Target,
        scope: &RequestScope<'_>,
    ) -> Result<Option<Response>, Error>;
}

/// A registered plugin.
#[derive(Clone)]
pub struct PluginEntry {
    name: String,
    priority: i32,
    plugin: Arc<dyn RequestPlugin>,
}

impl PluginEntry {
    /// The registration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The priority (lower runs first).
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// The plugin.
    pub fn plugin(&self) -> &dyn RequestPlugin {
        self.plugin.as_ref()
    }
}

impl fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Plugins in priority order.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    entries: RwLock<Vec<PluginEntry>>,
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `plugin` under `name`.
    ///
    /// Names are unique and priorities must lie in one of the bands. Plugins
    /// of equal priority keep their registration order.
    pub fn register<P>(&self, name: &str, priority: i32, plugin: P) -> Result<(), SetupError>
    where
        P: RequestPlugin + 'static,
    {
        self.register_shared(name, priority, Arc::new(plugin))
    }

    /// Register an already shared plugin.
    pub fn register_shared(
        &self,
        name: &str,
        priority: i32,
        plugin: Arc<dyn RequestPlugin>,
    ) -> Result<(), SetupError> {
        if !(CORE_BAND.contains(&priority)
            || USER_BAND.contains(&priority)
            || LAST_BAND.contains(&priority))
        {
            return Err(SetupError::InvalidOptions {
                target: name.to_string(),
                reason: format!("priority {priority} is outside 0..=9999"),
            });
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.iter().any(|e| e.name == name) {
            return Err(SetupError::DuplicatePlugin(name.to_string()));
        }
        entries.push(PluginEntry {
            name: name.to_string(),
            priority,
            plugin,
        });
        entries.sort_by_key(|e| e.priority);
        info!(plugin = name, priority, "plugin registered");
        Ok(())
    }

    /// The first plugin claiming `call`.
    pub fn find(&self, call: &IncomingCall) -> Option<PluginEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.iter().find(|e| e.plugin.can_process_request(call))?;
        debug!(plugin = %entry.name, call = call.name(), "plugin claimed request");
        Some(entry.clone())
    }

    /// Registered names in dispatch order.
    pub fn names(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    /// The number of registered plugins.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
