//! UI-mutation commands.
//!
//! A [`Command`] is one declarative instruction replayed by the client runtime.
//! On the wire it is a flat JSON object: `{"cmd": "<code>", <attributes>, "data": <payload>}`.
//! The short codes and attribute keys are part of the client contract and must not change.

use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::Value;

/// Stable command codes understood by the client runtime.
pub mod codes {
    /// Assign a property of an element.
    pub const ASSIGN: &str = "as";
    /// Append to a property of an element.
    pub const APPEND: &str = "ap";
    /// Prepend to a property of an element.
    pub const PREPEND: &str = "pp";
    /// Search and replace in a property of an element.
    pub const REPLACE: &str = "rp";
    /// Remove an element.
    pub const REMOVE: &str = "rm";
    /// Create a child element.
    pub const CREATE: &str = "ce";
    /// Insert an element before another.
    pub const INSERT_BEFORE: &str = "ie";
    /// Insert an element after another.
    pub const INSERT_AFTER: &str = "ia";
    /// Set an event attribute.
    pub const SET_EVENT: &str = "ev";
    /// Install an event handler.
    pub const ADD_HANDLER: &str = "ah";
    /// Remove an event handler.
    pub const REMOVE_HANDLER: &str = "rh";
    /// Run a script.
    pub const SCRIPT: &str = "js";
    /// Call a client-side function.
    pub const CALL: &str = "jc";
    /// Define a client-side function.
    pub const SET_FUNCTION: &str = "sf";
    /// Include a script file.
    pub const INCLUDE_SCRIPT: &str = "in";
    /// Include a script file once.
    pub const INCLUDE_SCRIPT_ONCE: &str = "ino";
    /// Remove a script file.
    pub const REMOVE_SCRIPT: &str = "rjs";
    /// Include a stylesheet.
    pub const INCLUDE_CSS: &str = "css";
    /// Remove a stylesheet.
    pub const REMOVE_CSS: &str = "rcss";
    /// Wait for stylesheets to load.
    pub const WAIT_FOR_CSS: &str = "wcss";
    /// Wait for a script condition.
    pub const WAIT_FOR: &str = "wf";
    /// Pause processing.
    pub const SLEEP: &str = "s";
    /// Show an alert.
    pub const ALERT: &str = "al";
    /// Show a debug message.
    pub const DEBUG: &str = "dbg";
    /// Navigate to another page.
    pub const REDIRECT: &str = "rd";
    /// Update data bags.
    pub const SET_BAGS: &str = "bags.set";
}

/// A single UI-mutation instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    name: String,
    attributes: Vec<(String, Value)>,
    data: Value,
}

impl Command {
    /// Create a command with no attributes.
    pub fn new(name: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            data: data.into(),
        }
    }

    /// Add an attribute, replacing any attribute with the same key.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Set an attribute, replacing any attribute with the same key.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Drop attributes whose value is null or an empty string.
    pub fn remove_empty_attributes(&mut self) {
        self.attributes.retain(|(_, v)| !is_empty_value(v));
    }

    /// The command code.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// The attributes in insertion order.
    pub fn attributes(&self) -> &[(String, Value)] {
        &self.attributes
    }

    /// The payload.
    pub fn data(&self) -> &Value {
        &self.data
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len() + 2))?;
        map.serialize_entry("cmd", &self.name)?;
        for (key, value) in &self.attributes {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("data", &self.data)?;
        map.end()
    }
}
