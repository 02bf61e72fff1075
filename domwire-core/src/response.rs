//! Response command buffers.
//!
//! A [`Response`] is an ordered, append-only list of [`Command`]s. The client
//! replays commands in emission order, so every operation here preserves order:
//! [`Response::merge`] appends another buffer, or prepends it when a sub-call's
//! commands must run before the caller's own.
//!
//! [`ResponseHandle`] shares one buffer between the framework and the callable
//! instance it belongs to; [`NodeResponse`] targets every command at one DOM node.

use crate::command::{Command, codes};
use serde::Serialize;
use serde_json::Value;
use std::{
    cell::{RefCell, RefMut},
    rc::Rc,
};

/// An ordered list of UI-mutation commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Response {
    commands: Vec<Command>,
}

impl Response {
    /// Create an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command built from a code, flat attributes and a payload.
    ///
    /// With `remove_empty`, attributes holding null or an empty string are dropped.
    pub fn add_command<I, K, V>(
        &mut self,
        name: &str,
        attributes: I,
        data: impl Into<Value>,
        remove_empty: bool,
    ) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut command = Command::new(name, data);
        for (key, value) in attributes {
            command.set_attribute(key, value);
        }
        if remove_empty {
            command.remove_empty_attributes();
        }
        self.push(command)
    }

    /// Append a prepared command.
    pub fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// The commands in emission order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Consume the response, returning its commands.
    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    /// The number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no command was emitted.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Remove every command.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Merge another response into this one.
    ///
    /// Without `prepend` the result is `self ++ other`; with it, `other ++ self`.
    pub fn merge(&mut self, other: Response, prepend: bool) -> &mut Self {
        self.merge_commands(other.commands, prepend)
    }

    /// Merge a list of commands into this response.
    pub fn merge_commands(&mut self, mut commands: Vec<Command>, prepend: bool) -> &mut Self {
        if prepend {
            commands.append(&mut self.commands);
            self.commands = commands;
        } else {
            self.commands.append(&mut commands);
        }
        self
    }

    /// Serialize the commands to the JSON wire format.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.commands)
    }

    // ========================================================================
    // DOM content
    // ========================================================================

    /// Assign `data` to the `prop` property of element `id`.
    pub fn assign(&mut self, id: &str, prop: &str, data: impl Into<Value>) -> &mut Self {
        self.add_command(codes::ASSIGN, [("id", id), ("prop", prop)], data, false)
    }

    /// Assign `data` to the inner HTML of element `id`.
    pub fn html(&mut self, id: &str, data: impl Into<Value>) -> &mut Self {
        self.assign(id, "innerHTML", data)
    }

    /// Append `data` to the `prop` property of element `id`.
    pub fn append(&mut self, id: &str, prop: &str, data: impl Into<Value>) -> &mut Self {
        self.add_command(codes::APPEND, [("id", id), ("prop", prop)], data, false)
    }

    /// Prepend `data` to the `prop` property of element `id`.
    pub fn prepend(&mut self, id: &str, prop: &str, data: impl Into<Value>) -> &mut Self {
        self.add_command(codes::PREPEND, [("id", id), ("prop", prop)], data, false)
    }

    /// Replace `search` with `data` in the `prop` property of element `id`.
    pub fn replace(&mut self, id: &str, prop: &str, search: &str, data: &str) -> &mut Self {
        let payload = serde_json::json!({ "s": search, "r": data });
        self.add_command(codes::REPLACE, [("id", id), ("prop", prop)], payload, false)
    }

    /// Clear the `prop` property of element `id`.
    pub fn clear_property(&mut self, id: &str, prop: &str) -> &mut Self {
        self.assign(id, prop, "")
    }

    /// Remove element `id` from the document.
    pub fn remove(&mut self, id: &str) -> &mut Self {
        self.add_command(codes::REMOVE, [("id", id)], Value::Null, false)
    }

    // ========================================================================
    // DOM structure
    // ========================================================================

    /// Create a `tag` element with id `id` as the last child of `parent`.
    pub fn create(&mut self, parent: &str, tag: &str, id: &str) -> &mut Self {
        self.add_command(codes::CREATE, [("id", parent), ("prop", id)], tag, false)
    }

    /// Create a `tag` element with id `id` before element `before`.
    pub fn insert_before(&mut self, before: &str, tag: &str, id: &str) -> &mut Self {
        self.add_command(codes::INSERT_BEFORE, [("id", before), ("prop", id)], tag, false)
    }

    /// Create a `tag` element with id `id` after element `after`.
    pub fn insert_after(&mut self, after: &str, tag: &str, id: &str) -> &mut Self {
        self.add_command(codes::INSERT_AFTER, [("id", after), ("prop", id)], tag, false)
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Set the `event` attribute of element `id` to `script`.
    pub fn set_event(&mut self, id: &str, event: &str, script: &str) -> &mut Self {
        self.add_command(codes::SET_EVENT, [("id", id), ("prop", event)], script, false)
    }

    /// Install the client function `handler` for `event` on element `id`.
    pub fn add_handler(&mut self, id: &str, event: &str, handler: &str) -> &mut Self {
        self.add_command(codes::ADD_HANDLER, [("id", id), ("prop", event)], handler, false)
    }

    /// Remove the client function `handler` for `event` from element `id`.
    pub fn remove_handler(&mut self, id: &str, event: &str, handler: &str) -> &mut Self {
        self.add_command(codes::REMOVE_HANDLER, [("id", id), ("prop", event)], handler, false)
    }

    // ========================================================================
    // Scripts
    // ========================================================================

    /// Run a piece of client script.
    pub fn script(&mut self, script: &str) -> &mut Self {
        self.add_command(codes::SCRIPT, None::<(&str, Value)>, script, false)
    }

    /// Call the client function `func` with `args`.
    pub fn call(&mut self, func: &str, args: Vec<Value>) -> &mut Self {
        self.add_command(codes::CALL, [("func", func)], args, false)
    }

    /// Define the client function `func` taking `args` with body `script`.
    pub fn set_function(&mut self, func: &str, args: &str, script: &str) -> &mut Self {
        self.add_command(codes::SET_FUNCTION, [("func", func), ("prop", args)], script, false)
    }

    /// Include a script file; an empty `ty` or `elm_id` is omitted.
    pub fn include_script(&mut self, file: &str, ty: &str, elm_id: &str) -> &mut Self {
        self.add_command(
            codes::INCLUDE_SCRIPT,
            [("type", ty), ("elm_id", elm_id)],
            file,
            true,
        )
    }

    /// Include a script file unless the client already loaded it.
    pub fn include_script_once(&mut self, file: &str, ty: &str, elm_id: &str) -> &mut Self {
        self.add_command(
            codes::INCLUDE_SCRIPT_ONCE,
            [("type", ty), ("elm_id", elm_id)],
            file,
            true,
        )
    }

    /// Remove a script file, running the `unload` function first if given.
    pub fn remove_script(&mut self, file: &str, unload: &str) -> &mut Self {
        self.add_command(codes::REMOVE_SCRIPT, [("unld", unload)], file, true)
    }

    /// Include a stylesheet for `media` (omitted when empty).
    pub fn include_css(&mut self, file: &str, media: &str) -> &mut Self {
        self.add_command(codes::INCLUDE_CSS, [("media", media)], file, true)
    }

    /// Remove a stylesheet.
    pub fn remove_css(&mut self, file: &str, media: &str) -> &mut Self {
        self.add_command(codes::REMOVE_CSS, [("media", media)], file, true)
    }

    // ========================================================================
    // Flow
    // ========================================================================

    /// Wait up to `tenths` tenths of a second for stylesheets to load.
    pub fn wait_for_css(&mut self, tenths: u32) -> &mut Self {
        self.add_command(codes::WAIT_FOR_CSS, [("prop", tenths)], "", false)
    }

    /// Wait up to `tenths` tenths of a second for `script` to evaluate to true.
    pub fn wait_for(&mut self, script: &str, tenths: u32) -> &mut Self {
        self.add_command(codes::WAIT_FOR, [("prop", tenths)], script, false)
    }

    /// Pause command processing for `tenths` tenths of a second.
    pub fn sleep(&mut self, tenths: u32) -> &mut Self {
        self.add_command(codes::SLEEP, [("prop", tenths)], "", false)
    }

    /// Navigate to `url` after `delay` seconds.
    pub fn redirect(&mut self, url: &str, delay: u32) -> &mut Self {
        self.add_command(codes::REDIRECT, [("delay", delay)], url, false)
    }

    // ========================================================================
    // Messages
    // ========================================================================

    /// Show an alert.
    pub fn alert(&mut self, message: &str) -> &mut Self {
        self.add_command(codes::ALERT, None::<(&str, Value)>, message, false)
    }

    /// Show a debug message.
    pub fn debug(&mut self, message: &str) -> &mut Self {
        self.add_command(codes::DEBUG, None::<(&str, Value)>, message, false)
    }
}

/// A response buffer shared between the framework and a callable instance.
///
/// Request-scoped: handles are cheap to clone and never cross threads.
#[derive(Debug, Clone, Default)]
pub struct ResponseHandle(Rc<RefCell<Response>>);

impl ResponseHandle {
    /// Create a handle over an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the buffer mutably for the duration of the returned guard.
    pub fn borrow_mut(&self) -> RefMut<'_, Response> {
        self.0.borrow_mut()
    }

    /// Take the buffered commands, leaving the buffer empty.
    pub fn take(&self) -> Response {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    /// A copy of the buffer.
    pub fn snapshot(&self) -> Response {
        self.0.borrow().clone()
    }

    /// Returns `true` if both handles share the same buffer.
    pub fn ptr_eq(&self, other: &ResponseHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// A response targeting the DOM node `id`.
    pub fn node(&self, id: impl Into<String>) -> NodeResponse {
        NodeResponse {
            response: self.clone(),
            id: id.into(),
        }
    }
}

/// A response bound to one DOM node.
///
/// Every command is written into the underlying shared buffer with the node id
/// prefilled, so components can update "their" element without repeating it.
#[derive(Debug, Clone)]
pub struct NodeResponse {
    response: ResponseHandle,
    id: String,
}

impl NodeResponse {
    /// The targeted node id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Replace the node content.
    pub fn html(&self, data: impl Into<Value>) -> &Self {
        self.response.borrow_mut().html(&self.id, data);
        self
    }

    /// Assign a property of the node.
    pub fn assign(&self, prop: &str, data: impl Into<Value>) -> &Self {
        self.response.borrow_mut().assign(&self.id, prop, data);
        self
    }

    /// Append to the node content.
    pub fn append(&self, data: impl Into<Value>) -> &Self {
        self.response.borrow_mut().append(&self.id, "innerHTML", data);
        self
    }

    /// Prepend to the node content.
    pub fn prepend(&self, data: impl Into<Value>) -> &Self {
        self.response.borrow_mut().prepend(&self.id, "innerHTML", data);
        self
    }

    /// Clear the node content.
    pub fn clear(&self) -> &Self {
        self.response.borrow_mut().clear_property(&self.id, "innerHTML");
        self
    }

    /// Remove the node.
    pub fn remove(&self) -> &Self {
        self.response.borrow_mut().remove(&self.id);
        self
    }

    /// Install an event handler on the node.
    pub fn add_handler(&self, event: &str, handler: &str) -> &Self {
        self.response.borrow_mut().add_handler(&self.id, event, handler);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(response: &Response) -> Vec<String> {
        response
            .commands()
            .iter()
            .map(|c| c.data().as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_merge_appends() {
        let mut r1 = Response::new();
        r1.script("a").script("b");
        let mut r2 = Response::new();
        r2.script("c");

        r1.merge(r2, false);
        assert_eq!(names(&r1), ["a", "b", "c"]);
    }

    #[test]
    fn test_merge_prepends() {
        let mut r1 = Response::new();
        r1.script("a").script("b");
        let mut r2 = Response::new();
        r2.script("c").script("d");

        r1.merge(r2, true);
        assert_eq!(names(&r1), ["c", "d", "a", "b"]);
    }

    #[test]
    fn test_to_json() {
        let mut response = Response::new();
        response.assign("greeting", "innerHTML", "Hello World");
        response.call("notify", vec![json!(1), json!("x")]);
        let value: Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!([
                {"cmd": "as", "id": "greeting", "prop": "innerHTML", "data": "Hello World"},
                {"cmd": "jc", "func": "notify", "data": [1, "x"]}
            ])
        );
    }

    #[test]
    fn test_include_script_drops_empty_attributes() {
        let mut response = Response::new();
        response.include_script("/app.js", "", "");
        let cmd = &response.commands()[0];
        assert_eq!(cmd.name(), "in");
        assert!(cmd.attributes().is_empty());
    }

    #[test]
    fn test_node_response_targets_node() {
        let handle = ResponseHandle::new();
        let node = handle.node("counter");
        node.html("1").append("2");

        let response = handle.take();
        assert_eq!(response.len(), 2);
        assert!(
            response
                .commands()
                .iter()
                .all(|c| c.attribute("id") == Some(&json!("counter")))
        );
        assert!(handle.snapshot().is_empty());
    }
}
