//! Hook primitives.
//!
//! Two kinds of hooks run around a call:
//!
//! - **Lifecycle callbacks** registered on the callback manager. A
//!   before-request callback returns a [`HookResult`]: `Next` lets the
//!   request continue, `Stop` ends it without invoking the target.
//! - **Hook methods** declared in class options (`__before`, `__after`). Each
//!   entry is a [`HookCall`]: a method of the same class and the arguments it
//!   is invoked with.

use serde_json::Value;

/// Result of a before-request callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookResult {
    /// Continue handling the request.
    #[default]
    Next,
    /// End the request: the target is not invoked and no after-callback runs.
    Stop,
}

impl HookResult {
    /// Returns `true` for [`HookResult::Stop`].
    pub fn is_stop(self) -> bool {
        self == HookResult::Stop
    }
}

/// A hook method invocation declared in class options.
#[derive(Debug, Clone, PartialEq)]
pub struct HookCall {
    /// The method to invoke.
    pub method: String,
    /// The arguments it receives.
    pub args: Vec<Value>,
}

impl HookCall {
    /// A hook invoked without arguments.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args: Vec::new(),
        }
    }

    /// A hook invoked with `args`.
    pub fn with_args(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}
