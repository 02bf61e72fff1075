//! Target descriptors.

use crate::name::ClassName;
use serde_json::Value;
use std::fmt;

/// What an inbound request calls.
///
/// Created once per request by the plugin that claimed it, then only read.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A registered function.
    Function {
        /// The function name.
        name: String,
        /// The decoded call arguments.
        args: Vec<Value>,
    },
    /// A method of a registered class.
    Method {
        /// The class owning the method.
        class: ClassName,
        /// The method name.
        method: String,
        /// The decoded call arguments.
        args: Vec<Value>,
    },
}

impl Target {
    /// Returns `true` for function targets.
    pub fn is_function(&self) -> bool {
        matches!(self, Target::Function { .. })
    }

    /// The function name, for function targets.
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Target::Function { name, .. } => Some(name),
            Target::Method { .. } => None,
        }
    }

    /// The class name, for method targets.
    pub fn class_name(&self) -> Option<&ClassName> {
        match self {
            Target::Method { class, .. } => Some(class),
            Target::Function { .. } => None,
        }
    }

    /// The method name, for method targets.
    pub fn method_name(&self) -> Option<&str> {
        match self {
            Target::Method { method, .. } => Some(method),
            Target::Function { .. } => None,
        }
    }

    /// The call arguments.
    pub fn args(&self) -> &[Value] {
        match self {
            Target::Function { args, .. } | Target::Method { args, .. } => args,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Function { name, .. } => write!(f, "{name}()"),
            Target::Method { class, method, .. } => write!(f, "{class}::{method}()"),
        }
    }
}
