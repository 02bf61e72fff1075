//! Error types for domwire.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`Error`] - Top-level error type for all domwire operations
//! - [`SetupError`] - Registration and resolution failures (fatal to the setup step)
//! - [`RequestError`] - A well-formed request naming a target that cannot be honored
//! - [`ConfigError`] - Invalid or unsatisfiable configuration

use std::path::PathBuf;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all domwire operations.
#[derive(Error, Debug)]
pub enum Error {
    /// An error occurred while registering or resolving a callable.
    #[error("setup error: {0}")]
    Setup(#[from] SetupError),

    /// The request named a target that cannot be honored.
    #[error("invalid request: {0}")]
    Request(#[from] RequestError),

    /// The configuration cannot be satisfied.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A target method, hook or callback failed.
    #[error(transparent)]
    Invocation(BoxError),
}

impl Error {
    /// Returns `true` if this error belongs to the invalid-request family.
    pub fn is_request(&self) -> bool {
        matches!(self, Error::Request(_))
    }
}

// Errors coming back from user code are boxed; recover the typed variants
// so that invalid requests raised inside a call are still routed as such.
impl From<BoxError> for Error {
    fn from(err: BoxError) -> Self {
        let err = match err.downcast::<RequestError>() {
            Ok(err) => return Error::Request(*err),
            Err(err) => err,
        };
        let err = match err.downcast::<SetupError>() {
            Ok(err) => return Error::Setup(*err),
            Err(err) => err,
        };
        match err.downcast::<ConfigError>() {
            Ok(err) => Error::Config(*err),
            Err(err) => Error::Invocation(err),
        }
    }
}

/// Errors raised at registration or resolution time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// No registration source knows the class.
    #[error("class `{0}` is not registered")]
    UnknownClass(String),

    /// No function is registered under the name.
    #[error("function `{0}` is not registered")]
    UnknownFunction(String),

    /// The options given for a class or function are malformed.
    #[error("invalid options for `{target}`: {reason}")]
    InvalidOptions {
        /// The class or function the options belong to.
        target: String,
        /// What is wrong with them.
        reason: String,
    },

    /// A name does not match the identifier grammar.
    #[error("`{0}` is not a valid identifier")]
    InvalidName(String),

    /// No container binding satisfies a constructor parameter.
    #[error("cannot resolve parameter `{param}` of type `{ty}` for `{class}`")]
    MissingBinding {
        /// The class being constructed.
        class: String,
        /// The constructor parameter name.
        param: String,
        /// The parameter type.
        ty: &'static str,
    },

    /// A container binding holds a value of another type.
    #[error("binding `{key}` does not hold a value of type `{expected}`")]
    BindingType {
        /// The binding key that matched.
        key: String,
        /// The type the caller asked for.
        expected: &'static str,
    },

    /// A binding key is neither bound nor aliased.
    #[error("no binding named `{0}`")]
    UnknownBinding(String),

    /// A binding factory failed.
    #[error("factory for `{key}` failed: {reason}")]
    Factory {
        /// The binding key.
        key: String,
        /// The factory error.
        reason: String,
    },

    /// Alias bindings form a cycle.
    #[error("alias chain starting at `{0}` does not terminate")]
    AliasCycle(String),

    /// Several catalog entries match the same class name.
    #[error("class `{class}` is ambiguous: {}", candidates.join(", "))]
    AmbiguousClass {
        /// The requested class.
        class: String,
        /// The matching type paths.
        candidates: Vec<String>,
    },

    /// A plugin with the same name is already registered.
    #[error("a plugin named `{0}` is already registered")]
    DuplicatePlugin(String),

    /// A before/after hook names a method the class does not have.
    #[error("hook method `{method}` is not defined on `{class}`")]
    UnknownHookMethod {
        /// The class declaring the hook.
        class: String,
        /// The missing method.
        method: String,
    },

    /// The configured arguments of a hook do not fit its parameters.
    #[error("invalid arguments for hook `{method}` of `{class}`: {reason}")]
    HookArguments {
        /// The class declaring the hook.
        class: String,
        /// The hook method.
        method: String,
        /// The conversion failure.
        reason: String,
    },

    /// A registered directory could not be scanned.
    #[error("cannot scan `{}`: {reason}", path.display())]
    Discovery {
        /// The directory being scanned.
        path: PathBuf,
        /// The underlying failure.
        reason: String,
    },
}

/// Errors raised when a request cannot be honored.
///
/// These are routed to the invalid-request callback chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The request carries no call descriptor.
    #[error("the request does not name a call")]
    MissingCall,

    /// The call descriptor could not be parsed.
    #[error("malformed call descriptor: {0}")]
    MalformedCall(String),

    /// A request parameter could not be decoded.
    #[error("malformed parameter `{name}`: {reason}")]
    MalformedParameter {
        /// The parameter name.
        name: String,
        /// The decode failure.
        reason: String,
    },

    /// The class name does not match the identifier grammar.
    #[error("`{0}` is not a valid class name")]
    InvalidClassName(String),

    /// The method name does not match the identifier grammar.
    #[error("`{0}` is not a valid method name")]
    InvalidMethodName(String),

    /// No plugin claims the request.
    #[error("no plugin can process the request")]
    Unclaimed,

    /// The method does not exist or is not callable from the client.
    #[error("method `{method}` of class `{class}` cannot be called")]
    UnknownMethod {
        /// The class the call was addressed to.
        class: String,
        /// The requested method.
        method: String,
    },

    /// The function is not registered.
    #[error("function `{0}` cannot be called")]
    UnknownFunction(String),

    /// An argument could not be converted to the parameter type.
    #[error("argument {index} (`{name}`) is invalid: {reason}")]
    InvalidArgument {
        /// Zero-based position of the argument.
        index: usize,
        /// The parameter name.
        name: String,
        /// The conversion failure.
        reason: String,
    },
}

impl RequestError {
    /// The translation key used to build the human-readable message.
    pub fn translation_key(&self) -> &'static str {
        match self {
            RequestError::MissingCall => "errors.request.missing",
            RequestError::MalformedCall(_) => "errors.request.malformed",
            RequestError::MalformedParameter { .. } => "errors.request.parameter",
            RequestError::Unclaimed => "errors.request.unclaimed",
            RequestError::InvalidClassName(_) => "errors.class.invalid",
            RequestError::InvalidMethodName(_) => "errors.method.invalid",
            RequestError::UnknownMethod { .. } => "errors.method.unknown",
            RequestError::UnknownFunction(_) => "errors.function.unknown",
            RequestError::InvalidArgument { .. } => "errors.argument.invalid",
        }
    }

    /// The placeholder values for the translated message.
    pub fn translation_params(&self) -> Vec<(&'static str, String)> {
        match self {
            RequestError::MissingCall | RequestError::Unclaimed => Vec::new(),
            RequestError::MalformedCall(reason) => vec![("reason", reason.clone())],
            RequestError::MalformedParameter { name, reason } => {
                vec![("name", name.clone()), ("reason", reason.clone())]
            }
            RequestError::InvalidClassName(class) => vec![("class", class.clone())],
            RequestError::InvalidMethodName(method) => vec![("method", method.clone())],
            RequestError::UnknownMethod { class, method } => {
                vec![("class", class.clone()), ("method", method.clone())]
            }
            RequestError::UnknownFunction(function) => vec![("function", function.clone())],
            RequestError::InvalidArgument {
                index,
                name,
                reason,
            } => vec![
                ("index", index.to_string()),
                ("name", name.clone()),
                ("reason", reason.clone()),
            ],
        }
    }
}

/// Errors raised when the configuration cannot be satisfied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// UTF-8 re-encoding was requested but no transcoder supports the encoding.
    #[error("no transcoder supports the `{0}` encoding")]
    UnsupportedEncoding(String),

    /// Upload handling is enabled but no upload manager is configured.
    #[error("upload handling is enabled but no upload manager is configured")]
    MissingUploadManager,

    /// A configuration value is invalid.
    #[error("invalid value for `{key}`: {reason}")]
    Invalid {
        /// The configuration key.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_error_recovers_request_error() {
        let boxed: BoxError = Box::new(RequestError::UnknownMethod {
            class: "Sample".into(),
            method: "missing".into(),
        });
        let err = Error::from(boxed);
        assert!(err.is_request());
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_box_error_keeps_foreign_errors() {
        let boxed: BoxError = Box::new(std::io::Error::other("disk full"));
        let err = Error::from(boxed);
        assert!(matches!(err, Error::Invocation(_)));
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_translation_params() {
        let err = RequestError::UnknownMethod {
            class: "Sample".into(),
            method: "missing".into(),
        };
        assert_eq!(err.translation_key(), "errors.method.unknown");
        assert_eq!(
            err.translation_params(),
            vec![("class", "Sample".to_string()), ("method", "missing".to_string())]
        );
    }
}
