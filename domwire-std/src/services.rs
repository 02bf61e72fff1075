//! Default collaborators.
//!
//! [`TracingLogger`] forwards log records to `tracing`, and
//! [`EnglishTranslator`] carries the built-in English messages for every
//! error the request handler reports to the client.

use domwire_core::{LogLevel, Logger, Translator};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// A logger forwarding records to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => debug!(target: "domwire::app", "{message}"),
            LogLevel::Info => info!(target: "domwire::app", "{message}"),
            LogLevel::Warning => warn!(target: "domwire::app", "{message}"),
            LogLevel::Error => error!(target: "domwire::app", "{message}"),
        }
    }
}

const MESSAGES: &[(&str, &str)] = &[
    ("errors.request.missing", "The request does not name a call."),
    ("errors.request.malformed", "The call descriptor is malformed: :reason."),
    (
        "errors.request.parameter",
        "The request parameter :name is malformed: :reason.",
    ),
    ("errors.request.unclaimed", "No handler can process the request."),
    ("errors.class.invalid", "The class name :class is invalid."),
    ("errors.method.invalid", "The method name :method is invalid."),
    (
        "errors.method.unknown",
        "The method :method of class :class cannot be called.",
    ),
    ("errors.function.unknown", "The function :function cannot be called."),
    (
        "errors.argument.invalid",
        "Argument :index (:name) is invalid: :reason.",
    ),
    ("errors.call.failed", "The call failed: :message."),
];

/// The built-in English message catalogue.
///
/// Unknown keys translate to themselves. Placeholders are written `:name`;
/// longer names are substituted first so `:name` never clobbers `:names`.
#[derive(Debug, Clone, Default)]
pub struct EnglishTranslator {
    overrides: HashMap<String, String>,
}

impl EnglishTranslator {
    /// Create a translator with the built-in messages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the message of `key`.
    pub fn with_message(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), message.into());
        self
    }

    fn message(&self, key: &str) -> Option<&str> {
        self.overrides.get(key).map(String::as_str).or_else(|| {
            MESSAGES
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, message)| *message)
        })
    }
}

impl Translator for EnglishTranslator {
    fn trans(&self, key: &str, params: &[(&str, String)]) -> String {
        let Some(message) = self.message(key) else {
            return key.to_string();
        };
        let mut params: Vec<&(&str, String)> = params.iter().collect();
        params.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));
        params
            .into_iter()
            .fold(message.to_string(), |out, (name, value)| {
                out.replace(&format!(":{name}"), value)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_parameters() {
        let translator = EnglishTranslator::new();
        let message = translator.trans(
            "errors.method.unknown",
            &[("class", "Sample".into()), ("method", "missing".into())],
        );
        assert_eq!(message, "The method missing of class Sample cannot be called.");
    }

    #[test]
    fn test_unknown_key_and_overrides() {
        let translator = EnglishTranslator::new().with_message("errors.request.unclaimed", "Nope");
        assert_eq!(translator.trans("errors.request.unclaimed", &[]), "Nope");
        assert_eq!(translator.trans("custom.key", &[]), "custom.key");
    }

    #[test]
    fn test_longer_names_first() {
        let translator = EnglishTranslator::new().with_message("k", ":name/:names");
        let message = translator.trans("k", &[("name", "a".into()), ("names", "b".into())]);
        assert_eq!(message, "a/b");
    }
}
