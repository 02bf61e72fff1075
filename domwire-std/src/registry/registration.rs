//! Per-class metadata.

use crate::options::{ClassOptions, MethodOptions};
use domwire_core::{
    ClassDefinition, ClassName, HookCall, MAGIC_PREFIX, RESERVED_METHODS, Separator, SetupError,
    Visibility,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
    sync::Arc,
};

/// Where a class registration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassSource {
    /// Registered by name.
    Explicit,
    /// Found under a registered namespace.
    Namespace(String),
    /// Found by scanning a registered directory.
    Directory(PathBuf),
}

/// Everything the framework knows about one registered class.
#[derive(Debug)]
pub struct ClassRegistration {
    name: ClassName,
    js_name: String,
    source: ClassSource,
    definition: Arc<ClassDefinition>,
    options: ClassOptions,
    protected: BTreeSet<String>,
}

impl ClassRegistration {
    /// Build and validate a registration.
    ///
    /// Every hook named in the options must exist in the method table.
    pub fn new(
        name: ClassName,
        source: ClassSource,
        definition: Arc<ClassDefinition>,
        options: ClassOptions,
        separator: Separator,
    ) -> Result<Self, SetupError> {
        for method_options in options.functions.values() {
            let hooks = method_options
                .before
                .iter()
                .chain(method_options.after.iter())
                .flatten();
            for hook in hooks {
                if definition.method(&hook.method).is_none() {
                    return Err(SetupError::UnknownHookMethod {
                        class: name.canonical(),
                        method: hook.method.clone(),
                    });
                }
            }
        }

        let mut protected: BTreeSet<String> = options.protected.iter().cloned().collect();
        protected.extend(
            definition
                .methods()
                .iter()
                .filter(|m| m.visibility() == Visibility::Protected)
                .map(|m| m.name().to_string()),
        );

        let js_name = name.to_js(options.separator.unwrap_or(separator));
        Ok(Self {
            name,
            js_name,
            source,
            definition,
            options,
            protected,
        })
    }

    /// The canonical class name.
    pub fn name(&self) -> &ClassName {
        &self.name
    }

    /// The client-side class name.
    pub fn js_name(&self) -> &str {
        &self.js_name
    }

    /// Where the registration came from.
    pub fn source(&self) -> &ClassSource {
        &self.source
    }

    /// The type-erased class.
    pub fn definition(&self) -> &ClassDefinition {
        &self.definition
    }

    /// The merged class options.
    pub fn options(&self) -> &ClassOptions {
        &self.options
    }

    /// Returns `true` if the method table has `method`, callable or not.
    pub fn has_method(&self, method: &str) -> bool {
        self.definition.method(method).is_some()
    }

    /// Returns `true` if the client may call `method`.
    pub fn is_callable(&self, method: &str) -> bool {
        self.definition
            .method(method)
            .is_some_and(|m| m.visibility() == Visibility::Public)
            && !method.starts_with(MAGIC_PREFIX)
            && !self.protected.contains(method)
            && !RESERVED_METHODS.contains(&method)
    }

    /// The methods the client may call, in declaration order.
    pub fn callable_methods(&self) -> Vec<&'static str> {
        self.definition
            .methods()
            .iter()
            .map(|m| m.name())
            .filter(|name| self.is_callable(name))
            .collect()
    }

    /// Hooks run before `method`: its own entry, else the wildcard one.
    pub fn before_hooks(&self, method: &str) -> Vec<HookCall> {
        self.options.method(method).before.unwrap_or_default()
    }

    /// Hooks run after `method`: its own entry, else the wildcard one.
    pub fn after_hooks(&self, method: &str) -> Vec<HookCall> {
        self.options.method(method).after.unwrap_or_default()
    }

    /// The effective options of `method`.
    pub fn method_options(&self, method: &str) -> MethodOptions {
        self.options.method(method)
    }

    /// Class-level injections: attribute name to binding key.
    pub fn class_di(&self) -> &BTreeMap<String, String> {
        &self.options.di
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domwire_core::{Callable, Injector, MethodTable};
    use serde_json::json;

    struct Sample;

    impl Callable for Sample {
        fn class_name() -> &'static str {
            "Sample"
        }

        fn method_table() -> MethodTable<Self> {
            MethodTable::new()
                .public("hello", |_, _| Ok(None))
                .public("helper", |_, _| Ok(None))
                .public("__invoke", |_, _| Ok(None))
                .public("response", |_, _| Ok(None))
                .protected("audit", |_, _| Ok(None))
        }

        fn construct(_injector: &Injector<'_>) -> Result<Self, SetupError> {
            Ok(Sample)
        }
    }

    fn registration(options: serde_json::Value) -> Result<ClassRegistration, SetupError> {
        ClassRegistration::new(
            ClassName::parse("App::Sample").unwrap(),
            ClassSource::Explicit,
            Arc::new(ClassDefinition::of::<Sample>()),
            ClassOptions::from_value("App::Sample", &options)?,
            Separator::Dot,
        )
    }

    #[test]
    fn test_visibility_rules() {
        let reg = registration(json!({"protected": ["helper"]})).unwrap();
        assert!(reg.is_callable("hello"));
        assert!(!reg.is_callable("helper"));
        assert!(!reg.is_callable("audit"));
        assert!(!reg.is_callable("__invoke"));
        assert!(!reg.is_callable("response"));
        assert!(!reg.is_callable("missing"));
        assert!(reg.has_method("audit"));
        assert_eq!(reg.callable_methods(), ["hello"]);
    }

    #[test]
    fn test_js_name_follows_separator() {
        assert_eq!(registration(json!(null)).unwrap().js_name(), "App.Sample");
        assert_eq!(
            registration(json!({"separator": "_"})).unwrap().js_name(),
            "App_Sample"
        );
    }

    #[test]
    fn test_unknown_hook_method() {
        let err = registration(json!({"functions": {"hello": {"__before": "nope"}}})).unwrap_err();
        assert_eq!(
            err,
            SetupError::UnknownHookMethod {
                class: "App::Sample".into(),
                method: "nope".into()
            }
        );
    }

    #[test]
    fn test_exact_hooks_override_wildcard() {
        let reg = registration(json!({
            "functions": {
                "*": {"__before": "audit"},
                "hello": {"__before": ["helper", "audit"]}
            }
        }))
        .unwrap();
        assert_eq!(
            reg.before_hooks("hello"),
            vec![HookCall::new("helper"), HookCall::new("audit")]
        );
        assert_eq!(reg.before_hooks("helper"), vec![HookCall::new("audit")]);
        assert!(reg.after_hooks("hello").is_empty());
    }
}
