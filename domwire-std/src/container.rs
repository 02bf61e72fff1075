//! Dependency injection container.
//!
//! Bindings are addressed by string keys. Three key shapes are used by
//! constructor injection (see [`binding_keys`](domwire_core::binding_keys)):
//!
//! - a type name, as returned by [`std::any::type_name`] (see [`Container::bind`]),
//! - `"<type> $<param>"` for one parameter of one type,
//! - `"$<param>"` for a parameter name regardless of its type.
//!
//! A binding holds a value, a factory or an alias. Factories run lazily on
//! first use and their result is cached as a singleton.

use domwire_core::{BoxError, Resolve, SetupError, Shared};
use std::{
    any::Any,
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError, RwLock},
};
use tracing::debug;

/// Follow at most this many aliases before reporting a cycle.
const MAX_ALIAS_DEPTH: usize = 32;

type Factory = Arc<dyn Fn(&Container) -> Result<Shared, BoxError> + Send + Sync>;

#[derive(Clone)]
enum Binding {
    Value(Shared),
    Factory(Factory),
    Alias(String),
}

/// The DI container.
#[derive(Default)]
pub struct Container {
    bindings: RwLock<HashMap<String, Binding>>,
    singletons: Mutex<HashMap<String, Shared>>,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self.bindings.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<&String> = bindings.keys().collect();
        keys.sort();
        f.debug_struct("Container").field("keys", &keys).finish()
    }
}

impl Container {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// The key under which [`Container::bind`] stores a `T`.
    pub fn type_key<T: ?Sized>() -> &'static str {
        std::any::type_name::<T>()
    }

    fn insert(&self, key: String, binding: Binding) {
        debug!(key = %key, "binding registered");
        self.singletons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, binding);
    }

    /// Bind a value under `key`.
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.insert(key.into(), Binding::Value(Arc::new(value)));
    }

    /// Bind an already shared value under `key`.
    pub fn set_shared(&self, key: impl Into<String>, value: Shared) {
        self.insert(key.into(), Binding::Value(value));
    }

    /// Bind a value under its type name.
    pub fn bind<T: Any + Send + Sync>(&self, value: T) {
        self.set(Self::type_key::<T>(), value);
    }

    /// Bind a factory under `key`.
    ///
    /// The factory runs on first resolution; its result is reused afterwards.
    pub fn factory<T, F>(&self, key: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |c| factory(c).map(|v| Arc::new(v) as Shared));
        self.insert(key.into(), Binding::Factory(factory));
    }

    /// Make `key` resolve to whatever `target` resolves to.
    pub fn alias(&self, key: impl Into<String>, target: impl Into<String>) {
        self.insert(key.into(), Binding::Alias(target.into()));
    }

    /// Returns `true` if `key` is bound.
    pub fn has(&self, key: &str) -> bool {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Resolve `key` to a shared value, or `None` if it is unbound.
    pub fn resolve(&self, key: &str) -> Result<Option<Shared>, SetupError> {
        let mut current = key.to_string();
        for _ in 0..MAX_ALIAS_DEPTH {
            let binding = self
                .bindings
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&current)
                .cloned();
            match binding {
                None => return Ok(None),
                Some(Binding::Value(value)) => return Ok(Some(value)),
                Some(Binding::Alias(target)) => current = target,
                Some(Binding::Factory(factory)) => return self.build(&current, &factory).map(Some),
            }
        }
        Err(SetupError::AliasCycle(key.to_string()))
    }

    fn build(&self, key: &str, factory: &Factory) -> Result<Shared, SetupError> {
        if let Some(value) = self
            .singletons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Ok(value.clone());
        }
        // The factory may resolve other keys, so no lock is held while it runs.
        let value = factory(self).map_err(|e| SetupError::Factory {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let mut singletons = self.singletons.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(singletons.entry(key.to_string()).or_insert(value).clone())
    }

    /// Resolve `key` to a `T`.
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Result<T, SetupError> {
        let value = self
            .resolve(key)?
            .ok_or_else(|| SetupError::UnknownBinding(key.to_string()))?;
        value
            .downcast_ref::<T>()
            .cloned()
            .ok_or(SetupError::BindingType {
                key: key.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Resolve `key`, failing if it is unbound.
    pub fn require(&self, key: &str) -> Result<Shared, SetupError> {
        self.resolve(key)?
            .ok_or_else(|| SetupError::UnknownBinding(key.to_string()))
    }
}

impl Resolve for Container {
    fn lookup(&self, key: &str) -> Result<Option<Shared>, SetupError> {
        self.resolve(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domwire_core::Injector;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_values_and_aliases() {
        let c = Container::new();
        c.set("$greeting", "hello".to_string());
        c.alias("greeting", "$greeting");
        assert_eq!(c.get::<String>("greeting").unwrap(), "hello");
        assert!(c.resolve("missing").unwrap().is_none());
        assert!(matches!(
            c.get::<String>("missing"),
            Err(SetupError::UnknownBinding(_))
        ));
    }

    #[test]
    fn test_factory_is_singleton() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Container::new();
        let counter = calls.clone();
        c.factory("counter", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(7u32)
        });
        assert_eq!(c.get::<u32>("counter").unwrap(), 7);
        assert_eq!(c.get::<u32>("counter").unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory_resolves_dependencies() {
        let c = Container::new();
        c.bind(2u64);
        c.factory("double", |c| Ok(c.get::<u64>(Container::type_key::<u64>())? * 2));
        assert_eq!(c.get::<u64>("double").unwrap(), 4);
    }

    #[test]
    fn test_factory_failure() {
        let c = Container::new();
        c.factory::<u8, _>("broken", |_| Err("no database".into()));
        assert!(matches!(
            c.resolve("broken"),
            Err(SetupError::Factory { .. })
        ));
    }

    #[test]
    fn test_alias_cycle() {
        let c = Container::new();
        c.alias("a", "b");
        c.alias("b", "a");
        assert_eq!(c.resolve("a").unwrap_err(), SetupError::AliasCycle("a".into()));
    }

    #[test]
    fn test_injector_over_container() {
        let c = Container::new();
        c.set("$name", "by-name".to_string());
        c.bind("by-type".to_string());
        let injector = Injector::new(&c, "Sample");
        assert_eq!(injector.param::<String>("name").unwrap(), "by-type");
    }
}
