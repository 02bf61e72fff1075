//! # Callable Registry
//!
//! Knows which classes the client may address and how to find their
//! implementation. Classes come from three registration sources, looked up in
//! this order:
//!
//! 1. **Explicit** classes registered by name.
//! 2. **Namespaces**: any class under a registered prefix. When the namespace
//!    has a directory, the class file must exist in it.
//! 3. **Directories** without namespace. They are scanned once, lazily, the
//!    first time a lookup misses the first two sources.
//!
//! The implementation behind a name always comes from the [`ClassCatalog`].
//! Registrations are built on first use and cached for the lifetime of the
//! registry.

mod discovery;
mod registration;

pub use discovery::{DiscoveredClass, class_file, scan_directory};
pub use registration::{ClassRegistration, ClassSource};

use crate::{catalog::ClassCatalog, options::ClassOptions};
use domwire_core::{ClassDefinition, ClassName, Error, Separator, SetupError};
use serde_json::Value;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct NamespaceSource {
    prefix: ClassName,
    directory: Option<PathBuf>,
    options: ClassOptions,
}

#[derive(Debug)]
struct DirectorySource {
    root: PathBuf,
    options: ClassOptions,
}

#[derive(Debug, Clone)]
struct Discovered {
    root: PathBuf,
    relative: PathBuf,
    options: ClassOptions,
}

#[derive(Debug, Default)]
struct State {
    separator: Option<Separator>,
    explicit: BTreeMap<ClassName, ClassOptions>,
    namespaces: Vec<NamespaceSource>,
    directories: Vec<DirectorySource>,
    discovered: Option<BTreeMap<ClassName, Discovered>>,
    scans: usize,
    registrations: HashMap<ClassName, Arc<ClassRegistration>>,
}

/// The registry of callable classes.
#[derive(Debug, Default)]
pub struct CallableRegistry {
    catalog: ClassCatalog,
    state: RwLock<State>,
}

impl CallableRegistry {
    /// Create a registry over `catalog`.
    pub fn new(catalog: ClassCatalog) -> Self {
        Self {
            catalog,
            state: RwLock::default(),
        }
    }

    /// The class catalog.
    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the client-side separator.
    ///
    /// The separator can only be set once; later attempts with another value
    /// are ignored and return `false`.
    pub fn set_separator(&self, separator: Separator) -> bool {
        let mut state = self.write();
        match state.separator {
            Some(current) if current != separator => {
                warn!(?current, requested = ?separator, "separator already set, ignoring");
                false
            }
            _ => {
                state.separator = Some(separator);
                true
            }
        }
    }

    /// The client-side separator.
    pub fn separator(&self) -> Separator {
        self.read().separator.unwrap_or_default()
    }

    /// Register a class by canonical name.
    ///
    /// Registering the same class again keeps the first registration.
    pub fn register_class(&self, name: &str, options: &Value) -> Result<(), SetupError> {
        let class = ClassName::parse(name)?;
        let options = ClassOptions::from_value(name, options)?;
        let mut state = self.write();
        if state.explicit.contains_key(&class) {
            debug!(class = %class, "class already registered");
            return Ok(());
        }
        // A registration built from another source must pick up these options.
        state.registrations.remove(&class);
        info!(class = %class, "class registered");
        state.explicit.insert(class, options);
        Ok(())
    }

    /// Register every class under `namespace`.
    ///
    /// With a directory, a class is only known if its file exists there.
    pub fn register_namespace(
        &self,
        namespace: &str,
        directory: Option<PathBuf>,
        options: &Value,
    ) -> Result<(), SetupError> {
        let prefix = ClassName::parse(namespace)?;
        let options = ClassOptions::from_value(namespace, options)?;
        let mut state = self.write();
        if state.namespaces.iter().any(|ns| ns.prefix == prefix) {
            debug!(namespace = %prefix, "namespace already registered");
            return Ok(());
        }
        info!(namespace = %prefix, ?directory, "namespace registered");
        state.namespaces.push(NamespaceSource {
            prefix,
            directory,
            options,
        });
        Ok(())
    }

    /// Register a directory of classes without namespace.
    pub fn register_directory(
        &self,
        directory: impl Into<PathBuf>,
        options: &Value,
    ) -> Result<(), SetupError> {
        let root = directory.into();
        let options = ClassOptions::from_value(&root.display().to_string(), options)?;
        let mut state = self.write();
        if state.directories.iter().any(|d| d.root == root) {
            debug!(directory = %root.display(), "directory already registered");
            return Ok(());
        }
        info!(directory = %root.display(), "directory registered");
        state.directories.push(DirectorySource { root, options });
        // New classes may appear.
        state.discovered = None;
        Ok(())
    }

    /// How many times the plain directories were scanned.
    pub fn scan_count(&self) -> usize {
        self.read().scans
    }

    /// Resolve a client-side class name.
    pub fn resolve_client(&self, name: &str) -> Result<Arc<ClassRegistration>, Error> {
        let class = ClassName::from_client(name)?;
        Ok(self.resolve(&class)?)
    }

    /// Resolve a class, registering it on first use.
    pub fn resolve(&self, class: &ClassName) -> Result<Arc<ClassRegistration>, SetupError> {
        if let Some(registration) = self.read().registrations.get(class) {
            return Ok(registration.clone());
        }
        let mut state = self.write();
        if let Some(registration) = state.registrations.get(class) {
            return Ok(registration.clone());
        }
        let registration = Arc::new(self.build(&mut state, class)?);
        debug!(class = %class, source = ?registration.source(), "class resolved");
        state.registrations.insert(class.clone(), registration.clone());
        Ok(registration)
    }

    fn build(&self, state: &mut State, class: &ClassName) -> Result<ClassRegistration, SetupError> {
        let separator = state.separator.unwrap_or_default();
        let unknown = || SetupError::UnknownClass(class.canonical());

        if let Some(explicit) = state.explicit.get(class) {
            let base = state
                .namespaces
                .iter()
                .find(|ns| class.is_in_namespace(&ns.prefix.canonical()))
                .map(|ns| ns.options.clone())
                .unwrap_or_default();
            let definition = self.catalog.find(class)?.ok_or_else(unknown)?;
            return ClassRegistration::new(
                class.clone(),
                ClassSource::Explicit,
                definition,
                base.merge(explicit.clone()),
                separator,
            );
        }

        for ns in &state.namespaces {
            if !class.is_in_namespace(&ns.prefix.canonical()) {
                continue;
            }
            if let Some(definition) = self.find_in_namespace(ns, class)? {
                return ClassRegistration::new(
                    class.clone(),
                    ClassSource::Namespace(ns.prefix.canonical()),
                    definition,
                    ns.options.clone(),
                    separator,
                );
            }
        }

        if state.discovered.is_none() {
            state.discovered = Some(self.scan(&state.directories)?);
            state.scans += 1;
        }
        if let Some(found) = state.discovered.as_ref().and_then(|d| d.get(class)) {
            let definition = match self.catalog.find_in_file(&found.relative, class.short_name()) {
                Some(definition) => definition,
                None => self.catalog.find(class)?.ok_or_else(unknown)?,
            };
            return ClassRegistration::new(
                class.clone(),
                ClassSource::Directory(found.root.clone()),
                definition,
                found.options.clone(),
                separator,
            );
        }

        Err(unknown())
    }

    fn find_in_namespace(
        &self,
        ns: &NamespaceSource,
        class: &ClassName,
    ) -> Result<Option<Arc<ClassDefinition>>, SetupError> {
        let Some(directory) = &ns.directory else {
            return self.catalog.find(class);
        };
        let relative = class_file(&ns.prefix, class);
        if !directory.join(&relative).is_file() {
            return Ok(None);
        }
        match self.catalog.find_in_file(&relative, class.short_name()) {
            Some(definition) => Ok(Some(definition)),
            None => self.catalog.find(class),
        }
    }

    fn scan(&self, directories: &[DirectorySource]) -> Result<BTreeMap<ClassName, Discovered>, SetupError> {
        let mut discovered = BTreeMap::new();
        for source in directories {
            for class in scan_directory(&source.root, None)? {
                discovered.entry(class.name).or_insert_with(|| Discovered {
                    root: source.root.clone(),
                    relative: class.relative,
                    options: source.options.clone(),
                });
            }
        }
        info!(classes = discovered.len(), "directories scanned");
        Ok(discovered)
    }

    /// Every class the registry can resolve, for client export.
    ///
    /// Forces the directory scan and scans namespace directories.
    pub fn classes(&self) -> Result<Vec<Arc<ClassRegistration>>, SetupError> {
        let names: BTreeSet<ClassName> = {
            let mut state = self.write();
            if state.discovered.is_none() {
                state.discovered = Some(self.scan(&state.directories)?);
                state.scans += 1;
            }
            let mut names: BTreeSet<ClassName> = state.explicit.keys().cloned().collect();
            names.extend(state.registrations.keys().cloned());
            if let Some(discovered) = &state.discovered {
                names.extend(discovered.keys().cloned());
            }
            for ns in &state.namespaces {
                if let Some(directory) = &ns.directory {
                    for class in scan_directory(directory, Some(&ns.prefix))? {
                        names.insert(class.name);
                    }
                }
            }
            names
        };
        names.iter().map(|name| self.resolve(name)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domwire_core::{Callable, Injector, MethodTable};
    use serde_json::json;
    use std::path::Path;

    macro_rules! sample_class {
        ($ty:ident) => {
            struct $ty;

            impl Callable for $ty {
                fn class_name() -> &'static str {
                    stringify!($ty)
                }

                fn method_table() -> MethodTable<Self> {
                    MethodTable::new().public("run", |_, _| Ok(None))
                }

                fn construct(_injector: &Injector<'_>) -> Result<Self, SetupError> {
                    Ok($ty)
                }
            }
        };
    }

    sample_class!(Sample);
    sample_class!(UserList);

    fn fixtures() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ajax")
    }

    fn registry() -> CallableRegistry {
        let catalog = ClassCatalog::new();
        catalog.add_from_file::<Sample>("src/ajax/sample.rs");
        catalog.add_from_file::<UserList>("src/ajax/admin/user_list.rs");
        CallableRegistry::new(catalog)
    }

    #[test]
    fn test_explicit_registration_is_idempotent() {
        let registry = registry();
        registry.register_class("Sample", &json!({"protected": "run"})).unwrap();
        registry.register_class("Sample", &json!(null)).unwrap();

        let class = ClassName::parse("Sample").unwrap();
        let first = registry.resolve(&class).unwrap();
        let second = registry.resolve(&class).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.source(), &ClassSource::Explicit);
        assert!(!first.is_callable("run"));
        assert_eq!(registry.scan_count(), 0);
    }

    #[test]
    fn test_directory_discovery_scans_once() {
        let registry = registry();
        registry.register_directory(fixtures(), &json!(null)).unwrap();

        let users = registry.resolve_client("Admin.UserList").unwrap();
        assert_eq!(users.definition().class_name(), "UserList");
        assert!(matches!(users.source(), ClassSource::Directory(_)));
        registry.resolve_client("Sample").unwrap();
        assert_eq!(registry.scan_count(), 1);

        let err = registry
            .resolve(&ClassName::parse("Missing").unwrap())
            .unwrap_err();
        assert_eq!(err, SetupError::UnknownClass("Missing".into()));
        assert_eq!(registry.scan_count(), 1);
    }

    #[test]
    fn test_namespace_lookup() {
        let registry = registry();
        registry
            .register_namespace("App", Some(fixtures()), &json!({"separator": "_"}))
            .unwrap();

        let users = registry.resolve_client("App_Admin_UserList").unwrap();
        assert_eq!(users.js_name(), "App_Admin_UserList");
        assert_eq!(users.source(), &ClassSource::Namespace("App".into()));

        // Not in the namespace directory.
        let err = registry.resolve(&ClassName::parse("App::Nope").unwrap()).unwrap_err();
        assert_eq!(err, SetupError::UnknownClass("App::Nope".into()));
    }

    #[test]
    fn test_separator_is_fixed_once_set() {
        let registry = registry();
        assert!(registry.set_separator(Separator::Underscore));
        assert!(registry.set_separator(Separator::Underscore));
        assert!(!registry.set_separator(Separator::Dot));
        assert_eq!(registry.separator(), Separator::Underscore);
    }

    #[test]
    fn test_classes_lists_every_source() {
        let registry = registry();
        registry.register_directory(fixtures(), &json!(null)).unwrap();
        let names: Vec<String> = registry
            .classes()
            .unwrap()
            .iter()
            .map(|c| c.name().canonical())
            .collect();
        assert_eq!(names, ["Admin::UserList", "Sample"]);
    }
}
