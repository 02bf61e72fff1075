//! Class catalog.
//!
//! The catalog maps names to [`ClassDefinition`]s. It is filled from two
//! sources:
//!
//! - entries submitted at compile time with `inventory` (the `#[callable]`
//!   macro submits one [`CatalogEntry`] per annotated `impl` block),
//! - definitions added at runtime with [`ClassCatalog::add`].
//!
//! Entries remember their full type path and, when known, the source file
//! that defines them, which is how directory discovery finds the type behind
//! a scanned file.

use domwire_core::{Callable, ClassDefinition, ClassName, SetupError};
use std::{
    path::Path,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::debug;

/// A class submitted to the catalog at compile time.
pub struct CatalogEntry {
    path: &'static str,
    file: &'static str,
    definition: fn() -> ClassDefinition,
}

impl CatalogEntry {
    /// Create an entry. Usable in `inventory::submit!`.
    pub const fn new(path: &'static str, file: &'static str, definition: fn() -> ClassDefinition) -> Self {
        Self {
            path,
            file,
            definition,
        }
    }
}

inventory::collect!(CatalogEntry);

#[derive(Debug)]
struct Record {
    segments: Vec<String>,
    file: Option<String>,
    definition: Arc<ClassDefinition>,
}

impl Record {
    fn path(&self) -> String {
        self.segments.join("::")
    }

    fn short_name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    fn matches(&self, class: &ClassName) -> bool {
        let wanted = class.segments();
        if wanted.len() > self.segments.len() {
            return false;
        }
        let tail = &self.segments[self.segments.len() - wanted.len()..];
        if tail == wanted {
            return true;
        }
        // `App::Admin::Users` also matches the module path `app::admin::Users`.
        if self.short_name() != class.short_name() {
            return false;
        }
        let modules = &tail[..tail.len() - 1];
        let namespace = &wanted[..wanted.len() - 1];
        modules
            .iter()
            .zip(namespace)
            .all(|(module, segment)| *module == to_snake_case(segment))
    }
}

/// Convert `user_list` to `UserList`.
pub fn to_camel_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Convert `UserList` to `user_list`.
pub fn to_snake_case(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    for (i, c) in camel.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn normalize_file(file: &str) -> String {
    file.replace('\\', "/")
}

/// Known callable classes.
#[derive(Debug, Default)]
pub struct ClassCatalog {
    records: RwLock<Vec<Record>>,
}

impl ClassCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding every entry submitted with `inventory`.
    pub fn collected() -> Self {
        let catalog = Self::new();
        for entry in inventory::iter::<CatalogEntry> {
            catalog.push(entry.path, Some(entry.file), (entry.definition)());
        }
        debug!(count = catalog.len(), "class catalog collected");
        catalog
    }

    fn push(&self, path: &str, file: Option<&str>, definition: ClassDefinition) {
        let record = Record {
            segments: path.split("::").map(str::to_string).collect(),
            file: file.filter(|f| !f.is_empty()).map(normalize_file),
            definition: Arc::new(definition),
        };
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.retain(|r| r.segments != record.segments);
        records.push(record);
    }

    /// Add `T` under its Rust type path.
    pub fn add<T: Callable>(&self) {
        self.push(std::any::type_name::<T>(), None, ClassDefinition::of::<T>());
    }

    /// Add `T` as defined in `file`, for directory discovery.
    pub fn add_from_file<T: Callable>(&self, file: &str) {
        self.push(std::any::type_name::<T>(), Some(file), ClassDefinition::of::<T>());
    }

    /// Add a definition under an explicit path.
    pub fn add_definition(&self, path: &str, definition: ClassDefinition) {
        self.push(path, None, definition);
    }

    /// The number of known classes.
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no class is known.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the definition of `class`.
    ///
    /// A class matches a record when its segments end the record's type path,
    /// either verbatim or with the namespace written as snake_case modules.
    pub fn find(&self, class: &ClassName) -> Result<Option<Arc<ClassDefinition>>, SetupError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let matches: Vec<&Record> = records.iter().filter(|r| r.matches(class)).collect();
        match matches.as_slice() {
            [] => Ok(None),
            [record] => Ok(Some(record.definition.clone())),
            several => {
                // A verbatim full-path match is never ambiguous.
                if let Some(exact) = several.iter().find(|r| r.segments == class.segments()) {
                    return Ok(Some(exact.definition.clone()));
                }
                Err(SetupError::AmbiguousClass {
                    class: class.canonical(),
                    candidates: several.iter().map(|r| r.path()).collect(),
                })
            }
        }
    }

    /// Find the type `type_name` defined in a file ending with `relative`.
    pub fn find_in_file(&self, relative: &Path, type_name: &str) -> Option<Arc<ClassDefinition>> {
        let relative = normalize_file(&relative.to_string_lossy());
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .find(|r| {
                r.short_name() == type_name
                    && r.file.as_deref().is_some_and(|file| {
                        file == relative || file.ends_with(&format!("/{relative}"))
                    })
            })
            .map(|r| r.definition.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domwire_core::{Injector, MethodTable};

    struct Users;

    impl Callable for Users {
        fn class_name() -> &'static str {
            "Users"
        }

        fn method_table() -> MethodTable<Self> {
            MethodTable::new().public("list", |_, _| Ok(None))
        }

        fn construct(_injector: &Injector<'_>) -> Result<Self, SetupError> {
            Ok(Users)
        }
    }

    fn def() -> ClassDefinition {
        ClassDefinition::of::<Users>()
    }

    #[test]
    fn test_case_conversions() {
        assert_eq!(to_camel_case("user_list"), "UserList");
        assert_eq!(to_camel_case("sample"), "Sample");
        assert_eq!(to_snake_case("UserList"), "user_list");
        assert_eq!(to_snake_case("Admin"), "admin");
    }

    #[test]
    fn test_find_by_suffix() {
        let catalog = ClassCatalog::new();
        catalog.add_definition("my_app::app::admin::Users", def());

        let by_short = ClassName::parse("Users").unwrap();
        let by_module = ClassName::parse("App::Admin::Users").unwrap();
        let other = ClassName::parse("Other::Users").unwrap();
        assert!(catalog.find(&by_short).unwrap().is_some());
        assert!(catalog.find(&by_module).unwrap().is_some());
        assert!(catalog.find(&other).unwrap().is_none());
    }

    #[test]
    fn test_ambiguous_short_name() {
        let catalog = ClassCatalog::new();
        catalog.add_definition("a::Users", def());
        catalog.add_definition("b::Users", def());
        let err = catalog.find(&ClassName::parse("Users").unwrap()).unwrap_err();
        assert!(matches!(err, SetupError::AmbiguousClass { .. }));
        assert!(catalog.find(&ClassName::parse("a::Users").unwrap()).unwrap().is_some());
    }

    #[test]
    fn test_find_in_file() {
        let catalog = ClassCatalog::new();
        catalog.add_from_file::<Users>("src\\ajax\\admin\\users.rs");
        let found = catalog.find_in_file(Path::new("admin/users.rs"), "Users");
        assert!(found.is_some());
        assert!(catalog.find_in_file(Path::new("users.rs"), "Other").is_none());
        assert!(catalog.find_in_file(Path::new("sers.rs"), "Users").is_none());
    }
}
