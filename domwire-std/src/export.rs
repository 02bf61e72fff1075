//! Client export.
//!
//! Client code generation needs to know what the server exposes: every
//! registered function and every resolvable class with its callable methods,
//! under their client-side names, together with the opaque client options.
//! [`ClientExport`] is that description, ready to serialize.

use crate::{
    plugin::FunctionRegistry,
    registry::{CallableRegistry, ClassRegistration},
};
use domwire_core::{Separator, SetupError};
use serde::Serialize;
use serde_json::{Map, Value};

/// An exported function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedFunction {
    /// The server-side name.
    pub name: String,
    /// The client-side name.
    pub js_name: String,
    /// Options for client code generation.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

/// An exported method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedMethod {
    /// The method name.
    pub name: String,
    /// Options for client code generation, wildcard entry included.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

/// An exported class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedClass {
    /// The canonical name.
    pub name: String,
    /// The client-side name.
    pub js_name: String,
    /// Class-wide options for client code generation.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    /// The callable methods, in declaration order.
    pub methods: Vec<ExportedMethod>,
}

impl ExportedClass {
    fn from_registration(registration: &ClassRegistration) -> Self {
        let methods = registration
            .callable_methods()
            .into_iter()
            .map(|name| ExportedMethod {
                name: name.to_string(),
                options: registration.method_options(name).client,
            })
            .collect();
        Self {
            name: registration.name().canonical(),
            js_name: registration.js_name().to_string(),
            options: registration.options().client.clone(),
            methods,
        }
    }
}

/// What the server exposes to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientExport {
    /// The separator used in client-side class names.
    pub separator: Separator,
    /// Registered functions, by name.
    pub functions: Vec<ExportedFunction>,
    /// Resolvable classes that are not excluded, by canonical name.
    pub classes: Vec<ExportedClass>,
}

impl ClientExport {
    /// Describe `functions` and every class `registry` can resolve.
    ///
    /// This forces directory discovery.
    pub fn collect(
        registry: &CallableRegistry,
        functions: &FunctionRegistry,
    ) -> Result<Self, SetupError> {
        let functions = functions
            .list()
            .iter()
            .map(|f| ExportedFunction {
                name: f.name().to_string(),
                js_name: f.js_name().to_string(),
                options: f.options().client.clone(),
            })
            .collect();
        let classes = registry
            .classes()?
            .iter()
            .filter(|r| !r.options().is_excluded())
            .map(|r| ExportedClass::from_registration(r))
            .collect();
        Ok(Self {
            separator: registry.separator(),
            functions,
            classes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ClassCatalog;
    use domwire_core::{
        Args, BoxError, Callable, Context, Injector, MethodTable, Response,
    };
    use serde_json::json;

    #[derive(Default)]
    struct Sample;

    fn hello(_: &mut Sample, _: Args) -> Result<Option<Response>, BoxError> {
        Ok(None)
    }

    impl Callable for Sample {
        fn class_name() -> &'static str {
            "Sample"
        }

        fn method_table() -> MethodTable<Self> {
            MethodTable::new()
                .public("hello", hello)
                .public("bye", hello)
                .protected("guard", hello)
        }

        fn construct(_injector: &Injector<'_>) -> Result<Self, SetupError> {
            Ok(Sample)
        }
    }

    #[derive(Default)]
    struct Hidden;

    impl Callable for Hidden {
        fn class_name() -> &'static str {
            "Hidden"
        }

        fn method_table() -> MethodTable<Self> {
            MethodTable::new()
        }

        fn construct(_injector: &Injector<'_>) -> Result<Self, SetupError> {
            Ok(Hidden)
        }
    }

    #[test]
    fn test_export_lists_callable_surface() {
        let catalog = ClassCatalog::new();
        catalog.add::<Sample>();
        catalog.add::<Hidden>();
        let registry = CallableRegistry::new(catalog);
        registry
            .register_class(
                "Sample",
                &json!({"functions": {"*": {"mode": "async"}, "bye": {"confirm": true, "__before": "guard"}}}),
            )
            .unwrap();
        registry
            .register_class("Hidden", &json!({"excluded": true}))
            .unwrap();

        let functions = FunctionRegistry::new();
        functions
            .register("ping", |_: &Context, _: Args| (), &json!({"alias": "pong"}))
            .unwrap();

        let export = ClientExport::collect(&registry, &functions).unwrap();
        assert_eq!(export.classes.len(), 1);
        let sample = &export.classes[0];
        assert_eq!(sample.js_name, "Sample");
        let names: Vec<&str> = sample.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["hello", "bye"]);
        assert_eq!(
            Value::Object(sample.methods[1].options.clone()),
            json!({"mode": "async", "confirm": true})
        );

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["functions"][0]["js_name"], "pong");
        assert_eq!(json["separator"], ".");
    }
}
