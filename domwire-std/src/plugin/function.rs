//! Registered functions.
//!
//! A function is a closure callable from the client by name. It receives a
//! [`Context`] writing straight into the global response, and the decoded
//! call arguments.
//!
//! ```rust,ignore
//! app.register_function("greet", |ctx: &Context, mut args: Args| -> Result<(), RequestError> {
//!     let name: String = args.take(0, "name")?;
//!     ctx.response().html("greeting", format!("Hello {name}"));
//!     Ok(())
//! }, &json!(null))?;
//! ```

use super::RequestPlugin;
use crate::{decoder::IncomingCall, scope::RequestScope};
use domwire_core::{
    Args, BoxError, Context, Error, IntoCallResult, RequestError, Response, SetupError, Target,
    is_identifier,
};
use serde_json::{Map, Value};
use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::{debug, info};

type FunctionFn = Arc<dyn Fn(&Context, Args) -> Result<Option<Response>, BoxError> + Send + Sync>;

/// Options of a registered function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionOptions {
    /// Client-side name, when it differs from the server name.
    pub alias: Option<String>,
    /// Opaque options for client code generation.
    pub client: Map<String, Value>,
}

impl FunctionOptions {
    /// Parse options for function `target`. `null` means no options.
    pub fn from_value(target: &str, value: &Value) -> Result<Self, SetupError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => {
                return Err(SetupError::InvalidOptions {
                    target: target.to_string(),
                    reason: "options must be an object".to_string(),
                });
            }
        };
        let mut options = FunctionOptions::default();
        for (key, value) in map {
            if key == "alias" {
                let alias = value.as_str().filter(|a| is_identifier(a)).ok_or_else(|| {
                    SetupError::InvalidOptions {
                        target: target.to_string(),
                        reason: "`alias` must be an identifier".to_string(),
                    }
                })?;
                options.alias = Some(alias.to_string());
            } else {
                options.client.insert(key.clone(), value.clone());
            }
        }
        Ok(options)
    }
}

/// A function callable from the client.
pub struct RegisteredFunction {
    name: String,
    options: FunctionOptions,
    call: FunctionFn,
}

impl RegisteredFunction {
    /// The server-side name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The client-side name.
    pub fn js_name(&self) -> &str {
        self.options.alias.as_deref().unwrap_or(&self.name)
    }

    /// The function options.
    pub fn options(&self) -> &FunctionOptions {
        &self.options
    }

    /// Call the function.
    pub fn call(&self, context: &Context, args: Args) -> Result<Option<Response>, Error> {
        (self.call)(context, args).map_err(Error::from)
    }
}

impl fmt::Debug for RegisteredFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredFunction")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Functions by name.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: RwLock<BTreeMap<String, Arc<RegisteredFunction>>>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` under `name`, replacing any previous one.
    pub fn register<F, R>(&self, name: &str, function: F, options: &Value) -> Result<(), SetupError>
    where
        F: Fn(&Context, Args) -> R + Send + Sync + 'static,
        R: IntoCallResult,
    {
        if !is_identifier(name) {
            return Err(SetupError::InvalidName(name.to_string()));
        }
        let options = FunctionOptions::from_value(name, options)?;
        let call: FunctionFn = Arc::new(move |ctx, args| function(ctx, args).into_call_result());
        let registered = RegisteredFunction {
            name: name.to_string(),
            options,
            call,
        };
        info!(function = name, "function registered");
        self.functions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::new(registered));
        Ok(())
    }

    /// Look up a function by server-side or client-side name.
    pub fn get(&self, name: &str) -> Option<Arc<RegisteredFunction>> {
        let functions = self.functions.read().unwrap_or_else(PoisonError::into_inner);
        functions
            .get(name)
            .or_else(|| functions.values().find(|f| f.js_name() == name))
            .cloned()
    }

    /// Every registered function, by name.
    pub fn list(&self) -> Vec<Arc<RegisteredFunction>> {
        self.functions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

/// Dispatches calls without a class to registered functions.
#[derive(Debug, Clone)]
pub struct FunctionPlugin {
    functions: Arc<FunctionRegistry>,
}

impl FunctionPlugin {
    /// Create a plugin over `functions`.
    pub fn new(functions: Arc<FunctionRegistry>) -> Self {
        Self { functions }
    }
}

impl RequestPlugin for FunctionPlugin {
    fn can_process_request(&self, call: &IncomingCall) -> bool {
        !call.is_method_call()
    }

    fn resolve_target(&self, call: &IncomingCall) -> Result<Target, Error> {
        Ok(call.to_target()?)
    }

    fn process_request(
        &self,
        target: &Target,
        scope: &RequestScope<'_>,
    ) -> Result<Option<Response>, Error> {
        let name = target
            .function_name()
            .ok_or_else(|| RequestError::MalformedCall(format!("`{target}` is not a function")))?;
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| RequestError::UnknownFunction(name.to_string()))?;
        debug!(function = name, "calling function");
        function.call(&scope.context(), Args::new(target.args().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_lookup() {
        let registry = FunctionRegistry::new();
        registry
            .register("greet", |_: &Context, _: Args| (), &json!({"alias": "hello", "mode": "sync"}))
            .unwrap();

        let function = registry.get("greet").unwrap();
        assert_eq!(function.js_name(), "hello");
        assert_eq!(function.options().client.get("mode"), Some(&json!("sync")));
        assert!(registry.get("hello").is_some());
        assert!(registry.get("other").is_none());
    }

    #[test]
    fn test_invalid_registration() {
        let registry = FunctionRegistry::new();
        let noop = |_: &Context, _: Args| ();
        assert!(registry.register("9lives", noop, &Value::Null).is_err());
        assert!(registry.register("ok", noop, &json!({"alias": "no way"})).is_err());
        assert!(registry.register("ok", noop, &json!([1])).is_err());
    }

    #[test]
    fn test_call_converts_arguments() {
        let registry = FunctionRegistry::new();
        registry
            .register(
                "greet",
                |ctx: &Context, mut args: Args| -> Result<(), RequestError> {
                    let name: String = args.take(0, "name")?;
                    ctx.response().html("greeting", format!("Hello {name}"));
                    Ok(())
                },
                &Value::Null,
            )
            .unwrap();

        let ctx = Context::detached();
        let function = registry.get("greet").unwrap();
        function.call(&ctx, Args::new(vec![json!("World")])).unwrap();
        assert_eq!(ctx.response_handle().snapshot().len(), 1);

        let err = function.call(&ctx, Args::new(vec![json!(3)])).unwrap_err();
        assert!(matches!(err, Error::Request(RequestError::InvalidArgument { .. })));
    }
}
