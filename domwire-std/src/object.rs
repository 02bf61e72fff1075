//! Callable objects.
//!
//! A [`CallableObject`] is one constructed instance of a registered class,
//! together with its registration and the [`Context`] attached to it.
//!
//! # Invocation Order
//!
//! [`CallableObject::call`] runs, synchronously:
//!
//! 1. the before-hooks of the method, with their configured arguments,
//! 2. the method itself, with the decoded call arguments,
//! 3. the after-hooks of the method,
//!
//! and returns what the method returned. Hooks are looked up by exact method
//! name, falling back to the `*` entry. They bypass visibility, so protected
//! methods make good hooks. Their return values are ignored.

use crate::{callbacks::CallbackManager, container::Container, registry::ClassRegistration};
use domwire_core::{
    AnyCallable, Args, Context, Error, HookCall, Injector, RequestError, Response,
    ResponseHandle, SetupError,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// A constructed instance of a registered class.
pub struct CallableObject {
    registration: Arc<ClassRegistration>,
    instance: Box<dyn AnyCallable>,
    context: Context,
}

impl std::fmt::Debug for CallableObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallableObject")
            .field("class", self.registration.name())
            .field("type", &self.instance.type_name())
            .finish_non_exhaustive()
    }
}

impl CallableObject {
    /// Construct an instance of `registration`.
    ///
    /// Constructor parameters are resolved from `container`. The instance then
    /// receives `context`, the init callbacks run, and the class-level
    /// injections are stored in the context.
    pub fn construct(
        registration: Arc<ClassRegistration>,
        container: &Container,
        context: Context,
        callbacks: &CallbackManager,
    ) -> Result<Self, Error> {
        let class = registration.name().canonical();
        let injector = Injector::new(container, &class);
        let mut instance = registration.definition().construct(&injector)?;
        instance.attach_context(context.clone());
        callbacks.on_init(instance.as_mut(), &context)?;
        for (attr, key) in registration.class_di() {
            context.inject(attr.clone(), container.require(key)?);
        }
        debug!(class = %class, "instance constructed");
        Ok(Self {
            registration,
            instance,
            context,
        })
    }

    /// The class registration.
    pub fn registration(&self) -> &Arc<ClassRegistration> {
        &self.registration
    }

    /// The attached context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The class-scoped response buffer.
    pub fn response_handle(&self) -> &ResponseHandle {
        self.context.response_handle()
    }

    /// Borrow the instance as its concrete type.
    pub fn instance<T: 'static>(&self) -> Option<&T> {
        self.instance.as_any().downcast_ref()
    }

    /// Mutably borrow the instance as its concrete type.
    pub fn instance_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.instance.as_any_mut().downcast_mut()
    }

    /// Returns `true` if the client may call `method`.
    pub fn has_method(&self, method: &str) -> bool {
        self.registration.is_callable(method)
    }

    /// Apply the injections configured for `method`.
    pub fn inject_method(&self, container: &Container, method: &str) -> Result<(), SetupError> {
        for (attr, key) in &self.registration.method_options(method).di {
            self.context.inject(attr.clone(), container.require(key)?);
        }
        Ok(())
    }

    /// Call `method` from the client, with its hooks.
    ///
    /// A method the client may not call fails before any hook runs.
    pub fn call(&mut self, method: &str, args: Vec<Value>) -> Result<Option<Response>, Error> {
        if !self.has_method(method) {
            return Err(RequestError::UnknownMethod {
                class: self.registration.js_name().to_string(),
                method: method.to_string(),
            }
            .into());
        }
        let before = self.registration.before_hooks(method);
        let after = self.registration.after_hooks(method);

        self.run_hooks(&before)?;
        let result = self.invoke(method, args)?;
        self.run_hooks(&after)?;
        Ok(result)
    }

    /// Hook arguments come from the class options, so a mismatch is a setup
    /// error rather than an invalid request.
    fn run_hooks(&mut self, hooks: &[HookCall]) -> Result<(), Error> {
        for hook in hooks {
            self.invoke(&hook.method, hook.args.clone())
                .map_err(|err| match err {
                    Error::Request(RequestError::InvalidArgument { reason, .. }) => {
                        SetupError::HookArguments {
                            class: self.registration.name().canonical(),
                            method: hook.method.clone(),
                            reason,
                        }
                        .into()
                    }
                    other => other,
                })?;
        }
        Ok(())
    }

    /// Invoke `method` directly, bypassing visibility and hooks.
    pub fn invoke(&mut self, method: &str, args: Vec<Value>) -> Result<Option<Response>, Error> {
        let registration = self.registration.clone();
        let entry = registration
            .definition()
            .method(method)
            .ok_or_else(|| SetupError::UnknownHookMethod {
                class: registration.name().canonical(),
                method: method.to_string(),
            })?;
        debug!(class = %registration.name(), method, "invoking method");
        entry
            .invoke(self.instance.as_mut(), Args::new(args))
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{options::ClassOptions, registry::ClassSource, testing::CallRecorder};
    use domwire_core::{
        Callable, ClassDefinition, ClassName, ComponentExt, HasContext, MethodTable, Separator,
    };
    use serde_json::json;

    struct Traced {
        ctx: Context,
        calls: CallRecorder,
    }

    impl HasContext for Traced {
        fn context(&self) -> &Context {
            &self.ctx
        }
    }

    fn hook_a(this: &mut Traced, args: Args) -> Result<Option<Response>, domwire_core::BoxError> {
        let arg = args.get(0).map(ToString::to_string).unwrap_or_default();
        this.calls.record(format!("a{arg}"));
        Ok(None)
    }

    fn hook_b(this: &mut Traced, _: Args) -> Result<Option<Response>, domwire_core::BoxError> {
        this.calls.record("b");
        Ok(None)
    }

    fn hook_c(this: &mut Traced, _: Args) -> Result<Option<Response>, domwire_core::BoxError> {
        this.calls.record("c");
        Ok(None)
    }

    fn hook_d(this: &mut Traced, mut args: Args) -> Result<Option<Response>, domwire_core::BoxError> {
        let level: i64 = args.take(0, "level")?;
        this.calls.record(format!("d{level}"));
        Ok(None)
    }

    fn target(this: &mut Traced, _: Args) -> Result<Option<Response>, domwire_core::BoxError> {
        this.calls.record("m");
        this.response().html("out", "done");
        Ok(Some(Response::new()))
    }

    impl Callable for Traced {
        fn class_name() -> &'static str {
            "Traced"
        }

        fn method_table() -> MethodTable<Self> {
            MethodTable::new()
                .protected("a", hook_a)
                .protected("b", hook_b)
                .protected("c", hook_c)
                .protected("d", hook_d)
                .public("m", target)
        }

        fn construct(injector: &Injector<'_>) -> Result<Self, SetupError> {
            Ok(Traced {
                ctx: Context::detached(),
                calls: injector.param("calls")?,
            })
        }

        fn attach(&mut self, context: Context) {
            self.ctx = context;
        }
    }

    fn object(options: Value, recorder: &CallRecorder) -> (CallableObject, Container) {
        let registration = ClassRegistration::new(
            ClassName::parse("Traced").unwrap(),
            ClassSource::Explicit,
            Arc::new(ClassDefinition::of::<Traced>()),
            ClassOptions::from_value("Traced", &options).unwrap(),
            Separator::Dot,
        )
        .unwrap();
        let container = Container::new();
        container.set("$calls", recorder.clone());
        container.set("$clock", 42u64);
        let object = CallableObject::construct(
            Arc::new(registration),
            &container,
            Context::detached(),
            &CallbackManager::new(),
        )
        .unwrap();
        (object, container)
    }

    #[test]
    fn test_hook_order() {
        let recorder = CallRecorder::new();
        let (mut obj, _) = object(
            json!({"functions": {"m": {"__before": {"a": [1], "b": null}, "__after": "c"}}}),
            &recorder,
        );
        let result = obj.call("m", vec![]).unwrap();
        assert!(result.is_some());
        assert_eq!(recorder.calls(), ["a1", "b", "m", "c"]);
        assert_eq!(obj.response_handle().snapshot().len(), 1);
    }

    #[test]
    fn test_protected_method_is_rejected_before_hooks() {
        let recorder = CallRecorder::new();
        let (mut obj, _) = object(json!({"functions": {"*": {"__before": "b"}}}), &recorder);
        let err = obj.call("a", vec![]).unwrap_err();
        assert!(matches!(
            err,
            Error::Request(RequestError::UnknownMethod { .. })
        ));
        assert!(recorder.calls().is_empty());

        // Still usable as a hook.
        obj.call("m", vec![]).unwrap();
        assert_eq!(recorder.calls(), ["b", "m"]);
    }

    #[test]
    fn test_injections() {
        let recorder = CallRecorder::new();
        let (obj, container) = object(
            json!({"__di": {"clock": "$clock"}, "functions": {"m": {"__di": {"again": "$clock"}}}}),
            &recorder,
        );
        assert_eq!(obj.context().injected::<u64>("clock"), Some(42));
        assert_eq!(obj.context().injected::<u64>("again"), None);

        obj.inject_method(&container, "m").unwrap();
        assert_eq!(obj.context().injected::<u64>("again"), Some(42));
        assert!(obj.instance::<Traced>().is_some());
    }

    #[test]
    fn test_bad_hook_arguments_are_a_setup_error() {
        let recorder = CallRecorder::new();
        let (mut obj, _) = object(
            json!({"functions": {"m": {"__before": {"d": ["high"]}}}}),
            &recorder,
        );
        let err = obj.call("m", vec![]).unwrap_err();
        assert!(matches!(
            err,
            Error::Setup(SetupError::HookArguments { ref method, .. }) if method == "d"
        ));
        assert!(recorder.calls().is_empty());

        let (mut obj, _) = object(json!({"functions": {"m": {"__before": {"d": [2]}}}}), &recorder);
        obj.call("m", vec![]).unwrap();
        assert_eq!(recorder.calls(), ["d2", "m"]);
    }
}
