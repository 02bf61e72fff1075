//! # Callable Classes
//!
//! A callable class is a server type whose methods can be invoked from the
//! client. Instead of looking methods up by name at call time, every class
//! describes itself once through a [`MethodTable`]: a list of method names,
//! their visibility, and plain function pointers that convert the decoded
//! [`Args`] and run the method.
//!
//! The `#[callable]` attribute macro generates the [`Callable`] implementation
//! from an `impl` block. Implementing the trait by hand is equally supported:
//!
//! ```rust,ignore
//! impl Callable for Sample {
//!     fn class_name() -> &'static str {
//!         "Sample"
//!     }
//!
//!     fn method_table() -> MethodTable<Self> {
//!         MethodTable::new().public("hello", |this, mut args| {
//!             let name: String = args.take(0, "name")?;
//!             this.hello(name).into_call_result()
//!         })
//!     }
//!
//!     fn construct(_injector: &Injector<'_>) -> Result<Self, SetupError> {
//!         Ok(Sample::default())
//!     }
//! }
//! ```
//!
//! # Construction
//!
//! [`Callable::construct`] receives an [`Injector`] that resolves constructor
//! parameters from the DI container by probing, in order, the binding keys
//! `"<type> $<param>"`, `"<type>"` and `"$<param>"`.
//!
//! # Type Erasure
//!
//! Registries store classes as [`ClassDefinition`]s: the method table with
//! each entry wrapped to accept a `&mut dyn AnyCallable`, plus an erased
//! constructor.

use crate::{
    args::Args,
    context::{Context, DataBag, Shared},
    error::{BoxError, SetupError},
    request::UploadedFile,
    response::{NodeResponse, Response},
};
use serde_json::{Map, Value};
use std::{any::Any, cell::RefMut, fmt};

/// Methods whose name starts with this prefix are never exported.
pub const MAGIC_PREFIX: &str = "__";

/// Names provided by the framework helper surface ([`ComponentExt`]).
///
/// A method with one of these names is never callable from the client.
pub const RESERVED_METHODS: &[&str] = &[
    "attach", "context", "response", "node", "render", "session", "bag", "files", "injected",
    "log", "trans",
];

/// Visibility of a method from the client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Callable from the client.
    Public,
    /// Only usable as a before/after hook.
    Protected,
}

/// A typed method entry point.
pub type MethodFn<T> = fn(&mut T, Args) -> Result<Option<Response>, BoxError>;

/// One entry of a [`MethodTable`].
pub struct Method<T> {
    name: &'static str,
    visibility: Visibility,
    call: MethodFn<T>,
}

impl<T> Method<T> {
    /// The method name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The method visibility.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }
}

/// The methods of a callable class, built once per class.
pub struct MethodTable<T> {
    methods: Vec<Method<T>>,
}

impl<T> Default for MethodTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MethodTable<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            methods: Vec::new(),
        }
    }

    /// Add a method.
    ///
    /// A later entry with the same name replaces the earlier one.
    pub fn with(mut self, name: &'static str, visibility: Visibility, call: MethodFn<T>) -> Self {
        self.methods.retain(|m| m.name != name);
        self.methods.push(Method {
            name,
            visibility,
            call,
        });
        self
    }

    /// Add a client-callable method.
    pub fn public(self, name: &'static str, call: MethodFn<T>) -> Self {
        self.with(name, Visibility::Public, call)
    }

    /// Add a method usable only as a hook.
    pub fn protected(self, name: &'static str, call: MethodFn<T>) -> Self {
        self.with(name, Visibility::Protected, call)
    }

    /// The entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Method<T>> {
        self.methods.iter()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if the table has no entry.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

// ============================================================================
// Constructor injection
// ============================================================================

/// Looks up DI bindings by exact key.
pub trait Resolve {
    /// The value bound to `key`, if any.
    fn lookup(&self, key: &str) -> Result<Option<Shared>, SetupError>;
}

/// The keys tried for a constructor parameter, in order.
pub fn binding_keys(ty: &str, param: &str) -> [String; 3] {
    [format!("{ty} ${param}"), ty.to_string(), format!("${param}")]
}

/// Resolves constructor parameters of one class.
pub struct Injector<'a> {
    resolver: &'a dyn Resolve,
    class: &'a str,
}

impl<'a> Injector<'a> {
    /// Create an injector for `class` backed by `resolver`.
    pub fn new(resolver: &'a dyn Resolve, class: &'a str) -> Self {
        Self { resolver, class }
    }

    /// The class being constructed.
    pub fn class(&self) -> &str {
        self.class
    }

    /// Resolve the constructor parameter `name` of type `T`.
    ///
    /// The first matching key wins; a key bound to a value of another type is
    /// an error rather than a reason to keep probing.
    pub fn param<T: Clone + 'static>(&self, name: &str) -> Result<T, SetupError> {
        let ty = std::any::type_name::<T>();
        for key in binding_keys(ty, name) {
            if let Some(value) = self.resolver.lookup(&key)? {
                return value
                    .downcast_ref::<T>()
                    .cloned()
                    .ok_or(SetupError::BindingType { key, expected: ty });
            }
        }
        Err(SetupError::MissingBinding {
            class: self.class.to_string(),
            param: name.to_string(),
            ty,
        })
    }
}

// ============================================================================
// Callable
// ============================================================================

/// A server type whose methods can be called from the client.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a callable class",
    label = "missing `Callable` implementation",
    note = "Annotate the type's `impl` block with `#[callable]` or implement `Callable` by hand."
)]
pub trait Callable: Any + Sized {
    /// The bare type name.
    fn class_name() -> &'static str;

    /// The method table of the class.
    fn method_table() -> MethodTable<Self>;

    /// Build an instance, resolving dependencies through `injector`.
    fn construct(injector: &Injector<'_>) -> Result<Self, SetupError>;

    /// Receive the framework context.
    ///
    /// Called once, right after construction. The default discards it.
    fn attach(&mut self, _context: Context) {}
}

/// Access to the attached [`Context`].
pub trait HasContext {
    /// The attached context.
    fn context(&self) -> &Context;
}

/// Framework helpers available on every type holding a [`Context`].
///
/// The method names are listed in [`RESERVED_METHODS`].
pub trait ComponentExt: HasContext {
    /// Borrow the class-scoped response buffer.
    fn response(&self) -> RefMut<'_, Response> {
        self.context().response()
    }

    /// A response targeting the DOM node `id`.
    fn node(&self, id: impl Into<String>) -> NodeResponse {
        self.context().node(id)
    }

    /// Render a view.
    fn render(&self, view: &str, data: &Map<String, Value>) -> Result<String, BoxError> {
        self.context().render(view, data)
    }

    /// A named data bag.
    fn bag(&self, name: &str) -> DataBag {
        self.context().bag(name)
    }

    /// The files uploaded with this request.
    fn files(&self) -> &[UploadedFile] {
        self.context().files()
    }

    /// Read an injected value.
    fn injected<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        self.context().injected(name)
    }
}

impl<T: HasContext + ?Sized> ComponentExt for T {}

/// Object-safe view of a constructed callable instance.
pub trait AnyCallable: Any {
    /// Hand the framework context to the instance.
    fn attach_context(&mut self, context: Context);

    /// The concrete type name.
    fn type_name(&self) -> &'static str;

    /// Upcast for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for mutable downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Callable> AnyCallable for T {
    fn attach_context(&mut self, context: Context) {
        self.attach(context);
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A type-erased method entry point.
pub type ErasedMethodFn =
    Box<dyn Fn(&mut dyn AnyCallable, Args) -> Result<Option<Response>, BoxError> + Send + Sync>;

/// A method of a [`ClassDefinition`].
pub struct ErasedMethod {
    name: &'static str,
    visibility: Visibility,
    call: ErasedMethodFn,
}

impl ErasedMethod {
    /// The method name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The method visibility.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Run the method on `instance`.
    pub fn invoke(
        &self,
        instance: &mut dyn AnyCallable,
        args: Args,
    ) -> Result<Option<Response>, BoxError> {
        (self.call)(instance, args)
    }
}

impl fmt::Debug for ErasedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedMethod")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

type ErasedConstructor = fn(&Injector<'_>) -> Result<Box<dyn AnyCallable>, SetupError>;

/// A type-erased callable class.
pub struct ClassDefinition {
    type_name: &'static str,
    class_name: &'static str,
    methods: Vec<ErasedMethod>,
    construct: ErasedConstructor,
}

fn construct_erased<T: Callable>(
    injector: &Injector<'_>,
) -> Result<Box<dyn AnyCallable>, SetupError> {
    T::construct(injector).map(|instance| Box::new(instance) as Box<dyn AnyCallable>)
}

impl ClassDefinition {
    /// Erase the callable type `T`.
    pub fn of<T: Callable>() -> Self {
        let methods = T::method_table()
            .methods
            .into_iter()
            .map(|method| {
                let call = method.call;
                let erased: ErasedMethodFn = Box::new(move |instance, args| {
                    let this = instance.as_any_mut().downcast_mut::<T>().ok_or_else(|| {
                        BoxError::from(format!(
                            "instance is not a `{}`",
                            std::any::type_name::<T>()
                        ))
                    })?;
                    call(this, args)
                });
                ErasedMethod {
                    name: method.name,
                    visibility: method.visibility,
                    call: erased,
                }
            })
            .collect();
        Self {
            type_name: std::any::type_name::<T>(),
            class_name: T::class_name(),
            methods,
            construct: construct_erased::<T>,
        }
    }

    /// The full Rust type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The bare class name.
    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    /// Look up a method.
    pub fn method(&self, name: &str) -> Option<&ErasedMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// All methods in declaration order.
    pub fn methods(&self) -> &[ErasedMethod] {
        &self.methods
    }

    /// Build a new instance.
    pub fn construct(&self, injector: &Injector<'_>) -> Result<Box<dyn AnyCallable>, SetupError> {
        (self.construct)(injector)
    }
}

impl fmt::Debug for ClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDefinition")
            .field("type_name", &self.type_name)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}
