//! # Framework Context
//!
//! Every callable instance receives a [`Context`] when it is constructed. The
//! context carries the framework collaborators (logger, view renderer, session,
//! translator), the response buffer scoped to the instance's class, the data
//! bags and uploaded files of the current request, and the values injected from
//! the DI container by class-level and method-level `__di` options.
//!
//! Contexts are request-scoped and cheap to clone: clones share the same
//! buffers, so the framework can keep adding injections after the instance
//! stored its copy.
//!
//! # Example
//!
//! ```rust,ignore
//! #[derive(Default)]
//! struct Sample {
//!     ctx: Context,
//! }
//!
//! #[callable(context = ctx)]
//! impl Sample {
//!     pub fn hello(&mut self, name: String) {
//!         self.ctx.response().html("greeting", format!("Hello {name}"));
//!     }
//! }
//! ```

use crate::{
    databag::DataBags,
    error::BoxError,
    name::ClassName,
    request::UploadedFile,
    response::{NodeResponse, Response, ResponseHandle},
    services::{LogLevel, Services, SessionStore},
};
use serde_json::{Map, Value};
use std::{
    any::Any,
    cell::{RefCell, RefMut},
    collections::HashMap,
    rc::Rc,
    sync::Arc,
};

/// A type-erased value held by the DI container.
pub type Shared = Arc<dyn Any + Send + Sync>;

/// Framework collaborators attached to one callable instance.
#[derive(Clone, Debug)]
pub struct Context {
    class: Option<ClassName>,
    response: ResponseHandle,
    services: Services,
    bags: Rc<RefCell<DataBags>>,
    files: Rc<[UploadedFile]>,
    injections: Rc<RefCell<HashMap<String, SharedDebug>>>,
}

// `dyn Any` has no useful Debug output; only the fact that a value exists matters.
#[derive(Clone)]
struct SharedDebug(Shared);

impl std::fmt::Debug for SharedDebug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Shared(..)")
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::detached()
    }
}

impl Context {
    /// A context not bound to any request, backed by null services.
    ///
    /// Useful as the initial value of a context field before the framework
    /// attaches the real one, and in unit tests.
    pub fn detached() -> Self {
        Self::new(ResponseHandle::new(), Services::detached())
    }

    /// Create a context writing into `response`.
    pub fn new(response: ResponseHandle, services: Services) -> Self {
        Self {
            class: None,
            response,
            services,
            bags: Rc::default(),
            files: Rc::from(Vec::new()),
            injections: Rc::default(),
        }
    }

    /// Bind the context to a class.
    pub fn with_class(mut self, class: ClassName) -> Self {
        self.class = Some(class);
        self
    }

    /// Share the request's data bags.
    pub fn with_bags(mut self, bags: Rc<RefCell<DataBags>>) -> Self {
        self.bags = bags;
        self
    }

    /// Share the request's uploaded files.
    pub fn with_files(mut self, files: Rc<[UploadedFile]>) -> Self {
        self.files = files;
        self
    }

    /// The class this context belongs to.
    pub fn class(&self) -> Option<&ClassName> {
        self.class.as_ref()
    }

    /// Borrow the class-scoped response buffer.
    pub fn response(&self) -> RefMut<'_, Response> {
        self.response.borrow_mut()
    }

    /// The class-scoped response handle.
    pub fn response_handle(&self) -> &ResponseHandle {
        &self.response
    }

    /// A response targeting the DOM node `id`.
    pub fn node(&self, id: impl Into<String>) -> NodeResponse {
        self.response.node(id)
    }

    /// Render a view.
    pub fn render(&self, view: &str, data: &Map<String, Value>) -> Result<String, BoxError> {
        self.services.view.render(view, data)
    }

    /// The session store.
    pub fn session(&self) -> &dyn SessionStore {
        self.services.session.as_ref()
    }

    /// Write a log record.
    pub fn log(&self, level: LogLevel, message: &str) {
        self.services.logger.log(level, message);
    }

    /// Translate a message key.
    pub fn trans(&self, key: &str, params: &[(&str, String)]) -> String {
        self.services.translator.trans(key, params)
    }

    /// The collaborators.
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// A named data bag.
    pub fn bag(&self, name: &str) -> DataBag {
        DataBag {
            bags: self.bags.clone(),
            name: name.to_string(),
        }
    }

    /// The files uploaded with this request.
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Store an injected value under `name`.
    pub fn inject(&self, name: impl Into<String>, value: Shared) {
        self.injections
            .borrow_mut()
            .insert(name.into(), SharedDebug(value));
    }

    /// Read an injected value.
    ///
    /// Returns `None` if nothing was injected under `name` or if the value has
    /// another type.
    pub fn injected<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        self.injections
            .borrow()
            .get(name)
            .and_then(|v| v.0.downcast_ref::<T>().cloned())
    }
}

/// A handle on one named data bag.
#[derive(Debug, Clone)]
pub struct DataBag {
    bags: Rc<RefCell<DataBags>>,
    name: String,
}

impl DataBag {
    /// Read a value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.bags.borrow().get(&self.name, key).cloned()
    }

    /// Read a value, falling back to `default`.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Write a value.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.bags.borrow_mut().set(&self.name, key, value.into());
    }

    /// Remove every value.
    pub fn clear(&self) {
        self.bags.borrow_mut().clear(&self.name);
    }
}
