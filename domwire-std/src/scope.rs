//! Request-scoped state.
//!
//! A [`RequestScope`] lives for the handling of one request. It owns the
//! global response, the data bags and uploaded files of the request, and the
//! callable instances constructed while handling it: at most one per class.

use crate::{
    callbacks::CallbackManager, config::Config, container::Container, manager::ResponseManager,
    object::CallableObject, registry::ClassRegistration,
};
use domwire_core::{
    ClassName, Context, DataBags, Error, Response, ResponseHandle, Services, UploadedFile,
};
use std::{
    cell::{RefCell, RefMut},
    rc::Rc,
    sync::Arc,
};

/// A shared, mutable callable instance.
pub type SharedObject = Rc<RefCell<CallableObject>>;

/// State of the request being handled.
pub struct RequestScope<'a> {
    services: &'a Services,
    container: &'a Container,
    callbacks: &'a CallbackManager,
    manager: ResponseManager,
    bags: Rc<RefCell<DataBags>>,
    files: RefCell<Rc<[UploadedFile]>>,
    instances: RefCell<Vec<(ClassName, SharedObject)>>,
    stray: RefCell<String>,
}

impl std::fmt::Debug for RequestScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScope")
            .field("manager", &self.manager)
            .field("bags", &self.bags)
            .field("instances", &self.instances.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<'a> RequestScope<'a> {
    /// Open a scope.
    pub fn new(
        config: &Config,
        services: &'a Services,
        container: &'a Container,
        callbacks: &'a CallbackManager,
    ) -> Self {
        Self {
            services,
            container,
            callbacks,
            manager: ResponseManager::new(config),
            bags: Rc::default(),
            files: RefCell::new(Rc::from(Vec::new())),
            instances: RefCell::default(),
            stray: RefCell::default(),
        }
    }

    /// The framework collaborators.
    pub fn services(&self) -> &Services {
        self.services
    }

    /// The DI container.
    pub fn container(&self) -> &Container {
        self.container
    }

    /// The lifecycle callbacks.
    pub fn callbacks(&self) -> &CallbackManager {
        self.callbacks
    }

    /// The response manager.
    pub fn manager(&self) -> &ResponseManager {
        &self.manager
    }

    /// Borrow the global response.
    pub fn response(&self) -> RefMut<'_, Response> {
        self.manager.response()
    }

    /// The global response handle.
    pub fn response_handle(&self) -> &ResponseHandle {
        self.manager.handle()
    }

    /// Replace the data bags.
    pub fn set_bags(&self, bags: DataBags) {
        *self.bags.borrow_mut() = bags;
    }

    /// The data bags, shared with every context of this request.
    pub fn bags(&self) -> &Rc<RefCell<DataBags>> {
        &self.bags
    }

    /// Replace the uploaded files.
    pub fn set_files(&self, files: Vec<UploadedFile>) {
        *self.files.borrow_mut() = Rc::from(files);
    }

    /// The uploaded files.
    pub fn files(&self) -> Rc<[UploadedFile]> {
        self.files.borrow().clone()
    }

    /// Record output that is not part of the protocol.
    pub fn write_stray(&self, text: &str) {
        self.stray.borrow_mut().push_str(text);
    }

    /// Take the recorded stray output.
    pub fn take_stray(&self) -> String {
        std::mem::take(&mut *self.stray.borrow_mut())
    }

    /// A context writing into `response`, sharing this request's bags and files.
    pub fn context_for(&self, response: ResponseHandle) -> Context {
        Context::new(response, self.services.clone())
            .with_bags(self.bags.clone())
            .with_files(self.files())
    }

    /// A context writing straight into the global response.
    pub fn context(&self) -> Context {
        self.context_for(self.response_handle().clone())
    }

    /// The instance of `registration`, constructed on first use.
    pub fn instance(&self, registration: &Arc<ClassRegistration>) -> Result<SharedObject, Error> {
        let class = registration.name();
        if let Some((_, object)) = self.instances.borrow().iter().find(|(name, _)| name == class) {
            return Ok(object.clone());
        }
        let context = self
            .context_for(ResponseHandle::new())
            .with_class(class.clone());
        let object = CallableObject::construct(
            registration.clone(),
            self.container,
            context,
            self.callbacks,
        )?;
        let object = Rc::new(RefCell::new(object));
        self.instances
            .borrow_mut()
            .push((class.clone(), object.clone()));
        Ok(object)
    }

    /// Append what every instance wrote to its class-scoped response, in
    /// construction order.
    pub fn flush_instances(&self) {
        let instances = self.instances.borrow();
        for (_, object) in instances.iter() {
            let Ok(object) = object.try_borrow() else {
                continue;
            };
            let response = object.response_handle().take();
            if !response.is_empty() {
                self.manager.append(response);
            }
        }
    }

    /// Close the scope and produce the response to send.
    pub fn finish(&self) -> Response {
        self.flush_instances();
        self.manager.finish(&self.bags.borrow())
    }
}
