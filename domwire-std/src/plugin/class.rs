//! Dispatch to methods of registered classes.

use super::RequestPlugin;
use crate::{decoder::IncomingCall, registry::CallableRegistry, scope::RequestScope};
use domwire_core::{BoxError, Error, RequestError, Response, Target};
use std::sync::Arc;
use tracing::debug;

/// Dispatches `Class.method` calls through the callable registry.
///
/// The instance of the class is constructed on first use in the request and
/// reused by later calls to the same class. What the method wrote into its
/// class-scoped response is moved into the global response before the
/// returned response, if any, is handed back.
#[derive(Debug, Clone)]
pub struct ClassPlugin {
    registry: Arc<CallableRegistry>,
}

impl ClassPlugin {
    /// Create a plugin over `registry`.
    pub fn new(registry: Arc<CallableRegistry>) -> Self {
        Self { registry }
    }
}

impl RequestPlugin for ClassPlugin {
    fn can_process_request(&self, call: &IncomingCall) -> bool {
        call.is_method_call()
    }

    fn resolve_target(&self, call: &IncomingCall) -> Result<Target, Error> {
        Ok(call.to_target()?)
    }

    fn process_request(
        &self,
        target: &Target,
        scope: &RequestScope<'_>,
    ) -> Result<Option<Response>, Error> {
        let Target::Method {
            class,
            method,
            args,
        } = target
        else {
            return Err(RequestError::MalformedCall(format!("`{target}` is not a method")).into());
        };
        let registration = self.registry.resolve(class)?;
        if !registration.is_callable(method) {
            return Err(RequestError::UnknownMethod {
                class: registration.js_name().to_string(),
                method: method.clone(),
            }
            .into());
        }

        let object = scope.instance(&registration)?;
        let mut object = object.try_borrow_mut().map_err(|err| {
            Error::Invocation(BoxError::from(format!(
                "`{}` is already executing: {err}",
                registration.js_name()
            )))
        })?;
        object.inject_method(scope.container(), method)?;
        debug!(class = %class, method = %method, "calling method");
        let result = object.call(method, args.clone());

        // Also on failure, so the error command ends up after it.
        let written = object.response_handle().take();
        if !written.is_empty() {
            scope.manager().append(written);
        }
        result
    }
}
