//! # Request Handler
//!
//! Runs one request through the pipeline:
//!
//! ```text
//! boot callbacks → decode → find plugin → resolve target → before callbacks
//!     → uploads → process → merge response → after callbacks → serialize
//! ```
//!
//! # Failures
//!
//! Any failure appends a translated error command to the global response,
//! after whatever the call wrote before failing. Invalid requests
//! ([`RequestError`]) then go to the invalid-request callbacks, every other
//! error to the error callbacks. If the matching list is empty the error is
//! returned to the host as a [`HandleError`], which still carries the
//! response holding the error command.

use crate::{app::App, scope::RequestScope};
use domwire_core::{BoxError, Error, LogLevel, Request, RequestError};
use thiserror::Error as ThisError;
use tracing::{debug, info, warn};

/// Content type of every response.
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// What the host sends back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOutput {
    /// The response content type.
    pub content_type: &'static str,
    /// The serialized command array.
    pub body: String,
    /// Stray output captured during the request, unless it was discarded.
    pub stray: Option<String>,
}

/// A request that failed without a callback handling the failure.
#[derive(ThisError, Debug)]
#[error("{error}")]
pub struct HandleError {
    /// The failure.
    #[source]
    pub error: Error,
    /// The response built so far, ending with the error command. `None` if
    /// it could not be serialized.
    pub output: Option<HandlerOutput>,
}

impl From<HandleError> for Error {
    fn from(err: HandleError) -> Self {
        err.error
    }
}

/// Handles requests for an [`App`].
#[derive(Debug, Clone, Copy)]
pub struct RequestHandler<'a> {
    app: &'a App,
}

impl<'a> RequestHandler<'a> {
    /// Create a handler for `app`.
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }

    /// Handle `request`.
    pub fn handle(&self, request: &Request) -> Result<HandlerOutput, HandleError> {
        let app = self.app;
        app.callbacks().on_boot();

        let scope = RequestScope::new(app.config(), app.services(), app.container(), app.callbacks());
        let failure = match self.dispatch(request, &scope) {
            Ok(()) => None,
            Err(err) => {
                scope.flush_instances();
                self.report(err, &scope).err()
            }
        };

        let output = match self.output(&scope) {
            Ok(output) => output,
            Err(error) => {
                return Err(HandleError {
                    error: failure.unwrap_or(error),
                    output: None,
                });
            }
        };
        match failure {
            None => Ok(output),
            Some(error) => Err(HandleError {
                error,
                output: Some(output),
            }),
        }
    }

    fn output(&self, scope: &RequestScope<'_>) -> Result<HandlerOutput, Error> {
        let response = scope.finish();
        let body = response
            .to_json()
            .map_err(|e| Error::Invocation(BoxError::from(e)))?;
        let stray = scope.take_stray();
        let stray = (!self.app.config().clean_buffer && !stray.is_empty()).then_some(stray);
        debug!(commands = response.len(), "response ready");
        Ok(HandlerOutput {
            content_type: CONTENT_TYPE,
            body,
            stray,
        })
    }

    fn dispatch(&self, request: &Request, scope: &RequestScope<'_>) -> Result<(), Error> {
        let app = self.app;
        let call = app.decoder().decode(request)?;
        scope.set_bags(call.bags().clone());

        let entry = app.plugins().find(&call).ok_or(RequestError::Unclaimed)?;
        let target = entry.plugin().resolve_target(&call)?;
        info!(plugin = entry.name(), target = %target, "dispatching request");

        if app.callbacks().on_before(&target, scope)?.is_stop() {
            debug!(target = %target, "request ended by a before callback");
            return Ok(());
        }

        if let Some(upload) = app.upload() {
            if upload.can_process_request(request) {
                scope.set_files(upload.process(request)?);
            }
        }

        if let Some(response) = entry.plugin().process_request(&target, scope)? {
            scope.manager().append(response);
        }

        if app.callbacks().on_after(&target, scope)? {
            debug!(target = %target, "request ended by an after callback");
        }
        Ok(())
    }

    fn report(&self, err: Error, scope: &RequestScope<'_>) -> Result<(), Error> {
        let translator = &scope.services().translator;
        let message = match &err {
            Error::Request(e) => translator.trans(e.translation_key(), &e.translation_params()),
            other => translator.trans("errors.call.failed", &[("message", other.to_string())]),
        };
        scope.manager().error(&message);
        scope.services().logger.log(LogLevel::Error, &message);
        warn!(error = %err, "request failed");

        let handled = match &err {
            Error::Request(e) => scope.callbacks().on_invalid(e, scope)?,
            other => scope.callbacks().on_error(other, scope)?,
        };
        if handled { Ok(()) } else { Err(err) }
    }
}
