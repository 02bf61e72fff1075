//! The global response of a request.
//!
//! Exactly one response is sent back per request. The [`ResponseManager`]
//! owns it, collects debug messages while the request is handled, and appends
//! them (and the data bags, when modified) once the request is finished.

use crate::config::Config;
use domwire_core::{Command, DataBags, Response, ResponseHandle, command::codes};
use std::cell::{RefCell, RefMut};
use tracing::debug;

/// Owner of the global response.
#[derive(Debug)]
pub struct ResponseManager {
    response: ResponseHandle,
    debug: bool,
    error_as_alert: bool,
    messages: RefCell<Vec<String>>,
}

impl ResponseManager {
    /// Create a manager following `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            response: ResponseHandle::new(),
            debug: config.debug,
            error_as_alert: config.error_as_alert,
            messages: RefCell::default(),
        }
    }

    /// Borrow the global response.
    pub fn response(&self) -> RefMut<'_, Response> {
        self.response.borrow_mut()
    }

    /// The global response handle.
    pub fn handle(&self) -> &ResponseHandle {
        &self.response
    }

    /// Append `response` to the global response.
    pub fn append(&self, response: Response) {
        self.response.borrow_mut().merge(response, false);
    }

    /// Prepend `response` to the global response.
    pub fn prepend(&self, response: Response) {
        self.response.borrow_mut().merge(response, true);
    }

    /// Record a debug message, sent at the end of the request in debug mode.
    pub fn debug(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(%message, "debug message");
        if self.debug {
            self.messages.borrow_mut().push(message);
        }
    }

    /// Append a terminal error message.
    ///
    /// Debug mode reports it with `dbg`, unless errors are configured to show
    /// as alerts.
    pub fn error(&self, message: &str) {
        let mut response = self.response.borrow_mut();
        if self.debug && !self.error_as_alert {
            response.debug(message);
        } else {
            response.alert(message);
        }
    }

    /// Append the pending debug messages and the modified data bags, then
    /// take the response out.
    pub fn finish(&self, bags: &DataBags) -> Response {
        let mut response = self.response.take();
        for message in self.messages.borrow_mut().drain(..) {
            response.debug(&message);
        }
        if bags.is_dirty() {
            response.push(Command::new(codes::SET_BAGS, bags.to_value()));
        }
        response
    }
}
