//! Call arguments and call results.
//!
//! [`Args`] carries the decoded positional arguments of one call and converts
//! them to the parameter types of the target method. [`IntoCallResult`] is the
//! other side: it turns whatever the method returned into an optional
//! [`Response`].

use crate::{
    error::{BoxError, RequestError},
    response::Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The positional arguments of a call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    /// Wrap decoded argument values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// The number of arguments sent.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no argument was sent.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow an argument.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Move the argument at `index` out and convert it to `T`.
    ///
    /// A missing argument is read as `null`, so `Option<T>` parameters accept
    /// shorter argument lists.
    pub fn take<T: DeserializeOwned>(&mut self, index: usize, name: &str) -> Result<T, RequestError> {
        let value = self
            .values
            .get_mut(index)
            .map(Value::take)
            .unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| RequestError::InvalidArgument {
            index,
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Consume the arguments.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// Conversion of a method's return value into a call result.
///
/// # Default Implementations
///
/// - `()` → no response
/// - `Response` → that response
/// - `Option<Response>` → as is
/// - `Result<T, E>` → delegates to `T` or propagates the error
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be returned from a callable method",
    label = "missing `IntoCallResult` implementation",
    note = "Callable methods return `()`, `Response`, `Option<Response>` or a `Result` of those."
)]
pub trait IntoCallResult {
    /// Convert the value.
    fn into_call_result(self) -> Result<Option<Response>, BoxError>;
}

impl IntoCallResult for () {
    fn into_call_result(self) -> Result<Option<Response>, BoxError> {
        Ok(None)
    }
}

impl IntoCallResult for Response {
    fn into_call_result(self) -> Result<Option<Response>, BoxError> {
        Ok(Some(self))
    }
}

impl IntoCallResult for Option<Response> {
    fn into_call_result(self) -> Result<Option<Response>, BoxError> {
        Ok(self)
    }
}

impl<T, E> IntoCallResult for Result<T, E>
where
    T: IntoCallResult,
    E: Into<BoxError>,
{
    fn into_call_result(self) -> Result<Option<Response>, BoxError> {
        match self {
            Ok(t) => t.into_call_result(),
            Err(e) => Err(e.into()),
        }
    }
}
