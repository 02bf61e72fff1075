//! # domwire-core
//!
//! Core types for the domwire call dispatch framework.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! plugins and callable classes that don't need the full `domwire-std`
//! machinery.
//!
//! # Building Blocks
//!
//! ## Targets ([`Target`], [`ClassName`])
//!
//! What an inbound request calls: a registered function, or a method of a
//! callable class. Class names are ordered segments with explicit conversions
//! from the client-side forms (`App.Admin.Users`, `App_Admin_Users`).
//!
//! ## Callables ([`Callable`], [`MethodTable`], [`ClassDefinition`])
//!
//! A callable class describes its methods once through a method table. The
//! registries only ever see the type-erased [`ClassDefinition`].
//!
//! ## Responses ([`Response`], [`Command`], [`NodeResponse`])
//!
//! An ordered buffer of UI-mutation commands, serialized as a JSON array the
//! client runtime replays against the DOM.
//!
//! ## Context ([`Context`])
//!
//! The framework collaborators attached to every callable instance.
//!
//! # Error Types
//!
//! - [`Error`] - Top-level error type
//! - [`SetupError`] - Registration and resolution failures
//! - [`RequestError`] - Requests that cannot be honored
//! - [`ConfigError`] - Unsatisfiable configuration

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod args;
mod callable;
pub mod command;
mod context;
mod databag;
mod error;
mod hook;
mod name;
pub mod request;
mod response;
mod services;
mod target;

// Re-exports
pub use args::{Args, IntoCallResult};
pub use callable::{
    AnyCallable, Callable, ClassDefinition, ComponentExt, ErasedMethod, ErasedMethodFn,
    HasContext, Injector, MAGIC_PREFIX, Method, MethodFn, MethodTable, RESERVED_METHODS, Resolve,
    Visibility, binding_keys,
};
pub use command::Command;
pub use context::{Context, DataBag, Shared};
pub use databag::DataBags;
pub use error::{BoxError, ConfigError, Error, RequestError, SetupError};
pub use hook::{HookCall, HookResult};
pub use name::{ClassName, Separator, is_identifier};
pub use request::{HttpMethod, RawParam, Request, UploadedFile};
pub use response::{NodeResponse, Response, ResponseHandle};
pub use services::{
    KeyTranslator, LogLevel, Logger, NullLogger, NullSession, NullView, Services, SessionStore,
    Translator, UploadManager, ViewRenderer,
};
pub use target::Target;
