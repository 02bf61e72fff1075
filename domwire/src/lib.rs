//! # domwire - Server-Side Call Dispatch for DOM Commands
//!
//! `domwire` lets browser events call server-side functions and class
//! methods. Each call returns a list of declarative UI-mutation commands that
//! the client runtime replays against the DOM.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use domwire::prelude::*;
//!
//! #[derive(Default)]
//! struct Sample {
//!     ctx: Context,
//! }
//!
//! #[callable(context = ctx)]
//! impl Sample {
//!     pub fn hello(&mut self, name: String) {
//!         self.response().html("greeting", format!("Hello {name}"));
//!     }
//! }
//!
//! let app = App::builder().build()?;
//! app.register_class("Sample", &json!(null))?;
//!
//! let output = app.handle(&Request::post().with_call("Sample.hello").with_args(["SWorld"]))?;
//! // output.body == r#"[{"cmd":"as","id":"greeting","prop":"innerHTML","data":"Hello World"}]"#
//! ```
//!
//! ## Pipeline
//!
//! A request is decoded, claimed by the first plugin in priority order,
//! resolved to a [`Target`], then executed. Class methods run inside a
//! [`CallableObject`](object::CallableObject) that applies the configured
//! before and after hooks. The commands written by the call are merged into a
//! single global [`Response`] and serialized once.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use domwire_core::{
    AnyCallable, Args, BoxError, Callable, ClassDefinition, ClassName, Command, ComponentExt,
    ConfigError, Context, DataBag, DataBags, Error, HasContext, HookCall, HookResult, HttpMethod,
    Injector, IntoCallResult, LogLevel, Logger, MethodTable, NodeResponse, RawParam, Request,
    RequestError, Response, ResponseHandle, Separator, Services, SessionStore, SetupError, Shared,
    Target, Translator, UploadManager, UploadedFile, ViewRenderer, Visibility, command, request,
};

pub use domwire_std::{
    app::{App, AppBuilder},
    callbacks::CallbackManager,
    catalog::{CatalogEntry, ClassCatalog},
    config::Config,
    container::Container,
    decoder::{ArgumentDecoder, IncomingCall, Transcoder},
    export::ClientExport,
    handler::{CONTENT_TYPE, HandleError, HandlerOutput},
    plugin::{PluginRegistry, RequestPlugin},
    registry::CallableRegistry,
    scope::RequestScope,
};

/// Class and method options.
pub mod options {
    pub use domwire_std::options::{ClassOptions, MethodOptions, WILDCARD};
}

/// Callable objects.
pub mod object {
    pub use domwire_std::object::CallableObject;
}

/// Request plugins.
pub mod plugin {
    pub use domwire_std::plugin::{
        CLASS_PRIORITY, CORE_BAND, ClassPlugin, FUNCTION_PRIORITY, FunctionOptions,
        FunctionPlugin, FunctionRegistry, LAST_BAND, PluginEntry, PluginRegistry, RegisteredFunction,
        RequestPlugin, USER_BAND, UploadPlugin,
    };
}

/// Default collaborators.
pub mod services {
    pub use domwire_std::services::{EnglishTranslator, TracingLogger};
}

/// Testing utilities.
pub mod testing {
    pub use domwire_std::testing::{
        CallRecorder, FixedUploads, MemorySession, RecordingLogger, StaticView, call_request,
    };
}

/// Prelude module - common imports for domwire.
///
/// # Usage
///
/// ```rust,ignore
/// use domwire::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        App, Args, BoxError, ComponentExt, Config, Context, Error, HasContext, HookResult,
        Request, RequestError, Response, SetupError, Target,
    };
    pub use serde_json::json;

    #[cfg(feature = "macros")]
    pub use crate::callable;
}

#[cfg(feature = "macros")]
pub use domwire_macros::callable;

pub use inventory;
pub use serde_json;
