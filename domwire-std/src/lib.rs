//! # domwire-std
//!
//! Standard machinery for the domwire call dispatch framework.
//!
//! This crate provides:
//! - **Decoding**: [`decoder::ArgumentDecoder`] turns raw parameters into call arguments
//! - **Registries**: [`registry::CallableRegistry`], [`plugin::FunctionRegistry`], [`catalog::ClassCatalog`]
//! - **Dependency injection**: [`container::Container`]
//! - **Dispatch**: [`plugin::PluginRegistry`] with the function, class and upload plugins
//! - **Lifecycle**: [`callbacks::CallbackManager`]
//! - **Request handling**: [`app::App`], [`handler::RequestHandler`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use domwire_core;

// Modules
pub mod app;
pub mod callbacks;
pub mod catalog;
pub mod config;
pub mod container;
pub mod decoder;
pub mod export;
pub mod handler;
pub mod manager;
pub mod object;
pub mod options;
pub mod plugin;
pub mod registry;
pub mod scope;
pub mod services;
pub mod testing;

pub use inventory;
