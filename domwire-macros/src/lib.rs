//! Procedural macros for domwire.
//!
//! Use them through the `domwire` facade, which re-exports everything the
//! generated code refers to.

use proc_macro::TokenStream;

mod callable;

/// Make the methods of an `impl` block callable from the client.
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Sample {
///     ctx: Context,
/// }
///
/// #[callable(context = ctx)]
/// impl Sample {
///     pub fn hello(&mut self, name: String) {
///         self.response().html("greeting", format!("Hello {name}"));
///     }
///
///     #[protected]
///     pub fn check(&mut self) -> Result<(), BoxError> {
///         Ok(())
///     }
/// }
/// ```
///
/// # Arguments
///
/// - `context = field`: the `Context` field receiving the framework context
/// - `constructor = name`: the constructor, `new` by default
#[proc_macro_attribute]
pub fn callable(attr: TokenStream, item: TokenStream) -> TokenStream {
    callable::callable_impl(attr, item)
}
