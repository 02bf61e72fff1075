//! The `#[callable]` attribute.
//!
//! Applied to an inherent `impl` block, it keeps the block as written (minus
//! `#[protected]` markers) and generates:
//!
//! - the `Callable` implementation: class name, method table, constructor,
//! - `HasContext` and `attach` when a `context = field` is given,
//! - an `inventory` submission adding the class to the catalog.
//!
//! Exported methods are the `pub` methods taking `&self` or `&mut self`.
//! `#[protected]` methods are exported as hooks only, whatever their
//! visibility. Each parameter is converted from the call argument at the same
//! position.
//!
//! The constructor is `new` (or the function named by `constructor = ...`);
//! its parameters are resolved from the DI container by name and type.
//! Without one the class must implement `Default`.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Pat, ReturnType, Token, Type,
    Visibility, parse::Parse, parse_macro_input,
};

/// Arguments for the `#[callable]` macro.
pub(crate) struct CallableArgs {
    pub context: Option<Ident>,
    pub constructor: Option<Ident>,
}

impl Parse for CallableArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut context = None;
        let mut constructor = None;

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "context" => context = Some(input.parse()?),
                "constructor" => constructor = Some(input.parse()?),
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(CallableArgs {
            context,
            constructor,
        })
    }
}

/// Implementation of the `#[callable]` macro.
pub fn callable_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as CallableArgs);
    let mut input = parse_macro_input!(item as ItemImpl);

    match expand(&args, &mut input) {
        Ok(generated) => TokenStream::from(quote! {
            #input
            #generated
        }),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(args: &CallableArgs, input: &mut ItemImpl) -> syn::Result<proc_macro2::TokenStream> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[callable] must be used on an inherent impl block",
        ));
    }
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "callable classes cannot be generic",
        ));
    }
    let self_ty = input.self_ty.clone();
    let type_ident = match &*self_ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|s| s.ident.clone())
            .ok_or_else(|| syn::Error::new_spanned(&self_ty, "expected a type name"))?,
        other => {
            return Err(syn::Error::new_spanned(
                other,
                "#[callable] must be used on a named type",
            ));
        }
    };

    let mut entries = Vec::new();
    let mut constructor = None;
    let wanted_constructor = args
        .constructor
        .clone()
        .unwrap_or_else(|| Ident::new("new", Span::call_site()));

    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let protected = take_protected(method);
        if method.sig.receiver().is_none() {
            if method.sig.ident == wanted_constructor {
                constructor = Some(constructor_body(method, &type_ident)?);
            } else if protected {
                return Err(syn::Error::new_spanned(
                    &method.sig,
                    "#[protected] requires a `self` receiver",
                ));
            }
            continue;
        }
        let public = matches!(method.vis, Visibility::Public(_));
        if !public && !protected {
            continue;
        }
        entries.push(table_entry(method, protected)?);
    }

    if args.constructor.is_some() && constructor.is_none() {
        return Err(syn::Error::new_spanned(
            &wanted_constructor,
            "constructor not found in this impl block",
        ));
    }
    let construct = constructor.unwrap_or_else(|| {
        quote! {
            ::core::result::Result::Ok(<#self_ty as ::core::default::Default>::default())
        }
    });

    let context_impls = args.context.as_ref().map(|field| {
        quote! {
            impl ::domwire::HasContext for #self_ty {
                fn context(&self) -> &::domwire::Context {
                    &self.#field
                }
            }
        }
    });
    let attach = args.context.as_ref().map(|field| {
        quote! {
            fn attach(&mut self, context: ::domwire::Context) {
                self.#field = context;
            }
        }
    });

    Ok(quote! {
        impl ::domwire::Callable for #self_ty {
            fn class_name() -> &'static str {
                stringify!(#type_ident)
            }

            fn method_table() -> ::domwire::MethodTable<Self> {
                ::domwire::MethodTable::new()
                    #(#entries)*
            }

            #[allow(unused_variables)]
            fn construct(
                injector: &::domwire::Injector<'_>,
            ) -> ::core::result::Result<Self, ::domwire::SetupError> {
                #construct
            }

            #attach
        }

        #context_impls

        ::domwire::inventory::submit! {
            ::domwire::CatalogEntry::new(
                concat!(module_path!(), "::", stringify!(#type_ident)),
                file!(),
                ::domwire::ClassDefinition::of::<#self_ty>,
            )
        }
    })
}

/// Remove `#[protected]` from `method`, returning whether it was present.
fn take_protected(method: &mut ImplItemFn) -> bool {
    let before = method.attrs.len();
    method.attrs.retain(|attr| !attr.path().is_ident("protected"));
    method.attrs.len() != before
}

fn param_name(pat: &Pat, index: usize) -> String {
    match pat {
        Pat::Ident(ident) => ident.ident.to_string().trim_start_matches("r#").to_string(),
        _ => format!("arg{index}"),
    }
}

fn table_entry(method: &ImplItemFn, protected: bool) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &method.sig.ident;
    let name = LitStr::new(ident.to_string().trim_start_matches("r#"), ident.span());

    let mut bindings = Vec::new();
    let mut names = Vec::new();
    for (index, arg) in method.sig.inputs.iter().skip(1).enumerate() {
        let FnArg::Typed(pat_type) = arg else {
            continue;
        };
        if let Type::Reference(reference) = &*pat_type.ty {
            return Err(syn::Error::new_spanned(
                reference,
                "callable method parameters must be owned types",
            ));
        }
        let ty = &pat_type.ty;
        let local = Ident::new(&format!("__arg{index}"), Span::call_site());
        let label = LitStr::new(&param_name(&pat_type.pat, index), Span::call_site());
        bindings.push(quote! {
            let #local: #ty = args.take(#index, #label)?;
        });
        names.push(local);
    }

    let register = if protected {
        quote! { protected }
    } else {
        quote! { public }
    };
    Ok(quote! {
        .#register(#name, |this: &mut Self, mut args: ::domwire::Args| -> ::core::result::Result<
            ::core::option::Option<::domwire::Response>,
            ::domwire::BoxError,
        > {
            let _ = &mut args;
            #(#bindings)*
            ::domwire::IntoCallResult::into_call_result(this.#ident(#(#names),*))
        })
    })
}

fn constructor_body(method: &ImplItemFn, type_ident: &Ident) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &method.sig.ident;
    let mut values = Vec::new();
    for (index, arg) in method.sig.inputs.iter().enumerate() {
        let FnArg::Typed(pat_type) = arg else {
            continue;
        };
        let ty = &pat_type.ty;
        let label = LitStr::new(&param_name(&pat_type.pat, index), Span::call_site());
        values.push(quote! { injector.param::<#ty>(#label)? });
    }

    let returns_result = match &method.sig.output {
        ReturnType::Type(_, ty) => matches!(
            &**ty,
            Type::Path(path) if path.path.segments.last().is_some_and(|s| s.ident == "Result")
        ),
        ReturnType::Default => {
            return Err(syn::Error::new_spanned(
                &method.sig,
                "constructor must return `Self` or a `Result` of it",
            ));
        }
    };

    Ok(if returns_result {
        quote! {
            Self::#ident(#(#values),*).map_err(|err| ::domwire::SetupError::Factory {
                key: stringify!(#type_ident).to_string(),
                reason: err.to_string(),
            })
        }
    } else {
        quote! {
            ::core::result::Result::Ok(Self::#ident(#(#values),*))
        }
    })
}
