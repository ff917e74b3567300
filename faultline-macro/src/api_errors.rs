use darling::{ast, util::Flag, FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use std::collections::HashSet;
use syn::{parse_macro_input, DeriveInput, Ident};

#[derive(FromDeriveInput)]
#[darling(supports(enum_unit))]
struct ApiErrorsInput {
    ident: Ident,
    generics: syn::Generics,
    data: ast::Data<ApiErrorVariant, ()>,
}

#[derive(FromVariant)]
#[darling(attributes(api_error))]
struct ApiErrorVariant {
    ident: Ident,
    #[darling(default)]
    code: Option<String>,
    status: u16,
    message: String,
    #[darling(default)]
    fallback: Flag,
}

struct CheckedVariant<'a> {
    ident: &'a Ident,
    code: String,
    status: u16,
    message: &'a str,
}

pub fn derive_api_errors(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let parsed = match ApiErrorsInput::from_derive_input(&input) {
        Ok(parsed) => parsed,
        Err(e) => return e.write_errors().into(),
    };

    match generate_api_errors_impl(&parsed) {
        Ok(expanded) => expanded.into(),
        Err(e) => e.write_errors().into(),
    }
}

fn generate_api_errors_impl(input: &ApiErrorsInput) -> darling::Result<TokenStream2> {
    let enum_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let variants = match &input.data {
        ast::Data::Enum(variants) => variants,
        ast::Data::Struct(_) => {
            return Err(darling::Error::custom("#[derive(ApiErrors)] can only be applied to enums")
                .with_span(enum_name))
        }
    };

    let mut errors = darling::Error::accumulator();
    let mut seen_codes = HashSet::new();
    let mut fallback = None;
    let mut checked = Vec::with_capacity(variants.len());

    for variant in variants {
        let code = variant
            .code
            .clone()
            .unwrap_or_else(|| screaming_snake_case(&variant.ident.to_string()));

        if code.trim().is_empty() {
            errors.push(darling::Error::custom("error code must not be blank").with_span(&variant.ident));
        }
        if variant.message.trim().is_empty() {
            errors.push(
                darling::Error::custom("error message must not be blank").with_span(&variant.ident),
            );
        }
        if !(100..=599).contains(&variant.status) {
            errors.push(
                darling::Error::custom(format!(
                    "HTTP status {} is outside 100..=599",
                    variant.status
                ))
                .with_span(&variant.ident),
            );
        }
        if !seen_codes.insert(code.clone()) {
            errors.push(
                darling::Error::custom(format!("duplicate error code {code}")).with_span(&variant.ident),
            );
        }

        if variant.fallback.is_present() {
            if fallback.is_some() {
                errors.push(
                    darling::Error::custom("only one variant may be marked `fallback`")
                        .with_span(&variant.ident),
                );
            } else if !(500..=599).contains(&variant.status) {
                errors.push(
                    darling::Error::custom("the fallback error must map to a 5xx status")
                        .with_span(&variant.ident),
                );
            }
            fallback = Some(&variant.ident);
        }

        checked.push(CheckedVariant {
            ident: &variant.ident,
            code,
            status: variant.status,
            message: &variant.message,
        });
    }

    if fallback.is_none() {
        errors.push(
            darling::Error::custom("one variant must be marked #[api_error(fallback)]")
                .with_span(enum_name),
        );
    }
    errors.finish()?;

    let Some(fallback) = fallback else {
        return Err(darling::Error::custom("missing fallback variant"));
    };

    let idents: Vec<_> = checked.iter().map(|v| v.ident).collect();
    let codes: Vec<_> = checked.iter().map(|v| v.code.as_str()).collect();
    let statuses: Vec<_> = checked.iter().map(|v| v.status).collect();
    let messages: Vec<_> = checked.iter().map(|v| v.message).collect();

    Ok(quote! {
        impl #impl_generics ::faultline::catalog::ApiErrorSet for #enum_name #ty_generics #where_clause {
            fn all() -> ::std::vec::Vec<Self> {
                ::std::vec![#(Self::#idents),*]
            }

            fn fallback() -> Self {
                Self::#fallback
            }

            fn code(&self) -> &'static str {
                match self {
                    #(Self::#idents => #codes,)*
                }
            }

            fn definition(&self) -> ::faultline::catalog::ErrorDefinition {
                match self {
                    #(Self::#idents => ::faultline::catalog::ErrorDefinition::new(#codes, #messages, #statuses),)*
                }
            }
        }

        impl #impl_generics ::std::convert::From<#enum_name #ty_generics> for ::faultline::listener::ErrorRef #where_clause {
            fn from(error: #enum_name #ty_generics) -> Self {
                ::faultline::listener::ErrorRef::new(
                    <#enum_name #ty_generics as ::faultline::catalog::ApiErrorSet>::code(&error),
                )
            }
        }
    })
}

/// `OrderNotFound` -> `ORDER_NOT_FOUND`, `HTTPTimeout` -> `HTTP_TIMEOUT`.
fn screaming_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }
    out
}
