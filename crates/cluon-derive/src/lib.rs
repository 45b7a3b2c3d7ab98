// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, GenericArgument, PathArguments, Type};

/// Field kind for code generation
enum FieldKind {
    /// Scalar visited through a `FieldMut` variant
    Scalar {
        variant: proc_macro2::Ident,
        type_token: &'static str,
    },
    /// Any other path type, visited as a nested message
    Message { type_name: String },
}

/// Options from `#[cluon(...)]` on the struct.
#[derive(Default)]
struct MessageOptions {
    id: i32,
    name: Option<String>,
}

/// Options from `#[cluon(...)]` on a field.
#[derive(Default)]
struct FieldOptions {
    id: Option<u32>,
    name: Option<String>,
    type_name: Option<String>,
}

/// `#[derive(Message)]` macro: generates `Visitable` + `Message` impls
///
/// Supports:
/// - Scalars: bool, char, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64
/// - String and Vec<u8>
/// - Any other path type as a nested message (it must implement `Visitable`)
///
/// Attributes:
/// - `#[cluon(id = N, name = "pkg.Name")]` on the struct; the name defaults
///   to the struct name and the id to 0
/// - `#[cluon(id = M)]`, `#[cluon(name = "wireName")]` and
///   `#[cluon(type_name = "pkg.Type")]` on fields
///
/// Fields without an id are numbered 1, 2, 3, ... in declaration order,
/// counting only the fields that have no explicit id.
///
/// Example:
/// ```ignore
/// use cluon::Message;
///
/// #[derive(Default, Message)]
/// #[cluon(id = 1001, name = "demo.Temperature")]
/// struct Temperature {
///     celsius: f32,            // id 1
///     #[cluon(id = 7)]
///     sensor: String,          // id 7
///     location: Position,      // id 2, nested message
/// }
/// ```
#[proc_macro_derive(Message, attributes(cluon))]
pub fn derive_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;

    let options = match parse_message_options(&input.attrs) {
        Ok(options) => options,
        Err(e) => return e.to_compile_error().into(),
    };
    let message_id = options.id;
    let long_name = options.name.unwrap_or_else(|| name.to_string());
    let short_name = long_name
        .rsplit('.')
        .next()
        .unwrap_or(&long_name)
        .to_string();

    // Parse struct fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(f) => &f.named,
            Fields::Unit => {
                return generate(&input, message_id, &short_name, &long_name, Vec::new())
            }
            Fields::Unnamed(_) => {
                return syn::Error::new_spanned(&input, "Only named fields are supported")
                    .to_compile_error()
                    .into()
            }
        },
        _ => {
            return syn::Error::new_spanned(&input, "Only structs are supported")
                .to_compile_error()
                .into()
        }
    };

    let mut visits = Vec::new();
    let mut counter = 0u32;

    for field in fields {
        let Some(field_ident) = field.ident.as_ref() else {
            return syn::Error::new_spanned(field, "Field must have a name")
                .to_compile_error()
                .into();
        };
        let field_type = &field.ty;

        let field_options = match parse_field_options(&field.attrs) {
            Ok(options) => options,
            Err(e) => return e.to_compile_error().into(),
        };

        let Some(kind) = get_field_kind(field_type) else {
            return syn::Error::new_spanned(
                field_type,
                "Unsupported type. Supported types: scalars, String, Vec<u8> and nested messages.",
            )
            .to_compile_error()
            .into();
        };

        let field_id = match field_options.id {
            Some(id) => id,
            None => {
                counter += 1;
                counter
            }
        };
        let wire_name = field_options
            .name
            .unwrap_or_else(|| field_ident.to_string());

        let visit = match kind {
            FieldKind::Scalar {
                variant,
                type_token,
            } => {
                let type_name = field_options
                    .type_name
                    .unwrap_or_else(|| type_token.to_string());
                quote! {
                    visitor.visit(
                        ::cluon::FieldInfo::new(#field_id, #type_name, #wire_name),
                        ::cluon::FieldMut::#variant(&mut self.#field_ident),
                    );
                }
            }
            FieldKind::Message { type_name } => {
                let type_name = field_options.type_name.unwrap_or(type_name);
                quote! {
                    visitor.visit_message(
                        ::cluon::FieldInfo::new(#field_id, #type_name, #wire_name),
                        &mut self.#field_ident,
                    );
                }
            }
        };
        visits.push(visit);
    }

    generate(&input, message_id, &short_name, &long_name, visits)
}

fn generate(
    input: &DeriveInput,
    message_id: i32,
    short_name: &str,
    long_name: &str,
    visits: Vec<proc_macro2::TokenStream>,
) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::cluon::Visitable for #name #ty_generics #where_clause {
            fn accept<V: ::cluon::Visitor>(&mut self, visitor: &mut V) {
                visitor.pre_visit(#message_id, #short_name, #long_name);
                #(#visits)*
                visitor.post_visit();
            }
        }

        impl #impl_generics ::cluon::Message for #name #ty_generics #where_clause {
            const ID: i32 = #message_id;
            const SHORT_NAME: &'static str = #short_name;
            const LONG_NAME: &'static str = #long_name;
        }
    };

    TokenStream::from(expanded)
}

fn parse_message_options(attrs: &[syn::Attribute]) -> syn::Result<MessageOptions> {
    let mut options = MessageOptions::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("cluon")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                let lit: syn::LitInt = meta.value()?.parse()?;
                options.id = lit.base10_parse()?;
                Ok(())
            } else if meta.path.is_ident("name") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                options.name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("expected `id` or `name`"))
            }
        })?;
    }
    Ok(options)
}

fn parse_field_options(attrs: &[syn::Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("cluon")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                let lit: syn::LitInt = meta.value()?.parse()?;
                let id: u32 = lit.base10_parse()?;
                if id == 0 {
                    return Err(syn::Error::new_spanned(lit, "field id must be at least 1"));
                }
                options.id = Some(id);
                Ok(())
            } else if meta.path.is_ident("name") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                options.name = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("type_name") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                options.type_name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("expected `id`, `name` or `type_name`"))
            }
        })?;
    }
    Ok(options)
}

/// Map a Rust type to its field kind
fn get_field_kind(ty: &Type) -> Option<FieldKind> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;

    let (variant, type_token) = match segment.ident.to_string().as_str() {
        "bool" => ("Bool", "bool"),
        "char" => ("Char", "char"),
        "i8" => ("Int8", "int8"),
        "u8" => ("Uint8", "uint8"),
        "i16" => ("Int16", "int16"),
        "u16" => ("Uint16", "uint16"),
        "i32" => ("Int32", "int32"),
        "u32" => ("Uint32", "uint32"),
        "i64" => ("Int64", "int64"),
        "u64" => ("Uint64", "uint64"),
        "f32" => ("Float", "float"),
        "f64" => ("Double", "double"),
        "String" => ("String", "string"),
        "Vec" if is_byte_vec(segment) => ("Bytes", "bytes"),
        // Vec<T> where T != u8 is not supported
        "Vec" => return None,
        _ => {
            let type_name = type_path
                .path
                .segments
                .iter()
                .map(|s| s.ident.to_string())
                .collect::<Vec<_>>()
                .join(".");
            return Some(FieldKind::Message { type_name });
        }
    };

    Some(FieldKind::Scalar {
        variant: proc_macro2::Ident::new(variant, proc_macro2::Span::call_site()),
        type_token,
    })
}

/// Check for `Vec<u8>`
fn is_byte_vec(segment: &syn::PathSegment) -> bool {
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return false;
    };
    match args.args.first() {
        Some(GenericArgument::Type(Type::Path(inner))) => inner
            .path
            .segments
            .last()
            .is_some_and(|s| s.ident == "u8"),
        _ => false,
    }
}
