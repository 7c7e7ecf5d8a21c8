//! Procedural macros for the searchlayer project.
//!
//! This crate provides compile-time code generation for the searchlayer framework, most
//! notably `#[derive(Model)]`, which derives a collection definition from a struct.

#[allow(unused_extern_crates)]
extern crate self as searchlayer_macros;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Data, DeriveInput, Fields, GenericArgument, LitStr, PathArguments, Type, meta::ParseNestedMeta,
    parse_macro_input, spanned::Spanned,
};

/// Derives `searchlayer::document::Model` for a struct with named fields.
///
/// The identity defaults to the struct name and can be set with
/// `#[model(identity = "...")]`. Every field becomes an attribute whose type follows the Rust
/// type: strings map to `string`, integers to `integer`, floats to `float`, `bool` to
/// `boolean`, sequences to `array`, chrono dates to `date`/`datetime` and anything else to
/// `json`. `Option<T>` maps like `T`.
///
/// Field options:
///
/// - `#[model(primary_key)]` flags the primary key
/// - `#[model(foreign_key)]` flags a reference to another collection
/// - `#[model(skip)]` leaves the field out of the schema
///
/// Attribute names follow serde: `#[serde(rename_all = "...")]` on the struct and
/// `#[serde(rename = "...")]` on a field are honored, using their `serialize` name when the two
/// directions differ.
///
/// # Example
///
/// ```ignore
/// use searchlayer::prelude::*;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize, Model)]
/// #[model(identity = "Ticket")]
/// pub struct Ticket {
///     #[model(primary_key)]
///     pub id: Option<String>,
///     pub title: String,
///     pub priority: i64,
/// }
/// ```
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_model(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_model(input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, type_generics, where_clause) = input.generics.split_for_impl();

    let mut identity = name.to_string();
    let mut rename_all = None;
    for attr in &input.attrs {
        if attr.path().is_ident("model") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("identity") {
                    identity = meta.value()?.parse::<LitStr>()?.value();
                    Ok(())
                } else {
                    Err(meta.error("unsupported model option"))
                }
            })?;
        } else if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    let rule = serialize_name(&meta)?;
                    if RenameRule::parse(&rule.value()).is_none() {
                        return Err(syn::Error::new(rule.span(), "unknown rename_all rule"));
                    }
                    rename_all = Some(rule.value());
                    Ok(())
                } else {
                    skip_meta(&meta)
                }
            })?;
        }
    }
    let rename_all = rename_all.as_deref().and_then(RenameRule::parse);

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new(
                    input.span(),
                    "Model can only be derived for structs with named fields",
                ));
            }
        },
        _ => return Err(syn::Error::new(input.span(), "Model can only be derived for structs")),
    };

    let mut attributes = Vec::new();

    for field in fields {
        let mut primary_key = false;
        let mut foreign_key = false;
        let mut skip = false;
        let field_name = field
            .ident
            .as_ref()
            .map(|ident| ident.to_string().trim_start_matches("r#").to_string())
            .unwrap_or_default();
        let mut attribute_name = match rename_all {
            Some(rule) => rule.apply(&field_name),
            None => field_name,
        };

        for attr in &field.attrs {
            if attr.path().is_ident("model") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("primary_key") {
                        primary_key = true;
                    } else if meta.path.is_ident("foreign_key") {
                        foreign_key = true;
                    } else if meta.path.is_ident("skip") {
                        skip = true;
                    } else {
                        return Err(meta.error("unsupported model field option"));
                    }
                    Ok(())
                })?;
            } else if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        attribute_name = serialize_name(&meta)?.value();
                        Ok(())
                    } else {
                        skip_meta(&meta)
                    }
                })?;
            }
        }

        if skip {
            continue;
        }

        let kind = attribute_type(&field.ty);
        let mut attribute = quote! {
            ::searchlayer::schema::Attribute::new(::searchlayer::schema::AttributeType::#kind)
        };
        if primary_key {
            attribute = quote! { #attribute.primary_key() };
        }
        if foreign_key {
            attribute = quote! { #attribute.foreign_key() };
        }

        attributes.push(quote! { .with(#attribute_name, #attribute) });
    }

    Ok(quote! {
        impl #impl_generics ::searchlayer::document::Model for #name #type_generics #where_clause {
            fn identity() -> &'static str {
                #identity
            }

            fn schema() -> ::searchlayer::schema::Schema {
                ::searchlayer::schema::Schema::new()
                    #(#attributes)*
            }
        }
    })
}

/// Reads `key = "..."` or `key(serialize = "...", deserialize = "...")`, keeping the
/// serialize name.
fn serialize_name(meta: &ParseNestedMeta) -> syn::Result<LitStr> {
    if meta.input.peek(syn::Token![=]) {
        return meta.value()?.parse::<LitStr>();
    }

    let mut name = None;
    meta.parse_nested_meta(|nested| {
        let value = nested.value()?.parse::<LitStr>()?;
        if nested.path.is_ident("serialize") {
            name = Some(value);
        }
        Ok(())
    })?;

    name.ok_or_else(|| meta.error("expected a serialize name"))
}

/// Consumes a serde option that does not concern the schema.
fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|nested| skip_meta(&nested))?;
    }

    Ok(())
}

/// serde's `rename_all` rules, applied to snake_case field names.
#[derive(Clone, Copy)]
enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn parse(rule: &str) -> Option<Self> {
        match rule {
            "lowercase" => Some(Self::Lower),
            "UPPERCASE" => Some(Self::Upper),
            "PascalCase" => Some(Self::Pascal),
            "camelCase" => Some(Self::Camel),
            "snake_case" => Some(Self::Snake),
            "SCREAMING_SNAKE_CASE" => Some(Self::ScreamingSnake),
            "kebab-case" => Some(Self::Kebab),
            "SCREAMING-KEBAB-CASE" => Some(Self::ScreamingKebab),
            _ => None,
        }
    }

    fn apply(self, field: &str) -> String {
        match self {
            Self::Lower | Self::Snake => field.to_string(),
            Self::Upper | Self::ScreamingSnake => field.to_ascii_uppercase(),
            Self::Pascal => {
                let mut pascal = String::with_capacity(field.len());
                let mut capitalize = true;
                for c in field.chars() {
                    if c == '_' {
                        capitalize = true;
                    } else if capitalize {
                        pascal.push(c.to_ascii_uppercase());
                        capitalize = false;
                    } else {
                        pascal.push(c);
                    }
                }
                pascal
            }
            Self::Camel => {
                let pascal = Self::Pascal.apply(field);
                let mut chars = pascal.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => pascal,
                }
            }
            Self::Kebab => field.replace('_', "-"),
            Self::ScreamingKebab => field.to_ascii_uppercase().replace('_', "-"),
        }
    }
}

/// Maps a Rust field type to the name of an `AttributeType` variant.
fn attribute_type(ty: &Type) -> proc_macro2::Ident {
    let kind = match ty {
        Type::Array(_) | Type::Slice(_) => "Array",
        Type::Reference(reference) => return attribute_type(&reference.elem),
        Type::Group(group) => return attribute_type(&group.elem),
        Type::Paren(paren) => return attribute_type(&paren.elem),
        Type::Path(path) => match path.path.segments.last() {
            Some(segment) => match segment.ident.to_string().as_str() {
                "Option" | "Box" => match &segment.arguments {
                    PathArguments::AngleBracketed(arguments) => match arguments.args.first() {
                        Some(GenericArgument::Type(inner)) => return attribute_type(inner),
                        _ => "Json",
                    },
                    _ => "Json",
                },
                "String" | "str" | "char" | "Uuid" => "String",
                "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
                | "u128" | "usize" => "Integer",
                "f32" | "f64" => "Float",
                "bool" => "Boolean",
                "Vec" | "VecDeque" | "HashSet" | "BTreeSet" => "Array",
                "NaiveDate" => "Date",
                "DateTime" | "NaiveDateTime" => "Datetime",
                _ => "Json",
            },
            None => "Json",
        },
        _ => "Json",
    };

    proc_macro2::Ident::new(kind, ty.span())
}
