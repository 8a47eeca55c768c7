use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Meta, Token, Type};

/// Helper enum for parsed attribute values
enum MetaValue {
    Str(String),
    Expr(syn::Expr),
    Flag,
}

const NUMERIC_TYPES: &[&str] = &[
    "f32", "f64", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128",
    "usize",
];

/// Check if the struct has #[allow(missing_docs)] attribute
fn is_allow_missing_docs(attr: &Attribute) -> bool {
    attr.path().is_ident("allow")
        && attr
            .parse_args::<syn::Ident>()
            .map(|ident| ident == "missing_docs")
            .unwrap_or(false)
}

/// Declare a struct loaded and validated from env variables
///
/// ```ignore
/// define_env! {
///     pub struct AppEnv {
///         #[field(env = "APP_PORT", doc = "Port to listen on", default = 3000)]
///         pub port: u16,
///         #[field(env = "APP_MODE", doc = "Run mode", one_of = ["dev", "prod"], default = "dev")]
///         pub mode: String,
///         #[field(env = "API_KEY", doc = "Upstream API key")]
///         pub api_key: Option<String>,
///     }
/// }
/// ```
#[proc_macro]
pub fn define_env(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_env(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_env(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;
    let vis = &input.vis;
    let struct_attrs = &input.attrs;

    let allow_missing_docs = struct_attrs.iter().any(is_allow_missing_docs);

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "define_env! only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "define_env! only supports structs",
            ));
        }
    };

    let mut field_defs = Vec::new();
    let mut schema_inserts = Vec::new();
    let mut record_fields = Vec::new();

    for field in fields {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let field_vis = &field.vis;
        let field_type = &field.ty;

        let config = parse_field_config(&field.attrs, allow_missing_docs)?;
        let class = classify_type(field_type).ok_or_else(|| {
            syn::Error::new_spanned(
                field_type,
                "unsupported field type: use String, bool, a numeric primitive, Option<String> or Option<numeric>",
            )
        })?;

        // Extract cfg attributes for feature gating
        let cfg_attrs: Vec<&Attribute> = field
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("cfg"))
            .collect();
        let kept_attrs: Vec<&Attribute> = field
            .attrs
            .iter()
            .filter(|attr| !attr.path().is_ident("field"))
            .collect();

        field_defs.push(quote! {
            #(#kept_attrs)*
            #field_vis #field_name: #field_type
        });

        let env_var = &config.env_var;
        let kind = kind_tokens(&class, config.one_of.as_ref(), field)?;
        let default = config
            .default
            .as_ref()
            .map(|expr| quote! { .with_default(#expr) });
        let description = if config.description.is_empty() {
            None
        } else {
            let description = &config.description;
            Some(quote! { .with_description(#description) })
        };

        schema_inserts.push(quote! {
            #(#cfg_attrs)*
            schema.insert(
                #env_var,
                ::typenv::FieldRule::new(#kind) #default #description,
            );
        });

        let take = match &class {
            TypeClass::Str => quote! { ::typenv::macros::take_string(record, #env_var)? },
            TypeClass::OptStr => {
                quote! { ::typenv::macros::take_optional_string(record, #env_var)? }
            }
            TypeClass::Bool => quote! { ::typenv::macros::take_bool(record, #env_var)? },
            TypeClass::Number(ty) => {
                quote! { ::typenv::macros::take_number::<#ty>(record, #env_var)? }
            }
            TypeClass::OptNumber(ty) => {
                quote! { ::typenv::macros::take_optional_number::<#ty>(record, #env_var)? }
            }
        };
        record_fields.push(quote! {
            #(#cfg_attrs)*
            #field_name: #take
        });
    }

    // Drop allow(missing_docs), it only configures this macro
    let filtered_attrs: Vec<&Attribute> = struct_attrs
        .iter()
        .filter(|attr| !is_allow_missing_docs(attr))
        .collect();

    let struct_def = quote! {
        #(#filtered_attrs)*
        #vis struct #struct_name {
            #(#field_defs),*
        }
    };

    let from_env_impl = quote! {
        impl ::typenv::FromEnv for #struct_name {
            fn schema() -> ::typenv::Schema {
                let mut schema = ::typenv::Schema::new();
                #(#schema_inserts)*
                schema
            }

            fn from_record(
                record: &::typenv::TypedRecord,
            ) -> ::core::result::Result<Self, ::typenv::EnvError> {
                ::core::result::Result::Ok(Self {
                    #(#record_fields),*
                })
            }
        }
    };

    Ok(quote! {
        #struct_def
        #from_env_impl
    })
}

#[derive(Debug)]
struct FieldConfig {
    env_var: String,
    description: String,
    default: Option<syn::Expr>,
    one_of: Option<syn::Expr>,
}

/// Rust field type mapped onto a schema kind
enum TypeClass<'a> {
    Str,
    OptStr,
    Bool,
    Number(&'a Type),
    OptNumber(&'a Type),
}

fn kind_tokens(
    class: &TypeClass<'_>,
    one_of: Option<&syn::Expr>,
    field: &syn::Field,
) -> syn::Result<proc_macro2::TokenStream> {
    let values = one_of.map(|expr| {
        quote! {
            ::std::iter::IntoIterator::into_iter(#expr)
                .map(|v| ::std::string::ToString::to_string(&v))
                .collect()
        }
    });

    match (class, values) {
        (TypeClass::Str, Some(values)) => Ok(quote! { ::typenv::FieldKind::Enum(#values) }),
        (TypeClass::OptStr, Some(values)) => {
            Ok(quote! { ::typenv::FieldKind::OptionalEnum(#values) })
        }
        (_, Some(_)) => Err(syn::Error::new_spanned(
            field,
            "one_of is only supported on String and Option<String> fields",
        )),
        (TypeClass::Str, None) => Ok(quote! { ::typenv::FieldKind::String }),
        (TypeClass::OptStr, None) => Ok(quote! { ::typenv::FieldKind::OptionalString }),
        (TypeClass::Bool, None) => Ok(quote! { ::typenv::FieldKind::Boolean }),
        (TypeClass::Number(_), None) => Ok(quote! { ::typenv::FieldKind::Number }),
        (TypeClass::OptNumber(_), None) => Ok(quote! { ::typenv::FieldKind::OptionalNumber }),
    }
}

/// Parse #[field(env = "X", doc = "Y", default = val, one_of = [..])] syntax
fn parse_field_list(meta_list: &syn::MetaList) -> syn::Result<HashMap<String, MetaValue>> {
    let mut values = HashMap::new();

    meta_list.parse_nested_meta(|meta| {
        let key = meta
            .path
            .get_ident()
            .ok_or_else(|| meta.error("expected identifier"))?
            .to_string();

        if meta.input.peek(Token![=]) {
            meta.input.parse::<Token![=]>()?;

            if key == "env" || key == "doc" {
                let value: syn::LitStr = meta.input.parse()?;
                values.insert(key, MetaValue::Str(value.value()));
            } else {
                let expr: syn::Expr = meta.input.parse()?;
                values.insert(key, MetaValue::Expr(expr));
            }
        } else {
            values.insert(key, MetaValue::Flag);
        }

        Ok(())
    })?;

    Ok(values)
}

fn parse_field_config(attrs: &[Attribute], allow_missing_docs: bool) -> syn::Result<FieldConfig> {
    let field_attr = attrs
        .iter()
        .find(|attr| attr.path().is_ident("field"))
        .ok_or_else(|| {
            syn::Error::new(
                proc_macro2::Span::call_site(),
                "field must have #[field(...)] attribute with env and doc",
            )
        })?;

    let parsed = match &field_attr.meta {
        Meta::List(list) => parse_field_list(list)?,
        _ => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "field attribute must be a list: #[field(env = \"...\", ...)]",
            ));
        }
    };

    for (key, value) in &parsed {
        let known = matches!(key.as_str(), "env" | "doc" | "default" | "one_of");
        if !known || matches!(value, MetaValue::Flag) {
            return Err(syn::Error::new_spanned(
                field_attr,
                format!("unknown field option `{}`", key),
            ));
        }
    }

    let env_var = match parsed.get("env") {
        Some(MetaValue::Str(s)) => s.clone(),
        _ => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "field must have env = \"VAR_NAME\"",
            ));
        }
    };

    let description = match parsed.get("doc") {
        Some(MetaValue::Str(s)) => s.trim().to_string(),
        None if allow_missing_docs => String::new(),
        None => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "field must have doc = \"description\" (or use #[allow(missing_docs)] on struct)",
            ));
        }
        _ => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "doc must be a string literal",
            ));
        }
    };

    let expr = |key: &str| match parsed.get(key) {
        Some(MetaValue::Expr(e)) => Some(e.clone()),
        _ => None,
    };

    Ok(FieldConfig {
        env_var,
        description,
        default: expr("default"),
        one_of: expr("one_of"),
    })
}

fn classify_type(ty: &Type) -> Option<TypeClass<'_>> {
    if let Some(inner) = option_inner(ty) {
        return match last_ident(inner)?.as_str() {
            "String" => Some(TypeClass::OptStr),
            name if NUMERIC_TYPES.contains(&name) => Some(TypeClass::OptNumber(inner)),
            _ => None,
        };
    }

    match last_ident(ty)?.as_str() {
        "String" => Some(TypeClass::Str),
        "bool" => Some(TypeClass::Bool),
        name if NUMERIC_TYPES.contains(&name) => Some(TypeClass::Number(ty)),
        _ => None,
    }
}

fn last_ident(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        _ => None,
    }
}

/// Extract the inner type from Option<T>
fn option_inner(ty: &Type) -> Option<&Type> {
    let segment = match ty {
        Type::Path(type_path) => type_path.path.segments.last()?,
        _ => return None,
    };
    if segment.ident != "Option" {
        return None;
    }
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(syn::GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}
