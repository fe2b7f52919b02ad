extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, FieldsNamed};

/// Field attributes parsed from `#[bson(...)]` annotations
///
/// # Fields
///
/// * `key` - The document key (field name unless renamed)
/// * `default` - Whether to use `Default::default()` when the key is missing during decode
/// * `skip` - Whether to leave the field out of the document entirely
#[derive(Debug, Clone)]
struct FieldAttributes {
    key: String,
    default: bool,
    skip: bool,
}

/// Extract and parse `#[bson(...)]` attribute values from field attributes
///
/// # Supported Attributes
///
/// * `#[bson(rename="name")]` - Document key to use instead of the field name
/// * `#[bson(default)]` - Use default value if the key is missing during decode
/// * `#[bson(skip)]` - Never write this field; decode it as `Default::default()`
///
/// Multiple attributes can be combined: `#[bson(rename="id", default)]`
fn get_field_attributes(attrs: &[Attribute], field_name: &str) -> syn::Result<FieldAttributes> {
    let mut parsed = FieldAttributes {
        key: field_name.to_string(),
        default: false,
        skip: false,
    };

    for attr in attrs {
        if !attr.path().is_ident("bson") {
            continue;
        }
        attr.parse_args_with(|input: syn::parse::ParseStream| {
            while !input.is_empty() {
                let ident = input.parse::<syn::Ident>()?;

                if ident == "default" {
                    parsed.default = true;
                } else if ident == "skip" {
                    parsed.skip = true;
                } else if ident == "rename" {
                    input.parse::<syn::Token![=]>()?;
                    let lit_str = input.parse::<syn::LitStr>()?;
                    let key = lit_str.value();
                    if key.contains('\0') {
                        return Err(syn::Error::new(
                            lit_str.span(),
                            "Document keys cannot contain a NUL byte",
                        ));
                    }
                    parsed.key = key;
                } else {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("Unknown attribute: {}", ident),
                    ));
                }

                // Consume comma if present, otherwise end
                if input.peek(syn::Token![,]) {
                    input.parse::<syn::Token![,]>()?;
                }
            }
            Ok(())
        })?;
    }

    Ok(parsed)
}

/// Returns the named fields of a struct, or an error pointing at the input.
fn named_fields<'a>(input: &'a DeriveInput, derive: &str) -> syn::Result<&'a FieldsNamed> {
    match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(fields) => Ok(fields),
            _ => Err(syn::Error::new_spanned(
                &input.ident,
                format!("{} can only be derived for structs with named fields", derive),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            format!("{} can only be derived for structs", derive),
        )),
    }
}

/// Derive macro for implementing the `ToBson` trait
///
/// Fields are written as document entries in declaration order.
///
/// # Examples
///
/// ```rust,ignore
/// #[derive(ToBson)]
/// struct MyStruct {
///     #[bson(rename = "_id")]
///     id: i32,
///     #[bson(skip)]
///     cache: String,
/// }
/// ```
#[proc_macro_derive(ToBson, attributes(bson))]
pub fn derive_to_bson(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_to_bson(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_to_bson(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = named_fields(input, "ToBson")?;

    let mut field_inserts = Vec::new();
    for f in &fields.named {
        let Some(field_ident) = &f.ident else {
            continue;
        };
        let attrs = get_field_attributes(&f.attrs, &field_ident.to_string())?;
        if attrs.skip {
            continue;
        }
        let key = &attrs.key;
        field_inserts.push(quote! {
            doc.insert(#key, tinybson::ToBson::to_bson(&self.#field_ident));
        });
    }
    let capacity = field_inserts.len();

    Ok(quote! {
        impl #impl_generics tinybson::ToBson for #name #ty_generics #where_clause {
            fn to_bson(&self) -> tinybson::Value {
                let mut doc = tinybson::Document::with_capacity(#capacity);
                #(#field_inserts)*
                tinybson::Value::Document(doc)
            }
        }
    })
}

/// Derive macro for implementing the `FromBson` trait
///
/// Keys not belonging to the struct are ignored. A missing key is an error
/// unless the field is an `Option`, or marked `#[bson(default)]` or
/// `#[bson(skip)]`.
///
/// # Examples
///
/// ```rust,ignore
/// #[derive(FromBson)]
/// struct MyStruct {
///     id: i32,
///     #[bson(default)]
///     tags: Vec<String>,
/// }
/// ```
#[proc_macro_derive(FromBson, attributes(bson))]
pub fn derive_from_bson(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_from_bson(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_from_bson(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = named_fields(input, "FromBson")?;

    let mut field_reads = Vec::new();
    for f in &fields.named {
        let Some(field_ident) = &f.ident else {
            continue;
        };
        let ty = &f.ty;
        let attrs = get_field_attributes(&f.attrs, &field_ident.to_string())?;
        let key = &attrs.key;

        if attrs.skip {
            field_reads.push(quote! {
                #field_ident: ::std::default::Default::default(),
            });
        } else if attrs.default {
            field_reads.push(quote! {
                #field_ident: tinybson::read_field_or_default::<#ty>(&mut doc, #key)?,
            });
        } else {
            field_reads.push(quote! {
                #field_ident: tinybson::read_field::<#ty>(&mut doc, #key, #name_str)?,
            });
        }
    }

    Ok(quote! {
        impl #impl_generics tinybson::FromBson for #name #ty_generics #where_clause {
            #[allow(unused_mut, unused_variables)]
            fn from_bson(value: tinybson::Value) -> tinybson::Result<Self> {
                let mut doc = tinybson::expect_document(value)?;
                Ok(#name {
                    #(#field_reads)*
                })
            }
        }
    })
}
