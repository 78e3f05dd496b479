//! Derive macro for the `Domain` trait
//!
//! Generates the descriptor table for a struct with named fields. An
//! `#[extends]` field contributes its type's descriptors, projected through
//! the field, ahead of the struct's own fields. `Extends` is implemented for
//! the field's type and for every further ancestor listed in
//! `#[extends(...)]`, forwarding through the field.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, quote_spanned};
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

use crate::attributes;

/// Generate `Domain` (and `Extends`) implementations
pub fn derive_domain(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let struct_name_str = struct_name.unraw().to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Domain cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(syn::DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "Domain can only be derived for structs with named fields",
            ));
        }
    };

    let table_name =
        attributes::extract_table_name(&input.attrs)?.unwrap_or_else(|| struct_name_str.clone());

    let mut parent: Option<(&syn::Ident, &syn::Type, Vec<syn::Type>)> = None;
    let mut own_fields: Vec<TokenStream2> = Vec::new();

    for field in fields {
        // Named fields always carry an ident
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let extends = attributes::has_attribute(field, "extends");
        let skip = attributes::has_attribute(field, "skip");

        if extends && skip {
            return Err(syn::Error::new_spanned(
                field,
                "a field cannot be both #[extends] and #[skip]",
            ));
        }
        if skip {
            continue;
        }
        if extends {
            if parent.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "Domain supports a single #[extends] field",
                ));
            }
            parent = Some((field_name, &field.ty, attributes::extract_ancestors(field)?));
            continue;
        }

        let column = field_name.unraw().to_string();
        let field_type = &field.ty;
        own_fields.push(quote_spanned! { field.ty.span() =>
            fields.push(::tidemark::FieldDescriptor::of::<#field_type>(
                #column,
                #struct_name_str,
                |instance: &#struct_name| &instance.#field_name,
                |instance: &mut #struct_name| &mut instance.#field_name,
            ));
        });
    }

    let (parent_fields, parent_lookup, extends_impl) = match parent {
        Some((field_name, parent_type, ancestors)) => (
            quote! {
                fields.extend(
                    <#parent_type as ::tidemark::Domain>::descriptors()
                        .into_iter()
                        .map(|descriptor| {
                            descriptor.project(
                                |instance: &#struct_name| &instance.#field_name,
                                |instance: &mut #struct_name| &mut instance.#field_name,
                            )
                        }),
                );
            },
            quote! {
                ::tidemark::Domain::as_ancestor(&self.#field_name, target)
            },
            quote! {
                impl ::tidemark::Extends<#parent_type> for #struct_name {
                    fn base(&self) -> &#parent_type {
                        &self.#field_name
                    }
                }

                #(
                    impl ::tidemark::Extends<#ancestors> for #struct_name {
                        fn base(&self) -> &#ancestors {
                            <#parent_type as ::tidemark::Extends<#ancestors>>::base(&self.#field_name)
                        }
                    }
                )*
            },
        ),
        None => (
            TokenStream2::new(),
            quote! { ::std::option::Option::None },
            TokenStream2::new(),
        ),
    };

    Ok(quote! {
        impl ::tidemark::Domain for #struct_name {
            const TABLE_NAME: &'static str = #table_name;

            fn descriptors() -> ::std::vec::Vec<::tidemark::FieldDescriptor<Self>> {
                #[allow(unused_mut)]
                let mut fields = ::std::vec::Vec::new();
                #parent_fields
                #(#own_fields)*
                fields
            }

            fn field_cache() -> &'static ::tidemark::FieldCache<Self> {
                static CACHE: ::tidemark::FieldCache<#struct_name> = ::tidemark::FieldCache::new();
                &CACHE
            }

            fn as_ancestor(
                &self,
                target: ::std::any::TypeId,
            ) -> ::std::option::Option<&dyn ::std::any::Any> {
                if ::std::any::TypeId::of::<Self>() == target {
                    return ::std::option::Option::Some(self as &dyn ::std::any::Any);
                }
                #parent_lookup
            }
        }

        #extends_impl
    })
}
