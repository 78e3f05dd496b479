//! Attribute parsing utilities

use syn::punctuated::Punctuated;
use syn::{Attribute, ExprLit, Field, Lit, Meta, Token, Type};

/// Extract table name from struct attributes
///
/// Returns an error for a `table_name` attribute that is not `= "literal"`.
pub fn extract_table_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    for attr in attrs {
        if attr.path().is_ident("table_name") {
            let meta = attr.meta.require_name_value()?;
            if let syn::Expr::Lit(ExprLit {
                lit: Lit::Str(s), ..
            }) = &meta.value
            {
                let name = s.value();
                if name.is_empty() {
                    return Err(syn::Error::new_spanned(s, "table_name cannot be empty"));
                }
                return Ok(Some(name));
            }
            return Err(syn::Error::new_spanned(
                &meta.value,
                "expected #[table_name = \"...\"]",
            ));
        }
    }
    Ok(None)
}

/// Check if field has a specific attribute
pub fn has_attribute(field: &Field, attr_name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(attr_name))
}

/// Extract the further ancestors named by `#[extends(Grandparent, ...)]`
///
/// A bare `#[extends]` names none.
pub fn extract_ancestors(field: &Field) -> syn::Result<Vec<Type>> {
    for attr in &field.attrs {
        if attr.path().is_ident("extends") {
            return match &attr.meta {
                Meta::Path(_) => Ok(Vec::new()),
                Meta::List(_) => Ok(attr
                    .parse_args_with(Punctuated::<Type, Token![,]>::parse_terminated)?
                    .into_iter()
                    .collect()),
                Meta::NameValue(meta) => Err(syn::Error::new_spanned(
                    meta,
                    "expected #[extends] or #[extends(Ancestor, ...)]",
                )),
            };
        }
    }
    Ok(Vec::new())
}
