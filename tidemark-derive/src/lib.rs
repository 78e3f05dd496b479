//! Procedural macros for Tidemark
//!
//! This crate provides the `Domain` derive macro. Use it through the
//! `tidemark` re-export.

mod attributes;
mod macros;

use proc_macro::TokenStream;

/// Derive macro for `Domain` - generates the field descriptor table
///
/// This macro generates:
/// - `Domain` implementation (`TABLE_NAME`, descriptors, registry slot)
/// - `Extends<Parent>` (and `Extends<Ancestor>` for each listed ancestor) for a
///   struct with an `#[extends]` field
///
/// Attributes:
/// - `#[table_name = "..."]` on the struct overrides the table name (default:
///   the struct's name)
/// - `#[extends]` on one field embeds an ancestor domain type; its columns
///   come first. When that type has ancestors of its own, list them as
///   `#[extends(Grandparent, ...)]` to implement `Extends` for each
/// - `#[skip]` on a field leaves it out of the table
///
/// Every other field must implement `ValueType + Clone`, and the struct must
/// implement `Default`.
///
/// # Example
///
/// ```ignore
/// use tidemark::Domain;
///
/// #[derive(Domain, Default)]
/// struct Person {
///     name: String,
///     age: i32,
/// }
///
/// #[derive(Domain, Default)]
/// #[table_name = "employees"]
/// struct Employee {
///     #[extends]
///     person: Person,
///     salary: i64,
///     #[skip]
///     scratch: Vec<String>,
/// }
///
/// #[derive(Domain, Default)]
/// struct Manager {
///     #[extends(Person)]
///     employee: Employee,
///     reports: i32,
/// }
/// ```
#[proc_macro_derive(Domain, attributes(table_name, extends, skip))]
pub fn derive_domain(input: TokenStream) -> TokenStream {
    macros::derive_domain(input)
}
