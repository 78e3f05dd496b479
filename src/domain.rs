//! Domain types and their field descriptor tables
//!
//! A domain type is a struct mapped one-to-one to a table. Instead of runtime
//! reflection, every domain type publishes a descriptor table: one
//! [`FieldDescriptor`] per persistable field, in column order. The table is
//! normally generated by `#[derive(Domain)]` but can be written by hand:
//!
//! ```rust
//! use tidemark::{Domain, FieldCache, FieldDescriptor};
//!
//! #[derive(Default)]
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! impl Domain for Person {
//!     const TABLE_NAME: &'static str = "Person";
//!
//!     fn descriptors() -> Vec<FieldDescriptor<Self>> {
//!         vec![
//!             FieldDescriptor::of("name", "Person", |p: &Person| &p.name, |p: &mut Person| &mut p.name),
//!             FieldDescriptor::of("age", "Person", |p: &Person| &p.age, |p: &mut Person| &mut p.age),
//!         ]
//!     }
//!
//!     fn field_cache() -> &'static FieldCache<Self> {
//!         static CACHE: FieldCache<Person> = FieldCache::new();
//!         &CACHE
//!     }
//! }
//!
//! let fields = tidemark::fields::<Person>().unwrap();
//! assert_eq!(fields.names().collect::<Vec<_>>(), vec!["name", "age"]);
//! ```

use crate::registry::FieldCache;
use crate::value::{ValueExtractionError, ValueType};
use sea_query::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Reads a field as a `Value`
pub type FieldGetter<D> = Arc<dyn Fn(&D) -> Value + Send + Sync>;

/// Writes a field from a `Value`
pub type FieldSetter<D> = Arc<dyn Fn(&mut D, Value) -> Result<(), ValueExtractionError> + Send + Sync>;

/// Trait for record types mapped to a table
///
/// `Default` provides the blank instance: every field at its default value.
pub trait Domain: Default + 'static {
    /// Table the type maps to; the type's simple name unless overridden
    const TABLE_NAME: &'static str;

    /// Persistable fields in column order, ancestor fields first
    fn descriptors() -> Vec<FieldDescriptor<Self>>;

    /// Registry slot owned by this exact type
    fn field_cache() -> &'static FieldCache<Self>;

    /// View `self` as the domain type identified by `target`: itself, or an
    /// embedded ancestor at any depth.
    fn as_ancestor(&self, target: TypeId) -> Option<&dyn Any> {
        (TypeId::of::<Self>() == target).then_some(self as &dyn Any)
    }
}

/// A domain type that is `B` or embeds `B` as its ancestor.
///
/// Every domain type extends itself. `#[derive(Domain)]` implements
/// `Extends<Parent>` for a struct with an `#[extends]` field.
pub trait Extends<B: Domain>: Domain {
    fn base(&self) -> &B;
}

impl<D: Domain> Extends<D> for D {
    fn base(&self) -> &D {
        self
    }
}

/// Name, accessor pair and declaring type of one persistable field.
pub struct FieldDescriptor<D> {
    name: &'static str,
    owner: &'static str,
    getter: FieldGetter<D>,
    setter: FieldSetter<D>,
}

impl<D: 'static> FieldDescriptor<D> {
    /// Build a descriptor from arbitrary accessor closures
    pub fn new<G, S>(name: &'static str, owner: &'static str, getter: G, setter: S) -> Self
    where
        G: Fn(&D) -> Value + Send + Sync + 'static,
        S: Fn(&mut D, Value) -> Result<(), ValueExtractionError> + Send + Sync + 'static,
    {
        Self {
            name,
            owner,
            getter: Arc::new(getter),
            setter: Arc::new(setter),
        }
    }

    /// Build a descriptor for a plain struct field of a [`ValueType`]
    pub fn of<T>(
        name: &'static str,
        owner: &'static str,
        field: fn(&D) -> &T,
        field_mut: fn(&mut D) -> &mut T,
    ) -> Self
    where
        T: ValueType + Clone + 'static,
    {
        Self::new(
            name,
            owner,
            move |instance: &D| field(instance).clone().into_value(),
            move |instance: &mut D, value: Value| {
                *field_mut(instance) = T::from_value(value)?;
                Ok(())
            },
        )
    }

    /// Column and field name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Name of the type that declares the field
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// Read the field
    pub fn get(&self, instance: &D) -> Value {
        (self.getter)(instance)
    }

    /// Write the field
    ///
    /// # Errors
    ///
    /// Returns `ValueExtractionError` if `value` does not fit the field type.
    pub fn set(&self, instance: &mut D, value: Value) -> Result<(), ValueExtractionError> {
        (self.setter)(instance, value)
    }

    /// Re-target the descriptor at a type that embeds `D`.
    ///
    /// Name and owner are kept, so an ancestor field still reports its
    /// declaring type.
    pub fn project<C: 'static>(
        self,
        base: fn(&C) -> &D,
        base_mut: fn(&mut C) -> &mut D,
    ) -> FieldDescriptor<C> {
        let getter = self.getter;
        let setter = self.setter;
        FieldDescriptor {
            name: self.name,
            owner: self.owner,
            getter: Arc::new(move |instance: &C| getter(base(instance))),
            setter: Arc::new(move |instance: &mut C, value: Value| setter(base_mut(instance), value)),
        }
    }
}

impl<D> Clone for FieldDescriptor<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            owner: self.owner,
            getter: Arc::clone(&self.getter),
            setter: Arc::clone(&self.setter),
        }
    }
}

impl<D> fmt::Debug for FieldDescriptor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Audit {
        created_by: String,
    }

    #[derive(Default)]
    struct Invoice {
        audit: Audit,
        total: i64,
    }

    #[test]
    fn test_of_reads_and_writes() {
        let total = FieldDescriptor::of("total", "Invoice", |i: &Invoice| &i.total, |i: &mut Invoice| &mut i.total);
        let mut invoice = Invoice::default();

        total.set(&mut invoice, Value::BigInt(Some(120))).unwrap();
        assert_eq!(invoice.total, 120);
        assert_eq!(total.get(&invoice), Value::BigInt(Some(120)));
    }

    #[test]
    fn test_set_rejects_wrong_variant() {
        let total = FieldDescriptor::of("total", "Invoice", |i: &Invoice| &i.total, |i: &mut Invoice| &mut i.total);
        let mut invoice = Invoice::default();

        let err = total.set(&mut invoice, Value::Int(Some(1))).unwrap_err();
        assert!(matches!(err, ValueExtractionError::TypeMismatch { .. }));
        assert_eq!(invoice.total, 0);
    }

    #[test]
    fn test_project_keeps_owner() {
        let created_by = FieldDescriptor::of(
            "created_by",
            "Audit",
            |a: &Audit| &a.created_by,
            |a: &mut Audit| &mut a.created_by,
        );
        let projected = created_by.project(|i: &Invoice| &i.audit, |i: &mut Invoice| &mut i.audit);

        let mut invoice = Invoice::default();
        projected.set(&mut invoice, Value::from("ops")).unwrap();

        assert_eq!(invoice.audit.created_by, "ops");
        assert_eq!(projected.name(), "created_by");
        assert_eq!(projected.owner(), "Audit");
    }
}
