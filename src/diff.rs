//! Structural diff between domain instances
//!
//! [`diff`] compares two instances field by field, in registry column order,
//! and keeps the subject's value for every field that differs. Diffing an
//! instance against a blank instance of its own type ([`filter_fields`]) is how
//! a filter or order template turns into predicates or sort keys: set fields
//! take part, default-valued fields do not.
//!
//! A consequence worth knowing: a field deliberately set to its default
//! (`false`, `0`, `""`, `None`) looks exactly like an unset field and is
//! dropped from the result. Filters cannot express "age = 0".

use crate::domain::{Domain, Extends};
use crate::error::OrmError;
use crate::query::FilterClause;
use crate::registry::fields;
use sea_query::Value;
use std::any::{type_name, Any, TypeId};

/// Fields that differ between two instances, in registry column order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiffResult {
    entries: Vec<(&'static str, Value)>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The subject's value for a differing field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Differing field names in column order
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(field, _)| *field)
    }

    /// Subject values in column order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.entries.iter().map(|(field, value)| (*field, value))
    }

    pub fn into_values(self) -> Vec<Value> {
        self.entries.into_iter().map(|(_, value)| value).collect()
    }

    /// Equality predicates, one per differing field
    pub fn into_clauses(self) -> Vec<FilterClause> {
        self.entries
            .into_iter()
            .map(|(column, value)| FilterClause::Equals { column, value })
            .collect()
    }
}

impl IntoIterator for DiffResult {
    type Item = (&'static str, Value);
    type IntoIter = std::vec::IntoIter<(&'static str, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Structural equality of two field values.
///
/// Floats compare by bit pattern, so `NaN` equals itself and `-0.0` differs
/// from `0.0`. Every other variant uses `Value`'s own equality.
pub fn structurally_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => x.map(f32::to_bits) == y.map(f32::to_bits),
        (Value::Double(x), Value::Double(y)) => x.map(f64::to_bits) == y.map(f64::to_bits),
        _ => a == b,
    }
}

/// Fields of `D` whose value in `subject` differs from `other`.
///
/// `other` may be `D` itself or any type that extends `D`; only `D`'s fields
/// are compared. Values are compared with [`structurally_equal`]: two nulls
/// are equal, a null and a present value are not.
///
/// # Errors
///
/// Returns the registry error if `D`'s field table is invalid.
///
/// # Example
///
/// ```rust
/// use tidemark::{diff, Domain};
///
/// #[derive(Domain, Default, Clone)]
/// struct Person {
///     name: String,
///     age: i32,
/// }
///
/// let alice = Person { name: "Alice".into(), age: 30 };
/// let older = Person { age: 31, ..alice.clone() };
///
/// let changed = diff(&older, &alice).unwrap();
/// assert_eq!(changed.columns().collect::<Vec<_>>(), vec!["age"]);
/// ```
pub fn diff<D, O>(subject: &D, other: &O) -> Result<DiffResult, OrmError>
where
    D: Domain,
    O: Extends<D>,
{
    let other = other.base();
    let entries = fields::<D>()?
        .iter()
        .filter_map(|field| {
            let ours = field.get(subject);
            (!structurally_equal(&ours, &field.get(other))).then(|| (field.name(), ours))
        })
        .collect();
    Ok(DiffResult { entries })
}

/// Fields of `instance` that differ from a blank `D`.
///
/// # Errors
///
/// Returns the registry error if `D`'s field table is invalid.
pub fn filter_fields<D: Domain>(instance: &D) -> Result<DiffResult, OrmError> {
    diff(instance, &D::default())
}

/// Fields of `template`, seen through `D`'s columns, that differ from a blank
/// instance of the template's own type.
///
/// This is [`filter_fields`] for templates of a descendant type: the blank
/// instance is `F::default()`, so ancestor fields a descendant's `Default`
/// seeds count as unset.
///
/// # Errors
///
/// Returns the registry error if `D`'s field table is invalid.
pub fn template_fields<D, F>(template: &F) -> Result<DiffResult, OrmError>
where
    D: Domain,
    F: Extends<D>,
{
    diff(template.base(), F::default().base())
}

/// Object-safe view of a domain instance, for callers that only know the
/// runtime type.
pub trait AnyDomain: Any {
    /// Rust type name of the instance
    fn domain_name(&self) -> &'static str;

    /// The instance viewed as `target`, if it is or extends that type
    fn ancestor(&self, target: TypeId) -> Option<&dyn Any>;

    /// [`diff`] against an instance of unknown type
    ///
    /// # Errors
    ///
    /// Returns `OrmError::TypeMismatch` if `other` neither is nor extends
    /// `self`'s type.
    fn diff_against(&self, other: &dyn AnyDomain) -> Result<DiffResult, OrmError>;
}

impl<D: Domain> AnyDomain for D {
    fn domain_name(&self) -> &'static str {
        type_name::<D>()
    }

    fn ancestor(&self, target: TypeId) -> Option<&dyn Any> {
        self.as_ancestor(target)
    }

    fn diff_against(&self, other: &dyn AnyDomain) -> Result<DiffResult, OrmError> {
        let other_view = other
            .ancestor(TypeId::of::<D>())
            .and_then(|view| view.downcast_ref::<D>())
            .ok_or_else(|| OrmError::TypeMismatch {
                expected: type_name::<D>(),
                actual: other.domain_name(),
            })?;
        diff(self, other_view)
    }
}

/// Type-erased [`diff`]
///
/// # Errors
///
/// Returns `OrmError::TypeMismatch` if `other`'s runtime type is not
/// `subject`'s type or a descendant of it.
pub fn diff_any(subject: &dyn AnyDomain, other: &dyn AnyDomain) -> Result<DiffResult, OrmError> {
    subject.diff_against(other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldDescriptor;
    use crate::registry::FieldCache;

    #[derive(Default, Clone, Debug, PartialEq)]
    struct Person {
        name: String,
        age: i32,
        nickname: Option<String>,
    }

    impl Domain for Person {
        const TABLE_NAME: &'static str = "Person";

        fn descriptors() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::of("name", "Person", |p: &Person| &p.name, |p: &mut Person| &mut p.name),
                FieldDescriptor::of("age", "Person", |p: &Person| &p.age, |p: &mut Person| &mut p.age),
                FieldDescriptor::of(
                    "nickname",
                    "Person",
                    |p: &Person| &p.nickname,
                    |p: &mut Person| &mut p.nickname,
                ),
            ]
        }

        fn field_cache() -> &'static FieldCache<Self> {
            static CACHE: FieldCache<Person> = FieldCache::new();
            &CACHE
        }
    }

    #[derive(Default)]
    struct Robot {
        serial: i64,
    }

    impl Domain for Robot {
        const TABLE_NAME: &'static str = "Robot";

        fn descriptors() -> Vec<FieldDescriptor<Self>> {
            vec![FieldDescriptor::of("serial", "Robot", |r: &Robot| &r.serial, |r: &mut Robot| &mut r.serial)]
        }

        fn field_cache() -> &'static FieldCache<Self> {
            static CACHE: FieldCache<Robot> = FieldCache::new();
            &CACHE
        }
    }

    #[derive(Default, Clone)]
    struct Reading {
        value: f64,
        ratio: Option<f32>,
    }

    impl Domain for Reading {
        const TABLE_NAME: &'static str = "Reading";

        fn descriptors() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::of("value", "Reading", |r: &Reading| &r.value, |r: &mut Reading| &mut r.value),
                FieldDescriptor::of("ratio", "Reading", |r: &Reading| &r.ratio, |r: &mut Reading| &mut r.ratio),
            ]
        }

        fn field_cache() -> &'static FieldCache<Self> {
            static CACHE: FieldCache<Reading> = FieldCache::new();
            &CACHE
        }
    }

    /// A descendant whose blank instance seeds an ancestor field
    #[derive(Clone)]
    struct Adult {
        person: Person,
        badge: i32,
    }

    impl Default for Adult {
        fn default() -> Self {
            Adult {
                person: Person {
                    age: 18,
                    ..Person::default()
                },
                badge: 0,
            }
        }
    }

    impl Domain for Adult {
        const TABLE_NAME: &'static str = "Adult";

        fn descriptors() -> Vec<FieldDescriptor<Self>> {
            let mut fields: Vec<_> = Person::descriptors()
                .into_iter()
                .map(|f| f.project(|a: &Adult| &a.person, |a: &mut Adult| &mut a.person))
                .collect();
            fields.push(FieldDescriptor::of("badge", "Adult", |a: &Adult| &a.badge, |a: &mut Adult| &mut a.badge));
            fields
        }

        fn field_cache() -> &'static FieldCache<Self> {
            static CACHE: FieldCache<Adult> = FieldCache::new();
            &CACHE
        }
    }

    impl Extends<Person> for Adult {
        fn base(&self) -> &Person {
            &self.person
        }
    }

    #[test]
    fn test_diff_of_copy_is_empty() {
        let alice = Person {
            name: "Alice".into(),
            age: 30,
            nickname: Some("Al".into()),
        };
        assert!(diff(&alice, &alice.clone()).unwrap().is_empty());
    }

    #[test]
    fn test_diff_keeps_subject_values_in_column_order() {
        let subject = Person {
            name: "Bob".into(),
            age: 0,
            nickname: Some("B".into()),
        };
        let other = Person {
            name: "Alice".into(),
            age: 0,
            nickname: None,
        };

        let result = diff(&subject, &other).unwrap();
        assert_eq!(result.columns().collect::<Vec<_>>(), vec!["name", "nickname"]);
        assert_eq!(result.get("name"), Some(&Value::String(Some("Bob".into()))));
        assert_eq!(result.get("nickname"), Some(&Value::String(Some("B".into()))));
    }

    #[test]
    fn test_null_against_present_differs() {
        let subject = Person::default();
        let other = Person {
            nickname: Some("x".into()),
            ..Person::default()
        };

        let result = diff(&subject, &other).unwrap();
        assert_eq!(result.get("nickname"), Some(&Value::String(None)));
    }

    #[test]
    fn test_blank_instance_has_no_filters() {
        assert!(filter_fields(&Person::default()).unwrap().is_empty());
    }

    #[test]
    fn test_single_set_field_is_only_filter() {
        let filter = Person {
            age: 30,
            ..Person::default()
        };

        let result = filter_fields(&filter).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("age"), Some(&Value::Int(Some(30))));
    }

    #[test]
    fn test_default_valued_filter_is_indistinguishable_from_unset() {
        // age = 0 is a legitimate value but equals the blank instance
        let filter = Person {
            name: "Alice".into(),
            age: 0,
            nickname: None,
        };

        let result = filter_fields(&filter).unwrap();
        assert_eq!(result.columns().collect::<Vec<_>>(), vec!["name"]);
        assert!(!result.contains("age"));
    }

    #[test]
    fn test_into_clauses() {
        let filter = Person {
            name: "Alice".into(),
            ..Person::default()
        };

        let clauses = filter_fields(&filter).unwrap().into_clauses();
        assert_eq!(
            clauses,
            vec![FilterClause::Equals {
                column: "name",
                value: Value::String(Some("Alice".into())),
            }]
        );
    }

    #[test]
    fn test_nan_copy_has_empty_diff() {
        let reading = Reading {
            value: f64::NAN,
            ratio: Some(f32::NAN),
        };
        assert!(diff(&reading, &reading.clone()).unwrap().is_empty());
    }

    #[test]
    fn test_negative_zero_is_a_filter_value() {
        let filter = Reading {
            value: -0.0,
            ratio: None,
        };

        let result = filter_fields(&filter).unwrap();
        assert_eq!(result.columns().collect::<Vec<_>>(), vec!["value"]);
        assert!(structurally_equal(&Value::Double(None), &Value::Double(None)));
        assert!(!structurally_equal(&Value::Double(Some(0.0)), &Value::Double(Some(-0.0))));
    }

    #[test]
    fn test_template_fields_use_the_templates_own_blank() {
        // age = 18 is Adult's blank value, so it is not a predicate
        let blank = template_fields::<Person, _>(&Adult::default()).unwrap();
        assert!(blank.is_empty());

        let mut infant = Adult::default();
        infant.person.age = 0;
        let result = template_fields::<Person, _>(&infant).unwrap();
        assert_eq!(result.get("age"), Some(&Value::Int(Some(0))));

        // the descendant's own field is not one of Person's columns
        infant.badge = 7;
        let result = template_fields::<Person, _>(&infant).unwrap();
        assert_eq!(result.columns().collect::<Vec<_>>(), vec!["age"]);
    }

    #[test]
    fn test_diff_any_same_type() {
        let a = Person {
            age: 3,
            ..Person::default()
        };
        let b = Person::default();

        let result = diff_any(&a, &b).unwrap();
        assert_eq!(result.columns().collect::<Vec<_>>(), vec!["age"]);
    }

    #[test]
    fn test_diff_any_rejects_unrelated_type() {
        let err = diff_any(&Person::default(), &Robot::default()).unwrap_err();
        assert!(matches!(err, OrmError::TypeMismatch { .. }));
    }
}
