//! Field registry: the per-type cache of persistable field descriptors
//!
//! Each concrete domain type owns one [`FieldCache`] static. The first call to
//! [`fields`] builds the type's [`FieldMap`] from its descriptor table and
//! publishes it with a single atomic compare-and-swap. Racing first callers may
//! each build a map; the first one published wins and the others are dropped.
//! Readers only ever see a fully built map, and after publication every read is
//! a lock-free pointer load. Entries live until the process exits.

use crate::domain::{Domain, FieldDescriptor};
use crate::error::OrmError;
use once_cell::race::OnceBox;
use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Registry slot for one domain type
pub struct FieldCache<D: 'static> {
    slot: OnceBox<FieldMap<D>>,
}

impl<D: 'static> FieldCache<D> {
    pub const fn new() -> Self {
        Self {
            slot: OnceBox::new(),
        }
    }

    /// The published map, if any
    pub fn get(&self) -> Option<&FieldMap<D>> {
        self.slot.get()
    }
}

impl<D: 'static> Default for FieldCache<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered mapping from field name to descriptor for one domain type
pub struct FieldMap<D: 'static> {
    fields: Vec<FieldDescriptor<D>>,
    index: HashMap<&'static str, usize>,
}

impl<D: 'static> FieldMap<D> {
    /// Build a map, keeping descriptor order
    ///
    /// # Errors
    ///
    /// Returns `OrmError::DuplicateField` if two descriptors share a name.
    pub fn build(domain: &'static str, fields: Vec<FieldDescriptor<D>>) -> Result<Self, OrmError> {
        let mut index = HashMap::with_capacity(fields.len());
        for (position, field) in fields.iter().enumerate() {
            if index.insert(field.name(), position).is_some() {
                return Err(OrmError::DuplicateField {
                    domain,
                    field: field.name(),
                });
            }
        }
        Ok(Self { fields, index })
    }

    /// Field names in column order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(FieldDescriptor::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor<D>> {
        self.fields.iter()
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor<D>> {
        self.index.get(name).map(|&position| &self.fields[position])
    }

    /// Column position of a field
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<D: 'static> fmt::Debug for FieldMap<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Persistable fields of `D`, built on first use and cached for the process.
///
/// Repeated calls return the same entry, so names and order never change.
///
/// # Errors
///
/// Returns `OrmError::DuplicateField` if the descriptor table repeats a name
/// (for example a field that shadows an ancestor field). Nothing is cached in
/// that case.
pub fn fields<D: Domain>() -> Result<&'static FieldMap<D>, OrmError> {
    let cache: &'static FieldCache<D> = D::field_cache();
    cache.slot.get_or_try_init(|| {
        let domain = std::any::type_name::<D>();
        let map = FieldMap::build(domain, D::descriptors())?;
        log::debug!(
            "registered {} field(s) for domain {} (table {})",
            map.len(),
            domain,
            D::TABLE_NAME
        );
        #[cfg(feature = "metrics")]
        METRICS.record_registry_build();
        Ok(Box::new(map))
    })
}
