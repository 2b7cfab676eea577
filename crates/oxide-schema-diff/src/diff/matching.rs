//! Old/new entity matching with rename tracking.
//!
//! A new entity matches the old entity named by its `old_name`, or else the
//! old entity with its own name. Matching runs once per entity kind and scope
//! before any statement is generated.

use std::collections::HashMap;

use crate::error::{DiffError, Result};
use crate::ident::Ident;
use crate::schema::{Column, Sequence, Table};

/// An entity that can be renamed between generations.
pub trait Renameable {
    /// Entity kind, for error messages.
    const KIND: &'static str;

    /// Current name.
    fn name(&self) -> &Ident;

    /// Name in an earlier generation, if declared.
    fn old_name(&self) -> Option<&Ident>;
}

impl Renameable for Table {
    const KIND: &'static str = "table";

    fn name(&self) -> &Ident {
        &self.name
    }

    fn old_name(&self) -> Option<&Ident> {
        self.old_name.as_ref()
    }
}

impl Renameable for Column {
    const KIND: &'static str = "column";

    fn name(&self) -> &Ident {
        &self.name
    }

    fn old_name(&self) -> Option<&Ident> {
        self.old_name.as_ref()
    }
}

impl Renameable for Sequence {
    const KIND: &'static str = "sequence";

    fn name(&self) -> &Ident {
        &self.name
    }

    fn old_name(&self) -> Option<&Ident> {
        self.old_name.as_ref()
    }
}

/// A new entity and the old entity it continues, if any.
#[derive(Debug)]
pub struct Entry<'a, T> {
    /// The entity in the new tree.
    pub new: &'a T,
    /// Its counterpart in the old tree.
    pub old: Option<&'a T>,
    /// Whether the counterpart was found through `old_name`.
    pub renamed: bool,
}

// Manual impls: a derive would require `T: Clone`.
impl<T> Clone for Entry<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Entry<'_, T> {}

/// The result of matching one scope of old entities against new ones.
#[derive(Debug)]
pub struct Matching<'a, T> {
    entries: Vec<Entry<'a, T>>,
    old: &'a [T],
    by_old: HashMap<Ident, usize>,
}

impl<'a, T: Renameable> Matching<'a, T> {
    /// Matches `new` against `old` within `scope` (a schema or table name).
    pub fn build(scope: &str, old: &'a [T], new: &'a [T], ignore_old_names: bool) -> Result<Self> {
        let old_index: HashMap<&Ident, &'a T> = old.iter().map(|e| (e.name(), e)).collect();

        // Rename claims first, so a plain name match can't steal a renamed entity.
        let mut claims: HashMap<Ident, usize> = HashMap::new();
        let mut targets: Vec<Option<(&'a T, bool)>> = vec![None; new.len()];
        if !ignore_old_names {
            for (i, entity) in new.iter().enumerate() {
                let Some(old_name) = entity.old_name() else {
                    continue;
                };
                if old_name == entity.name() {
                    return Err(DiffError::SelfRename {
                        schema: scope.to_string(),
                        kind: T::KIND,
                        name: entity.name().to_string(),
                    });
                }
                let Some(&previous) = old_index.get(old_name) else {
                    continue;
                };
                if let Some(&first) = claims.get(old_name) {
                    return Err(DiffError::AmbiguousRename {
                        schema: scope.to_string(),
                        kind: T::KIND,
                        old_name: old_name.to_string(),
                        first: new[first].name().to_string(),
                        second: entity.name().to_string(),
                    });
                }
                claims.insert(old_name.clone(), i);
                targets[i] = Some((previous, true));
            }
        }

        for (i, entity) in new.iter().enumerate() {
            if targets[i].is_some() {
                continue;
            }
            let Some(&previous) = old_index.get(entity.name()) else {
                continue;
            };
            if let Some(&claimant) = claims.get(entity.name()) {
                return Err(DiffError::AmbiguousRename {
                    schema: scope.to_string(),
                    kind: T::KIND,
                    old_name: entity.name().to_string(),
                    first: new[claimant].name().to_string(),
                    second: entity.name().to_string(),
                });
            }
            targets[i] = Some((previous, false));
        }

        let entries: Vec<Entry<'a, T>> = new
            .iter()
            .zip(targets)
            .map(|(entity, target)| Entry {
                new: entity,
                old: target.map(|(old, _)| old),
                renamed: target.is_some_and(|(_, renamed)| renamed),
            })
            .collect();
        let by_old = entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| entry.old.map(|old| (old.name().clone(), i)))
            .collect();

        Ok(Self {
            entries,
            old,
            by_old,
        })
    }

    /// Every new entity, in new declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry<'a, T>> {
        self.entries.iter()
    }

    /// New entities continuing an old one, as `(old, new)`.
    pub fn matched(&self) -> impl Iterator<Item = (&'a T, &'a T)> + '_ {
        self.entries
            .iter()
            .filter_map(|e| e.old.map(|old| (old, e.new)))
    }

    /// New entities without an old counterpart.
    pub fn created(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.entries
            .iter()
            .filter(|e| e.old.is_none())
            .map(|e| e.new)
    }

    /// The entry continuing `old`, if any.
    #[must_use]
    pub fn successor(&self, old: &T) -> Option<&Entry<'a, T>> {
        self.by_old.get(old.name()).map(|&i| &self.entries[i])
    }

    /// Old entities no new entity continues, in old declaration order.
    pub fn dropped(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.old
            .iter()
            .filter(|old| !self.by_old.contains_key(old.name()))
    }

    /// Old entities, in old declaration order.
    #[must_use]
    pub fn old(&self) -> &'a [T] {
        self.old
    }
}
