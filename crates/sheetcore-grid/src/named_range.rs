//! Sheet-scoped named ranges.
//!
//! Names are unique case-insensitively. Auto-adjusting names follow
//! structural edits with the same straddle rules as merged regions; a name
//! whose every line is deleted stays defined but dangles.

use rustc_hash::FxHashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use sheetcore_common::{GridError, RangePosition};

use crate::shift::ShiftOperation;

const MAX_NAME_LEN: usize = 255;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRange {
    name: String,
    target: Option<RangePosition>,
    auto_adjust: bool,
}

impl NamedRange {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The referenced range, or `None` once it has been deleted.
    pub fn target(&self) -> Option<RangePosition> {
        self.target
    }

    pub fn is_dangling(&self) -> bool {
        self.target.is_none()
    }

    pub fn auto_adjust(&self) -> bool {
        self.auto_adjust
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedRangeTable {
    names: FxHashMap<String, NamedRange>,
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

/// Check that `name` is usable as a defined name.
pub fn validate_name(name: &str) -> Result<(), GridError> {
    let invalid = |reason: &str| GridError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(invalid("name is empty"));
    };
    if name.chars().count() > MAX_NAME_LEN {
        return Err(invalid("name is longer than 255 characters"));
    }
    if !(first.is_alphabetic() || first == '_' || first == '\\') {
        return Err(invalid("name must start with a letter, '_' or '\\'"));
    }
    if let Some(bad) = chars.find(|c| !(c.is_alphanumeric() || matches!(c, '_' | '.' | '\\'))) {
        return Err(invalid(&format!("character '{bad}' is not allowed")));
    }
    Ok(())
}

impl NamedRangeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Define an auto-adjusting name.
    pub fn define(&mut self, name: &str, range: RangePosition) -> Result<(), GridError> {
        self.define_with(name, range, true)
    }

    pub fn define_with(
        &mut self,
        name: &str,
        range: RangePosition,
        auto_adjust: bool,
    ) -> Result<(), GridError> {
        validate_name(name)?;
        let key = key(name);
        if self.names.contains_key(&key) {
            return Err(GridError::DuplicateName(name.to_string()));
        }
        self.names.insert(
            key,
            NamedRange {
                name: name.to_string(),
                target: Some(range),
                auto_adjust,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&NamedRange> {
        self.names.get(&key(name))
    }

    pub fn resolve(&self, name: &str) -> Result<RangePosition, GridError> {
        let entry = self
            .get(name)
            .ok_or_else(|| GridError::NameNotFound(name.to_string()))?;
        entry
            .target
            .ok_or_else(|| GridError::DanglingName(entry.name.clone()))
    }

    pub fn remove(&mut self, name: &str) -> Result<NamedRange, GridError> {
        self.names
            .remove(&key(name))
            .ok_or_else(|| GridError::NameNotFound(name.to_string()))
    }

    /// Names ordered case-insensitively.
    pub fn iter(&self) -> impl Iterator<Item = &NamedRange> + '_ {
        let mut entries: Vec<(&String, &NamedRange)> = self.names.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, entry)| entry)
    }

    /// Put back an entry exactly as captured.
    pub(crate) fn restore(&mut self, entry: NamedRange) {
        self.names.insert(key(&entry.name), entry);
    }

    /// Re-map auto-adjusting names, returning the prior state of each one that changed.
    pub fn apply_shift(&mut self, op: &ShiftOperation) -> Vec<NamedRange> {
        let mut changed = Vec::new();
        for entry in self.names.values_mut() {
            if !entry.auto_adjust {
                continue;
            }
            let Some(target) = entry.target else {
                continue;
            };
            let next = op.adjust_range(&target);
            if next != Some(target) {
                changed.push(entry.clone());
                entry.target = next;
            }
        }
        changed.sort_by(|a, b| key(&a.name).cmp(&key(&b.name)));
        changed
    }
}
