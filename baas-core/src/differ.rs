//! Differ - Compare desired state with current state
//!
//! Compares the attributes the user declared with the attributes read back
//! from the service and decides whether a create, an update or nothing is
//! required. [`diff`] only looks at what was declared; [`diff_replacement`]
//! also counts current attributes missing from the desired document, for
//! services whose update replaces the whole document.

use std::collections::HashMap;

use crate::resource::{Resource, ResourceId, State, Value};

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes);
    update_or_no_change(desired, current, changed)
}

/// Compare for a full replacement of the current document.
///
/// Attributes named in `computed` are ignored on both sides. Every other
/// current attribute must be desired with an equal value at every nesting
/// level; a missing one is a removal.
pub fn diff_replacement(desired: &Resource, current: &State, computed: &[&str]) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let mut changed: Vec<String> = desired
        .attributes
        .keys()
        .chain(current.attributes.keys())
        .filter(|key| !computed.contains(&key.as_str()))
        .filter(|key| {
            match (desired.attributes.get(*key), current.attributes.get(*key)) {
                (Some(d), Some(c)) => !same_value(d, c),
                _ => true,
            }
        })
        .cloned()
        .collect();
    changed.sort();
    changed.dedup();
    update_or_no_change(desired, current, changed)
}

fn update_or_no_change(desired: &Resource, current: &State, changed: Vec<String>) -> Diff {
    if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find desired attributes that differ from the current state.
///
/// Server-computed attributes the user did not declare are ignored, at every
/// nesting level.
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed: Vec<String> = desired
        .iter()
        .filter(|(key, desired_value)| match current.get(key.as_str()) {
            Some(current_value) => !is_contained(desired_value, current_value),
            None => true,
        })
        .map(|(key, _)| key.clone())
        .collect();
    changed.sort();
    changed
}

/// Whether every part of `desired` is present and equal in `current`
fn is_contained(desired: &Value, current: &Value) -> bool {
    match (desired, current) {
        (Value::Map(d), Value::Map(c)) => d
            .iter()
            .all(|(k, dv)| c.get(k).is_some_and(|cv| is_contained(dv, cv))),
        (Value::List(d), Value::List(c)) => {
            d.len() == c.len() && d.iter().zip(c).all(|(dv, cv)| is_contained(dv, cv))
        }
        (Value::Int(d), Value::Float(c)) => (*d as f64) == *c,
        _ => desired == current,
    }
}

/// Structural equality; an integer equals the same float
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, av)| b.get(k).is_some_and(|bv| same_value(av, bv)))
        }
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(av, bv)| same_value(av, bv))
        }
        (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => (*i as f64) == *f,
        _ => a == b,
    }
}
