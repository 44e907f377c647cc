//! Variable bindings persisted across steps
//!
//! - [`Environment`]: the live name → value mapping owned by the engine
//!
//! # Ordering
//!
//! Names keep the position of their first binding so the variables pane
//! stays stable while values change. Rebinding a name never moves it.
//!
//! # Atomic Steps
//!
//! A step runs against a [`Environment::fork`] of the environment and the fork
//! replaces the live one only when the step succeeds, so a failed step never
//! leaves a partial update behind. Lists and dicts are shared handles, so a
//! plain `clone` would still see the attempt's mutations; a fork deep copies
//! them while keeping names that alias one list aliased.

use super::value::{CopyMemo, Value};
use crate::snapshot::EnvSnapshot;
use rustc_hash::FxHashMap;

/// Mapping from identifier to value, with first-binding order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    values: FxHashMap<String, Value>,
    insertion_order: Vec<String>, // Track order of first binding
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: FxHashMap::default(),
            insertion_order: Vec::new(),
        }
    }

    /// Look up a binding
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Bind `name`, overwriting any previous value
    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            return;
        }
        self.insertion_order.push(name.to_string());
        self.values.insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bound names in first-binding order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.insertion_order.iter().map(String::as_str)
    }

    /// Independent working copy with the same aliasing between bindings
    pub fn fork(&self) -> Environment {
        let mut memo = CopyMemo::default();
        let values = self
            .insertion_order
            .iter()
            .filter_map(|name| {
                self.values
                    .get(name)
                    .map(|value| (name.clone(), value.deep_copy_with(&mut memo)))
            })
            .collect();
        Environment {
            values,
            insertion_order: self.insertion_order.clone(),
        }
    }

    /// Immutable copy of every binding; later mutation of `self` never shows
    /// in the returned snapshot
    pub fn get_all(&self) -> EnvSnapshot {
        let mut memo = CopyMemo::default();
        EnvSnapshot::new(
            self.insertion_order
                .iter()
                .filter_map(|name| {
                    self.values
                        .get(name)
                        .map(|value| (name.clone(), value.deep_copy_with(&mut memo)))
                })
                .collect(),
        )
    }

    /// Replace the mapping with a fresh empty one
    pub fn reset(&mut self) {
        *self = Environment::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut env = Environment::new();
        env.set("x", Value::Int(5));
        assert_eq!(env.get("x"), Some(&Value::Int(5)));
        assert!(env.contains("x"));
        assert!(!env.contains("y"));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_rebinding_keeps_position() {
        let mut env = Environment::new();
        env.set("a", Value::Int(1));
        env.set("b", Value::Int(2));
        env.set("a", Value::Str("again".to_string()));
        let names: Vec<&str> = env.names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(env.get("a"), Some(&Value::Str("again".to_string())));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut env = Environment::new();
        env.set("xs", Value::list(vec![Value::Int(1)]));
        let snapshot = env.get_all();

        if let Some(Value::List(items)) = env.get("xs") {
            items.borrow_mut().push(Value::Int(2));
        }
        env.set("y", Value::Int(3));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("xs"), Some(&Value::list(vec![Value::Int(1)])));
    }

    #[test]
    fn test_fork_is_independent_but_keeps_aliases() {
        let mut env = Environment::new();
        let shared = Value::list(vec![Value::Int(1)]);
        env.set("a", shared.clone());
        env.set("b", shared);

        let fork = env.fork();
        if let Some(Value::List(items)) = fork.get("a") {
            items.borrow_mut().push(Value::Int(2));
        }

        assert_eq!(fork.get("b").map(Value::repr), Some("[1, 2]".to_string()));
        assert_eq!(env.get("a").map(Value::repr), Some("[1]".to_string()));
        assert_eq!(env.get("b").map(Value::repr), Some("[1]".to_string()));
        assert_eq!(fork.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_reset_empties_environment() {
        let mut env = Environment::new();
        env.set("x", Value::Int(1));
        env.reset();
        assert!(env.is_empty());
        assert_eq!(env.names().count(), 0);
        assert_eq!(env, Environment::new());
    }
}
