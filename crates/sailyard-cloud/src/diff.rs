//! Set-difference between desired and current collections

use std::collections::HashSet;
use std::hash::Hash;

/// Elements to attach and to detach, in input order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDiff<T> {
    /// `desired − current`
    pub to_add: Vec<T>,
    /// `current − desired`
    pub to_remove: Vec<T>,
}

impl<T> SetDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }
}

impl<T> Default for SetDiff<T> {
    fn default() -> Self {
        Self {
            to_add: Vec::new(),
            to_remove: Vec::new(),
        }
    }
}

/// Compare two collections by a stable key. `None` is treated as empty.
///
/// Elements whose key appears more than once are reported once.
pub fn set_difference<T, K, F>(desired: Option<&[T]>, current: Option<&[T]>, key: F) -> SetDiff<T>
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let desired = desired.unwrap_or(&[]);
    let current = current.unwrap_or(&[]);

    let desired_keys: HashSet<K> = desired.iter().map(&key).collect();
    let current_keys: HashSet<K> = current.iter().map(&key).collect();

    SetDiff {
        to_add: only_in(desired, &current_keys, &key),
        to_remove: only_in(current, &desired_keys, &key),
    }
}

fn only_in<T, K, F>(items: &[T], other: &HashSet<K>, key: &F) -> Vec<T>
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| {
            let k = key(item);
            !other.contains(&k) && seen.insert(k)
        })
        .cloned()
        .collect()
}
