//! Set difference over document array fields.
//!
//! Array fields such as `friends`, `participants` and `badges` are treated
//! as unordered sets. The helpers return elements in the order they appear
//! in the newer array, without duplicates.

use std::collections::HashSet;
use std::hash::Hash;

/// Elements of `after` that are not in `before`.
pub fn added<T>(before: &[T], after: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    added_by(before, after, |item| item.clone())
}

/// Elements of `before` that are no longer in `after`.
pub fn removed<T>(before: &[T], after: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    added(after, before)
}

/// Elements of `after` whose key is not present among the keys of `before`.
pub fn added_by<T, K, F>(before: &[T], after: &[T], key: F) -> Vec<T>
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let existing: HashSet<K> = before.iter().map(&key).collect();
    let mut seen = HashSet::new();
    after
        .iter()
        .filter(|item| {
            let k = key(item);
            !existing.contains(&k) && seen.insert(k)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn newly_added_elements_are_detected() {
        let before = ids(&["a", "b"]);
        let after = ids(&["a", "b", "c", "d"]);
        assert_eq!(added(&before, &after), ids(&["c", "d"]));
    }

    #[test]
    fn unchanged_array_yields_nothing() {
        let before = ids(&["a", "b"]);
        assert!(added(&before, &before.clone()).is_empty());
        assert!(removed(&before, &before.clone()).is_empty());
    }

    #[test]
    fn order_is_irrelevant() {
        let before = ids(&["b", "a"]);
        let after = ids(&["a", "b"]);
        assert!(added(&before, &after).is_empty());
    }

    #[test]
    fn removed_elements_are_detected() {
        let before = ids(&["a", "b", "c"]);
        let after = ids(&["c"]);
        assert_eq!(removed(&before, &after), ids(&["a", "b"]));
    }

    #[test]
    fn duplicates_in_after_are_reported_once() {
        let before = ids(&["a"]);
        let after = ids(&["a", "x", "x"]);
        assert_eq!(added(&before, &after), ids(&["x"]));
    }

    #[test]
    fn added_by_compares_keys_only() {
        let before = vec![("first_car", 1)];
        let after = vec![("first_car", 2), ("sos_hero", 3)];
        let new = added_by(&before, &after, |(id, _)| *id);
        assert_eq!(new, vec![("sos_hero", 3)]);
    }
}
