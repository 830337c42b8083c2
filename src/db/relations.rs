/// Relation reconciliation
///
/// Computes the minimal set of row removals and insertions that turn the
/// stored child rows of an aggregate into a desired list. Rows are matched by
/// a caller-supplied composite key and compared by value, so a row whose key
/// survives but whose payload changed (order, details, ...) is replaced.
use crate::error::{CatalogError, CatalogResult};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Plan produced by [`diff_relations`].
///
/// Callers must apply every entry of `removed` before any entry of `added`:
/// a replaced row keeps its key, and inserting first would collide with the
/// row it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDiff<R> {
    pub removed: Vec<R>,
    pub added: Vec<R>,
}

impl<R> RelationDiff<R> {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Diff two ordered relation lists keyed by `key`.
///
/// `removed` preserves the order of `previous`, `added` the order of `next`.
/// A key appearing twice within one list is rejected.
pub fn diff_relations<R, K, F>(previous: &[R], next: &[R], key: F) -> CatalogResult<RelationDiff<R>>
where
    R: Clone + PartialEq,
    K: Hash + Eq + Debug,
    F: Fn(&R) -> K,
{
    let previous_by_key = index_by_key(previous, &key)?;
    let next_by_key = index_by_key(next, &key)?;

    let removed = previous
        .iter()
        .filter(|&item| next_by_key.get(&key(item)) != Some(&item))
        .cloned()
        .collect();

    let added = next
        .iter()
        .filter(|&item| previous_by_key.get(&key(item)) != Some(&item))
        .cloned()
        .collect();

    Ok(RelationDiff { removed, added })
}

fn index_by_key<'a, R, K, F>(items: &'a [R], key: &F) -> CatalogResult<HashMap<K, &'a R>>
where
    K: Hash + Eq + Debug,
    F: Fn(&R) -> K,
{
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        let k = key(item);
        if map.contains_key(&k) {
            return Err(CatalogError::Validation(format!(
                "duplicate relation key {:?}",
                k
            )));
        }
        map.insert(k, item);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Credit {
        star_id: i64,
        role: &'static str,
        details: Option<&'static str>,
        order_no: i32,
    }

    fn credit(star_id: i64, role: &'static str, order_no: i32) -> Credit {
        Credit {
            star_id,
            role,
            details: None,
            order_no,
        }
    }

    fn key(c: &Credit) -> (i64, &'static str) {
        (c.star_id, c.role)
    }

    #[test]
    fn test_identical_lists_produce_no_changes() {
        let list = vec![credit(1, "director", 0), credit(2, "actor", 1)];

        let diff = diff_relations(&list, &list.clone(), key).unwrap();

        assert!(diff.is_empty());
    }

    #[test]
    fn test_empty_previous_only_adds() {
        let next = vec![credit(1, "director", 0), credit(2, "actor", 1)];

        let diff = diff_relations(&[], &next, key).unwrap();

        assert!(diff.removed.is_empty());
        assert_eq!(diff.added, next);
    }

    #[test]
    fn test_empty_next_only_removes() {
        let previous = vec![credit(1, "director", 0), credit(2, "actor", 1)];

        let diff = diff_relations(&previous, &[], key).unwrap();

        assert_eq!(diff.removed, previous);
        assert!(diff.added.is_empty());
    }

    #[test]
    fn test_unique_keys_removed_and_added_shared_unchanged_kept() {
        let previous = vec![credit(1, "director", 0), credit(2, "actor", 1)];
        let next = vec![credit(1, "director", 0), credit(3, "actor", 1)];

        let diff = diff_relations(&previous, &next, key).unwrap();

        assert_eq!(diff.removed, vec![credit(2, "actor", 1)]);
        assert_eq!(diff.added, vec![credit(3, "actor", 1)]);
    }

    #[test]
    fn test_changed_value_under_same_key_is_replaced() {
        let previous = vec![credit(1, "actor", 0)];
        let mut changed = credit(1, "actor", 0);
        changed.details = Some("Obi-Wan Kenobi");
        let next = vec![changed.clone()];

        let diff = diff_relations(&previous, &next, key).unwrap();

        assert_eq!(diff.removed, previous);
        assert_eq!(diff.added, vec![changed]);
    }

    #[test]
    fn test_reorder_replaces_moved_rows_only() {
        let previous = vec![
            credit(1, "actor", 0),
            credit(2, "actor", 1),
            credit(3, "actor", 2),
        ];
        let next = vec![
            credit(2, "actor", 0),
            credit(1, "actor", 1),
            credit(3, "actor", 2),
        ];

        let diff = diff_relations(&previous, &next, key).unwrap();

        assert_eq!(diff.removed, vec![credit(1, "actor", 0), credit(2, "actor", 1)]);
        assert_eq!(diff.added, vec![credit(2, "actor", 0), credit(1, "actor", 1)]);
    }

    #[test]
    fn test_same_star_under_different_roles_is_distinct() {
        let previous = vec![credit(1, "director", 0)];
        let next = vec![credit(1, "director", 0), credit(1, "producer", 1)];

        let diff = diff_relations(&previous, &next, key).unwrap();

        assert!(diff.removed.is_empty());
        assert_eq!(diff.added, vec![credit(1, "producer", 1)]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let next = vec![credit(1, "actor", 0), credit(1, "actor", 1)];

        let err = diff_relations(&[], &next, key).unwrap_err();

        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn test_every_key_accounted_for_exactly_once() {
        let previous: Vec<Credit> = (0..20).map(|i| credit(i, "actor", i as i32)).collect();
        let next: Vec<Credit> = (10..30)
            .map(|i| credit(i, "actor", (i - 10) as i32))
            .collect();

        let diff = diff_relations(&previous, &next, key).unwrap();

        // 0..10 only in previous, 10..20 shared but moved, 20..30 only in next
        assert_eq!(diff.removed.len(), 20);
        assert_eq!(diff.added.len(), 20);
        for id in 0..20 {
            assert_eq!(diff.removed.iter().filter(|c| c.star_id == id).count(), 1);
        }
        for id in 10..30 {
            assert_eq!(diff.added.iter().filter(|c| c.star_id == id).count(), 1);
        }
    }
}
