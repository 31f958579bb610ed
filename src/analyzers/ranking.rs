//! Deterministic leaderboard ordering.
//!
//! Every list is sorted by its defining metric as reported (after
//! rounding), then by sample count descending, then by entity id ascending.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntityId<'a> {
    Number(u64),
    Name(&'a str),
    Pair(&'a str, &'a str),
}

/// An entry that can be placed on a leaderboard.
pub trait Ranked {
    fn sample_count(&self) -> usize;
    fn entity_id(&self) -> EntityId<'_>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Largest metric first.
    Descending,
    /// Smallest metric first.
    Ascending,
}

pub fn compare<T: Ranked>(a: &T, b: &T, key: impl Fn(&T) -> f64, direction: Direction) -> Ordering {
    let primary = match direction {
        Direction::Descending => key(b).total_cmp(&key(a)),
        Direction::Ascending => key(a).total_cmp(&key(b)),
    };
    primary
        .then_with(|| b.sample_count().cmp(&a.sample_count()))
        .then_with(|| a.entity_id().cmp(&b.entity_id()))
}

/// Sorts `items` by `key` and keeps the first `n`.
pub fn top_n<T: Ranked>(mut items: Vec<T>, key: impl Fn(&T) -> f64, direction: Direction, n: usize) -> Vec<T> {
    items.sort_by(|a, b| compare(a, b, &key, direction));
    items.truncate(n);
    items
}

/// Sorts by sample count descending, then entity id.
pub fn top_by_count<T: Ranked>(items: Vec<T>, n: usize) -> Vec<T> {
    top_n(items, |item| item.sample_count() as f64, Direction::Descending, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Entry {
        id: &'static str,
        score: f64,
        count: usize,
    }

    impl Ranked for Entry {
        fn sample_count(&self) -> usize {
            self.count
        }

        fn entity_id(&self) -> EntityId<'_> {
            EntityId::Name(self.id)
        }
    }

    fn entry(id: &'static str, score: f64, count: usize) -> Entry {
        Entry { id, score, count }
    }

    fn ids(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_tie_break_by_count_then_id() {
        let items = vec![
            entry("c", 1.5, 3),
            entry("b", 1.5, 5),
            entry("a", 1.5, 3),
            entry("d", 2.0, 1),
        ];
        let ranked = top_n(items, |e| e.score, Direction::Descending, 10);
        assert_eq!(ids(&ranked), vec!["d", "b", "a", "c"]);
    }

    #[test]
    fn test_ascending_and_truncation() {
        let items = vec![entry("x", 3.0, 1), entry("y", 1.0, 1), entry("z", 2.0, 1)];
        let ranked = top_n(items, |e| e.score, Direction::Ascending, 2);
        assert_eq!(ids(&ranked), vec!["y", "z"]);
    }

    #[test]
    fn test_top_by_count() {
        let items = vec![entry("b", 0.0, 4), entry("a", 9.0, 4), entry("c", 0.0, 7)];
        assert_eq!(ids(&top_by_count(items, 15)), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_entity_id_order() {
        assert!(EntityId::Number(9) < EntityId::Number(10));
        assert!(EntityId::Name("a") < EntityId::Name("b"));
    }
}
