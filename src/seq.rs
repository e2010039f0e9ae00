/*
 * Copyright 2021-2025 The Almanac Project Developers
 *
 * This file is part of Almanac.
 *
 * Almanac is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Lesser General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Almanac is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Lesser General Public License for more details.
 *
 * You should have received a copy of the GNU Lesser General Public License
 * along with Almanac.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Module containing order-preserving sequence helpers
//!
//! Ordering matters throughout the pipeline: diagnostic ordering, dedup
//! results, and the argument matcher's kind priority all depend on it.
//! `distinct_by` keeps the first occurrence, `group_by` keeps key-encounter
//! order, and `max_by_key_first` returns the *first* maximal element on
//! ties

use std::collections::HashSet;
use std::hash::Hash;

/// Removes duplicates from a sequence, keeping the first occurrence of each
/// key in its original position
#[must_use]
pub fn distinct_by<T, K: Eq + Hash>(
    items: impl IntoIterator<Item = T>,
    mut key: impl FnMut(&T) -> K,
) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

/// Groups a sequence by a key, with groups ordered by first encounter of
/// their key and elements kept in their original relative order
#[must_use]
pub fn group_by<T, K: Eq + Hash + Clone>(
    items: impl IntoIterator<Item = T>,
    mut key: impl FnMut(&T) -> K,
) -> Vec<(K, Vec<T>)> {
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let k = key(&item);
        match groups.iter_mut().find(|(existing, _)| *existing == k) {
            Some((_, members)) => members.push(item),
            None => groups.push((k, vec![item])),
        }
    }
    groups
}

/// Gets the element with the maximum key, returning the first extremal
/// element when several tie
#[must_use]
pub fn max_by_key_first<T, K: Ord>(
    items: impl IntoIterator<Item = T>,
    mut key: impl FnMut(&T) -> K,
) -> Option<T> {
    let mut best: Option<(T, K)> = None;
    for item in items {
        let k = key(&item);
        // Strict comparison keeps the earliest element on ties
        if best.as_ref().is_none_or(|(_, max)| k > *max) {
            best = Some((item, k));
        }
    }
    best.map(|(item, _)| item)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn distinct_keeps_first_seen_order() {
        assert_eq!(distinct_by([3, 1, 3, 2, 1], |&x| x), vec![3, 1, 2]);
        assert_eq!(
            distinct_by(["b", "a", "B", "a"], |s| s.to_lowercase()),
            vec!["b", "a"]
        );
        assert_eq!(distinct_by(Vec::<i32>::new(), |&x| x), Vec::<i32>::new());
    }

    #[test]
    fn group_by_keeps_encounter_order() {
        let groups = group_by([1, 4, 2, 5, 3], |&x| x % 3);
        assert_eq!(
            groups,
            vec![(1, vec![1, 4]), (2, vec![2, 5]), (0, vec![3])]
        );
    }

    #[test]
    fn max_returns_first_on_ties() {
        let items = [("a", 1), ("b", 2), ("c", 2), ("d", 0)];
        assert_eq!(max_by_key_first(items, |&(_, k)| k), Some(("b", 2)));
        let ties = [("a", 1), ("b", 1)];
        assert_eq!(max_by_key_first(ties, |&(_, k)| k), Some(("a", 1)));
        assert_eq!(max_by_key_first(Vec::<(i32, i32)>::new(), |&(_, k)| k), None);
    }
}
