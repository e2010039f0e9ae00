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

//! Module containing utilities for rendering diagnostics
//!
//! The [`RenderError`] trait is the bridge between the message subsystem and
//! pretty terminal output. [`did_you_mean()`] builds the name-suggestion
//! detail lines attached to unknown mnemonic, register, flag, and alias
//! messages

use crate::seq;

use std::fmt;

/// Wrapper to display an amount of arguments, with the right plural
#[derive(Debug, PartialEq, Eq)]
pub struct ArgCount(pub usize);

impl fmt::Display for ArgCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = if self.0 == 1 { "" } else { "s" };
        write!(f, "`{}` argument{s}", self.0)
    }
}

/// Builds a `did you mean ...?` detail line from the candidate names closest
/// to a mistyped name, or [`None`] if no candidate is close enough
///
/// # Parameters
///
/// * `target`: the name as written in the source
/// * `candidates`: valid names to search
#[must_use]
pub fn did_you_mean<'a>(
    target: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<String> {
    let mut closest = closest_names(target, candidates);
    if closest.is_empty() {
        return None;
    }
    closest.sort_unstable();
    // Backtick each name, comma-join when there are more than 2, and put an
    // `or` before the last
    let comma = if closest.len() > 2 { "," } else { "" };
    let mut list = String::new();
    for (i, name) in closest.iter().enumerate() {
        if i > 0 {
            list.push_str(comma);
            list.push(' ');
        }
        if i > 0 && i == closest.len() - 1 {
            list.push_str("or ");
        }
        list.push('`');
        list.push_str(name);
        list.push('`');
    }
    Some(format!("did you mean {list}?"))
}

/// Gets the candidate names at the minimum edit distance from the target,
/// among those within the distance cap
fn closest_names<'a>(
    target: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Vec<&'a str> {
    let limit = std::cmp::max(target.len() / 3, 1);
    let distances = seq::distinct_by(candidates, |&name| name)
        .into_iter()
        .filter_map(|name| Some((name, bounded_distance(name, target, limit)?)))
        .collect::<Vec<_>>();
    let Some(min) = distances.iter().map(|&(_, d)| d).min() else {
        return Vec::new();
    };
    distances
        .into_iter()
        .filter(|&(_, d)| d == min)
        .map(|(name, _)| name)
        .collect()
}

/// Edit distance between two strings, counting insertions, deletions,
/// substitutions, and transpositions of adjacent characters
///
/// Returns [`None`] when the distance exceeds the limit
fn bounded_distance(a: &str, b: &str, limit: usize) -> Option<usize> {
    let a = a.chars().collect::<Vec<_>>();
    let b = b.chars().collect::<Vec<_>>();
    // A length difference is a hard lower bound on the distance
    if a.len().abs_diff(b.len()) > limit {
        return None;
    }
    let mut prev_prev = vec![0; b.len() + 1];
    let mut prev = (0..=b.len()).collect::<Vec<_>>();
    let mut row = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let mut cost = (prev[j] + usize::from(ca != cb))
                .min(prev[j + 1] + 1)
                .min(row[j] + 1);
            if i > 0 && j > 0 && ca == b[j - 1] && a[i - 1] == cb {
                cost = cost.min(prev_prev[j - 1] + 1);
            }
            row[j + 1] = cost;
        }
        // Rotate the three rows, reusing the buffers
        std::mem::swap(&mut prev_prev, &mut prev);
        std::mem::swap(&mut prev, &mut row);
    }
    let distance = prev[b.len()];
    (distance <= limit).then_some(distance)
}

/// Trait representing an error that can be rendered for display
pub trait RenderError {
    /// Write the formatted error to a buffer. The written bytes should correspond to valid UTF-8
    ///
    /// # Parameters
    ///
    /// * `filename`: name of the file with the code
    /// * `src`: original source code parsed
    /// * `buffer`: writer in which to write the formatted error
    /// * `color`: whether to enable colors or not
    fn format(&self, filename: &str, src: &str, buffer: &mut Vec<u8>, color: bool);

    /// Render the error to a string
    ///
    /// # Parameters
    ///
    /// * `filename`: name of the file with the code
    /// * `src`: original source code parsed
    /// * `color`: whether to enable colors or not
    #[must_use]
    fn render(&self, filename: &str, src: &str, color: bool) -> String {
        let mut buffer = Vec::new();
        self.format(filename, src, &mut buffer, color);
        String::from_utf8(buffer).expect("the rendered error should be valid UTF-8")
    }
}
