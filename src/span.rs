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

//! Module containing the definition of source spans
//!
//! Spans are absolute character offset ranges into the full text of a single
//! source object, tagged with the index of that object within the build

/// Index of a source object within the ordered file map of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectIndex(pub u32);

impl ObjectIndex {
    /// Index of the first object of a build, used as a default context
    pub const FIRST: Self = Self(0);
}

/// Range of byte offsets into the source text
pub type Range = std::ops::Range<usize>;

/// Span of a lexical element within a source object
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Object the span points into
    pub context: ObjectIndex,
    /// Byte offset of the start of the span
    pub start: usize,
    /// Byte offset of the end of the span (exclusive)
    pub end: usize,
}

/// Value with an attached source span
pub type Spanned<T> = (T, Span);

/// Placeholder span for values without a meaningful source location
pub const DEFAULT_SPAN: Span = Span {
    context: ObjectIndex::FIRST,
    start: 0,
    end: 0,
};

impl Span {
    /// Gets the offset range covered by the span
    #[must_use]
    pub const fn into_range(self) -> Range {
        self.start..self.end
    }

    /// Gets the length of the span in bytes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Checks whether the span covers no characters
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Checks whether `other` is fully contained within this span
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        self.context.0 == other.context.0 && self.start <= other.start && other.end <= self.end
    }
}

impl chumsky::span::Span for Span {
    type Context = ObjectIndex;
    type Offset = usize;

    fn new(context: Self::Context, range: Range) -> Self {
        Self {
            context,
            start: range.start,
            end: range.end,
        }
    }

    fn context(&self) -> Self::Context {
        self.context
    }

    fn start(&self) -> Self::Offset {
        self.start
    }

    fn end(&self) -> Self::Offset {
        self.end
    }
}

impl std::fmt::Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]{}..{}", self.context.0, self.start, self.end)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
pub mod test {
    use super::{ObjectIndex, Span};

    pub type Range = std::ops::Range<usize>;
    /// Value paired with a plain offset range, used by test helpers
    pub type Ranged<T> = (T, Range);

    /// Conversion of test-friendly range representations into [`Span`]s
    pub trait IntoSpan {
        #[must_use]
        fn span(self) -> Span;
    }

    impl IntoSpan for Range {
        fn span(self) -> Span {
            Span {
                context: ObjectIndex::FIRST,
                start: self.start,
                end: self.end,
            }
        }
    }

    impl IntoSpan for (u32, Range) {
        fn span(self) -> Span {
            Span {
                context: ObjectIndex(self.0),
                start: self.1.start,
                end: self.1.end,
            }
        }
    }

    impl IntoSpan for Span {
        fn span(self) -> Span {
            self
        }
    }

    #[test]
    fn containment() {
        let span = |r: Range| r.span();
        assert!(span(0..10).contains(&span(2..5)));
        assert!(span(0..10).contains(&span(0..10)));
        assert!(!span(2..5).contains(&span(0..10)));
        assert!(!span(0..4).contains(&span(3..6)));
        assert!(!span(0..10).contains(&Span {
            context: ObjectIndex(1),
            start: 2,
            end: 5
        }));
    }
}
