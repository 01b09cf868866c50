//! Unbounded tape storage.
//!
//! A [`Tape`] is conceptually bi-infinite: every position holds the blank symbol until it is
//! written. Cells are kept in a double-ended buffer whose first element sits at `origin`, so
//! growth in either direction is amortized and positions are plain signed integers.

use std::collections::VecDeque;

/// A single machine tape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: VecDeque<char>,
    origin: i64,
    blank: char,
}

/// The materialized part of a tape: its non-blank span and where that span starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Window {
    /// Position of the first character of `content`. Zero for an all-blank tape.
    pub origin: i64,
    /// Cells from the first to the last non-blank symbol, inclusive.
    pub content: String,
}

impl Tape {
    /// Creates a tape holding `content` from position 0 onwards.
    pub fn new(content: &str, blank: char) -> Self {
        Self {
            cells: content.chars().collect(),
            origin: 0,
            blank,
        }
    }

    /// Creates an all-blank tape.
    pub fn blank(blank: char) -> Self {
        Self::new("", blank)
    }

    /// The blank symbol of this tape.
    pub fn blank_symbol(&self) -> char {
        self.blank
    }

    /// Returns the symbol at `position`, or the blank if it was never stored.
    pub fn read(&self, position: i64) -> char {
        self.index(position)
            .and_then(|i| self.cells.get(i))
            .copied()
            .unwrap_or(self.blank)
    }

    /// Stores `symbol` at `position`, growing the buffer as needed.
    ///
    /// Blanks written outside the stored span change nothing and are not stored.
    ///
    /// # Panics
    ///
    /// Panics if the span between the stored cells and `position` exceeds the buffer's
    /// capacity. Heads of programs that pass [`analyze`](crate::analyze) stay within a
    /// bounded distance of the content.
    pub fn write(&mut self, position: i64, symbol: char) {
        if symbol == self.blank && !self.covers(position) {
            return;
        }

        if self.cells.is_empty() {
            self.origin = position;
            self.cells.push_back(symbol);
            return;
        }

        if position < self.origin {
            let gap = usize::try_from(self.origin.abs_diff(position)).unwrap_or(usize::MAX);
            self.cells.reserve(gap);
            for _ in 0..gap {
                self.cells.push_front(self.blank);
            }
            self.origin = position;
        }

        let index = usize::try_from(position.abs_diff(self.origin)).unwrap_or(usize::MAX);
        if index >= self.cells.len() {
            self.cells.resize(index.saturating_add(1), self.blank);
        }
        self.cells[index] = symbol;
    }

    fn covers(&self, position: i64) -> bool {
        self.index(position).is_some_and(|i| i < self.cells.len())
    }

    /// The lowest and highest positions stored so far, if any.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        let len = i64::try_from(self.cells.len()).ok()?;
        (len > 0).then(|| (self.origin, self.origin + (len - 1)))
    }

    /// Materializes the tape: the stored span trimmed of blanks at both ends.
    pub fn window(&self) -> Window {
        let first = self.cells.iter().position(|&c| c != self.blank);
        let last = self.cells.iter().rposition(|&c| c != self.blank);

        match (first, last) {
            (Some(first), Some(last)) => Window {
                origin: self.origin + first as i64,
                content: self.cells.range(first..=last).collect(),
            },
            _ => Window {
                origin: 0,
                content: String::new(),
            },
        }
    }

    /// The materialized content without its origin.
    pub fn contents(&self) -> String {
        self.window().content
    }

    fn index(&self, position: i64) -> Option<usize> {
        usize::try_from(position.checked_sub(self.origin)?).ok()
    }
}
