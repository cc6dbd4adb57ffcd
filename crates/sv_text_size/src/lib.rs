//! Byte-offset vocabulary shared by every crate in the workspace.
//!
//! A `u32`-based `TextSize`/`TextRange` pair instead of raw `usize`s, so that
//! offsets from the lexer, the syntax tree, and the formatter can't be
//! accidentally mixed with unrelated integers.

use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Range, Sub, SubAssign};

/// A zero-based byte offset into a source text. Backed by `u32`: source files
/// addressed by this crate are assumed to fit comfortably under 4 GiB.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextSize(u32);

impl TextSize {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn of(text: &str) -> Self {
        Self::try_from(text.len()).expect("text length does not fit in u32")
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub const fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TextSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TextSize {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl TryFrom<usize> for TextSize {
    type Error = std::num::TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Ok(Self(u32::try_from(value)?))
    }
}

impl From<TextSize> for usize {
    fn from(value: TextSize) -> Self {
        value.0 as usize
    }
}

impl Add for TextSize {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for TextSize {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for TextSize {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for TextSize {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// A half-open `[start, end)` byte range into a source text.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextRange {
    start: TextSize,
    end: TextSize,
}

impl TextRange {
    pub fn new(start: TextSize, end: TextSize) -> Self {
        assert!(start <= end, "range start {start:?} after end {end:?}");
        Self { start, end }
    }

    pub fn up_to(end: TextSize) -> Self {
        Self {
            start: TextSize::new(0),
            end,
        }
    }

    pub fn empty(offset: TextSize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub const fn start(self) -> TextSize {
        self.start
    }

    pub const fn end(self) -> TextSize {
        self.end
    }

    pub fn len(self) -> TextSize {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn contains(self, offset: TextSize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Whether `self` fully contains `other`, including equality.
    pub fn contains_range(self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersect(self, other: Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then(|| Self { start, end })
    }

    /// Smallest range covering both `self` and `other`.
    pub fn cover(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn to_range(self) -> Range<usize> {
        self.start.to_usize()..self.end.to_usize()
    }
}

impl fmt::Debug for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl Index<TextRange> for str {
    type Output = str;

    fn index(&self, index: TextRange) -> &Self::Output {
        &self[index.to_range()]
    }
}

/// Implemented by anything that owns a byte range in the source text.
pub trait Ranged {
    fn range(&self) -> TextRange;

    fn start(&self) -> TextSize {
        self.range().start()
    }

    fn end(&self) -> TextSize {
        self.range().end()
    }
}

impl Ranged for TextRange {
    fn range(&self) -> TextRange {
        *self
    }
}

/// Implemented by anything reporting its own length in bytes.
pub trait TextLen {
    fn text_len(&self) -> TextSize;
}

impl TextLen for str {
    fn text_len(&self) -> TextSize {
        TextSize::of(self)
    }
}

/// A one-based source line number, as used by diagnostics and `enabled_lines`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OneIndexed(u32);

impl OneIndexed {
    pub const MIN: Self = Self(1);

    pub fn new(value: u32) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

/// A bidirectional map between byte offsets and one-indexed `(line, column)`
/// pairs, built once per source file.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line; `line_starts[0] == 0`.
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn from_source(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (offset, ch) in text.char_indices() {
            if ch == '\n' {
                let next = offset + 1;
                line_starts.push(TextSize::try_from(next).expect("source too large"));
            }
        }
        Self {
            line_starts,
            len: text.text_len(),
        }
    }

    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// The byte range covered by one-indexed `line` (exclusive of its
    /// trailing newline's successor).
    pub fn line_range(&self, line: OneIndexed) -> TextRange {
        let index = (line.get() - 1) as usize;
        let start = self.line_starts[index];
        let end = self
            .line_starts
            .get(index + 1)
            .copied()
            .unwrap_or(self.len);
        TextRange::new(start, end)
    }

    pub fn line_index(&self, offset: TextSize) -> OneIndexed {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => OneIndexed::new(line as u32 + 1).unwrap(),
            Err(next_line) => OneIndexed::new(next_line as u32).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_eq_size!(TextSize, u32);
    static_assertions::assert_eq_size!(TextRange, [u32; 2]);

    #[test]
    fn range_cover_and_contains() {
        let a = TextRange::new(TextSize::new(2), TextSize::new(5));
        let b = TextRange::new(TextSize::new(4), TextSize::new(9));
        assert_eq!(a.cover(b), TextRange::new(TextSize::new(2), TextSize::new(9)));
        assert!(a.contains(TextSize::new(4)));
        assert!(!a.contains(TextSize::new(5)));
    }

    #[test]
    fn line_index_maps_offsets() {
        let index = LineIndex::from_source("abc\ndef\nghi");
        assert_eq!(index.line_count(), 3);
        assert_eq!(
            index.line_range(OneIndexed::new(2).unwrap()),
            TextRange::new(TextSize::new(4), TextSize::new(8))
        );
        assert_eq!(index.line_index(TextSize::new(5)), OneIndexed::new(2).unwrap());
    }
}
