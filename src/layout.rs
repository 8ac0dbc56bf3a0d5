//! Page and spread bookkeeping handed to container writers.
//!
//! [`PageMap`] relocates bookmarks and table-of-contents anchors from source page
//! indices to output page indices. [`SpreadMap`] records the physical spread side of
//! every output page produced by a spread, and can resolve the page-spread property
//! of a whole book for fixed-layout formats.

use std::collections::BTreeMap;

use crate::types::{Direction, SpreadSide};

/// Ordered `(source index, primary output index)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct PageMap {
    entries: Vec<(usize, usize)>,
}

impl PageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, source_index: usize, output_index: usize) {
        self.entries.push((source_index, output_index));
    }

    pub fn entries(&self) -> &[(usize, usize)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, usize)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if every source page kept its own index.
    pub fn is_identity(&self) -> bool {
        self.entries.iter().all(|(source, output)| source == output)
    }

    /// Output index a source page was moved to.
    pub fn relocate(&self, source_index: usize) -> Option<usize> {
        self.entries
            .iter()
            .find(|(source, _)| *source == source_index)
            .map(|(_, output)| *output)
    }

    /// Moves a list of bookmark page indices to their output pages.
    ///
    /// Indices absent from the map are kept as they are.
    pub fn relocate_bookmarks(&self, bookmarks: &[usize]) -> Vec<usize> {
        bookmarks
            .iter()
            .map(|&page| self.relocate(page).unwrap_or(page))
            .collect()
    }
}

impl<'a> IntoIterator for &'a PageMap {
    type Item = &'a (usize, usize);
    type IntoIter = std::slice::Iter<'a, (usize, usize)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Output index to spread side, for output pages that belong to a spread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct SpreadMap {
    sides: BTreeMap<usize, SpreadSide>,
}

impl SpreadMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, output_index: usize, side: SpreadSide) {
        self.sides.insert(output_index, side);
    }

    pub fn get(&self, output_index: usize) -> Option<SpreadSide> {
        self.sides.get(&output_index).copied()
    }

    pub fn contains(&self, output_index: usize) -> bool {
        self.sides.contains_key(&output_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, SpreadSide)> + '_ {
        self.sides.iter().map(|(index, side)| (*index, *side))
    }

    pub fn len(&self) -> usize {
        self.sides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }

    /// Resolves the spread side of every output page of a book.
    ///
    /// The cover is centered. Pages recorded in this map keep their side and restart
    /// the alternation; every other page alternates, beginning on the side where a
    /// reading pair starts (left for LTR, right for RTL).
    pub fn resolve_page_sides(&self, total_pages: usize, direction: Direction) -> Vec<SpreadSide> {
        let (first, second) = match direction {
            Direction::Ltr => (SpreadSide::Left, SpreadSide::Right),
            Direction::Rtl => (SpreadSide::Right, SpreadSide::Left),
        };

        let mut next = first;
        let mut sides = Vec::with_capacity(total_pages);
        for index in 0..total_pages {
            if index == 0 {
                sides.push(SpreadSide::Center);
                next = first;
            } else if let Some(side) = self.get(index) {
                sides.push(side);
                next = first;
            } else {
                sides.push(next);
                next = if next == first { second } else { first };
            }
        }
        sides
    }
}

impl SpreadSide {
    /// Value of the EPUB `page-spread-*` / `rendition:page-spread-*` property.
    pub fn as_property(&self) -> &'static str {
        match self {
            SpreadSide::Center => "center",
            SpreadSide::Left => "left",
            SpreadSide::Right => "right",
        }
    }
}
