//! Double-array trie mapping byte strings to ids.
//!
//! A transition on byte `c` from state `p` lands at `q = cells[p].base + c`
//! iff `cells[q].check == p`. A key is stored by a final transition on
//! [`TERMINATOR`] to a cell whose `base` holds the negated id.
mod builder;

use bincode::{Decode, Encode};

/// Byte that terminates every key.
pub const TERMINATOR: u8 = 0;

pub(crate) const ROOT: usize = 0;

/// A cell of a double array.
///
/// Unused cells have negative `base` and `check`, linking them into a cyclic
/// free list.
#[derive(Clone, Copy, Default, Debug, Eq, PartialEq, Decode, Encode)]
pub struct Cell {
    /// Offset of child transitions, or the negated id on terminal cells.
    pub base: i32,
    /// Index of the parent cell.
    pub check: i32,
}

/// Match of a key in the trie.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TrieMatch {
    /// Id associated with the key.
    pub id: u32,
    /// Length of the key in bytes.
    pub len: usize,
}

impl TrieMatch {
    /// Creates a new instance.
    #[inline(always)]
    pub const fn new(id: u32, len: usize) -> Self {
        Self { id, len }
    }
}

/// Search capabilities shared by the system index and user dictionaries.
pub trait Trie {
    /// Finds the id of the exact key.
    fn search(&self, key: &[u8]) -> Option<u32>;

    /// Enumerates keys that are prefixes of `input`, shortest first.
    fn common_prefix_search<'a>(&'a self, input: &'a [u8]) -> CommonPrefixIter<'a>;
}

/// Double-array trie.
#[derive(Clone, Default, Debug, Decode, Encode)]
pub struct DoubleArray {
    cells: Vec<Cell>,
}

impl DoubleArray {
    /// Finds the id of the exact key.
    pub fn search(&self, key: &[u8]) -> Option<u32> {
        let mut p = ROOT;
        for &c in key {
            if c == TERMINATOR {
                return None;
            }
            p = self.transition(p, c)?;
        }
        self.terminal(p)
    }

    /// Finds the longest key that is a prefix of `input`.
    pub fn prefix_search(&self, input: &[u8]) -> Option<TrieMatch> {
        self.common_prefix_search(input).last()
    }

    /// Enumerates keys that are prefixes of `input` in ascending length.
    #[inline(always)]
    pub fn common_prefix_search<'a>(&'a self, input: &'a [u8]) -> CommonPrefixIter<'a> {
        CommonPrefixIter {
            da: self,
            input,
            pos: 0,
            node: (!self.cells.is_empty()).then_some(ROOT),
        }
    }

    /// Gets the cells.
    #[inline(always)]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Gets the number of cells.
    #[inline(always)]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline(always)]
    fn transition(&self, p: usize, c: u8) -> Option<usize> {
        let base = self.cells.get(p)?.base;
        let q = usize::try_from(base.checked_add(i32::from(c))?).ok()?;
        let check = self.cells.get(q)?.check;
        (usize::try_from(check).ok()? == p).then_some(q)
    }

    #[inline(always)]
    fn terminal(&self, p: usize) -> Option<u32> {
        let q = self.transition(p, TERMINATOR)?;
        let base = self.cells[q].base;
        (base <= 0).then(|| base.unsigned_abs())
    }
}

impl Trie for DoubleArray {
    #[inline(always)]
    fn search(&self, key: &[u8]) -> Option<u32> {
        DoubleArray::search(self, key)
    }

    #[inline(always)]
    fn common_prefix_search<'a>(&'a self, input: &'a [u8]) -> CommonPrefixIter<'a> {
        DoubleArray::common_prefix_search(self, input)
    }
}

/// Iterator created by [`DoubleArray::common_prefix_search()`].
pub struct CommonPrefixIter<'a> {
    da: &'a DoubleArray,
    input: &'a [u8],
    pos: usize,
    node: Option<usize>,
}

impl Iterator for CommonPrefixIter<'_> {
    type Item = TrieMatch;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(p) = self.node {
            let pos = self.pos;
            self.node = match self.input.get(pos) {
                Some(&c) if c != TERMINATOR => self.da.transition(p, c),
                _ => None,
            };
            self.pos += 1;
            if pos != 0 {
                if let Some(id) = self.da.terminal(p) {
                    return Some(TrieMatch::new(id, pos));
                }
            }
        }
        None
    }
}
