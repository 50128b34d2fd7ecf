use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use bincode::{Decode, Encode};

use crate::double_array::{CommonPrefixIter, DoubleArray, Trie, TERMINATOR};
use crate::utils::FromU32;

/// Surface index of the system lexicon.
///
/// Records sharing a surface are stored contiguously. The trie maps the
/// surface to the first record, and `dup` counts the additional ones.
#[derive(Default, Debug, Clone, Decode, Encode)]
pub struct LexiconIndex {
    da: DoubleArray,
    dup: BTreeMap<u32, u32>,
}

impl LexiconIndex {
    pub fn new(da: DoubleArray, dup: BTreeMap<u32, u32>) -> Self {
        Self { da, dup }
    }

    /// Gets the number of records following `word_id` with the same surface.
    #[inline(always)]
    pub fn dup(&self, word_id: u32) -> u32 {
        self.dup.get(&word_id).copied().unwrap_or(0)
    }

    /// Expands the first record id of a surface to all its record ids.
    #[inline(always)]
    pub fn word_ids(&self, word_id: u32) -> RangeInclusive<u32> {
        word_id..=word_id + self.dup(word_id)
    }

    /// Checks that every stored id addresses `num_words` records.
    pub(crate) fn verify(&self, num_words: usize) -> Result<(), String> {
        let cells = self.da.cells();
        for (q, cell) in cells.iter().enumerate().skip(1) {
            let Some(parent) = usize::try_from(cell.check).ok().and_then(|p| cells.get(p)) else {
                continue;
            };
            let terminal = i64::from(parent.base) + i64::from(TERMINATOR) == q as i64;
            if !terminal {
                continue;
            }
            let id = cell.base.unsigned_abs();
            if cell.base > 0 || usize::from_u32(id) + usize::from_u32(self.dup(id)) >= num_words {
                return Err(format!("A trie id is out of the morph list, {id}"));
            }
        }
        if let Some((&id, &n)) = self
            .dup
            .iter()
            .find(|(&id, &n)| usize::from_u32(id) + usize::from_u32(n) >= num_words)
        {
            return Err(format!("A duplicate run is out of the morph list, {id}+{n}"));
        }
        Ok(())
    }
}

impl Trie for LexiconIndex {
    #[inline(always)]
    fn search(&self, key: &[u8]) -> Option<u32> {
        self.da.search(key)
    }

    #[inline(always)]
    fn common_prefix_search<'a>(&'a self, input: &'a [u8]) -> CommonPrefixIter<'a> {
        self.da.common_prefix_search(input)
    }
}
