mod builder;
mod index;
mod param;

use bincode::{Decode, Encode};

use crate::dictionary::connector::ConnectionTable;
use crate::double_array::Trie;
use crate::errors::{Result, SumomoError};
use crate::utils::FromU32;

pub use builder::ColumnSpec;
pub use index::LexiconIndex;
pub use param::{Morph, MorphStore};

/// System lexicon of known words.
#[derive(Default, Debug, Clone, Decode, Encode)]
pub struct Lexicon {
    index: LexiconIndex,
    store: MorphStore,
}

impl Lexicon {
    pub(crate) fn from_parts(index: LexiconIndex, store: MorphStore) -> Self {
        Self { index, store }
    }

    /// Enumerates all the records whose surfaces are prefixes of `input`,
    /// shortest first, then in record order.
    #[inline(always)]
    pub(crate) fn common_prefix_iterator<'a>(
        &'a self,
        input: &'a [u8],
    ) -> impl Iterator<Item = LexMatch> + 'a {
        self.index.common_prefix_search(input).flat_map(move |m| {
            self.index.word_ids(m.id).map(move |word_id| {
                LexMatch::new(word_id, self.store.morph(usize::from_u32(word_id)), m.len)
            })
        })
    }

    /// Gets the record ids of the exact surface.
    pub fn lookup(&self, surface: &str) -> Vec<u32> {
        self.index
            .search(surface.as_bytes())
            .map_or_else(Vec::new, |id| self.index.word_ids(id).collect())
    }

    /// Gets the parameters of a record.
    #[inline(always)]
    pub fn morph(&self, word_id: u32) -> Morph {
        self.store.morph(usize::from_u32(word_id))
    }

    /// Gets the feature columns of a record.
    #[inline(always)]
    pub fn contents(&self, word_id: u32) -> &[String] {
        self.store.contents(usize::from_u32(word_id))
    }

    /// Gets the number of records.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Checks if the lexicon has no records.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    #[inline(always)]
    pub(crate) const fn index(&self) -> &LexiconIndex {
        &self.index
    }

    #[inline(always)]
    pub(crate) const fn store(&self) -> &MorphStore {
        &self.store
    }

    pub(crate) fn verify(&self, conn: &ConnectionTable) -> Result<()> {
        self.store
            .verify(conn)
            .and_then(|_| self.index.verify(self.store.len()))
            .map_err(|msg| SumomoError::invalid_format("lexicon", msg))
    }
}

#[derive(Eq, PartialEq, Debug)]
pub struct LexMatch {
    word_id: u32,
    morph: Morph,
    len: usize,
}

impl LexMatch {
    #[inline(always)]
    pub const fn new(word_id: u32, morph: Morph, len: usize) -> Self {
        Self { word_id, morph, len }
    }

    #[inline(always)]
    pub const fn word_id(&self) -> u32 {
        self.word_id
    }

    #[inline(always)]
    pub const fn morph(&self) -> Morph {
        self.morph
    }

    /// Length of the surface in bytes.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }
}

/// A parsed row of a lexicon or `unk.def`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RawWordEntry {
    /// Surface, or the class name in `unk.def`.
    pub surface: String,
    /// Connection ids and cost.
    pub morph: Morph,
    /// Feature columns.
    pub contents: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(surface: &str, left_id: i16, right_id: i16, weight: i16) -> RawWordEntry {
        RawWordEntry {
            surface: surface.to_string(),
            morph: Morph::new(left_id, right_id, weight),
            contents: vec![surface.to_string()],
        }
    }

    #[test]
    fn test_common_prefix_iterator() {
        let lexicon = Lexicon::from_entries(vec![
            entry("東京", 1, 2, 3),
            entry("東京都", 4, 5, 6),
            entry("東京", 7, 8, 9),
            entry("京都", 10, 11, 12),
        ])
        .unwrap();
        let mut it = lexicon.common_prefix_iterator("東京都".as_bytes());
        assert_eq!(it.next(), Some(LexMatch::new(1, Morph::new(1, 2, 3), 6)));
        assert_eq!(it.next(), Some(LexMatch::new(2, Morph::new(7, 8, 9), 6)));
        assert_eq!(it.next(), Some(LexMatch::new(3, Morph::new(4, 5, 6), 9)));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_lookup() {
        let lexicon = Lexicon::from_entries(vec![
            entry("もも", 1, 1, 10),
            entry("も", 2, 2, 20),
            entry("もも", 3, 3, 30),
        ])
        .unwrap();
        // Sorted stably by surface: も, もも(10), もも(30).
        assert_eq!(lexicon.lookup("も"), vec![0]);
        assert_eq!(lexicon.lookup("もも"), vec![1, 2]);
        assert_eq!(lexicon.morph(2), Morph::new(3, 3, 30));
        assert!(lexicon.lookup("す").is_empty());
        assert_eq!(lexicon.index().dup(1), 1);
    }
}
