use bincode::{Decode, Encode};

use crate::dictionary::connector::ConnectionTable;

/// Connection ids and cost of a word.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Hash, Decode, Encode)]
pub struct Morph {
    /// Context id seen from the preceding word.
    pub left_id: i16,
    /// Context id seen from the following word.
    pub right_id: i16,
    /// Cost of the word itself.
    pub weight: i16,
}

impl Morph {
    /// Creates a new instance.
    #[inline(always)]
    pub const fn new(left_id: i16, right_id: i16, weight: i16) -> Self {
        Self {
            left_id,
            right_id,
            weight,
        }
    }

    /// Checks if the context ids are within the connection table.
    #[inline(always)]
    pub(crate) fn fits(&self, conn: &ConnectionTable) -> bool {
        usize::try_from(self.left_id).map_or(false, |id| id < conn.num_cols())
            && usize::try_from(self.right_id).map_or(false, |id| id < conn.num_rows())
    }
}

/// Parameters and feature columns of words, indexed by word id.
///
/// Serialized as the morph list followed by the content list.
#[derive(Default, Debug, Clone, Decode, Encode)]
pub struct MorphStore {
    morphs: Vec<Morph>,
    contents: Vec<Vec<String>>,
}

impl MorphStore {
    pub fn new(morphs: Vec<Morph>, contents: Vec<Vec<String>>) -> Self {
        Self { morphs, contents }
    }

    #[inline(always)]
    pub fn morph(&self, word_id: usize) -> Morph {
        self.morphs[word_id]
    }

    #[inline(always)]
    pub fn contents(&self, word_id: usize) -> &[String] {
        self.contents.get(word_id).map_or(&[], |c| c.as_slice())
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.morphs.len()
    }

    pub(crate) fn verify(&self, conn: &ConnectionTable) -> Result<(), String> {
        if self.morphs.len() != self.contents.len() {
            return Err(format!(
                "The numbers of morphs and contents are different, {} != {}",
                self.morphs.len(),
                self.contents.len()
            ));
        }
        if let Some((i, m)) = self.morphs.iter().enumerate().find(|(_, m)| !m.fits(conn)) {
            return Err(format!(
                "The context ids of word {i} are out of the connection table, {m:?}"
            ));
        }
        Ok(())
    }
}
