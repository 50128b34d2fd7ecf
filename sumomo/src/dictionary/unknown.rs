mod builder;

use std::collections::BTreeMap;
use std::ops::Range;

use bincode::{Decode, Encode};

use crate::dictionary::character::{CharCategory, DEFAULT_CLASS_ID};
use crate::dictionary::connector::ConnectionTable;
use crate::dictionary::lexicon::Morph;
use crate::errors::{Result, SumomoError};
use crate::sentence::Sentence;
use crate::utils::FromU32;

/// Candidate word for an unregistered span of characters.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct UnkWord {
    start_char: usize,
    end_char: usize,
    morph: Morph,
    word_id: u32,
}

impl UnkWord {
    #[inline(always)]
    pub const fn start_char(&self) -> usize {
        self.start_char
    }

    #[inline(always)]
    pub const fn end_char(&self) -> usize {
        self.end_char
    }

    #[inline(always)]
    pub const fn morph(&self) -> Morph {
        self.morph
    }

    #[inline(always)]
    pub const fn word_id(&self) -> u32 {
        self.word_id
    }
}

/// Templates of unknown words defined in `unk.def`, grouped by class.
///
/// The templates of a class are stored contiguously. `index` maps a class to
/// its first template, and `index_dup` counts the additional ones.
#[derive(Default, Debug, Clone, Decode, Encode)]
pub struct UnkHandler {
    morphs: Vec<Morph>,
    index: BTreeMap<u8, u32>,
    index_dup: BTreeMap<u8, u32>,
    contents: Vec<Vec<String>>,
}

impl UnkHandler {
    /// Proposes unknown words starting at `start_char`, passing them to `f`
    /// in ascending order of length.
    ///
    /// Nothing is proposed when a registered word already matched, unless
    /// the class of the first character is marked invoke. Otherwise the
    /// candidates are the single character, every prefix of the same-class
    /// run up to the class length, and the whole run when the class groups.
    pub(crate) fn gen_unk_words<F>(
        &self,
        sent: &Sentence,
        start_char: usize,
        has_matched: bool,
        max_grouping_len: usize,
        mut f: F,
    ) where
        F: FnMut(UnkWord),
    {
        let cinfo = sent.char_info(start_char);
        if has_matched && !cinfo.invoke {
            return;
        }

        let groupable = sent.groupable(start_char);
        let mut lengths = vec![1];
        lengths.extend(2..=usize::from(cinfo.length).min(groupable));
        if cinfo.group {
            lengths.push(groupable.min(max_grouping_len).max(1));
        }
        lengths.sort_unstable();
        lengths.dedup();

        let templates = self.templates(cinfo.class);
        for len in lengths {
            let end_char = start_char + len;
            for word_id in templates.clone() {
                f(UnkWord {
                    start_char,
                    end_char,
                    morph: self.morphs[word_id],
                    word_id: word_id as u32,
                });
            }
        }
    }

    /// Gets the template ids of a class, falling back to those of the
    /// default class when the class has none.
    #[inline(always)]
    pub fn templates(&self, class: u8) -> Range<usize> {
        self.class_range(class)
            .or_else(|| self.class_range(DEFAULT_CLASS_ID))
            .unwrap_or(0..0)
    }

    #[inline(always)]
    fn class_range(&self, class: u8) -> Option<Range<usize>> {
        let start = usize::from_u32(*self.index.get(&class)?);
        let dup = usize::from_u32(self.index_dup.get(&class).copied().unwrap_or(0));
        Some(start..start + dup + 1)
    }

    /// Gets the parameters of a template.
    #[inline(always)]
    pub fn morph(&self, word_id: u32) -> Morph {
        self.morphs[usize::from_u32(word_id)]
    }

    /// Gets the feature columns of a template, or an empty slice for an
    /// unknown id.
    #[inline(always)]
    pub fn contents(&self, word_id: u32) -> &[String] {
        self.contents
            .get(usize::from_u32(word_id))
            .map_or(&[], |c| c.as_slice())
    }

    /// Gets the number of templates.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.morphs.len()
    }

    /// Checks if no template is defined.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.morphs.is_empty()
    }

    pub(crate) fn verify(&self, char_cate: &CharCategory, conn: &ConnectionTable) -> Result<()> {
        let n = self.morphs.len();
        let msg = if self.contents.len() != n {
            format!(
                "The numbers of morphs and contents are different, {n} != {}",
                self.contents.len()
            )
        } else if let Some(m) = self.morphs.iter().find(|m| !m.fits(conn)) {
            format!("The context ids of a template are out of the connection table, {m:?}")
        } else if let Some(class) = self
            .index
            .keys()
            .chain(self.index_dup.keys())
            .find(|&&c| usize::from(c) >= char_cate.num_classes())
        {
            format!("Undefined class id: {class}")
        } else if self.index_dup.keys().any(|c| !self.index.contains_key(c)) {
            "A duplicate count has no first template".to_string()
        } else if self
            .index
            .keys()
            .filter_map(|&c| self.class_range(c))
            .any(|r| r.end > n)
        {
            "A template id is out of the morph list".to_string()
        } else {
            return Ok(());
        };
        Err(SumomoError::invalid_format("unk", msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(char_def: &str, unk_def: &str) -> (CharCategory, UnkHandler) {
        let cate = CharCategory::from_reader(char_def.as_bytes()).unwrap();
        let unk = UnkHandler::from_reader(unk_def.as_bytes(), &cate).unwrap();
        (cate, unk)
    }

    fn spans(
        unk: &UnkHandler,
        sent: &Sentence,
        start: usize,
        has_matched: bool,
    ) -> Vec<(usize, usize, u32)> {
        let mut words = vec![];
        unk.gen_unk_words(sent, start, has_matched, usize::MAX, |w| {
            words.push((w.start_char(), w.end_char(), w.word_id()))
        });
        words
    }

    #[test]
    fn test_group_and_length() {
        let (cate, unk) = build(
            "DEFAULT 0 1 0\nKATAKANA 1 1 2\n0x30A1..0x30FF KATAKANA",
            "DEFAULT,0,0,0,記号\nKATAKANA,0,0,0,名詞",
        );
        let sent = Sentence::new("トートバッグ".as_bytes(), &cate);
        assert_eq!(
            spans(&unk, &sent, 0, false),
            vec![(0, 1, 1), (0, 2, 1), (0, 6, 1)]
        );
        // Invoked even after a registered match.
        assert_eq!(spans(&unk, &sent, 3, true).len(), 3);
    }

    #[test]
    fn test_no_invoke() {
        let (cate, unk) = build(
            "DEFAULT 0 1 0\nKANJI 0 0 2\n0x4E00..0x9FFF KANJI",
            "DEFAULT,0,0,0,記号\nKANJI,0,0,0,名詞\nKANJI,0,0,1,名詞",
        );
        let sent = Sentence::new("日本語".as_bytes(), &cate);
        assert!(spans(&unk, &sent, 0, true).is_empty());
        assert_eq!(
            spans(&unk, &sent, 0, false),
            vec![(0, 1, 1), (0, 1, 2), (0, 2, 1), (0, 2, 2)]
        );
    }

    #[test]
    fn test_max_grouping_len() {
        let (cate, unk) = build(
            "DEFAULT 0 1 0\nALPHA 1 1 0\n0x0061..0x007A ALPHA",
            "ALPHA,0,0,0,英字",
        );
        let sent = Sentence::new(b"abcdef", &cate);
        let mut words = vec![];
        unk.gen_unk_words(&sent, 0, false, 3, |w| words.push(w.end_char()));
        assert_eq!(words, vec![1, 3]);
    }

    #[test]
    fn test_default_fallback() {
        let (cate, unk) = build(
            "DEFAULT 0 1 0\nSPACE 0 1 0\n0x0020 SPACE",
            "DEFAULT,0,0,0,記号",
        );
        assert_eq!(unk.templates(1), 0..1);
        let sent = Sentence::new(b"  x", &cate);
        assert_eq!(spans(&unk, &sent, 0, false), vec![(0, 1, 0), (0, 2, 0)]);
    }

    #[test]
    fn test_no_templates() {
        let (cate, unk) = build("DEFAULT 0 1 0", "");
        assert!(unk.is_empty());
        let sent = Sentence::new(b"x", &cate);
        assert!(spans(&unk, &sent, 0, false).is_empty());
    }
}
