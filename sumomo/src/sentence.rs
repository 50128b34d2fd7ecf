use std::ops::Range;

use crate::dictionary::character::{CharCategory, CharInfo, DEFAULT_CLASS_ID};
use crate::utils::decode_char;

/// Input bytes split into characters with their classes.
///
/// A byte that does not start a valid UTF-8 sequence is taken as a character
/// of its own, of the default class, and never grouped with its neighbors.
#[derive(Clone, Debug)]
pub struct Sentence<'a> {
    input: &'a [u8],
    chars: Vec<Option<char>>,
    c2b: Vec<usize>,
    b2c: Vec<usize>,
    cinfos: Vec<CharInfo>,
    groupable: Vec<usize>,
}

impl<'a> Sentence<'a> {
    pub fn new(input: &'a [u8], char_cate: &CharCategory) -> Self {
        let mut sent = Self {
            input,
            chars: vec![],
            c2b: vec![],
            b2c: vec![0; input.len() + 1],
            cinfos: vec![],
            groupable: vec![],
        };
        sent.compute_basic();
        sent.compute_categories(char_cate);
        sent.compute_groupable();
        sent
    }

    fn compute_basic(&mut self) {
        let mut pos = 0;
        while pos < self.input.len() {
            let (c, len) = decode_char(&self.input[pos..]);
            let ci = self.chars.len();
            self.b2c[pos..pos + len].fill(ci);
            self.chars.push(c);
            self.c2b.push(pos);
            pos += len;
        }
        self.b2c[pos] = self.chars.len();
        self.c2b.push(pos);
    }

    fn compute_categories(&mut self, char_cate: &CharCategory) {
        self.cinfos.reserve(self.chars.len());
        for &c in &self.chars {
            let cinfo = match c {
                Some(c) => char_cate.char_info(c),
                None => char_cate.class_info(DEFAULT_CLASS_ID),
            };
            self.cinfos.push(cinfo);
        }
    }

    fn compute_groupable(&mut self) {
        debug_assert_eq!(self.chars.len(), self.cinfos.len());

        self.groupable.resize(self.chars.len(), 1);
        for i in (1..self.chars.len()).rev() {
            let joinable = self.chars[i - 1].is_some()
                && self.chars[i].is_some()
                && self.cinfos[i - 1].class == self.cinfos[i].class;
            if joinable {
                self.groupable[i - 1] = self.groupable[i] + 1;
            }
        }
    }

    #[inline(always)]
    pub const fn raw(&self) -> &'a [u8] {
        self.input
    }

    #[cfg(test)]
    pub fn chars(&self) -> &[Option<char>] {
        &self.chars
    }

    #[inline(always)]
    pub fn len_char(&self) -> usize {
        self.chars.len()
    }

    #[inline(always)]
    pub fn len_byte(&self) -> usize {
        self.input.len()
    }

    #[inline(always)]
    pub fn byte_position(&self, pos_char: usize) -> usize {
        self.c2b[pos_char]
    }

    /// Gets the index of the character containing the byte at `pos_byte`.
    #[inline(always)]
    pub fn char_position(&self, pos_byte: usize) -> usize {
        self.b2c[pos_byte]
    }

    #[inline(always)]
    pub fn char_info(&self, pos_char: usize) -> CharInfo {
        self.cinfos[pos_char]
    }

    /// Gets the length in characters of the run of the same class starting at
    /// `pos_char`.
    #[inline(always)]
    pub fn groupable(&self, pos_char: usize) -> usize {
        self.groupable[pos_char]
    }

    /// Checks if every character in the range is ideographic.
    pub fn is_ideographic(&self, range_char: Range<usize>) -> bool {
        self.chars[range_char]
            .iter()
            .all(|c| c.map_or(false, is_ideographic))
    }
}

/// Checks if a character is a CJK ideograph or an ideographic symbol.
pub fn is_ideographic(c: char) -> bool {
    matches!(
        u32::from(c),
        0x3006
            | 0x3007
            | 0x3021..=0x3029
            | 0x3038..=0x303A
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xF900..=0xFAFF
            | 0x20000..
    )
}
