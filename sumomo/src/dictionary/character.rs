mod builder;

use bincode::{Decode, Encode};

use crate::errors::{Result, SumomoError};

/// Name of the mandatory class, whose id is always zero.
pub const DEFAULT_CLASS: &str = "DEFAULT";

/// Id of [`DEFAULT_CLASS`].
pub const DEFAULT_CLASS_ID: u8 = 0;

const NUM_BMP_CHARS: usize = 1 << 16;

/// Unknown-word settings of a character.
#[derive(Default, Clone, Copy, Debug, Eq, PartialEq)]
pub struct CharInfo {
    /// Class id.
    pub class: u8,
    /// Whether unknown words are generated even when a known word matches.
    pub invoke: bool,
    /// Whether a run of the class is proposed as one unknown word.
    pub group: bool,
    /// Maximum length in characters of the per-prefix unknown words.
    pub length: u16,
}

/// Mapping from BMP code points to character classes defined in `char.def`.
#[derive(Default, Debug, Clone, Decode, Encode)]
pub struct CharCategory {
    class_names: Vec<String>,
    categories: Vec<u8>,
    invoke: Vec<bool>,
    group: Vec<bool>,
    length: Vec<u16>,
}

impl CharCategory {
    /// Gets the class id of a code point.
    ///
    /// Code points outside the BMP belong to [`DEFAULT_CLASS`].
    #[inline(always)]
    pub fn class_of(&self, c: char) -> u8 {
        self.categories
            .get(c as usize)
            .copied()
            .unwrap_or(DEFAULT_CLASS_ID)
    }

    /// Gets the settings of a code point.
    #[inline(always)]
    pub fn char_info(&self, c: char) -> CharInfo {
        self.class_info(self.class_of(c))
    }

    /// Gets the settings of a class.
    #[inline(always)]
    pub fn class_info(&self, class: u8) -> CharInfo {
        let i = usize::from(class);
        CharInfo {
            class,
            invoke: self.invoke[i],
            group: self.group[i],
            length: self.length[i],
        }
    }

    /// Gets the id of a class name.
    #[inline(always)]
    pub fn class_id(&self, name: &str) -> Option<u8> {
        self.class_names
            .iter()
            .position(|n| n == name)
            .and_then(|id| u8::try_from(id).ok())
    }

    /// Gets the name of a class.
    #[inline(always)]
    pub fn class_name(&self, class: u8) -> Option<&str> {
        self.class_names
            .get(usize::from(class))
            .map(|n| n.as_str())
    }

    /// Gets the number of classes.
    #[inline(always)]
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    pub(crate) fn verify(&self) -> Result<()> {
        let n = self.class_names.len();
        let msg = if n == 0 || n > usize::from(u8::MAX) + 1 {
            format!("The number of classes must be in 1..=256, but is {n}")
        } else if self.class_names[usize::from(DEFAULT_CLASS_ID)] != DEFAULT_CLASS {
            format!("The first class must be {DEFAULT_CLASS}")
        } else if self.invoke.len() != n || self.group.len() != n || self.length.len() != n {
            "The numbers of class names and settings are different".to_string()
        } else if self.categories.len() != NUM_BMP_CHARS {
            format!(
                "The category table must have {NUM_BMP_CHARS} entries, but has {}",
                self.categories.len()
            )
        } else if let Some(c) = self.categories.iter().position(|&c| usize::from(c) >= n) {
            format!("The class of U+{c:04X} is undefined")
        } else {
            return Ok(());
        };
        Err(SumomoError::invalid_format("chardef", msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outside_bmp() {
        let data = "DEFAULT 0 1 0\nKANJI 0 0 2\n0x4E00..0x9FFF KANJI";
        let cate = CharCategory::from_reader(data.as_bytes()).unwrap();
        assert_eq!(cate.class_of('一'), 1);
        assert_eq!(cate.class_of('𠀋'), DEFAULT_CLASS_ID);
        assert_eq!(cate.char_info('一').length, 2);
    }

    #[test]
    fn test_verify() {
        let data = "DEFAULT 0 1 0\nSPACE 0 1 0\n0x0020 SPACE";
        let mut cate = CharCategory::from_reader(data.as_bytes()).unwrap();
        cate.verify().unwrap();
        cate.categories[0x41] = 2;
        assert!(cate.verify().is_err());
        cate.categories.truncate(100);
        assert!(cate.verify().is_err());
    }
}
