//! Container of resultant tokens.
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::dictionary::{Dictionary, UserDict};
use crate::errors::SumomoError;
use crate::tokenizer::lattice::Node;

const POS_COLUMNS: usize = 4;
const INFLECTIONAL_TYPE_COLUMN: usize = 4;
const INFLECTIONAL_FORM_COLUMN: usize = 5;
const BASE_FORM_COLUMN: usize = 6;
const READING_COLUMN: usize = 7;
const PRONUNCIATION_COLUMN: usize = 8;
const USER_READING_COLUMN: usize = 2;

/// Origin of a token.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum TokenClass {
    /// Word in the system lexicon.
    Known,
    /// Word proposed from character categories.
    Unknown,
    /// Word in the user dictionary.
    User,
    /// BOS or EOS.
    #[default]
    Dummy,
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Known => "KNOWN",
            Self::Unknown => "UNKNOWN",
            Self::User => "USER",
            Self::Dummy => "DUMMY",
        };
        f.write_str(s)
    }
}

impl FromStr for TokenClass {
    type Err = SumomoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KNOWN" => Ok(Self::Known),
            "UNKNOWN" => Ok(Self::Unknown),
            "USER" => Ok(Self::User),
            "DUMMY" => Ok(Self::Dummy),
            _ => Err(SumomoError::invalid_argument(
                "s",
                format!("Unknown token class: {s}"),
            )),
        }
    }
}

/// Gets the feature columns of a node from the dictionary it belongs to.
pub(crate) fn node_features<'a>(
    dict: &'a Dictionary,
    user_dict: Option<&'a UserDict>,
    class: TokenClass,
    word_id: u32,
) -> &'a [String] {
    match class {
        TokenClass::Known => dict.lexicon().contents(word_id),
        TokenClass::Unknown => dict.unk_handler().contents(word_id),
        TokenClass::User => user_dict.map_or(&[], |d| d.contents(word_id)),
        TokenClass::Dummy => &[],
    }
}

/// Resultant token.
///
/// Positions are given both in characters and in bytes of the input. A byte
/// of invalid UTF-8 counts as one character.
#[derive(Clone, Debug)]
pub struct Token<'a> {
    dict: &'a Dictionary,
    user_dict: Option<&'a UserDict>,
    node: Node,
    surface: Cow<'a, str>,
    range_char: Range<usize>,
}

impl<'a> Token<'a> {
    #[inline(always)]
    pub(crate) const fn new(
        dict: &'a Dictionary,
        user_dict: Option<&'a UserDict>,
        node: Node,
        surface: Cow<'a, str>,
        range_char: Range<usize>,
    ) -> Self {
        Self {
            dict,
            user_dict,
            node,
            surface,
            range_char,
        }
    }

    /// Gets the id of the word in the dictionary it comes from.
    ///
    /// BOS and EOS have `u32::MAX`.
    #[inline(always)]
    pub const fn id(&self) -> u32 {
        self.node.word_id()
    }

    /// Gets the origin of the token.
    #[inline(always)]
    pub const fn class(&self) -> TokenClass {
        self.node.class()
    }

    /// Gets the surface string of the token, `BOS` or `EOS` for the dummies.
    ///
    /// Invalid UTF-8 bytes are replaced with `U+FFFD`.
    #[inline(always)]
    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// Gets the start position in characters.
    #[inline(always)]
    pub const fn start(&self) -> usize {
        self.range_char.start
    }

    /// Gets the end position in characters.
    #[inline(always)]
    pub const fn end(&self) -> usize {
        self.range_char.end
    }

    /// Gets the position range of the token in characters.
    #[inline(always)]
    pub fn range_char(&self) -> Range<usize> {
        self.range_char.clone()
    }

    /// Gets the position range of the token in bytes.
    #[inline(always)]
    pub const fn range_byte(&self) -> Range<usize> {
        self.node.range_byte()
    }

    /// Gets all the feature columns of the token.
    #[inline(always)]
    pub fn features(&self) -> &'a [String] {
        node_features(self.dict, self.user_dict, self.class(), self.id())
    }

    /// Gets the part-of-speech columns, up to four of them.
    ///
    /// A user word has a single part-of-speech tag.
    pub fn pos(&self) -> &'a [String] {
        let features = self.features();
        let n = match self.class() {
            TokenClass::User => 1,
            _ => POS_COLUMNS,
        };
        &features[..n.min(features.len())]
    }

    fn column(&self, i: usize) -> Option<&'a str> {
        match self.class() {
            TokenClass::Known | TokenClass::Unknown => {
                self.features().get(i).map(String::as_str)
            }
            TokenClass::User | TokenClass::Dummy => None,
        }
    }

    /// Gets the inflectional type.
    #[inline(always)]
    pub fn inflectional_type(&self) -> Option<&'a str> {
        self.column(INFLECTIONAL_TYPE_COLUMN)
    }

    /// Gets the inflectional form.
    #[inline(always)]
    pub fn inflectional_form(&self) -> Option<&'a str> {
        self.column(INFLECTIONAL_FORM_COLUMN)
    }

    /// Gets the base form.
    #[inline(always)]
    pub fn base_form(&self) -> Option<&'a str> {
        self.column(BASE_FORM_COLUMN)
    }

    /// Gets the reading. For a user word, the readings of its segments
    /// joined by `/`.
    pub fn reading(&self) -> Option<&'a str> {
        if self.class() == TokenClass::User {
            return self.features().get(USER_READING_COLUMN).map(String::as_str);
        }
        self.column(READING_COLUMN)
    }

    /// Gets the pronunciation.
    #[inline(always)]
    pub fn pronunciation(&self) -> Option<&'a str> {
        self.column(PRONUNCIATION_COLUMN)
    }

    /// Gets the left connection id of the token.
    #[inline(always)]
    pub const fn left_id(&self) -> i16 {
        self.node.morph().left_id
    }

    /// Gets the right connection id of the token.
    #[inline(always)]
    pub const fn right_id(&self) -> i16 {
        self.node.morph().right_id
    }

    /// Gets the word cost of the token.
    #[inline(always)]
    pub const fn word_cost(&self) -> i16 {
        self.node.morph().weight
    }

    /// Gets the total cost from BOS to the token, inclusive.
    #[inline(always)]
    pub const fn total_cost(&self) -> i64 {
        self.node.min_cost()
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.surface(), self.features().join(","))
    }
}
