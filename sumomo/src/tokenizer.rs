//! Viterbi-based tokenizer.
mod graph;
pub(crate) mod lattice;

use std::borrow::Cow;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use crate::dictionary::character::DEFAULT_CLASS_ID;
use crate::dictionary::{Dictionary, Morph, UserDict};
use crate::double_array::Trie;
use crate::errors::{Result, SumomoError};
use crate::sentence::Sentence;
use crate::token::{Token, TokenClass};
use crate::tokenizer::lattice::{Lattice, Node, DUMMY_WORD_ID};

const DEFAULT_MAX_GROUPING_LEN: usize = 1024;

const IDEOGRAPHIC_PENALTY_LENGTH: usize = 2;
const IDEOGRAPHIC_PENALTY: i64 = 3000;
const OTHER_PENALTY_LENGTH: usize = 7;
const OTHER_PENALTY: i64 = 1700;

/// Segmentation mode.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Mode {
    /// Plain minimum-cost segmentation.
    #[default]
    Normal,
    /// Further splits long known words, for search indexing.
    Search,
    /// [`Mode::Search`], also splitting unknown words into characters.
    Extended,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::Search => "search",
            Self::Extended => "extended",
        };
        f.write_str(s)
    }
}

impl FromStr for Mode {
    type Err = SumomoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "search" => Ok(Self::Search),
            "extended" => Ok(Self::Extended),
            _ => Err(SumomoError::invalid_argument(
                "mode",
                format!("Unknown mode: {s}, expected normal, search, or extended"),
            )),
        }
    }
}

/// Tokenizer.
///
/// An instance holds no per-input state, so it can be shared among threads.
pub struct Tokenizer {
    dict: Arc<Dictionary>,
    user_dict: Option<UserDict>,
    omit_bos_eos: bool,
    max_grouping_len: usize,
}

impl Tokenizer {
    /// Creates a new instance.
    ///
    /// # Arguments
    ///
    ///  - `dict`: Dictionary to be used, owned or shared.
    pub fn new<D>(dict: D) -> Self
    where
        D: Into<Arc<Dictionary>>,
    {
        Self {
            dict: dict.into(),
            user_dict: None,
            omit_bos_eos: false,
            max_grouping_len: DEFAULT_MAX_GROUPING_LEN,
        }
    }

    /// Sets a user dictionary, whose words take precedence over the system
    /// lexicon.
    pub fn user_dict(mut self, user_dict: UserDict) -> Self {
        self.user_dict = Some(user_dict);
        self
    }

    /// Removes the BOS and EOS tokens from results.
    pub const fn omit_bos_eos(mut self, yes: bool) -> Self {
        self.omit_bos_eos = yes;
        self
    }

    /// Specifies the maximum length in characters of a grouped unknown word.
    ///
    /// # Arguments
    ///
    ///  - `max_grouping_len`: The maximum grouping length for unknown words.
    ///    The default value is 1024, and 0 indicates the infinity length.
    pub const fn max_grouping_len(mut self, max_grouping_len: usize) -> Self {
        self.max_grouping_len = if max_grouping_len == 0 {
            usize::MAX
        } else {
            max_grouping_len
        };
        self
    }

    /// Gets the reference to the dictionary.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    /// Gets the reference to the user dictionary, if set.
    pub const fn user_dictionary(&self) -> Option<&UserDict> {
        self.user_dict.as_ref()
    }

    /// Tokenizes the text in [`Mode::Normal`].
    pub fn tokenize<'a>(&'a self, text: &'a str) -> Vec<Token<'a>> {
        self.analyze(text, Mode::Normal)
    }

    /// Tokenizes the text in the given mode.
    pub fn analyze<'a>(&'a self, text: &'a str, mode: Mode) -> Vec<Token<'a>> {
        self.analyze_bytes(text.as_bytes(), mode)
    }

    /// Tokenizes bytes in the given mode.
    ///
    /// Each byte that is not part of valid UTF-8 becomes a character of the
    /// default class.
    pub fn analyze_bytes<'a>(&'a self, input: &'a [u8], mode: Mode) -> Vec<Token<'a>> {
        let sent = Sentence::new(input, self.dict.char_cate());
        let mut lattice = Lattice::default();
        self.build_lattice(&sent, &mut lattice, false);
        self.resolve(&sent, &lattice, mode)
    }

    /// Splits the text into surfaces in [`Mode::Normal`].
    pub fn wakati<'a>(&'a self, text: &'a str) -> Vec<&'a str> {
        let sent = Sentence::new(text.as_bytes(), self.dict.char_cate());
        let mut lattice = Lattice::default();
        self.build_lattice(&sent, &mut lattice, false);
        lattice
            .best_path()
            .iter()
            .map(|node| &text[node.range_byte()])
            .collect()
    }

    /// Tokenizes the text, writing the lattice as a Graphviz dot document.
    ///
    /// The best path in [`Mode::Normal`] is highlighted.
    ///
    /// # Errors
    ///
    /// [`SumomoError`] is returned when writing fails.
    pub fn analyze_graph<'a, W>(&'a self, wtr: W, text: &'a str, mode: Mode) -> Result<Vec<Token<'a>>>
    where
        W: Write,
    {
        let sent = Sentence::new(text.as_bytes(), self.dict.char_cate());
        let mut lattice = Lattice::default();
        self.build_lattice(&sent, &mut lattice, false);
        graph::write_dot(wtr, self, &sent, &lattice)?;
        Ok(self.resolve(&sent, &lattice, mode))
    }

    fn resolve<'a>(&'a self, sent: &Sentence<'a>, lattice: &Lattice, mode: Mode) -> Vec<Token<'a>> {
        let mut nodes = lattice.best_path();
        if mode != Mode::Normal {
            nodes = self.split_long_words(sent, nodes);
        }
        if mode == Mode::Extended {
            nodes = Self::split_unknown_words(sent, nodes);
        }

        let mut tokens = Vec::with_capacity(nodes.len() + 2);
        if !self.omit_bos_eos {
            tokens.push(self.dummy_token(sent, lattice.bos().clone(), "BOS"));
        }
        tokens.extend(nodes.into_iter().map(|node| self.token(sent, node)));
        if !self.omit_bos_eos {
            if let Some(eos) = lattice.eos() {
                tokens.push(self.dummy_token(sent, eos.clone(), "EOS"));
            }
        }
        tokens
    }

    fn token<'a>(&'a self, sent: &Sentence<'a>, node: Node) -> Token<'a> {
        let surface = String::from_utf8_lossy(&sent.raw()[node.range_byte()]);
        let range_char = sent.char_position(node.start_byte())..sent.char_position(node.end_byte());
        Token::new(&self.dict, self.user_dict.as_ref(), node, surface, range_char)
    }

    fn dummy_token<'a>(&'a self, sent: &Sentence<'a>, node: Node, surface: &'static str) -> Token<'a> {
        let pos = sent.char_position(node.start_byte());
        Token::new(
            &self.dict,
            self.user_dict.as_ref(),
            node,
            Cow::Borrowed(surface),
            pos..pos,
        )
    }

    /// Re-segments each known word that receives a search penalty, keeping
    /// it when no finer segmentation is found.
    fn split_long_words(&self, sent: &Sentence, nodes: Vec<Node>) -> Vec<Node> {
        let mut results = Vec::with_capacity(nodes.len());
        for node in nodes {
            let range_char =
                sent.char_position(node.start_byte())..sent.char_position(node.end_byte());
            if node.class() != TokenClass::Known || search_penalty(sent, range_char) == 0 {
                results.push(node);
                continue;
            }
            let sub_sent = Sentence::new(&sent.raw()[node.range_byte()], self.dict.char_cate());
            let mut sub_lattice = Lattice::default();
            self.build_lattice(&sub_sent, &mut sub_lattice, true);
            let sub_path = sub_lattice.best_path();
            if sub_path.len() > 1 {
                let offset = node.start_byte();
                results.extend(sub_path.into_iter().map(|n| n.shifted(offset)));
            } else {
                results.push(node);
            }
        }
        results
    }

    fn split_unknown_words(sent: &Sentence, nodes: Vec<Node>) -> Vec<Node> {
        let mut results = Vec::with_capacity(nodes.len());
        for node in nodes {
            let start_char = sent.char_position(node.start_byte());
            let end_char = sent.char_position(node.end_byte());
            if node.class() != TokenClass::Unknown || end_char - start_char <= 1 {
                results.push(node);
                continue;
            }
            for i in start_char..end_char {
                results.push(Node::new(
                    node.word_id(),
                    TokenClass::Unknown,
                    sent.byte_position(i)..sent.byte_position(i + 1),
                    node.morph(),
                ));
            }
        }
        results
    }

    pub(crate) fn build_lattice(&self, sent: &Sentence, lattice: &mut Lattice, penalize: bool) {
        lattice.reset(sent.len_byte());

        for start_char in 0..sent.len_char() {
            if !lattice.has_previous_node(sent.byte_position(start_char)) {
                continue;
            }
            self.add_lattice_edges(sent, lattice, start_char, penalize);
        }

        if !lattice.has_previous_node(sent.len_byte()) {
            self.add_catch_all(sent, lattice, penalize);
        }
        let connected = lattice.insert_eos(self.dict.connector());
        debug_assert!(connected);
    }

    fn add_lattice_edges(
        &self,
        sent: &Sentence,
        lattice: &mut Lattice,
        start_char: usize,
        penalize: bool,
    ) {
        let connector = self.dict.connector();
        let start_byte = sent.byte_position(start_char);
        let suffix = &sent.raw()[start_byte..];

        let penalty = |end_byte: usize| {
            if penalize {
                search_penalty(sent, start_char..sent.char_position(end_byte))
            } else {
                0
            }
        };

        let mut has_matched = false;
        let mut longest_user = 0;

        if let Some(user_dict) = &self.user_dict {
            for m in user_dict.common_prefix_search(suffix) {
                let end_byte = start_byte + m.len;
                let node = Node::new(m.id, TokenClass::User, start_byte..end_byte, Morph::default());
                lattice.insert_node(node, penalty(end_byte), connector);
                longest_user = longest_user.max(m.len);
                has_matched = true;
            }
        }

        for m in self.dict.lexicon().common_prefix_iterator(suffix) {
            // User words shadow system words that are not longer.
            if m.len() <= longest_user {
                continue;
            }
            let end_byte = start_byte + m.len();
            let node = Node::new(m.word_id(), TokenClass::Known, start_byte..end_byte, m.morph());
            lattice.insert_node(node, penalty(end_byte), connector);
            has_matched = true;
        }

        self.dict.unk_handler().gen_unk_words(
            sent,
            start_char,
            has_matched,
            self.max_grouping_len,
            |w| {
                let end_byte = sent.byte_position(w.end_char());
                let node = Node::new(
                    w.word_id(),
                    TokenClass::Unknown,
                    sent.byte_position(w.start_char())..end_byte,
                    w.morph(),
                );
                lattice.insert_node(node, penalty(end_byte), connector);
            },
        );
    }

    /// Inserts a single unknown word covering the whole input, which
    /// happens only when no path reaches the end.
    fn add_catch_all(&self, sent: &Sentence, lattice: &mut Lattice, penalize: bool) {
        let unk_handler = self.dict.unk_handler();
        let (word_id, morph) = unk_handler
            .templates(DEFAULT_CLASS_ID)
            .next()
            .map_or((DUMMY_WORD_ID, Morph::default()), |id| {
                let id = id as u32;
                (id, unk_handler.morph(id))
            });
        let penalty = if penalize {
            search_penalty(sent, 0..sent.len_char())
        } else {
            0
        };
        tracing::debug!(len_byte = sent.len_byte(), "inserted a catch-all word");
        let node = Node::new(word_id, TokenClass::Unknown, 0..sent.len_byte(), morph);
        lattice.insert_node(node, penalty, self.dict.connector());
    }
}

/// Computes the extra cost of a long word in search mode.
fn search_penalty(sent: &Sentence, range_char: std::ops::Range<usize>) -> i64 {
    let len = range_char.len();
    if len > IDEOGRAPHIC_PENALTY_LENGTH && sent.is_ideographic(range_char) {
        (len - IDEOGRAPHIC_PENALTY_LENGTH) as i64 * IDEOGRAPHIC_PENALTY
    } else if len > OTHER_PENALTY_LENGTH {
        (len - OTHER_PENALTY_LENGTH) as i64 * OTHER_PENALTY
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dictionary::SystemDictionaryBuilder;

    fn build_tokenizer(char_def: &str) -> Tokenizer {
        let lexicon_csv = "自然,0,0,1,sizen
言語,0,0,4,gengo
処理,0,0,3,shori
自然言語,0,0,6,sizengengo
言語処理,0,0,5,gengoshori";
        let matrix_def = "1 1\n0 0 0";
        let unk_def = "DEFAULT,0,0,100,*";

        let dict = SystemDictionaryBuilder::from_readers(
            lexicon_csv.as_bytes(),
            matrix_def.as_bytes(),
            char_def.as_bytes(),
            unk_def.as_bytes(),
        )
        .unwrap();

        Tokenizer::new(dict).omit_bos_eos(true)
    }

    #[test]
    fn test_tokenize_1() {
        let tokenizer = build_tokenizer("DEFAULT 0 1 0");
        let tokens = tokenizer.tokenize("自然言語処理");
        assert_eq!(tokens.len(), 2);

        {
            let t = &tokens[0];
            assert_eq!(t.surface(), "自然");
            assert_eq!(t.range_char(), 0..2);
            assert_eq!(t.range_byte(), 0..6);
            assert_eq!(t.features(), &["sizen"]);
            assert_eq!(t.total_cost(), 1);
        }
        {
            let t = &tokens[1];
            assert_eq!(t.surface(), "言語処理");
            assert_eq!(t.range_char(), 2..6);
            assert_eq!(t.range_byte(), 6..18);
            assert_eq!(t.features(), &["gengoshori"]);
            assert_eq!(t.total_cost(), 6);
        }
    }

    #[test]
    fn test_tokenize_2() {
        let tokenizer = build_tokenizer("DEFAULT 0 1 0");
        let tokens = tokenizer.tokenize("自然日本語処理");
        assert_eq!(tokens.len(), 2);

        {
            let t = &tokens[0];
            assert_eq!(t.surface(), "自然");
            assert_eq!(t.range_char(), 0..2);
            assert_eq!(t.range_byte(), 0..6);
            assert_eq!(t.features(), &["sizen"]);
            assert_eq!(t.total_cost(), 1);
        }
        {
            let t = &tokens[1];
            assert_eq!(t.surface(), "日本語処理");
            assert_eq!(t.range_char(), 2..7);
            assert_eq!(t.range_byte(), 6..21);
            assert_eq!(t.features(), &["*"]);
            assert_eq!(t.class(), TokenClass::Unknown);
            assert_eq!(t.total_cost(), 101);
        }
    }

    #[test]
    fn test_tokenize_3() {
        let tokenizer = build_tokenizer("DEFAULT 0 0 3");
        let tokens = tokenizer.tokenize("不自然言語処理");
        assert_eq!(tokens.len(), 2);

        {
            let t = &tokens[0];
            assert_eq!(t.surface(), "不自然");
            assert_eq!(t.range_char(), 0..3);
            assert_eq!(t.range_byte(), 0..9);
            assert_eq!(t.features(), &["*"]);
            assert_eq!(t.total_cost(), 100);
        }
        {
            let t = &tokens[1];
            assert_eq!(t.surface(), "言語処理");
            assert_eq!(t.range_char(), 3..7);
            assert_eq!(t.range_byte(), 9..21);
            assert_eq!(t.features(), &["gengoshori"]);
            assert_eq!(t.total_cost(), 105);
        }
    }

    #[test]
    fn test_tokenize_empty() {
        let tokenizer = build_tokenizer("DEFAULT 0 0 3");
        assert!(tokenizer.tokenize("").is_empty());

        let tokenizer = tokenizer.omit_bos_eos(false);
        let tokens = tokenizer.tokenize("");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].surface(), "BOS");
        assert_eq!(tokens[1].surface(), "EOS");
        assert_eq!(tokens[1].range_char(), 0..0);
    }

    #[test]
    fn test_max_grouping_len() {
        let tokenizer = build_tokenizer("DEFAULT 0 1 0").max_grouping_len(2);
        let surfaces = tokenizer.wakati("日本語");
        // Grouping is capped, so the run is covered by shorter words.
        assert!(surfaces.iter().all(|s| s.chars().count() <= 2));
        assert_eq!(surfaces.concat(), "日本語");
    }

    #[test]
    fn test_invalid_utf8() {
        let tokenizer = build_tokenizer("DEFAULT 0 1 0");
        let tokens = tokenizer.analyze_bytes(b"ab\xffcd", Mode::Normal);
        let surfaces: Vec<_> = tokens.iter().map(|t| t.surface()).collect();
        assert_eq!(surfaces, vec!["ab", "\u{FFFD}", "cd"]);
        assert_eq!(tokens[1].range_byte(), 2..3);
        assert_eq!(tokens[2].range_char(), 3..5);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("normal".parse::<Mode>().unwrap(), Mode::Normal);
        assert_eq!("Search".parse::<Mode>().unwrap(), Mode::Search);
        assert_eq!("extended".parse::<Mode>().unwrap(), Mode::Extended);
        assert!("fast".parse::<Mode>().is_err());
        assert_eq!(Mode::Extended.to_string(), "extended");
    }
}
