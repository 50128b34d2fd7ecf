use std::sync::Arc;
use std::thread;

use hashbrown::HashSet;
use proptest::prelude::*;

use crate::dictionary::{SourceFormat, SystemDictionaryBuilder};
use crate::sentence::Sentence;
use crate::token::TokenClass;
use crate::tokenizer::lattice::Lattice;
use crate::tokenizer::{Mode, Tokenizer};

use super::{shared_dict, user_dict, CHAR_DEF, LEX_CSV, MATRIX_DEF, UNK_DEF};

const TEXT_PATTERN: &str = "[すもものうち東京都日本経済新聞関西国際空港限定トーバッグaRust1 。\u{2000B}]{0,24}";

fn lattice_words(tokenizer: &Tokenizer, text: &str) -> HashSet<(usize, usize, u32, TokenClass)> {
    let sent = Sentence::new(text.as_bytes(), tokenizer.dictionary().char_cate());
    let mut lattice = Lattice::default();
    tokenizer.build_lattice(&sent, &mut lattice, false);
    lattice
        .nodes()
        .iter()
        .map(|n| (n.start_byte(), n.end_byte(), n.word_id(), n.class()))
        .collect()
}

proptest! {
    #[test]
    fn wakati_concat_is_input(text in TEXT_PATTERN) {
        let tokenizer = Tokenizer::new(shared_dict());
        prop_assert_eq!(tokenizer.wakati(&text).concat(), text);
    }

    #[test]
    fn tokens_are_contiguous(text in TEXT_PATTERN, user in any::<bool>()) {
        let mut tokenizer = Tokenizer::new(shared_dict()).omit_bos_eos(true);
        if user {
            tokenizer = tokenizer.user_dict(user_dict());
        }
        for mode in [Mode::Normal, Mode::Search, Mode::Extended] {
            let tokens = tokenizer.analyze(&text, mode);
            let mut pos_char = 0;
            let mut pos_byte = 0;
            for t in &tokens {
                prop_assert_eq!(t.start(), pos_char);
                prop_assert_eq!(t.range_byte().start, pos_byte);
                prop_assert!(t.start() < t.end());
                prop_assert_eq!(t.surface(), &text[t.range_byte()]);
                pos_char = t.end();
                pos_byte = t.range_byte().end;
            }
            prop_assert_eq!(pos_char, text.chars().count());
            prop_assert_eq!(pos_byte, text.len());
        }
    }

    #[test]
    fn total_cost_is_path_cost(text in TEXT_PATTERN) {
        let dict = shared_dict();
        let tokenizer = Tokenizer::new(Arc::clone(&dict));
        let tokens = tokenizer.tokenize(&text);
        prop_assert_eq!(tokens[0].class(), TokenClass::Dummy);
        prop_assert_eq!(tokens[tokens.len() - 1].class(), TokenClass::Dummy);

        let mut cost = 0;
        for w in tokens.windows(2) {
            cost += i64::from(dict.connector().cost(w[0].right_id(), w[1].left_id()));
            cost += i64::from(w[1].word_cost());
            prop_assert_eq!(w[1].total_cost(), cost);
        }
    }

    #[test]
    fn lattice_nodes_are_connected(text in TEXT_PATTERN, user in any::<bool>()) {
        let mut tokenizer = Tokenizer::new(shared_dict());
        if user {
            tokenizer = tokenizer.user_dict(user_dict());
        }
        let connector = tokenizer.dictionary().connector();
        let sent = Sentence::new(text.as_bytes(), tokenizer.dictionary().char_cate());
        let mut lattice = Lattice::default();
        tokenizer.build_lattice(&sent, &mut lattice, false);

        prop_assert!(lattice.eos().is_some());
        prop_assert_eq!(lattice.bos().prev(), None);
        for node in &lattice.nodes()[1..] {
            prop_assert!(node.min_cost() < i64::MAX);
            let prev = node.prev();
            prop_assert!(prev.is_some());
            let prev = &lattice.nodes()[prev.unwrap()];
            prop_assert_eq!(prev.end_byte(), node.start_byte());
            let expected = prev.min_cost()
                + i64::from(connector.cost(prev.morph().right_id, node.morph().left_id))
                + i64::from(node.morph().weight);
            prop_assert_eq!(node.min_cost(), expected);
        }
    }

    #[test]
    fn invoke_never_removes_candidates(text in "[すもものうちトーバッグa]{0,16}") {
        let build = |char_def: &str| {
            let dict = SystemDictionaryBuilder::new()
                .format(SourceFormat::Ipa)
                .build_from_readers(
                    LEX_CSV.as_bytes(),
                    MATRIX_DEF.as_bytes(),
                    char_def.as_bytes(),
                    UNK_DEF.as_bytes(),
                )
                .unwrap();
            Tokenizer::new(dict)
        };
        let lazy = build(CHAR_DEF);
        let eager = build(&CHAR_DEF.replace("HIRAGANA 0 1 2", "HIRAGANA 1 1 2"));

        let lazy_words = lattice_words(&lazy, &text);
        let eager_words = lattice_words(&eager, &text);
        prop_assert!(lazy_words.is_subset(&eager_words));
    }

    #[test]
    fn bytes_never_panic(input in proptest::collection::vec(any::<u8>(), 0..32)) {
        let tokenizer = Tokenizer::new(shared_dict()).omit_bos_eos(true);
        for mode in [Mode::Normal, Mode::Search, Mode::Extended] {
            let tokens = tokenizer.analyze_bytes(&input, mode);
            let end = tokens.last().map_or(0, |t| t.range_byte().end);
            prop_assert_eq!(end, input.len());
        }
    }
}

#[test]
fn test_deterministic_across_threads() {
    let sentences = [
        "すもももももももものうち",
        "関西国際空港限定トートバッグ",
        "日本経済新聞",
        "Rustの東京。",
    ];
    let tokenizer = Arc::new(Tokenizer::new(shared_dict()).user_dict(user_dict()));
    let expected: Vec<Vec<String>> = sentences
        .iter()
        .map(|s| {
            tokenizer
                .analyze(s, Mode::Search)
                .iter()
                .map(|t| format!("{}\t{}", t, t.total_cost()))
                .collect()
        })
        .collect();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tokenizer = Arc::clone(&tokenizer);
                scope.spawn(move || {
                    sentences
                        .iter()
                        .map(|s| {
                            tokenizer
                                .analyze(s, Mode::Search)
                                .iter()
                                .map(|t| format!("{}\t{}", t, t.total_cost()))
                                .collect::<Vec<_>>()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
