use std::io::Write;

use hashbrown::HashSet;

use crate::errors::Result;
use crate::sentence::Sentence;
use crate::token::{node_features, TokenClass};
use crate::tokenizer::lattice::{Lattice, Node, BOS_IDX};
use crate::tokenizer::Tokenizer;

const BEST_COLOR: &str = "red";

fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn label(tokenizer: &Tokenizer, sent: &Sentence, idx: usize, node: &Node) -> String {
    if node.class() == TokenClass::Dummy {
        let name = if idx == BOS_IDX { "BOS" } else { "EOS" };
        return name.to_string();
    }
    let surface = String::from_utf8_lossy(&sent.raw()[node.range_byte()]);
    let features = node_features(
        tokenizer.dictionary(),
        tokenizer.user_dictionary(),
        node.class(),
        node.word_id(),
    );
    let pos = features.first().map_or("", String::as_str);
    format!(
        "{}\n{}\n{}",
        escape(&surface),
        escape(pos),
        node.morph().weight
    )
}

/// Writes all the nodes of the lattice and the edges between adjacent ones.
pub(crate) fn write_dot<W>(
    mut wtr: W,
    tokenizer: &Tokenizer,
    sent: &Sentence,
    lattice: &Lattice,
) -> Result<()>
where
    W: Write,
{
    let best = lattice.best_path_indices();
    let on_best: HashSet<usize> = best.iter().copied().collect();
    let best_edges: HashSet<(usize, usize)> = best.windows(2).map(|w| (w[0], w[1])).collect();

    writeln!(wtr, "digraph lattice {{")?;
    writeln!(wtr, "  rankdir=LR;")?;
    writeln!(wtr, "  node [shape=box, fontname=\"Helvetica\"];")?;

    for (idx, node) in lattice.nodes().iter().enumerate() {
        let text = label(tokenizer, sent, idx, node).replace('\n', "\\n");
        if on_best.contains(&idx) {
            writeln!(
                wtr,
                "  n{idx} [label=\"{text}\", color={BEST_COLOR}, penwidth=2];"
            )?;
        } else {
            writeln!(wtr, "  n{idx} [label=\"{text}\"];")?;
        }
    }

    let connector = tokenizer.dictionary().connector();
    for pos_byte in 0..=lattice.len_byte() {
        for &left_idx in lattice.ends(pos_byte) {
            let left = &lattice.nodes()[left_idx];
            for &right_idx in lattice.starts(pos_byte) {
                let right = &lattice.nodes()[right_idx];
                let cost = connector.cost(left.morph().right_id, right.morph().left_id);
                if best_edges.contains(&(left_idx, right_idx)) {
                    writeln!(
                        wtr,
                        "  n{left_idx} -> n{right_idx} [label=\"{cost}\", color={BEST_COLOR}, penwidth=2];"
                    )?;
                } else {
                    writeln!(wtr, "  n{left_idx} -> n{right_idx} [label=\"{cost}\"];")?;
                }
            }
        }
    }

    writeln!(wtr, "}}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dictionary::SystemDictionaryBuilder;
    use crate::tokenizer::Mode;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a\"b\\c"), "a\\\"b\\\\c");
    }

    #[test]
    fn test_write_dot() {
        let dict = SystemDictionaryBuilder::from_readers(
            "自然,0,0,1,名詞\n言語,0,0,4,名詞\n自然言語,0,0,3,名詞".as_bytes(),
            "1 1\n0 0 0".as_bytes(),
            "DEFAULT 0 1 0".as_bytes(),
            "DEFAULT,0,0,100,*".as_bytes(),
        )
        .unwrap();
        let tokenizer = Tokenizer::new(dict);

        let mut buf = vec![];
        let tokens = tokenizer
            .analyze_graph(&mut buf, "自然言語", Mode::Normal)
            .unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].surface(), "自然言語");

        let dot = String::from_utf8(buf).unwrap();
        assert!(dot.starts_with("digraph lattice {"));
        assert!(dot.trim_end().ends_with('}'));
        assert!(dot.contains("label=\"BOS\""));
        assert!(dot.contains("label=\"EOS\""));
        assert!(dot.contains("label=\"自然言語\\n名詞\\n3\", color=red"));
        assert!(dot.contains("label=\"自然\\n名詞\\n1\"];"));

        // Edges join every node ending at a position to every node starting there.
        assert!(dot.contains("n0 -> n2 [label=\"0\", color=red, penwidth=2];"));
        assert!(dot.contains("n2 -> n4 [label=\"0\", color=red, penwidth=2];"));
        assert!(dot.contains("n0 -> n1 [label=\"0\"];"));
        assert!(dot.contains("n1 -> n3 [label=\"0\"];"));
        assert!(dot.contains("n3 -> n4 [label=\"0\"];"));
        assert_eq!(dot.matches(" -> ").count(), 5);
    }
}
