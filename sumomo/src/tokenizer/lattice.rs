use std::ops::Range;

use crate::common::BOS_EOS_CONNECTION_ID;
use crate::dictionary::connector::ConnectionTable;
use crate::dictionary::lexicon::Morph;
use crate::token::TokenClass;

const MAX_COST: i64 = i64::MAX;

/// Id of BOS and EOS nodes.
pub(crate) const DUMMY_WORD_ID: u32 = u32::MAX;

/// Arena index of the BOS node.
pub(crate) const BOS_IDX: usize = 0;

#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Node {
    word_id: u32,
    class: TokenClass,
    start_byte: usize,
    end_byte: usize,
    morph: Morph,
    min_cost: i64,
    prev: Option<usize>,
}

impl Node {
    #[inline(always)]
    pub const fn new(
        word_id: u32,
        class: TokenClass,
        range_byte: Range<usize>,
        morph: Morph,
    ) -> Self {
        Self {
            word_id,
            class,
            start_byte: range_byte.start,
            end_byte: range_byte.end,
            morph,
            min_cost: 0,
            prev: None,
        }
    }

    fn dummy(pos: usize) -> Self {
        Self::new(
            DUMMY_WORD_ID,
            TokenClass::Dummy,
            pos..pos,
            Morph::new(BOS_EOS_CONNECTION_ID, BOS_EOS_CONNECTION_ID, 0),
        )
    }

    #[inline(always)]
    pub const fn word_id(&self) -> u32 {
        self.word_id
    }

    #[inline(always)]
    pub const fn class(&self) -> TokenClass {
        self.class
    }

    #[inline(always)]
    pub const fn start_byte(&self) -> usize {
        self.start_byte
    }

    #[inline(always)]
    pub const fn end_byte(&self) -> usize {
        self.end_byte
    }

    #[inline(always)]
    pub const fn range_byte(&self) -> Range<usize> {
        self.start_byte..self.end_byte
    }

    #[inline(always)]
    pub const fn morph(&self) -> Morph {
        self.morph
    }

    /// Minimum cost of a path from BOS through this node.
    #[inline(always)]
    pub const fn min_cost(&self) -> i64 {
        self.min_cost
    }

    /// Arena index of the best predecessor, `None` only for BOS.
    #[inline(always)]
    pub const fn prev(&self) -> Option<usize> {
        self.prev
    }

    /// Moves the node by `offset` bytes.
    #[inline(always)]
    pub fn shifted(mut self, offset: usize) -> Self {
        self.start_byte += offset;
        self.end_byte += offset;
        self
    }
}

/// Lattice of candidate words over byte positions.
///
/// Nodes live in an arena and refer to their best predecessors by index.
/// The minimum path cost of a node is fixed when it is inserted, since all
/// of its predecessors end at its start and are inserted beforehand.
#[derive(Default)]
pub struct Lattice {
    nodes: Vec<Node>,
    ends: Vec<Vec<usize>>,
    starts: Vec<Vec<usize>>,
    eos: Option<usize>,
    len_byte: usize,
}

impl Lattice {
    pub fn reset(&mut self, new_len_byte: usize) {
        Self::reset_vec(&mut self.ends, new_len_byte + 1);
        Self::reset_vec(&mut self.starts, new_len_byte + 1);
        self.nodes.clear();
        self.len_byte = new_len_byte;
        self.eos = None;
        self.insert_bos();
    }

    fn reset_vec<T>(data: &mut Vec<Vec<T>>, new_len: usize) {
        for v in data.iter_mut() {
            v.clear();
        }
        data.resize_with(new_len, Vec::new);
    }

    /// Returns the number of bytes of the input.
    #[inline(always)]
    pub const fn len_byte(&self) -> usize {
        self.len_byte
    }

    fn insert_bos(&mut self) {
        debug_assert!(self.nodes.is_empty());
        self.nodes.push(Node::dummy(0));
        self.ends[0].push(BOS_IDX);
    }

    /// Connects EOS to the best node ending at the end of the input,
    /// returning `false` if no node ends there.
    pub fn insert_eos(&mut self, connector: &ConnectionTable) -> bool {
        let mut eos = Node::dummy(self.len_byte);
        let Some((prev, min_cost)) = self.search_min_node(self.len_byte, eos.morph.left_id, connector)
        else {
            return false;
        };
        eos.prev = Some(prev);
        eos.min_cost = min_cost;
        let idx = self.nodes.len();
        self.starts[self.len_byte].push(idx);
        self.eos = Some(idx);
        self.nodes.push(eos);
        true
    }

    /// Inserts a node, connecting it to the best node ending at its start.
    ///
    /// `penalty` is added to the cost of the node. Returns `false` without
    /// inserting anything if no node ends at the start.
    pub fn insert_node(&mut self, mut node: Node, penalty: i64, connector: &ConnectionTable) -> bool {
        debug_assert!(node.start_byte < node.end_byte);
        debug_assert!(node.end_byte <= self.len_byte);

        let Some((prev, min_cost)) =
            self.search_min_node(node.start_byte, node.morph.left_id, connector)
        else {
            return false;
        };
        node.prev = Some(prev);
        node.min_cost = min_cost + i64::from(node.morph.weight) + penalty;

        let idx = self.nodes.len();
        self.ends[node.end_byte].push(idx);
        self.starts[node.start_byte].push(idx);
        self.nodes.push(node);
        true
    }

    /// Finds the node ending at `end_byte` that minimizes the cost of
    /// connecting to `left_id`. Ties go to the node inserted first.
    fn search_min_node(
        &self,
        end_byte: usize,
        left_id: i16,
        connector: &ConnectionTable,
    ) -> Option<(usize, i64)> {
        let mut min_idx = None;
        let mut min_cost = MAX_COST;
        for &idx in &self.ends[end_byte] {
            let left_node = &self.nodes[idx];
            debug_assert_ne!(left_node.min_cost, MAX_COST);
            let conn_cost = connector.cost(left_node.morph.right_id, left_id);
            let new_cost = left_node.min_cost + i64::from(conn_cost);
            if new_cost < min_cost {
                min_idx = Some(idx);
                min_cost = new_cost;
            }
        }
        min_idx.map(|idx| (idx, min_cost))
    }

    /// Checks if there exists at least one node ending at `pos_byte`.
    #[inline(always)]
    pub fn has_previous_node(&self, pos_byte: usize) -> bool {
        self.ends.get(pos_byte).map_or(false, |d| !d.is_empty())
    }

    #[inline(always)]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Gets the arena indices of the nodes ending at `pos_byte`.
    #[inline(always)]
    pub fn ends(&self, pos_byte: usize) -> &[usize] {
        &self.ends[pos_byte]
    }

    /// Gets the arena indices of the nodes starting at `pos_byte`.
    #[inline(always)]
    pub fn starts(&self, pos_byte: usize) -> &[usize] {
        &self.starts[pos_byte]
    }

    #[inline(always)]
    pub fn bos(&self) -> &Node {
        &self.nodes[BOS_IDX]
    }

    #[inline(always)]
    pub fn eos(&self) -> Option<&Node> {
        self.eos.map(|idx| &self.nodes[idx])
    }

    /// Gets the arena indices of the best path from BOS to EOS, both
    /// included. Empty if EOS is not connected.
    pub fn best_path_indices(&self) -> Vec<usize> {
        let mut path = vec![];
        let mut cur = self.eos;
        while let Some(idx) = cur {
            path.push(idx);
            cur = self.nodes[idx].prev();
        }
        path.reverse();
        path
    }

    /// Gets the nodes of the best path, excluding BOS and EOS.
    pub fn best_path(&self) -> Vec<Node> {
        let path = self.best_path_indices();
        if path.len() < 2 {
            return vec![];
        }
        path[1..path.len() - 1]
            .iter()
            .map(|&idx| self.nodes[idx].clone())
            .collect()
    }
}

impl std::fmt::Debug for Lattice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Lattice {{ eos: {:?}, ends: [", &self.eos)?;
        for (i, e) in self.ends[..=self.len_byte].iter().enumerate() {
            let nodes: Vec<_> = e.iter().map(|&idx| &self.nodes[idx]).collect();
            writeln!(f, "{} => {:?}", i, nodes)?;
        }
        writeln!(f, "]}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector() -> ConnectionTable {
        // right_id 1 -> left_id 2 is cheap.
        ConnectionTable::new(3, 3, vec![0, 0, 0, 0, 0, -100, 0, 0, 0]).unwrap()
    }

    #[test]
    fn test_best_path() {
        let conn = connector();
        let mut lattice = Lattice::default();
        lattice.reset(4);
        assert!(lattice.insert_node(
            Node::new(0, TokenClass::Known, 0..2, Morph::new(0, 0, 10)),
            0,
            &conn
        ));
        assert!(lattice.insert_node(
            Node::new(1, TokenClass::Known, 0..2, Morph::new(0, 1, 20)),
            0,
            &conn
        ));
        assert!(lattice.insert_node(
            Node::new(2, TokenClass::Known, 2..4, Morph::new(2, 0, 10)),
            0,
            &conn
        ));
        assert!(lattice.insert_node(
            Node::new(3, TokenClass::Known, 0..4, Morph::new(0, 0, 35)),
            0,
            &conn
        ));
        assert!(lattice.insert_eos(&conn));

        let path = lattice.best_path();
        let ids: Vec<_> = path.iter().map(|n| n.word_id()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(path[1].min_cost(), 20 - 100 + 10);
        assert_eq!(lattice.eos().unwrap().min_cost(), -70);
        assert_eq!(lattice.best_path_indices().len(), 4);
        assert_eq!(lattice.starts(0).len(), 3);
        assert_eq!(lattice.ends(4).len(), 2);
        assert_eq!(lattice.len_byte(), 4);

        // EOS starts at the end and backtracks through its predecessors.
        let eos_idx = lattice.nodes().len() - 1;
        assert_eq!(lattice.starts(4), &[eos_idx]);
        assert_eq!(lattice.eos().unwrap().prev(), Some(3));
        assert_eq!(lattice.nodes()[3].prev(), Some(2));
        assert_eq!(lattice.bos().prev(), None);
    }

    #[test]
    fn test_tie_first_inserted() {
        let conn = ConnectionTable::new(1, 1, vec![0]).unwrap();
        let mut lattice = Lattice::default();
        lattice.reset(2);
        lattice.insert_node(Node::new(7, TokenClass::Known, 0..2, Morph::new(0, 0, 5)), 0, &conn);
        lattice.insert_node(Node::new(8, TokenClass::Known, 0..2, Morph::new(0, 0, 5)), 0, &conn);
        lattice.insert_eos(&conn);
        assert_eq!(lattice.best_path()[0].word_id(), 7);
    }

    #[test]
    fn test_unreachable() {
        let conn = ConnectionTable::new(1, 1, vec![0]).unwrap();
        let mut lattice = Lattice::default();
        lattice.reset(3);
        assert!(!lattice.insert_node(
            Node::new(0, TokenClass::Known, 1..3, Morph::default()),
            0,
            &conn
        ));
        assert!(lattice.insert_node(
            Node::new(0, TokenClass::Known, 0..1, Morph::default()),
            0,
            &conn
        ));
        assert!(!lattice.insert_eos(&conn));
        assert!(lattice.best_path().is_empty());
        assert!(!lattice.has_previous_node(3));
        assert!(lattice.has_previous_node(1));
    }

    #[test]
    fn test_empty_input() {
        let conn = ConnectionTable::new(1, 1, vec![0]).unwrap();
        let mut lattice = Lattice::default();
        lattice.reset(0);
        assert!(lattice.insert_eos(&conn));
        assert_eq!(lattice.best_path_indices(), vec![0, 1]);
        assert!(lattice.best_path().is_empty());
    }

    #[test]
    fn test_reuse() {
        let conn = ConnectionTable::new(1, 1, vec![0]).unwrap();
        let mut lattice = Lattice::default();
        lattice.reset(5);
        lattice.insert_node(Node::new(0, TokenClass::Known, 0..5, Morph::default()), 0, &conn);
        lattice.reset(1);
        assert_eq!(lattice.nodes().len(), 1);
        assert!(!lattice.has_previous_node(1));
        assert!(!lattice.has_previous_node(5));
    }
}
