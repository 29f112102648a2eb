//! Node model for the two-layer tree.
//!
//! The upper ("super") tree has Context leaves, one per word-starting byte. Every context owns a
//! private lower ("sub") tree whose leaves are Pattern nodes. Internal nodes own both children;
//! no parent links are kept since nothing walks the trees upward.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use crate::tools::pattern_table::PatternTable;

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum NodeData {
    /// Internal node: left child is bit 0, right child is bit 1.
    Kids(Box<Node>, Box<Node>),
    /// Leaf of the super-tree, naming a context by its byte.
    Context(u8),
    /// Leaf of a sub-tree, holding a byte pattern.
    Pattern(Vec<u8>),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Node {
    /// Frequency of the leaf, or the sum of both children.
    pub weight: u64,
    /// Creation order within one tree build. Last resort tie-break.
    pub seq: u64,
    pub node_data: NodeData,
}

impl Node {
    /// Create a new node
    pub fn new(weight: u64, seq: u64, node_data: NodeData) -> Node {
        Node {
            weight,
            seq,
            node_data,
        }
    }

    /// Merge two nodes under a new internal node.
    pub fn join(left: Node, right: Node, seq: u64) -> Node {
        Node::new(
            left.weight + right.weight,
            seq,
            NodeData::Kids(Box::new(left), Box::new(right)),
        )
    }

    /// Length of the leaf payload. Contexts count as one byte, internal nodes as zero.
    pub fn pattern_len(&self) -> usize {
        match &self.node_data {
            NodeData::Kids(_, _) => 0,
            NodeData::Context(_) => 1,
            NodeData::Pattern(p) => p.len(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self.node_data, NodeData::Kids(_, _))
    }

    pub fn left(&self) -> Option<&Node> {
        match &self.node_data {
            NodeData::Kids(left, _) => Some(left),
            _ => None,
        }
    }

    pub fn right(&self) -> Option<&Node> {
        match &self.node_data {
            NodeData::Kids(_, right) => Some(right),
            _ => None,
        }
    }

    /// Follow one bit from an internal node. Leaves have nowhere to go.
    pub fn child(&self, bit: u8) -> Option<&Node> {
        if bit == 0 {
            self.left()
        } else {
            self.right()
        }
    }

    /// Number of leaves below (and including) this node.
    pub fn leaf_count(&self) -> usize {
        match &self.node_data {
            NodeData::Kids(left, right) => left.leaf_count() + right.leaf_count(),
            _ => 1,
        }
    }

    /// Depth of the deepest leaf. A lone leaf has depth 0.
    pub fn depth(&self) -> usize {
        match &self.node_data {
            NodeData::Kids(left, right) => 1 + left.depth().max(right.depth()),
            _ => 0,
        }
    }
}

impl Ord for Node {
    /// Sort Nodes by increasing weight, then increasing payload length, then creation order
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .then_with(|| self.pattern_len().cmp(&other.pattern_len()))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A word-starting byte (or a separator) together with everything learned about it.
#[derive(Debug, Clone)]
pub struct ContextNode {
    pub symbol: u8,
    /// How many words started with this byte.
    pub frequency: u64,
    /// Patterns seen inside words started by this byte.
    pub patterns: PatternTable,
    /// Root of the private Huffman tree over `patterns`. None until built, and stays None for
    /// an empty table.
    pub sub_tree: Option<Box<Node>>,
    /// Code of this context in the super-tree.
    pub code: Option<String>,
    /// Code of every pattern inside this context.
    pub sub_dictionary: FxHashMap<Vec<u8>, String>,
}

impl ContextNode {
    pub fn new(symbol: u8, max_pattern_length: usize, max_pattern_amount: usize) -> Self {
        Self::with_table(
            symbol,
            0,
            PatternTable::new(max_pattern_length, max_pattern_amount),
        )
    }

    pub fn with_table(symbol: u8, frequency: u64, patterns: PatternTable) -> Self {
        Self {
            symbol,
            frequency,
            patterns,
            sub_tree: None,
            code: None,
            sub_dictionary: FxHashMap::default(),
        }
    }

    pub fn sub_tree(&self) -> Option<&Node> {
        self.sub_tree.as_deref()
    }

    pub fn sub_code(&self, pattern: &[u8]) -> Option<&str> {
        self.sub_dictionary.get(pattern).map(|c| c.as_str())
    }

    /// Walk the sub-tree and record the code of every pattern leaf.
    pub fn generate_codes(&mut self) {
        self.sub_dictionary.clear();
        if let Some(root) = &self.sub_tree {
            let mut code = String::new();
            collect_pattern_codes(root, &mut code, &mut self.sub_dictionary);
        }
    }
}

/// Recursively walk a sub-tree, building up each leaf's code in `code`.
fn collect_pattern_codes(node: &Node, code: &mut String, codes: &mut FxHashMap<Vec<u8>, String>) {
    match &node.node_data {
        NodeData::Kids(left, right) => {
            code.push('0');
            collect_pattern_codes(left, code, codes);
            code.pop();
            code.push('1');
            collect_pattern_codes(right, code, codes);
            code.pop();
        }
        NodeData::Pattern(pattern) => {
            codes.insert(pattern.clone(), code.clone());
        }
        NodeData::Context(_) => {}
    }
}
