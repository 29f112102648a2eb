use log::{debug, trace};
use rustc_hash::FxHashMap;

use super::node::{ContextNode, Node, NodeData};
use super::priority_queue::PriorityQueue;
use crate::tools::options::Separators;

/// All contexts, keyed by their byte.
pub type ContextMap = FxHashMap<u8, ContextNode>;

/// The context tables plus the trees and codes built from them.
///
/// Only the frequency tables (and the few values needed to read the body back) are written to
/// the header. Trees are a pure function of the tables, so the decoder rebuilds them.
#[derive(Debug, Clone)]
pub struct Dictionary {
    contexts: ContextMap,
    root: Option<Node>,
    separators: Separators,
    /// Number of bytes the tables were mined from.
    source_len: u64,
    max_pattern_length: usize,
}

impl Dictionary {
    /// Wrap mined (or deserialized) contexts. Call build() or rebuild() before using codes.
    pub fn new(
        contexts: ContextMap,
        separators: Separators,
        source_len: u64,
        max_pattern_length: usize,
    ) -> Self {
        Self {
            contexts,
            root: None,
            separators,
            source_len,
            max_pattern_length,
        }
    }

    /// Build the super-tree (sub-trees are built lazily as their contexts get merged) and
    /// assign every code.
    pub fn build(&mut self) {
        self.root = build_super_tree(&mut self.contexts);
        if let Some(root) = &self.root {
            let mut code = String::new();
            build_dictionary(root, &mut code, &mut self.contexts);
            debug!(
                "Built super-tree over {} contexts, depth {}",
                self.contexts.len(),
                root.depth()
            );
        }
    }

    /// Build every sub-tree up front, then the super-tree and codes. Used by the decoder.
    pub fn rebuild(&mut self) {
        self.contexts.values_mut().for_each(build_sub_tree);
        self.build();
    }

    pub fn context(&self, symbol: u8) -> Option<&ContextNode> {
        self.contexts.get(&symbol)
    }

    pub fn contexts(&self) -> &ContextMap {
        &self.contexts
    }

    /// Contexts in ascending byte order.
    pub fn sorted_contexts(&self) -> Vec<&ContextNode> {
        let mut list: Vec<&ContextNode> = self.contexts.values().collect();
        list.sort_unstable_by_key(|c| c.symbol);
        list
    }

    /// Root of the super-tree, once built.
    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn separators(&self) -> &Separators {
        &self.separators
    }

    pub fn source_len(&self) -> u64 {
        self.source_len
    }

    pub fn max_pattern_length(&self) -> usize {
        self.max_pattern_length
    }

    /// Total number of patterns over all context tables.
    pub fn pattern_count(&self) -> usize {
        self.contexts.values().map(|c| c.patterns.len()).sum()
    }

    /// Every context code followed by its pattern codes, sorted by byte then pattern.
    pub fn code_table(&self) -> Vec<(u8, &str, Vec<(&[u8], &str)>)> {
        self.sorted_contexts()
            .into_iter()
            .map(|ctx| {
                let mut subs: Vec<(&[u8], &str)> = ctx
                    .sub_dictionary
                    .iter()
                    .map(|(p, c)| (p.as_slice(), c.as_str()))
                    .collect();
                subs.sort_unstable();
                (ctx.symbol, ctx.code.as_deref().unwrap_or(""), subs)
            })
            .collect()
    }
}

/// Pop two, merge, push back, until one node is left. `on_pop` sees each node before it is
/// merged.
fn reduce<F: FnMut(&Node)>(
    mut queue: PriorityQueue<Node>,
    mut seq: u64,
    mut on_pop: F,
) -> Option<Node> {
    while queue.size() > 1 {
        let left = queue.poll()?;
        let right = queue.poll()?;
        on_pop(&left);
        on_pop(&right);
        queue.add(Node::join(left, right, seq));
        seq += 1;
    }
    queue.poll()
}

/// Build the super-tree over all contexts and return its root. A context's sub-tree is built
/// the moment the context is taken off the queue to be merged, so only one pattern queue is
/// alive at a time.
pub fn build_super_tree(contexts: &mut ContextMap) -> Option<Node> {
    // Push in byte order so both sides of the stream create leaves identically.
    let mut symbols: Vec<u8> = contexts.keys().copied().collect();
    symbols.sort_unstable();

    let mut queue = PriorityQueue::new();
    let mut seq = 0;
    for symbol in symbols {
        queue.add(Node::new(
            contexts[&symbol].frequency,
            seq,
            NodeData::Context(symbol),
        ));
        seq += 1;
    }

    let root = reduce(queue, seq, |node| {
        if let NodeData::Context(symbol) = node.node_data {
            if let Some(ctx) = contexts.get_mut(&symbol) {
                if ctx.sub_tree.is_none() {
                    build_sub_tree(ctx);
                }
            }
        }
    });

    // A lone context is never merged, so build its sub-tree here.
    if let Some(Node {
        node_data: NodeData::Context(symbol),
        ..
    }) = &root
    {
        if let Some(ctx) = contexts.get_mut(symbol) {
            if ctx.sub_tree.is_none() {
                build_sub_tree(ctx);
            }
        }
    }
    root
}

/// Build the private tree over one context's pattern table.
pub fn build_sub_tree(context: &mut ContextNode) {
    let mut queue = PriorityQueue::new();
    let mut seq = 0;
    for (pattern, count) in context.patterns.sorted() {
        queue.add(Node::new(count, seq, NodeData::Pattern(pattern.to_vec())));
        seq += 1;
    }
    context.sub_tree = reduce(queue, seq, |_| {}).map(Box::new);
    trace!(
        "Sub-tree for {:?}: {} leaves",
        context.symbol as char,
        context.sub_tree.as_ref().map_or(0, |n| n.leaf_count())
    );
}

/// Walk the super-tree, giving every context its code and generating its pattern codes.
pub fn build_dictionary(node: &Node, code: &mut String, contexts: &mut ContextMap) {
    match &node.node_data {
        NodeData::Kids(left, right) => {
            code.push('0');
            build_dictionary(left, code, contexts);
            code.pop();
            code.push('1');
            build_dictionary(right, code, contexts);
            code.pop();
        }
        NodeData::Context(symbol) => {
            if let Some(ctx) = contexts.get_mut(symbol) {
                ctx.code = Some(code.clone());
                ctx.generate_codes();
            }
        }
        NodeData::Pattern(_) => {}
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tools::freq_count::mine;
    use crate::tools::options::Config;
    use crate::tools::progress::Progress;

    fn dictionary(text: &str) -> Dictionary {
        let mut dict = mine(text.as_bytes(), &Config::default(), &mut Progress::none()).unwrap();
        dict.build();
        dict
    }

    fn assert_prefix_free(codes: &[&str]) {
        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a), "{:?} is a prefix of {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn weights_test() {
        let dict = dictionary("the cat sat. the dog ran.");
        let root = dict.root().unwrap();
        let total: u64 = dict.contexts().values().map(|c| c.frequency).sum();
        assert_eq!(root.weight, total);
        assert_eq!(root.leaf_count(), dict.contexts().len());

        fn check(node: &Node) {
            if let NodeData::Kids(l, r) = &node.node_data {
                assert_eq!(node.weight, l.weight + r.weight);
                check(l);
                check(r);
            }
        }
        check(root);
    }

    #[test]
    fn every_context_has_code_test() {
        let dict = dictionary("the cat sat. the dog ran.");
        for ctx in dict.contexts().values() {
            assert!(ctx.code.is_some());
            // Every table entry got a code.
            assert_eq!(ctx.sub_dictionary.len(), ctx.patterns.len());
        }
    }

    #[test]
    fn prefix_free_test() {
        let dict = dictionary(
            "It was the best of times, it was the worst of times; it was the age of wisdom!",
        );
        let top: Vec<&str> = dict
            .contexts()
            .values()
            .map(|c| c.code.as_deref().unwrap())
            .collect();
        assert_prefix_free(&top);
        for ctx in dict.contexts().values() {
            let subs: Vec<&str> = ctx.sub_dictionary.values().map(|c| c.as_str()).collect();
            assert_prefix_free(&subs);
        }
    }

    #[test]
    fn determinism_test() {
        let text = "she sells sea shells by the sea shore, the shells she sells are sea shells.";
        let a = dictionary(text);
        let b = dictionary(text);
        assert_eq!(a.code_table(), b.code_table());

        // Rebuilding from the same tables, all sub-trees first, gives the same codes.
        let mut c = Dictionary::new(
            a.contexts()
                .iter()
                .map(|(&k, v)| (k, ContextNode::with_table(k, v.frequency, v.patterns.clone())))
                .collect(),
            a.separators().clone(),
            a.source_len(),
            a.max_pattern_length(),
        );
        c.rebuild();
        assert_eq!(a.code_table(), c.code_table());
    }

    #[test]
    fn single_context_test() {
        let dict = dictionary("x");
        let root = dict.root().unwrap();
        assert!(root.is_leaf());
        assert_eq!(root.node_data, NodeData::Context(b'x'));
        let ctx = dict.context(b'x').unwrap();
        assert_eq!(ctx.code.as_deref(), Some(""));
        assert!(ctx.sub_tree().is_none());
    }

    #[test]
    fn lone_context_gets_sub_tree_test() {
        let dict = dictionary("abab");
        let ctx = dict.context(b'a').unwrap();
        assert!(ctx.sub_tree().is_some());
        assert!(ctx.sub_code(b"b").is_some());
    }

    #[test]
    fn tie_break_test() {
        // Four contexts with equal counts: byte order decides, giving a balanced tree.
        let dict = dictionary("a b c d");
        assert_eq!(dict.context(b' ').unwrap().frequency, 3);
        let codes: Vec<usize> = b"abcd"
            .iter()
            .map(|b| dict.context(*b).unwrap().code.as_ref().unwrap().len())
            .collect();
        assert!(codes.iter().all(|&l| l == codes[0] || l == codes[0] + 1));
        // Heavier space context has the shortest code.
        assert_eq!(dict.context(b' ').unwrap().code.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn empty_dictionary_test() {
        let mut dict = Dictionary::new(ContextMap::default(), Separators::default(), 0, 6);
        dict.build();
        assert!(dict.root().is_none());
        assert!(dict.code_table().is_empty());
    }
}
