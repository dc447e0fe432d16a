//! Constituency trees with discontinuous constituents
//!
//! A [`Tree`] is an arena of non-terminal nodes with owned child lists,
//! built from the parent pointers of an export-format [`Sentence`] in a
//! single pass. Index 0 is always the synthetic root.

use rustc_hash::FxHashMap;

use crate::bytes::{LabelPool, Sym};
use crate::error::{StructureError, StructureErrorKind};
use crate::export::{Head, NodeId, ROOT_ID, Sentence, SentenceNumber};

/// 1-based position of a terminal among the terminals of its sentence.
///
/// Non-terminal lines are not counted, so when they are interleaved with
/// terminal lines this differs from the line index within the sentence.
pub type Position = u32;

/// Index of a node in [`Tree::nodes`]
pub type NodeIndex = usize;

/// A word with its tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub position: Position,
    pub word: Sym,
    pub tag: Sym,
    /// Node index of the parent
    pub parent: NodeIndex,
}

/// A non-terminal node (or the synthetic root)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub label: Sym,
    pub parent: Option<NodeIndex>,
    /// Non-terminal children
    pub children: Vec<NodeIndex>,
    /// Positions of terminal children
    pub terminals: Vec<Position>,
}

impl Node {
    fn new(id: NodeId, label: Sym) -> Self {
        Self {
            id,
            label,
            parent: None,
            children: Vec::new(),
            terminals: Vec::new(),
        }
    }
}

/// The terminals dominated by one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Yield {
    pub id: NodeId,
    pub label: Sym,
    /// Sorted ascending
    pub terminals: Vec<Position>,
}

/// A sentence as an immutable arena of nodes indexed by [`NodeIndex`]
#[derive(Debug, Clone)]
pub struct Tree {
    pub number: SentenceNumber,
    pub nodes: Vec<Node>,
    pub terminals: Vec<Terminal>,
}

impl Tree {
    pub const ROOT: NodeIndex = 0;

    /// Build the tree of a sentence, interning labels, tags and words
    pub fn from_sentence(
        sentence: &Sentence,
        root_label: &str,
        pool: &mut LabelPool,
    ) -> Result<Tree, StructureError> {
        let error = |kind| StructureError {
            sentence: sentence.number,
            kind,
        };

        let mut nodes = vec![Node::new(ROOT_ID, pool.get_or_intern(root_label))];
        let mut index_of: FxHashMap<NodeId, NodeIndex> = FxHashMap::default();
        index_of.insert(ROOT_ID, Tree::ROOT);

        // Declarations first, so that parents may follow their children
        let mut root_declared = false;
        for record in sentence.records.iter() {
            let Head::Node(id) = record.head else {
                continue;
            };
            let label = pool.get_or_intern(&record.tag);
            if id == ROOT_ID {
                if root_declared {
                    return Err(error(StructureErrorKind::DuplicateNode(id)));
                }
                root_declared = true;
                nodes[Tree::ROOT].label = label;
                continue;
            }
            if index_of.insert(id, nodes.len()).is_some() {
                return Err(error(StructureErrorKind::DuplicateNode(id)));
            }
            nodes.push(Node::new(id, label));
        }

        let mut terminals = Vec::new();
        for record in sentence.records.iter() {
            let Some(&parent) = index_of.get(&record.parent) else {
                return Err(error(StructureErrorKind::DanglingParent {
                    line_num: record.line_num,
                    parent: record.parent,
                }));
            };
            match &record.head {
                Head::Word(word) => {
                    let position = Position::try_from(terminals.len() + 1)
                        .map_err(|_| error(StructureErrorKind::TooManyTerminals(terminals.len())))?;
                    nodes[parent].terminals.push(position);
                    terminals.push(Terminal {
                        position,
                        word: pool.get_or_intern(word),
                        tag: pool.get_or_intern(&record.tag),
                        parent,
                    });
                }
                Head::Node(ROOT_ID) => {}
                Head::Node(id) => {
                    let child = index_of[id];
                    nodes[child].parent = Some(parent);
                    nodes[parent].children.push(child);
                }
            }
        }

        let tree = Tree {
            number: sentence.number,
            nodes,
            terminals,
        };
        if let Some(unreachable) = tree.unreachable_node() {
            return Err(error(StructureErrorKind::Unreachable(tree.nodes[unreachable].id)));
        }
        Ok(tree)
    }

    /// A node not dominated by the root, which means the parent pointers
    /// contain a cycle
    fn unreachable_node(&self) -> Option<NodeIndex> {
        let mut seen = vec![false; self.nodes.len()];
        for idx in self.preorder() {
            seen[idx] = true;
        }
        seen.iter().position(|&s| !s)
    }

    /// Node indices reachable from the root, parents before children
    pub fn preorder(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![Tree::ROOT];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.nodes[idx].children.iter().rev());
        }
        order
    }

    pub fn len(&self) -> usize {
        self.terminals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty()
    }

    pub fn root(&self) -> &Node {
        &self.nodes[Tree::ROOT]
    }

    pub fn terminal(&self, position: Position) -> Option<&Terminal> {
        self.terminals.get((position as usize).checked_sub(1)?)
    }

    /// Compute the yield of every node, skipping terminals for which
    /// `deleted` returns true. Yields come back in node-index order, the
    /// root first.
    pub fn yields<F>(&self, deleted: F) -> Vec<Yield>
    where
        F: Fn(&Terminal) -> bool,
    {
        let mut spans: Vec<Vec<Position>> = vec![Vec::new(); self.nodes.len()];
        // Children before parents
        for idx in self.preorder().into_iter().rev() {
            let node = &self.nodes[idx];
            let mut span: Vec<Position> = node
                .terminals
                .iter()
                .copied()
                .filter(|&p| !self.terminal(p).is_some_and(&deleted))
                .collect();
            for &child in node.children.iter() {
                span.extend_from_slice(&spans[child]);
            }
            span.sort_unstable();
            spans[idx] = span;
        }

        self.nodes
            .iter()
            .zip(spans)
            .map(|(node, terminals)| Yield {
                id: node.id,
                label: node.label,
                terminals,
            })
            .collect()
    }
}
