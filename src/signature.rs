//! Bracketings and signatures
//!
//! A [`Signature`] is the multiset of labeled bracketings of one tree. The
//! bracketing of a discontinuous constituent simply has gaps in its
//! terminal set; matching compares whole sets, so nothing here assumes
//! contiguous spans.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::bytes::{LabelPool, Sym};
use crate::params::EvalParams;
use crate::tree::{Position, Terminal, Tree};

/// Deletion sets of an [`EvalParams`], interned into the run's pool
#[derive(Debug, Clone, Default)]
pub struct Filters {
    /// Labels never emitted as bracketings; as tags, their terminals are
    /// dropped from all spans
    pub labels: FxHashSet<Sym>,
    /// Tags whose terminals do not count toward gold length and tagging
    pub length_labels: FxHashSet<Sym>,
    /// Words dropped from all spans
    pub words: FxHashSet<Sym>,
    pub labeled: bool,
}

impl Filters {
    pub fn new(params: &EvalParams, pool: &mut LabelPool) -> Self {
        let mut intern = |set: &FxHashSet<String>| -> FxHashSet<Sym> {
            set.iter().map(|s| pool.get_or_intern(s)).collect()
        };
        Self {
            labels: intern(&params.delete_labels),
            length_labels: intern(&params.delete_labels_for_length),
            words: intern(&params.delete_words),
            labeled: params.labeled,
        }
    }

    /// Is this terminal left out of constituent spans?
    #[inline]
    pub fn deletes_terminal(&self, terminal: &Terminal) -> bool {
        self.labels.contains(&terminal.tag) || self.words.contains(&terminal.word)
    }

    /// Does this terminal count toward the gold sentence length?
    #[inline]
    pub fn counts_for_length(&self, terminal: &Terminal) -> bool {
        !self.length_labels.contains(&terminal.tag)
    }

    /// Sentence length after removing length-deleted terminals
    pub fn length(&self, tree: &Tree) -> usize {
        tree.terminals
            .iter()
            .filter(|t| self.counts_for_length(t))
            .count()
    }
}

/// One constituent: a label (`None` when scoring unlabeled) and the set of
/// terminal positions it dominates, sorted ascending
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bracket {
    pub label: Option<Sym>,
    pub terminals: Box<[Position]>,
}

impl Bracket {
    pub fn new(label: Option<Sym>, mut terminals: Vec<Position>) -> Self {
        terminals.sort_unstable();
        Self {
            label,
            terminals: terminals.into_boxed_slice(),
        }
    }

    /// True when the terminal set has a gap
    pub fn is_discontinuous(&self) -> bool {
        self.terminals.windows(2).any(|w| w[1] != w[0] + 1)
    }

    /// Same span, wildcard label
    pub fn unlabeled(&self) -> Self {
        Self {
            label: None,
            terminals: self.terminals.clone(),
        }
    }
}

/// Multiset of bracketings of one sentence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    counts: FxHashMap<Bracket, usize>,
    total: usize,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bracketings of a tree: one per node with a non-empty yield and a
    /// label outside the deletion set
    pub fn from_tree(tree: &Tree, filters: &Filters) -> Self {
        let mut signature = Self::new();
        for y in tree.yields(|t| filters.deletes_terminal(t)) {
            if y.terminals.is_empty() || filters.labels.contains(&y.label) {
                continue;
            }
            let label = filters.labeled.then_some(y.label);
            signature.insert(Bracket::new(label, y.terminals));
        }
        signature
    }

    /// Add one occurrence of a bracketing
    pub fn insert(&mut self, bracket: Bracket) {
        *self.counts.entry(bracket).or_insert(0) += 1;
        self.total += 1;
    }

    /// Number of bracketings, counting repetitions
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Multiplicity of a bracketing
    pub fn count(&self, bracket: &Bracket) -> usize {
        self.counts.get(bracket).copied().unwrap_or(0)
    }

    /// Distinct bracketings with their multiplicities
    pub fn iter(&self) -> impl Iterator<Item = (&Bracket, usize)> {
        self.counts.iter().map(|(b, &n)| (b, n))
    }

    /// Size of the multiset intersection: the sum over distinct
    /// bracketings of the smaller multiplicity
    pub fn matches(&self, other: &Signature) -> usize {
        let (small, large) = if self.counts.len() <= other.counts.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .iter()
            .map(|(bracket, n)| n.min(large.count(bracket)))
            .sum()
    }

    /// The same multiset with every label replaced by the wildcard
    pub fn unlabeled(&self) -> Signature {
        let mut signature = Signature::new();
        for (bracket, n) in self.iter() {
            *signature.counts.entry(bracket.unlabeled()).or_insert(0) += n;
            signature.total += n;
        }
        signature
    }

    /// Number of bracketings with a gap, counting repetitions
    pub fn discontinuous(&self) -> usize {
        self.iter()
            .filter(|(bracket, _)| bracket.is_discontinuous())
            .map(|(_, n)| n)
            .sum()
    }
}

impl FromIterator<Bracket> for Signature {
    fn from_iter<I: IntoIterator<Item = Bracket>>(iter: I) -> Self {
        let mut signature = Signature::new();
        for bracket in iter {
            signature.insert(bracket);
        }
        signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportReader;

    const SENTENCE: &str = "#BOS 1
Darüber     PROAV   --  MO  500
muss        VMFIN   --  HD  503
nachgedacht VVPP    --  HD  500
werden      VAINF   --  HD  502
.           $.      --  --  0
#500        VP      --  OC  502
#502        VP      --  OC  503
#503        S       --  --  0
#EOS 1
";

    fn signature(text: &str, params: &EvalParams) -> (Signature, LabelPool) {
        let mut pool = LabelPool::new();
        let filters = Filters::new(params, &mut pool);
        let sentence = ExportReader::from_string(text).next().unwrap().unwrap();
        let tree = Tree::from_sentence(&sentence, &params.root_label, &mut pool).unwrap();
        (Signature::from_tree(&tree, &filters), pool)
    }

    fn bracket(pool: &mut LabelPool, label: &str, terminals: &[Position]) -> Bracket {
        Bracket::new(Some(pool.get_or_intern(label)), terminals.to_vec())
    }

    #[test]
    fn test_signature_from_tree() {
        let (sig, mut pool) = signature(SENTENCE, &EvalParams::default());

        assert_eq!(sig.len(), 4);
        assert_eq!(sig.count(&bracket(&mut pool, "VP", &[1, 3])), 1);
        assert_eq!(sig.count(&bracket(&mut pool, "VP", &[1, 3, 4])), 1);
        assert_eq!(sig.count(&bracket(&mut pool, "S", &[1, 2, 3, 4])), 1);
        assert_eq!(sig.count(&bracket(&mut pool, "VROOT", &[1, 2, 3, 4, 5])), 1);
        assert_eq!(sig.discontinuous(), 2);
    }

    #[test]
    fn test_deleted_labels_and_tags() {
        let mut params = EvalParams::default();
        params.delete_labels.insert("VROOT".to_string());
        params.delete_labels.insert("$.".to_string());
        let (sig, mut pool) = signature(SENTENCE, &params);

        assert_eq!(sig.len(), 3);
        assert_eq!(sig.count(&bracket(&mut pool, "VROOT", &[1, 2, 3, 4])), 0);
        assert_eq!(sig.count(&bracket(&mut pool, "S", &[1, 2, 3, 4])), 1);
    }

    #[test]
    fn test_deleted_words() {
        let mut params = EvalParams::default();
        params.delete_words.insert("werden".to_string());
        let (sig, mut pool) = signature(SENTENCE, &params);
        assert_eq!(sig.count(&bracket(&mut pool, "VP", &[1, 3])), 2);
        assert_eq!(sig.len(), 4);
    }

    #[test]
    fn test_empty_spans_are_dropped() {
        let text = "#BOS 2\n, $, -- -- 500\n#500 NP -- -- 0\n#EOS 2\n";
        let mut params = EvalParams::default();
        params.delete_labels.insert("$,".to_string());
        let (sig, _) = signature(text, &params);
        assert!(sig.is_empty());
    }

    #[test]
    fn test_unlabeled_mode() {
        let params = EvalParams::default().with_labeled(false);
        let (sig, _) = signature(SENTENCE, &params);
        assert!(sig.iter().all(|(b, _)| b.label.is_none()));
        assert_eq!(sig.count(&Bracket::new(None, vec![1, 3])), 1);
    }

    #[test]
    fn test_unary_chain_counts_twice() {
        let text = "#BOS 3\nja PTKANT -- -- 500\n#500 NP -- -- 501\n#501 NP -- -- 0\n#EOS 3\n";
        let (sig, mut pool) = signature(text, &EvalParams::default());
        assert_eq!(sig.count(&bracket(&mut pool, "NP", &[1])), 2);
        assert_eq!(sig.len(), 3);
    }

    #[test]
    fn test_matches_is_multiset_intersection() {
        let mut pool = LabelPool::new();
        let gold: Signature = vec![
            bracket(&mut pool, "NP", &[1]),
            bracket(&mut pool, "NP", &[1]),
            bracket(&mut pool, "VP", &[1, 3]),
        ]
        .into_iter()
        .collect();
        let test: Signature = vec![
            bracket(&mut pool, "NP", &[1]),
            bracket(&mut pool, "VP", &[1, 3]),
            bracket(&mut pool, "VP", &[1, 3]),
            bracket(&mut pool, "S", &[1, 2, 3]),
        ]
        .into_iter()
        .collect();

        assert_eq!(gold.matches(&test), 2);
        assert_eq!(test.matches(&gold), 2);
        assert_eq!(gold.matches(&Signature::new()), 0);
    }

    #[test]
    fn test_unlabeled_projection() {
        let mut pool = LabelPool::new();
        let gold: Signature = vec![bracket(&mut pool, "NP", &[1, 2]), bracket(&mut pool, "VP", &[3])]
            .into_iter()
            .collect();
        let test: Signature = vec![bracket(&mut pool, "PP", &[1, 2]), bracket(&mut pool, "VP", &[4])]
            .into_iter()
            .collect();

        assert_eq!(gold.matches(&test), 0);
        assert_eq!(gold.unlabeled().matches(&test.unlabeled()), 1);
        assert_eq!(gold.unlabeled().len(), 2);
    }

    #[test]
    fn test_discontinuity() {
        assert!(Bracket::new(None, vec![3, 1]).is_discontinuous());
        assert!(!Bracket::new(None, vec![2, 3, 4]).is_discontinuous());
        assert!(!Bracket::new(None, vec![7]).is_discontinuous());
    }
}
