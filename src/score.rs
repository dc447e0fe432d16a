//! Per-sentence and aggregate scores
//!
//! All ratios are fractions in `[0, 1]` and fall back to `0.0` whenever
//! their denominator is zero.

use tracing::warn;

use crate::export::SentenceNumber;
use crate::signature::{Filters, Signature};
use crate::tree::Tree;

#[inline]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

#[inline]
fn harmonic_mean(p: f64, r: f64) -> f64 {
    if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
}

/// Precision, recall and F1 of one matched count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prf {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Prf {
    pub fn new(matched: usize, gold: usize, test: usize) -> Self {
        let precision = ratio(matched, test);
        let recall = ratio(matched, gold);
        Self {
            precision,
            recall,
            f1: harmonic_mean(precision, recall),
        }
    }
}

/// Counts for one gold sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceScore {
    pub number: SentenceNumber,
    /// Gold length after length deletion
    pub length: usize,
    /// Matches between the signatures as built (labels included when
    /// scoring labeled)
    pub matched: usize,
    /// Matches ignoring labels
    pub matched_unlabeled: usize,
    pub gold_total: usize,
    pub test_total: usize,
    pub gold_discontinuous: usize,
    pub test_discontinuous: usize,
    pub tags_matched: usize,
    pub tags_total: usize,
    pub exact: bool,
    /// No test sentence with this number
    pub missing: bool,
}

impl SentenceScore {
    /// Score a gold tree against its test counterpart, or against an empty
    /// signature when the test file lacks the sentence
    pub fn new(gold: &Tree, test: Option<&Tree>, filters: &Filters) -> Self {
        let gold_sig = Signature::from_tree(gold, filters);
        let test_sig = test
            .map(|tree| Signature::from_tree(tree, filters))
            .unwrap_or_default();

        let (tags_matched, tags_total) = match test {
            Some(test) => tag_matches(gold, test, filters),
            None => (0, filters.length(gold)),
        };

        Self {
            number: gold.number,
            length: filters.length(gold),
            matched: gold_sig.matches(&test_sig),
            matched_unlabeled: gold_sig.unlabeled().matches(&test_sig.unlabeled()),
            gold_total: gold_sig.len(),
            test_total: test_sig.len(),
            gold_discontinuous: gold_sig.discontinuous(),
            test_discontinuous: test_sig.discontinuous(),
            tags_matched,
            tags_total,
            exact: gold_sig == test_sig,
            missing: test.is_none(),
        }
    }

    pub fn labeled(&self) -> Prf {
        Prf::new(self.matched, self.gold_total, self.test_total)
    }

    pub fn unlabeled(&self) -> Prf {
        Prf::new(self.matched_unlabeled, self.gold_total, self.test_total)
    }

    pub fn tag_accuracy(&self) -> f64 {
        ratio(self.tags_matched, self.tags_total)
    }
}

/// Count terminal positions whose tags agree. A gold terminal counts
/// unless its tag is length-deleted; a test terminal only matches when its
/// tag is not label-deleted.
fn tag_matches(gold: &Tree, test: &Tree, filters: &Filters) -> (usize, usize) {
    if gold.len() != test.len() {
        warn!(
            sentence = gold.number,
            gold = gold.len(),
            test = test.len(),
            "test sentence has a different number of terminals"
        );
    }
    if let Some((g, _)) = gold
        .terminals
        .iter()
        .zip(test.terminals.iter())
        .find(|(g, t)| g.word != t.word)
    {
        warn!(sentence = gold.number, position = g.position, "words differ between gold and test");
    }

    let mut matched = 0;
    let mut total = 0;
    for g in gold.terminals.iter().filter(|t| filters.counts_for_length(t)) {
        total += 1;
        let Some(t) = test.terminal(g.position) else {
            continue;
        };
        if !filters.labels.contains(&t.tag) && t.tag == g.tag {
            matched += 1;
        }
    }
    (matched, total)
}

/// Sums over all scored sentences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals {
    /// Sentences scored
    pub sentences: usize,
    pub missing: usize,
    /// Sentences left out by the length cutoff
    pub skipped: usize,
    pub exact: usize,
    pub matched: usize,
    pub matched_unlabeled: usize,
    pub gold_total: usize,
    pub test_total: usize,
    pub gold_discontinuous: usize,
    pub test_discontinuous: usize,
    pub tags_matched: usize,
    pub tags_total: usize,
}

impl Totals {
    pub fn add(&mut self, score: &SentenceScore) {
        self.sentences += 1;
        self.missing += score.missing as usize;
        self.exact += score.exact as usize;
        self.matched += score.matched;
        self.matched_unlabeled += score.matched_unlabeled;
        self.gold_total += score.gold_total;
        self.test_total += score.test_total;
        self.gold_discontinuous += score.gold_discontinuous;
        self.test_discontinuous += score.test_discontinuous;
        self.tags_matched += score.tags_matched;
        self.tags_total += score.tags_total;
    }

    pub fn labeled(&self) -> Prf {
        Prf::new(self.matched, self.gold_total, self.test_total)
    }

    pub fn unlabeled(&self) -> Prf {
        Prf::new(self.matched_unlabeled, self.gold_total, self.test_total)
    }

    pub fn tag_accuracy(&self) -> f64 {
        ratio(self.tags_matched, self.tags_total)
    }

    pub fn exact_match(&self) -> f64 {
        ratio(self.exact, self.sentences)
    }
}

impl<'a> Extend<&'a SentenceScore> for Totals {
    fn extend<I: IntoIterator<Item = &'a SentenceScore>>(&mut self, iter: I) {
        for score in iter {
            self.add(score);
        }
    }
}
