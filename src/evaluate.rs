//! Evaluation runs
//!
//! Scores every gold sentence, in sentence-number order, against the test
//! sentence with the same number.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::bytes::{Encoding, LabelPool};
use crate::error::{InputMismatchError, Result};
use crate::export::{Corpus, ExportFormat, read_export_file};
use crate::params::EvalParams;
use crate::score::{Prf, SentenceScore, Totals};
use crate::signature::Filters;
use crate::tree::Tree;

/// Result of one evaluation run
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Whether the headline figures are the labeled ones
    pub labeled: bool,
    pub cutoff_len: Option<usize>,
    /// Scored sentences in sentence-number order
    pub sentences: Vec<SentenceScore>,
    pub totals: Totals,
}

impl Evaluation {
    /// Labeled or unlabeled figures, whichever the run was configured for
    pub fn headline(&self) -> Prf {
        if self.labeled {
            self.totals.labeled()
        } else {
            self.totals.unlabeled()
        }
    }
}

/// Score a test corpus against a gold corpus
pub fn evaluate(gold: &Corpus, test: &Corpus, params: &EvalParams) -> Result<Evaluation> {
    if test.len() > gold.len() {
        return Err(InputMismatchError::TooManyTestSentences {
            gold: gold.len(),
            test: test.len(),
        }
        .into());
    }

    let mut pool = LabelPool::new();
    let filters = Filters::new(params, &mut pool);
    let mut sentences = Vec::with_capacity(gold.len());
    let mut totals = Totals::default();

    for (&number, gold_sentence) in gold.iter() {
        let gold_tree = Tree::from_sentence(gold_sentence, &params.root_label, &mut pool)?;
        let test_tree = test
            .get(&number)
            .map(|s| Tree::from_sentence(s, &params.root_label, &mut pool))
            .transpose()?;

        let length = filters.length(&gold_tree);
        if !params.within_cutoff(length) {
            debug!(sentence = number, length, "skipping sentence over cutoff");
            totals.skipped += 1;
            continue;
        }

        let score = SentenceScore::new(&gold_tree, test_tree.as_ref(), &filters);
        debug!(
            sentence = number,
            matched = score.matched,
            gold = score.gold_total,
            test = score.test_total,
            missing = score.missing,
            "scored sentence"
        );
        totals.add(&score);
        sentences.push(score);
    }

    let unscored = test.keys().filter(|n| !gold.contains_key(n)).count();
    if unscored > 0 {
        warn!(sentences = unscored, "test sentences without a gold counterpart are not scored");
    }

    if totals.sentences == 0 {
        return Err(InputMismatchError::EmptyGold.into());
    }

    info!(
        sentences = totals.sentences,
        missing = totals.missing,
        skipped = totals.skipped,
        "evaluation finished"
    );
    Ok(Evaluation {
        labeled: params.labeled,
        cutoff_len: params.cutoff_len,
        sentences,
        totals,
    })
}

/// Read both files with the same encoding and score them
pub fn evaluate_files(
    gold: &Path,
    test: &Path,
    params: &EvalParams,
    encoding: Encoding,
    format: Option<ExportFormat>,
) -> Result<Evaluation> {
    let gold = read_export_file(gold, encoding, format)?;
    let test = read_export_file(test, encoding, format)?;
    evaluate(&gold, &test, params)
}
