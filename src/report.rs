//! Plain-text report: a fixed-width per-sentence table followed by a
//! summary block

use std::fmt;

use crate::evaluate::Evaluation;
use crate::score::Prf;

const RULE_WIDTH: usize = 96;

/// Renders an [`Evaluation`] through [`fmt::Display`]
pub struct Report<'a> {
    evaluation: &'a Evaluation,
    sentences: bool,
}

impl<'a> Report<'a> {
    pub fn new(evaluation: &'a Evaluation) -> Self {
        Self {
            evaluation,
            sentences: true,
        }
    }

    /// Include or leave out the per-sentence table
    pub fn with_sentences(mut self, sentences: bool) -> Self {
        self.sentences = sentences;
        self
    }

    fn write_table(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            " sent.  len.  prec.   rec.    fb1   uprec.  urec.   ufb1  match umatch  gold  test    tag  ex"
        )?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        for s in self.evaluation.sentences.iter() {
            let l = s.labeled();
            let u = s.unlabeled();
            write!(
                f,
                "{:5} {:5} {:6.2} {:6.2} {:6.2}   {:6.2} {:6.2} {:6.2}  {:5} {:6} {:5} {:5} {:6.2}  {:2}",
                s.number,
                s.length,
                100.0 * l.precision,
                100.0 * l.recall,
                100.0 * l.f1,
                100.0 * u.precision,
                100.0 * u.recall,
                100.0 * u.f1,
                s.matched,
                s.matched_unlabeled,
                s.gold_total,
                s.test_total,
                100.0 * s.tag_accuracy(),
                s.exact as u8,
            )?;
            if s.missing {
                write!(f, "  missing")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(f)
    }
}

fn write_prf(f: &mut fmt::Formatter<'_>, prefix: &str, prf: Prf) -> fmt::Result {
    writeln!(f, "{prefix}P  : {:6.2}", 100.0 * prf.precision)?;
    writeln!(f, "{prefix}R  : {:6.2}", 100.0 * prf.recall)?;
    writeln!(f, "{prefix}F1 : {:6.2}", 100.0 * prf.f1)
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eval = self.evaluation;
        let totals = &eval.totals;

        if self.sentences {
            self.write_table(f)?;
        }

        writeln!(f, "Summary:")?;
        writeln!(f, "=========")?;
        writeln!(f)?;
        writeln!(f, "Sentences evaluated             : {}", totals.sentences)?;
        writeln!(f, "Sentences missing in answer     : {}", totals.missing)?;
        match eval.cutoff_len {
            Some(cutoff) => writeln!(
                f,
                "Sentences longer than {cutoff:<9} : {}",
                totals.skipped
            )?,
            None => writeln!(f, "Sentences skipped by cutoff     : {}", totals.skipped)?,
        }
        writeln!(f)?;
        writeln!(f, "Total edges in key              : {}", totals.gold_total)?;
        writeln!(f, "Total edges in answer           : {}", totals.test_total)?;
        writeln!(f, "Total matching edges (labeled)  : {}", totals.matched)?;
        writeln!(f, "Total matching edges (unlab.)   : {}", totals.matched_unlabeled)?;
        writeln!(f, "Discontinuous edges in key      : {}", totals.gold_discontinuous)?;
        writeln!(f, "Discontinuous edges in answer   : {}", totals.test_discontinuous)?;
        writeln!(f)?;
        write_prf(f, "L", totals.labeled())?;
        write_prf(f, "U", totals.unlabeled())?;
        writeln!(f)?;
        writeln!(f, "POS : {:6.2}", 100.0 * totals.tag_accuracy())?;
        writeln!(f, "EX  : {:6.2}", 100.0 * totals.exact_match())?;
        writeln!(f)?;
        let kind = if eval.labeled { "labeled" } else { "unlabeled" };
        writeln!(f, "F1 ({kind}) : {:6.2}", 100.0 * eval.headline().f1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::evaluate;
    use crate::export::{ExportReader, read_corpus};
    use crate::params::EvalParams;

    const GOLD: &str = "#BOS 1
Peter    NE     --  SB  500
schläft  VVFIN  --  HD  500
#500     S      --  --  0
#EOS 1
#BOS 2
Ja       PTKANT --  --  500
#500     S      --  --  0
#EOS 2
";

    fn evaluation(test: &str, params: &EvalParams) -> Evaluation {
        let gold = read_corpus(ExportReader::from_string(GOLD)).unwrap();
        let test = read_corpus(ExportReader::from_string(test)).unwrap();
        evaluate(&gold, &test, params).unwrap()
    }

    #[test]
    fn test_full_report() {
        let test = "#BOS 1
Peter    NE     --  SB  500
schläft  VVFIN  --  HD  500
#500     S      --  --  0
#EOS 1
";
        let eval = evaluation(test, &EvalParams::default());
        let text = Report::new(&eval).to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with(" sent.  len."));
        assert_eq!(lines[1], "=".repeat(RULE_WIDTH));
        assert!(lines[2].starts_with("    1     2 100.00 100.00 100.00"));
        assert!(!lines[2].ends_with("missing"));
        assert!(lines[3].starts_with("    2     1   0.00   0.00   0.00"));
        assert!(lines[3].ends_with("  missing"));

        assert!(text.contains("Sentences evaluated             : 2\n"));
        assert!(text.contains("Sentences missing in answer     : 1\n"));
        assert!(text.contains("Total edges in key              : 4\n"));
        assert!(text.contains("Total matching edges (labeled)  : 2\n"));
        assert!(text.contains("LP  : 100.00\n"));
        assert!(text.contains("LR  :  50.00\n"));
        assert!(text.contains("EX  :  50.00\n"));
        assert!(text.ends_with("F1 (labeled) :  66.67\n"));
    }

    #[test]
    fn test_summary_only() {
        let params = EvalParams::default().with_labeled(false).with_cutoff_len(40);
        let eval = evaluation(GOLD, &params);
        let text = Report::new(&eval).with_sentences(false).to_string();

        assert!(text.starts_with("Summary:\n"));
        assert!(text.contains("Sentences longer than 40        : 0\n"));
        assert!(text.contains("UF1 : 100.00\n"));
        assert!(text.ends_with("F1 (unlabeled) : 100.00\n"));
    }
}
