//! EVALB-style parameter files
//!
//! Parses `KEY value` parameter files into an immutable [`EvalParams`]
//! using a pest grammar. Recognised keys:
//!
//! | key                       | values        | repeatable |
//! |---------------------------|---------------|------------|
//! | `LABELED`                 | `0` / `1`     | no         |
//! | `CUTOFF_LEN`              | integer       | no         |
//! | `DELETE_LABEL`            | label         | yes        |
//! | `DELETE_LABEL_FOR_LENGTH` | label         | yes        |
//! | `DELETE_WORD`             | word          | yes        |
//! | `EQ_LABEL`, `EQ_WORD`     | two values    | yes        |
//! | `DEBUG`, `MAX_ERROR`      | integer       | no         |
//! | `DISC_ONLY`, `TED`, `DEP` | `0` / `1`     | no         |
//!
//! The equivalence pairs and the last five keys are accepted and stored but
//! do not influence scoring.

use pest::Parser;
use pest_derive::Parser;
use rustc_hash::FxHashSet;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigErrorKind, EvalError, Result};

#[derive(Parser)]
#[grammar = "params.pest"]
struct ParamParser;

/// Label given to the synthetic root node
pub const DEFAULT_ROOT_LABEL: &str = "VROOT";

/// Evaluation parameters, fixed for the whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalParams {
    /// Compare labels as well as spans
    pub labeled: bool,
    /// Skip sentences whose gold length exceeds this
    pub cutoff_len: Option<usize>,
    /// Labels (and tags) removed when building signatures
    pub delete_labels: FxHashSet<String>,
    /// Tags whose terminals do not count toward sentence length or tagging
    pub delete_labels_for_length: FxHashSet<String>,
    /// Words removed when building signatures
    pub delete_words: FxHashSet<String>,
    pub equivalent_labels: FxHashSet<(String, String)>,
    pub equivalent_words: FxHashSet<(String, String)>,
    pub root_label: String,
    pub debug: u32,
    pub max_error: u32,
    pub disc_only: bool,
    pub ted: bool,
    pub dep: bool,
}

impl Default for EvalParams {
    fn default() -> Self {
        Self {
            labeled: true,
            cutoff_len: None,
            delete_labels: FxHashSet::default(),
            delete_labels_for_length: FxHashSet::default(),
            delete_words: FxHashSet::default(),
            equivalent_labels: FxHashSet::default(),
            equivalent_words: FxHashSet::default(),
            root_label: DEFAULT_ROOT_LABEL.to_string(),
            debug: 0,
            max_error: 0,
            disc_only: false,
            ted: false,
            dep: false,
        }
    }
}

impl EvalParams {
    /// Read a parameter file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| EvalError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(text.parse()?)
    }

    pub fn with_labeled(mut self, labeled: bool) -> Self {
        self.labeled = labeled;
        self
    }

    pub fn with_cutoff_len(mut self, cutoff_len: usize) -> Self {
        self.cutoff_len = Some(cutoff_len);
        self
    }

    /// Does a sentence of this (gold) length fall under the cutoff?
    pub fn within_cutoff(&self, length: usize) -> bool {
        self.cutoff_len.is_none_or(|cutoff| length <= cutoff)
    }
}

/// Keys that may appear once
const SINGLE_VALUED: [&str; 7] = [
    "LABELED",
    "CUTOFF_LEN",
    "DEBUG",
    "MAX_ERROR",
    "DISC_ONLY",
    "TED",
    "DEP",
];

impl FromStr for EvalParams {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut pairs = ParamParser::parse(Rule::file, input).map_err(|e| {
            let line_num = match e.line_col {
                pest::error::LineColLocation::Pos((line, _)) => line,
                pest::error::LineColLocation::Span((line, _), _) => line,
            };
            ConfigError {
                line_num,
                kind: ConfigErrorKind::Syntax(e.variant.message().into_owned()),
            }
        })?;

        let mut params = EvalParams::default();
        let mut seen: FxHashSet<&str> = FxHashSet::default();

        let Some(file) = pairs.next() else {
            return Ok(params);
        };
        for assignment in file.into_inner() {
            if assignment.as_rule() != Rule::assignment {
                continue;
            }
            let line_num = assignment.line_col().0;
            let mut inner = assignment.into_inner();
            let Some(key) = inner.next().map(|p| p.as_str()) else {
                continue;
            };
            let values: Vec<&str> = inner.map(|p| p.as_str()).collect();

            let error = |kind| ConfigError { line_num, kind };
            if SINGLE_VALUED.contains(&key) && !seen.insert(key) {
                return Err(error(ConfigErrorKind::DuplicateKey(key.to_string())));
            }
            apply(&mut params, key, &values).map_err(error)?;
        }

        Ok(params)
    }
}

/// Apply one `KEY values...` assignment
fn apply(params: &mut EvalParams, key: &str, values: &[&str]) -> Result<(), ConfigErrorKind> {
    match key {
        "LABELED" => params.labeled = flag(key, single(key, values)?)?,
        "CUTOFF_LEN" => params.cutoff_len = Some(number(key, single(key, values)?)?),
        "DELETE_LABEL" => {
            params.delete_labels.insert(single(key, values)?.to_string());
        }
        "DELETE_LABEL_FOR_LENGTH" => {
            params
                .delete_labels_for_length
                .insert(single(key, values)?.to_string());
        }
        "DELETE_WORD" => {
            params.delete_words.insert(single(key, values)?.to_string());
        }
        "EQ_LABEL" => {
            let (a, b) = pair(key, values)?;
            params.equivalent_labels.insert((a, b));
        }
        "EQ_WORD" => {
            let (a, b) = pair(key, values)?;
            params.equivalent_words.insert((a, b));
        }
        "DEBUG" => params.debug = number(key, single(key, values)?)?,
        "MAX_ERROR" => params.max_error = number(key, single(key, values)?)?,
        "DISC_ONLY" => params.disc_only = flag(key, single(key, values)?)?,
        "TED" => params.ted = flag(key, single(key, values)?)?,
        "DEP" => params.dep = flag(key, single(key, values)?)?,
        _ => return Err(ConfigErrorKind::UnknownKey(key.to_string())),
    }
    Ok(())
}

fn arity(key: &str, values: &[&str], expected: usize) -> Result<(), ConfigErrorKind> {
    if values.len() != expected {
        return Err(ConfigErrorKind::WrongArity {
            key: key.to_string(),
            expected,
            found: values.len(),
        });
    }
    Ok(())
}

fn single<'a>(key: &str, values: &[&'a str]) -> Result<&'a str, ConfigErrorKind> {
    arity(key, values, 1)?;
    Ok(values[0])
}

fn pair(key: &str, values: &[&str]) -> Result<(String, String), ConfigErrorKind> {
    arity(key, values, 2)?;
    Ok((values[0].to_string(), values[1].to_string()))
}

fn invalid(key: &str, value: &str) -> ConfigErrorKind {
    ConfigErrorKind::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn flag(key: &str, value: &str) -> Result<bool, ConfigErrorKind> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(invalid(key, value)),
    }
}

fn number<N: FromStr>(key: &str, value: &str) -> Result<N, ConfigErrorKind> {
    value.parse().map_err(|_| invalid(key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEGRA_PARAMS: &str = "\
# parameters for discontinuous NeGra evaluation
LABELED 1
CUTOFF_LEN 40

DELETE_LABEL VROOT
DELETE_LABEL $(
DELETE_LABEL $,
DELETE_LABEL $.
DELETE_LABEL_FOR_LENGTH $(
DELETE_WORD ,
EQ_LABEL ADVP PRT
DEBUG 0
MAX_ERROR 10
";

    #[test]
    fn test_defaults() {
        let params = EvalParams::default();
        assert!(params.labeled);
        assert_eq!(params.cutoff_len, None);
        assert_eq!(params.root_label, "VROOT");
        assert!(params.within_cutoff(usize::MAX));
    }

    #[test]
    fn test_parse_negra_params() {
        let params: EvalParams = NEGRA_PARAMS.parse().unwrap();

        assert!(params.labeled);
        assert_eq!(params.cutoff_len, Some(40));
        assert_eq!(params.delete_labels.len(), 4);
        assert!(params.delete_labels.contains("$("));
        assert!(params.delete_labels.contains("VROOT"));
        assert!(params.delete_labels_for_length.contains("$("));
        assert!(params.delete_words.contains(","));
        assert!(
            params
                .equivalent_labels
                .contains(&("ADVP".to_string(), "PRT".to_string()))
        );
        assert_eq!(params.max_error, 10);
        assert!(params.within_cutoff(40));
        assert!(!params.within_cutoff(41));
    }

    #[test]
    fn test_empty_and_comment_only() {
        assert_eq!("".parse::<EvalParams>().unwrap(), EvalParams::default());
        assert_eq!(
            "# nothing\n\n   \n# here\n".parse::<EvalParams>().unwrap(),
            EvalParams::default()
        );
    }

    #[test]
    fn test_crlf_and_trailing_whitespace() {
        let params: EvalParams = "LABELED 0  \r\nCUTOFF_LEN\t25\r\n".parse().unwrap();
        assert!(!params.labeled);
        assert_eq!(params.cutoff_len, Some(25));
    }

    #[test]
    fn test_duplicate_single_valued_key() {
        let err = "LABELED 1\nCUTOFF_LEN 10\nLABELED 0\n"
            .parse::<EvalParams>()
            .unwrap_err();
        assert_eq!(err.line_num, 3);
        assert_eq!(err.kind, ConfigErrorKind::DuplicateKey("LABELED".to_string()));
    }

    #[test]
    fn test_repeatable_keys_accumulate() {
        let params: EvalParams = "DELETE_WORD a\nDELETE_WORD b\nDELETE_WORD a\n".parse().unwrap();
        assert_eq!(params.delete_words.len(), 2);
    }

    #[test]
    fn test_unknown_key() {
        let err = "COLOR blue\n".parse::<EvalParams>().unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::UnknownKey("COLOR".to_string()));
    }

    #[test]
    fn test_malformed_equivalence_pair() {
        let err = "EQ_LABEL ADVP\n".parse::<EvalParams>().unwrap_err();
        assert_eq!(
            err.kind,
            ConfigErrorKind::WrongArity {
                key: "EQ_LABEL".to_string(),
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = "LABELED yes\n".parse::<EvalParams>().unwrap_err();
        assert!(matches!(err.kind, ConfigErrorKind::InvalidValue { .. }));

        let err = "CUTOFF_LEN -3\n".parse::<EvalParams>().unwrap_err();
        assert!(matches!(err.kind, ConfigErrorKind::InvalidValue { .. }));

        let err = "DELETE_LABEL\n".parse::<EvalParams>().unwrap_err();
        assert!(matches!(err.kind, ConfigErrorKind::WrongArity { found: 0, .. }));
    }

    #[test]
    fn test_syntax_error() {
        let err = "LABELED=1\n".parse::<EvalParams>().unwrap_err();
        assert_eq!(err.line_num, 1);
        assert!(matches!(err.kind, ConfigErrorKind::Syntax(_)));
    }

    #[test]
    fn test_inert_keys_are_stored() {
        let params: EvalParams = "DISC_ONLY 1\nTED 1\nDEP 0\n".parse().unwrap();
        assert!(params.disc_only);
        assert!(params.ted);
        assert!(!params.dep);
    }

    #[test]
    fn test_overrides() {
        let params = EvalParams::default().with_labeled(false).with_cutoff_len(5);
        assert!(!params.labeled);
        assert!(params.within_cutoff(5));
        assert!(!params.within_cutoff(6));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("discoeval-{}.prm", std::process::id()));
        std::fs::write(&path, NEGRA_PARAMS).unwrap();
        let params = EvalParams::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(params.cutoff_len, Some(40));
    }
}
