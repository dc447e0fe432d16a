//! Error types
//!
//! Every failure aborts the evaluation run: partial metrics would be
//! misleading, so nothing here is recovered locally.

use std::path::PathBuf;
use thiserror::Error;

use crate::export::SentenceNumber;

/// Crate-wide result alias
pub type Result<T, E = EvalError> = std::result::Result<T, E>;

/// Any error that stops an evaluation run
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    InputMismatch(#[from] InputMismatchError),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Malformed line in an export-format file
#[derive(Debug, Error, PartialEq, Eq)]
#[error("format error at line {line_num}: {kind}")]
pub struct FormatError {
    pub line_num: usize,
    pub kind: FormatErrorKind,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatErrorKind {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },

    #[error("node id {0} is outside 500..=999")]
    NodeIdOutOfRange(String),

    #[error("parent {0} is not 0 or in 500..=999")]
    InvalidParent(String),

    #[error("secondary edges come in pairs, found {0} trailing fields")]
    OddSecondaryFields(usize),

    #[error("line is not valid {0}")]
    Encoding(&'static str),

    #[error("invalid sentence number: {0}")]
    InvalidSentenceNumber(String),

    #[error("#BOS inside unclosed sentence {0}")]
    NestedSentence(SentenceNumber),

    #[error("#EOS {eos} does not close #BOS {bos}")]
    MismatchedEnd {
        bos: SentenceNumber,
        eos: SentenceNumber,
    },

    #[error("#EOS {0} without a matching #BOS")]
    UnopenedSentence(SentenceNumber),

    #[error("sentence {0} is not closed before end of input")]
    UnterminatedSentence(SentenceNumber),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Inconsistent parent pointers within one sentence
#[derive(Debug, Error, PartialEq, Eq)]
#[error("structure error in sentence {sentence}: {kind}")]
pub struct StructureError {
    pub sentence: SentenceNumber,
    pub kind: StructureErrorKind,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructureErrorKind {
    #[error("line {line_num} points to undeclared node #{parent}")]
    DanglingParent { line_num: usize, parent: u16 },

    #[error("node #{0} is declared twice")]
    DuplicateNode(u16),

    #[error("node #{0} cannot be reached from the root")]
    Unreachable(u16),

    #[error("more than {0} terminals")]
    TooManyTerminals(usize),
}

/// Problem in an EVALB-style parameter file
#[derive(Debug, Error, PartialEq, Eq)]
#[error("parameter error at line {line_num}: {kind}")]
pub struct ConfigError {
    pub line_num: usize,
    pub kind: ConfigErrorKind,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigErrorKind {
    #[error("{0}")]
    Syntax(String),

    #[error("unknown parameter {0}")]
    UnknownKey(String),

    #[error("{0} may only be given once")]
    DuplicateKey(String),

    #[error("{key} takes {expected} value(s), found {found}")]
    WrongArity {
        key: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

/// Encoding name not recognised
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unsupported encoding: {0}")]
pub struct UnknownEncoding(pub String);

/// Gold and test files cannot be compared
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputMismatchError {
    #[error("no gold sentences left to evaluate")]
    EmptyGold,

    #[error("test has {test} sentences but gold only has {gold}")]
    TooManyTestSentences { gold: usize, test: usize },
}
