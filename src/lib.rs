//! Discoeval: EVALB-style evaluation of discontinuous constituency trees
//!
//! Scores parser output against a gold treebank, both in NeGra export
//! format, by comparing multisets of labeled bracketings. A bracketing is
//! a label with an arbitrary set of terminal positions, so discontinuous
//! constituents are scored like any other.
//! Core implementation in Rust with optional Python bindings.

pub mod bytes; // String interning and byte-level field helpers
pub mod error;
pub mod evaluate; // Evaluation runs over gold and test corpora
pub mod export; // Export-format file parsing
pub mod params; // EVALB-style parameter files
pub mod report;
pub mod score; // Per-sentence and aggregate counts
pub mod signature; // Bracketings and their multisets
pub mod tree; // Tree arena and yield extraction

// Python bindings
#[cfg(feature = "pyo3")]
pub mod python;

// Re-exports for convenience
pub use bytes::{Encoding, LabelPool};
pub use error::{
    ConfigError, EvalError, FormatError, InputMismatchError, StructureError, UnknownEncoding,
};
pub use evaluate::{Evaluation, evaluate, evaluate_files};
pub use export::{Corpus, ExportFormat, ExportReader, Sentence, read_corpus, read_export_file};
pub use params::EvalParams;
pub use report::Report;
pub use score::{Prf, SentenceScore, Totals};
pub use signature::{Bracket, Filters, Signature};
pub use tree::{Position, Tree, Yield};
