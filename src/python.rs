//! Python bindings for discoeval
//!
//! This module provides PyO3-based Python bindings for the Rust core.

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::PathBuf;

use crate::bytes::Encoding;
use crate::error::{EvalError, UnknownEncoding};
use crate::evaluate::{Evaluation, evaluate_files};
use crate::params::EvalParams;

/// Convert EvalError to Python exception
impl From<EvalError> for PyErr {
    fn from(err: EvalError) -> PyErr {
        match err {
            EvalError::Io { .. } => PyIOError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

fn metrics<'py>(py: Python<'py>, eval: &Evaluation) -> PyResult<Bound<'py, PyDict>> {
    let totals = &eval.totals;
    let labeled = totals.labeled();
    let unlabeled = totals.unlabeled();

    let dict = PyDict::new(py);
    dict.set_item("sentences", totals.sentences)?;
    dict.set_item("missing", totals.missing)?;
    dict.set_item("skipped", totals.skipped)?;
    dict.set_item("gold_edges", totals.gold_total)?;
    dict.set_item("test_edges", totals.test_total)?;
    dict.set_item("matched", totals.matched)?;
    dict.set_item("matched_unlabeled", totals.matched_unlabeled)?;
    dict.set_item("lp", labeled.precision)?;
    dict.set_item("lr", labeled.recall)?;
    dict.set_item("lf1", labeled.f1)?;
    dict.set_item("up", unlabeled.precision)?;
    dict.set_item("ur", unlabeled.recall)?;
    dict.set_item("uf1", unlabeled.f1)?;
    dict.set_item("f1", eval.headline().f1)?;
    dict.set_item("pos_accuracy", totals.tag_accuracy())?;
    dict.set_item("exact_match", totals.exact_match())?;
    Ok(dict)
}

/// Score a test treebank against a gold treebank. Ratios are fractions
/// between 0 and 1.
#[pyfunction]
#[pyo3(signature = (gold, test, param=None, labeled=None, cutoff=None, encoding="utf8"))]
fn evaluate<'py>(
    py: Python<'py>,
    gold: PathBuf,
    test: PathBuf,
    param: Option<PathBuf>,
    labeled: Option<bool>,
    cutoff: Option<usize>,
    encoding: &str,
) -> PyResult<Bound<'py, PyDict>> {
    let encoding: Encoding = encoding
        .parse()
        .map_err(|e: UnknownEncoding| PyValueError::new_err(e.to_string()))?;

    let mut params = match param {
        Some(path) => EvalParams::from_file(&path)?,
        None => EvalParams::default(),
    };
    if let Some(labeled) = labeled {
        params = params.with_labeled(labeled);
    }
    if let Some(cutoff) = cutoff {
        params = params.with_cutoff_len(cutoff);
    }

    let eval = py.detach(|| evaluate_files(&gold, &test, &params, encoding, None))?;
    metrics(py, &eval)
}

#[pyfunction]
fn __version__() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[pymodule]
fn discoeval(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(evaluate, m)?)?;
    m.add_function(wrap_pyfunction!(__version__, m)?)?;
    Ok(())
}
