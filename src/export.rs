//! Export-format file parsing
//!
//! Reads the line-oriented NeGra export format (Brants 1997) into
//! sentences of fixed-shape records. Each sentence is a block
//!
//! ```text
//! #BOS 12
//! Das     ART   Nom.Sg.Neut  NK  500
//! Haus    NN    Nom.Sg.Neut  NK  500
//! #500    NP    --           --  0
//! #EOS 12
//! ```
//!
//! Terminal lines are `word [lemma] tag morph func parent [seclabel secparent]*`;
//! non-terminal lines have the same shape with a `#5xx` node id in place
//! of the word. Format 4 files carry the lemma column and announce it with
//! a `#FORMAT 4` header line. Anything after `%%` is a comment.

use crate::bytes::{Encoding, bs_atoi, bs_fields, bs_strip_comment};
use crate::error::{EvalError, FormatError, FormatErrorKind, Result};
use flate2::read::MultiGzDecoder;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;
use tracing::{info, warn};

/// Id of a node within a sentence: 0 for the synthetic root, 500..=999
/// for declared non-terminals
pub type NodeId = u16;

/// Sentence numbers join gold and test sentences
pub type SentenceNumber = u32;

pub const ROOT_ID: NodeId = 0;
pub const MIN_NODE_ID: NodeId = 500;
pub const MAX_NODE_ID: NodeId = 999;

/// Is `id` usable as a parent pointer?
#[inline]
pub fn is_valid_parent(id: NodeId) -> bool {
    id == ROOT_ID || (MIN_NODE_ID..=MAX_NODE_ID).contains(&id)
}

/// Export format version, which fixes the column layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    V3,
    V4,
}

/// Column positions of one record line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldLayout {
    lemma: Option<usize>,
    tag: usize,
    morph: usize,
    func: usize,
    parent: usize,
}

impl FieldLayout {
    /// Index of the first secondary-edge field
    fn secondary(&self) -> usize {
        self.parent + 1
    }
}

impl ExportFormat {
    fn layout(self) -> FieldLayout {
        match self {
            ExportFormat::V3 => FieldLayout {
                lemma: None,
                tag: 1,
                morph: 2,
                func: 3,
                parent: 4,
            },
            ExportFormat::V4 => FieldLayout {
                lemma: Some(1),
                tag: 2,
                morph: 3,
                func: 4,
                parent: 5,
            },
        }
    }
}

/// First column of a record line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// A terminal carrying a word form
    Word(String),
    /// A non-terminal node declaration (`#500`)
    Node(NodeId),
}

/// Secondary edge; read and kept, never used for scoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryEdge {
    pub label: String,
    pub parent: String,
}

/// One record line of a sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub head: Head,
    /// Only present in format 4 files
    pub lemma: Option<String>,
    /// Part-of-speech tag for terminals, category label for non-terminals
    pub tag: String,
    pub morph: String,
    pub func: String,
    pub parent: NodeId,
    pub secondary: Vec<SecondaryEdge>,
    pub line_num: usize,
}

impl Record {
    pub fn is_terminal(&self) -> bool {
        matches!(self.head, Head::Word(_))
    }

    pub fn word(&self) -> Option<&str> {
        match &self.head {
            Head::Word(w) => Some(w),
            Head::Node(_) => None,
        }
    }

    pub fn node_id(&self) -> Option<NodeId> {
        match self.head {
            Head::Word(_) => None,
            Head::Node(id) => Some(id),
        }
    }
}

/// Records between a `#BOS n` / `#EOS n` pair, markers stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub number: SentenceNumber,
    pub records: Vec<Record>,
}

impl Sentence {
    pub fn terminals(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.is_terminal())
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| !r.is_terminal())
    }
}

/// Sentences of one file, keyed by sentence number
pub type Corpus = BTreeMap<SentenceNumber, Sentence>;

/// Export-format reader that iterates over sentences
pub struct ExportReader<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    line_num: usize,
    encoding: Encoding,
    format: ExportFormat,
    /// Whether a `#FORMAT` header may switch `format`
    detect_format: bool,
    done: bool,
}

impl ExportReader<BufReader<Box<dyn Read>>> {
    /// Create a reader from a file path; `.gz` files are decompressed
    pub fn from_file(path: &Path, encoding: Encoding) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let inner: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(Self::new(BufReader::new(inner), encoding))
    }
}

impl ExportReader<Cursor<Vec<u8>>> {
    /// Create a reader from an in-memory string
    pub fn from_string(text: &str) -> Self {
        Self::new(Cursor::new(text.as_bytes().to_vec()), Encoding::Utf8)
    }
}

impl<R: BufRead> ExportReader<R> {
    pub fn new(reader: R, encoding: Encoding) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_num: 0,
            encoding,
            format: ExportFormat::default(),
            detect_format: true,
            done: false,
        }
    }

    /// Force a format version, ignoring any `#FORMAT` header
    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self.detect_format = false;
        self
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    fn error(&self, kind: FormatErrorKind) -> FormatError {
        FormatError {
            line_num: self.line_num,
            kind,
        }
    }

    /// Read the next raw line into `self.buf`; false at end of input
    fn next_line(&mut self) -> Result<bool, FormatError> {
        self.buf.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|e| self.error(FormatErrorKind::Io(e.to_string())))?;
        if n == 0 {
            return Ok(false);
        }
        self.line_num += 1;
        Ok(true)
    }

    fn sentence_number(&self, field: Option<&[u8]>) -> Result<SentenceNumber, FormatError> {
        let field = field.unwrap_or_default();
        bs_atoi(field).ok_or_else(|| {
            self.error(FormatErrorKind::InvalidSentenceNumber(
                String::from_utf8_lossy(field).into_owned(),
            ))
        })
    }

    fn read_sentence(&mut self) -> Result<Option<Sentence>, FormatError> {
        // Skip to the next #BOS; header lines and tables are ignored
        let number = loop {
            if !self.next_line()? {
                return Ok(None);
            }
            let line = std::mem::take(&mut self.buf);
            let fields = bs_fields(bs_strip_comment(&line));
            let number = match fields.first().copied() {
                Some(b"#BOS") => Some(self.sentence_number(fields.get(1).copied())?),
                Some(b"#EOS") => {
                    let eos = self.sentence_number(fields.get(1).copied())?;
                    return Err(self.error(FormatErrorKind::UnopenedSentence(eos)));
                }
                Some(b"#FORMAT") if self.detect_format => {
                    if fields.get(1).copied() == Some(&b"4"[..]) {
                        self.format = ExportFormat::V4;
                    } else {
                        self.format = ExportFormat::V3;
                    }
                    None
                }
                _ => None,
            };
            self.buf = line;
            if let Some(number) = number {
                break number;
            }
        };

        let layout = self.format.layout();
        let mut records = Vec::new();
        loop {
            if !self.next_line()? {
                return Err(self.error(FormatErrorKind::UnterminatedSentence(number)));
            }
            let line = std::mem::take(&mut self.buf);
            let fields = bs_fields(bs_strip_comment(&line));
            match fields.first().copied() {
                None => {}
                Some(b"#EOS") => {
                    let eos = self.sentence_number(fields.get(1).copied())?;
                    if eos != number {
                        return Err(self.error(FormatErrorKind::MismatchedEnd { bos: number, eos }));
                    }
                    self.buf = line;
                    return Ok(Some(Sentence { number, records }));
                }
                Some(b"#BOS") => {
                    return Err(self.error(FormatErrorKind::NestedSentence(number)));
                }
                Some(_) => records.push(self.parse_record(&fields, layout)?),
            }
            self.buf = line;
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, FormatError> {
        self.encoding
            .decode(bytes)
            .ok_or_else(|| self.error(FormatErrorKind::Encoding(self.encoding.name())))
    }

    /// Validate and convert one record line
    fn parse_record(&self, fields: &[&[u8]], layout: FieldLayout) -> Result<Record, FormatError> {
        let expected = layout.secondary();
        if fields.len() < expected {
            return Err(self.error(FormatErrorKind::TooFewFields {
                expected,
                found: fields.len(),
            }));
        }

        let head = parse_head(fields[0]).map_err(|kind| self.error(kind))?;
        let head = match head {
            Some(id) => Head::Node(id),
            None => Head::Word(self.decode(fields[0])?),
        };

        let parent_field = fields[layout.parent];
        let parent = bs_atoi::<NodeId>(parent_field)
            .filter(|&p| is_valid_parent(p))
            .ok_or_else(|| {
                self.error(FormatErrorKind::InvalidParent(
                    String::from_utf8_lossy(parent_field).into_owned(),
                ))
            })?;

        let rest = &fields[layout.secondary()..];
        if rest.len() % 2 != 0 {
            return Err(self.error(FormatErrorKind::OddSecondaryFields(rest.len())));
        }
        let secondary = rest
            .chunks_exact(2)
            .map(|pair| -> Result<SecondaryEdge, FormatError> {
                Ok(SecondaryEdge {
                    label: self.decode(pair[0])?,
                    parent: self.decode(pair[1])?,
                })
            })
            .collect::<Result<Vec<_>, FormatError>>()?;

        let lemma = match layout.lemma {
            Some(i) => Some(self.decode(fields[i])?),
            None => None,
        };

        Ok(Record {
            head,
            lemma,
            tag: self.decode(fields[layout.tag])?,
            morph: self.decode(fields[layout.morph])?,
            func: self.decode(fields[layout.func])?,
            parent,
            secondary,
            line_num: self.line_num,
        })
    }
}

/// Parse the first column: `Some(id)` for a `#ddd` node declaration,
/// `None` for an ordinary word
fn parse_head(field: &[u8]) -> Result<Option<NodeId>, FormatErrorKind> {
    let Some(digits) = field.strip_prefix(b"#") else {
        return Ok(None);
    };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        // A word that happens to start with '#'
        return Ok(None);
    }
    let out_of_range = || FormatErrorKind::NodeIdOutOfRange(String::from_utf8_lossy(field).into_owned());
    if digits.len() != 3 {
        return Err(out_of_range());
    }
    match bs_atoi::<NodeId>(digits) {
        Some(id) if is_valid_parent(id) => Ok(Some(id)),
        _ => Err(out_of_range()),
    }
}

impl<R: BufRead> Iterator for ExportReader<R> {
    type Item = Result<Sentence, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_sentence() {
            Ok(Some(sentence)) => Some(Ok(sentence)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Collect all sentences of a reader, indexed by number. A repeated
/// sentence number replaces the earlier sentence.
pub fn read_corpus<R: BufRead>(reader: ExportReader<R>) -> Result<Corpus, FormatError> {
    let mut corpus = Corpus::new();
    for sentence in reader {
        let sentence = sentence?;
        if let Some(old) = corpus.insert(sentence.number, sentence) {
            warn!(sentence = old.number, "duplicate sentence number, keeping the later one");
        }
    }
    Ok(corpus)
}

/// Read an export file (optionally gzipped) into a corpus
pub fn read_export_file(
    path: &Path,
    encoding: Encoding,
    format: Option<ExportFormat>,
) -> Result<Corpus> {
    let reader = ExportReader::from_file(path, encoding).map_err(|source| EvalError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = match format {
        Some(format) => reader.with_format(format),
        None => reader,
    };
    let corpus = read_corpus(reader)?;
    info!(path = %path.display(), sentences = corpus.len(), "read export file");
    Ok(corpus)
}
