use atoi::FromRadix10Checked;
use bstr::ByteSlice;
use lasso::{Rodeo, Spur};
use memchr::memmem;
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownEncoding;

pub const STRING_POOL_CAPACITY: usize = 5000;

/// Marker that truncates an export-format line
pub const COMMENT_MARKER: &[u8] = b"%%";

/// Interned label, tag or word
pub type Sym = Spur;

/// String pool shared by the gold and test side of one run, so that
/// labels compare as integers.
#[derive(Debug)]
pub struct LabelPool(Rodeo);

impl Default for LabelPool {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelPool {
    pub fn new() -> Self {
        Self(Rodeo::with_capacity(lasso::Capacity::for_strings(
            STRING_POOL_CAPACITY,
        )))
    }

    #[inline]
    pub fn get_or_intern(&mut self, s: &str) -> Sym {
        self.0.get_or_intern(s)
    }

    /// Look up a string without interning it
    #[inline]
    pub fn get(&self, s: &str) -> Option<Sym> {
        self.0.get(s)
    }

    #[inline]
    pub fn resolve(&self, sym: Sym) -> &str {
        self.0.resolve(&sym)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Character encoding of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// ISO-8859-1, as used by the original Negra releases
    Latin1,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Latin1 => "ISO-8859-1",
        }
    }

    /// Decode one field. Latin-1 maps every byte to the code point of the
    /// same value and cannot fail.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => bytes.to_str().ok().map(str::to_string),
            Encoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Ok(Encoding::Latin1),
            _ => Err(UnknownEncoding(s.to_string())),
        }
    }
}

/// Cut a line at the first comment marker
#[inline]
pub fn bs_strip_comment(line: &[u8]) -> &[u8] {
    match memmem::find(line, COMMENT_MARKER) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Whitespace-separated fields of a line
#[inline]
pub fn bs_fields(line: &[u8]) -> Vec<&[u8]> {
    line.fields_with(|c| c.is_ascii_whitespace()).collect()
}

/// Parse an unsigned decimal that must span the whole field
#[inline]
pub fn bs_atoi<N: FromRadix10Checked>(bytes: &[u8]) -> Option<N> {
    if bytes.is_empty() {
        return None;
    }
    match N::from_radix_10_checked(bytes) {
        (Some(n), used) if used == bytes.len() => Some(n),
        _ => None,
    }
}
