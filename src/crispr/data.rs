use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Mmap,
    Stream,
}

/// Immutable, uppercased nucleotide buffer together with the FASTA header it
/// was read from.
#[derive(Clone, Debug)]
pub struct DnaSequence {
    pub(crate) header: String,
    pub(crate) bases: Arc<Vec<u8>>,
}

impl DnaSequence {
    pub fn new(header: impl Into<String>, mut bases: Vec<u8>) -> Self {
        bases.make_ascii_uppercase();
        Self {
            header: header.into(),
            bases: Arc::new(bases),
        }
    }

    pub fn from_text(header: impl Into<String>, sequence: &str) -> Self {
        Self::new(header, sequence.as_bytes().to_vec())
    }

    /// Full header line, without the leading `>`.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// First whitespace-delimited token of the header.
    pub fn name(&self) -> &str {
        self.header.split_whitespace().next().unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    /// Panics when `index >= len()`.
    #[inline]
    pub fn nucleotide_at(&self, index: usize) -> u8 {
        self.bases[index]
    }

    /// Panics unless `begin <= end <= len()`.
    #[inline]
    pub fn sub_sequence(&self, begin: usize, end: usize) -> &[u8] {
        &self.bases[begin..end]
    }
}

pub const DEFAULT_MIN_NUMBER_REPEATS: usize = 3;
pub const DEFAULT_MIN_REPEAT_LENGTH: usize = 19;
pub const DEFAULT_MAX_REPEAT_LENGTH: usize = 38;
pub const DEFAULT_SEARCH_WINDOW_LENGTH: usize = 8;
pub const DEFAULT_MIN_SPACER_LENGTH: usize = 19;
pub const DEFAULT_MAX_SPACER_LENGTH: usize = 48;
pub const DEFAULT_SPACER_TO_SPACER_MAX_SIMILARITY: f64 = 0.62;
pub const DEFAULT_SPACER_TO_SPACER_LENGTH_DIFF: usize = 12;
pub const DEFAULT_SPACER_TO_REPEAT_LENGTH_DIFF: usize = 30;

/// Read-only configuration of a scan. The engine trusts these values; call
/// [`ScanParams::validate`] first when they come from user input.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    pub min_number_repeats: usize,
    pub min_repeat_length: usize,
    pub max_repeat_length: usize,
    pub search_window_length: usize,
    pub min_spacer_length: usize,
    pub max_spacer_length: usize,
    pub spacer_to_spacer_max_similarity: f64,
    pub spacer_to_spacer_length_diff: usize,
    pub spacer_to_repeat_length_diff: usize,
}

impl ScanParams {
    pub const fn new(
        min_number_repeats: usize,
        min_repeat_length: usize,
        max_repeat_length: usize,
        search_window_length: usize,
        min_spacer_length: usize,
        max_spacer_length: usize,
    ) -> Self {
        Self {
            min_number_repeats,
            min_repeat_length,
            max_repeat_length,
            search_window_length,
            min_spacer_length,
            max_spacer_length,
            spacer_to_spacer_max_similarity: DEFAULT_SPACER_TO_SPACER_MAX_SIMILARITY,
            spacer_to_spacer_length_diff: DEFAULT_SPACER_TO_SPACER_LENGTH_DIFF,
            spacer_to_repeat_length_diff: DEFAULT_SPACER_TO_REPEAT_LENGTH_DIFF,
        }
    }

    /// Cursor stride between seeds when nothing was emitted.
    pub fn skip(&self) -> usize {
        let overlap = (2 * self.search_window_length).saturating_sub(1);
        self.min_repeat_length.saturating_sub(overlap).max(1)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.search_window_length == 0 {
            return Err(ParamsError::ZeroSearchWindow);
        }
        if self.min_number_repeats < 2 {
            return Err(ParamsError::TooFewRepeats(self.min_number_repeats));
        }
        if self.min_repeat_length > self.max_repeat_length {
            return Err(ParamsError::RepeatRange {
                min: self.min_repeat_length,
                max: self.max_repeat_length,
            });
        }
        if self.min_spacer_length > self.max_spacer_length {
            return Err(ParamsError::SpacerRange {
                min: self.min_spacer_length,
                max: self.max_spacer_length,
            });
        }
        if self.search_window_length > self.min_repeat_length {
            return Err(ParamsError::WindowExceedsRepeat {
                window: self.search_window_length,
                min_repeat: self.min_repeat_length,
            });
        }
        if !(0.0..=1.0).contains(&self.spacer_to_spacer_max_similarity) {
            return Err(ParamsError::Similarity(self.spacer_to_spacer_max_similarity));
        }
        Ok(())
    }
}

impl Default for ScanParams {
    fn default() -> Self {
        ScanParams::new(
            DEFAULT_MIN_NUMBER_REPEATS,
            DEFAULT_MIN_REPEAT_LENGTH,
            DEFAULT_MAX_REPEAT_LENGTH,
            DEFAULT_SEARCH_WINDOW_LENGTH,
            DEFAULT_MIN_SPACER_LENGTH,
            DEFAULT_MAX_SPACER_LENGTH,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamsError {
    ZeroSearchWindow,
    TooFewRepeats(usize),
    RepeatRange { min: usize, max: usize },
    SpacerRange { min: usize, max: usize },
    WindowExceedsRepeat { window: usize, min_repeat: usize },
    Similarity(f64),
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamsError::ZeroSearchWindow => write!(f, "search window length must be > 0"),
            ParamsError::TooFewRepeats(n) => {
                write!(f, "minimum number of repeats must be >= 2 (got {n})")
            }
            ParamsError::RepeatRange { min, max } => {
                write!(f, "minimum repeat length {min} exceeds maximum {max}")
            }
            ParamsError::SpacerRange { min, max } => {
                write!(f, "minimum spacer length {min} exceeds maximum {max}")
            }
            ParamsError::WindowExceedsRepeat { window, min_repeat } => write!(
                f,
                "search window length {window} exceeds minimum repeat length {min_repeat}"
            ),
            ParamsError::Similarity(value) => {
                write!(f, "spacer similarity {value} must lie in [0, 1]")
            }
        }
    }
}

impl std::error::Error for ParamsError {}

#[inline(always)]
pub(crate) fn base_index(byte: u8) -> Option<usize> {
    match byte {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}
