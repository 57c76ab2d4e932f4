pub mod crispr;

pub use crispr::{
    DEFAULT_MIN_NUMBER_REPEATS, DEFAULT_SEARCH_WINDOW_LENGTH, DnaSequence, InputMode, RepeatArray,
    ScanParams, SearchEngine,
};
