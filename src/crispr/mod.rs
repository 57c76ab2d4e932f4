pub mod stream;

mod array;
mod boyer_moore;
mod data;
mod distance;
mod export;
mod loaders;
mod search;
#[cfg(test)]
mod tests;

pub use array::{CONSENSUS_THRESHOLD, MAX_SPACERS_TO_CHECK, Rejection, RepeatArray};
pub use boyer_moore::{BoyerMoore, search};
pub use data::{
    DEFAULT_MAX_REPEAT_LENGTH, DEFAULT_MAX_SPACER_LENGTH, DEFAULT_MIN_NUMBER_REPEATS,
    DEFAULT_MIN_REPEAT_LENGTH, DEFAULT_MIN_SPACER_LENGTH, DEFAULT_SEARCH_WINDOW_LENGTH,
    DEFAULT_SPACER_TO_REPEAT_LENGTH_DIFF, DEFAULT_SPACER_TO_SPACER_LENGTH_DIFF,
    DEFAULT_SPACER_TO_SPACER_MAX_SIMILARITY, DnaSequence, InputMode, ParamsError, ScanParams,
};
pub use distance::{are_similar, levenshtein, similarity};
pub use export::{
    ArrayReport, ExportError, RepeatRecord, SequenceReport, render_csv_results,
    render_json_results, render_text_report, write_csv_records, write_json_reports,
    write_parquet_records, write_parquet_results,
};
pub use loaders::load_sequences_from_path;
pub use search::{CrisprScanner, SCAN_RANGE, SearchEngine};
