use std::io;
use std::path::Path;

use log::info;

use super::loaders::for_each_record;
use super::{DnaSequence, RepeatArray, ScanParams, SearchEngine};

/// Scans every record of a FASTA file with the default parameters, one record
/// in memory at a time.
pub fn process_fasta_stream<F>(path: &Path, on_record: F) -> io::Result<usize>
where
    F: FnMut(&DnaSequence, &[RepeatArray<'_>]) -> io::Result<()>,
{
    process_fasta_stream_with_params(path, ScanParams::default(), on_record)
}

pub fn process_fasta_stream_with_params<F>(
    path: &Path,
    params: ScanParams,
    mut on_record: F,
) -> io::Result<usize>
where
    F: FnMut(&DnaSequence, &[RepeatArray<'_>]) -> io::Result<()>,
{
    for_each_record(path, |sequence| {
        let arrays = scan_record(&sequence, params);
        on_record(&sequence, &arrays)
    })
}

/// Scans one record and logs its summary. Both input modes go through here.
pub fn scan_record(sequence: &DnaSequence, params: ScanParams) -> Vec<RepeatArray<'_>> {
    let arrays = SearchEngine::new(sequence, params).find_crispr_arrays();
    info!(
        "{}: {} bp scanned, {} CRISPR arrays",
        sequence.name(),
        sequence.len(),
        arrays.len()
    );
    arrays
}
