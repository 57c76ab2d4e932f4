use std::fs::File;
use std::io;
use std::path::Path;

use memchr::memchr;
use memmap2::MmapOptions;

use crate::crispr::data::{DnaSequence, InputMode};

pub fn load_sequences_from_path(path: &Path, mode: InputMode) -> io::Result<Vec<DnaSequence>> {
    match mode {
        InputMode::Mmap => load_sequences_mmap(path),
        InputMode::Stream => load_sequences_stream(path),
    }
}

fn load_sequences_stream(path: &Path) -> io::Result<Vec<DnaSequence>> {
    let mut sequences = Vec::new();
    for_each_record(path, |sequence| {
        sequences.push(sequence);
        Ok(())
    })?;
    Ok(sequences)
}

/// Streams FASTA/FASTQ records (plain or gzip) one at a time. Records without
/// bases are skipped. Returns the number of records handed to `on_record`.
pub(crate) fn for_each_record<F>(path: &Path, mut on_record: F) -> io::Result<usize>
where
    F: FnMut(DnaSequence) -> io::Result<()>,
{
    if std::fs::metadata(path)?.len() == 0 {
        return Ok(0);
    }
    let mut reader = needletail::parse_fastx_file(path).map_err(io::Error::other)?;
    let mut emitted = 0usize;
    while let Some(record) = reader.next() {
        let record = record.map_err(io::Error::other)?;
        let bases: Vec<u8> = record
            .seq()
            .iter()
            .copied()
            .filter(|byte| !byte.is_ascii_whitespace())
            .collect();
        if bases.is_empty() {
            continue;
        }
        let header = parse_sequence_name(&String::from_utf8_lossy(record.id()), emitted + 1);
        emitted += 1;
        on_record(DnaSequence::new(header, bases))?;
    }
    Ok(emitted)
}

fn load_sequences_mmap(path: &Path) -> io::Result<Vec<DnaSequence>> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }
    let mmap = unsafe { MmapOptions::new().map(&file)? };
    Ok(parse_fasta_bytes(&mmap))
}

pub(crate) fn parse_fasta_bytes(data: &[u8]) -> Vec<DnaSequence> {
    let mut sequences = Vec::new();
    let mut bases = Vec::with_capacity(data.len());
    let mut current_header: Option<String> = None;
    let mut rest = data;
    while !rest.is_empty() {
        let (line, next) = match memchr(b'\n', rest) {
            Some(end) => (&rest[..end], &rest[end + 1..]),
            None => (rest, &rest[rest.len()..]),
        };
        rest = next;
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if let Some(header) = line.strip_prefix(b">") {
            finalize_sequence(&mut current_header, &mut bases, &mut sequences);
            current_header = Some(parse_sequence_name(
                &String::from_utf8_lossy(header),
                sequences.len() + 1,
            ));
            continue;
        }
        bases.extend(line.iter().copied().filter(|byte| !byte.is_ascii_whitespace()));
    }
    finalize_sequence(&mut current_header, &mut bases, &mut sequences);
    sequences
}

fn finalize_sequence(
    current_header: &mut Option<String>,
    bases: &mut Vec<u8>,
    sequences: &mut Vec<DnaSequence>,
) {
    let header = current_header.take();
    if bases.is_empty() {
        return;
    }
    let header = header.unwrap_or_else(|| format!("sequence_{}", sequences.len() + 1));
    sequences.push(DnaSequence::new(header, std::mem::take(bases)));
}

/// Trimmed header text, or a positional fallback for blank headers.
pub(crate) fn parse_sequence_name(header: &str, index: usize) -> String {
    let header = header.trim_start_matches('>').trim();
    if header.is_empty() {
        format!("sequence_{index}")
    } else {
        header.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multi_record_bytes() {
        let seqs = parse_fasta_bytes(b">chr1 desc\r\nacgt\r\nAC\r\n>chr2\nTTTT\n>empty\n");
        assert_eq!(seqs.len(), 2);
        assert_eq!(seqs[0].header(), "chr1 desc");
        assert_eq!(seqs[0].name(), "chr1");
        assert_eq!(seqs[0].bases(), b"ACGTAC");
        assert_eq!(seqs[1].bases(), b"TTTT");
    }

    #[test]
    fn headerless_input_gets_fallback_name() {
        let seqs = parse_fasta_bytes(b"ACGT\nACGT");
        assert_eq!(seqs.len(), 1);
        assert_eq!(seqs[0].header(), "sequence_1");
        assert_eq!(seqs[0].len(), 8);
    }

    #[test]
    fn blank_header_falls_back() {
        assert_eq!(parse_sequence_name(">  ", 3), "sequence_3");
        assert_eq!(parse_sequence_name(">NC_000913.3 E. coli\n", 1), "NC_000913.3 E. coli");
    }
}
