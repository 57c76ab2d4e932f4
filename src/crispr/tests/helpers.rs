use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use rand_xoshiro::Xoshiro256PlusPlus;
use rand_xoshiro::rand_core::{RngCore, SeedableRng};

use crate::crispr::DnaSequence;

pub(crate) const REPEAT: &str = "GTTTTAGAGCTATGCTGTTTTGAATGGTCCCAAAAC";

pub(crate) const SPACERS: [&str; 5] = [
    "GCTAAAGACAATTACATAACATACACGTCA",
    "GCACGAAACTTGTTGGCCCAGTGTGAATCG",
    "CTTAAGGGTTAAGTAAGTGTGATGCATACG",
    "CCTTTACTTGCTGTGTCCACCCCATCGGAC",
    "TGGCATTTTTATTACACTCAGAAACAGAAC",
];

pub(crate) const SECOND_REPEAT: &str = "GTCGCACTCTTCATGGGTGCGTGGATTGAAAT";

pub(crate) const SECOND_SPACERS: [&str; 4] = [
    "ATGCCGAGGAATTCCGCCAGTTGCAGATAC",
    "TCATTAGCGCGCTGCACCAGCTCGAGAAAG",
    "CGTTGCCAAAGCGTTTAAGGATTGCAAGTT",
    "AAACCACCGCTGGCAGAATATTTAAAGATG",
];

pub(crate) const LEFT_FLANK: &str = "TTTCCTCATGCAATTCAAAACCATGTCCGTAATGTAGGCG";
pub(crate) const RIGHT_FLANK: &str = "AAATAGTAAACCATTTTACGGAGGATACCAAATTCCTCCT";

/// `REPEAT` followed by `spacer_count` spacer/repeat pairs.
pub(crate) fn scenario_text(spacer_count: usize) -> String {
    let mut text = String::from(REPEAT);
    for spacer in &SPACERS[..spacer_count] {
        text.push_str(spacer);
        text.push_str(REPEAT);
    }
    text
}

/// Two unrelated arrays separated by a flank: three spacers of the first
/// family, then four of the second.
pub(crate) fn two_family_text() -> String {
    let mut text = format!("{LEFT_FLANK}{}{RIGHT_FLANK}{SECOND_REPEAT}", scenario_text(3));
    for spacer in SECOND_SPACERS {
        text.push_str(spacer);
        text.push_str(SECOND_REPEAT);
    }
    text.push_str(LEFT_FLANK);
    text
}

pub(crate) fn scenario_sequence(spacer_count: usize) -> DnaSequence {
    DnaSequence::from_text("scenario synthetic array", &scenario_text(spacer_count))
}

pub(crate) fn random_bases(length: usize, seed: u64) -> Vec<u8> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    (0..length)
        .map(|_| b"ACGT"[rng.next_u32() as usize % 4])
        .collect()
}

/// Random sequence in which no `k`-mer occurs twice.
pub(crate) fn unique_kmer_bases(length: usize, k: usize, seed: u64) -> Vec<u8> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut seen: HashSet<Vec<u8>> = HashSet::new();
    let mut bases: Vec<u8> = Vec::with_capacity(length);
    while bases.len() < length {
        let offset = rng.next_u32() as usize % 4;
        let mut placed = false;
        for step in 0..4 {
            let base = b"ACGT"[(offset + step) % 4];
            bases.push(base);
            if bases.len() < k {
                placed = true;
                break;
            }
            let kmer = bases[bases.len() - k..].to_vec();
            if seen.insert(kmer) {
                placed = true;
                break;
            }
            bases.pop();
        }
        assert!(placed, "dead end while building a k-mer unique sequence");
    }
    bases
}

pub(crate) fn temp_path(prefix: &str, extension: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{nanos}.{extension}"))
}
