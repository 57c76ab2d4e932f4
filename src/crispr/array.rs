use std::fmt;

use crate::crispr::data::{DnaSequence, ScanParams, base_index};
use crate::crispr::distance::are_similar;

/// Fraction of repeats that must agree on a column before the repeat grows
/// over it.
pub const CONSENSUS_THRESHOLD: f64 = 0.75;
/// Spacer similarity is only checked among the first few spacers.
pub const MAX_SPACERS_TO_CHECK: usize = 5;

// Invariants:
// 1. `positions` is strictly increasing and never shorter than two.
// 2. Every repeat `positions[i]..positions[i] + repeat_length` lies inside the
//    sequence. Extension probes are bounds-checked before any read.
// 3. Once extended, `repeat_length <= shortest_repeat_spacing - min_spacer_length`,
//    so spacers are at least `min_spacer_length` long.

/// A candidate or accepted CRISPR array: repeat starts sharing one repeat
/// length, borrowed against the sequence they were found in.
#[derive(Clone, Debug)]
pub struct RepeatArray<'a> {
    sequence: &'a DnaSequence,
    positions: Vec<usize>,
    repeat_length: usize,
}

impl<'a> RepeatArray<'a> {
    pub fn new(
        sequence: &'a DnaSequence,
        first_position: usize,
        second_position: usize,
        repeat_length: usize,
    ) -> Self {
        debug_assert!(first_position < second_position);
        Self {
            sequence,
            positions: vec![first_position, second_position],
            repeat_length,
        }
    }

    pub(crate) fn add_repeat(&mut self, position: usize) {
        debug_assert!(self.positions.last().is_some_and(|&last| last < position));
        self.positions.push(position);
    }

    pub fn sequence(&self) -> &'a DnaSequence {
        self.sequence
    }

    pub fn repeat_positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn repeat_position(&self, index: usize) -> usize {
        self.positions[index]
    }

    pub fn last_repeat_position(&self) -> usize {
        self.positions[self.positions.len() - 1]
    }

    pub fn repeat_length(&self) -> usize {
        self.repeat_length
    }

    pub fn num_repeats(&self) -> usize {
        self.positions.len()
    }

    pub fn num_spacers(&self) -> usize {
        self.positions.len() - 1
    }

    pub fn spacer_start(&self, index: usize) -> usize {
        (self.positions[index] + self.repeat_length).min(self.positions[index + 1])
    }

    pub fn spacer_length(&self, index: usize) -> usize {
        self.positions[index + 1] - self.spacer_start(index)
    }

    /// Integer mean over all spacers.
    pub fn average_spacer_length(&self) -> usize {
        let total: usize = (0..self.num_spacers()).map(|i| self.spacer_length(i)).sum();
        total / self.num_spacers()
    }

    pub fn shortest_repeat_spacing(&self) -> usize {
        self.positions
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .min()
            .unwrap_or(0)
    }

    pub fn start_index(&self) -> usize {
        self.positions[0]
    }

    /// Exclusive end of the last repeat.
    pub fn end_index(&self) -> usize {
        self.last_repeat_position() + self.repeat_length
    }

    pub fn repeat(&self, index: usize) -> &'a [u8] {
        let start = self.positions[index];
        self.sequence.sub_sequence(start, start + self.repeat_length)
    }

    pub fn spacer(&self, index: usize) -> &'a [u8] {
        self.sequence
            .sub_sequence(self.spacer_start(index), self.positions[index + 1])
    }

    /// Grows the repeat to the right one column at a time while the columns
    /// agree. Returns the number of accepted columns.
    pub(crate) fn extend_right(&mut self, min_spacer_length: usize) -> usize {
        let limit = self
            .shortest_repeat_spacing()
            .saturating_sub(min_spacer_length);
        let last = self.last_repeat_position();
        let sequence_length = self.sequence.len();
        let initial = self.repeat_length;

        let mut length = initial;
        while length < limit
            && last + length < sequence_length
            && self.column_has_consensus(|start| start + length)
        {
            length += 1;
        }
        self.repeat_length = length;
        length - initial
    }

    /// Mirror of [`Self::extend_right`]: grows every repeat leftwards and
    /// moves all starts back by the accepted amount.
    pub(crate) fn extend_left(&mut self, min_spacer_length: usize) -> usize {
        let limit = self
            .shortest_repeat_spacing()
            .saturating_sub(min_spacer_length)
            .saturating_sub(self.repeat_length);
        let first = self.start_index();

        let mut accepted = 0usize;
        while accepted < limit
            && accepted < first
            && self.column_has_consensus(|start| start - accepted - 1)
        {
            accepted += 1;
        }
        if accepted > 0 {
            self.shift_left(accepted);
        }
        accepted
    }

    fn shift_left(&mut self, size: usize) {
        self.positions = self.positions.iter().map(|&start| start - size).collect();
        self.repeat_length += size;
    }

    fn column_has_consensus(&self, column: impl Fn(usize) -> usize) -> bool {
        let mut counts = [0usize; 4];
        for &start in &self.positions {
            if let Some(base) = base_index(self.sequence.nucleotide_at(column(start))) {
                counts[base] += 1;
            }
        }
        let total = self.positions.len() as f64;
        counts
            .iter()
            .any(|&count| count as f64 / total >= CONSENSUS_THRESHOLD)
    }

    /// Rejects arrays whose spacers resemble each other, or resemble the
    /// repeats, above `similarity_threshold`.
    pub fn has_non_repeating_spacers(&self, similarity_threshold: f64) -> bool {
        let spacers_to_check = MAX_SPACERS_TO_CHECK.min(self.num_spacers());

        if spacers_to_check == 1 {
            let spacer = self.spacer(0);
            return !are_similar(spacer, self.repeat(0), similarity_threshold)
                && !are_similar(spacer, self.repeat(1), similarity_threshold);
        }

        for i in 0..spacers_to_check - 1 {
            let current = self.spacer(i);
            if are_similar(current, self.repeat(i), similarity_threshold) {
                return false;
            }
            for j in i + 1..spacers_to_check {
                if are_similar(current, self.spacer(j), similarity_threshold)
                    || are_similar(current, self.repeat(j), similarity_threshold)
                {
                    return false;
                }
            }
        }
        true
    }

    pub fn has_similarly_sized_spacers(
        &self,
        spacer_to_spacer_length_diff: usize,
        spacer_to_repeat_length_diff: usize,
    ) -> bool {
        let lengths: Vec<usize> = (0..self.num_spacers())
            .map(|i| self.spacer_length(i))
            .collect();
        for (i, &current) in lengths.iter().enumerate() {
            if current.abs_diff(self.repeat_length) > spacer_to_repeat_length_diff {
                return false;
            }
            if lengths[i + 1..]
                .iter()
                .any(|&other| current.abs_diff(other) > spacer_to_spacer_length_diff)
            {
                return false;
            }
        }
        true
    }

    pub fn validate(&self, params: &ScanParams) -> Result<(), Rejection> {
        if self.num_repeats() < params.min_number_repeats {
            return Err(Rejection::TooFewRepeats(self.num_repeats()));
        }
        if !(params.min_repeat_length..=params.max_repeat_length).contains(&self.repeat_length) {
            return Err(Rejection::RepeatLength(self.repeat_length));
        }
        if !self.has_non_repeating_spacers(params.spacer_to_spacer_max_similarity) {
            return Err(Rejection::SimilarSpacers);
        }
        if !self.has_similarly_sized_spacers(
            params.spacer_to_spacer_length_diff,
            params.spacer_to_repeat_length_diff,
        ) {
            return Err(Rejection::UnevenSpacers);
        }
        Ok(())
    }

    pub fn is_valid(&self, params: &ScanParams) -> bool {
        self.validate(params).is_ok()
    }
}

/// Why a candidate array was discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    TooFewRepeats(usize),
    RepeatLength(usize),
    SimilarSpacers,
    UnevenSpacers,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooFewRepeats(n) => write!(f, "only {n} repeats"),
            Rejection::RepeatLength(len) => write!(f, "repeat length {len} out of range"),
            Rejection::SimilarSpacers => write!(f, "spacers too similar"),
            Rejection::UnevenSpacers => write!(f, "spacer lengths too uneven"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: &str = "GCTATGCT";

    fn array_at<'a>(seq: &'a DnaSequence, positions: &[usize], length: usize) -> RepeatArray<'a> {
        let mut array = RepeatArray::new(seq, positions[0], positions[1], length);
        for &p in &positions[2..] {
            array.add_repeat(p);
        }
        array
    }

    #[test]
    fn derived_quantities() {
        // repeats at 0, 20, 45 of length 8
        let seq = DnaSequence::from_text("t", &"A".repeat(60));
        let array = array_at(&seq, &[0, 20, 45], 8);
        assert_eq!(array.num_repeats(), 3);
        assert_eq!(array.num_spacers(), 2);
        assert_eq!(array.spacer_length(0), 12);
        assert_eq!(array.spacer_length(1), 17);
        assert_eq!(array.average_spacer_length(), 14);
        assert_eq!(array.shortest_repeat_spacing(), 20);
        assert_eq!(array.start_index(), 0);
        assert_eq!(array.end_index(), 53);
    }

    #[test]
    fn extension_accepts_shared_column() {
        let text = format!(
            "{R}G{}{R}G{}{R}G{}",
            "AACCTTGGAACCTTGGAACC", "CTCTAGAGCTCTAGAGCTCT", "TGTGCACATGTGCACATGTG"
        );
        let seq = DnaSequence::from_text("t", &text);
        let mut array = array_at(&seq, &[0, 29, 58], 8);
        assert_eq!(array.extend_right(5), 1);
        assert_eq!(array.repeat_length(), 9);
        assert_eq!(array.repeat(2), b"GCTATGCTG");
    }

    #[test]
    fn extension_stops_without_consensus() {
        let text = format!(
            "A{R}A{}C{R}C{}G{R}G{}",
            "CCTTGGAACCTTGGAACCTT", "TTCCAAGGTTCCAAGGTTCC", "AAGGCCTTAAGGCCTTAAGG"
        );
        let seq = DnaSequence::from_text("t", &text);
        let mut array = array_at(&seq, &[1, 31, 61], 8);
        assert_eq!(array.extend_right(5), 0);
        assert_eq!(array.extend_left(5), 0);
        assert_eq!(array.repeat_positions(), &[1, 31, 61]);
        assert_eq!(array.repeat_length(), 8);
    }

    #[test]
    fn left_extension_shifts_every_repeat() {
        let text = format!(
            "T{R}{}T{R}{}T{R}{}",
            "CCAAGGCCAAGGCCAAGGCA", "GGTTCCGGTTCCGGTTCCGA", "AGAGAGCTCTCTAGAGAGCC"
        );
        let seq = DnaSequence::from_text("t", &text);
        let mut array = array_at(&seq, &[1, 30, 59], 8);
        // the first repeat sits one base from the buffer start
        assert_eq!(array.extend_left(5), 1);
        assert_eq!(array.repeat_positions(), &[0, 29, 58]);
        assert_eq!(array.repeat_length(), 9);
        assert_eq!(array.repeat(1), b"TGCTATGCT");
    }

    #[test]
    fn three_of_four_is_a_consensus() {
        let text = format!(
            "{R}A{}{R}A{}{R}A{}{R}C{}",
            "GGTTCCGGTTCCGGTTCCG",
            "TTGGAATTGGAATTGGAAT",
            "CACAGTGTCACAGTGTCAC",
            "AT"
        );
        let seq = DnaSequence::from_text("t", &text);
        let mut array = array_at(&seq, &[0, 28, 56, 84], 8);
        assert_eq!(array.extend_right(5), 1);
    }

    #[test]
    fn right_extension_respects_minimum_spacer() {
        // identical repeats and spacers: only the spacer budget stops growth
        let unit = format!("{R}{}", "ACGTACGTACGT");
        let text = unit.repeat(4);
        let seq = DnaSequence::from_text("t", &text);
        let mut array = array_at(&seq, &[0, 20, 40], 8);
        array.extend_right(10);
        assert_eq!(array.repeat_length(), 10);
        assert!((0..array.num_spacers()).all(|i| array.spacer_length(i) >= 10));
    }

    #[test]
    fn left_extension_respects_minimum_spacer() {
        // poly-C upstream of every copy, divergent bases right after it
        let tails = ["AGTCAGTCAGTC", "GATCGATCGATC", "TCAGTCAGTCAG"];
        let text: String = tails
            .iter()
            .map(|tail| format!("{}{R}{tail}", "C".repeat(20)))
            .collect();
        let seq = DnaSequence::from_text("t", &text);
        let mut array = array_at(&seq, &[20, 60, 100], 8);
        assert_eq!(array.extend_right(19), 0);
        assert_eq!(array.extend_left(19), 13);
        assert_eq!(array.repeat_positions(), &[7, 47, 87]);
        assert_eq!(array.repeat_length(), array.shortest_repeat_spacing() - 19);
        assert!((0..array.num_spacers()).all(|i| array.spacer_length(i) >= 19));
    }

    #[test]
    fn right_extension_stays_inside_buffer() {
        let text = format!("{R}{}{R}{}{R}", "AAAAAAAAAAAA", "AAAAAAAAAAAA");
        let seq = DnaSequence::from_text("t", &text);
        let mut array = array_at(&seq, &[0, 20, 40], 8);
        assert_eq!(array.extend_right(0), 0);
        assert_eq!(array.end_index(), seq.len());
    }

    #[test]
    fn identical_spacers_are_rejected() {
        let spacer = "ACCTGAAGTCCAGTTTACCA";
        let text = format!("{R}{spacer}{R}{spacer}{R}{spacer}");
        let seq = DnaSequence::from_text("t", &text);
        let array = array_at(&seq, &[0, 28, 56], 8);
        assert!(!array.has_non_repeating_spacers(0.62));
    }

    #[test]
    fn single_spacer_checked_against_both_repeats() {
        let text = format!("{R}{}{R}", "GCTATGCA");
        let seq = DnaSequence::from_text("t", &text);
        let array = array_at(&seq, &[0, 16], 8);
        assert!(!array.has_non_repeating_spacers(0.62));

        let text = format!("{R}{}{R}", "AAAAAAAA");
        let seq = DnaSequence::from_text("t", &text);
        let array = array_at(&seq, &[0, 16], 8);
        assert!(array.has_non_repeating_spacers(0.62));
    }

    #[test]
    fn spacer_size_checks() {
        let seq = DnaSequence::from_text("t", &"A".repeat(200));
        let array = array_at(&seq, &[0, 30, 75], 10);
        // spacers 20 and 35
        assert!(!array.has_similarly_sized_spacers(12, 30));
        assert!(array.has_similarly_sized_spacers(15, 30));
        assert!(!array.has_similarly_sized_spacers(15, 20));
    }

    #[test]
    fn validation_reports_first_failure() {
        let seq = DnaSequence::from_text("t", &"A".repeat(200));
        let array = array_at(&seq, &[0, 30], 20);
        assert_eq!(
            array.validate(&ScanParams::default()),
            Err(Rejection::TooFewRepeats(2))
        );
        let array = array_at(&seq, &[0, 30, 60], 8);
        assert_eq!(
            array.validate(&ScanParams::default()),
            Err(Rejection::RepeatLength(8))
        );
    }
}
