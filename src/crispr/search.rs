use log::{debug, trace};

use crate::crispr::array::RepeatArray;
use crate::crispr::boyer_moore::BoyerMoore;
use crate::crispr::data::{DnaSequence, ScanParams};

/// Tolerance, in bases, on the expected position of the next repeat while
/// scanning right.
pub const SCAN_RANGE: usize = 24;

// Invariants for the scan:
// 1. Coordinates are 0-based half-open. Every search window is clamped to the
//    sequence and an empty or inverted window means "no hit", never an error.
// 2. Only one candidate array is alive at a time. It is either returned as a
//    valid array or dropped before the cursor moves on.
// 3. After an array is emitted the cursor resumes at `end_index + 1`, so none
//    of its repeats can seed a second array.

/// Drives the seed / scan-right / extend / validate loop over one sequence.
#[derive(Clone, Copy, Debug)]
pub struct SearchEngine<'a> {
    sequence: &'a DnaSequence,
    params: ScanParams,
}

impl<'a> SearchEngine<'a> {
    pub fn new(sequence: &'a DnaSequence, params: ScanParams) -> Self {
        Self { sequence, params }
    }

    /// Lazy scan; each `next` advances the cursor until one valid array is
    /// found or the sequence is exhausted.
    pub fn scanner(&self) -> CrisprScanner<'a> {
        CrisprScanner::new(*self)
    }

    pub fn find_crispr_arrays(&self) -> Vec<RepeatArray<'a>> {
        let arrays: Vec<_> = self.scanner().collect();
        debug!(
            "{}: {} CRISPR arrays in {} bp",
            self.sequence.name(),
            arrays.len(),
            self.sequence.len()
        );
        arrays
    }

    /// Full treatment of one cursor position. `None` means no valid array
    /// starts here.
    pub(crate) fn candidate_at(&self, cursor: usize) -> Option<RepeatArray<'a>> {
        let mut array = self.find_exact_repeats(cursor)?;
        array.extend_right(self.params.min_spacer_length);
        array.extend_left(self.params.min_spacer_length);
        match array.validate(&self.params) {
            Ok(()) => {
                debug!(
                    "array at {}..{}: {} repeats of {} bp",
                    array.start_index(),
                    array.end_index(),
                    array.num_repeats(),
                    array.repeat_length()
                );
                Some(array)
            }
            Err(reason) => {
                trace!("discarding candidate seeded at {cursor}: {reason}");
                None
            }
        }
    }

    /// Seeds a candidate with the window at `begin` and collects every exact
    /// downstream copy of it.
    pub(crate) fn find_exact_repeats(&self, begin: usize) -> Option<RepeatArray<'a>> {
        let params = &self.params;
        let sequence_length = self.sequence.len();
        let window = params.search_window_length;
        if window == 0 || begin + window > sequence_length {
            return None;
        }

        let pattern = self.sequence.sub_sequence(begin, begin + window);
        let begin_search = begin + params.min_spacer_length + params.min_repeat_length;
        let end_search = (begin + params.max_spacer_length + params.max_repeat_length + window + 1)
            .min(sequence_length);
        if begin_search >= sequence_length || begin_search >= end_search {
            return None;
        }

        let matcher = BoyerMoore::new(pattern);
        let offset = matcher.find(self.sequence.sub_sequence(begin_search, end_search))?;
        let mut array = RepeatArray::new(self.sequence, begin, begin_search + offset, window);
        self.scan_right(&mut array, &matcher);
        Some(array)
    }

    /// Appends further copies of the seed, each looked for around the
    /// spacing of the previous two repeats.
    fn scan_right(&self, array: &mut RepeatArray<'a>, matcher: &BoyerMoore<'_>) {
        let sequence_length = self.sequence.len();
        let pattern_length = matcher.pattern().len();
        loop {
            let count = array.num_repeats();
            let last = array.repeat_position(count - 1);
            let spacing = last - array.repeat_position(count - 2);

            let begin_search = (last + spacing)
                .saturating_sub(SCAN_RANGE)
                .max(last + pattern_length + self.params.min_spacer_length);
            let end_search =
                (last + spacing + pattern_length + SCAN_RANGE + 1).min(sequence_length);
            if begin_search >= sequence_length || begin_search >= end_search {
                return;
            }

            let Some(offset) = matcher.find(self.sequence.sub_sequence(begin_search, end_search))
            else {
                return;
            };
            array.add_repeat(begin_search + offset);
        }
    }
}

/// Iterator over the valid arrays of one sequence, left to right.
pub struct CrisprScanner<'a> {
    engine: SearchEngine<'a>,
    cursor: usize,
    skip: usize,
}

impl<'a> CrisprScanner<'a> {
    fn new(engine: SearchEngine<'a>) -> Self {
        Self {
            skip: engine.params.skip(),
            engine,
            cursor: 0,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl<'a> Iterator for CrisprScanner<'a> {
    type Item = RepeatArray<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let window = self.engine.params.search_window_length;
        let sequence_length = self.engine.sequence.len();
        if window == 0 {
            return None;
        }
        while self.cursor + window <= sequence_length {
            if let Some(array) = self.engine.candidate_at(self.cursor) {
                self.cursor = array.end_index() + 1;
                return Some(array);
            }
            self.cursor += self.skip;
        }
        None
    }
}
