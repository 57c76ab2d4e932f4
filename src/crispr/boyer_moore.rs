const ALPHABET_SIZE: usize = 256;

/// Exact matcher combining the bad-character rule with the strong
/// good-suffix rule. Tables are built once per pattern so a seed can be
/// searched for repeatedly while scanning right.
#[derive(Clone, Debug)]
pub struct BoyerMoore<'p> {
    pattern: &'p [u8],
    bad_char: [isize; ALPHABET_SIZE],
    good_suffix: Vec<usize>,
}

impl<'p> BoyerMoore<'p> {
    pub fn new(pattern: &'p [u8]) -> Self {
        Self {
            pattern,
            bad_char: bad_char_table(pattern),
            good_suffix: good_suffix_table(pattern),
        }
    }

    pub fn pattern(&self) -> &[u8] {
        self.pattern
    }

    /// Lowest offset of the pattern in `text`. An empty pattern or a text
    /// shorter than the pattern never matches.
    pub fn find(&self, text: &[u8]) -> Option<usize> {
        let m = self.pattern.len();
        let n = text.len();
        if m == 0 || n < m {
            return None;
        }

        let mut s = 0usize;
        while s <= n - m {
            // `j` counts the still-unmatched prefix; pattern[j - 1] is compared next.
            let mut j = m;
            while j > 0 && self.pattern[j - 1] == text[s + j - 1] {
                j -= 1;
            }
            if j == 0 {
                return Some(s);
            }
            let bad_char_shift = if s + m < n {
                (m as isize - self.bad_char[text[s + m] as usize]) as usize
            } else {
                1
            };
            s += self.good_suffix[j].max(bad_char_shift).max(1);
        }
        None
    }
}

/// Convenience wrapper for a one-off search.
pub fn search(text: &[u8], pattern: &[u8]) -> Option<usize> {
    BoyerMoore::new(pattern).find(text)
}

fn bad_char_table(pattern: &[u8]) -> [isize; ALPHABET_SIZE] {
    let mut table = [-1isize; ALPHABET_SIZE];
    for (i, &byte) in pattern.iter().enumerate() {
        table[byte as usize] = i as isize;
    }
    table
}

// shift[j] is applied when pattern[j - 1] mismatched after pattern[j..]
// matched. border[i] is the start of the widest border of pattern[i..].
fn good_suffix_table(pattern: &[u8]) -> Vec<usize> {
    let m = pattern.len();
    let mut shift = vec![0usize; m + 1];
    let mut border = vec![0usize; m + 1];

    let mut i = m;
    let mut j = m + 1;
    border[i] = j;
    while i > 0 {
        while j <= m && pattern[i - 1] != pattern[j - 1] {
            if shift[j] == 0 {
                shift[j] = j - i;
            }
            j = border[j];
        }
        i -= 1;
        j -= 1;
        border[i] = j;
    }

    // Suffixes with no interior re-occurrence fall back to the widest
    // border of the whole pattern.
    let mut j = border[0];
    for (i, slot) in shift.iter_mut().enumerate() {
        if *slot == 0 {
            *slot = j;
        }
        if i == j {
            j = border[j];
        }
    }
    shift
}
