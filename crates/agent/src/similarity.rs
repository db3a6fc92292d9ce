//! Gestalt (Ratcliff/Obershelp) string similarity.
//!
//! `ratio = 2·M / T`, where `T` is the combined length of both strings and
//! `M` the number of characters in matching blocks. Blocks are found by
//! taking the longest common substring, then recursing on the unmatched
//! pieces to its left and right. Lengths are counted in `char`s.
//!
//! Long reference strings get the usual popularity heuristic: once `b` has
//! at least [`AUTOJUNK_MIN_LEN`] characters, any character occurring more
//! than `len / 100 + 1` times in it cannot seed a match. It can still extend
//! one that a rarer character started.

use std::collections::{HashMap, HashSet};

/// Reference length from which very frequent characters stop seeding matches.
pub const AUTOJUNK_MIN_LEN: usize = 200;

/// Similarity of `a` against the reference `b`, in `[0.0, 1.0]`.
/// Two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matcher = Matcher {
        popular: popular_chars(&b),
        a: &a,
        b: &b,
    };
    2.0 * matcher.matching_characters() as f64 / total as f64
}

/// Characters too frequent in a long reference to seed a match.
fn popular_chars(b: &[char]) -> HashSet<char> {
    if b.len() < AUTOJUNK_MIN_LEN {
        return HashSet::new();
    }

    let mut counts: HashMap<char, usize> = HashMap::new();
    for &c in b {
        *counts.entry(c).or_default() += 1;
    }

    let limit = b.len() / 100 + 1;
    counts
        .into_iter()
        .filter(|&(_, n)| n > limit)
        .map(|(c, _)| c)
        .collect()
}

struct Matcher<'a> {
    a: &'a [char],
    b: &'a [char],
    popular: HashSet<char>,
}

impl Matcher<'_> {
    /// Sum of all matching block sizes.
    fn matching_characters(&self) -> usize {
        let mut matched = 0;
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, size) = self.longest_match(alo, ahi, blo, bhi);
            if size == 0 {
                continue;
            }
            matched += size;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + size < ahi && j + size < bhi {
                pending.push((i + size, ahi, j + size, bhi));
            }
        }

        matched
    }

    /// Longest common run of `a[alo..ahi]` and `b[blo..bhi]` seeded by
    /// non-popular characters, then widened over any equal neighbours.
    ///
    /// Returns `(i, j, size)`. Among equally long seeds the one starting
    /// earliest in `a` wins, then the one starting earliest in `b`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (a, b) = (self.a, self.b);
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

        // run[j + 1] = length of the common run ending at a[i - 1], b[j]
        let width = bhi - blo;
        let mut prev = vec![0usize; width + 1];
        let mut curr = vec![0usize; width + 1];

        for i in alo..ahi {
            for j in blo..bhi {
                let col = j - blo + 1;
                curr[col] = if a[i] == b[j] && !self.popular.contains(&b[j]) {
                    prev[col - 1] + 1
                } else {
                    0
                };

                let size = curr[col];
                if size > 0 {
                    let start_i = i + 1 - size;
                    let start_j = j + 1 - size;
                    let better = size > best_size
                        || (size == best_size && (start_i, start_j) < (best_i, best_j));
                    if better {
                        best_i = start_i;
                        best_j = start_j;
                        best_size = size;
                    }
                }
            }
            std::mem::swap(&mut prev, &mut curr);
        }

        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }
}
