//! Keyword Combiner: shuffle keywords into fixed-size query combinations.
//!
//! All shuffles are uniform Fisher–Yates permutations via
//! [`SliceRandom::shuffle`]. The `_with` variants take the RNG explicitly so
//! callers (and tests) can seed them.

use rand::Rng;
use rand::seq::SliceRandom;

/// Split `raw_input` on whitespace, shuffle the tokens and group them into
/// space-joined combinations of `group_size` (the last may be shorter).
///
/// `group_size` is clamped to at least 1. Empty input yields an empty list.
pub fn generate_combinations(raw_input: &str, group_size: usize) -> Vec<String> {
    generate_combinations_with(raw_input, group_size, &mut rand::thread_rng())
}

/// [`generate_combinations`] with a caller-supplied RNG.
pub fn generate_combinations_with<R: Rng + ?Sized>(
    raw_input: &str,
    group_size: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut tokens: Vec<&str> = raw_input.split_whitespace().collect();
    tokens.shuffle(rng);

    tokens
        .chunks(group_size.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Shuffle the order of existing combination lines.
///
/// Each line is opaque: its tokens keep their order. Lines are trimmed and
/// empty lines dropped.
pub fn reshuffle<S: AsRef<str>>(existing: &[S]) -> Vec<String> {
    reshuffle_with(existing, &mut rand::thread_rng())
}

/// [`reshuffle`] with a caller-supplied RNG.
pub fn reshuffle_with<S: AsRef<str>, R: Rng + ?Sized>(existing: &[S], rng: &mut R) -> Vec<String> {
    let mut lines: Vec<String> = existing
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect();
    lines.shuffle(rng);
    lines
}

/// Read a submitted block as keyword sets: one set per non-empty line,
/// keywords split on whitespace.
pub fn parse_keyword_sets(block: &str) -> Vec<Vec<String>> {
    block
        .lines()
        .map(|line| {
            line.split_whitespace()
                .map(str::to_owned)
                .collect::<Vec<_>>()
        })
        .filter(|set| !set.is_empty())
        .collect()
}
