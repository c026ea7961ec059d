//! Bounded edit distance used by the in-memory relevance scorer.

use std::{cmp::min, mem};

/// Levenshtein distance between `a` and `b`, or `None` once it is known to exceed
/// `threshold`.
pub fn distance_within(a: &str, b: &str, threshold: usize) -> Option<usize> {
	let a = a.chars().collect::<Vec<_>>();
	let b = b.chars().collect::<Vec<_>>();

	if a.len().abs_diff(b.len()) > threshold {
		return None;
	}
	if a.is_empty() || b.is_empty() {
		let len = a.len().max(b.len());

		return (len <= threshold).then_some(len);
	}

	let mut prev = (0..=b.len()).collect::<Vec<_>>();
	let mut curr = vec![0; b.len() + 1];

	for (i, ca) in a.iter().enumerate() {
		curr[0] = i + 1;

		let mut row_min = curr[0];

		for (j, cb) in b.iter().enumerate() {
			let cost = usize::from(ca != cb);

			curr[j + 1] = min(min(prev[j + 1] + 1, curr[j] + 1), prev[j] + cost);
			row_min = min(row_min, curr[j + 1]);
		}

		if row_min > threshold {
			return None;
		}

		mem::swap(&mut prev, &mut curr);
	}

	let distance = prev[b.len()];

	(distance <= threshold).then_some(distance)
}

/// Whether `candidate` matches `term` with at most `max_edits` edits and an identical
/// leading `prefix_length` characters.
pub fn fuzzy_match(term: &str, candidate: &str, max_edits: usize, prefix_length: usize) -> bool {
	let prefix = |value: &str| value.chars().take(prefix_length).collect::<String>();

	if prefix(term) != prefix(candidate) {
		return false;
	}

	distance_within(term, candidate, max_edits).is_some()
}
