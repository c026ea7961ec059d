use regex::Regex;

use vox_config::Lexicon;

use crate::{error::Result, normalizer::compile_ci};

/// Keyword extraction for the substring tiers.
///
/// Multi-word dictionary entries are rewritten first so that "test tubes" yields
/// the target-language tokens instead of "test" and "tubes".
#[derive(Debug)]
pub struct KeywordExtractor {
	phrases: Vec<(Regex, String)>,
	min_chars: usize,
}
impl KeywordExtractor {
	pub fn new(lexicon: &Lexicon, min_chars: usize) -> Result<Self> {
		let mut phrases = Vec::new();

		for (source, target) in lexicon.phrase_translations() {
			let words = source.split_whitespace().map(regex::escape).collect::<Vec<_>>();
			let pattern = format!(r"\b{}\b", words.join(r"\s+"));

			phrases.push((compile_ci(&pattern)?, target.to_string()));
		}

		Ok(Self { phrases, min_chars })
	}

	/// Lower-cased tokens of at least `min_chars` characters, deduplicated in order of
	/// first appearance. Empty when nothing qualifies.
	pub fn extract(&self, text: &str) -> Vec<String> {
		let mut working = text.to_lowercase();

		for (pattern, target) in &self.phrases {
			working = pattern.replace_all(&working, target.as_str()).into_owned();
		}

		let mut out: Vec<String> = Vec::new();

		for token in working.split_whitespace() {
			let token = token.trim_matches(|ch: char| !ch.is_alphanumeric());

			if token.chars().count() < self.min_chars {
				continue;
			}
			if !out.iter().any(|seen| seen == token) {
				out.push(token.to_string());
			}
		}

		out
	}
}
