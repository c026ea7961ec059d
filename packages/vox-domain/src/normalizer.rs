//! Raw query text to a weighted set of query variants.
//!
//! The variants feed a single boosted-OR relevance query. Every variant is a full
//! rewrite of the query: accent-folded, phrase-substituted and translated, or
//! extended with related terms. The literal text always carries the highest weight.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use vox_config::Lexicon;

use crate::{
	error::{Error, Result},
	fold::fold,
};

pub const LITERAL_WEIGHT: f32 = 3.0;
pub const FOLDED_WEIGHT: f32 = 2.0;
pub const TRANSLATED_WEIGHT: f32 = 2.0;
pub const FOLDED_TRANSLATED_WEIGHT: f32 = 1.5;
pub const EXPANDED_WEIGHT: f32 = 1.5;
pub const FOLDED_EXPANDED_WEIGHT: f32 = 1.25;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryVariant {
	pub text: String,
	pub weight: f32,
}

/// Variants keyed by lower-cased text with whitespace runs collapsed, in insertion
/// order.
///
/// A later insert with the same key replaces the weight, except for the literal
/// entry which is pinned once inserted.
#[derive(Clone, Debug, Default)]
pub struct VariantSet {
	entries: Vec<QueryVariant>,
	literal_key: Option<String>,
}
impl VariantSet {
	pub fn with_literal(text: &str) -> Self {
		let mut set = Self::default();

		set.entries.push(QueryVariant { text: text.to_string(), weight: LITERAL_WEIGHT });
		set.literal_key = Some(variant_key(text));

		set
	}

	pub fn insert(&mut self, text: &str, weight: f32) {
		let key = variant_key(text);

		if key.is_empty() || self.literal_key.as_deref() == Some(key.as_str()) {
			return;
		}

		match self.entries.iter_mut().find(|entry| variant_key(&entry.text) == key) {
			Some(entry) => entry.weight = weight,
			None => self.entries.push(QueryVariant { text: text.trim().to_string(), weight }),
		}
	}

	pub fn get(&self, text: &str) -> Option<&QueryVariant> {
		let key = variant_key(text);

		self.entries.iter().find(|entry| variant_key(&entry.text) == key)
	}

	pub fn iter(&self) -> impl Iterator<Item = &QueryVariant> {
		self.entries.iter()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn into_vec(self) -> Vec<QueryVariant> {
		self.entries
	}
}

/// Lexicon compiled for repeated use.
#[derive(Debug)]
pub struct Normalizer {
	phrases: Vec<(Regex, String)>,
	translations: HashMap<String, String>,
	expansions: Vec<(Regex, Vec<String>)>,
}
impl Normalizer {
	pub fn new(lexicon: &Lexicon) -> Result<Self> {
		let mut phrases = Vec::with_capacity(lexicon.phrases.len());

		for rule in &lexicon.phrases {
			phrases.push((compile_ci(&rule.pattern)?, rule.replacement.clone()));
		}

		let translations = lexicon
			.token_translations()
			.map(|(source, target)| (source.to_string(), target.to_string()))
			.collect();
		let mut expansions = Vec::with_capacity(lexicon.expansions.len());

		for rule in &lexicon.expansions {
			let pattern = format!(r"\b{}\b", regex::escape(&rule.keyword));

			expansions.push((compile_ci(&pattern)?, rule.terms.clone()));
		}

		Ok(Self { phrases, translations, expansions })
	}

	pub fn normalize(&self, query: &str) -> Result<VariantSet> {
		let literal = query.trim();

		if literal.is_empty() {
			return Err(Error::EmptyQuery);
		}

		let mut set = VariantSet::with_literal(literal);
		let folded = fold(literal);

		if folded != literal {
			set.insert(&folded, FOLDED_WEIGHT);
		}

		let translated = self.translate(&self.substitute_phrases(literal));

		if translated != literal {
			set.insert(&translated, TRANSLATED_WEIGHT);

			let folded_translated = fold(&translated);

			if folded_translated != translated {
				set.insert(&folded_translated, FOLDED_TRANSLATED_WEIGHT);
			}
		}

		let extra = self.expansion_terms(literal);
		let present = translated.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>();
		let appended = extra.into_iter().filter(|term| !present.contains(term)).collect::<Vec<_>>();

		if !appended.is_empty() {
			let expanded = format!("{translated} {}", appended.join(" "));

			set.insert(&expanded, EXPANDED_WEIGHT);

			let folded_expanded = fold(&expanded);

			if folded_expanded != expanded {
				set.insert(&folded_expanded, FOLDED_EXPANDED_WEIGHT);
			}
		}

		Ok(set)
	}

	/// Runs every phrase rule over one working string, in order.
	pub fn substitute_phrases(&self, text: &str) -> String {
		let mut working = text.to_string();

		for (pattern, replacement) in &self.phrases {
			working = pattern.replace_all(&working, replacement.as_str()).into_owned();
		}

		working
	}

	/// Token-by-token dictionary lookup. Unknown tokens pass through unchanged.
	pub fn translate(&self, text: &str) -> String {
		text.split_whitespace()
			.map(|token| {
				self.translations.get(&token.to_lowercase()).map(String::as_str).unwrap_or(token)
			})
			.collect::<Vec<_>>()
			.join(" ")
	}

	/// Ordered, deduplicated union of the expansion terms whose keyword occurs as a
	/// whole word in `query`.
	pub fn expansion_terms(&self, query: &str) -> Vec<String> {
		let lowered = query.to_lowercase();
		let mut out: Vec<String> = Vec::new();

		for (keyword, terms) in &self.expansions {
			if !keyword.is_match(&lowered) {
				continue;
			}

			for term in terms {
				if !out.contains(term) {
					out.push(term.clone());
				}
			}
		}

		out
	}
}

pub(crate) fn compile_ci(pattern: &str) -> Result<Regex> {
	RegexBuilder::new(pattern)
		.case_insensitive(true)
		.build()
		.map_err(|err| Error::InvalidPattern { pattern: pattern.to_string(), source: err })
}

fn variant_key(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
