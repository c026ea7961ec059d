//! Query dictionaries loaded as data.
//!
//! A lexicon carries everything the normalizer, the brand extractor and the
//! material facet need: phrase rewrites, the bilingual token dictionary, keyword
//! expansions, the ordered brand list and material keywords.

use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;

use crate::{Error, Result};

const BUILTIN_LEXICON_TOML: &str = include_str!("../../../lexicon.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct Lexicon {
	/// Ordered. The first brand found in a query wins, so longer names go first.
	#[serde(default)]
	pub brands: Vec<String>,
	/// Applied in order to the same working string.
	#[serde(default)]
	pub phrases: Vec<PhraseRule>,
	/// Source-language term to target-language term. Keys containing whitespace are
	/// phrase entries and are only used when extracting keywords.
	#[serde(default)]
	pub translations: HashMap<String, String>,
	#[serde(default)]
	pub expansions: Vec<ExpansionRule>,
	#[serde(default)]
	pub materials: Vec<MaterialRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhraseRule {
	/// Regular expression, matched case-insensitively.
	pub pattern: String,
	pub replacement: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpansionRule {
	pub keyword: String,
	pub terms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialRule {
	pub label: String,
	pub keywords: Vec<String>,
}

impl Lexicon {
	pub fn builtin() -> Result<Self> {
		parse_lexicon(BUILTIN_LEXICON_TOML, "the built-in lexicon")
	}

	pub fn empty() -> Self {
		Self {
			brands: Vec::new(),
			phrases: Vec::new(),
			translations: HashMap::new(),
			expansions: Vec::new(),
			materials: Vec::new(),
		}
	}

	/// Single-token dictionary entries.
	pub fn token_translations(&self) -> impl Iterator<Item = (&str, &str)> {
		self.translations
			.iter()
			.filter(|(source, _)| !source.contains(char::is_whitespace))
			.map(|(source, target)| (source.as_str(), target.as_str()))
	}

	/// Multi-word dictionary entries, longest first so that longer phrases are
	/// rewritten before their sub-phrases.
	pub fn phrase_translations(&self) -> Vec<(&str, &str)> {
		let mut out = self
			.translations
			.iter()
			.filter(|(source, _)| source.contains(char::is_whitespace))
			.map(|(source, target)| (source.as_str(), target.as_str()))
			.collect::<Vec<_>>();

		out.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

		out
	}
}

pub fn load_lexicon(path: &Path) -> Result<Lexicon> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadLexicon { path: path.to_path_buf(), source: err })?;

	parse_lexicon(&raw, &format!("{path:?}"))
}

pub fn resolve_lexicon(cfg: &crate::Config) -> Result<Lexicon> {
	match cfg.lexicon.path.as_deref() {
		Some(path) => load_lexicon(path),
		None => Lexicon::builtin(),
	}
}

pub fn validate_lexicon(lexicon: &Lexicon) -> Result<()> {
	if lexicon.brands.iter().any(|brand| brand.trim().is_empty()) {
		return Err(Error::Validation { message: "lexicon.brands must not contain blank names.".to_string() });
	}

	for rule in &lexicon.phrases {
		if rule.pattern.trim().is_empty() {
			return Err(Error::Validation {
				message: "lexicon.phrases.pattern must be non-empty.".to_string(),
			});
		}
	}
	for (source, target) in &lexicon.translations {
		if source.is_empty() || target.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("lexicon.translations entry {source:?} must have a non-empty target."),
			});
		}
	}
	for rule in &lexicon.expansions {
		if rule.keyword.is_empty() {
			return Err(Error::Validation {
				message: "lexicon.expansions.keyword must be non-empty.".to_string(),
			});
		}
		if rule.terms.iter().all(|term| term.trim().is_empty()) {
			return Err(Error::Validation {
				message: format!("lexicon.expansions entry {:?} must list at least one term.", rule.keyword),
			});
		}
	}
	for rule in &lexicon.materials {
		if rule.label.trim().is_empty() {
			return Err(Error::Validation {
				message: "lexicon.materials.label must be non-empty.".to_string(),
			});
		}
		if rule.keywords.iter().all(|keyword| keyword.trim().is_empty()) {
			return Err(Error::Validation {
				message: format!("lexicon.materials entry {:?} must list at least one keyword.", rule.label),
			});
		}
	}

	Ok(())
}

fn parse_lexicon(raw: &str, origin: &str) -> Result<Lexicon> {
	let mut lexicon: Lexicon = toml::from_str(raw)
		.map_err(|err| Error::ParseLexicon { origin: origin.to_string(), source: err })?;

	normalize_lexicon(&mut lexicon);

	validate_lexicon(&lexicon)?;

	Ok(lexicon)
}

fn normalize_lexicon(lexicon: &mut Lexicon) {
	let mut brands = Vec::with_capacity(lexicon.brands.len());

	for brand in lexicon.brands.drain(..) {
		let trimmed = brand.trim().to_string();

		if !brands.iter().any(|seen: &String| seen.eq_ignore_ascii_case(&trimmed)) {
			brands.push(trimmed);
		}
	}

	lexicon.brands = brands;
	lexicon.translations = lexicon
		.translations
		.drain()
		.map(|(source, target)| (collapse_lower(&source), target.trim().to_string()))
		.collect();

	for rule in &mut lexicon.expansions {
		rule.keyword = collapse_lower(&rule.keyword);
		rule.terms.retain(|term| !term.trim().is_empty());

		for term in &mut rule.terms {
			*term = term.trim().to_lowercase();
		}
	}
	for rule in &mut lexicon.materials {
		rule.label = rule.label.trim().to_string();
		rule.keywords.retain(|keyword| !keyword.trim().is_empty());

		for keyword in &mut rule.keywords {
			*keyword = keyword.trim().to_lowercase();
		}
	}
}

fn collapse_lower(value: &str) -> String {
	value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
	use super::Lexicon;

	#[test]
	fn builtin_lexicon_parses() {
		let lexicon = Lexicon::builtin().expect("Built-in lexicon must parse.");

		assert!(lexicon.brands.iter().any(|brand| brand == "CORNING"));
		assert!(!lexicon.phrases.is_empty());
		assert!(!lexicon.materials.is_empty());
	}

	#[test]
	fn phrase_translations_are_split_from_token_translations() {
		let lexicon = Lexicon::builtin().expect("Built-in lexicon must parse.");
		let phrases = lexicon.phrase_translations();

		assert!(phrases.iter().all(|(source, _)| source.contains(' ')));
		assert!(lexicon.token_translations().all(|(source, _)| !source.contains(' ')));
		assert!(phrases.iter().any(|(source, _)| *source == "test tube"));
	}

	#[test]
	fn translation_keys_are_lower_cased() {
		let lexicon: Lexicon = toml::from_str(
			"[translations]\n\"Test  Tube\" = \"tube a essai\"\nGlass = \"verre\"\n",
		)
		.expect("Failed to parse lexicon.");
		let mut lexicon = lexicon;

		super::normalize_lexicon(&mut lexicon);

		assert_eq!(lexicon.translations.get("glass").map(String::as_str), Some("verre"));
		assert!(lexicon.translations.contains_key("test tube"));
	}
}
