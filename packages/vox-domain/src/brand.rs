use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrandMatch {
	/// Brand as spelled in the brand list.
	pub brand: String,
	/// Query with every occurrence of the brand removed and whitespace collapsed.
	pub core: String,
}

#[derive(Debug)]
pub struct BrandExtractor {
	brands: Vec<(String, Regex)>,
}
impl BrandExtractor {
	pub fn new(brands: &[String]) -> Result<Self> {
		let brands = brands
			.iter()
			.map(|brand| Ok((brand.clone(), occurrence_pattern(brand)?)))
			.collect::<Result<Vec<_>>>()?;

		Ok(Self { brands })
	}

	/// First listed brand contained in `query`, case-insensitively.
	pub fn extract(&self, query: &str) -> Option<BrandMatch> {
		self.brands.iter().find(|(_, pattern)| pattern.is_match(query)).map(|(brand, pattern)| {
			BrandMatch { brand: brand.clone(), core: strip_with(pattern, query) }
		})
	}
}

/// Removes every case-insensitive occurrence of `brand` from `query`.
pub fn strip_brand(query: &str, brand: &str) -> Result<String> {
	let pattern = occurrence_pattern(brand)?;

	Ok(strip_with(&pattern, query))
}

fn occurrence_pattern(brand: &str) -> Result<Regex> {
	let escaped = regex::escape(brand.trim());

	RegexBuilder::new(&escaped)
		.case_insensitive(true)
		.build()
		.map_err(|err| Error::InvalidPattern { pattern: escaped.clone(), source: err })
}

fn strip_with(pattern: &Regex, query: &str) -> String {
	collapse_whitespace(&pattern.replace_all(query, " "))
}

fn collapse_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
	use super::{BrandExtractor, strip_brand};

	fn extractor() -> BrandExtractor {
		let brands = ["THERMO SCIENTIFIC", "CORNING", "DURAN"].map(String::from);

		BrandExtractor::new(&brands).expect("Brands must compile.")
	}

	#[test]
	fn extracts_brand_and_core_text() {
		let found = extractor().extract("CORNING test tubes").expect("Expected a brand.");

		assert_eq!(found.brand, "CORNING");
		assert_eq!(found.core, "test tubes");
	}

	#[test]
	fn strips_every_occurrence_case_insensitively() {
		let found = extractor().extract("corning tube  Corning").expect("Expected a brand.");

		assert_eq!(found.brand, "CORNING");
		assert_eq!(found.core, "tube");
	}

	#[test]
	fn first_listed_brand_wins() {
		let found = extractor().extract("duran flask thermo scientific").expect("Expected a brand.");

		assert_eq!(found.brand, "THERMO SCIENTIFIC");
		assert_eq!(found.core, "duran flask");
	}

	#[test]
	fn no_brand_yields_none() {
		assert!(extractor().extract("beaker 250 ml").is_none());
	}

	#[test]
	fn strip_brand_handles_regex_metacharacters() {
		assert_eq!(strip_brand("sigma-aldrich (s.a.) pipette", "(S.A.)").expect("Must strip."), "sigma-aldrich pipette");
	}
}
