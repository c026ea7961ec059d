use std::{fs, path::Path};

use vox_config::SearchFuzzy;
use vox_domain::{
	Field, Predicate, Product, ScoredProduct, fold::fold_lower, levenshtein,
	normalizer::QueryVariant,
};

use crate::{Error, Result, catalog, models::CatalogStats};

/// Catalog held in memory, loaded from a JSON array of products.
#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
	products: Vec<Product>,
}
impl MemoryCatalog {
	pub fn new(products: Vec<Product>) -> Self {
		let (products, _) = catalog::prepare_import(products);

		Self { products }
	}

	pub fn from_json_file(path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(path)
			.map_err(|err| Error::ReadCatalog { path: path.to_path_buf(), source: err })?;
		let products: Vec<Product> = serde_json::from_str(&raw)
			.map_err(|err| Error::ParseCatalog { path: path.to_path_buf(), source: err })?;
		let catalog = Self::new(products);

		tracing::info!(path = %path.display(), products = catalog.products.len(), "Loaded catalog file.");

		Ok(catalog)
	}

	pub fn products(&self) -> &[Product] {
		&self.products
	}

	pub fn find_matching(&self, predicate: &Predicate) -> Vec<Product> {
		self.products.iter().filter(|product| predicate.matches(product)).cloned().collect()
	}

	/// Same scoring rules as the Postgres full-text query: for every distinct term of
	/// every variant, `weight` on an exact token match, half of it on a fuzzy one.
	/// Ties keep catalog order.
	pub fn text_search(
		&self,
		variants: &[QueryVariant],
		fields: &[Field],
		fuzzy: &SearchFuzzy,
	) -> Vec<ScoredProduct> {
		let queries = variants
			.iter()
			.map(|variant| {
				let allow_fuzzy = variant.text.chars().count() >= fuzzy.min_variant_chars;

				(dedup(tokenize(&variant.text)), variant.weight, allow_fuzzy)
			})
			.collect::<Vec<_>>();
		let mut scored = Vec::new();

		for product in &self.products {
			let text = fields.iter().map(|field| product.field(*field)).collect::<Vec<_>>().join(" ");
			let tokens = tokenize(&text);
			let mut score = 0.0_f32;

			for (terms, weight, allow_fuzzy) in &queries {
				for term in terms {
					if tokens.iter().any(|token| token == term) {
						score += weight;
					} else if *allow_fuzzy
						&& tokens.iter().any(|token| {
							levenshtein::fuzzy_match(
								term,
								token,
								fuzzy.max_edits as usize,
								fuzzy.prefix_length as usize,
							)
						}) {
						score += weight * 0.5;
					}
				}
			}

			if score > 0.0 {
				scored.push(ScoredProduct { product: product.clone(), score: Some(score) });
			}
		}

		scored.sort_by(|a, b| b.score.unwrap_or(0.0).total_cmp(&a.score.unwrap_or(0.0)));

		scored
	}

	pub fn stats(&self) -> CatalogStats {
		let count = |f: fn(&Product) -> &str| {
			self.products.iter().filter(|product| !f(product).trim().is_empty()).count() as i64
		};

		CatalogStats {
			total: self.products.len() as i64,
			with_brand: count(|product| product.brand.as_str()),
			with_designation: count(|product| product.designation.as_str()),
			with_reference: count(|product| product.reference.as_str()),
		}
	}
}

fn tokenize(text: &str) -> Vec<String> {
	fold_lower(text)
		.split(|ch: char| !ch.is_alphanumeric())
		.filter(|token| !token.is_empty())
		.map(str::to_string)
		.collect()
}

fn dedup(tokens: Vec<String>) -> Vec<String> {
	let mut out: Vec<String> = Vec::with_capacity(tokens.len());

	for token in tokens {
		if !out.contains(&token) {
			out.push(token);
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use vox_config::SearchFuzzy;
	use vox_domain::{Field, Predicate, Product, SEARCHABLE_FIELDS, normalizer::QueryVariant};

	use super::MemoryCatalog;

	fn product(reference: &str, designation: &str, brand: &str) -> Product {
		Product {
			reference: reference.to_string(),
			designation: designation.to_string(),
			brand: brand.to_string(),
			..Default::default()
		}
	}

	fn catalog() -> MemoryCatalog {
		MemoryCatalog::new(vec![
			product("A", "Pipette graduée 10 ml", "GILSON"),
			product("B", "Tube verre", "CORNING"),
			product("C", "Tube plastique", "FALCON"),
			product("D", "Pipettes pasteur", "VWR"),
		])
	}

	fn variant(text: &str, weight: f32) -> QueryVariant {
		QueryVariant { text: text.to_string(), weight }
	}

	#[test]
	fn exact_terms_outscore_fuzzy_terms() {
		let results = catalog().text_search(
			&[variant("pipette", 3.0)],
			&SEARCHABLE_FIELDS,
			&SearchFuzzy::default(),
		);
		let refs = results.iter().map(|item| item.product.reference.as_str()).collect::<Vec<_>>();

		assert_eq!(refs, vec!["A", "D"]);
		assert_eq!(results[0].score, Some(3.0));
		assert_eq!(results[1].score, Some(1.5));
	}

	#[test]
	fn short_variants_do_not_fuzzy_match() {
		let fuzzy = SearchFuzzy { min_variant_chars: 3, max_edits: 1, prefix_length: 0 };
		let results = catalog().text_search(&[variant("ml", 1.0)], &SEARCHABLE_FIELDS, &fuzzy);

		assert_eq!(results.len(), 1);

		let results = catalog().text_search(&[variant("mx", 1.0)], &SEARCHABLE_FIELDS, &fuzzy);

		assert!(results.is_empty());
	}

	#[test]
	fn accents_are_ignored_when_scoring() {
		let results = catalog().text_search(
			&[variant("graduee", 2.0)],
			&[Field::Designation],
			&SearchFuzzy::default(),
		);

		assert_eq!(results.len(), 1);
		assert_eq!(results[0].product.reference, "A");
	}

	#[test]
	fn variant_weights_accumulate() {
		let results = catalog().text_search(
			&[variant("tube verre", 3.0), variant("tube", 2.0)],
			&SEARCHABLE_FIELDS,
			&SearchFuzzy::default(),
		);

		assert_eq!(results[0].product.reference, "B");
		assert_eq!(results[0].score, Some(8.0));
		assert_eq!(results[1].score, Some(5.0));
	}

	#[test]
	fn find_matching_preserves_catalog_order() {
		let found = catalog().find_matching(&Predicate::any_field("tube", &SEARCHABLE_FIELDS));

		assert_eq!(found.iter().map(|item| item.reference.as_str()).collect::<Vec<_>>(), vec!["B", "C"]);
	}

	#[test]
	fn stats_count_populated_fields() {
		let stats = catalog().stats();

		assert_eq!(stats.total, 4);
		assert_eq!(stats.with_brand, 4);
		assert_eq!(stats.with_reference, 4);
	}
}
