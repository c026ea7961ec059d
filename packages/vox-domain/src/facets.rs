use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use vox_config::Lexicon;

use crate::{error::Result, fold::fold_lower, normalizer::compile_ci, product::Product};

/// Dimension a result set can be narrowed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKind {
	Brand,
	Category,
	SubCategory,
	Material,
}
impl FacetKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Brand => "brand",
			Self::Category => "category",
			Self::SubCategory => "sub_category",
			Self::Material => "material",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
	pub value: String,
	pub count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
	pub brands: Vec<FacetCount>,
	pub categories: Vec<FacetCount>,
	pub sub_categories: Vec<FacetCount>,
	pub materials: Vec<FacetCount>,
}
impl Facets {
	pub fn build(products: &[Product], materials: &MaterialMatcher) -> Self {
		Self {
			brands: count_values(products.iter().map(|product| product.brand.as_str())),
			categories: count_values(products.iter().map(|product| product.category.as_str())),
			sub_categories: count_values(
				products.iter().map(|product| product.sub_category_1.as_str()),
			),
			materials: count_values(
				products.iter().flat_map(|product| materials.materials_of(product)),
			),
		}
	}

	pub fn get(&self, kind: FacetKind) -> &[FacetCount] {
		match kind {
			FacetKind::Brand => &self.brands,
			FacetKind::Category => &self.categories,
			FacetKind::SubCategory => &self.sub_categories,
			FacetKind::Material => &self.materials,
		}
	}

	/// First facet with at least two distinct values. Brand is skipped when the
	/// query already names one.
	pub fn suggest(&self, brand_known: bool) -> Option<FacetKind> {
		[FacetKind::Brand, FacetKind::Category, FacetKind::SubCategory, FacetKind::Material]
			.into_iter()
			.filter(|kind| !(brand_known && *kind == FacetKind::Brand))
			.find(|kind| self.get(*kind).len() >= 2)
	}
}

/// Infers material labels from product text.
#[derive(Debug)]
pub struct MaterialMatcher {
	rules: Vec<(String, Vec<Regex>)>,
}
impl MaterialMatcher {
	pub fn new(lexicon: &Lexicon) -> Result<Self> {
		let mut rules = Vec::with_capacity(lexicon.materials.len());

		for rule in &lexicon.materials {
			let mut patterns = Vec::with_capacity(rule.keywords.len());

			for keyword in &rule.keywords {
				patterns.push(compile_ci(&format!(r"\b{}\b", regex::escape(&fold_lower(keyword))))?);
			}

			rules.push((rule.label.clone(), patterns));
		}

		Ok(Self { rules })
	}

	/// Labels whose keywords occur as whole words in the folded designation or
	/// description. Each label appears at most once.
	pub fn materials_of(&self, product: &Product) -> Vec<&str> {
		let text = fold_lower(&format!("{} {}", product.designation, product.description));

		self.rules
			.iter()
			.filter(|(_, patterns)| patterns.iter().any(|pattern| pattern.is_match(&text)))
			.map(|(label, _)| label.as_str())
			.collect()
	}

	pub fn has_material(&self, product: &Product, value: &str) -> bool {
		let wanted = fold_lower(value.trim());

		!wanted.is_empty()
			&& self.materials_of(product).iter().any(|label| fold_lower(label).contains(&wanted))
	}
}

/// Counts non-blank values, sorted by count descending. Ties keep first-seen order.
pub fn count_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<FacetCount> {
	let mut out: Vec<FacetCount> = Vec::new();
	let mut positions: HashMap<&'a str, usize> = HashMap::new();

	for value in values {
		let value = value.trim();

		if value.is_empty() {
			continue;
		}

		match positions.get(value) {
			Some(&idx) => out[idx].count += 1,
			None => {
				positions.insert(value, out.len());
				out.push(FacetCount { value: value.to_string(), count: 1 });
			},
		}
	}

	out.sort_by(|a, b| b.count.cmp(&a.count));

	out
}

#[cfg(test)]
mod tests {
	use vox_config::Lexicon;

	use crate::{
		facets::{FacetKind, Facets, MaterialMatcher, count_values},
		product::Product,
	};

	fn matcher() -> MaterialMatcher {
		let lexicon = Lexicon::builtin().expect("Built-in lexicon must parse.");

		MaterialMatcher::new(&lexicon).expect("Built-in lexicon must compile.")
	}

	fn product(designation: &str, brand: &str, category: &str) -> Product {
		Product {
			reference: designation.to_string(),
			designation: designation.to_string(),
			brand: brand.to_string(),
			category: category.to_string(),
			..Default::default()
		}
	}

	#[test]
	fn counts_sort_descending_with_first_seen_ties() {
		let counts = count_values(["b", "a", "a", "c", "b", "", "  "]);
		let values = counts.iter().map(|entry| (entry.value.as_str(), entry.count)).collect::<Vec<_>>();

		assert_eq!(values, vec![("b", 2), ("a", 2), ("c", 1)]);
	}

	#[test]
	fn materials_match_whole_folded_words() {
		let matcher = matcher();

		assert_eq!(matcher.materials_of(&product("Tube en VERRE borosilicaté", "", "")), vec!["verre"]);
		assert!(matcher.materials_of(&product("Verrerie diverse", "", "")).is_empty());
		assert!(matcher.has_material(&product("Gants nitrile", "", ""), "Nitrile"));
	}

	#[test]
	fn counts_many_distinct_values() {
		let values = (0..6_000).map(|idx| format!("brand-{}", idx % 2_000)).collect::<Vec<_>>();
		let mut values = values.iter().map(String::as_str).collect::<Vec<_>>();

		values.push(" brand-1999 ");

		let counts = count_values(values);

		assert_eq!(counts.len(), 2_000);
		assert_eq!(counts[0].value, "brand-1999");
		assert_eq!(counts[0].count, 4);
		assert_eq!(counts[1].value, "brand-0");
		assert_eq!(counts[1999].value, "brand-1998");
		assert!(counts[1..].iter().all(|entry| entry.count == 3));
	}

	#[test]
	fn facet_counts_never_exceed_result_count() {
		let products = vec![
			product("Tube verre", "CORNING", "Verrerie"),
			product("Tube plastique", "DURAN", "Plastique"),
			product("Becher verre", "CORNING", "Verrerie"),
		];
		let facets = Facets::build(&products, &matcher());

		for kind in [FacetKind::Brand, FacetKind::Category, FacetKind::Material] {
			assert!(facets.get(kind).iter().all(|entry| entry.count <= products.len()));
		}

		assert_eq!(facets.brands[0].value, "CORNING");
		assert_eq!(facets.brands[0].count, 2);
	}

	#[test]
	fn suggestion_skips_brand_when_known() {
		let products = vec![
			product("Tube verre", "CORNING", "Verrerie"),
			product("Tube plastique", "DURAN", "Plastique"),
		];
		let facets = Facets::build(&products, &matcher());

		assert_eq!(facets.suggest(false), Some(FacetKind::Brand));
		assert_eq!(facets.suggest(true), Some(FacetKind::Category));
	}
}
