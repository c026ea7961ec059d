//! Candidate search: tiers from tightest to loosest, stopping at the first one that
//! returns anything. Results are never truncated.

use serde::{Deserialize, Serialize};

use vox_config::SearchFuzzy;
use vox_domain::{
	Field, Predicate, Product, SEARCHABLE_FIELDS, ScoredProduct, normalizer::QueryVariant,
	predicate::contains_ignore_case,
};

use crate::{CatalogStore, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
	/// Every keyword in some searchable field.
	Strict,
	/// Any keyword in some searchable field.
	Relaxed,
	/// The first keyword in some searchable field.
	SingleKeyword,
	/// Boosted-OR relevance over the query variants.
	FullText,
}
impl Tier {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Strict => "strict",
			Self::Relaxed => "relaxed",
			Self::SingleKeyword => "single_keyword",
			Self::FullText => "full_text",
		}
	}
}

pub struct CascadeInput<'a> {
	pub keywords: &'a [String],
	pub brand: Option<&'a str>,
	pub variants: &'a [QueryVariant],
	pub fuzzy: &'a SearchFuzzy,
}

#[derive(Debug, Default)]
pub struct CascadeOutcome {
	/// Tier that produced the results. `None` when every tier came back empty.
	pub tier: Option<Tier>,
	pub results: Vec<ScoredProduct>,
}

/// Tiers to try for `keyword_count` keywords, in order.
///
/// Without keywords nothing runs and the outcome is empty. With a single keyword the
/// relaxed and single-keyword predicates are identical to the strict one, so only
/// strict and full-text run.
pub fn plan(keyword_count: usize) -> Vec<Tier> {
	match keyword_count {
		0 => Vec::new(),
		1 => vec![Tier::Strict, Tier::FullText],
		_ => vec![Tier::Strict, Tier::Relaxed, Tier::SingleKeyword, Tier::FullText],
	}
}

pub async fn run(store: &dyn CatalogStore, input: CascadeInput<'_>) -> Result<CascadeOutcome> {
	for tier in plan(input.keywords.len()) {
		let results = run_tier(store, tier, &input).await.inspect_err(|err| {
			tracing::warn!(tier = tier.as_str(), error = %err, "Catalog tier failed.");
		})?;

		tracing::debug!(tier = tier.as_str(), count = results.len(), "Catalog tier finished.");

		if !results.is_empty() {
			return Ok(CascadeOutcome { tier: Some(tier), results });
		}
	}

	Ok(CascadeOutcome::default())
}

async fn run_tier(
	store: &dyn CatalogStore,
	tier: Tier,
	input: &CascadeInput<'_>,
) -> vox_storage::Result<Vec<ScoredProduct>> {
	let predicate = match tier {
		Tier::Strict => Predicate::all_keywords(input.keywords, &SEARCHABLE_FIELDS),
		Tier::Relaxed => Predicate::any_keyword(input.keywords, &SEARCHABLE_FIELDS),
		Tier::SingleKeyword => Predicate::all_keywords(&input.keywords[..1], &SEARCHABLE_FIELDS),
		Tier::FullText => {
			let scored = store.text_search(input.variants, &SEARCHABLE_FIELDS, input.fuzzy).await?;

			return Ok(scored
				.into_iter()
				.filter(|item| brand_matches(&item.product, input.brand))
				.collect());
		},
	};
	let predicate = predicate.and_maybe(brand_predicate(input.brand));
	let products = store.find_matching(&predicate).await?;

	Ok(products.into_iter().map(ScoredProduct::from).collect())
}

fn brand_predicate(brand: Option<&str>) -> Option<Predicate> {
	brand.map(|brand| Predicate::Contains(Field::Brand, brand.to_string()))
}

fn brand_matches(product: &Product, brand: Option<&str>) -> bool {
	brand.map(|brand| contains_ignore_case(&product.brand, brand)).unwrap_or(true)
}

#[cfg(test)]
mod tests {
	use super::{Tier, plan};

	#[test]
	fn single_keyword_plan_skips_duplicate_tiers() {
		assert_eq!(plan(1), vec![Tier::Strict, Tier::FullText]);
	}

	#[test]
	fn multi_keyword_plan_runs_every_tier_in_order() {
		assert_eq!(
			plan(3),
			vec![Tier::Strict, Tier::Relaxed, Tier::SingleKeyword, Tier::FullText]
		);
	}

	#[test]
	fn no_keywords_runs_no_tier() {
		assert!(plan(0).is_empty());
	}
}
