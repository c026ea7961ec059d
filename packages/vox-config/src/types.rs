use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	#[serde(default)]
	pub storage: Storage,
	pub catalog: Catalog,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub lexicon: LexiconSource,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Storage {
	pub postgres: Option<Postgres>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	#[serde(default = "default_pool_min_conns")]
	pub pool_min_conns: u32,
	/// Upper bound for establishing a connection or acquiring one from the pool.
	#[serde(default = "default_acquire_timeout_ms")]
	pub acquire_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Catalog {
	/// Either "postgres" or "json".
	pub backend: String,
	/// Required when `backend` is "json". A JSON array of products.
	pub json_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	/// Result counts up to this value are answered directly.
	#[serde(default = "default_max_direct_results")]
	pub max_direct_results: usize,
	/// Keywords shorter than this are dropped by the substring tiers.
	#[serde(default = "default_min_keyword_chars")]
	pub min_keyword_chars: usize,
	#[serde(default)]
	pub fuzzy: SearchFuzzy,
	#[serde(default)]
	pub recommendations: SearchRecommendations,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			max_direct_results: default_max_direct_results(),
			min_keyword_chars: default_min_keyword_chars(),
			fuzzy: SearchFuzzy::default(),
			recommendations: SearchRecommendations::default(),
		}
	}
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SearchFuzzy {
	#[serde(default = "default_fuzzy_min_variant_chars")]
	pub min_variant_chars: usize,
	#[serde(default = "default_fuzzy_max_edits")]
	pub max_edits: u32,
	#[serde(default = "default_fuzzy_prefix_length")]
	pub prefix_length: u32,
}
impl Default for SearchFuzzy {
	fn default() -> Self {
		Self {
			min_variant_chars: default_fuzzy_min_variant_chars(),
			max_edits: default_fuzzy_max_edits(),
			prefix_length: default_fuzzy_prefix_length(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRecommendations {
	#[serde(default = "default_recommendation_count")]
	pub count: usize,
	/// Either "first" or "random".
	#[serde(default = "default_recommendation_mode")]
	pub mode: String,
	pub seed: Option<u64>,
}
impl Default for SearchRecommendations {
	fn default() -> Self {
		Self {
			count: default_recommendation_count(),
			mode: default_recommendation_mode(),
			seed: None,
		}
	}
}

#[derive(Debug, Default, Deserialize)]
pub struct LexiconSource {
	/// Optional. The built-in lexicon is used when unset.
	pub path: Option<PathBuf>,
}

fn default_pool_min_conns() -> u32 {
	2
}

fn default_acquire_timeout_ms() -> u64 {
	5_000
}

fn default_max_direct_results() -> usize {
	5
}

fn default_min_keyword_chars() -> usize {
	3
}

fn default_fuzzy_min_variant_chars() -> usize {
	3
}

fn default_fuzzy_max_edits() -> u32 {
	1
}

fn default_fuzzy_prefix_length() -> u32 {
	2
}

fn default_recommendation_count() -> usize {
	5
}

fn default_recommendation_mode() -> String {
	"first".to_string()
}
