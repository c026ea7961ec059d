mod error;
mod lexicon;
mod types;

pub use error::{Error, Result};
pub use lexicon::{
	ExpansionRule, Lexicon, MaterialRule, PhraseRule, load_lexicon, resolve_lexicon,
	validate_lexicon,
};
pub use types::{
	Catalog, Config, LexiconSource, Postgres, Search, SearchFuzzy, SearchRecommendations, Service,
	Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	match cfg.catalog.backend.as_str() {
		"postgres" => {
			let Some(postgres) = cfg.storage.postgres.as_ref() else {
				return Err(Error::Validation {
					message: "storage.postgres is required when catalog.backend is postgres."
						.to_string(),
				});
			};

			validate_postgres(postgres)?;
		},
		"json" =>
			if cfg.catalog.json_path.is_none() {
				return Err(Error::Validation {
					message: "catalog.json_path is required when catalog.backend is json."
						.to_string(),
				});
			},
		_ => {
			return Err(Error::Validation {
				message: "catalog.backend must be one of postgres or json.".to_string(),
			});
		},
	}

	if cfg.search.max_direct_results == 0 {
		return Err(Error::Validation {
			message: "search.max_direct_results must be greater than zero.".to_string(),
		});
	}
	if cfg.search.min_keyword_chars == 0 {
		return Err(Error::Validation {
			message: "search.min_keyword_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.search.fuzzy.min_variant_chars == 0 {
		return Err(Error::Validation {
			message: "search.fuzzy.min_variant_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.search.fuzzy.max_edits > 2 {
		return Err(Error::Validation {
			message: "search.fuzzy.max_edits must be in the range 0-2.".to_string(),
		});
	}

	let mode = cfg.search.recommendations.mode.as_str();

	if !matches!(mode, "first" | "random") {
		return Err(Error::Validation {
			message: "search.recommendations.mode must be one of first or random.".to_string(),
		});
	}
	if cfg.search.recommendations.count == 0 {
		return Err(Error::Validation {
			message: "search.recommendations.count must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_postgres(postgres: &Postgres) -> Result<()> {
	if postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if postgres.pool_min_conns > postgres.pool_max_conns {
		return Err(Error::Validation {
			message: "storage.postgres.pool_min_conns must not exceed pool_max_conns.".to_string(),
		});
	}
	if postgres.acquire_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.acquire_timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.catalog.backend = cfg.catalog.backend.trim().to_ascii_lowercase();
	cfg.search.recommendations.mode = cfg.search.recommendations.mode.trim().to_ascii_lowercase();

	if cfg.catalog.json_path.as_deref().map(|path| path.as_os_str().is_empty()).unwrap_or(false) {
		cfg.catalog.json_path = None;
	}
	if cfg.lexicon.path.as_deref().map(|path| path.as_os_str().is_empty()).unwrap_or(false) {
		cfg.lexicon.path = None;
	}
}
