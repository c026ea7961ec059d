use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(sqlx::Error),
	#[error("Catalog store is unavailable: {message}")]
	Unavailable { message: String },
	#[error("Full-text search is not configured: {message}")]
	IndexMisconfigured { message: String },
	#[error("Failed to read catalog file at {path:?}.")]
	ReadCatalog { path: PathBuf, source: std::io::Error },
	#[error("Failed to parse catalog file at {path:?}.")]
	ParseCatalog { path: PathBuf, source: serde_json::Error },
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
}
impl Error {
	/// Reclassifies errors raised by the full-text query. Missing functions and missing
	/// text search objects mean the required extensions were never installed.
	pub(crate) fn from_text_search(err: sqlx::Error) -> Self {
		if let sqlx::Error::Database(db_err) = &err
			&& matches!(db_err.code().as_deref(), Some("42883" | "42704"))
		{
			return Self::IndexMisconfigured { message: db_err.message().to_string() };
		}

		Self::from(err)
	}
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		match err {
			sqlx::Error::PoolTimedOut
			| sqlx::Error::PoolClosed
			| sqlx::Error::Io(_)
			| sqlx::Error::Tls(_) => Self::Unavailable { message: err.to_string() },
			err => Self::Sqlx(err),
		}
	}
}
