pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Query is empty.")]
	EmptyQuery,
	#[error("Catalog unavailable: {message}")]
	CatalogUnavailable { message: String },
	#[error("Search index misconfigured: {message}")]
	IndexMisconfigured { message: String },
	#[error("Search failed: {message}")]
	Search { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Invalid configuration: {message}")]
	Configuration { message: String },
}
impl From<vox_storage::Error> for Error {
	fn from(err: vox_storage::Error) -> Self {
		match err {
			vox_storage::Error::Unavailable { message } => Self::CatalogUnavailable { message },
			vox_storage::Error::IndexMisconfigured { message } => Self::IndexMisconfigured { message },
			vox_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			other => Self::Search { message: other.to_string() },
		}
	}
}

impl From<vox_domain::Error> for Error {
	fn from(err: vox_domain::Error) -> Self {
		match err {
			vox_domain::Error::EmptyQuery => Self::EmptyQuery,
			other => Self::Configuration { message: other.to_string() },
		}
	}
}
