pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Query is empty.")]
	EmptyQuery,
	#[error("Invalid lexicon pattern {pattern:?}.")]
	InvalidPattern { pattern: String, source: regex::Error },
}
