pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Upstream error: {message}")]
	Upstream { message: String },
	#[error("Embedding unavailable: {message}")]
	EmbeddingUnavailable { message: String },
	#[error("Embedding dimension mismatch: expected {expected}, got {actual}.")]
	DimensionMismatch { expected: usize, actual: usize },
	#[error("Relevance source error: {message}")]
	Relevance { message: String },
}
impl Error {
	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into() }
	}
}

impl From<mosaic_storage::Error> for Error {
	fn from(err: mosaic_storage::Error) -> Self {
		match err {
			mosaic_storage::Error::NotFound(message) => Self::NotFound { message },
			mosaic_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			other => Self::Upstream { message: other.to_string() },
		}
	}
}
