#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Already exists: {0}")]
	AlreadyExists(String),
	#[error("Store returned status {status}: {message}")]
	Upstream { status: u16, message: String },
}
impl Error {
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound(_))
	}

	pub fn is_already_exists(&self) -> bool {
		matches!(self, Self::AlreadyExists(_))
	}
}
