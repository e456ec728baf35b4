//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	/// A requested bundle, package or image is absent from the loaded data.
	#[error("not found: {0}")]
	NotFound(String),
	/// Backing data is missing, corrupt or unreadable.
	#[error("data unavailable: {0}")]
	DataUnavailable(String),
	#[error("parsing error: {0}")]
	Parse(String),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("sqlite error: {0}")]
	Sqlite(#[from] rusqlite::Error),
	#[error("reqwest error: {0}")]
	Reqwest(#[from] reqwest::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("bincode error: {0}")]
	Bincode(#[from] bincode::Error),
}

/// The two ways a closure computation can fail.
///
/// Unsatisfied requirements are never an error, they are skipped during the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	NotFound,
	DataUnavailable,
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::NotFound(_) => ErrorKind::NotFound,
			Error::DataUnavailable(_)
			| Error::Parse(_)
			| Error::IO(_)
			| Error::Sqlite(_)
			| Error::Reqwest(_)
			| Error::SerdeJSON(_)
			| Error::Bincode(_) => ErrorKind::DataUnavailable,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn io_errors_are_data_unavailable() {
		let e: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
		assert_eq!(e.kind(), ErrorKind::DataUnavailable);
	}

	#[test]
	fn not_found_keeps_its_kind() {
		assert_eq!(Error::NotFound("os-core".into()).kind(), ErrorKind::NotFound);
		assert_eq!(Error::Parse("bad".into()).kind(), ErrorKind::DataUnavailable);
	}
}
