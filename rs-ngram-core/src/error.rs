use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by model persistence and the model store.
///
/// An empty prediction list is never an error; these variants only cover
/// hard failures that a caller must see.
#[derive(Error, Debug)]
pub enum ModelError {
	#[error("Model file not found: {}", .0.display())]
	ModelFileNotFound(PathBuf),
	#[error("I/O error on {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("Corrupted model record {}: {reason}", path.display())]
	Corrupted { path: PathBuf, reason: String },
	#[error("Failed to encode model record: {0}")]
	Encode(String),
	#[error("Unsupported n-gram order: {0} (expected 1, 2 or 3)")]
	InvalidOrder(usize),
}

impl ModelError {
	pub(crate) fn io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
		Self::Io { path: path.into(), source }
	}
}
