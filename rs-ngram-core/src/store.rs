use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::ModelError;
use crate::io::{build_model_path, get_filename, list_files};
use crate::model::ngram_model::NGramModel;
use crate::record::RecordFormat;

/// Whether a stored record could be decoded.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ModelStatus {
	Valid,
	Corrupted { error: String },
}

/// One entry of a models directory listing.
///
/// `vocab_size` and `total_tokens` are `None` for corrupted records.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ModelInfo {
	pub name: String,
	pub filename: String,
	pub size_bytes: u64,
	pub vocab_size: Option<u64>,
	pub total_tokens: Option<u64>,
	#[serde(flatten)]
	pub status: ModelStatus,
}

/// Directory of named model records.
///
/// A model named `all` lives at `<directory>/all.json` or
/// `<directory>/all.bin`; `format` picks the encoding used to save and the
/// file tried first on load.
#[derive(Clone, Debug)]
pub struct ModelStore {
	directory: PathBuf,
	format: RecordFormat,
}

impl ModelStore {
	pub fn new<P: Into<PathBuf>>(directory: P, format: RecordFormat) -> Self {
		Self { directory: directory.into(), format }
	}

	pub fn directory(&self) -> &Path {
		&self.directory
	}

	pub fn format(&self) -> RecordFormat {
		self.format
	}

	/// Path a model named `name` is saved to.
	pub fn model_path(&self, name: &str) -> PathBuf {
		build_model_path(&self.directory, name, self.format.extension())
	}

	/// Finds the stored file for `name`, preferred format first.
	fn resolve(&self, name: &str) -> Option<(PathBuf, RecordFormat)> {
		let others = RecordFormat::ALL.into_iter().filter(|format| *format != self.format);
		std::iter::once(self.format)
			.chain(others)
			.map(|format| (build_model_path(&self.directory, name, format.extension()), format))
			.find(|(path, _)| path.is_file())
	}

	/// Loads the model stored under `name`.
	///
	/// # Errors
	/// - `ModelFileNotFound` if no record exists for `name`.
	/// - `Io` if the file cannot be read.
	/// - `Corrupted` if the bytes are not a model record.
	pub fn load_model(&self, name: &str) -> Result<NGramModel, ModelError> {
		let (path, format) = self.resolve(name).ok_or_else(|| ModelError::ModelFileNotFound(self.model_path(name)))?;
		let model = load_file(&path, format)?;
		info!(
			path = %path.display(),
			vocab_size = model.vocab_size(),
			total_tokens = model.total_tokens(),
			"model loaded"
		);
		Ok(model)
	}

	/// Saves `model` under `name`, creating the directory if needed.
	///
	/// Returns the written path.
	pub fn save_model(&self, model: &NGramModel, name: &str) -> Result<PathBuf, ModelError> {
		fs::create_dir_all(&self.directory).map_err(|e| ModelError::io(&self.directory, e))?;

		let path = self.model_path(name);
		let bytes = self.format.encode(&model.to_record())?;
		fs::write(&path, &bytes).map_err(|e| ModelError::io(&path, e))?;

		info!(path = %path.display(), size_bytes = bytes.len(), vocab_size = model.vocab_size(), "model saved");
		Ok(path)
	}

	/// Lists every record in the directory, sorted by file name.
	///
	/// # Behavior
	/// - A missing directory is created and yields an empty list.
	/// - A record that fails to decode is listed as `Corrupted`; the scan
	///   continues with the next file.
	///
	/// # Errors
	/// Returns an error only if the directory itself cannot be created or read.
	pub fn list_available_models(&self) -> Result<Vec<ModelInfo>, ModelError> {
		if !self.directory.exists() {
			fs::create_dir_all(&self.directory).map_err(|e| ModelError::io(&self.directory, e))?;
			return Ok(Vec::new());
		}

		let extensions: Vec<&str> = RecordFormat::ALL.iter().map(RecordFormat::extension).collect();
		let files = list_files(&self.directory, &extensions).map_err(|e| ModelError::io(&self.directory, e))?;

		let mut models = Vec::with_capacity(files.len());
		for filename in files {
			let path = self.directory.join(&filename);
			let Some(format) = path.extension().and_then(|ext| ext.to_str()).and_then(RecordFormat::from_extension) else {
				continue;
			};
			let name = get_filename(&path).map_err(|e| ModelError::io(&path, e))?;
			let size_bytes = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);

			let info = match load_file(&path, format) {
				Ok(model) => ModelInfo {
					name,
					filename,
					size_bytes,
					vocab_size: Some(model.vocab_size()),
					total_tokens: Some(model.total_tokens()),
					status: ModelStatus::Valid,
				},
				Err(error) => {
					warn!(path = %path.display(), %error, "corrupted model record");
					ModelInfo {
						name,
						filename,
						size_bytes,
						vocab_size: None,
						total_tokens: None,
						status: ModelStatus::Corrupted { error: error.to_string() },
					}
				}
			};
			models.push(info);
		}

		Ok(models)
	}
}

/// Reads and decodes one record file.
fn load_file(path: &Path, format: RecordFormat) -> Result<NGramModel, ModelError> {
	let bytes = fs::read(path).map_err(|e| ModelError::io(path, e))?;
	format
		.decode(&bytes)
		.map_err(|reason| ModelError::Corrupted { path: path.to_path_buf(), reason })
}
