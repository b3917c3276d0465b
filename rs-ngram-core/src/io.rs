use std::path::{Path, PathBuf};
use std::{fs, io};

/// Reads a text file and returns its non-blank lines, trimmed.
///
/// - Reads the entire file into memory
/// - Invalid UTF-8 sequences are replaced rather than rejected
/// - Splits on `\n` / `\r\n`
pub fn read_lines<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let bytes = fs::read(filename)?;
	let contents = String::from_utf8_lossy(&bytes);
	Ok(contents
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.map(str::to_owned)
		.collect())
}

/// Builds the path of a named file inside a folder.
///
/// The extension is appended, never substituted, so dots inside `name`
/// are kept.
///
/// Examples:
/// - `trained_models` + `"all"` + `"json"` → `trained_models/all.json`
/// - `trained_models` + `"news.v2"` + `"bin"` → `trained_models/news.v2.bin`
pub fn build_model_path<P: AsRef<Path>>(folder: P, name: &str, extension: &str) -> PathBuf {
	folder.as_ref().join(format!("{name}.{extension}"))
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./trained_models/all.json"` → `"all"`
/// - `"all.bin"` → `"all"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Lists all files whose extension is one of `extensions` in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extensions: &[&str]) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();

		if !path.is_file() {
			continue;
		}
		let matches = path
			.extension()
			.and_then(|ext| ext.to_str())
			.is_some_and(|ext| extensions.contains(&ext));
		if matches {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}
