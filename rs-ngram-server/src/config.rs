use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rs_ngram_core::{PredictionMethod, RecordFormat};
use serde::Deserialize;

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "RS_NGRAM_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "rs-ngram.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
	#[serde(default)]
	pub server: ServerConfig,
	#[serde(default)]
	pub models: ModelsConfig,
	#[serde(default)]
	pub predict: PredictConfig,
}

impl AppConfig {
	/// Reads the TOML configuration if one exists, defaults otherwise.
	pub fn load() -> Result<Self> {
		let config_path = resolve_config_path();
		if config_path.exists() {
			return Self::from_file(&config_path);
		}
		Ok(AppConfig::default())
	}

	pub fn from_file(path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(path).with_context(|| format!("failed to read config file {}", path.display()))?;
		toml::from_str(&raw).with_context(|| format!("failed to parse TOML from {}", path.display()))
	}
}

fn resolve_config_path() -> PathBuf {
	match env::var(CONFIG_ENV) {
		Ok(path) => PathBuf::from(path),
		Err(_) => PathBuf::from(DEFAULT_CONFIG_FILE),
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self { host: "127.0.0.1".to_owned(), port: 5000 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
	/// Folder holding `<name>.json` / `<name>.bin` records.
	pub directory: PathBuf,
	/// Logical model loaded at startup.
	pub default: String,
	pub format: RecordFormat,
	/// Logical model name → record file stem.
	pub aliases: BTreeMap<String, String>,
}

impl ModelsConfig {
	/// Resolves a logical model name to its file stem.
	pub fn file_stem(&self, name: &str) -> Option<&str> {
		self.aliases.get(name).map(String::as_str)
	}
}

impl Default for ModelsConfig {
	fn default() -> Self {
		let aliases = [("all", "all"), ("casual", "cas-en"), ("formal", "std-en"), ("poetic", "poet-en")]
			.into_iter()
			.map(|(name, stem)| (name.to_owned(), stem.to_owned()))
			.collect();
		Self {
			directory: PathBuf::from("./trained_models"),
			default: "all".to_owned(),
			format: RecordFormat::Json,
			aliases,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictConfig {
	pub default_method: PredictionMethod,
	pub default_top_k: usize,
	pub max_top_k: usize,
}

impl PredictConfig {
	/// Clamps a requested `top_k` into `1..=max_top_k`, using the default
	/// when none is given.
	pub fn clamp_top_k(&self, requested: Option<usize>) -> usize {
		requested.unwrap_or(self.default_top_k).clamp(1, self.max_top_k.max(1))
	}
}

impl Default for PredictConfig {
	fn default() -> Self {
		Self { default_method: PredictionMethod::Backoff, default_top_k: 5, max_top_k: 50 }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_file_keeps_defaults() {
		let config: AppConfig = toml::from_str(
			r#"
			[server]
			port = 8000

			[models]
			format = "binary"

			[predict]
			default_method = "interpolation"
			"#,
		)
		.unwrap();

		assert_eq!(config.server.host, "127.0.0.1");
		assert_eq!(config.server.port, 8000);
		assert_eq!(config.models.format, RecordFormat::Binary);
		assert_eq!(config.models.file_stem("formal"), Some("std-en"));
		assert_eq!(config.predict.default_method, PredictionMethod::Interpolation);
		assert_eq!(config.predict.max_top_k, 50);
	}

	#[test]
	fn custom_aliases_replace_defaults() {
		let config: AppConfig = toml::from_str(
			r#"
			[models.aliases]
			news = "news-en"
			"#,
		)
		.unwrap();
		assert_eq!(config.models.file_stem("news"), Some("news-en"));
		assert_eq!(config.models.file_stem("all"), None);
	}

	#[test]
	fn top_k_is_clamped() {
		let predict = PredictConfig::default();
		assert_eq!(predict.clamp_top_k(None), 5);
		assert_eq!(predict.clamp_top_k(Some(0)), 1);
		assert_eq!(predict.clamp_top_k(Some(500)), 50);
		assert_eq!(predict.clamp_top_k(Some(3)), 3);
	}

	#[test]
	fn from_file_reports_parse_errors() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("broken.toml");
		fs::write(&path, "[server\nport = ").unwrap();
		assert!(AppConfig::from_file(&path).is_err());
	}
}
