use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use rs_ngram_core::{ModelStatus, ModelStore, PredictionMethod, RecordFormat, Trainer};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rs-ngram")]
#[command(version)]
#[command(about = "Train and query word n-gram next-word predictors", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Train a model from line-based text files and save it
	Train {
		/// Corpus files, one sample per non-blank line
		#[arg(required = true)]
		files: Vec<PathBuf>,

		/// Name the model is saved under
		#[arg(short, long)]
		name: String,

		#[arg(long, default_value = "./trained_models")]
		models_dir: PathBuf,

		/// Record encoding (json or binary)
		#[arg(long, default_value = "json")]
		format: RecordFormat,

		/// Counting threads (defaults to the number of CPUs)
		#[arg(short, long)]
		workers: Option<usize>,
	},
	/// Print next-word suggestions for a context
	Predict {
		/// Stored model name
		name: String,

		/// Preceding text; only its last two words matter
		context: String,

		#[arg(short = 'k', long, default_value_t = 5)]
		top_k: usize,

		/// backoff or interpolation
		#[arg(short, long, default_value = "backoff")]
		method: PredictionMethod,

		#[arg(long, default_value = "./trained_models")]
		models_dir: PathBuf,
	},
	/// List stored models and whether they decode
	List {
		#[arg(long, default_value = "./trained_models")]
		models_dir: PathBuf,
	},
}

fn main() -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_writer(std::io::stderr)
		.init();

	match Cli::parse().command {
		Command::Train { files, name, models_dir, format, workers } => {
			let trainer = workers.map(Trainer::new).unwrap_or_default();
			let report = trainer.train_from_files(&files);
			for skipped in &report.skipped {
				eprintln!("skipped {}: {}", skipped.path.display(), skipped.error);
			}
			if !report.model.is_trained() {
				bail!("no usable text in {} file(s), nothing saved", files.len());
			}

			let path = ModelStore::new(models_dir, format).save_model(&report.model, &name)?;
			println!(
				"{name}: {} samples, vocab {}, {} tokens -> {}",
				report.samples,
				report.model.vocab_size(),
				report.model.total_tokens(),
				path.display()
			);
		}
		Command::Predict { name, context, top_k, method, models_dir } => {
			let model = ModelStore::new(models_dir, RecordFormat::default()).load_model(&name)?;
			for (rank, word) in model.predict(method, &context, top_k).iter().enumerate() {
				println!("{}. {word}", rank + 1);
			}
		}
		Command::List { models_dir } => {
			let models = ModelStore::new(models_dir, RecordFormat::default()).list_available_models()?;
			if models.is_empty() {
				println!("no models");
			}
			for info in models {
				match info.status {
					ModelStatus::Valid => println!(
						"{:<20} {:>10} bytes  vocab {:>8}  tokens {:>10}",
						info.filename,
						info.size_bytes,
						info.vocab_size.unwrap_or(0),
						info.total_tokens.unwrap_or(0)
					),
					ModelStatus::Corrupted { error } => {
						println!("{:<20} {:>10} bytes  corrupted: {error}", info.filename, info.size_bytes)
					}
				}
			}
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn parses_train_arguments() {
		let cli = Cli::try_parse_from(["rs-ngram", "train", "a.txt", "b.txt", "--name", "all", "--format", "binary", "-w", "2"])
			.unwrap();
		match cli.command {
			Command::Train { files, name, format, workers, .. } => {
				assert_eq!(files.len(), 2);
				assert_eq!(name, "all");
				assert_eq!(format, RecordFormat::Binary);
				assert_eq!(workers, Some(2));
			}
			other => panic!("unexpected command {other:?}"),
		}
	}

	#[test]
	fn rejects_unknown_method() {
		assert!(Cli::try_parse_from(["rs-ngram", "predict", "all", "I am", "--method", "random"]).is_err());
	}
}
