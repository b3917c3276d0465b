use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use tracing::{info, warn};

use super::ngram_model::NGramModel;
use super::ngram_table::{NGramTable, UnigramTable, count_ngrams, unigram_table};
use super::tokenizer::tokenize;
use crate::io::read_lines;

/// A corpus file that could not be read during ingestion.
#[derive(Debug)]
pub struct SkippedFile {
	pub path: PathBuf,
	pub error: io::Error,
}

/// Outcome of `Trainer::train_from_files`.
///
/// Unreadable files do not abort ingestion; they are listed in `skipped`.
#[derive(Debug)]
pub struct TrainingReport {
	/// The trained model, untrained if no sample was collected.
	pub model: NGramModel,
	/// Number of non-blank lines collected across readable files.
	pub samples: usize,
	pub skipped: Vec<SkippedFile>,
}

/// Batch trainer building a complete `NGramModel` in one call.
///
/// # Behavior
/// - Every sample is tokenized with sentence markers.
/// - Samples are split into one chunk per worker; each chunk is counted on
///   its own thread and the partial tables are merged.
/// - Since no n-gram crosses a sample boundary, the merged tables are
///   identical to a sequential count over the concatenated stream.
///
/// The call is synchronous: it returns once the model is complete.
#[derive(Clone, Debug)]
pub struct Trainer {
	workers: usize,
}

impl Default for Trainer {
	/// One worker per logical CPU.
	fn default() -> Self {
		Self::new(num_cpus::get())
	}
}

impl Trainer {
	/// Creates a trainer using `workers` threads (at least one).
	pub fn new(workers: usize) -> Self {
		Self { workers: workers.max(1) }
	}

	pub fn workers(&self) -> usize {
		self.workers
	}

	/// Trains a new model from in-memory samples.
	///
	/// # Returns
	/// - A trained model whose tables, `vocab_size` and `total_tokens`
	///   reflect the whole corpus.
	/// - An untrained, empty model if `corpus` is empty or contains no
	///   tokens at all.
	pub fn train<S: AsRef<str> + Sync>(&self, corpus: &[S]) -> NGramModel {
		if corpus.is_empty() {
			return NGramModel::default();
		}

		let tables = if self.workers == 1 || corpus.len() < self.workers * 2 {
			Tables::count(corpus)
		} else {
			self.count_parallel(corpus)
		};

		if tables.unigrams.is_empty() {
			return NGramModel::default();
		}

		let model = NGramModel::from_tables(tables.trigrams, tables.bigrams, tables.unigrams, None, None);
		info!(
			samples = corpus.len(),
			vocab_size = model.vocab_size(),
			total_tokens = model.total_tokens(),
			"n-gram model trained"
		);
		model
	}

	/// Trains a new model from line-based text files.
	///
	/// Each non-blank line is one sample. A file that cannot be read is
	/// logged, recorded in the report and skipped; the remaining files are
	/// still ingested.
	pub fn train_from_files<P: AsRef<Path>>(&self, paths: &[P]) -> TrainingReport {
		let mut corpus = Vec::new();
		let mut skipped = Vec::new();

		for path in paths {
			let path = path.as_ref();
			match read_lines(path) {
				Ok(lines) => corpus.extend(lines),
				Err(error) => {
					warn!(path = %path.display(), %error, "skipping unreadable corpus file");
					skipped.push(SkippedFile { path: path.to_path_buf(), error });
				}
			}
		}

		if corpus.is_empty() {
			warn!(files = paths.len(), "no training samples found");
		}

		TrainingReport { samples: corpus.len(), model: self.train(&corpus), skipped }
	}

	/// Counts chunks on scoped worker threads and merges the partial tables.
	fn count_parallel<S: AsRef<str> + Sync>(&self, corpus: &[S]) -> Tables {
		let chunk_size = corpus.len().div_ceil(self.workers);

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for chunk in corpus.chunks(chunk_size) {
				let tx = tx.clone();
				scope.spawn(move || {
					// The receiver outlives the scope, sending cannot fail
					let _ = tx.send(Tables::count(chunk));
				});
			}
		});
		drop(tx);

		let mut tables = Tables::default();
		for partial in rx.iter() {
			tables.absorb(partial);
		}
		tables
	}
}

impl NGramModel {
	/// Trains a new model from in-memory samples with the default trainer.
	pub fn train<S: AsRef<str> + Sync>(corpus: &[S]) -> Self {
		Trainer::default().train(corpus)
	}

	/// Trains a new model from corpus files with the default trainer.
	pub fn train_from_files<P: AsRef<Path>>(paths: &[P]) -> TrainingReport {
		Trainer::default().train_from_files(paths)
	}
}

/// The three frequency tables of a (partial) corpus.
struct Tables {
	trigrams: NGramTable,
	bigrams: NGramTable,
	unigrams: UnigramTable,
}

impl Default for Tables {
	fn default() -> Self {
		Self { trigrams: NGramTable::trigrams(), bigrams: NGramTable::bigrams(), unigrams: UnigramTable::new() }
	}
}

impl Tables {
	fn count<S: AsRef<str>>(samples: &[S]) -> Self {
		let stream: Vec<String> = samples.iter().flat_map(|sample| tokenize(sample.as_ref(), true)).collect();

		Self {
			trigrams: NGramTable::trigrams().with_counts(&count_ngrams(&stream, 3)),
			bigrams: NGramTable::bigrams().with_counts(&count_ngrams(&stream, 2)),
			unigrams: unigram_table(&count_ngrams(&stream, 1)),
		}
	}

	fn absorb(&mut self, other: Self) {
		self.trigrams.absorb(other.trigrams);
		self.bigrams.absorb(other.bigrams);
		for (token, count) in other.unigrams {
			*self.unigrams.entry(token).or_insert(0) += count;
		}
	}
}
