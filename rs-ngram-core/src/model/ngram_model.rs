use super::ngram_table::{NGramTable, UnigramTable};

/// A trained word n-gram model.
///
/// This struct holds:
/// - `trigrams`: `(w1, w2)` → continuation counts
/// - `bigrams`: `(w1,)` → continuation counts
/// - `unigrams`: token → count, sentence markers included
/// - `vocab_size` and `total_tokens`, derived from `unigrams`
///
/// # Lifecycle
/// A model is either empty and untrained (`NGramModel::default()`) or a
/// fully trained snapshot produced by the `Trainer` or loaded from a
/// record. It is never mutated afterwards: retraining or reloading builds
/// a new instance, which callers swap in through a `ModelHolder`. Prediction
/// only reads, so one snapshot can be shared freely between threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NGramModel {
	trigrams: NGramTable,
	bigrams: NGramTable,
	unigrams: UnigramTable,
	vocab_size: u64,
	total_tokens: u64,
	is_trained: bool,
}

impl Default for NGramModel {
	/// Returns an empty, untrained model.
	fn default() -> Self {
		Self {
			trigrams: NGramTable::trigrams(),
			bigrams: NGramTable::bigrams(),
			unigrams: UnigramTable::new(),
			vocab_size: 0,
			total_tokens: 0,
			is_trained: false,
		}
	}
}

impl NGramModel {
	/// Assembles a trained model from finished tables.
	///
	/// `vocab_size` and `total_tokens` are recomputed from `unigrams`
	/// when not supplied.
	pub(crate) fn from_tables(
		trigrams: NGramTable,
		bigrams: NGramTable,
		unigrams: UnigramTable,
		vocab_size: Option<u64>,
		total_tokens: Option<u64>,
	) -> Self {
		let vocab_size = vocab_size.unwrap_or(unigrams.len() as u64);
		let total_tokens = total_tokens.unwrap_or_else(|| unigrams.values().sum());
		Self { trigrams, bigrams, unigrams, vocab_size, total_tokens, is_trained: true }
	}

	pub fn is_trained(&self) -> bool {
		self.is_trained
	}

	/// Number of distinct unigram keys, `<s>` and `</s>` included.
	pub fn vocab_size(&self) -> u64 {
		self.vocab_size
	}

	/// Sum of all unigram counts.
	pub fn total_tokens(&self) -> u64 {
		self.total_tokens
	}

	pub fn trigrams(&self) -> &NGramTable {
		&self.trigrams
	}

	pub fn bigrams(&self) -> &NGramTable {
		&self.bigrams
	}

	pub fn unigrams(&self) -> &UnigramTable {
		&self.unigrams
	}

	/// Occurrences of `token` in the training stream.
	pub fn unigram_count(&self, token: &str) -> u64 {
		self.unigrams.get(token).copied().unwrap_or(0)
	}

	/// Occurrences of `next` right after `prev`.
	pub fn bigram_count(&self, prev: &str, next: &str) -> u64 {
		self.bigrams.count(&[prev.to_owned()], next)
	}

	/// Occurrences of `next` right after `w1 w2`.
	pub fn trigram_count(&self, w1: &str, w2: &str, next: &str) -> u64 {
		self.trigrams.count(&[w1.to_owned(), w2.to_owned()], next)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_model_is_untrained_and_empty() {
		let model = NGramModel::default();
		assert!(!model.is_trained());
		assert!(model.unigrams().is_empty());
		assert!(model.bigrams().is_empty());
		assert!(model.trigrams().is_empty());
		assert_eq!(model.vocab_size(), 0);
		assert_eq!(model.total_tokens(), 0);
	}

	#[test]
	fn from_tables_derives_statistics() {
		let mut unigrams = UnigramTable::new();
		unigrams.insert("a".to_owned(), 3);
		unigrams.insert("b".to_owned(), 2);

		let model = NGramModel::from_tables(NGramTable::trigrams(), NGramTable::bigrams(), unigrams, None, None);
		assert!(model.is_trained());
		assert_eq!(model.vocab_size(), 2);
		assert_eq!(model.total_tokens(), 5);
		assert_eq!(model.unigram_count("a"), 3);
		assert_eq!(model.unigram_count("z"), 0);
	}
}
