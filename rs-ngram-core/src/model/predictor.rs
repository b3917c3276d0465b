use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ngram_model::NGramModel;
use super::tokenizer::{SENTENCE_END, is_marker, tokenize};

/// Scoring strategy used to rank next-word candidates.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PredictionMethod {
	/// Add-one smoothed trigram → bigram → unigram backoff.
	#[default]
	Backoff,
	/// Fixed-weight blend of unigram, bigram and trigram estimates.
	Interpolation,
}

impl PredictionMethod {
	pub fn as_str(&self) -> &'static str {
		match self {
			PredictionMethod::Backoff => "backoff",
			PredictionMethod::Interpolation => "interpolation",
		}
	}
}

impl fmt::Display for PredictionMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for PredictionMethod {
	type Err = String;

	/// Parses `"backoff"` or `"interpolation"`, case-insensitively.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"backoff" => Ok(PredictionMethod::Backoff),
			"interpolation" => Ok(PredictionMethod::Interpolation),
			other => Err(format!("Unknown prediction method '{other}', expected 'backoff' or 'interpolation'")),
		}
	}
}

/// Weights of the linear interpolation. They should sum to 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterpolationWeights {
	pub unigram: f64,
	pub bigram: f64,
	pub trigram: f64,
}

impl Default for InterpolationWeights {
	fn default() -> Self {
		Self { unigram: 0.1, bigram: 0.3, trigram: 0.6 }
	}
}

/// Which table produced a backoff candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
	Trigram,
	Bigram,
	Unigram,
}

/// A scored continuation. Score and source only drive ranking.
#[derive(Debug)]
struct Candidate<'a> {
	token: &'a str,
	score: f64,
	source: Source,
}

/// Add-one smoothed log-probability, computed in floating point so large
/// stored counts cannot overflow.
fn laplace(count: u64, total: u64, vocab_size: u64) -> f64 {
	((count as f64 + 1.0) / (total as f64 + vocab_size as f64)).ln()
}

/// Ratio that is 0 when the denominator is 0.
fn ratio(count: u64, total: u64) -> f64 {
	if total == 0 { 0.0 } else { count as f64 / total as f64 }
}

/// Sorts by descending score, keeping discovery order among ties, and
/// keeps the first `top_k` tokens.
fn rank(mut candidates: Vec<Candidate<'_>>, top_k: usize) -> Vec<String> {
	// `sort_by` is stable
	candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
	candidates.into_iter().take(top_k).map(|candidate| candidate.token.to_owned()).collect()
}

impl NGramModel {
	/// Returns the last two context tokens, or `None` when the model is
	/// untrained or the context holds fewer than two tokens.
	fn context_pair(&self, context: &str) -> Option<[String; 2]> {
		if !self.is_trained() {
			return None;
		}
		let mut tokens = tokenize(context, false);
		if tokens.len() < 2 {
			return None;
		}
		let w2 = tokens.pop()?;
		let w1 = tokens.pop()?;
		Some([w1, w2])
	}

	/// Predicts with the requested strategy.
	pub fn predict(&self, method: PredictionMethod, context: &str, top_k: usize) -> Vec<String> {
		match method {
			PredictionMethod::Backoff => self.predict_backoff(context, top_k),
			PredictionMethod::Interpolation => self.predict_interpolated(context, top_k),
		}
	}

	/// Predicts the `top_k` most likely next words with smoothed backoff.
	///
	/// # Behavior
	/// - Candidates following the last two context words in the trigram
	///   table are scored `ln((count + 1) / (prefix_total + vocab_size))`.
	/// - While fewer than `top_k` candidates exist, new continuations of the
	///   last word in the bigram table are added with the same formula.
	/// - While still short, every unseen unigram (markers excluded) is added,
	///   scored against `total_tokens`.
	/// - `</s>` is never suggested. Ties keep discovery order: trigram
	///   before bigram before unigram, then lexicographic within a table.
	///
	/// # Returns
	/// At most `top_k` tokens; empty for an untrained model or a context of
	/// fewer than two tokens.
	pub fn predict_backoff(&self, context: &str, top_k: usize) -> Vec<String> {
		let Some([w1, w2]) = self.context_pair(context) else {
			return Vec::new();
		};

		let vocab_size = self.vocab_size();
		let mut candidates: Vec<Candidate<'_>> = Vec::new();
		let mut seen: HashSet<&str> = HashSet::new();

		let trigram_prefix = [w1, w2];
		if self.trigrams().contains_prefix(&trigram_prefix) {
			let total = self.trigrams().prefix_total(&trigram_prefix);
			for (token, count) in self.trigrams().continuations(&trigram_prefix) {
				if token != SENTENCE_END && seen.insert(token) {
					candidates.push(Candidate { token, score: laplace(count, total, vocab_size), source: Source::Trigram });
				}
			}
		}

		let [_, w2] = trigram_prefix;
		let bigram_prefix = [w2];
		if candidates.len() < top_k {
			let total = self.bigrams().prefix_total(&bigram_prefix);
			for (token, count) in self.bigrams().continuations(&bigram_prefix) {
				if token != SENTENCE_END && seen.insert(token) {
					candidates.push(Candidate { token, score: laplace(count, total, vocab_size), source: Source::Bigram });
				}
			}
		}

		if candidates.len() < top_k {
			let total = self.total_tokens();
			for (token, count) in self.unigrams() {
				let token = token.as_str();
				if !is_marker(token) && seen.insert(token) {
					candidates.push(Candidate { token, score: laplace(*count, total, vocab_size), source: Source::Unigram });
				}
			}
		}

		debug!(
			trigram = candidates.iter().filter(|c| c.source == Source::Trigram).count(),
			bigram = candidates.iter().filter(|c| c.source == Source::Bigram).count(),
			unigram = candidates.iter().filter(|c| c.source == Source::Unigram).count(),
			"backoff candidates collected"
		);

		rank(candidates, top_k)
	}

	/// Interpolated probability of `w3` following `w1 w2`.
	///
	/// `P = λ1·P(w3) + λ2·P(w3 | w2) + λ3·P(w3 | w1, w2)` where each
	/// maximum-likelihood term is 0 when its denominator is 0.
	pub fn interpolate(&self, w1: &str, w2: &str, w3: &str, weights: &InterpolationWeights) -> f64 {
		let p1 = ratio(self.unigram_count(w3), self.total_tokens());
		let p2 = ratio(self.bigram_count(w2, w3), self.unigram_count(w2));
		let p3 = ratio(self.trigram_count(w1, w2, w3), self.bigram_count(w1, w2));
		weights.unigram * p1 + weights.bigram * p2 + weights.trigram * p3
	}

	/// Predicts the `top_k` most likely next words with linear interpolation
	/// using the default weights (0.1, 0.3, 0.6).
	pub fn predict_interpolated(&self, context: &str, top_k: usize) -> Vec<String> {
		self.predict_interpolated_with(context, top_k, &InterpolationWeights::default())
	}

	/// Predicts the `top_k` most likely next words with linear interpolation.
	///
	/// # Behavior
	/// - Every unigram token except the sentence markers is scored with
	///   `interpolate`; candidates scoring `<= 0` are discarded.
	/// - Candidates are visited in lexicographic order and sorted stably, so
	///   tied scores always come out in the same order.
	///
	/// # Notes
	/// Each call is O(vocabulary size): every known word is scored. This is
	/// fine for small and medium vocabularies and is the scaling limit of
	/// this strategy.
	pub fn predict_interpolated_with(&self, context: &str, top_k: usize, weights: &InterpolationWeights) -> Vec<String> {
		let Some([w1, w2]) = self.context_pair(context) else {
			return Vec::new();
		};

		let candidates: Vec<Candidate<'_>> = self
			.unigrams()
			.keys()
			.map(String::as_str)
			.filter(|token| !is_marker(token))
			.filter_map(|token| {
				let score = self.interpolate(&w1, &w2, token, weights);
				(score > 0.0).then_some(Candidate { token, score, source: Source::Unigram })
			})
			.collect();

		debug!(candidates = candidates.len(), "interpolation candidates scored");

		rank(candidates, top_k)
	}
}
