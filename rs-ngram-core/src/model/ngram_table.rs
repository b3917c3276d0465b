use std::collections::BTreeMap;

use super::state::State;
use super::tokenizer::SENTENCE_END;
use crate::error::ModelError;

/// Highest n-gram order the model works with.
pub const MAX_ORDER: usize = 3;

/// Raw window counts: n-token tuple → occurrences.
pub type NGramCounts = BTreeMap<Vec<String>, u64>;

/// Unigram table: token → occurrences.
pub type UnigramTable = BTreeMap<String, u64>;

/// Counts every contiguous window of `n` tokens inside completed sentences.
///
/// # Behavior
/// - Tokens are buffered until a `</s>` marker closes the sentence.
/// - Each closed sentence contributes its windows, then the buffer resets,
///   so no window ever spans two sentences.
/// - Tokens after the last `</s>` never contribute.
/// - Sentences shorter than `n` contribute nothing; `n == 0` yields nothing.
pub fn count_ngrams(tokens: &[String], n: usize) -> NGramCounts {
	let mut counts = NGramCounts::new();
	if n == 0 {
		return counts;
	}

	let mut start = 0;
	for (i, token) in tokens.iter().enumerate() {
		if token != SENTENCE_END {
			continue;
		}
		let sentence = &tokens[start..=i];
		for window in sentence.windows(n) {
			*counts.entry(window.to_vec()).or_insert(0) += 1;
		}
		start = i + 1;
	}

	counts
}

/// Conditional frequency table of order `n >= 2`.
///
/// Maps each `(n-1)`-token prefix to the counts of the tokens observed
/// right after it.
///
/// # Invariants
/// - `n` is always in `2..=MAX_ORDER`
/// - Every prefix has exactly `n-1` tokens and at least one continuation
/// - Prefixes iterate in lexicographic order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NGramTable {
	/// The order of the table (number of tokens in a full n-gram)
	n: usize,

	/// Mapping from a prefix to its continuation counts
	states: BTreeMap<Vec<String>, State>,
}

impl NGramTable {
	/// Creates an empty table of order `n`.
	///
	/// # Errors
	/// Returns `ModelError::InvalidOrder` unless `2 <= n <= MAX_ORDER`.
	pub fn new(n: usize) -> Result<Self, ModelError> {
		if !(2..=MAX_ORDER).contains(&n) {
			return Err(ModelError::InvalidOrder(n));
		}
		Ok(Self { n, states: BTreeMap::new() })
	}

	pub(crate) fn bigrams() -> Self {
		Self { n: 2, states: BTreeMap::new() }
	}

	pub(crate) fn trigrams() -> Self {
		Self { n: 3, states: BTreeMap::new() }
	}

	pub fn order(&self) -> usize {
		self.n
	}

	/// Number of distinct prefixes.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Records `count` occurrences of `next` after `prefix`.
	///
	/// Zero counts are ignored. The prefix length is not checked here:
	/// records loaded from older files may carry opaque prefixes.
	pub fn add(&mut self, prefix: Vec<String>, next: &str, count: u64) {
		if count == 0 {
			return;
		}
		self.states.entry(prefix).or_default().add_transition(next, count);
	}

	/// Like `add`, but fails instead of saturating when a count or the
	/// prefix total would overflow. Used when reading stored records.
	pub(crate) fn try_add(&mut self, prefix: Vec<String>, next: &str, count: u64) -> Result<(), String> {
		if count == 0 {
			return Ok(());
		}
		let label = prefix.join(" ");
		self.states
			.entry(prefix)
			.or_default()
			.checked_add_transition(next, count)
			.ok_or_else(|| format!("count overflow for '{next}' after '{label}'"))
	}

	/// Fills the table from raw window counts of the same order.
	pub(crate) fn with_counts(mut self, counts: &NGramCounts) -> Self {
		let n = self.n;
		for (gram, count) in counts {
			if gram.len() != n {
				continue;
			}
			let (prefix, next) = gram.split_at(n - 1);
			self.add(prefix.to_vec(), &next[0], *count);
		}
		self
	}

	pub(crate) fn state(&self, prefix: &[String]) -> Option<&State> {
		self.states.get(prefix)
	}

	pub fn contains_prefix(&self, prefix: &[String]) -> bool {
		self.states.contains_key(prefix)
	}

	/// Occurrences of `next` after `prefix` (0 if unseen).
	pub fn count(&self, prefix: &[String], next: &str) -> u64 {
		self.state(prefix).map_or(0, |state| state.count(next))
	}

	/// Sum of all continuation counts under `prefix` (0 if unseen).
	pub fn prefix_total(&self, prefix: &[String]) -> u64 {
		self.state(prefix).map_or(0, State::total)
	}

	/// Iterates `(continuation, count)` under `prefix` in lexicographic order.
	pub fn continuations<'a>(&'a self, prefix: &[String]) -> impl Iterator<Item = (&'a str, u64)> + 'a {
		self.state(prefix).into_iter().flat_map(|state| state.transitions())
	}

	/// Iterates every `(prefix, state)` pair in prefix order.
	pub(crate) fn iter(&self) -> impl Iterator<Item = (&[String], &State)> {
		self.states.iter().map(|(prefix, state)| (prefix.as_slice(), state))
	}

	/// Moves every state of `other` into this table, summing counts.
	///
	/// Used to combine partial tables counted on separate workers. Orders
	/// must match.
	pub(crate) fn absorb(&mut self, other: Self) {
		debug_assert_eq!(self.n, other.n);
		for (prefix, state) in other.states {
			match self.states.get_mut(&prefix) {
				Some(existing) => existing.merge(&state),
				None => {
					self.states.insert(prefix, state);
				}
			}
		}
	}
}

/// Result of `build_frequency_table`: a flat unigram table for `n == 1`,
/// a prefix table otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrequencyTable {
	Unigram(UnigramTable),
	Conditional(NGramTable),
}

/// Regroups raw window counts into a frequency table of order `n`.
///
/// # Behavior
/// - `n == 1`: counts are returned unchanged, keyed by their single token.
/// - `n > 1`: each tuple's count is added to `table[prefix][last_token]`.
/// - Tuples whose length is not `n` are ignored.
///
/// # Errors
/// Returns `ModelError::InvalidOrder` unless `1 <= n <= MAX_ORDER`.
pub fn build_frequency_table(counts: &NGramCounts, n: usize) -> Result<FrequencyTable, ModelError> {
	if n == 1 {
		return Ok(FrequencyTable::Unigram(unigram_table(counts)));
	}
	Ok(FrequencyTable::Conditional(NGramTable::new(n)?.with_counts(counts)))
}

/// Keys single-token windows by their token, dropping zero counts.
pub(crate) fn unigram_table(counts: &NGramCounts) -> UnigramTable {
	counts
		.iter()
		.filter(|(gram, count)| gram.len() == 1 && **count > 0)
		.map(|(gram, count)| (gram[0].clone(), *count))
		.collect()
}
