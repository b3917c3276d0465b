use std::collections::BTreeMap;

/// Continuation counts observed after one n-gram prefix.
///
/// A `State` corresponds to a fixed `(n-1)`-token prefix and stores how
/// often each continuation token followed it, together with the running
/// total used as the denominator of conditional estimates.
///
/// ## Invariants
/// - Every stored count is strictly positive
/// - `total` equals the sum of all stored counts, saturating at `u64::MAX`
/// - Continuations iterate in lexicographic order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
	/// Outgoing transitions indexed by the continuation token.
	/// Example: { "sir" => 42, "madam" => 3 }
	transitions: BTreeMap<String, u64>,
	/// Sum of all transition counts.
	total: u64,
}

impl State {
	/// Records `count` occurrences of `next`, saturating at `u64::MAX`.
	///
	/// A zero count is ignored so no empty entry is ever created.
	pub fn add_transition(&mut self, next: &str, count: u64) {
		if count == 0 {
			return;
		}
		let entry = self.transitions.entry(next.to_owned()).or_insert(0);
		*entry = entry.saturating_add(count);
		self.total = self.total.saturating_add(count);
	}

	/// Records `count` occurrences of `next` unless the entry or the total
	/// would overflow, in which case the state is left untouched and `None`
	/// is returned.
	pub fn checked_add_transition(&mut self, next: &str, count: u64) -> Option<()> {
		if count == 0 {
			return Some(());
		}
		let total = self.total.checked_add(count)?;
		let current = self.count(next);
		let updated = current.checked_add(count)?;
		self.transitions.insert(next.to_owned(), updated);
		self.total = total;
		Some(())
	}

	/// Occurrences of `next` after this prefix (0 if never seen).
	pub fn count(&self, next: &str) -> u64 {
		self.transitions.get(next).copied().unwrap_or(0)
	}

	/// Sum of all continuation counts.
	pub fn total(&self) -> u64 {
		self.total
	}

	/// Iterates `(continuation, count)` in lexicographic order.
	pub fn transitions(&self) -> impl Iterator<Item = (&str, u64)> {
		self.transitions.iter().map(|(token, count)| (token.as_str(), *count))
	}

	/// Merges another state into this one by summing counts.
	///
	/// Used to combine partial tables counted on separate workers.
	pub fn merge(&mut self, other: &Self) {
		for (next, count) in other.transitions() {
			self.add_transition(next, count);
		}
	}
}
