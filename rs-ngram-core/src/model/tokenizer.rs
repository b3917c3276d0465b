use std::sync::LazyLock;

use regex::Regex;

/// Marker prepended to every training sample.
pub const SENTENCE_START: &str = "<s>";

/// Marker appended to every training sample. N-gram windows reset here.
pub const SENTENCE_END: &str = "</s>";

/// Everything that is neither a word character nor whitespace.
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid pattern"));

/// Piece separators: whitespace, hyphen, en dash, em dash and apostrophe.
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s\-\x{2013}\x{2014}']+").expect("valid pattern"));

/// Returns `true` for `<s>` and `</s>`.
pub fn is_marker(token: &str) -> bool {
	token == SENTENCE_START || token == SENTENCE_END
}

/// Lowercases `text`, strips every non-word, non-whitespace character
/// and trims the result.
///
/// Internal whitespace runs are kept as-is.
pub fn normalize(text: &str) -> String {
	NON_WORD.replace_all(&text.to_lowercase(), "").trim().to_owned()
}

/// Splits raw text into normalized tokens.
///
/// # Parameters
/// - `text`: Raw input text.
/// - `include_boundaries`: Wrap the result in `<s>` ... `</s>`.
///
/// # Returns
/// An empty vector when the trimmed input is empty, regardless of
/// `include_boundaries`. Pieces that normalize to nothing are dropped,
/// so `"!!!"` with boundaries yields `["<s>", "</s>"]`.
pub fn tokenize(text: &str, include_boundaries: bool) -> Vec<String> {
	if text.trim().is_empty() {
		return Vec::new();
	}

	let words = SEPARATORS
		.split(text)
		.map(normalize)
		.filter(|token| !token.is_empty());

	if include_boundaries {
		std::iter::once(SENTENCE_START.to_owned())
			.chain(words)
			.chain(std::iter::once(SENTENCE_END.to_owned()))
			.collect()
	} else {
		words.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalize_strips_punctuation_and_case() {
		assert_eq!(normalize("Hello, World!"), "hello world");
		assert_eq!(normalize("  snake_case  "), "snake_case");
		assert_eq!(normalize("?!"), "");
	}

	#[test]
	fn tokenize_wraps_with_markers() {
		assert_eq!(tokenize("Dear Sir!", true), vec!["<s>", "dear", "sir", "</s>"]);
		assert_eq!(tokenize("Dear Sir!", false), vec!["dear", "sir"]);
	}

	#[test]
	fn tokenize_empty_input_has_no_markers() {
		assert!(tokenize("", true).is_empty());
		assert!(tokenize("   \t\n", true).is_empty());
	}

	#[test]
	fn tokenize_splits_on_dashes_and_apostrophes() {
		assert_eq!(tokenize("don't well-known", false), vec!["don", "t", "well", "known"]);
		assert_eq!(tokenize("now\u{2014}then\u{2013}again", false), vec!["now", "then", "again"]);
	}

	#[test]
	fn tokenize_drops_pieces_empty_after_normalization() {
		assert_eq!(tokenize("hello , world", false), vec!["hello", "world"]);
		assert_eq!(tokenize("!!!", true), vec!["<s>", "</s>"]);
	}

	#[test]
	fn markers_are_recognized() {
		assert!(is_marker("<s>"));
		assert!(is_marker("</s>"));
		assert!(!is_marker("s"));
	}
}
