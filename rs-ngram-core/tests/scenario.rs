//! End-to-end checks on a small corpus: training statistics, both
//! prediction strategies and persistence round trips.

use rs_ngram_core::model::tokenizer::{normalize, tokenize};
use rs_ngram_core::{ModelError, ModelStore, NGramModel, PredictionMethod, RecordFormat, Trainer};

fn toy_model() -> NGramModel {
	Trainer::new(1).train(&["a b c", "a b d"])
}

const EMAIL_CORPUS: [&str; 8] = [
	"Dear Sir or Madam I am writing to inquire about your services",
	"Thank you for your email I look forward to hearing from you",
	"I hope this email finds you well Please let me know if you need anything",
	"Best regards and thank you for your time",
	"I would like to schedule a meeting to discuss this further",
	"I am writing to follow up on our previous conversation",
	"I am looking forward to your reply",
	"Thank you for considering my request",
];

#[test]
fn tokenizer_examples() {
	assert_eq!(normalize("Hello, World!"), "hello world");
	assert_eq!(tokenize("Dear Sir!", true), vec!["<s>", "dear", "sir", "</s>"]);
	assert!(tokenize("", true).is_empty());
}

#[test]
fn toy_corpus_statistics() {
	let model = toy_model();
	assert!(model.is_trained());
	assert_eq!(model.vocab_size(), 6);
	assert_eq!(model.total_tokens(), 10);
	let keys: Vec<_> = model.unigrams().keys().map(String::as_str).collect();
	assert_eq!(keys, vec!["</s>", "<s>", "a", "b", "c", "d"]);
}

#[test]
fn toy_corpus_backoff_keeps_discovery_order() {
	assert_eq!(toy_model().predict_backoff("a b", 2), vec!["c", "d"]);
}

#[test]
fn toy_corpus_interpolation_ranks_continuations_first() {
	let model = toy_model();
	let predictions = model.predict_interpolated("a b", 4);
	assert_eq!(&predictions[..2], ["c", "d"]);
	assert_eq!(predictions.len(), 4);
	assert_eq!(model.predict_interpolated("a b", 4), predictions);
}

#[test]
fn context_uses_last_two_words_only() {
	let model = toy_model();
	assert_eq!(model.predict_backoff("x y z a b", 2), vec!["c", "d"]);
	assert_eq!(model.predict_backoff("A-B", 2), vec!["c", "d"]);
}

#[test]
fn insufficient_context_is_an_empty_result() {
	let model = toy_model();
	for method in [PredictionMethod::Backoff, PredictionMethod::Interpolation] {
		assert!(model.predict(method, "", 3).is_empty());
		assert!(model.predict(method, "a", 3).is_empty());
		assert!(NGramModel::default().predict(method, "a b", 3).is_empty());
	}
}

#[test]
fn predictions_never_exceed_top_k() {
	let model = Trainer::new(2).train(&EMAIL_CORPUS);
	for top_k in 0..6 {
		assert!(model.predict_backoff("I am", top_k).len() <= top_k);
		assert!(model.predict_interpolated("I am", top_k).len() <= top_k);
	}
	assert_eq!(model.predict_backoff("I am", 1), vec!["writing"]);
	assert_eq!(model.predict_interpolated("I am", 1), vec!["writing"]);
}

#[test]
fn store_round_trip_preserves_predictions() {
	let dir = tempfile::tempdir().unwrap();
	let model = Trainer::new(2).train(&EMAIL_CORPUS);

	for format in RecordFormat::ALL {
		let store = ModelStore::new(dir.path(), format);
		store.save_model(&model, "email").unwrap();
		let loaded = store.load_model("email").unwrap();

		assert_eq!(loaded.vocab_size(), model.vocab_size());
		assert_eq!(loaded.total_tokens(), model.total_tokens());
		for context in ["I am", "thank you", "your", "look forward to", "nothing matches here"] {
			for top_k in [1, 3, 5] {
				assert_eq!(loaded.predict_backoff(context, top_k), model.predict_backoff(context, top_k));
				assert_eq!(loaded.predict_interpolated(context, top_k), model.predict_interpolated(context, top_k));
			}
		}
	}
}

#[test]
fn loading_unknown_name_is_a_failure() {
	let dir = tempfile::tempdir().unwrap();
	let store = ModelStore::new(dir.path(), RecordFormat::Json);
	assert!(matches!(store.load_model("all"), Err(ModelError::ModelFileNotFound(_))));
}

#[test]
fn legacy_record_file_loads() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(
		dir.path().join("legacy.json"),
		r#"{
			"trigrams": {"a b": {"c": 1, "d": 1}},
			"bigrams": {"<s>,": {"a": 2}, "a,": {"b": 2}, "b,": {"c": 1, "d": 1}},
			"unigrams": {"<s>": 2, "a": 2, "b": 2, "c": 1, "d": 1, "</s>": 2}
		}"#,
	)
	.unwrap();

	let store = ModelStore::new(dir.path(), RecordFormat::Json);
	let model = store.load_model("legacy").unwrap();
	assert!(model.is_trained());
	assert_eq!(model.vocab_size(), 6);
	assert_eq!(model.total_tokens(), 10);
	assert_eq!(model.predict_backoff("a b", 2), vec!["c", "d"]);
	assert_eq!(&model.predict_interpolated("a b", 2)[..], ["c", "d"]);
}
