use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;
use crate::model::ngram_model::NGramModel;
use crate::model::ngram_table::{NGramTable, UnigramTable};

/// Continuation counts of one prefix, with the prefix spelled out as an
/// ordered token list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PrefixEntry {
	pub prefix: Vec<String>,
	pub counts: BTreeMap<String, u64>,
}

/// Portable snapshot of a trained model.
///
/// Exactly five fields. Prefixes are token lists rather than composite
/// map keys, so the record maps onto any serde format.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ModelRecord {
	pub trigrams: Vec<PrefixEntry>,
	pub bigrams: Vec<PrefixEntry>,
	pub unigrams: BTreeMap<String, u64>,
	pub vocab_size: u64,
	pub total_tokens: u64,
}

fn entries(table: &NGramTable) -> Vec<PrefixEntry> {
	table
		.iter()
		.map(|(prefix, state)| PrefixEntry {
			prefix: prefix.to_vec(),
			counts: state.transitions().map(|(token, count)| (token.to_owned(), count)).collect(),
		})
		.collect()
}

/// Rebuilds a table from stored prefix entries.
///
/// Fails if summing the stored counts overflows.
fn fill(
	mut table: NGramTable,
	prefixes: impl IntoIterator<Item = (Vec<String>, BTreeMap<String, u64>)>,
) -> Result<NGramTable, String> {
	for (prefix, counts) in prefixes {
		for (token, count) in counts {
			table.try_add(prefix.clone(), &token, count)?;
		}
	}
	Ok(table)
}

/// Sums stored unigram counts, dropping zeros and stripping the trailing
/// comma some older records left on keys.
fn unigrams(stored: BTreeMap<String, u64>) -> Result<UnigramTable, String> {
	let mut unigrams = UnigramTable::new();
	for (key, count) in stored {
		if count == 0 {
			continue;
		}
		let token = key.strip_suffix(',').map(str::trim).unwrap_or(&key);
		let entry = unigrams.entry(token.to_owned()).or_insert(0);
		*entry = entry.checked_add(count).ok_or_else(|| format!("count overflow for unigram '{token}'"))?;
	}
	Ok(unigrams)
}

/// `total_tokens` as stored, or recomputed when absent.
fn total_tokens(stored: Option<u64>, unigrams: &UnigramTable) -> Result<u64, String> {
	match stored {
		Some(total) => Ok(total),
		None => unigrams
			.values()
			.try_fold(0u64, |sum, count| sum.checked_add(*count))
			.ok_or_else(|| "unigram total overflows".to_owned()),
	}
}

impl From<&NGramModel> for ModelRecord {
	fn from(model: &NGramModel) -> Self {
		Self {
			trigrams: entries(model.trigrams()),
			bigrams: entries(model.bigrams()),
			unigrams: model.unigrams().clone(),
			vocab_size: model.vocab_size(),
			total_tokens: model.total_tokens(),
		}
	}
}

impl TryFrom<ModelRecord> for NGramModel {
	type Error = String;

	/// Fails only if the stored counts overflow when summed.
	fn try_from(record: ModelRecord) -> Result<Self, Self::Error> {
		let trigrams = fill(NGramTable::trigrams(), record.trigrams.into_iter().map(|e| (e.prefix, e.counts)))?;
		let bigrams = fill(NGramTable::bigrams(), record.bigrams.into_iter().map(|e| (e.prefix, e.counts)))?;
		let unigrams = unigrams(record.unigrams)?;
		Ok(NGramModel::from_tables(trigrams, bigrams, unigrams, Some(record.vocab_size), Some(record.total_tokens)))
	}
}

impl NGramModel {
	/// Captures the model as a record in the canonical key encoding.
	pub fn to_record(&self) -> ModelRecord {
		ModelRecord::from(self)
	}

	/// Rebuilds a trained model from a record.
	///
	/// # Errors
	/// Returns a message if the stored counts overflow when summed.
	pub fn from_record(record: ModelRecord) -> Result<Self, String> {
		record.try_into()
	}
}

/// Normalizes a stored prefix key of any observed shape into a token list.
///
/// # Behavior
/// - A list keeps its order; non-string items keep their JSON text.
/// - A string ending with `,` is a one-token prefix (`"a,"` → `["a"]`).
/// - A string with whitespace is split (`"a b"` → `["a", "b"]`).
/// - Any other string is a one-token prefix.
/// - Any other value is kept as an opaque one-token prefix holding its
///   JSON text. It never matches a lookup but survives a re-save.
pub fn normalize_prefix(key: &Value) -> Vec<String> {
	match key {
		Value::Array(items) => items
			.iter()
			.map(|item| match item {
				Value::String(token) => token.clone(),
				other => other.to_string(),
			})
			.collect(),
		Value::String(key) => normalize_prefix_str(key),
		other => vec![other.to_string()],
	}
}

fn normalize_prefix_str(key: &str) -> Vec<String> {
	if let Some(token) = key.strip_suffix(',') {
		return vec![token.trim().to_owned()];
	}
	if key.contains(char::is_whitespace) {
		return key.split_whitespace().map(str::to_owned).collect();
	}
	vec![key.to_owned()]
}

/// A prefix table as found in a JSON record, canonical or legacy.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTable {
	/// `[{"prefix": ..., "counts": {...}}]`
	Entries(Vec<StoredEntry>),
	/// `{"a b": {...}}` or `{"a,": {...}}`
	Keyed(BTreeMap<String, BTreeMap<String, u64>>),
}

impl Default for StoredTable {
	fn default() -> Self {
		StoredTable::Entries(Vec::new())
	}
}

impl StoredTable {
	fn into_table(self, table: NGramTable) -> Result<NGramTable, String> {
		match self {
			StoredTable::Entries(entries) => {
				fill(table, entries.into_iter().map(|entry| (normalize_prefix(&entry.prefix), entry.counts)))
			}
			StoredTable::Keyed(keyed) => {
				fill(table, keyed.into_iter().map(|(key, counts)| (normalize_prefix_str(&key), counts)))
			}
		}
	}
}

#[derive(Deserialize)]
struct StoredEntry {
	prefix: Value,
	#[serde(default)]
	counts: BTreeMap<String, u64>,
}

/// Lenient view of a JSON record: every field is optional and prefix keys
/// may use older encodings.
#[derive(Deserialize)]
struct StoredRecord {
	#[serde(default)]
	trigrams: StoredTable,
	#[serde(default)]
	bigrams: StoredTable,
	#[serde(default)]
	unigrams: BTreeMap<String, u64>,
	vocab_size: Option<u64>,
	total_tokens: Option<u64>,
}

impl StoredRecord {
	/// Missing `vocab_size` / `total_tokens` are recomputed from the unigrams.
	fn into_model(self) -> Result<NGramModel, String> {
		let unigrams = unigrams(self.unigrams)?;
		let total_tokens = total_tokens(self.total_tokens, &unigrams)?;

		Ok(NGramModel::from_tables(
			self.trigrams.into_table(NGramTable::trigrams())?,
			self.bigrams.into_table(NGramTable::bigrams())?,
			unigrams,
			self.vocab_size,
			Some(total_tokens),
		))
	}
}

/// On-disk encoding of a model record.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
	/// Self-describing JSON (`.json`). Accepts legacy key shapes on load.
	#[default]
	Json,
	/// Compact `postcard` encoding (`.bin`). Canonical records only.
	Binary,
}

impl RecordFormat {
	pub const ALL: [RecordFormat; 2] = [RecordFormat::Json, RecordFormat::Binary];

	pub fn extension(&self) -> &'static str {
		match self {
			RecordFormat::Json => "json",
			RecordFormat::Binary => "bin",
		}
	}

	pub fn from_extension(extension: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|format| format.extension() == extension)
	}

	/// Serializes a record.
	///
	/// # Errors
	/// Returns `ModelError::Encode` if the serializer fails.
	pub fn encode(&self, record: &ModelRecord) -> Result<Vec<u8>, ModelError> {
		match self {
			RecordFormat::Json => serde_json::to_vec(record).map_err(|e| ModelError::Encode(e.to_string())),
			RecordFormat::Binary => postcard::to_stdvec(record).map_err(|e| ModelError::Encode(e.to_string())),
		}
	}

	/// Deserializes bytes into a trained model.
	///
	/// # Errors
	/// Returns the deserializer's message if the bytes are not a record,
	/// or an overflow message if the stored counts cannot be summed.
	/// Unusual key shapes inside a valid JSON record are normalized, never
	/// rejected.
	pub fn decode(&self, bytes: &[u8]) -> Result<NGramModel, String> {
		match self {
			RecordFormat::Json => serde_json::from_slice::<StoredRecord>(bytes)
				.map_err(|e| e.to_string())?
				.into_model(),
			RecordFormat::Binary => postcard::from_bytes::<ModelRecord>(bytes)
				.map_err(|e| e.to_string())?
				.try_into(),
		}
	}
}

impl fmt::Display for RecordFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RecordFormat::Json => f.write_str("json"),
			RecordFormat::Binary => f.write_str("binary"),
		}
	}
}

impl FromStr for RecordFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"json" => Ok(RecordFormat::Json),
			"binary" | "bin" | "postcard" => Ok(RecordFormat::Binary),
			other => Err(format!("Unknown record format '{other}', expected 'json' or 'binary'")),
		}
	}
}
