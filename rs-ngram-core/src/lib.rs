//! Word-level n-gram language model library.
//!
//! This crate provides next-word prediction from unigram, bigram and
//! trigram statistics, including:
//! - Text normalization and tokenization with sentence markers
//! - Frequency table construction that never crosses a sentence boundary
//! - Batch training from in-memory samples or line-based corpus files
//! - Two prediction strategies: smoothed backoff and linear interpolation
//! - A portable model record with JSON and compact binary encodings
//! - A directory-backed model store and a copy-on-switch model holder

/// Core n-gram models, training and prediction logic.
pub mod model;

/// Serializable model record, including legacy key normalization.
pub mod record;

/// Directory-backed model store (load, save, listing).
pub mod store;

/// Shared handle to the active model snapshot.
pub mod holder;

/// Error type shared by persistence and storage.
pub mod error;

/// I/O utilities (file loading, path helpers).
pub mod io;

pub use error::ModelError;
pub use holder::ModelHolder;
pub use model::ngram_model::NGramModel;
pub use model::predictor::{InterpolationWeights, PredictionMethod};
pub use model::trainer::{Trainer, TrainingReport};
pub use record::{ModelRecord, RecordFormat};
pub use store::{ModelInfo, ModelStatus, ModelStore};
