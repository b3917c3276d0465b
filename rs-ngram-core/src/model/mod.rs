//! Top-level module for the word n-gram language model.
//!
//! This module provides:
//! - Text normalization and tokenization (`tokenizer`)
//! - Per-prefix continuation counts (`State`)
//! - Fixed-order conditional frequency tables (`NGramTable`)
//! - The trained model snapshot (`NGramModel`)
//! - Batch training (`Trainer`)
//! - Backoff and interpolation prediction (`predictor`)

/// Text normalization, tokenization and sentence markers.
pub mod tokenizer;

/// N-gram window counting and frequency table construction.
///
/// Counts windows within completed sentences only and regroups them
/// into prefix → continuation tables.
pub mod ngram_table;

/// Immutable trained model holding the unigram, bigram and trigram tables.
pub mod ngram_model;

/// Batch training from in-memory samples or corpus files.
pub mod trainer;

/// Next-word prediction strategies over a trained model.
pub mod predictor;

/// Continuation counts observed after a single prefix.
///
/// Not exposed publicly.
mod state;
