use std::sync::{Arc, PoisonError, RwLock};

use crate::model::ngram_model::NGramModel;

/// Shared slot holding the active model snapshot.
///
/// Readers take an `Arc` snapshot with `get` and keep using it for as long
/// as they need; `set` swaps in a fully built replacement without touching
/// the snapshot other readers hold. The lock only guards the pointer swap,
/// never a prediction.
#[derive(Debug)]
pub struct ModelHolder<M = NGramModel> {
	current: RwLock<Arc<M>>,
}

impl<M> ModelHolder<M> {
	pub fn new(model: M) -> Self {
		Self { current: RwLock::new(Arc::new(model)) }
	}

	/// Returns the current snapshot.
	pub fn get(&self) -> Arc<M> {
		let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
		Arc::clone(&current)
	}

	/// Replaces the snapshot and returns the previous one.
	pub fn set(&self, model: M) -> Arc<M> {
		let next = Arc::new(model);
		let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
		std::mem::replace(&mut *current, next)
	}
}

impl<M: Default> Default for ModelHolder<M> {
	fn default() -> Self {
		Self::new(M::default())
	}
}
