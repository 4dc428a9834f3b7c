use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use image::RgbImage;

use crate::classify::{Classification, StepClassifier};
use crate::error::ClassifierError;

/// Replays a fixed sequence of results, then returns `None` forever.
/// Useful in tests and demos where the outcome must be deterministic.
pub struct ScriptedClassifier {
    results: Mutex<VecDeque<Option<Classification>>>,
}

impl ScriptedClassifier {
    pub fn new(results: impl IntoIterator<Item = Option<Classification>>) -> Self {
        Self {
            results: Mutex::new(results.into_iter().collect()),
        }
    }
}

#[async_trait]
impl StepClassifier for ScriptedClassifier {
    async fn classify(
        &self,
        _frame: &RgbImage,
    ) -> Result<Option<Classification>, ClassifierError> {
        let mut results = self
            .results
            .lock()
            .map_err(|_| ClassifierError::Unavailable("script mutex poisoned".to_string()))?;
        Ok(results.pop_front().flatten())
    }
}
