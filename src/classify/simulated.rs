use async_trait::async_trait;
use image::RgbImage;
use rand::Rng;

use crate::classify::{Classification, StepClassifier};
use crate::error::ClassifierError;

/// Stand-in for a model-backed classifier. Picks a random label from the
/// configured set with a high confidence, ignoring the frame contents.
pub struct SimulatedClassifier {
    labels: Vec<String>,
}

impl SimulatedClassifier {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }
}

#[async_trait]
impl StepClassifier for SimulatedClassifier {
    async fn classify(
        &self,
        _frame: &RgbImage,
    ) -> Result<Option<Classification>, ClassifierError> {
        if self.labels.is_empty() {
            return Ok(None);
        }
        let mut rng = rand::rng();
        let label = self.labels[rng.random_range(0..self.labels.len())].clone();
        let confidence = rng.random_range(0.8f32..=1.0);
        Ok(Some(Classification { label, confidence }))
    }
}
