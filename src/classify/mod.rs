mod scripted;
mod simulated;

pub use scripted::ScriptedClassifier;
pub use simulated::SimulatedClassifier;

use async_trait::async_trait;
use image::RgbImage;

use crate::error::ClassifierError;

/// A single class prediction for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Capability interface over whatever model backs the session.
///
/// `Ok(None)` means the classifier produced no prediction for the frame,
/// which is distinct from predicting the background class.
#[async_trait]
pub trait StepClassifier: Send + Sync {
    async fn classify(&self, frame: &RgbImage)
        -> Result<Option<Classification>, ClassifierError>;
}
