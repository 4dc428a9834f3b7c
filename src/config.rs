use std::collections::HashSet;
use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::combine::CombineMethod;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub server: ServerSettings,
    pub session: SessionSettings,
    pub classes: ClassSettings,
    pub classifier: ClassifierSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
    pub port: u16,
    /// Upper bound on a single frame body, length prefix excluded.
    pub max_frame_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 4550,
            max_frame_bytes: 8 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Frames collected before the group is combined and classified.
    pub combine_size: usize,
    pub combine_method: CombineMethod,
    /// Exponential weighting factor for the `weighted` combine method.
    pub alpha: f32,
    /// Minimum confidence for a classification to count.
    pub confidence_threshold: f32,
    /// Evidence cap per class when every frame is classified individually.
    pub max_count: u32,
    /// Evidence cap per class when frames are grouped. Groups arrive less
    /// often than frames, so the cap is smaller.
    pub combined_max_count: u32,
}

impl SessionSettings {
    pub fn effective_max_count(&self) -> u32 {
        if self.combine_size > 1 {
            self.combined_max_count
        } else {
            self.max_count
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            combine_size: 5,
            combine_method: CombineMethod::Weighted,
            alpha: 0.1,
            confidence_threshold: 0.75,
            max_count: 100,
            combined_max_count: 25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassSettings {
    pub labels: Vec<String>,
    pub background_label: String,
}

impl Default for ClassSettings {
    fn default() -> Self {
        Self {
            labels: (1..=5).map(|i| format!("Step {}", i)).collect(),
            background_label: "background".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub mode: ClassifierMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierMode {
    #[default]
    Simulated,
}

impl Configuration {
    /// Loads the configuration from an optional file with environment
    /// overrides layered on top, e.g. `STEPTRACK__SERVER__PORT=4551`.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(Path::new(path)),
            None => File::with_name("steptrack").required(false),
        };
        let configuration: Configuration = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("STEPTRACK").separator("__"))
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.combine_size < 1 {
            return Err(ConfigError::Invalid(
                "combine_size must be at least 1".to_string(),
            ));
        }
        if !(self.session.alpha > 0.0 && self.session.alpha <= 1.0) {
            return Err(ConfigError::Invalid(
                "alpha must be in (0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.session.confidence_threshold) {
            return Err(ConfigError::Invalid(
                "confidence_threshold must be in [0, 1]".to_string(),
            ));
        }
        if self.classes.labels.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one class label is required".to_string(),
            ));
        }
        if self
            .classes
            .labels
            .contains(&self.classes.background_label)
        {
            return Err(ConfigError::Invalid(
                "background_label must not appear in labels".to_string(),
            ));
        }
        let unique: HashSet<&String> = self.classes.labels.iter().collect();
        if unique.len() != self.classes.labels.len() {
            return Err(ConfigError::Invalid(
                "class labels must be unique".to_string(),
            ));
        }
        Ok(())
    }
}
