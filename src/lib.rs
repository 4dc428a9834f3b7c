pub mod classify;
pub mod combine;
pub mod config;
pub mod error;
pub mod net;
pub mod progress;
pub mod session;

pub use classify::{Classification, ScriptedClassifier, SimulatedClassifier, StepClassifier};
pub use combine::{CombineMethod, FrameCombiner};
pub use config::Configuration;
pub use error::AppError;
pub use net::Server;
pub use progress::{ProgressSnapshot, ProgressTracker};
pub use session::{SessionOutcome, StreamSession};
