use std::sync::Arc;

use tracing::{info, Level};

use steptrack::classify::{SimulatedClassifier, StepClassifier};
use steptrack::config::{ClassifierMode, Configuration};
use steptrack::error::AppError;
use steptrack::net::Server;

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();

    let config_path = std::env::args().nth(1);
    let configuration = Configuration::load(config_path.as_deref())?;

    let classifier: Arc<dyn StepClassifier> = match configuration.classifier.mode {
        ClassifierMode::Simulated => Arc::new(SimulatedClassifier::new(
            configuration.classes.labels.clone(),
        )),
    };

    let server = Server::bind(configuration, classifier).await?;
    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }
    Ok(())
}
