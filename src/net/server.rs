use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use crate::classify::StepClassifier;
use crate::config::Configuration;
use crate::error::NetworkError;
use crate::net::reader::FramedReader;
use crate::net::writer::FramedWriter;
use crate::progress::ProgressTracker;
use crate::session::StreamSession;

/// Accepts connections and runs one session per client.
pub struct Server {
    listener: TcpListener,
    configuration: Configuration,
    classifier: Arc<dyn StepClassifier>,
}

impl Server {
    pub async fn bind(
        configuration: Configuration,
        classifier: Arc<dyn StepClassifier>,
    ) -> Result<Self, NetworkError> {
        let address = format!(
            "{}:{}",
            configuration.server.bind_addr, configuration.server.port
        );
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| NetworkError::Bind(e, configuration.server.port))?;
        Ok(Self {
            listener,
            configuration,
            classifier,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        self.listener.local_addr().map_err(NetworkError::LocalAddr)
    }

    pub async fn run(self) -> Result<(), NetworkError> {
        info!(
            "Listening on {}:{}",
            self.configuration.server.bind_addr, self.configuration.server.port
        );
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    debug!("New client connecting from {:?}", peer);
                    self.spawn_session(stream);
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            }
        }
    }

    fn spawn_session(&self, stream: TcpStream) {
        let (stream_rx, stream_tx) = stream.into_split();
        let reader = FramedReader::new(stream_rx, self.configuration.server.max_frame_bytes);
        let writer = FramedWriter::new(stream_tx);
        let settings = self.configuration.session.clone();
        let tracker = ProgressTracker::new(
            self.configuration.classes.labels.iter().cloned(),
            self.configuration.classes.background_label.clone(),
            settings.effective_max_count(),
        );
        let session = StreamSession::new(
            Box::new(reader),
            Box::new(writer),
            Arc::clone(&self.classifier),
            tracker,
            settings,
        );
        let id = session.id();
        tokio::spawn(async move {
            match session.run().await {
                Ok(outcome) => debug!("Session {:?} finished: {:?}", id, outcome),
                Err(e) => error!("Session {:?} failed: {}", id, e),
            }
        });
    }
}
