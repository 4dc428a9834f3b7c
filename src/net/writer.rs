use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::error::FrameError;
use crate::net::frame::StatusUpdate;

/// Sink for status updates.
#[async_trait]
pub trait StatusWriter: Send + Sync {
    async fn write(&mut self, status: &StatusUpdate) -> Result<(), FrameError>;
}

/// Writes length-prefixed status frames onto a byte stream.
pub struct FramedWriter<T> {
    writer: BufWriter<T>,
}

impl<T: AsyncWrite + Unpin + Send> FramedWriter<T> {
    pub fn new(stream: T) -> Self {
        Self {
            writer: BufWriter::new(stream),
        }
    }
}

#[async_trait]
impl<T: AsyncWrite + Unpin + Send + Sync> StatusWriter for FramedWriter<T> {
    async fn write(&mut self, status: &StatusUpdate) -> Result<(), FrameError> {
        let body = status.encode()?;
        self.writer
            .write_all(&(body.len() as u32).to_le_bytes())
            .await
            .map_err(FrameError::Write)?;
        self.writer
            .write_all(&body)
            .await
            .map_err(FrameError::Write)?;
        self.writer.flush().await.map_err(FrameError::Write)
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::net::frame::SessionStatus;

    #[tokio::test]
    async fn writes_length_prefixed_status_bodies() {
        let (server, mut client) = tokio::io::duplex(1 << 16);
        let mut writer = FramedWriter::new(server);

        let mut counters = IndexMap::new();
        counters.insert("Step 1".to_string(), 1u32);
        let update = StatusUpdate {
            status: SessionStatus::InProgress,
            counters,
            message: String::new(),
            max_count: 25,
        };
        writer.write(&update).await.unwrap();

        let mut header = [0u8; 4];
        client.read_exact(&mut header).await.unwrap();
        let length = u32::from_le_bytes(header) as usize;
        let mut body = vec![0u8; length];
        client.read_exact(&mut body).await.unwrap();

        assert_eq!(StatusUpdate::decode(&body).unwrap(), update);
    }
}
