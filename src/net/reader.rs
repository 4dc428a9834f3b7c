use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

use crate::error::FrameError;
use crate::net::frame::{ClientFrame, FRAME_HEADER_BYTES};

/// Source of decoded client frames.
#[async_trait]
pub trait FrameReader: Send + Sync {
    async fn read(&mut self) -> Result<ClientFrame, FrameError>;
}

/// Reads length-prefixed frames off a byte stream.
pub struct FramedReader<T> {
    reader: BufReader<T>,
    max_frame_bytes: usize,
}

impl<T: AsyncRead + Unpin + Send> FramedReader<T> {
    pub fn new(stream: T, max_frame_bytes: usize) -> Self {
        Self {
            reader: BufReader::new(stream),
            max_frame_bytes,
        }
    }
}

#[async_trait]
impl<T: AsyncRead + Unpin + Send + Sync> FrameReader for FramedReader<T> {
    async fn read(&mut self) -> Result<ClientFrame, FrameError> {
        // [length][tag][payload]; length counts the tag and the payload
        let mut header = [0u8; FRAME_HEADER_BYTES];
        self.reader
            .read_exact(&mut header)
            .await
            .map_err(FrameError::Read)?;
        let length = u32::from_le_bytes(header) as usize;
        if length > self.max_frame_bytes {
            return Err(FrameError::TooLarge {
                got: length,
                max: self.max_frame_bytes,
            });
        }

        let mut body = vec![0u8; length];
        self.reader
            .read_exact(&mut body)
            .await
            .map_err(FrameError::Read)?;
        ClientFrame::try_from(body.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use image::RgbImage;
    use tokio::io::AsyncWriteExt;

    use super::*;

    async fn write_frame(stream: &mut tokio::io::DuplexStream, body: &[u8]) {
        stream
            .write_all(&(body.len() as u32).to_le_bytes())
            .await
            .unwrap();
        stream.write_all(body).await.unwrap();
    }

    #[tokio::test]
    async fn reads_consecutive_frames() {
        let (mut client, server) = tokio::io::duplex(1 << 16);
        let mut reader = FramedReader::new(server, 1 << 20);

        write_frame(&mut client, &ClientFrame::Ping.encode()).await;
        let image_body = ClientFrame::Image {
            image: RgbImage::new(2, 2),
        }
        .encode();
        write_frame(&mut client, &image_body).await;
        write_frame(&mut client, &ClientFrame::Shutdown.encode()).await;

        assert_eq!(reader.read().await.unwrap(), ClientFrame::Ping);
        match reader.read().await.unwrap() {
            ClientFrame::Image { image } => assert_eq!(image.dimensions(), (2, 2)),
            other => panic!("unexpected frame {:?}", other),
        }
        assert_eq!(reader.read().await.unwrap(), ClientFrame::Shutdown);
    }

    #[tokio::test]
    async fn decode_failure_leaves_the_stream_aligned() {
        let (mut client, server) = tokio::io::duplex(1 << 16);
        let mut reader = FramedReader::new(server, 1 << 20);

        write_frame(&mut client, &[9u8, 1, 2, 3]).await;
        write_frame(&mut client, &ClientFrame::Ping.encode()).await;

        let err = reader.read().await.unwrap_err();
        assert!(err.is_decode());
        assert_eq!(reader.read().await.unwrap(), ClientFrame::Ping);
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_fatal() {
        let (mut client, server) = tokio::io::duplex(1 << 16);
        let mut reader = FramedReader::new(server, 64);

        client.write_all(&1000u32.to_le_bytes()).await.unwrap();

        let err = reader.read().await.unwrap_err();
        assert!(matches!(err, FrameError::TooLarge { got: 1000, max: 64 }));
        assert!(!err.is_decode());
    }

    #[tokio::test]
    async fn closed_stream_reads_as_disconnect() {
        let (client, server) = tokio::io::duplex(1 << 16);
        let mut reader = FramedReader::new(server, 1 << 20);
        drop(client);

        let err = reader.read().await.unwrap_err();
        assert!(err.is_disconnect());
    }
}
