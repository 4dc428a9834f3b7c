use image::RgbImage;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::FrameError;
use crate::progress::ProgressSnapshot;

// Every frame on the wire is [length: u32 LE][tag: u8][payload], where the
// length counts the tag and the payload.

pub const FRAME_HEADER_BYTES: usize = 4;

pub const TAG_PING: u8 = 0;
pub const TAG_IMAGE_RAW: u8 = 1;
pub const TAG_IMAGE_ENCODED: u8 = 2;
pub const TAG_SHUTDOWN: u8 = 3;

pub const TAG_STATUS: u8 = 0;

// Raw image payloads start with [width: u32 LE][height: u32 LE].
const RAW_IMAGE_HEADER_BYTES: usize = 8;

/// Message sent by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientFrame {
    Ping,
    Image { image: RgbImage },
    Shutdown,
}

impl TryFrom<&[u8]> for ClientFrame {
    type Error = FrameError;

    fn try_from(body: &[u8]) -> Result<Self, Self::Error> {
        let (tag, payload) = body.split_first().ok_or(FrameError::Empty)?;
        match *tag {
            TAG_PING => Ok(ClientFrame::Ping),
            TAG_IMAGE_RAW => {
                let image = decode_raw_image(payload)?;
                Ok(ClientFrame::Image { image })
            }
            TAG_IMAGE_ENCODED => {
                let image = image::load_from_memory(payload)?.to_rgb8();
                Ok(ClientFrame::Image { image })
            }
            TAG_SHUTDOWN => Ok(ClientFrame::Shutdown),
            other => Err(FrameError::UnknownTag(other)),
        }
    }
}

impl ClientFrame {
    /// Serializes the frame body (tag plus payload, no length prefix).
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ClientFrame::Ping => vec![TAG_PING],
            ClientFrame::Image { image } => {
                let mut body =
                    Vec::with_capacity(1 + RAW_IMAGE_HEADER_BYTES + image.as_raw().len());
                body.push(TAG_IMAGE_RAW);
                body.extend_from_slice(&image.width().to_le_bytes());
                body.extend_from_slice(&image.height().to_le_bytes());
                body.extend_from_slice(image.as_raw());
                body
            }
            ClientFrame::Shutdown => vec![TAG_SHUTDOWN],
        }
    }
}

fn decode_raw_image(payload: &[u8]) -> Result<RgbImage, FrameError> {
    if payload.len() < RAW_IMAGE_HEADER_BYTES {
        return Err(FrameError::Truncated {
            expected: RAW_IMAGE_HEADER_BYTES,
            got: payload.len(),
        });
    }
    let width = u32::from_le_bytes(payload[0..4].try_into().unwrap());
    let height = u32::from_le_bytes(payload[4..8].try_into().unwrap());
    let pixels = payload[RAW_IMAGE_HEADER_BYTES..].to_vec();
    // verify the pixel payload matches the advertised dimensions
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3));
    if expected != Some(pixels.len()) {
        return Err(FrameError::PixelCount { width, height });
    }
    RgbImage::from_raw(width, height, pixels).ok_or(FrameError::PixelCount { width, height })
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Complete,
}

pub const COMPLETION_MESSAGE: &str = "All steps are followed. Passed!";

/// Status payload sent to the client after every combined group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: SessionStatus,
    pub counters: IndexMap<String, u32>,
    pub message: String,
    pub max_count: u32,
}

impl From<ProgressSnapshot> for StatusUpdate {
    fn from(snapshot: ProgressSnapshot) -> Self {
        let (status, message) = if snapshot.complete {
            (SessionStatus::Complete, COMPLETION_MESSAGE.to_string())
        } else {
            (SessionStatus::InProgress, String::new())
        };
        StatusUpdate {
            status,
            counters: snapshot.counters,
            message,
            max_count: snapshot.max_count,
        }
    }
}

impl StatusUpdate {
    /// Serializes the frame body (tag plus JSON payload, no length prefix).
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let mut body = vec![TAG_STATUS];
        body.extend_from_slice(&serde_json::to_vec(self)?);
        Ok(body)
    }

    pub fn decode(body: &[u8]) -> Result<Self, FrameError> {
        let (tag, payload) = body.split_first().ok_or(FrameError::Empty)?;
        if *tag != TAG_STATUS {
            return Err(FrameError::UnknownTag(*tag));
        }
        Ok(serde_json::from_slice(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn raw_image_body(width: u32, height: u32) -> Vec<u8> {
        ClientFrame::Image {
            image: RgbImage::new(width, height),
        }
        .encode()
    }

    #[test]
    fn test_ping_and_shutdown_round_trip() {
        let frame = ClientFrame::try_from(ClientFrame::Ping.encode().as_slice()).unwrap();
        assert_eq!(frame, ClientFrame::Ping);

        let frame = ClientFrame::try_from(ClientFrame::Shutdown.encode().as_slice()).unwrap();
        assert_eq!(frame, ClientFrame::Shutdown);
    }

    #[test]
    fn test_raw_image_decodes() {
        let body = raw_image_body(4, 2);
        let frame = ClientFrame::try_from(body.as_slice()).unwrap();
        match frame {
            ClientFrame::Image { image } => assert_eq!(image.dimensions(), (4, 2)),
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn test_empty_body_is_rejected() {
        let frame = ClientFrame::try_from(&[][..]);
        assert!(matches!(frame, Err(FrameError::Empty)));
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let frame = ClientFrame::try_from(&[9u8, 0, 0][..]);
        assert!(matches!(frame, Err(FrameError::UnknownTag(9))));
    }

    #[test]
    fn test_pixel_count_mismatch_is_rejected() {
        let mut body = raw_image_body(4, 2);
        body.pop();
        let frame = ClientFrame::try_from(body.as_slice());
        assert!(matches!(frame, Err(FrameError::PixelCount { .. })));
    }

    #[test]
    fn test_truncated_raw_header_is_rejected() {
        let body = [TAG_IMAGE_RAW, 1, 2, 3];
        let frame = ClientFrame::try_from(&body[..]);
        assert!(matches!(frame, Err(FrameError::Truncated { .. })));
    }

    #[test]
    fn test_garbage_encoded_image_is_rejected() {
        let body = [TAG_IMAGE_ENCODED, 1, 2, 3, 4, 5];
        let frame = ClientFrame::try_from(&body[..]);
        assert!(matches!(frame, Err(FrameError::ImageDecode(_))));
    }

    #[test]
    fn test_encoded_image_decodes() {
        let image = RgbImage::from_pixel(3, 3, image::Rgb([10, 20, 30]));
        let mut encoded = Cursor::new(Vec::new());
        image
            .write_to(&mut encoded, image::ImageFormat::Png)
            .unwrap();

        let mut body = vec![TAG_IMAGE_ENCODED];
        body.extend_from_slice(encoded.get_ref());
        let frame = ClientFrame::try_from(body.as_slice()).unwrap();
        match frame {
            ClientFrame::Image { image: decoded } => assert_eq!(decoded, image),
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn status_json_uses_the_public_schema() {
        let mut counters = IndexMap::new();
        counters.insert("Step 1".to_string(), 3u32);
        counters.insert("Step 2".to_string(), 3u32);
        let update = StatusUpdate {
            status: SessionStatus::Complete,
            counters,
            message: COMPLETION_MESSAGE.to_string(),
            max_count: 3,
        };

        let body = update.encode().unwrap();
        assert_eq!(body[0], TAG_STATUS);
        let json: serde_json::Value = serde_json::from_slice(&body[1..]).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["counters"]["Step 1"], 3);
        assert_eq!(json["message"], COMPLETION_MESSAGE);
        assert_eq!(json["max_count"], 3);

        assert_eq!(StatusUpdate::decode(&body).unwrap(), update);
    }
}
