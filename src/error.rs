use std::io;

use thiserror::Error;

// Main application error type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Failed to bind to port {1}: {0}")]
    Bind(io::Error, u16),
    #[error("Failed to accept connection: {0}")]
    Accept(io::Error),
    #[error("Failed to read local address: {0}")]
    LocalAddr(io::Error),
}

// Wire-level errors. The decode arm is confined to a single frame and is
// recoverable; everything else is fatal to the session that hit it.

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Failed to read frame: {0}")]
    Read(io::Error),
    #[error("Failed to write frame: {0}")]
    Write(io::Error),
    #[error("Frame of {got} bytes exceeds the {max} byte limit")]
    TooLarge { got: usize, max: usize },
    #[error("Malformed status payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Empty frame body")]
    Empty,
    #[error("Unknown frame tag {0}")]
    UnknownTag(u8),
    #[error("Truncated frame payload: expected at least {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
    #[error("Pixel payload does not match {width}x{height}x3 dimensions")]
    PixelCount { width: u32, height: u32 },
    #[error("Failed to decode image payload: {0}")]
    ImageDecode(#[from] image::ImageError),
}

impl FrameError {
    /// True for payload problems confined to a single frame. The stream
    /// itself stays aligned, so the session may drop the frame and continue.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            FrameError::Empty
                | FrameError::UnknownTag(_)
                | FrameError::Truncated { .. }
                | FrameError::PixelCount { .. }
                | FrameError::ImageDecode(_)
        )
    }

    /// True when the peer went away, as opposed to the stream failing
    /// mid-frame.
    pub fn is_disconnect(&self) -> bool {
        match self {
            FrameError::Read(e) | FrameError::Write(e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum CombineError {
    #[error("Cannot combine an empty frame group")]
    EmptyInput,
    #[error("Frame dimensions {got_width}x{got_height} differ from the group's {width}x{height}")]
    ShapeMismatch {
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Transport failure: {0}")]
    Transport(#[from] FrameError),
    #[error("Frame combination contract violated: {0}")]
    Combine(#[from] CombineError),
}
