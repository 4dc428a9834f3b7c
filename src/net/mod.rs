pub mod frame;
pub mod reader;
pub mod server;
pub mod writer;

pub use frame::{ClientFrame, SessionStatus, StatusUpdate};
pub use reader::{FrameReader, FramedReader};
pub use server::Server;
pub use writer::{FramedWriter, StatusWriter};
