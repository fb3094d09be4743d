//! Sentinel-delimited text framing and the message codec for starwire.
//!
//! Every message travels as one human-readable frame:
//! - A `"!!"` start sentinel
//! - A `:`-separated header (hop labels, kind, command)
//! - An optional `{key=value,flag}` parameter block
//! - A `"##"` end sentinel
//!
//! The extractor pulls complete frames out of a growing byte buffer, the
//! codec converts between frame text and [`Message`].

pub mod codec;
pub mod error;
pub mod extract;
pub mod kind;
pub mod message;
pub mod reader;
pub mod writer;

pub use codec::{build, parse};
pub use error::{FrameError, ParseError, Result};
pub use extract::{drain_frames, extract_next, END_SENTINEL, START_SENTINEL};
pub use kind::{is_well_known, CONFIRM, REQUEST};
pub use message::{Message, Parameters};
pub use reader::{FrameReader, DEFAULT_MAX_FRAME_LEN};
pub use writer::{write_frame, write_message, FrameWriter};
