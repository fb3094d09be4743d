use std::fmt;
use std::io;

use starwire_frame::{FrameError, ParseError};
use starwire_node::NodeError;
use starwire_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::Closed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn parse_error(context: &str, frame: &str, err: ParseError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {frame:?}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Malformed { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::ShortWrite { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn node_error(context: &str, err: NodeError) -> CliError {
    match err {
        NodeError::Frame(err) => frame_error(context, err),
        NodeError::UnsupportedCommand { .. } | NodeError::Rejected { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        NodeError::Undeliverable { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}
