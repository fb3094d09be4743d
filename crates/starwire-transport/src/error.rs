/// Errors that can occur while setting up or driving a link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link has been closed by the far end or by a fatal I/O error.
    #[error("link closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
