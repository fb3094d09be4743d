//! Byte-level link abstraction for starwire.
//!
//! Every peer of a relay or device is reached over a duplex byte link:
//! - In-memory loopback pairs (tests, host simulation)
//! - Non-blocking `std::io` streams (Unix sockets, serial bridges)
//!
//! This is the lowest layer of starwire. Everything else builds on top of
//! the [`Link`] contract provided here.

pub mod error;
pub mod loopback;
pub mod stream;
pub mod traits;

pub use error::{Result, TransportError};
pub use loopback::LoopbackLink;
pub use stream::StreamLink;
pub use traits::Link;
