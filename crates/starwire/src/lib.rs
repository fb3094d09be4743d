//! Framed text command protocol and relay router for controller/peripheral
//! device chains.
//!
//! starwire carries `!!ARM1:REQUEST:MAKE_STAR{size=10}##`-style frames over
//! byte links and forwards them between one controller and its peripherals.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte link contract, loopback and stream links
//! - [`frame`]: Frame extraction and the message codec
//! - [`node`]: Correlation table, address router, relay and device loops (behind `node` feature)
//! - [`sim`]: In-memory star-show rig wiring a controller, relay and devices (behind `node` feature)

/// Re-export transport types.
pub mod transport {
    pub use starwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use starwire_frame::*;
}

/// Re-export node types (requires `node` feature).
#[cfg(feature = "node")]
pub mod node {
    pub use starwire_node::*;
}

#[cfg(feature = "node")]
pub mod sim;
