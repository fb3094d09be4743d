//! Address routing, reply correlation and poll loops for starwire nodes.
//!
//! A relay sits between one controller and several peripherals. For every
//! message it decides which link the message goes out on next, remembering
//! who asked for a command when the peripheral's reply carries no address.
//! Devices terminate links and dispatch requests through a command registry.

pub mod correlation;
pub mod device;
pub mod error;
pub mod links;
pub mod policy;
pub mod relay;
pub mod router;

pub use correlation::CorrelationTable;
pub use device::{CommandHandler, CommandRegistry, Device, DeviceConfig};
pub use error::{NodeError, Result, Undeliverable};
pub use links::{arm_label, LinkId, LinkTable, CENTERPIECE, HUB_ARMS, MASTER};
pub use policy::{
    HopInsertConfig, HopInsertPolicy, Route, RoutingPolicy, RoutingPolicyKind, StrictPairPolicy,
};
pub use relay::{PollSummary, Relay};
pub use router::AddressRouter;
