//! Well-known message kinds.
//!
//! Kinds are an open vocabulary: any non-empty token is a valid kind and
//! the codec never checks against this list.

/// A command addressed to a device.
pub const REQUEST: &str = "REQUEST";

/// Acknowledgement of a completed request.
pub const CONFIRM: &str = "CONFIRM";

/// Returns true for the kinds every device understands.
pub fn is_well_known(kind: &str) -> bool {
    matches!(kind, REQUEST | CONFIRM)
}
