use crate::links::LinkId;

/// Why the router could not pick an outgoing link for a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Undeliverable {
    /// A request needs at least one label to know its destination.
    #[error("address chain is empty")]
    EmptyAddressChain,

    /// The policy only forwards one kind from this direction.
    #[error("unexpected kind {kind:?} (expected {expected:?})")]
    UnexpectedKind { kind: String, expected: String },

    /// The destination label is not in the link table.
    #[error("no link for label {0:?}")]
    UnknownLabel(String),

    /// The ingress link has no label of its own to use as sender.
    #[error("{0} has no sender label")]
    UnknownIngress(LinkId),

    /// No label in the chain names a known peer other than the sender.
    #[error("no known peer label in address chain")]
    NoPeerLabel,

    /// An addressless reply arrived for a command nobody requested.
    #[error("no origin recorded for command {0:?}")]
    CorrelationMiss(String),

    /// The route points at a link that is not attached.
    #[error("{0} is not attached")]
    UnknownLink(LinkId),
}

/// Errors reported by relay and device poll loops.
///
/// None of these stop a poll loop: the offending frame or message is
/// dropped and processing continues with the next one.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// A frame was malformed, or a reply could not be written.
    #[error(transparent)]
    Frame(#[from] starwire_frame::FrameError),

    /// The router found no outgoing link.
    #[error("undeliverable {message}: {reason}")]
    Undeliverable {
        message: String,
        #[source]
        reason: Undeliverable,
    },

    /// The device has no handler registered for the command.
    #[error("unsupported command {command:?}")]
    UnsupportedCommand { command: String },

    /// The device refused a well-formed message.
    #[error("rejected {message}: {reason}")]
    Rejected { message: String, reason: String },
}

impl NodeError {
    /// Short machine-friendly category, used as a log field.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Frame(starwire_frame::FrameError::Malformed { .. }) => "frame_malformed",
            Self::Frame(starwire_frame::FrameError::ShortWrite { .. }) => "short_write",
            Self::Undeliverable { .. } => "undeliverable",
            Self::UnsupportedCommand { .. } => "unsupported_command",
            Self::Rejected { .. } => "rejected",
        }
    }
}

pub type Result<T> = std::result::Result<T, NodeError>;

#[cfg(test)]
mod tests {
    use starwire_frame::{FrameError, ParseError};

    use super::*;

    #[test]
    fn categories_are_distinct() {
        let errors = [
            NodeError::Frame(FrameError::Malformed {
                frame: "!!##".into(),
                reason: ParseError::IncompleteHeader,
            }),
            NodeError::Frame(FrameError::ShortWrite {
                written: 1,
                expected: 2,
            }),
            NodeError::Undeliverable {
                message: "CONFIRM:X".into(),
                reason: Undeliverable::CorrelationMiss("X".into()),
            },
            NodeError::UnsupportedCommand {
                command: "DANCE".into(),
            },
            NodeError::Rejected {
                message: "CONFIRM:X".into(),
                reason: "expected REQUEST".into(),
            },
        ];

        let mut categories: Vec<_> = errors.iter().map(NodeError::category).collect();
        categories.sort_unstable();
        categories.dedup();
        assert_eq!(categories.len(), errors.len());
    }

    #[test]
    fn messages_carry_the_offending_text() {
        let err = NodeError::Undeliverable {
            message: "ARM9:REQUEST:MAKE_STAR".into(),
            reason: Undeliverable::UnknownLabel("ARM9".into()),
        };
        assert_eq!(
            err.to_string(),
            "undeliverable ARM9:REQUEST:MAKE_STAR: no link for label \"ARM9\""
        );
    }
}
