use std::collections::HashMap;
use std::fmt;

use starwire_frame::{write_message, FrameReader, Message, REQUEST};
use starwire_transport::Link;
use tracing::{info, warn};

use crate::error::{NodeError, Result};
use crate::relay::PollSummary;

/// Executes one command on a device and produces its replies.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, request: &Message) -> Vec<Message>;
}

impl<F> CommandHandler for F
where
    F: Fn(&Message) -> Vec<Message> + Send + Sync,
{
    fn handle(&self, request: &Message) -> Vec<Message> {
        self(request)
    }
}

/// Maps command names to handlers.
///
/// Adding a command to a device is a `register` call; nothing else in the
/// stack knows the command vocabulary.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `command`, replacing any previous handler.
    pub fn register(&mut self, command: impl Into<String>, handler: impl CommandHandler + 'static) {
        self.handlers.insert(command.into(), Box::new(handler));
    }

    pub fn with(mut self, command: impl Into<String>, handler: impl CommandHandler + 'static) -> Self {
        self.register(command, handler);
        self
    }

    pub fn contains(&self, command: &str) -> bool {
        self.handlers.contains_key(command)
    }

    /// Registered command names, sorted.
    pub fn commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the handler for `request.command`.
    pub fn dispatch(&self, request: &Message) -> Result<Vec<Message>> {
        let handler = self
            .handlers
            .get(&request.command)
            .ok_or_else(|| NodeError::UnsupportedCommand {
                command: request.command.clone(),
            })?;
        Ok(handler.handle(request))
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands())
            .finish()
    }
}

/// What a device accepts before dispatching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Only messages of this kind are executed.
    pub request_kind: String,
    /// Minimum number of hop labels (source and destination by default).
    pub min_addresses: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            request_kind: REQUEST.to_string(),
            min_addresses: 2,
        }
    }
}

/// The terminal end of a link: receives requests and writes replies.
pub struct Device<L> {
    label: String,
    reader: FrameReader<L>,
    registry: CommandRegistry,
    config: DeviceConfig,
}

impl<L: Link> Device<L> {
    pub fn new(label: impl Into<String>, link: L, registry: CommandRegistry) -> Self {
        Self::with_config(label, link, registry, DeviceConfig::default())
    }

    pub fn with_config(
        label: impl Into<String>,
        link: L,
        registry: CommandRegistry,
        config: DeviceConfig,
    ) -> Self {
        Self {
            label: label.into(),
            reader: FrameReader::new(link),
            registry,
            config,
        }
    }

    /// Handle every complete request that has arrived.
    pub fn poll(&mut self) -> PollSummary {
        let mut summary = PollSummary::default();
        for incoming in self.reader.poll_messages() {
            summary.received += 1;
            let outcome = incoming
                .map_err(NodeError::from)
                .and_then(|request| self.execute(&request, &mut summary.sent));
            if let Err(err) = outcome {
                warn!(device = %self.label, category = err.category(), error = %err, "request dropped");
                summary.dropped.push(err);
            }
        }
        summary
    }

    /// Run one request, counting each reply into `sent` as it goes out.
    fn execute(&mut self, request: &Message, sent: &mut usize) -> Result<()> {
        if request.kind != self.config.request_kind {
            return Err(NodeError::Rejected {
                message: request.to_string(),
                reason: format!("expected {}", self.config.request_kind),
            });
        }
        if request.address_chain.len() < self.config.min_addresses {
            return Err(NodeError::Rejected {
                message: request.to_string(),
                reason: format!("needs at least {} address labels", self.config.min_addresses),
            });
        }

        info!(device = %self.label, request = %request, "request received");
        let replies = self.registry.dispatch(request)?;
        for reply in &replies {
            write_message(self.reader.get_mut(), reply)?;
            *sent += 1;
        }
        Ok(())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Mutably borrow the link (e.g. to send unsolicited messages).
    pub fn link_mut(&mut self) -> &mut L {
        self.reader.get_mut()
    }
}
