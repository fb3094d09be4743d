use std::collections::HashMap;

/// Remembers, per command name, which address asked for it.
///
/// Peripherals reply without any trace of the original requester, so the
/// relay records `command -> origin` when it forwards a request and looks it
/// up when the reply comes back.
///
/// Lifecycle: created empty with its router, mutated only through [`set`],
/// dropped with the router. Entries never expire and the table is unbounded;
/// the command vocabulary is small and fixed.
///
/// Only one outstanding request per command name is tracked. A second
/// request for the same command overwrites the first origin, and a reply for
/// the first request is then routed to the second requester.
///
/// [`set`]: CorrelationTable::set
#[derive(Debug, Clone, Default)]
pub struct CorrelationTable {
    origins: HashMap<String, String>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `origin` for `command`, returning the origin it replaced.
    pub fn set(&mut self, command: impl Into<String>, origin: impl Into<String>) -> Option<String> {
        self.origins.insert(command.into(), origin.into())
    }

    /// Origin recorded for `command`. The entry stays in place.
    pub fn get(&self, command: &str) -> Option<&str> {
        self.origins.get(command).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    /// All entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.origins.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
