use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Parameter block of a message: unique keys, flags map to `""`.
pub type Parameters = BTreeMap<String, String>;

/// The parsed form of one frame.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Message {
    /// Hop labels, front to back.
    pub address_chain: Vec<String>,
    /// Command category, e.g. `REQUEST` or `CONFIRM`.
    pub kind: String,
    /// Action identifier, e.g. `MAKE_STAR`.
    pub command: String,
    pub parameters: Parameters,
}

impl Message {
    /// Create an addressless message without parameters.
    pub fn new(kind: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            address_chain: Vec::new(),
            kind: kind.into(),
            command: command.into(),
            parameters: Parameters::new(),
        }
    }

    /// Append one hop label to the address chain.
    pub fn with_address(mut self, label: impl Into<String>) -> Self {
        self.address_chain.push(label.into());
        self
    }

    /// Replace the address chain.
    pub fn with_addresses<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.address_chain = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set a `key=value` parameter, replacing any previous value.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Set a bare flag parameter.
    pub fn with_flag(self, key: impl Into<String>) -> Self {
        self.with_param(key, "")
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    pub fn param_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.param(key).unwrap_or(default)
    }

    /// True when `key` is present as a bare flag.
    pub fn has_flag(&self, key: &str) -> bool {
        self.param(key).is_some_and(str::is_empty)
    }

    /// First hop label: who sent the message along this path.
    pub fn origin(&self) -> Option<&str> {
        self.address_chain.first().map(String::as_str)
    }

    /// Last hop label: where the message is headed.
    pub fn destination(&self) -> Option<&str> {
        self.address_chain.last().map(String::as_str)
    }
}

/// Renders the frame body without sentinels, for log lines.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.address_chain {
            write!(f, "{label}:")?;
        }
        write!(f, "{}:{}", self.kind, self.command)?;
        if !self.parameters.is_empty() {
            f.write_str("{")?;
            for (i, (key, value)) in self.parameters.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                if value.is_empty() {
                    f.write_str(key)?;
                } else {
                    write!(f, "{key}={value}")?;
                }
            }
            f.write_str("}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_fields() {
        let msg = Message::new("REQUEST", "MAKE_STAR")
            .with_address("MASTER")
            .with_address("ARM1")
            .with_param("size", "10")
            .with_flag("loop");

        assert_eq!(msg.address_chain, vec!["MASTER", "ARM1"]);
        assert_eq!(msg.origin(), Some("MASTER"));
        assert_eq!(msg.destination(), Some("ARM1"));
        assert_eq!(msg.param("size"), Some("10"));
        assert!(msg.has_flag("loop"));
        assert!(!msg.has_flag("size"));
        assert_eq!(msg.param_or("color", "white"), "white");
    }

    #[test]
    fn addressless_message_has_no_endpoints() {
        let msg = Message::new("CONFIRM", "MAKE_STAR");
        assert_eq!(msg.origin(), None);
        assert_eq!(msg.destination(), None);
    }

    #[test]
    fn display_omits_sentinels() {
        let msg = Message::new("REQUEST", "SEND_STAR")
            .with_addresses(["MASTER", "ARM2"])
            .with_param("speed", "3")
            .with_flag("now");
        assert_eq!(msg.to_string(), "MASTER:ARM2:REQUEST:SEND_STAR{now,speed=3}");
    }

    #[test]
    fn parameter_equality_ignores_insertion_order() {
        let a = Message::new("REQUEST", "X")
            .with_param("a", "1")
            .with_param("b", "2");
        let b = Message::new("REQUEST", "X")
            .with_param("b", "2")
            .with_param("a", "1");
        assert_eq!(a, b);
    }

    #[test]
    fn serializes_to_json() {
        let msg = Message::new("CONFIRM", "ADD_STAR").with_address("CENTERPIECE");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"], "CONFIRM");
        assert_eq!(json["address_chain"][0], "CENTERPIECE");
        assert!(json["parameters"].as_object().unwrap().is_empty());
    }
}
