use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use starwire_frame::{Message, REQUEST};

use crate::correlation::CorrelationTable;
use crate::error::Undeliverable;
use crate::links::{LinkId, LinkTable, MASTER};

/// Where a message goes next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// The message as it must be written to `egress`.
    pub message: Message,
    pub egress: LinkId,
    /// The label the message is being delivered to.
    pub destination: String,
}

/// An addressing strategy.
///
/// Given a message and the link it arrived on, a policy computes the
/// outgoing message and link. Policies may read and update the router's
/// correlation table; they never touch links directly.
pub trait RoutingPolicy: Send {
    fn name(&self) -> &'static str;

    fn resolve(
        &self,
        message: &Message,
        ingress: LinkId,
        links: &LinkTable,
        correlations: &mut CorrelationTable,
    ) -> Result<Route, Undeliverable>;
}

/// Settings for [`HopInsertPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopInsertConfig {
    /// Label the relay prepends to requests and appends to replies.
    pub relay_label: String,
    /// The controller-side link.
    pub upstream: LinkId,
    /// The only kind accepted from the controller side.
    pub request_kind: String,
    /// Commands whose reply arrives under another command name.
    ///
    /// Forwarding a request for a key also registers the same origin for
    /// every listed follow-up command.
    pub follow_ups: BTreeMap<String, Vec<String>>,
}

impl Default for HopInsertConfig {
    fn default() -> Self {
        Self {
            relay_label: MASTER.to_string(),
            upstream: LinkId(0),
            request_kind: REQUEST.to_string(),
            follow_ups: BTreeMap::new(),
        }
    }
}

impl HopInsertConfig {
    /// Route replies for `follow_up` like replies for `command`.
    pub fn with_follow_up(mut self, command: impl Into<String>, follow_up: impl Into<String>) -> Self {
        self.follow_ups
            .entry(command.into())
            .or_default()
            .push(follow_up.into());
        self
    }
}

/// Controller -> relay -> peripheral addressing where the peripheral cannot
/// see the controller.
///
/// Requests from the controller side get the relay label prepended and go to
/// the link of their last label; the relay remembers that label per command.
/// Anything from the peripheral side is routed back by command name.
#[derive(Debug, Clone, Default)]
pub struct HopInsertPolicy {
    config: HopInsertConfig,
}

impl HopInsertPolicy {
    pub fn new(config: HopInsertConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HopInsertConfig {
        &self.config
    }

    fn downstream(
        &self,
        message: &Message,
        links: &LinkTable,
        correlations: &mut CorrelationTable,
    ) -> Result<Route, Undeliverable> {
        if message.kind != self.config.request_kind {
            return Err(Undeliverable::UnexpectedKind {
                kind: message.kind.clone(),
                expected: self.config.request_kind.clone(),
            });
        }
        let destination = message
            .destination()
            .ok_or(Undeliverable::EmptyAddressChain)?;
        let egress = links
            .link_for(destination)
            .ok_or_else(|| Undeliverable::UnknownLabel(destination.to_string()))?;

        let mut outgoing = message.clone();
        outgoing
            .address_chain
            .insert(0, self.config.relay_label.clone());

        remember(correlations, &message.command, destination);
        if let Some(follow_ups) = self.config.follow_ups.get(&message.command) {
            for follow_up in follow_ups {
                remember(correlations, follow_up, destination);
            }
        }

        Ok(Route {
            message: outgoing,
            egress,
            destination: destination.to_string(),
        })
    }

    fn upstream(
        &self,
        message: &Message,
        correlations: &CorrelationTable,
    ) -> Result<Route, Undeliverable> {
        let origin = correlations
            .get(&message.command)
            .ok_or_else(|| Undeliverable::CorrelationMiss(message.command.clone()))?;

        let outgoing = Message {
            address_chain: vec![origin.to_string(), self.config.relay_label.clone()],
            kind: message.kind.clone(),
            command: message.command.clone(),
            parameters: message.parameters.clone(),
        };
        Ok(Route {
            message: outgoing,
            egress: self.config.upstream,
            destination: self.config.relay_label.clone(),
        })
    }
}

fn remember(correlations: &mut CorrelationTable, command: &str, origin: &str) {
    if let Some(previous) = correlations.set(command, origin) {
        if previous != origin {
            tracing::debug!(command, %previous, origin, "correlation overwritten");
        }
    }
}

impl RoutingPolicy for HopInsertPolicy {
    fn name(&self) -> &'static str {
        "hop-insert"
    }

    fn resolve(
        &self,
        message: &Message,
        ingress: LinkId,
        links: &LinkTable,
        correlations: &mut CorrelationTable,
    ) -> Result<Route, Undeliverable> {
        if ingress == self.config.upstream {
            self.downstream(message, links, correlations)
        } else {
            self.upstream(message, correlations)
        }
    }
}

/// Every actor is directly addressable; the relay canonicalizes the chain
/// to exactly `[sender, destination]`.
///
/// The sender is the label of the ingress link. The destination is the
/// first label in the chain that names a known link other than the sender.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictPairPolicy;

impl RoutingPolicy for StrictPairPolicy {
    fn name(&self) -> &'static str {
        "strict-pair"
    }

    fn resolve(
        &self,
        message: &Message,
        ingress: LinkId,
        links: &LinkTable,
        _correlations: &mut CorrelationTable,
    ) -> Result<Route, Undeliverable> {
        let sender = links
            .label_of(ingress)
            .ok_or(Undeliverable::UnknownIngress(ingress))?;
        let destination = message
            .address_chain
            .iter()
            .map(String::as_str)
            .find(|label| *label != sender && links.is_known(label))
            .ok_or(Undeliverable::NoPeerLabel)?;
        let egress = links
            .link_for(destination)
            .ok_or_else(|| Undeliverable::UnknownLabel(destination.to_string()))?;

        let outgoing = Message {
            address_chain: vec![sender.to_string(), destination.to_string()],
            kind: message.kind.clone(),
            command: message.command.clone(),
            parameters: message.parameters.clone(),
        };
        Ok(Route {
            message: outgoing,
            egress,
            destination: destination.to_string(),
        })
    }
}

/// Selects a policy with its default settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingPolicyKind {
    HopInsert,
    StrictPair,
}

impl RoutingPolicyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HopInsert => "hop-insert",
            Self::StrictPair => "strict-pair",
        }
    }

    pub fn into_policy(self) -> Box<dyn RoutingPolicy> {
        match self {
            Self::HopInsert => Box::new(HopInsertPolicy::default()),
            Self::StrictPair => Box::new(StrictPairPolicy),
        }
    }
}

impl fmt::Display for RoutingPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingPolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hop-insert" => Ok(Self::HopInsert),
            "strict-pair" => Ok(Self::StrictPair),
            other => Err(format!("unknown routing policy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use starwire_frame::{parse, CONFIRM};

    use super::*;
    use crate::links::CENTERPIECE;

    const CONTROLLER: LinkId = LinkId(0);
    const RADIO: LinkId = LinkId(1);

    fn bridge_links() -> LinkTable {
        LinkTable::new()
            .with_link(CONTROLLER, MASTER)
            .with_route("ARM1", RADIO)
            .with_route("ARM2", RADIO)
            .with_route(CENTERPIECE, RADIO)
    }

    fn hop_insert() -> HopInsertPolicy {
        HopInsertPolicy::new(HopInsertConfig::default().with_follow_up("SEND_STAR", "STAR_ARRIVED"))
    }

    #[test]
    fn hop_insert_prepends_relay_label_and_routes_reply_back() {
        let policy = hop_insert();
        let links = bridge_links();
        let mut correlations = CorrelationTable::new();

        let request = Message::new(REQUEST, "MAKE_STAR")
            .with_address("ARM1")
            .with_param("size", "10");
        let route = policy
            .resolve(&request, CONTROLLER, &links, &mut correlations)
            .unwrap();
        assert_eq!(route.egress, RADIO);
        assert_eq!(route.destination, "ARM1");
        assert_eq!(route.message.address_chain, vec!["MASTER", "ARM1"]);
        assert_eq!(route.message.parameters, request.parameters);

        let reply = Message::new(CONFIRM, "MAKE_STAR");
        let back = policy
            .resolve(&reply, RADIO, &links, &mut correlations)
            .unwrap();
        assert_eq!(back.egress, CONTROLLER);
        assert_eq!(back.message.address_chain, vec!["ARM1", "MASTER"]);
        assert_eq!(back.message.kind, "CONFIRM");
    }

    #[test]
    fn hop_insert_ignores_reply_address_chain() {
        let policy = hop_insert();
        let links = bridge_links();
        let mut correlations = CorrelationTable::new();
        correlations.set("CANCEL_STAR", "ARM2");

        let reply = parse("!!MASTER:CONFIRM:CANCEL_STAR##").unwrap();
        let back = policy
            .resolve(&reply, RADIO, &links, &mut correlations)
            .unwrap();
        assert_eq!(back.message.address_chain, vec!["ARM2", "MASTER"]);
    }

    #[test]
    fn correlation_overwrite_loses_the_first_origin() {
        let policy = hop_insert();
        let links = bridge_links();
        let mut correlations = CorrelationTable::new();

        for arm in ["ARM1", "ARM2"] {
            let request = Message::new(REQUEST, "MAKE_STAR").with_address(arm);
            policy
                .resolve(&request, CONTROLLER, &links, &mut correlations)
                .unwrap();
        }

        // Both arms confirm; both confirmations go to ARM2.
        for _ in 0..2 {
            let back = policy
                .resolve(&Message::new(CONFIRM, "MAKE_STAR"), RADIO, &links, &mut correlations)
                .unwrap();
            assert_eq!(back.message.address_chain, vec!["ARM2", "MASTER"]);
        }
    }

    #[test]
    fn follow_up_command_resolves_to_the_same_origin() {
        let policy = hop_insert();
        let links = bridge_links();
        let mut correlations = CorrelationTable::new();

        let request = Message::new(REQUEST, "SEND_STAR").with_address("ARM2");
        policy
            .resolve(&request, CONTROLLER, &links, &mut correlations)
            .unwrap();
        assert_eq!(correlations.get("STAR_ARRIVED"), Some("ARM2"));

        let arrived = Message::new(REQUEST, "STAR_ARRIVED")
            .with_address("MASTER")
            .with_param("arm", "ARM2");
        let back = policy
            .resolve(&arrived, RADIO, &links, &mut correlations)
            .unwrap();
        assert_eq!(back.message.address_chain, vec!["ARM2", "MASTER"]);
        assert_eq!(back.message.param("arm"), Some("ARM2"));
    }

    #[test]
    fn hop_insert_rejects_bad_requests() {
        let policy = hop_insert();
        let links = bridge_links();
        let mut correlations = CorrelationTable::new();

        let addressless = Message::new(REQUEST, "MAKE_STAR");
        assert_eq!(
            policy.resolve(&addressless, CONTROLLER, &links, &mut correlations),
            Err(Undeliverable::EmptyAddressChain)
        );

        let confirm = Message::new(CONFIRM, "MAKE_STAR").with_address("ARM1");
        assert!(matches!(
            policy.resolve(&confirm, CONTROLLER, &links, &mut correlations),
            Err(Undeliverable::UnexpectedKind { .. })
        ));

        let unknown = Message::new(REQUEST, "MAKE_STAR").with_address("ARM9");
        assert_eq!(
            policy.resolve(&unknown, CONTROLLER, &links, &mut correlations),
            Err(Undeliverable::UnknownLabel("ARM9".into()))
        );
        assert!(correlations.is_empty());
    }

    #[test]
    fn hop_insert_reply_without_request_is_undeliverable() {
        let policy = hop_insert();
        let mut correlations = CorrelationTable::new();

        assert_eq!(
            policy.resolve(
                &Message::new(CONFIRM, "ADD_STAR"),
                RADIO,
                &bridge_links(),
                &mut correlations
            ),
            Err(Undeliverable::CorrelationMiss("ADD_STAR".into()))
        );
    }

    #[test]
    fn strict_pair_rewrites_chain_to_sender_and_destination() {
        let links = LinkTable::hub();
        let mut correlations = CorrelationTable::new();

        let request = parse("!!NOISE:ARM1:REQUEST:MAKE_STAR{size=120,color=RED}##").unwrap();
        let route = StrictPairPolicy
            .resolve(&request, LinkId(0), &links, &mut correlations)
            .unwrap();
        assert_eq!(route.egress, LinkId(1));
        assert_eq!(route.message.address_chain, vec!["MASTER", "ARM1"]);
        assert_eq!(route.message.parameters, request.parameters);
        assert!(correlations.is_empty());
    }

    #[test]
    fn strict_pair_skips_the_senders_own_label() {
        let links = LinkTable::hub();
        let mut correlations = CorrelationTable::new();

        let reply = parse("!!ARM3:MASTER:CONFIRM:MAKE_STAR##").unwrap();
        let route = StrictPairPolicy
            .resolve(&reply, LinkId(3), &links, &mut correlations)
            .unwrap();
        assert_eq!(route.egress, LinkId(0));
        assert_eq!(route.message.address_chain, vec!["ARM3", "MASTER"]);
    }

    #[test]
    fn strict_pair_peer_to_peer() {
        let links = LinkTable::hub();
        let mut correlations = CorrelationTable::new();

        let msg = parse("!!CENTERPIECE:REQUEST:PING##").unwrap();
        let route = StrictPairPolicy
            .resolve(&msg, LinkId(2), &links, &mut correlations)
            .unwrap();
        assert_eq!(route.egress, LinkId(6));
        assert_eq!(route.message.address_chain, vec!["ARM2", "CENTERPIECE"]);
    }

    #[test]
    fn strict_pair_only_own_label_is_undeliverable() {
        let links = LinkTable::hub();
        let mut correlations = CorrelationTable::new();

        let msg = parse("!!ARM1:REQUEST:MAKE_STAR##").unwrap();
        assert_eq!(
            StrictPairPolicy.resolve(&msg, LinkId(1), &links, &mut correlations),
            Err(Undeliverable::NoPeerLabel)
        );

        let unknown_only = parse("!!ARM7:REQUEST:MAKE_STAR##").unwrap();
        assert_eq!(
            StrictPairPolicy.resolve(&unknown_only, LinkId(0), &links, &mut correlations),
            Err(Undeliverable::NoPeerLabel)
        );
    }

    #[test]
    fn strict_pair_unlabelled_ingress_is_undeliverable() {
        let msg = parse("!!ARM1:REQUEST:MAKE_STAR##").unwrap();
        assert_eq!(
            StrictPairPolicy.resolve(
                &msg,
                LinkId(42),
                &LinkTable::hub(),
                &mut CorrelationTable::new()
            ),
            Err(Undeliverable::UnknownIngress(LinkId(42)))
        );
    }

    #[test]
    fn policy_kind_parses_and_builds() {
        assert_eq!(
            "strict-pair".parse::<RoutingPolicyKind>(),
            Ok(RoutingPolicyKind::StrictPair)
        );
        assert!("pairwise".parse::<RoutingPolicyKind>().is_err());
        assert_eq!(RoutingPolicyKind::HopInsert.into_policy().name(), "hop-insert");
        assert_eq!(RoutingPolicyKind::StrictPair.to_string(), "strict-pair");
    }
}
