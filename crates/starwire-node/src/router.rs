use starwire_frame::Message;
use tracing::debug;

use crate::correlation::CorrelationTable;
use crate::error::Undeliverable;
use crate::links::{LinkId, LinkTable};
use crate::policy::{Route, RoutingPolicy, RoutingPolicyKind};

/// Decides the outgoing message and link for every incoming message.
///
/// Owns its addressing policy, the label/link lookup and the correlation
/// table. The policy is fixed at construction. When link pollers run in
/// parallel, every call to [`resolve`](Self::resolve) must go through one
/// lock around the router so that correlation overwrites stay ordered.
pub struct AddressRouter {
    policy: Box<dyn RoutingPolicy>,
    links: LinkTable,
    correlations: CorrelationTable,
}

impl AddressRouter {
    pub fn new(policy: impl RoutingPolicy + 'static, links: LinkTable) -> Self {
        Self::with_boxed_policy(Box::new(policy), links)
    }

    pub fn with_boxed_policy(policy: Box<dyn RoutingPolicy>, links: LinkTable) -> Self {
        Self {
            policy,
            links,
            correlations: CorrelationTable::new(),
        }
    }

    /// Router using `kind` with its default settings.
    pub fn for_kind(kind: RoutingPolicyKind, links: LinkTable) -> Self {
        Self::with_boxed_policy(kind.into_policy(), links)
    }

    /// Compute where `message`, received on `ingress`, goes next.
    pub fn resolve(&mut self, message: &Message, ingress: LinkId) -> Result<Route, Undeliverable> {
        let route = self
            .policy
            .resolve(message, ingress, &self.links, &mut self.correlations)?;
        debug!(
            policy = self.policy.name(),
            %ingress,
            egress = %route.egress,
            destination = %route.destination,
            "route resolved"
        );
        Ok(route)
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    pub fn correlations(&self) -> &CorrelationTable {
        &self.correlations
    }
}

impl std::fmt::Debug for AddressRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressRouter")
            .field("policy", &self.policy.name())
            .field("links", &self.links)
            .field("correlations", &self.correlations)
            .finish()
    }
}
