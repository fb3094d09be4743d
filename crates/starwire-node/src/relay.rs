use std::collections::BTreeMap;

use starwire_frame::{write_message, FrameReader};
use starwire_transport::Link;
use tracing::{info, warn};

use crate::error::{NodeError, Undeliverable};
use crate::links::LinkId;
use crate::policy::Route;
use crate::router::AddressRouter;

type BoxedLink = Box<dyn Link + Send>;

/// Outcome of one poll cycle.
#[derive(Debug, Default)]
pub struct PollSummary {
    /// Complete frames taken off the links.
    pub received: usize,
    /// Frames written out.
    pub sent: usize,
    /// Every frame or message that was dropped, with the reason.
    pub dropped: Vec<NodeError>,
}

impl PollSummary {
    /// True when the cycle found nothing to do.
    pub fn is_idle(&self) -> bool {
        self.received == 0
    }

    pub fn merge(&mut self, other: PollSummary) {
        self.received += other.received;
        self.sent += other.sent;
        self.dropped.extend(other.dropped);
    }

    fn drop_with(&mut self, link: LinkId, err: NodeError) {
        warn!(%link, category = err.category(), error = %err, "message dropped");
        self.dropped.push(err);
    }
}

/// Forwards messages between attached links.
///
/// Each poll visits every link in ascending id order: drain the bytes the
/// link has ready, extract every complete frame, route it and write it to
/// its egress link. Errors are logged and collected; they never stop the
/// cycle.
pub struct Relay {
    router: AddressRouter,
    ports: BTreeMap<LinkId, FrameReader<BoxedLink>>,
}

impl Relay {
    pub fn new(router: AddressRouter) -> Self {
        Self {
            router,
            ports: BTreeMap::new(),
        }
    }

    /// Attach `link` as `id`, replacing any link already attached there.
    pub fn attach(&mut self, id: LinkId, link: impl Link + Send + 'static) {
        let boxed: BoxedLink = Box::new(link);
        self.ports.insert(id, FrameReader::new(boxed));
    }

    pub fn with_link(mut self, id: LinkId, link: impl Link + Send + 'static) -> Self {
        self.attach(id, link);
        self
    }

    /// Run one poll cycle over every attached link.
    pub fn poll(&mut self) -> PollSummary {
        let mut summary = PollSummary::default();
        let ids: Vec<LinkId> = self.ports.keys().copied().collect();
        for id in ids {
            self.poll_link(id, &mut summary);
        }
        summary
    }

    fn poll_link(&mut self, ingress: LinkId, summary: &mut PollSummary) {
        let Some(port) = self.ports.get_mut(&ingress) else {
            return;
        };
        for incoming in port.poll_messages() {
            summary.received += 1;
            let message = match incoming {
                Ok(message) => message,
                Err(err) => {
                    summary.drop_with(ingress, err.into());
                    continue;
                }
            };

            let route = match self.router.resolve(&message, ingress) {
                Ok(route) => route,
                Err(reason) => {
                    summary.drop_with(
                        ingress,
                        NodeError::Undeliverable {
                            message: message.to_string(),
                            reason,
                        },
                    );
                    continue;
                }
            };

            match self.dispatch(&route) {
                Ok(frame) => {
                    info!(%ingress, egress = %route.egress, %frame, "forwarded");
                    summary.sent += 1;
                }
                Err(err) => summary.drop_with(ingress, err),
            }
        }
    }

    fn dispatch(&mut self, route: &Route) -> Result<String, NodeError> {
        let port = self
            .ports
            .get_mut(&route.egress)
            .ok_or_else(|| NodeError::Undeliverable {
                message: route.message.to_string(),
                reason: Undeliverable::UnknownLink(route.egress),
            })?;
        Ok(write_message(port.get_mut(), &route.message)?)
    }

    pub fn router(&self) -> &AddressRouter {
        &self.router
    }

    /// Ids of the attached links, ascending.
    pub fn link_ids(&self) -> Vec<LinkId> {
        self.ports.keys().copied().collect()
    }
}
