//! A complete star-show rig in one process.
//!
//! The rig wires a controller end, a [`Relay`] and the peripheral
//! [`Device`]s together over in-memory links (or non-blocking Unix stream
//! pairs), so a session can be driven and observed without hardware.
//!
//! With hop-insert routing every arm and the centerpiece sit behind a single
//! radio bridge on relay link 1. With strict-pair routing each actor gets
//! its own link, numbered as in [`LinkTable::hub`].

use std::fmt;
use std::str::FromStr;

use starwire_frame::{write_frame, FrameError, FrameReader, Message, CONFIRM, REQUEST};
use starwire_node::{
    arm_label, AddressRouter, CommandRegistry, Device, HopInsertConfig, HopInsertPolicy, LinkId,
    LinkTable, PollSummary, Relay, RoutingPolicyKind, StrictPairPolicy, CENTERPIECE, HUB_ARMS,
    MASTER,
};
use starwire_transport::{Link, LoopbackLink, TransportError};

type BoxedLink = Box<dyn Link + Send>;

/// Label the hop-insert radio bridge answers to in logs.
pub const BRIDGE: &str = "ESP";

/// How the rig's links are realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wiring {
    /// In-memory queues.
    #[default]
    Loopback,
    /// Non-blocking `UnixStream` pairs.
    Unix,
}

impl Wiring {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loopback => "loopback",
            Self::Unix => "unix",
        }
    }

    fn pair(self) -> Result<(BoxedLink, BoxedLink), TransportError> {
        match self {
            Self::Loopback => {
                let (a, b) = LoopbackLink::pair();
                Ok((Box::new(a), Box::new(b)))
            }
            #[cfg(unix)]
            Self::Unix => {
                let (a, b) = std::os::unix::net::UnixStream::pair()?;
                Ok((
                    Box::new(starwire_transport::StreamLink::unix(a)?),
                    Box::new(starwire_transport::StreamLink::unix(b)?),
                ))
            }
            #[cfg(not(unix))]
            Self::Unix => Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "unix stream links are not available on this platform",
            ))),
        }
    }
}

impl fmt::Display for Wiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Wiring {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loopback" => Ok(Self::Loopback),
            "unix" => Ok(Self::Unix),
            other => Err(format!("unknown wiring {other:?}")),
        }
    }
}

/// The command set every simulated peripheral understands.
///
/// Replies go to the request's first label. `SEND_STAR` is confirmed and
/// followed by a `STAR_ARRIVED` report naming the arm.
pub fn star_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for command in ["MAKE_STAR", "CANCEL_STAR", "ADD_STAR"] {
        registry.register(command, confirm);
    }
    registry.register("SEND_STAR", |request: &Message| {
        let arm = request.destination().unwrap_or_default().to_string();
        let arrived = Message::new(REQUEST, "STAR_ARRIVED")
            .with_addresses(reply_chain(request))
            .with_param("arm", arm)
            .with_param("speed", "3")
            .with_param("color", "red")
            .with_param("brightness", "80")
            .with_param("size", "10");
        let mut replies = confirm(request);
        replies.push(arrived);
        replies
    });
    registry
}

fn confirm(request: &Message) -> Vec<Message> {
    vec![Message::new(CONFIRM, request.command.clone()).with_addresses(reply_chain(request))]
}

fn reply_chain(request: &Message) -> Vec<String> {
    vec![request.origin().unwrap_or(MASTER).to_string()]
}

/// The scripted session: make a star on ARM1, fly it, cancel it, then add
/// one to the centerpiece.
pub fn demo_script() -> Vec<Message> {
    let arm = arm_label(1);
    vec![
        Message::new(REQUEST, "MAKE_STAR")
            .with_address(arm.clone())
            .with_param("speed", "3")
            .with_param("color", "red")
            .with_param("brightness", "80")
            .with_param("size", "10"),
        Message::new(REQUEST, "SEND_STAR").with_address(arm.clone()),
        Message::new(REQUEST, "CANCEL_STAR").with_address(arm),
        Message::new(REQUEST, "ADD_STAR")
            .with_address(CENTERPIECE)
            .with_param("star", "constellation")
            .with_param("speed", "3")
            .with_param("color", "red")
            .with_param("brightness", "80")
            .with_param("size", "10"),
    ]
}

/// One frame sent by the controller and everything that came back.
#[derive(Debug, Default)]
pub struct Exchange {
    /// The frame text as written by the controller.
    pub sent: String,
    /// Frames that reached the controller, in arrival order.
    pub received: Vec<Result<Message, FrameError>>,
    /// Relay and device activity while pumping.
    pub summary: PollSummary,
}

impl Exchange {
    /// Replies that parsed cleanly.
    pub fn replies(&self) -> impl Iterator<Item = &Message> {
        self.received.iter().filter_map(|reply| reply.as_ref().ok())
    }
}

/// Controller, relay and peripherals wired together.
pub struct StarShow {
    policy: RoutingPolicyKind,
    controller: FrameReader<BoxedLink>,
    relay: Relay,
    devices: Vec<Device<BoxedLink>>,
}

impl StarShow {
    pub fn new(policy: RoutingPolicyKind, wiring: Wiring) -> Result<Self, TransportError> {
        match policy {
            RoutingPolicyKind::HopInsert => Self::bridged(wiring),
            RoutingPolicyKind::StrictPair => Self::hub(wiring),
        }
    }

    /// Controller on link 0, every actor behind one radio bridge on link 1.
    fn bridged(wiring: Wiring) -> Result<Self, TransportError> {
        let (controller, upstream) = wiring.pair()?;
        let (downstream, bridge) = wiring.pair()?;

        let mut links = LinkTable::new().with_link(LinkId(0), MASTER);
        for n in 1..=HUB_ARMS {
            links = links.with_route(arm_label(n), LinkId(1));
        }
        links = links.with_route(CENTERPIECE, LinkId(1));

        let policy =
            HopInsertPolicy::new(HopInsertConfig::default().with_follow_up("SEND_STAR", "STAR_ARRIVED"));
        let relay = Relay::new(AddressRouter::new(policy, links))
            .with_link(LinkId(0), upstream)
            .with_link(LinkId(1), downstream);

        Ok(Self {
            policy: RoutingPolicyKind::HopInsert,
            controller: FrameReader::new(controller),
            relay,
            devices: vec![Device::new(BRIDGE, bridge, star_registry())],
        })
    }

    /// One link per actor, numbered like the hub table.
    fn hub(wiring: Wiring) -> Result<Self, TransportError> {
        let links = LinkTable::hub();
        let (controller, upstream) = wiring.pair()?;
        let mut relay = Relay::new(AddressRouter::new(StrictPairPolicy, links.clone()))
            .with_link(LinkId(0), upstream);

        let mut devices = Vec::new();
        for id in links.links().into_iter().filter(|id| *id != LinkId(0)) {
            let Some(label) = links.label_of(id) else {
                continue;
            };
            let (port, device_end) = wiring.pair()?;
            relay.attach(id, port);
            devices.push(Device::new(label, device_end, star_registry()));
        }

        Ok(Self {
            policy: RoutingPolicyKind::StrictPair,
            controller: FrameReader::new(controller),
            relay,
            devices,
        })
    }

    pub fn policy(&self) -> RoutingPolicyKind {
        self.policy
    }

    /// Labels of the simulated peripherals, in link order.
    pub fn devices(&self) -> Vec<&str> {
        self.devices.iter().map(|device| device.label()).collect()
    }

    /// Write frame text from the controller without validating it.
    pub fn send_frame(&mut self, frame: &str) -> Result<(), FrameError> {
        write_frame(self.controller.get_mut(), frame)
    }

    /// Run `iterations` rounds of relay then device polling.
    ///
    /// Stops early once a whole round finds nothing to do.
    pub fn pump(&mut self, iterations: usize) -> PollSummary {
        let mut total = PollSummary::default();
        for _ in 0..iterations {
            let mut round = self.relay.poll();
            for device in &mut self.devices {
                round.merge(device.poll());
            }
            let idle = round.is_idle();
            total.merge(round);
            if idle {
                break;
            }
        }
        total
    }

    /// Everything that has reached the controller since the last call.
    pub fn collect(&mut self) -> Vec<Result<Message, FrameError>> {
        self.controller.poll_messages()
    }

    /// Send one frame, pump, and collect what came back.
    pub fn exchange(&mut self, frame: &str, iterations: usize) -> Result<Exchange, FrameError> {
        self.send_frame(frame)?;
        let summary = self.pump(iterations);
        Ok(Exchange {
            sent: frame.to_string(),
            received: self.collect(),
            summary,
        })
    }
}

impl fmt::Debug for StarShow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StarShow")
            .field("policy", &self.policy)
            .field("router", self.relay.router())
            .field("devices", &self.devices())
            .finish()
    }
}
