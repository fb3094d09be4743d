use clap::{Args, Subcommand, ValueEnum};

use starwire::node::RoutingPolicyKind;
use starwire::sim::Wiring;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod build;
pub mod parse;
pub mod simulate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse frames and print the messages inside them.
    Parse(ParseArgs),
    /// Build a frame from its parts.
    Build(BuildArgs),
    /// Run a controller, relay and peripherals in memory and show the traffic.
    Simulate(SimulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Parse(args) => parse::run(args, format),
        Command::Build(args) => build::run(args, format),
        Command::Simulate(args) => simulate::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Frame text, e.g. '!!ARM1:REQUEST:MAKE_STAR{size=10}##'. Reads stdin when omitted.
    pub frame: Option<String>,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Message kind.
    #[arg(long, short = 'k', default_value = "REQUEST")]
    pub kind: String,
    /// Command name.
    #[arg(long, short = 'c')]
    pub command: String,
    /// Hop label, repeatable, front to back.
    #[arg(long = "address", short = 'a', value_name = "LABEL")]
    pub addresses: Vec<String>,
    /// Parameter `key=value`, or a bare `key` flag. Repeatable.
    #[arg(long = "param", short = 'p', value_name = "KEY[=VALUE]")]
    pub params: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Relay prepends its label and correlates replies by command.
    HopInsert,
    /// Relay rewrites every chain to sender and destination.
    StrictPair,
}

impl From<PolicyArg> for RoutingPolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::HopInsert => RoutingPolicyKind::HopInsert,
            PolicyArg::StrictPair => RoutingPolicyKind::StrictPair,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum WiringArg {
    Loopback,
    Unix,
}

impl From<WiringArg> for Wiring {
    fn from(arg: WiringArg) -> Self {
        match arg {
            WiringArg::Loopback => Wiring::Loopback,
            WiringArg::Unix => Wiring::Unix,
        }
    }
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Relay addressing policy.
    #[arg(long, value_name = "POLICY", default_value = "hop-insert")]
    pub policy: PolicyArg,
    /// Poll rounds to run after each sent frame.
    #[arg(long, short = 'n', default_value = "6")]
    pub iterations: usize,
    /// Link implementation between the actors.
    #[arg(long, value_name = "WIRING", default_value = "loopback")]
    pub transport: WiringArg,
    /// Exit non-zero if the relay or a device dropped anything.
    #[arg(long)]
    pub fail_on_drop: bool,
    /// Frames to send from the controller. Runs the star-show script when omitted.
    pub frames: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
