use starwire::frame::build;
use starwire::node::{NodeError, RoutingPolicyKind};
use starwire::sim::{demo_script, StarShow, Wiring};
use tracing::info;

use crate::cmd::SimulateArgs;
use crate::exit::{frame_error, node_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_exchange, OutputFormat};

pub fn run(args: SimulateArgs, format: OutputFormat) -> CliResult<i32> {
    if args.iterations == 0 {
        return Err(CliError::new(USAGE, "simulate: --iterations must be at least 1"));
    }
    let policy = RoutingPolicyKind::from(args.policy);
    let wiring = Wiring::from(args.transport);
    let mut show =
        StarShow::new(policy, wiring).map_err(|err| transport_error("simulate: wiring", err))?;
    info!(%policy, %wiring, devices = ?show.devices(), "rig ready");

    let frames = if args.frames.is_empty() {
        demo_script().iter().map(build).collect()
    } else {
        args.frames
    };

    let mut first_drop: Option<NodeError> = None;
    for frame in &frames {
        let exchange = show
            .exchange(frame, args.iterations)
            .map_err(|err| frame_error("simulate: controller write", err))?;
        print_exchange(&exchange, format);
        if first_drop.is_none() {
            first_drop = exchange.summary.dropped.into_iter().next();
        }
    }

    match first_drop {
        Some(err) if args.fail_on_drop => Err(node_error("simulate", err)),
        _ => Ok(SUCCESS),
    }
}
