use bytes::BytesMut;
use starwire::frame::{drain_frames, is_well_known, parse, Message};
use tracing::{debug, warn};

use crate::cmd::BuildArgs;
use crate::exit::{parse_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: BuildArgs, format: OutputFormat) -> CliResult<i32> {
    let message = assemble(args)?;
    print_message(&message, format);
    Ok(SUCCESS)
}

fn assemble(args: BuildArgs) -> CliResult<Message> {
    check_token("kind", &args.kind)?;
    check_token("command", &args.command)?;
    for label in &args.addresses {
        check_token("address", label)?;
    }
    if !is_well_known(&args.kind) {
        warn!(kind = %args.kind, "kind is not REQUEST or CONFIRM");
    }

    let mut message = Message::new(args.kind, args.command).with_addresses(args.addresses);
    for entry in &args.params {
        let (key, value) = split_param(entry)?;
        check_param("parameter key", key, &["="])?;
        check_param("parameter value", value, &[])?;
        message = message.with_param(key, value);
    }

    // No escaping on the wire: the frame must survive extraction and parsing unchanged.
    let frame = starwire::frame::build(&message);
    let mut wire = BytesMut::from(frame.as_bytes());
    let extracted = drain_frames(&mut wire);
    if extracted.len() != 1 || extracted[0] != frame || !wire.is_empty() {
        return Err(CliError::new(
            USAGE,
            format!("build: {frame:?} would not arrive as one frame"),
        ));
    }
    let reparsed = parse(&frame).map_err(|err| parse_error("build", &frame, err))?;
    if reparsed != message {
        return Err(CliError::new(
            USAGE,
            format!("build: {frame:?} does not parse back to the given parts"),
        ));
    }
    debug!(%frame, "frame built");
    Ok(message)
}

fn split_param(entry: &str) -> CliResult<(&str, &str)> {
    let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() {
        return Err(CliError::new(
            USAGE,
            format!("build: parameter {entry:?} has no key"),
        ));
    }
    Ok((key, value))
}

fn check_param(what: &str, text: &str, extra: &[&str]) -> CliResult<()> {
    let reserved = ["##", "!!", "{", "}", ","];
    if let Some(found) = reserved.iter().chain(extra).find(|bad| text.contains(**bad)) {
        return Err(CliError::new(
            USAGE,
            format!("build: {what} {text:?} contains reserved {found:?}"),
        ));
    }
    Ok(())
}

fn check_token(what: &str, token: &str) -> CliResult<()> {
    if token.is_empty() || token.contains([':', '{', '}']) || token.contains("##") {
        return Err(CliError::new(
            USAGE,
            format!("build: {what} {token:?} must be non-empty and free of ':', '{{', '}}' and \"##\""),
        ));
    }
    Ok(())
}
