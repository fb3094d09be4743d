use std::io::Read;

use bytes::BytesMut;
use starwire::frame::{drain_frames, parse, Message};
use tracing::{debug, warn};

use crate::cmd::ParseArgs;
use crate::exit::{io_error, parse_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ParseArgs, format: OutputFormat) -> CliResult<i32> {
    match args.frame {
        Some(frame) => {
            let message = parse(&frame).map_err(|err| parse_error("parse", &frame, err))?;
            print_message(&message, format);
            Ok(SUCCESS)
        }
        None => parse_stream(std::io::stdin().lock(), format),
    }
}

/// Extract every frame from `input`, print the good ones and fail if any
/// were malformed.
fn parse_stream(mut input: impl Read, format: OutputFormat) -> CliResult<i32> {
    let mut raw = Vec::new();
    input
        .read_to_end(&mut raw)
        .map_err(|err| io_error("read stdin", err))?;

    let (messages, malformed) = parse_all(&raw);
    if messages.is_empty() && malformed == 0 {
        return Err(CliError::new(DATA_INVALID, "parse: no frames on stdin"));
    }
    for message in &messages {
        print_message(message, format);
    }
    if malformed > 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("parse: {malformed} malformed frame(s)"),
        ));
    }
    Ok(SUCCESS)
}

fn parse_all(raw: &[u8]) -> (Vec<Message>, usize) {
    let mut buf = BytesMut::from(raw);
    let mut messages = Vec::new();
    let mut malformed = 0usize;
    for frame in drain_frames(&mut buf) {
        match parse(&frame) {
            Ok(message) => messages.push(message),
            Err(err) => {
                warn!(%frame, error = %err, "malformed frame");
                malformed += 1;
            }
        }
    }
    if !buf.is_empty() {
        debug!(leftover = buf.len(), "incomplete frame at end of input");
    }
    (messages, malformed)
}
