use crate::error::ParseError;
use crate::extract::{END_SENTINEL, START_SENTINEL};
use crate::message::{Message, Parameters};

const LABEL_SEPARATOR: char = ':';
const PARAMS_OPEN: char = '{';
const PARAMS_CLOSE: char = '}';
const PARAM_SEPARATOR: char = ',';
const KEY_VALUE_SEPARATOR: char = '=';

/// Encode a message into frame text.
///
/// Wire format:
/// ```text
/// !! [label:]* kind : command [ { key[=value] [,key[=value]]* } ] ##
/// ```
///
/// Parameters are emitted in key order. Fields are written verbatim; the
/// grammar has no escaping, so delimiter characters inside a field do not
/// survive a round trip.
pub fn build(message: &Message) -> String {
    let mut out = String::with_capacity(frame_len_hint(message));
    out.push_str("!!");
    for label in &message.address_chain {
        out.push_str(label);
        out.push(LABEL_SEPARATOR);
    }
    out.push_str(&message.kind);
    out.push(LABEL_SEPARATOR);
    out.push_str(&message.command);

    if !message.parameters.is_empty() {
        out.push(PARAMS_OPEN);
        for (i, (key, value)) in message.parameters.iter().enumerate() {
            if i > 0 {
                out.push(PARAM_SEPARATOR);
            }
            out.push_str(key);
            if !value.is_empty() {
                out.push(KEY_VALUE_SEPARATOR);
                out.push_str(value);
            }
        }
        out.push(PARAMS_CLOSE);
    }

    out.push_str("##");
    out
}

/// Decode frame text into a message.
///
/// The text must be exactly one frame, sentinels included. Header tokens are
/// taken verbatim; parameter keys and values are trimmed, and a repeated key
/// keeps its last value.
pub fn parse(frame: &str) -> Result<Message, ParseError> {
    let sentinels = START_SENTINEL.len() + END_SENTINEL.len();
    if frame.len() < sentinels
        || !frame.as_bytes().starts_with(START_SENTINEL)
        || !frame.as_bytes().ends_with(END_SENTINEL)
    {
        return Err(ParseError::MissingSentinel);
    }
    let core = &frame[START_SENTINEL.len()..frame.len() - END_SENTINEL.len()];

    let (header, params_text) = split_parameter_block(core)?;

    let mut tokens: Vec<&str> = header.split(LABEL_SEPARATOR).collect();
    if tokens.len() < 2 {
        return Err(ParseError::IncompleteHeader);
    }
    let command = tokens.pop().unwrap_or_default();
    let kind = tokens.pop().unwrap_or_default();
    if kind.is_empty() || command.is_empty() {
        return Err(ParseError::IncompleteHeader);
    }

    Ok(Message {
        address_chain: tokens.into_iter().map(str::to_owned).collect(),
        kind: kind.to_owned(),
        command: command.to_owned(),
        parameters: params_text.map(parse_parameters).unwrap_or_default(),
    })
}

/// Split `core` into header and the text between the braces, if any.
fn split_parameter_block(core: &str) -> Result<(&str, Option<&str>), ParseError> {
    let Some(open) = core.find(PARAMS_OPEN) else {
        if core.contains(PARAMS_CLOSE) {
            return Err(ParseError::MalformedParameterBlock);
        }
        return Ok((core, None));
    };

    // The block must close at the very end of the frame body.
    if !core.ends_with(PARAMS_CLOSE) {
        return Err(ParseError::MalformedParameterBlock);
    }
    let inner = &core[open + 1..core.len() - 1];
    if inner.contains([PARAMS_OPEN, PARAMS_CLOSE]) {
        return Err(ParseError::MalformedParameterBlock);
    }
    Ok((&core[..open], Some(inner)))
}

fn parse_parameters(text: &str) -> Parameters {
    let mut params = Parameters::new();
    for entry in text.split(PARAM_SEPARATOR).map(str::trim) {
        if entry.is_empty() {
            continue;
        }
        match entry.split_once(KEY_VALUE_SEPARATOR) {
            Some((key, value)) => params.insert(key.trim().to_owned(), value.trim().to_owned()),
            None => params.insert(entry.to_owned(), String::new()),
        };
    }
    params
}

fn frame_len_hint(message: &Message) -> usize {
    let labels: usize = message.address_chain.iter().map(|l| l.len() + 1).sum();
    let params: usize = message
        .parameters
        .iter()
        .map(|(k, v)| k.len() + v.len() + 2)
        .sum();
    START_SENTINEL.len()
        + labels
        + message.kind.len()
        + 1
        + message.command.len()
        + params
        + 2
        + END_SENTINEL.len()
}
