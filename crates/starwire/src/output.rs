use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use starwire::frame::{build, FrameError, Message, Parameters};
use starwire::sim::Exchange;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    frame: String,
    #[serde(flatten)]
    message: &'a Message,
}

impl<'a> MessageOutput<'a> {
    fn new(message: &'a Message) -> Self {
        Self {
            frame: build(message),
            message,
        }
    }
}

#[derive(Serialize)]
struct ExchangeOutput<'a> {
    sent: &'a str,
    received: Vec<MessageOutput<'a>>,
    malformed: Vec<String>,
    written: usize,
    dropped: usize,
}

pub fn print_message(message: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&MessageOutput::new(message)),
        OutputFormat::Table => {
            let mut table = message_table();
            table.add_row(message_row(message));
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", pretty(message)),
        OutputFormat::Raw => print_line(&build(message)),
    }
}

pub fn print_exchange(exchange: &Exchange, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ExchangeOutput {
                sent: &exchange.sent,
                received: exchange.replies().map(MessageOutput::new).collect(),
                malformed: malformed(exchange).collect(),
                written: exchange.summary.sent,
                dropped: exchange.summary.dropped.len(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DIR", "CHAIN", "KIND", "COMMAND", "PARAMS"]);
            table.add_row(vec![
                "sent".to_string(),
                String::new(),
                String::new(),
                String::new(),
                exchange.sent.clone(),
            ]);
            for reply in exchange.replies() {
                let mut row = vec!["recv".to_string()];
                row.extend(message_row(reply));
                table.add_row(row);
            }
            for frame in malformed(exchange) {
                table.add_row(vec![
                    "bad".to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    frame,
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("sent {}", exchange.sent);
            for reply in exchange.replies() {
                println!("  recv {}", pretty(reply));
            }
            for frame in malformed(exchange) {
                println!("  bad  {frame}");
            }
            if !exchange.summary.dropped.is_empty() {
                println!("  ({} dropped)", exchange.summary.dropped.len());
            }
        }
        OutputFormat::Raw => {
            for reply in exchange.replies() {
                print_line(&build(reply));
            }
        }
    }
}

fn message_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["CHAIN", "KIND", "COMMAND", "PARAMS"]);
    table
}

fn message_row(message: &Message) -> Vec<String> {
    vec![
        message.address_chain.join(" > "),
        message.kind.clone(),
        message.command.clone(),
        params_text(&message.parameters),
    ]
}

fn pretty(message: &Message) -> String {
    let chain = if message.address_chain.is_empty() {
        "-".to_string()
    } else {
        message.address_chain.join(">")
    };
    format!(
        "chain={chain} kind={} command={} params={}",
        message.kind,
        message.command,
        params_text(&message.parameters)
    )
}

fn params_text(params: &Parameters) -> String {
    params
        .iter()
        .map(|(key, value)| {
            if value.is_empty() {
                key.clone()
            } else {
                format!("{key}={value}")
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn malformed(exchange: &Exchange) -> impl Iterator<Item = String> + '_ {
    exchange.received.iter().filter_map(|reply| match reply {
        Err(FrameError::Malformed { frame, .. }) => Some(frame.clone()),
        _ => None,
    })
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_line(text: &str) {
    let mut out = std::io::stdout();
    let _ = writeln!(out, "{text}");
    let _ = out.flush();
}
