mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{LogFormat, LogLevel, LogSettings};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "starwire", version, about = "Star-show frame codec and relay simulator")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "warn",
        env = "STARWIRE_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    LogSettings {
        format: cli.log_format,
        level: cli.log_level,
    }
    .install();

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
