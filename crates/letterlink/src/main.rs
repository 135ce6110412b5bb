mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "letterlink",
    version,
    about = "Letter-triple exchange over UDP and TCP"
)]
struct Cli {
    /// Result output format (stdout).
    #[arg(long, value_name = "FORMAT", default_value = "plain", global = true)]
    format: OutputFormat,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Shortcut for `--log-level debug`.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose {
        cli.log_level.at_least(LogLevel::Debug)
    } else {
        cli.log_level
    };
    init_logging(cli.log_format, level);

    match cmd::run(cli.command, cli.format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
