use std::time::Duration;

use clap::{Args, Subcommand};
use letterlink_peer::Shutdown;

use crate::exit::{CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod endpoint_a;
pub mod endpoint_b;
pub mod probe;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve letter requests over TCP and ask endpoint B for sums over UDP.
    EndpointA(EndpointAArgs),
    /// Relay UDP requests to endpoint A over TCP and answer with sums.
    EndpointB(EndpointBArgs),
    /// Send one TCP request to endpoint A and print the response.
    Probe(ProbeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::EndpointA(args) => endpoint_a::run(args, format),
        Command::EndpointB(args) => endpoint_b::run(args),
        Command::Probe(args) => probe::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EndpointAArgs {
    /// Address the TCP server binds to.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,
    /// TCP server port.
    #[arg(long, default_value_t = 5001)]
    pub tcp_port: u16,
    /// Endpoint B host.
    #[arg(long, default_value = "127.0.0.1")]
    pub b_host: String,
    /// Endpoint B UDP port.
    #[arg(long, default_value_t = 5000)]
    pub udp_port: u16,
    /// How long to wait for each reply before retrying (e.g. 500ms, 2s).
    #[arg(long, default_value = "500ms")]
    pub timeout: String,
    /// Keep requesting sums until interrupted.
    #[arg(long = "loop")]
    pub keep_going: bool,
}

#[derive(Args, Debug)]
pub struct EndpointBArgs {
    /// Address the UDP server binds to.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,
    /// UDP server port.
    #[arg(long, default_value_t = 5000)]
    pub udp_port: u16,
    /// Endpoint A host.
    #[arg(long, default_value = "127.0.0.1")]
    pub a_host: String,
    /// Endpoint A TCP port.
    #[arg(long, default_value_t = 5001)]
    pub tcp_port: u16,
    /// Bound on each TCP exchange with endpoint A (e.g. 3s, 800ms).
    #[arg(long, default_value = "3s")]
    pub tcp_timeout: String,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Exactly three ASCII bytes to send.
    pub letters: String,
    /// Endpoint A host.
    #[arg(long, default_value = "127.0.0.1")]
    pub a_host: String,
    /// Endpoint A TCP port.
    #[arg(long, default_value_t = 5001)]
    pub tcp_port: u16,
    /// Connect, write, and read timeout (e.g. 3s, 500ms).
    #[arg(long, default_value = "3s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `3s`, `0.5s`, or a bare number of seconds such as `0.5`.
///
/// Milliseconds must be whole; seconds may be fractional.
pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }
    let invalid = || CliError::new(USAGE, format!("invalid duration value: {input}"));

    let duration = if let Some(num) = input.strip_suffix("ms") {
        let millis: u64 = num.parse().map_err(|_| invalid())?;
        Duration::from_millis(millis)
    } else {
        let num = input.strip_suffix('s').unwrap_or(input);
        let secs: f64 = num.parse().map_err(|_| invalid())?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(invalid());
        }
        Duration::try_from_secs_f64(secs).map_err(|_| invalid())?
    };

    if duration.is_zero() {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }
    Ok(duration)
}

/// Trigger `shutdown` on Ctrl-C.
pub(crate) fn install_ctrlc_handler(shutdown: Shutdown) -> CliResult<()> {
    ctrlc::set_handler(move || shutdown.trigger()).map_err(|err| {
        CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
    })
}
