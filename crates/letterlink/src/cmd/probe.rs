use letterlink_frame::LetterTriple;
use letterlink_peer::query_upstream;
use letterlink_transport::resolve;

use crate::cmd::{parse_duration, ProbeArgs};
use crate::exit::{peer_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_response, OutputFormat};

pub fn run(args: ProbeArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let letters = LetterTriple::from_slice(args.letters.as_bytes()).map_err(|_| {
        CliError::new(
            USAGE,
            format!(
                "letters must be exactly 3 bytes, got {}",
                args.letters.len()
            ),
        )
    })?;
    let addr = resolve((args.a_host.as_str(), args.tcp_port))
        .map_err(|err| transport_error("invalid endpoint A address", err))?;

    let response =
        query_upstream(addr, &letters, timeout).map_err(|err| peer_error("probe failed", err))?;
    print_response(&letters, &response, format);
    Ok(SUCCESS)
}
