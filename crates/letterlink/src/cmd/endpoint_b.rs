use letterlink_peer::{RelayConfig, RelayServer, Shutdown};
use letterlink_transport::resolve;
use tracing::info;

use crate::cmd::{install_ctrlc_handler, parse_duration, EndpointBArgs};
use crate::exit::{peer_error, transport_error, CliResult, SUCCESS};

pub fn run(args: EndpointBArgs) -> CliResult<i32> {
    let tcp_timeout = parse_duration(&args.tcp_timeout)?;
    let bind = resolve((args.bind.as_str(), args.udp_port))
        .map_err(|err| transport_error("invalid bind address", err))?;
    let upstream = resolve((args.a_host.as_str(), args.tcp_port))
        .map_err(|err| transport_error("invalid endpoint A address", err))?;

    let shutdown = Shutdown::new();
    install_ctrlc_handler(shutdown.clone())?;

    let config = RelayConfig {
        tcp_timeout,
        ..RelayConfig::default()
    };
    let relay = RelayServer::bind(bind, upstream, config)
        .map_err(|err| peer_error("udp bind failed", err))?;

    relay
        .serve(&shutdown)
        .map_err(|err| peer_error("udp relay failed", err))?;

    info!("endpoint B stopped");
    Ok(SUCCESS)
}
