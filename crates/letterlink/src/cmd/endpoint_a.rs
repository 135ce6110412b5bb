use std::thread;

use letterlink_peer::{ClientConfig, LetterClient, LetterServer, ServerConfig, Shutdown};
use letterlink_transport::resolve;
use tracing::{info, warn};

use crate::cmd::{install_ctrlc_handler, parse_duration, EndpointAArgs};
use crate::exit::{io_error, peer_error, transport_error, CliResult, INTERRUPTED, SUCCESS};
use crate::output::{print_sum, OutputFormat};

pub fn run(args: EndpointAArgs, format: OutputFormat) -> CliResult<i32> {
    let response_timeout = parse_duration(&args.timeout)?;
    let bind = resolve((args.bind.as_str(), args.tcp_port))
        .map_err(|err| transport_error("invalid bind address", err))?;
    let peer = resolve((args.b_host.as_str(), args.udp_port))
        .map_err(|err| transport_error("invalid endpoint B address", err))?;

    let shutdown = Shutdown::new();
    install_ctrlc_handler(shutdown.clone())?;

    let server = LetterServer::bind(bind, ServerConfig::default())
        .map_err(|err| peer_error("tcp bind failed", err))?;
    let server_thread = {
        let shutdown = shutdown.clone();
        thread::Builder::new()
            .name("letterlink-tcp-server".to_string())
            .spawn(move || server.serve(&shutdown))
            .map_err(|err| io_error("failed to start tcp server", err))?
    };

    let config = ClientConfig {
        response_timeout,
        keep_going: args.keep_going,
    };
    let outcome = LetterClient::connect(peer, config).and_then(|mut client| {
        info!(local = %client.local_addr(), %peer, "udp client started");
        client.run(&shutdown, |sum| print_sum(sum, format))
    });

    shutdown.trigger();
    if server_thread.join().is_err() {
        warn!("tcp server thread panicked");
    }

    let delivered = outcome.map_err(|err| peer_error("udp client failed", err))?;
    info!(delivered, "endpoint A stopped");
    if delivered == 0 {
        return Ok(INTERRUPTED);
    }
    Ok(SUCCESS)
}
