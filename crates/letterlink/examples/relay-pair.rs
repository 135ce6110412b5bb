//! Both endpoints in one process: A's server and client plus B's relay.
//!
//! Run with:
//!   cargo run --example relay-pair --features peer
//!
//! Prints one sum and exits.

use std::thread;

use letterlink::peer::{
    ClientConfig, LetterClient, LetterServer, RelayConfig, RelayServer, ServerConfig, Shutdown,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Shutdown::new();

    let server = LetterServer::bind("127.0.0.1:0".parse()?, ServerConfig::default())?;
    let upstream = server.local_addr();
    let relay = RelayServer::bind("127.0.0.1:0".parse()?, upstream, RelayConfig::default())?;
    let relay_addr = relay.local_addr();
    eprintln!("A tcp on {upstream}, B udp on {relay_addr}");

    let server_thread = {
        let shutdown = shutdown.clone();
        thread::spawn(move || server.serve(&shutdown))
    };
    let relay_thread = {
        let shutdown = shutdown.clone();
        thread::spawn(move || relay.serve(&shutdown))
    };

    let mut client = LetterClient::connect(relay_addr, ClientConfig::default())?;
    let outcome = client.request_sum(&shutdown);

    shutdown.trigger();
    let _ = server_thread.join();
    let relayed = relay_thread.join();

    match outcome? {
        Some(sum) => println!("{sum}"),
        None => eprintln!("stopped before a sum arrived"),
    }
    if let Ok(Err(err)) = relayed {
        eprintln!("relay stopped with error: {err}");
    }
    Ok(())
}
