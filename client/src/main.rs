use std::{
    io::{self, BufRead},
    time::Duration,
};

use clap::Parser;
use client::{Command, ConsoleSurface, ParseError, HELP};
use peer_signaling::{config, BlockingClient, ClientConfigBuilder};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "client")]
#[command(about = "Console peer for the rendezvous signaling server")]
struct Cli {
    /// Signaling server host
    #[arg(short, long, default_value = config::DEFAULT_ADDRESS)]
    address: String,

    /// Signaling server port
    #[arg(short, long, default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Name other peers see
    #[arg(short, long, default_value = "peer")]
    name: String,

    /// Seconds to wait for the server on login
    #[arg(long, default_value_t = config::DEFAULT_CONNECT_TIMEOUT.as_secs())]
    timeout: u64,
}

fn setup() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    setup();
    let cli = Cli::parse();
    let config = ClientConfigBuilder::new()
        .address(&cli.address)
        .port(cli.port)
        .name(&cli.name)
        .connect_timeout(Duration::from_secs(cli.timeout))
        .build();
    debug!(?config);

    let client = BlockingClient::spawn(config.clone(), ConsoleSurface::new(io::stdout()))?;
    for line in io::stdin().lock().lines() {
        let command = match line?.parse::<Command>() {
            Ok(command) => command,
            Err(ParseError::Empty) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        let result = match command {
            Command::Login { address, port } => client.login(
                address.as_deref().unwrap_or(&config.address),
                port.unwrap_or(config.port),
            ),
            Command::Logout => client.logout(),
            Command::Call(id) => client.connect_to_peer(id),
            Command::HangUp => client.disconnect_current_peer(),
            Command::Help => {
                println!("{HELP}");
                Ok(())
            }
            Command::Quit => break,
        };
        if let Err(e) = result {
            eprintln!("{e}");
        }
    }
    client.close()
}
