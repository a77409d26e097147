//! QuicNet handshake probe.
//!
//! Performs one handshake against `<address> <port>` and logs the negotiated
//! parameters. Exits non-zero if the handshake fails.
//!
//! # Usage
//!
//! ```bash
//! quicnet-probe 127.0.0.1 4433
//! quicnet-probe ::1 4433 --blocking --timeout-ms 500
//! RUST_LOG=quicnet_core=trace quicnet-probe 192.0.2.1 443
//! ```

use std::{io, process::ExitCode, time::Duration};

use clap::Parser;
use quicnet_core::{Client, ClientConfig, ConnectError, Negotiated, UdpConfig, UdpTransport};
use quicnet_proto::DEFAULT_MAX_STREAMS;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Perform one QuicNet handshake against a peer.
#[derive(Parser, Debug)]
#[command(name = "quicnet-probe")]
#[command(about = "Perform one QuicNet handshake against a peer")]
#[command(version)]
struct Args {
    /// Peer IP address (IPv4, or IPv6 with or without brackets)
    address: String,

    /// Peer UDP port
    port: u16,

    /// Receive timeout in milliseconds (0 waits forever)
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,

    /// Use the blocking driver instead of the async one
    #[arg(long)]
    blocking: bool,

    /// Stream cap assumed if the peer does not advertise one
    #[arg(long, default_value_t = DEFAULT_MAX_STREAMS)]
    max_streams: u64,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn udp_config(&self) -> UdpConfig {
        UdpConfig {
            receive_timeout: (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms)),
            ..UdpConfig::default()
        }
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig { default_max_streams: self.max_streams, ..ClientConfig::default() }
    }
}

#[derive(Debug, Error)]
enum ProbeError {
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error(transparent)]
    Connect(#[from] ConnectError),
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    match probe(&args) {
        Ok(negotiated) => {
            info!(
                address = %args.address,
                port = args.port,
                connection_id = %negotiated.connection_id,
                peer_connection_id = %negotiated.peer_connection_id,
                max_streams = negotiated.max_streams,
                "handshake established"
            );
            ExitCode::SUCCESS
        },
        Err(err) => {
            error!(address = %args.address, port = args.port, %err, "handshake failed");
            ExitCode::FAILURE
        },
    }
}

fn probe(args: &Args) -> Result<Negotiated, ProbeError> {
    let client = Client::with_transport(UdpTransport::new(args.udp_config()), args.client_config());

    if args.blocking {
        let connection = client.connect(&args.address, args.port)?;
        return Ok(*connection.negotiated());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ProbeError::Runtime)?;
    let connection = runtime.block_on(client.connect_async(&args.address, args.port))?;
    Ok(*connection.negotiated())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["quicnet-probe", "127.0.0.1", "4433"]).unwrap();

        assert_eq!(args.address, "127.0.0.1");
        assert_eq!(args.port, 4433);
        assert!(!args.blocking);
        assert_eq!(args.log_level, "info");
        assert_eq!(args.udp_config().receive_timeout, Some(Duration::from_secs(30)));
        assert_eq!(args.client_config().default_max_streams, DEFAULT_MAX_STREAMS);
    }

    #[test]
    fn flags_reach_the_configs() {
        let args = Args::try_parse_from([
            "quicnet-probe",
            "::1",
            "8443",
            "--timeout-ms",
            "250",
            "--blocking",
            "--max-streams",
            "16",
            "--log-level",
            "trace",
        ])
        .unwrap();

        assert_eq!(args.address, "::1");
        assert!(args.blocking);
        assert_eq!(args.log_level, "trace");
        assert_eq!(args.udp_config().receive_timeout, Some(Duration::from_millis(250)));
        assert_eq!(args.client_config().default_max_streams, 16);
    }

    #[test]
    fn zero_timeout_waits_forever() {
        let args =
            Args::try_parse_from(["quicnet-probe", "127.0.0.1", "1", "--timeout-ms", "0"]).unwrap();
        assert_eq!(args.udp_config().receive_timeout, None);
    }

    #[test]
    fn rejects_out_of_range_port() {
        assert!(Args::try_parse_from(["quicnet-probe", "127.0.0.1", "70000"]).is_err());
    }
}
