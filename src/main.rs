use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tapestry::config::{REPUBLISH, RETRIES, TIMEOUT};
use tapestry::{Id, NodeConfig, Tapestry};
use tracing_subscriber::EnvFilter;

/// Runs one Tapestry node.
#[derive(Parser, Debug)]
#[command(name = "tapestry-node", version)]
struct Args {
    /// Interface to listen on
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Port to listen on, 0 picks a free one
    #[arg(short, long, default_value_t = 0)]
    port: u16,

    /// Address of an existing node to join through
    #[arg(short, long)]
    connect: Option<SocketAddr>,

    /// Fixed node identifier (40 hex digits)
    #[arg(long)]
    id: Option<Id>,

    /// Seconds between republishes of stored objects
    #[arg(
        long,
        default_value_t = REPUBLISH.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    republish_secs: u64,

    /// Seconds an unrefreshed advertisement survives at its root
    #[arg(
        long,
        default_value_t = TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_secs: u64,

    /// Attempts per peer RPC
    #[arg(long, default_value_t = RETRIES)]
    retries: usize,
}

impl Args {
    fn into_config(self) -> NodeConfig {
        NodeConfig {
            bind_host: self.bind,
            port: self.port,
            connect_to: self.connect,
            id: self.id,
            republish_interval: Duration::from_secs(self.republish_secs),
            registration_timeout: Duration::from_secs(self.timeout_secs),
            rpc_retries: self.retries,
            ..NodeConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config();
    if config.republish_interval >= config.registration_timeout {
        tracing::warn!(
            "Republish interval {:?} is not shorter than the timeout {:?}; objects may flicker",
            config.republish_interval,
            config.registration_timeout
        );
    }

    match config.connect_to {
        Some(seed) => tracing::info!("Joining overlay via {}", seed),
        None => tracing::info!("Starting a new overlay"),
    }

    // 1. Node (RPC server, directory reaper, overlay join):
    let node = Tapestry::start(config).await?;
    tracing::info!("{}", node);

    // 2. Spawn stats reporter:
    let stats_node = node.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));

        loop {
            interval.tick().await;
            if stats_node.is_closed() {
                break;
            }
            let directory = stats_node.directory();
            tracing::info!(
                "Node stats: {} blobs stored, directory holds {} keys ({} registrations)",
                stats_node.blobs().len(),
                directory.key_count(),
                directory.registration_count()
            );
        }
    });

    // 3. Wait for shutdown:
    tracing::info!("Press Ctrl+C to leave the overlay");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Leaving overlay...");
    node.leave().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_periods_are_rejected() {
        for flag in ["--republish-secs", "--timeout-secs"] {
            let parsed = Args::try_parse_from(["tapestry-node", flag, "0"]);
            assert!(parsed.is_err(), "{} 0 was accepted", flag);
        }
    }

    #[test]
    fn test_defaults_map_to_valid_config() {
        let config = Args::try_parse_from(["tapestry-node"]).unwrap().into_config();

        assert_eq!(config.republish_interval, REPUBLISH);
        assert_eq!(config.registration_timeout, TIMEOUT);
        assert!(config.validate().is_ok());
    }
}
