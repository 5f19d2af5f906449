// ⚙️ Configuration - command line flags with environment fallbacks

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::snapshot::SnapshotFiles;

/// Where the snapshot files live
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// Directory holding cards.txt and banned-countries.txt
    #[arg(long, env = "CARD_REGISTRY_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn snapshot_files(&self) -> SnapshotFiles {
        SnapshotFiles::in_dir(&self.data_dir)
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Address the HTTP server binds to
    #[arg(long, env = "CARD_REGISTRY_BIND", default_value = "0.0.0.0:4567")]
    pub bind: SocketAddr,

    /// Base URL of the binlist-compatible issuer lookup service
    #[arg(
        long,
        env = "CARD_REGISTRY_LOOKUP_URL",
        default_value = "https://lookup.binlist.net"
    )]
    pub lookup_url: String,

    /// Seconds before an issuer lookup is abandoned
    #[arg(long, env = "CARD_REGISTRY_LOOKUP_TIMEOUT_SECS", default_value_t = 5)]
    pub lookup_timeout_secs: u64,
}

impl ServerConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs.max(1))
    }
}

/// Install the tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "card_registry=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
