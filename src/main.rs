//! DeviceHub IPC server - main entry point.
//!
//! Serves two services over TCP+msgpack:
//! - devicehub: catalog discovery, device/tag management, live tag reads
//! - tools: operation metadata and prompt generation

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use devicehub_core::hub::{ConfigConnectionProvider, InMemoryHub, MEMORY_ENDPOINT};
use devicehub_core::ipc::{IpcServer, ServiceContext};
use devicehub_core::{Config, DeviceHub};

#[derive(Debug, Parser)]
#[command(name = "devicehub-server", about = "DeviceHub tool operations over IPC")]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, env = "DEVICEHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides `server.listen_addr`.
    #[arg(long, env = "DEVICEHUB_LISTEN")]
    listen: Option<String>,

    /// JSON fixture seeding the in-memory catalog.
    #[arg(long, env = "DEVICEHUB_FIXTURE")]
    fixture: Option<PathBuf>,

    /// Default hub endpoint when requests carry no `edge_url` [default: memory://].
    #[arg(long, env = "DEVICEHUB_URL")]
    hub_url: Option<String>,

    /// Default API token when requests carry no `api_token`.
    #[arg(long, env = "DEVICEHUB_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,
}

impl Cli {
    fn into_config(self) -> devicehub_core::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(listen) = self.listen {
            config.server.listen_addr = listen;
        }
        if let Some(fixture) = self.fixture {
            config.hub.fixture_path = Some(fixture);
        }
        if let Some(url) = self.hub_url {
            config.hub.endpoint = Some(url);
        }
        if let Some(token) = self.api_token {
            config.hub.api_token = Some(token);
        }
        // The server always serves the in-memory catalog.
        config
            .hub
            .endpoint
            .get_or_insert_with(|| MEMORY_ENDPOINT.to_string());
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    devicehub_core::observability::init_tracing(&config.observability);

    let catalog = match &config.hub.fixture_path {
        Some(path) => InMemoryHub::load(path)?,
        None => InMemoryHub::new(),
    };
    let hub = DeviceHub::in_memory(Arc::new(catalog));
    let connections = Arc::new(ConfigConnectionProvider::new(config.hub.clone()));
    let context = Arc::new(ServiceContext::new(hub, connections));

    let addr = config.server.listen_addr.parse()?;
    let server = Arc::new(IpcServer::new(context, addr, config.ipc.clone()));

    let shutdown = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, stopping");
            shutdown.shutdown();
        }
    });

    tracing::info!("DeviceHub server starting on {}", addr);
    server.serve().await?;

    Ok(())
}
