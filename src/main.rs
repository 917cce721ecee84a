//! Semantic service proxy binary
//!
//! Usage:
//!   cargo run --bin ssp -- --port 8080 --files-dir ./data --files-base-uri http://localhost:8080/files

use clap::Parser;
use ssp::backends::FileBackend;
use ssp::config::{CacheBackend, FileBackendConfig, GatewayConfig};
use ssp::context::GatewayContext;
use ssp::http::start_server;
use ssp::rdf::RdfSerialization;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Handle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ssp")]
#[command(about = "Semantic service proxy for intermittently available data origins", long_about = None)]
struct Args {
    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short = 'H', long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Cache back end: dummy, memory or persistent (with --cache-path)
    #[arg(long)]
    cache: Option<String>,

    #[arg(long)]
    cache_path: Option<PathBuf>,

    /// Default response serialization: turtle, n3, rdfxml or ntriples
    #[arg(long)]
    default_serialization: Option<String>,

    /// Seconds between a graph's expiry and its eviction
    #[arg(long)]
    grace_period: Option<u64>,

    /// Serve the RDF files of this directory
    #[arg(long)]
    files_dir: Option<PathBuf>,

    #[arg(long)]
    files_base_uri: Option<String>,

    /// Lifetime in seconds of cached file graphs
    #[arg(long)]
    files_ttl: Option<u64>,

    /// Rescan the files directory every N seconds
    #[arg(long)]
    files_rescan: Option<u64>,
}

impl Args {
    fn into_config(self) -> Result<GatewayConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => GatewayConfig::from_file(path)?,
            None => GatewayConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(grace_period) = self.grace_period {
            config.grace_period_secs = grace_period;
        }
        if let Some(name) = self.default_serialization {
            config.default_serialization = RdfSerialization::from_name(&name)
                .ok_or_else(|| format!("unknown serialization '{}'", name))?;
        }
        match (self.cache.as_deref(), self.cache_path) {
            (Some("dummy"), _) => config.cache = CacheBackend::Dummy,
            (Some("memory"), _) => config.cache = CacheBackend::Memory,
            (Some("persistent"), Some(path)) | (None, Some(path)) => {
                config.cache = CacheBackend::Persistent { path }
            }
            (Some("persistent"), None) => return Err("--cache persistent needs --cache-path".into()),
            (Some(other), _) => return Err(format!("unknown cache back end '{}'", other).into()),
            (None, None) => {}
        }

        if let Some(directory) = self.files_dir {
            let files = config.files.get_or_insert_with(FileBackendConfig::default);
            files.directory = directory;
        }
        if let Some(files) = config.files.as_mut() {
            if let Some(base_uri) = self.files_base_uri {
                files.base_uri = base_uri;
            }
            if let Some(ttl) = self.files_ttl {
                files.ttl_secs = Some(ttl);
            }
            if let Some(rescan) = self.files_rescan {
                files.rescan_interval_secs = Some(rescan);
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Args::parse().into_config()?;

    // Bookkeeping (bus, expiry, observers) runs apart from request I/O.
    let management = Builder::new_multi_thread()
        .worker_threads(config.management_threads)
        .thread_name("ssp-management")
        .enable_all()
        .build()?;
    let io = Builder::new_multi_thread()
        .worker_threads(config.io_threads)
        .thread_name("ssp-io")
        .enable_all()
        .build()?;

    let result = io.block_on(run(config, management.handle().clone()));

    io.shutdown_timeout(Duration::from_secs(5));
    management.shutdown_timeout(Duration::from_secs(5));
    result
}

async fn run(config: GatewayConfig, management: Handle) -> Result<(), Box<dyn std::error::Error>> {
    let address = config.address();
    let files_config = config.files.clone();
    let context = GatewayContext::start(config, management.clone()).await?;

    let _files = match files_config {
        Some(files_config) => {
            let backend = Arc::new(FileBackend::new(files_config, &context));
            let registered = backend.register_directory().await?;
            info!(registered, "file backend started");
            backend.spawn_rescan(&management);
            Some(backend)
        }
        None => None,
    };

    start_server(&address, context.router(), shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
