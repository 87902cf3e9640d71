//! FEEDLINE Server
//!
//! Serves the event log as a paginated Atom feed.

#![warn(missing_docs)]
#![warn(clippy::all)]

use anyhow::{Context, Result};
use clap::Parser;
use feedline_core::PageSize;
use feedline_log::{EventSource, InMemoryEventLog};
use feedline_server::api::{load_events, ApiServer, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "feedline=info,tower_http=debug";

#[derive(Parser)]
#[command(name = "feedline-server")]
#[command(about = "FEEDLINE paginated Atom feed server", long_about = None)]
struct Args {
    /// Bind address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Public origin used in feed links
    #[arg(long, default_value = "http://localhost:8080")]
    public_url: String,

    /// Route prefix
    #[arg(long, default_value = "/api")]
    api_prefix: String,

    /// Feed route below the prefix
    #[arg(long, default_value = "/feed")]
    feed_path: String,

    /// Feed title
    #[arg(long, default_value = feedline_feed::service::DEFAULT_TITLE)]
    title: String,

    /// Page size when the client sends none
    #[arg(long, default_value_t = PageSize::DEFAULT.get())]
    default_page_size: u64,

    /// Largest page size a client may request
    #[arg(long, default_value_t = PageSize::LIMIT.get())]
    max_page_size: u64,

    /// Indent of the pretty form
    #[arg(long, default_value_t = 2)]
    indent: usize,

    /// JSON array of {"position", "payload"} events to serve
    #[arg(long, conflicts_with = "seed")]
    events: Option<PathBuf>,

    /// Serve N generated events instead of a file
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

impl Args {
    fn config(&self) -> Result<ServerConfig> {
        Ok(ServerConfig {
            bind: self.bind.clone(),
            public_url: self.public_url.clone(),
            api_prefix: self.api_prefix.clone(),
            feed_path: self.feed_path.clone(),
            title: self.title.clone(),
            default_page_size: PageSize::new(self.default_page_size)
                .context("--default-page-size")?,
            max_page_size: PageSize::new(self.max_page_size).context("--max-page-size")?,
            indent: self.indent,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .init();

    let config = args.config()?;
    let source: Arc<dyn EventSource> = match &args.events {
        Some(path) => Arc::new(
            load_events(path)
                .await
                .with_context(|| format!("loading {}", path.display()))?,
        ),
        None => Arc::new(InMemoryEventLog::seeded(args.seed)),
    };

    let server = ApiServer::new(config, source)?;
    server.serve().await?;

    Ok(())
}
