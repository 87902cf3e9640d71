//! API server

use crate::handler;
use axum::routing::get;
use axum::Router;
use feedline_core::{FeedError, FeedResult, PageSize};
use feedline_feed::{FeedService, LinkBuilder};
use feedline_log::{CursorLimits, EventSource, InMemoryEventLog};
use feedline_xml::{CanonicalizeConfig, Canonicalizer};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
    /// Externally visible origin used in feed links
    pub public_url: String,
    /// Prefix shared by all API routes
    pub api_prefix: String,
    /// Feed route below the prefix
    pub feed_path: String,
    /// Atom feed title
    pub title: String,
    /// Page size when the client sends none
    pub default_page_size: PageSize,
    /// Largest page size a client may request
    pub max_page_size: PageSize,
    /// Indent of the `?pretty` form
    pub indent: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            public_url: "http://localhost:8080".to_string(),
            api_prefix: "/api".to_string(),
            feed_path: "/feed".to_string(),
            title: feedline_feed::service::DEFAULT_TITLE.to_string(),
            default_page_size: PageSize::DEFAULT,
            max_page_size: PageSize::LIMIT,
            indent: CanonicalizeConfig::default().indent,
        }
    }
}

impl ServerConfig {
    /// Reject configurations the server cannot honour
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidCursor`] if the default page size exceeds the maximum
    pub fn validate(&self) -> FeedResult<()> {
        if self.default_page_size > self.max_page_size {
            return Err(FeedError::invalid_cursor(
                "pageSize",
                format!(
                    "default {} exceeds maximum {}",
                    self.default_page_size, self.max_page_size
                ),
            ));
        }
        Ok(())
    }

    /// Page size rules for client cursors
    #[must_use]
    pub fn limits(&self) -> CursorLimits {
        CursorLimits {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }

    /// Route the feed is mounted at, e.g. `/api/feed`
    #[must_use]
    pub fn route(&self) -> String {
        let prefix = self.api_prefix.trim().trim_end_matches('/');
        let path = self.feed_path.trim().trim_start_matches('/');
        let route = format!("{}/{}", prefix, path);
        if route.starts_with('/') {
            route
        } else {
            format!("/{}", route)
        }
    }

    /// Link builder matching [`ServerConfig::route`] under the public URL
    #[must_use]
    pub fn link_builder(&self) -> LinkBuilder {
        LinkBuilder::new(&self.public_url, &self.route())
    }
}

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Page pipeline
    pub service: Arc<FeedService>,
    /// Page size rules
    pub limits: CursorLimits,
}

/// Router serving the feed at `route`
pub fn router(state: AppState, route: &str) -> Router {
    Router::new()
        .route(route, get(handler::feed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server for one feed
#[derive(Debug)]
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Create a server over `source`
    ///
    /// # Errors
    ///
    /// Returns an error if `config` does not validate
    pub fn new(config: ServerConfig, source: Arc<dyn EventSource>) -> FeedResult<Self> {
        config.validate()?;
        let canonicalizer = Canonicalizer::with_config(CanonicalizeConfig {
            indent: config.indent,
        });
        let service = FeedService::new(source, config.link_builder())
            .with_title(config.title.clone())
            .with_canonicalizer(canonicalizer);
        let state = AppState {
            service: Arc::new(service),
            limits: config.limits(),
        };
        Ok(Self { config, state })
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Router for this server
    pub fn router(&self) -> Router {
        router(self.state.clone(), &self.config.route())
    }

    /// Listen on the configured address until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns an I/O error if binding or serving fails
    pub async fn serve(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(&self.config.bind).await?;
        tracing::info!(
            addr = %listener.local_addr()?,
            route = %self.config.route(),
            "feed server listening"
        );
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

/// Load a JSON events file into an in-memory log
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON array of events
pub async fn load_events(path: &Path) -> anyhow::Result<InMemoryEventLog> {
    let json = tokio::fs::read_to_string(path).await?;
    let log = InMemoryEventLog::from_json(&json)?;
    tracing::info!(path = %path.display(), events = log.len().await, "loaded events");
    Ok(log)
}
