//! The page pipeline.
//!
//! cursor -> window -> links -> document -> rendered XML -> compact XML

use crate::document::{FeedAssembler, FeedDocument, FeedMetadata};
use crate::link::LinkBuilder;
use crate::render::{AtomRenderer, Renderer, ATOM_FEED_TEMPLATE};
use chrono::{DateTime, Utc};
use feedline_core::{FeedError, FeedId, FeedResult};
use feedline_log::{Cursor, CursorWindow, EventSource};
use feedline_xml::Canonicalizer;
use std::sync::Arc;

/// Title used when none is configured
pub const DEFAULT_TITLE: &str = "Event feed";

/// Serves feed pages from an event source
///
/// Holds no per-request state; share it behind an `Arc`.
#[derive(Clone)]
pub struct FeedService {
    source: Arc<dyn EventSource>,
    renderer: Arc<dyn Renderer>,
    links: LinkBuilder,
    title: String,
    template: String,
    canonicalizer: Canonicalizer,
}

impl FeedService {
    /// Service rendering Atom with the default title
    #[must_use]
    pub fn new(source: Arc<dyn EventSource>, links: LinkBuilder) -> Self {
        Self {
            source,
            renderer: Arc::new(AtomRenderer),
            links,
            title: DEFAULT_TITLE.to_string(),
            template: ATOM_FEED_TEMPLATE.to_string(),
            canonicalizer: Canonicalizer::new(),
        }
    }

    /// Replace the renderer and the template it is asked for
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>, template: impl Into<String>) -> Self {
        self.renderer = renderer;
        self.template = template.into();
        self
    }

    /// Replace the feed title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Replace the canonicalizer used for output
    #[must_use]
    pub fn with_canonicalizer(mut self, canonicalizer: Canonicalizer) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    /// Link builder for this feed
    #[must_use]
    pub fn links(&self) -> &LinkBuilder {
        &self.links
    }

    /// Canonicalizer applied to rendered pages
    #[must_use]
    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    /// Id shared by every page of this feed
    #[must_use]
    pub fn feed_id(&self) -> FeedId {
        FeedId::for_url(&self.links.feed_location())
    }

    /// Serve the page for `cursor`, stamped with the current time
    ///
    /// # Errors
    ///
    /// See [`FeedService::page_at`]
    pub async fn page(&self, cursor: Cursor) -> FeedResult<FeedPage> {
        self.page_at(cursor, Utc::now()).await
    }

    /// Serve the page for `cursor`, stamped with `updated`
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Source`] if the source fails,
    /// [`FeedError::InvariantViolation`] if it breaks its contract,
    /// [`FeedError::Render`] if rendering fails, and
    /// [`FeedError::MalformedDocument`] if the renderer emits bad XML
    pub async fn page_at(&self, cursor: Cursor, updated: DateTime<Utc>) -> FeedResult<FeedPage> {
        self.build(cursor, updated).await.inspect_err(|err| match err {
            FeedError::InvariantViolation { reason } => {
                tracing::error!(position = %cursor.position, %reason, "event source broke its contract");
            }
            FeedError::MalformedDocument { offset, reason } => {
                tracing::error!(
                    template = %self.template,
                    offset,
                    %reason,
                    "renderer produced malformed XML"
                );
            }
            _ => {}
        })
    }

    async fn build(&self, cursor: Cursor, updated: DateTime<Utc>) -> FeedResult<FeedPage> {
        let window = CursorWindow::fetch(cursor, self.source.as_ref()).await?;
        let has_more = window.has_more();
        let links = self.links.navigation(&window, has_more);
        let metadata = FeedMetadata::new(self.title.clone(), self.feed_id(), updated);
        let document = FeedAssembler::assemble(window, links, metadata)?;

        let rendered = self.renderer.render(&self.template, &document)?;
        let xml = self.canonicalizer.compact(&rendered)?;

        tracing::debug!(
            position = %cursor.position,
            entries = document.entries().len(),
            has_more,
            bytes = xml.len(),
            "page served"
        );
        Ok(FeedPage { document, xml })
    }
}

impl std::fmt::Debug for FeedService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedService")
            .field("links", &self.links)
            .field("title", &self.title)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

/// A served page: the document and its compact XML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPage {
    /// The model the page was rendered from
    pub document: FeedDocument,
    xml: String,
}

impl FeedPage {
    /// Compact canonical XML
    #[must_use]
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Take the compact XML
    #[must_use]
    pub fn into_xml(self) -> String {
        self.xml
    }

    /// Indented diagnostic form of the page
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::MalformedDocument`] if the XML does not parse,
    /// which cannot happen for a page built by [`FeedService`]
    pub fn pretty(&self, canonicalizer: &Canonicalizer) -> FeedResult<String> {
        Ok(canonicalizer.pretty(&self.xml)?)
    }
}
