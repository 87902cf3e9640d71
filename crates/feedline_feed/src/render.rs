//! Rendering feed documents to XML text.
//!
//! The renderer only produces text; it is the canonicalizer's job to make
//! that text stable. Output therefore keeps whatever layout is convenient to
//! write, indentation and blank lines included.

use crate::document::FeedDocument;
use chrono::SecondsFormat;
use feedline_core::FeedError;
use feedline_xml::scan::is_xml_char;
use std::borrow::Cow;
use std::fmt::Write;
use thiserror::Error;

/// Template name served by [`AtomRenderer`]
pub const ATOM_FEED_TEMPLATE: &str = "atom-feed-xml";

const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// Rendering errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// No template by this name
    #[error("unknown template: {name}")]
    UnknownTemplate {
        /// Requested template
        name: String,
    },

    /// A value holds a character XML 1.0 cannot carry, even as a reference
    #[error("character U+{:04X} cannot be written to XML", *character as u32)]
    IllegalCharacter {
        /// The offending character
        character: char,
    },

    /// Writing the output failed
    #[error("formatting failed")]
    Format,
}

impl From<std::fmt::Error> for RenderError {
    fn from(_: std::fmt::Error) -> Self {
        RenderError::Format
    }
}

impl From<RenderError> for FeedError {
    fn from(err: RenderError) -> Self {
        FeedError::Render {
            reason: err.to_string(),
        }
    }
}

/// Renders a named template against a feed document
pub trait Renderer: Send + Sync {
    /// Render `model` with `template`
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the template is unknown or output fails
    fn render(&self, template: &str, model: &FeedDocument) -> Result<String, RenderError>;
}

impl<F> Renderer for F
where
    F: Fn(&str, &FeedDocument) -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self, template: &str, model: &FeedDocument) -> Result<String, RenderError> {
        self(template, model)
    }
}

/// Built-in Atom 1.0 renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomRenderer;

impl AtomRenderer {
    fn atom(&self, doc: &FeedDocument) -> Result<String, RenderError> {
        let meta = doc.metadata();
        let updated = meta.updated.to_rfc3339_opts(SecondsFormat::Secs, true);
        let links = doc.links();
        let mut out = String::with_capacity(512 + doc.entries().len() * 256);

        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(out, r#"<feed xmlns="{}">"#, ATOM_NAMESPACE)?;
        writeln!(out, "    <title>{}</title>", escape(&meta.title)?)?;
        writeln!(out, "    <id>{}</id>", meta.id)?;
        writeln!(out, "    <updated>{}</updated>", updated)?;
        writeln!(out, r#"    <link rel="self" href="{}"/>"#, escape(&links.self_link)?)?;
        if let Some(previous) = &links.previous {
            writeln!(out, r#"    <link rel="previous" href="{}"/>"#, escape(previous)?)?;
        }
        if let Some(next) = &links.next {
            writeln!(out, r#"    <link rel="next" href="{}"/>"#, escape(next)?)?;
        }

        for entry in doc.entries() {
            writeln!(out)?;
            writeln!(out, "    <entry>")?;
            writeln!(out, "        <id>{}</id>", meta.id.entry_urn(entry.position))?;
            writeln!(out, "        <title>{}</title>", entry.position)?;
            writeln!(out, "        <updated>{}</updated>", updated)?;
            writeln!(
                out,
                r#"        <content type="text" xml:space="preserve">{}</content>"#,
                escape(&entry.payload)?
            )?;
            writeln!(out, "    </entry>")?;
        }

        writeln!(out, "</feed>")?;
        Ok(out)
    }
}

impl Renderer for AtomRenderer {
    fn render(&self, template: &str, model: &FeedDocument) -> Result<String, RenderError> {
        match template {
            ATOM_FEED_TEMPLATE => self.atom(model),
            other => Err(RenderError::UnknownTemplate {
                name: other.to_string(),
            }),
        }
    }
}

/// Escape XML special characters in text and attribute values
///
/// # Errors
///
/// Returns [`RenderError::IllegalCharacter`] for characters such as U+0001
/// that no XML 1.0 document may contain
pub fn escape(s: &str) -> Result<Cow<'_, str>, RenderError> {
    if let Some(character) = s.chars().find(|&c| !is_xml_char(c)) {
        return Err(RenderError::IllegalCharacter { character });
    }
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Ok(Cow::Borrowed(s));
    }
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    Ok(Cow::Owned(out))
}
