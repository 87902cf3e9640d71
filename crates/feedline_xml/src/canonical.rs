//! Compact and pretty canonical forms.
//!
//! Both forms drop whitespace-only text nodes outside `xml:space="preserve"`
//! scopes and emit everything else exactly as written. The pretty form only
//! ever adds whitespace where compact removes it, which gives:
//!
//! - `compact(pretty(x)) == compact(x)`
//! - `pretty(compact(x)) == pretty(x)`
//!
//! so chaining the two in any order settles after one pass.

use crate::error::MalformedDocument;
use crate::tree::{Document, Element, Node};
use serde::{Deserialize, Serialize};

/// Canonicalization configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalizeConfig {
    /// Spaces per nesting level in the pretty form
    pub indent: usize,
}

impl Default for CanonicalizeConfig {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

/// Canonicalizer for rendered XML
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    config: CanonicalizeConfig,
}

impl Canonicalizer {
    /// Create a canonicalizer with default config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a canonicalizer with custom config
    #[must_use]
    pub fn with_config(config: CanonicalizeConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &CanonicalizeConfig {
        &self.config
    }

    /// Remove insignificant whitespace, producing a single-line document
    /// unless character data itself spans lines
    ///
    /// # Errors
    ///
    /// Returns [`MalformedDocument`] if `xml` is not well-formed
    pub fn compact(&self, xml: &str) -> Result<String, MalformedDocument> {
        let doc = Document::parse(xml)?;
        let mut out = String::with_capacity(xml.len());
        for node in &doc.prolog {
            write_compact(&mut out, node);
        }
        write_element_compact(&mut out, &doc.root);
        for node in &doc.epilogue {
            write_compact(&mut out, node);
        }
        Ok(out)
    }

    /// Re-indent: one node per line, nested elements indented by
    /// [`CanonicalizeConfig::indent`] spaces, trailing newline
    ///
    /// Elements holding character data are written on one line as-is.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedDocument`] if `xml` is not well-formed
    pub fn pretty(&self, xml: &str) -> Result<String, MalformedDocument> {
        let doc = Document::parse(xml)?;
        let mut out = String::with_capacity(xml.len() * 2);
        for node in &doc.prolog {
            self.write_line(&mut out, 0, raw(node));
        }
        self.write_pretty(&mut out, &doc.root, 0);
        for node in &doc.epilogue {
            self.write_line(&mut out, 0, raw(node));
        }
        Ok(out)
    }

    fn write_pretty(&self, out: &mut String, element: &Element<'_>, depth: usize) {
        let Some(end) = element.end else {
            self.write_line(out, depth, element.start);
            return;
        };

        let mut children = element.significant_children().peekable();
        if children.peek().is_none() {
            self.write_line(out, depth, &format!("{}{}", element.start, end));
            return;
        }
        if element.preserve_space || element.significant_children().any(Node::is_character_data) {
            let mut inline = String::new();
            write_element_compact(&mut inline, element);
            self.write_line(out, depth, &inline);
            return;
        }

        self.write_line(out, depth, element.start);
        for child in children {
            match child {
                Node::Element(e) => self.write_pretty(out, e, depth + 1),
                other => self.write_line(out, depth + 1, raw(other)),
            }
        }
        self.write_line(out, depth, end);
    }

    fn write_line(&self, out: &mut String, depth: usize, text: &str) {
        out.extend(std::iter::repeat(' ').take(depth * self.config.indent));
        out.push_str(text);
        out.push('\n');
    }
}

/// [`Canonicalizer::compact`] with default config
///
/// # Errors
///
/// Returns [`MalformedDocument`] if `xml` is not well-formed
pub fn compact(xml: &str) -> Result<String, MalformedDocument> {
    Canonicalizer::new().compact(xml)
}

/// [`Canonicalizer::pretty`] with default config
///
/// # Errors
///
/// Returns [`MalformedDocument`] if `xml` is not well-formed
pub fn pretty(xml: &str) -> Result<String, MalformedDocument> {
    Canonicalizer::new().pretty(xml)
}

fn raw<'a>(node: &Node<'a>) -> &'a str {
    match node {
        Node::Element(e) => e.start,
        Node::Text(s)
        | Node::CData(s)
        | Node::Comment(s)
        | Node::ProcessingInstruction(s)
        | Node::Declaration(s)
        | Node::DocType(s) => s,
    }
}

fn write_compact(out: &mut String, node: &Node<'_>) {
    match node {
        Node::Element(e) => write_element_compact(out, e),
        other => out.push_str(raw(other)),
    }
}

fn write_element_compact(out: &mut String, element: &Element<'_>) {
    out.push_str(element.start);
    for child in element.significant_children() {
        write_compact(out, child);
    }
    if let Some(end) = element.end {
        out.push_str(end);
    }
}
