//! Document tree.
//!
//! Assembles tokens into prolog, root element and epilogue while checking
//! well-formedness: tags must nest and match, exactly one root, nothing but
//! whitespace, comments and processing instructions outside it.

use crate::attributes;
use crate::error::MalformedDocument;
use crate::scan::{bom_len, is_blank};
use crate::token::{Token, TokenKind, Tokenizer};

/// A node in the document tree; leaves borrow their raw source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    /// Element and its content
    Element(Element<'a>),
    /// Character data, references undecoded
    Text(&'a str),
    /// CDATA section including delimiters
    CData(&'a str),
    /// Comment including delimiters
    Comment(&'a str),
    /// Processing instruction including delimiters
    ProcessingInstruction(&'a str),
    /// XML declaration
    Declaration(&'a str),
    /// DOCTYPE declaration
    DocType(&'a str),
}

impl<'a> Node<'a> {
    /// Whether this node is a whitespace-only text node
    #[must_use]
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(t) if is_blank(t))
    }

    /// Whether this node carries character data
    #[must_use]
    pub fn is_character_data(&self) -> bool {
        matches!(self, Node::Text(_) | Node::CData(_))
    }
}

/// An element with its start tag, children and end tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element<'a> {
    /// Qualified tag name
    pub name: &'a str,
    /// Byte offset of the start tag
    pub offset: usize,
    /// Raw start tag, or the whole tag for `<name/>`
    pub start: &'a str,
    /// Raw end tag; `None` for `<name/>`
    pub end: Option<&'a str>,
    /// Child nodes in document order
    pub children: Vec<Node<'a>>,
    /// Inside an `xml:space="preserve"` scope
    pub preserve_space: bool,
}

impl<'a> Element<'a> {
    fn open(token: &Token<'a>, inherited_preserve: bool) -> Self {
        let preserve_space = match attributes::find(&token.attributes, "xml:space") {
            Some("preserve") => true,
            Some(_) => false,
            None => inherited_preserve,
        };
        Element {
            name: token.name.unwrap_or_default(),
            offset: token.offset,
            start: token.raw,
            end: None,
            children: Vec::new(),
            preserve_space,
        }
    }

    /// Whether the element was written as `<name/>`
    #[must_use]
    pub fn is_self_closing(&self) -> bool {
        self.end.is_none()
    }

    /// Children that survive whitespace stripping
    pub fn significant_children(&self) -> impl Iterator<Item = &Node<'a>> {
        let preserve = self.preserve_space;
        self.children
            .iter()
            .filter(move |child| preserve || !child.is_blank_text())
    }
}

/// A parsed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document<'a> {
    /// Declaration, DOCTYPE, comments and processing instructions before the root
    pub prolog: Vec<Node<'a>>,
    /// The document element
    pub root: Element<'a>,
    /// Comments and processing instructions after the root
    pub epilogue: Vec<Node<'a>>,
}

impl<'a> Document<'a> {
    /// Parse and check `input`
    ///
    /// A leading byte order mark is skipped and takes no part in the tree.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedDocument`] if `input` is not well-formed
    pub fn parse(input: &'a str) -> Result<Self, MalformedDocument> {
        let mut prolog = Vec::new();
        let mut epilogue = Vec::new();
        let mut root: Option<Element<'a>> = None;
        let mut stack: Vec<Element<'a>> = Vec::new();
        let mut seen_doctype = false;
        let start = bom_len(input);

        for token in Tokenizer::new(input) {
            let token = token?;
            let inherited = stack.last().is_some_and(|e| e.preserve_space);

            match token.kind {
                TokenKind::Text => match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(token.raw)),
                    None if token.is_whitespace() => {}
                    None => {
                        return Err(MalformedDocument::new(
                            token.offset,
                            "text outside the root element",
                        ))
                    }
                },
                TokenKind::CData => match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::CData(token.raw)),
                    None => {
                        return Err(MalformedDocument::new(
                            token.offset,
                            "CDATA outside the root element",
                        ))
                    }
                },
                TokenKind::Comment | TokenKind::ProcessingInstruction => {
                    let node = if token.kind == TokenKind::Comment {
                        Node::Comment(token.raw)
                    } else {
                        Node::ProcessingInstruction(token.raw)
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None if root.is_some() => epilogue.push(node),
                        None => prolog.push(node),
                    }
                }
                TokenKind::XmlDeclaration => {
                    if token.offset != start {
                        return Err(MalformedDocument::new(
                            token.offset,
                            "XML declaration must start the document",
                        ));
                    }
                    prolog.push(Node::Declaration(token.raw));
                }
                TokenKind::DocType => {
                    if seen_doctype || root.is_some() || !stack.is_empty() {
                        return Err(MalformedDocument::new(
                            token.offset,
                            "DOCTYPE must appear once, before the root element",
                        ));
                    }
                    seen_doctype = true;
                    prolog.push(Node::DocType(token.raw));
                }
                TokenKind::StartTag => {
                    if stack.is_empty() && root.is_some() {
                        return Err(MalformedDocument::new(token.offset, "multiple root elements"));
                    }
                    stack.push(Element::open(&token, inherited));
                }
                TokenKind::EmptyTag => {
                    let element = Element::open(&token, inherited);
                    attach(&mut stack, &mut root, element, token.offset)?;
                }
                TokenKind::EndTag => {
                    let name = token.name.unwrap_or_default();
                    let mut element = stack.pop().ok_or_else(|| {
                        MalformedDocument::new(token.offset, format!("unexpected end tag </{}>", name))
                    })?;
                    if element.name != name {
                        return Err(MalformedDocument::new(
                            token.offset,
                            format!("end tag </{}> does not match <{}>", name, element.name),
                        ));
                    }
                    element.end = Some(token.raw);
                    attach(&mut stack, &mut root, element, token.offset)?;
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(MalformedDocument::new(
                open.offset,
                format!("unclosed element <{}>", open.name),
            ));
        }
        let root = root.ok_or_else(|| MalformedDocument::new(input.len(), "no root element"))?;

        Ok(Document {
            prolog,
            root,
            epilogue,
        })
    }
}

fn attach<'a>(
    stack: &mut [Element<'a>],
    root: &mut Option<Element<'a>>,
    element: Element<'a>,
    offset: usize,
) -> Result<(), MalformedDocument> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(element));
            Ok(())
        }
        None if root.is_some() => Err(MalformedDocument::new(offset, "multiple root elements")),
        None => {
            *root = Some(element);
            Ok(())
        }
    }
}
