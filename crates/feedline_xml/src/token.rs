//! XML tokenizer.
//!
//! Splits a document into markup and character-data tokens. Every token keeps
//! the exact source slice it was read from, so writing the tokens back out
//! reproduces the input byte for byte.

use crate::attributes::{parse_attributes, Attribute};
use crate::error::MalformedDocument;
use crate::scan::{
    bom_len, check_chars, check_references, is_blank, is_name_start_char, is_whitespace,
    validate_name,
};
use memchr::{memchr, memmem};

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Character data between tags
    Text,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
    /// DOCTYPE declaration
    DocType,
}

/// A token and the source slice it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// What the token is
    pub kind: TokenKind,
    /// Byte offset of `raw` in the input
    pub offset: usize,
    /// Exact source text, delimiters included
    pub raw: &'a str,
    /// Element name for tags, target for processing instructions
    pub name: Option<&'a str>,
    /// Attributes of start and empty tags and of the XML declaration
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, offset: usize, raw: &'a str) -> Self {
        Token {
            kind,
            offset,
            raw,
            name: None,
            attributes: Vec::new(),
        }
    }

    fn with_name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    fn with_attributes(mut self, attributes: Vec<Attribute<'a>>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Whether this is a text token made only of whitespace
    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Text && is_blank(self.raw)
    }
}

/// Pull tokenizer over a complete document
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    failed: bool,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer for `input`, skipping a leading byte order mark
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Tokenizer {
            input,
            pos: bom_len(input),
            failed: false,
        }
    }

    /// Read the next token, `Ok(None)` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token<'a>>, MalformedDocument> {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        if start >= bytes.len() {
            return Ok(None);
        }

        if bytes[start] != b'<' {
            let end = memchr(b'<', &bytes[start..]).map_or(bytes.len(), |i| start + i);
            let raw = &self.input[start..end];
            check_chars(raw, start)?;
            check_references(raw, start)?;
            self.pos = end;
            return Ok(Some(Token::new(TokenKind::Text, start, raw)));
        }

        let rest = &bytes[start..];
        let token = if rest.starts_with(b"<!--") {
            let end = find_after(rest, 4, b"-->")
                .ok_or_else(|| MalformedDocument::new(start, "unterminated comment"))?;
            let raw = &self.input[start..start + end];
            check_chars(raw, start)?;
            Token::new(TokenKind::Comment, start, raw)
        } else if rest.starts_with(b"<![CDATA[") {
            let end = find_after(rest, 9, b"]]>")
                .ok_or_else(|| MalformedDocument::new(start, "unterminated CDATA section"))?;
            let raw = &self.input[start..start + end];
            check_chars(raw, start)?;
            Token::new(TokenKind::CData, start, raw)
        } else if rest.starts_with(b"<!DOCTYPE") {
            let end = doctype_end(rest)
                .ok_or_else(|| MalformedDocument::new(start, "unterminated DOCTYPE"))?;
            Token::new(TokenKind::DocType, start, &self.input[start..start + end])
        } else if rest.starts_with(b"<?") {
            self.processing_instruction(start)?
        } else if rest.starts_with(b"</") {
            let close = memchr(b'>', rest)
                .ok_or_else(|| MalformedDocument::new(start, "unterminated end tag"))?;
            let name = self.input[start + 2..start + close].trim_end_matches(|c: char| {
                c.is_ascii() && is_whitespace(c as u8)
            });
            validate_name(name, start + 2)?;
            Token::new(TokenKind::EndTag, start, &self.input[start..=start + close]).with_name(name)
        } else if rest.len() > 1 && is_name_start_char(rest[1]) {
            self.element_tag(start)?
        } else {
            return Err(MalformedDocument::new(start, "invalid markup"));
        };

        self.pos = start + token.raw.len();
        Ok(Some(token))
    }

    fn processing_instruction(&self, start: usize) -> Result<Token<'a>, MalformedDocument> {
        let rest = &self.input.as_bytes()[start..];
        let end = find_after(rest, 2, b"?>").ok_or_else(|| {
            MalformedDocument::new(start, "unterminated processing instruction")
        })?;
        let body = &rest[2..end - 2];
        let target_len = body
            .iter()
            .position(|&b| is_whitespace(b))
            .unwrap_or(body.len());
        let target = &self.input[start + 2..start + 2 + target_len];
        validate_name(target, start + 2)?;
        let raw = &self.input[start..start + end];

        if target == "xml" {
            let attrs_src = &self.input[start + 2 + target_len..start + end - 2];
            let attributes = parse_attributes(attrs_src, start + 2 + target_len)?;
            Ok(Token::new(TokenKind::XmlDeclaration, start, raw)
                .with_name(target)
                .with_attributes(attributes))
        } else if target.eq_ignore_ascii_case("xml") {
            Err(MalformedDocument::new(
                start + 2,
                format!("reserved processing instruction target {:?}", target),
            ))
        } else {
            Ok(Token::new(TokenKind::ProcessingInstruction, start, raw).with_name(target))
        }
    }

    fn element_tag(&self, start: usize) -> Result<Token<'a>, MalformedDocument> {
        let rest = &self.input.as_bytes()[start..];
        let close = tag_end(rest).ok_or_else(|| MalformedDocument::new(start, "unterminated start tag"))?;
        let empty = rest[close - 1] == b'/';
        let body_end = if empty { close - 1 } else { close };

        let name_len = rest[1..body_end]
            .iter()
            .position(|&b| is_whitespace(b) || b == b'/')
            .unwrap_or(body_end - 1);
        let name = &self.input[start + 1..start + 1 + name_len];
        validate_name(name, start + 1)?;

        let attrs_start = start + 1 + name_len;
        let attributes = parse_attributes(&self.input[attrs_start..start + body_end], attrs_start)?;

        let kind = if empty {
            TokenKind::EmptyTag
        } else {
            TokenKind::StartTag
        };
        Ok(Token::new(kind, start, &self.input[start..=start + close])
            .with_name(name)
            .with_attributes(attributes))
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>, MalformedDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// End (exclusive) of the first `needle` at or after `from`
fn find_after(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    haystack
        .get(from..)
        .and_then(|tail| memmem::find(tail, needle))
        .map(|i| from + i + needle.len())
}

/// Index of the `>` closing a tag, skipping quoted attribute values
fn tag_end(rest: &[u8]) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &b) in rest.iter().enumerate().skip(1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some(i),
                b'<' => return None,
                _ => {}
            },
        }
    }
    None
}

/// End (exclusive) of a DOCTYPE, allowing an internal subset in brackets
fn doctype_end(rest: &[u8]) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut depth = 0usize;
    for (i, &b) in rest.iter().enumerate().skip(9) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => return Some(i + 1),
                _ => {}
            },
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        Tokenizer::new(input).collect::<Result<Vec<_>, _>>().unwrap()
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokens(input).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_element() {
        let toks = tokens("<root>hello</root>");
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[0].kind, TokenKind::StartTag);
        assert_eq!(toks[0].name, Some("root"));
        assert_eq!(toks[1].raw, "hello");
        assert_eq!(toks[2].kind, TokenKind::EndTag);
        assert_eq!(toks[2].name, Some("root"));
    }

    #[test]
    fn test_empty_element() {
        let toks = tokens(r#"<link rel="self" href="/feed"/>"#);
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::EmptyTag);
        assert_eq!(toks[0].name, Some("link"));
        assert_eq!(toks[0].attributes.len(), 2);

        let toks = tokens("<br/>");
        assert_eq!(toks[0].kind, TokenKind::EmptyTag);
        assert_eq!(toks[0].name, Some("br"));
    }

    #[test]
    fn test_quoted_gt_in_attribute() {
        let toks = tokens(r#"<a title="x > y/">t</a>"#);
        assert_eq!(toks[0].raw, r#"<a title="x > y/">"#);
        assert_eq!(toks[0].kind, TokenKind::StartTag);
    }

    #[test]
    fn test_all_kinds() {
        let input = "<?xml version=\"1.0\"?><!DOCTYPE feed [<!ENTITY e \"x\">]><!-- c --><?pi data?><a><![CDATA[<raw>]]></a>";
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::XmlDeclaration,
                TokenKind::DocType,
                TokenKind::Comment,
                TokenKind::ProcessingInstruction,
                TokenKind::StartTag,
                TokenKind::CData,
                TokenKind::EndTag,
            ]
        );
    }

    #[test]
    fn test_raw_concatenation_is_lossless() {
        let input = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<feed xmlns=\"http://www.w3.org/2005/Atom\">\n  <title>a &amp; b</title>\n</feed>\n";
        let rebuilt: String = tokens(input).iter().map(|t| t.raw).collect();
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn test_whitespace_token() {
        let toks = tokens("<a>\n  <b/>\n</a>");
        assert!(toks[1].is_whitespace());
        assert!(!toks[2].is_whitespace());
    }

    #[test]
    fn test_end_tag_trailing_space() {
        let toks = tokens("<a></a >");
        assert_eq!(toks[1].name, Some("a"));
        assert_eq!(toks[1].raw, "</a >");
    }

    #[test]
    fn test_errors() {
        let cases = [
            "<a",
            "<!-- open",
            "<![CDATA[ open",
            "<? ?>",
            "<?XML version=\"1.0\"?>",
            "< a>",
            "<a b=1>",
            "<a>x & y</a>",
            "</ a>",
        ];
        for case in cases {
            let result: Result<Vec<_>, _> = Tokenizer::new(case).collect();
            assert!(result.is_err(), "expected error for {:?}", case);
        }
    }

    #[test]
    fn test_illegal_characters() {
        for case in [
            "<a>x\u{1}y</a>",
            "<a b=\"\u{8}\"/>",
            "<a><![CDATA[\u{1B}]]></a>",
            "<a><!-- \u{FFFE} --></a>",
            "<a>&#2;</a>",
        ] {
            let result: Result<Vec<_>, _> = Tokenizer::new(case).collect();
            let err = result.unwrap_err();
            assert!(err.offset > 0, "{:?}", case);
        }
        assert!(Tokenizer::new("<a>\ttab\u{E000}</a>").all(|t| t.is_ok()));
    }

    #[test]
    fn test_leading_bom_skipped() {
        let toks = tokens("\u{FEFF}<?xml version=\"1.0\"?><a/>");
        assert_eq!(toks[0].kind, TokenKind::XmlDeclaration);
        assert_eq!(toks[0].offset, 3);
        assert_eq!(toks.len(), 2);
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let mut tokenizer = Tokenizer::new("<a><");
        assert!(tokenizer.next().unwrap().is_ok());
        assert!(tokenizer.next().unwrap().is_err());
        assert!(tokenizer.next().is_none());
    }
}
