//! Attribute parsing.
//!
//! Attributes are checked for well-formedness and handed back as raw slices;
//! values keep their entity references undecoded.

use crate::error::MalformedDocument;
use crate::scan::{check_chars, check_references, is_name_char, is_name_start_char, is_whitespace};
use memchr::memchr;

/// A raw `name="value"` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute name, prefix included
    pub name: &'a str,
    /// Value between the quotes, references undecoded
    pub value: &'a str,
}

/// Parse the attribute section of a tag (everything after the element name)
///
/// `offset` is the byte offset of `src` within the document.
pub fn parse_attributes(src: &str, offset: usize) -> Result<Vec<Attribute<'_>>, MalformedDocument> {
    let bytes = src.as_bytes();
    let mut attrs: Vec<Attribute<'_>> = Vec::new();
    let mut pos = 0;

    loop {
        let gap = pos;
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }
        if pos == gap {
            return Err(MalformedDocument::new(
                offset + pos,
                "expected whitespace before attribute",
            ));
        }

        let name_start = pos;
        if !is_name_start_char(bytes[pos]) {
            return Err(MalformedDocument::new(offset + pos, "invalid attribute name"));
        }
        while pos < bytes.len() && is_name_char(bytes[pos]) {
            pos += 1;
        }
        let name = &src[name_start..pos];

        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'=') {
            return Err(MalformedDocument::new(
                offset + name_start,
                format!("attribute {} has no value", name),
            ));
        }
        pos += 1;
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }

        let quote = match bytes.get(pos) {
            Some(&q) if q == b'"' || q == b'\'' => q,
            _ => {
                return Err(MalformedDocument::new(
                    offset + pos,
                    format!("value of attribute {} must be quoted", name),
                ))
            }
        };
        let value_start = pos + 1;
        let value_end = memchr(quote, &bytes[value_start..])
            .map(|i| value_start + i)
            .ok_or_else(|| MalformedDocument::new(offset + pos, "unterminated attribute value"))?;
        let value = &src[value_start..value_end];

        if let Some(i) = memchr(b'<', value.as_bytes()) {
            return Err(MalformedDocument::new(
                offset + value_start + i,
                "'<' in attribute value",
            ));
        }
        check_chars(value, offset + value_start)?;
        check_references(value, offset + value_start)?;

        if attrs.iter().any(|a| a.name == name) {
            return Err(MalformedDocument::new(
                offset + name_start,
                format!("duplicate attribute {}", name),
            ));
        }
        attrs.push(Attribute { name, value });
        pos = value_end + 1;
    }

    Ok(attrs)
}

/// Find an attribute value by name
#[must_use]
pub fn find<'a>(attrs: &[Attribute<'a>], name: &str) -> Option<&'a str> {
    attrs.iter().find(|a| a.name == name).map(|a| a.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(parse_attributes("", 0).unwrap().is_empty());
        assert!(parse_attributes("  \n", 0).unwrap().is_empty());
    }

    #[test]
    fn test_attributes() {
        let attrs = parse_attributes(r#" rel="next" href='http://h/feed?a=1&amp;b=2'"#, 0).unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(find(&attrs, "rel"), Some("next"));
        assert_eq!(find(&attrs, "href"), Some("http://h/feed?a=1&amp;b=2"));
        assert_eq!(find(&attrs, "type"), None);
    }

    #[test]
    fn test_spaces_around_equals() {
        let attrs = parse_attributes(" a = \"1\"\n\tb\t=\t'2' ", 0).unwrap();
        assert_eq!(attrs, vec![Attribute { name: "a", value: "1" }, Attribute { name: "b", value: "2" }]);
    }

    #[test]
    fn test_namespaced() {
        let attrs = parse_attributes(r#" xmlns:atom="http://www.w3.org/2005/Atom" xml:space="preserve""#, 0).unwrap();
        assert_eq!(find(&attrs, "xml:space"), Some("preserve"));
    }

    #[test]
    fn test_malformed() {
        assert!(parse_attributes(" a", 0).is_err());
        assert!(parse_attributes(" a=1", 0).is_err());
        assert!(parse_attributes(" a=\"1", 0).is_err());
        assert!(parse_attributes(" a=\"1\"b=\"2\"", 0).is_err());
        assert!(parse_attributes(" a=\"<\"", 0).is_err());
        assert!(parse_attributes(" a=\"x & y\"", 0).is_err());
        assert!(parse_attributes(" 1a=\"x\"", 0).is_err());
    }

    #[test]
    fn test_illegal_character_in_value() {
        let err = parse_attributes(" a=\"x\u{1}\"", 10).unwrap_err();
        assert_eq!(err.offset, 15);
    }

    #[test]
    fn test_duplicate() {
        let err = parse_attributes(" a=\"1\" a=\"2\"", 20).unwrap_err();
        assert_eq!(err.offset, 27);
        assert!(err.reason.contains("duplicate"));
    }
}
