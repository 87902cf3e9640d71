//! Byte-level character classes and lexical checks.

use crate::error::MalformedDocument;
use memchr::memchr;

/// XML whitespace: space, tab, line feed, carriage return
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Whether every byte of `s` is XML whitespace
#[inline]
pub fn is_blank(s: &str) -> bool {
    s.bytes().all(is_whitespace)
}

/// Characters XML 1.0 allows anywhere in a document
#[inline]
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Reject the first character of `text` that XML 1.0 cannot carry
pub fn check_chars(text: &str, offset: usize) -> Result<(), MalformedDocument> {
    match text.char_indices().find(|&(_, c)| !is_xml_char(c)) {
        Some((i, c)) => Err(MalformedDocument::new(
            offset + i,
            format!("character U+{:04X} is not allowed in XML", c as u32),
        )),
        None => Ok(()),
    }
}

/// Length of a leading byte order mark, 0 if there is none
#[inline]
pub fn bom_len(input: &str) -> usize {
    if input.starts_with('\u{FEFF}') {
        '\u{FEFF}'.len_utf8()
    } else {
        0
    }
}

/// First byte of a name. Non-ASCII bytes are accepted wholesale.
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b':' || b >= 0x80
}

/// Any later byte of a name
#[inline]
pub fn is_name_char(b: u8) -> bool {
    is_name_start_char(b) || b.is_ascii_digit() || b == b'-' || b == b'.'
}

/// Check that `name` is a usable element or attribute name
pub fn validate_name(name: &str, offset: usize) -> Result<(), MalformedDocument> {
    let bytes = name.as_bytes();
    match bytes.first() {
        None => Err(MalformedDocument::new(offset, "missing name")),
        Some(&first) if !is_name_start_char(first) => Err(MalformedDocument::new(
            offset,
            format!("invalid name {:?}", name),
        )),
        Some(_) => match bytes.iter().position(|&b| !is_name_char(b)) {
            Some(i) => Err(MalformedDocument::new(
                offset + i,
                format!("invalid character in name {:?}", name),
            )),
            None => Ok(()),
        },
    }
}

/// Check that every `&` in character data opens a complete reference
pub fn check_references(text: &str, offset: usize) -> Result<(), MalformedDocument> {
    let bytes = text.as_bytes();
    let mut pos = 0;
    while let Some(i) = memchr(b'&', &bytes[pos..]) {
        let amp = pos + i;
        let semi = memchr(b';', &bytes[amp..])
            .map(|j| amp + j)
            .ok_or_else(|| MalformedDocument::new(offset + amp, "unterminated reference"))?;
        let body = &bytes[amp + 1..semi];
        let valid = match body {
            [b'#', b'x', hex @ ..] => is_char_reference(hex, 16),
            [b'#', dec @ ..] => is_char_reference(dec, 10),
            [first, rest @ ..] => is_name_start_char(*first) && rest.iter().all(|&b| is_name_char(b)),
            [] => false,
        };
        if !valid {
            return Err(MalformedDocument::new(offset + amp, "invalid reference"));
        }
        pos = semi + 1;
    }
    Ok(())
}

fn is_char_reference(digits: &[u8], radix: u32) -> bool {
    std::str::from_utf8(digits)
        .ok()
        .filter(|d| !d.is_empty() && d.bytes().all(|b| (b as char).is_digit(radix)))
        .and_then(|d| u32::from_str_radix(d, radix).ok())
        .and_then(char::from_u32)
        .is_some_and(is_xml_char)
}
