//! Splitting raw segments into fields, components and sub-components
//!
//! All functions here are pure. Splitting keeps escape pairs intact so the
//! next level down can still recognise them; only leaf tokens are
//! un-escaped. [`escape`] is the exact inverse of [`unescape`].

use std::borrow::Cow;

use crate::base::Delimiters;

/// Split `text` on every `separator` not preceded by `escape`.
pub fn split_escaped(text: &str, separator: char, escape: Option<char>) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices();
    while let Some((i, c)) = chars.next() {
        if Some(c) == escape {
            chars.next();
        } else if c == separator {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Split a raw segment into its fields; the first field is the segment code.
pub fn split_fields<'a>(segment: &'a str, delimiters: &Delimiters) -> Vec<&'a str> {
    split_escaped(segment, delimiters.field, delimiters.escape)
}

/// The code of a raw segment: its first field, trimmed.
pub fn segment_code<'a>(segment: &'a str, delimiters: &Delimiters) -> &'a str {
    let end = segment
        .char_indices()
        .find(|&(_, c)| c == delimiters.field || c == delimiters.component)
        .map(|(i, _)| i)
        .unwrap_or(segment.len());
    segment[..end].trim()
}

/// Remove the escape character in front of every reserved character.
///
/// An escape character followed by an ordinary character is kept as is.
pub fn unescape<'a>(token: &'a str, delimiters: &Delimiters) -> Cow<'a, str> {
    let Some(escape) = delimiters.escape else {
        return Cow::Borrowed(token);
    };
    if !token.contains(escape) {
        return Cow::Borrowed(token);
    }
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();
    while let Some(c) = chars.next() {
        if c == escape {
            match chars.peek() {
                Some(&next) if delimiters.is_reserved(next) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Prefix every reserved character of `value` with the escape character.
///
/// Returns the first offending character when a reserved character occurs
/// and the delimiter set has no escape character.
pub fn escape<'a>(value: &'a str, delimiters: &Delimiters) -> Result<Cow<'a, str>, char> {
    let Some(first) = value.chars().find(|&c| delimiters.is_reserved(c)) else {
        return Ok(Cow::Borrowed(value));
    };
    let Some(escape) = delimiters.escape else {
        return Err(first);
    };
    let mut out = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        if delimiters.is_reserved(c) {
            out.push(escape);
        }
        out.push(c);
    }
    Ok(Cow::Owned(out))
}
