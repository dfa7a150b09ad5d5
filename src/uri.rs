//! URI syntax helpers
//!
//! Pure functions only: nothing here touches the network or the disk.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

use crate::error::{Result, VfsError};

/// Extract the leading scheme of a URI, if it has one
///
/// A scheme is a letter followed by letters, digits, `+`, `-` or `.`,
/// terminated by `:`. Note that a DOS drive letter (`C:\dir`) parses as the
/// scheme `C`; resolution relies on the local provider to claim those names.
pub fn extract_scheme(uri: &str) -> Option<&str> {
    for (pos, ch) in uri.char_indices() {
        match ch {
            ':' if pos > 0 => return Some(&uri[..pos]),
            c if c.is_ascii_alphabetic() => continue,
            c if pos > 0 && (c.is_ascii_digit() || matches!(c, '+' | '-' | '.')) => continue,
            _ => break,
        }
    }
    None
}

/// Whether `scheme` is syntactically valid on its own
pub fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Remove `%nn` escapes from a URI
///
/// Every `%` must be followed by two hex digits and the decoded bytes must
/// be valid UTF-8.
pub fn decode(uri: &str) -> Result<String> {
    let bytes = uri.as_bytes();
    let mut pos = 0;
    while let Some(offset) = uri[pos..].find('%') {
        let start = pos + offset;
        let valid = bytes.len() >= start + 3
            && bytes[start + 1].is_ascii_hexdigit()
            && bytes[start + 2].is_ascii_hexdigit();
        if !valid {
            return Err(VfsError::InvalidEscape {
                name: uri.to_string(),
            });
        }
        pos = start + 3;
    }

    match percent_decode_str(uri).decode_utf8() {
        Ok(Cow::Borrowed(s)) => Ok(s.to_string()),
        Ok(Cow::Owned(s)) => Ok(s),
        Err(_) => Err(VfsError::InvalidEscape {
            name: uri.to_string(),
        }),
    }
}
