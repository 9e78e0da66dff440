use std::borrow::Cow;

use thiserror::Error;

/// Errors in escape sequences of markers given on the command line
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum MarkerError {
    /// The marker is empty
    #[error("Marker must not be empty.")]
    Empty,

    /// Expected character after backslash
    #[error("Expected character after backslash.")]
    ExpectedEscapeCharacter { location: usize },

    /// Unsupported escape sequence (unexpected character after backslash)
    #[error("Unsupported escape sequence (unexpected character after backslash).")]
    UnsupportedEscapeSequence { location: usize },

    /// Expected hex character in `\x` or `\u` escape sequence
    #[error("Expected hex character in escape sequence.")]
    ExpectedHex { location: usize },

    /// Found invalid hex character in `\x` or `\u` escape sequence
    #[error("Found invalid hex character in escape sequence.")]
    InvalidHex { location: usize },

    /// Unicode escape sequence could not be converted to a character
    #[error("Unicode escape sequence could not be converted to a character.")]
    InvalidUnicodeEscapeSequence { start: usize, end: usize },
}

impl MarkerError {
    /// The byte range of the marker string the error refers to
    pub fn span(&self) -> (usize, usize) {
        match *self {
            MarkerError::Empty => (0, 0),
            MarkerError::ExpectedEscapeCharacter { location }
            | MarkerError::UnsupportedEscapeSequence { location }
            | MarkerError::ExpectedHex { location }
            | MarkerError::InvalidHex { location } => (location, location + 1),
            MarkerError::InvalidUnicodeEscapeSequence { start, end } => (start, end),
        }
    }
}

/// Read `count` hex digits from `chars` and return their value
fn hex_value(
    chars: &mut std::str::CharIndices,
    count: usize,
    escape_end: usize,
) -> Result<u32, MarkerError> {
    let mut v = 0u32;
    for k in 0..count {
        let (xi, x) = chars.next().ok_or(MarkerError::ExpectedHex {
            location: escape_end + k,
        })?;
        let xv = x
            .to_digit(16)
            .ok_or(MarkerError::InvalidHex { location: xi })?;
        v <<= 4;
        v |= xv;
    }
    Ok(v)
}

/// Decodes escape sequences in a marker given on the command line. Supported
/// are `\\`, `\n`, `\r`, `\t`, `\0`, `\xNN` (a single arbitrary byte) and
/// `\uXXXX` (a UTF-8 encoded character). Returns the original bytes if the
/// marker does not contain escape sequences.
pub fn unescape_marker(s: &str) -> Result<Cow<[u8]>, MarkerError> {
    if s.is_empty() {
        return Err(MarkerError::Empty);
    }
    unescape(s)
}

/// Decodes escape sequences like [`unescape_marker`] but also accepts an
/// empty string
pub fn unescape(s: &str) -> Result<Cow<[u8]>, MarkerError> {
    if !s.contains('\\') {
        return Ok(Cow::from(s.as_bytes()));
    }

    let mut result = Vec::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            let mut buf = [0; 4];
            result.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        // get escaped character
        let (j, n) = chars
            .next()
            .ok_or(MarkerError::ExpectedEscapeCharacter { location: i })?;

        match n {
            '\\' => result.push(b'\\'),
            'n' => result.push(b'\n'),
            'r' => result.push(b'\r'),
            't' => result.push(b'\t'),
            '0' => result.push(0),

            'x' => {
                let b = hex_value(&mut chars, 2, j + 1)?;
                result.push(b as u8);
            }

            'u' => {
                let u = hex_value(&mut chars, 4, j + 1)?;
                let c = char::from_u32(u).ok_or(MarkerError::InvalidUnicodeEscapeSequence {
                    start: j,
                    end: j + 5,
                })?;
                let mut buf = [0; 4];
                result.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }

            _ => return Err(MarkerError::UnsupportedEscapeSequence { location: j }),
        }
    }

    Ok(Cow::from(result))
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::{unescape, unescape_marker, MarkerError::*};

    #[test]
    fn no_escape() {
        assert_eq!(
            unescape_marker("<record>"),
            Ok(Cow::from(&b"<record>"[..]))
        );
    }

    #[test]
    fn empty() {
        assert_eq!(unescape_marker(""), Err(Empty));
        assert_eq!(unescape(""), Ok(Cow::from(&b""[..])));
    }

    #[test]
    fn simple_escapes() {
        assert_eq!(
            unescape_marker("\\n\\r\\t\\\\\\0"),
            Ok(Cow::from(&b"\n\r\t\\\0"[..]))
        );
    }

    #[test]
    fn hex_bytes() {
        assert_eq!(
            unescape_marker("\\x1e\\xFFend"),
            Ok(Cow::from(&b"\x1e\xffend"[..]))
        );
    }

    #[test]
    fn unicode() {
        assert_eq!(
            unescape_marker("\\u00e4!"),
            Ok(Cow::from("ä!".as_bytes()))
        );
    }

    #[test]
    fn invalid_hex() {
        assert_eq!(unescape_marker("ab\\x"), Err(ExpectedHex { location: 4 }));
        assert_eq!(unescape_marker("ab\\x1"), Err(ExpectedHex { location: 5 }));
        assert_eq!(unescape_marker("ab\\xg1"), Err(InvalidHex { location: 4 }));
        assert_eq!(unescape_marker("\\u12z4"), Err(InvalidHex { location: 4 }));
        assert_eq!(
            unescape_marker("\\ud800"),
            Err(InvalidUnicodeEscapeSequence { start: 1, end: 6 })
        );
    }

    #[test]
    fn invalid_escape_character() {
        assert_eq!(
            unescape_marker("<\\q>"),
            Err(UnsupportedEscapeSequence { location: 2 })
        );
        assert_eq!(
            unescape_marker("end\\"),
            Err(ExpectedEscapeCharacter { location: 3 })
        );
    }
}
