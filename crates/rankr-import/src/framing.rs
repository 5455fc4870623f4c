//! Framing detection
//!
//! An import stream is either one JSON array of records or a run of JSON
//! objects written back to back. The first significant byte decides which,
//! once per stream.

use std::io::{self, BufRead};

/// Structural convention of an import stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// `[ {...}, {...} ]`
    Array,
    /// `{...} {...}` with optional whitespace in between
    ObjectStream,
}

/// Skip leading whitespace and pick the framing from the next byte
///
/// Returns `Ok(None)` when the stream holds nothing but whitespace. The
/// significant byte itself is left unread.
pub fn detect_framing<R: BufRead>(reader: &mut R) -> io::Result<Option<Framing>> {
    Ok(skip_whitespace(reader)?.map(|first| match first {
        b'[' => Framing::Array,
        _ => Framing::ObjectStream,
    }))
}

/// Consume space, tab, CR and LF; peek at the byte after them
pub(crate) fn skip_whitespace<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    loop {
        let buf = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if buf.is_empty() {
            return Ok(None);
        }

        let skip = buf.iter().take_while(|b| is_whitespace(**b)).count();
        let next = buf.get(skip).copied();
        reader.consume(skip);

        if next.is_some() {
            return Ok(next);
        }
    }
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    #[test]
    fn test_array_after_whitespace() {
        let mut reader = Cursor::new(b" \r\n\t[{\"id\":1}]".to_vec());
        assert_eq!(detect_framing(&mut reader).unwrap(), Some(Framing::Array));

        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "[{\"id\":1}]");
    }

    #[test]
    fn test_object_stream() {
        let mut reader = Cursor::new(b"{\"id\":1}{\"id\":2}".to_vec());
        assert_eq!(detect_framing(&mut reader).unwrap(), Some(Framing::ObjectStream));
    }

    #[test]
    fn test_anything_else_is_object_stream() {
        let mut reader = Cursor::new(b"  nonsense".to_vec());
        assert_eq!(detect_framing(&mut reader).unwrap(), Some(Framing::ObjectStream));
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(detect_framing(&mut Cursor::new(Vec::new())).unwrap(), None);
        assert_eq!(detect_framing(&mut Cursor::new(b" \n\t\r ".to_vec())).unwrap(), None);
    }

    #[test]
    fn test_whitespace_spanning_buffer_refills() {
        let input = format!("{}[]", " ".repeat(100));
        let mut reader = BufReader::with_capacity(8, Cursor::new(input.into_bytes()));
        assert_eq!(detect_framing(&mut reader).unwrap(), Some(Framing::Array));
    }
}
