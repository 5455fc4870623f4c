//! Incremental record decoder
//!
//! [`RecordDecoder`] turns a byte stream into [`ImportUser`] records one at
//! a time, never holding more than the record being decoded. Decoding stops
//! at the first malformed record; everything yielded before it stands.

use serde::de::Error as _;
use serde::Deserialize;
use std::io::BufRead;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::framing::{detect_framing, skip_whitespace, Framing};
use crate::models::ImportUser;

/// Reasons decoding stopped early
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("import cancelled")]
    Cancelled,

    #[error("malformed import stream: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Array framing, `[` not consumed yet
    Open,
    /// Inside the array; `true` once at least one element was read
    InArray(bool),
    Objects,
    Finished,
}

/// Pull-based decoder over a buffered reader
///
/// Yields `Ok(record)` per decoded record. A malformed record or
/// cancellation yields one `Err` and ends the iteration.
pub struct RecordDecoder<R> {
    reader: R,
    framing: Option<Framing>,
    state: State,
    cancel: Option<CancellationToken>,
    decoded: u64,
}

impl<R: BufRead> RecordDecoder<R> {
    /// Detect the framing and prepare to decode
    ///
    /// Whitespace-only input gives a decoder that yields nothing.
    pub fn new(mut reader: R) -> Result<Self, DecodeError> {
        let framing = detect_framing(&mut reader).map_err(serde_json::Error::io)?;
        let state = match framing {
            Some(Framing::Array) => State::Open,
            Some(Framing::ObjectStream) => State::Objects,
            None => State::Finished,
        };

        Ok(Self {
            reader,
            framing,
            state,
            cancel: None,
            decoded: 0,
        })
    }

    /// Check `token` before every record
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// `None` for empty input
    pub fn framing(&self) -> Option<Framing> {
        self.framing
    }

    /// Number of records successfully decoded so far
    pub fn decoded(&self) -> u64 {
        self.decoded
    }

    fn next_record(&mut self) -> Result<Option<ImportUser>, serde_json::Error> {
        match self.state {
            State::Finished => Ok(None),
            State::Objects => {
                if self.peek()?.is_none() {
                    return Ok(None);
                }
                self.decode_one().map(Some)
            }
            State::Open => {
                // detect_framing left the '[' unread
                self.reader.consume(1);
                self.state = State::InArray(false);
                self.next_element(false)
            }
            State::InArray(seen) => self.next_element(seen),
        }
    }

    fn next_element(&mut self, seen: bool) -> Result<Option<ImportUser>, serde_json::Error> {
        match self.peek()? {
            None => return Err(serde_json::Error::custom("unexpected end of input inside array")),
            Some(b']') => {
                // bytes after the closing bracket are never read
                self.reader.consume(1);
                return Ok(None);
            }
            Some(b',') if seen => self.reader.consume(1),
            Some(_) if !seen => {}
            Some(other) => {
                return Err(serde_json::Error::custom(format!(
                    "expected `,` or `]` after array element, found `{}`",
                    char::from(other)
                )))
            }
        }

        self.state = State::InArray(true);
        self.decode_one().map(Some)
    }

    fn decode_one(&mut self) -> Result<ImportUser, serde_json::Error> {
        let mut de = serde_json::Deserializer::from_reader(&mut self.reader);
        ImportUser::deserialize(&mut de)
    }

    fn peek(&mut self) -> Result<Option<u8>, serde_json::Error> {
        skip_whitespace(&mut self.reader).map_err(serde_json::Error::io)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

impl<R: BufRead> Iterator for RecordDecoder<R> {
    type Item = Result<ImportUser, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::Finished {
            return None;
        }

        if self.is_cancelled() {
            self.state = State::Finished;
            return Some(Err(DecodeError::Cancelled));
        }

        match self.next_record() {
            Ok(Some(user)) => {
                self.decoded += 1;
                Some(Ok(user))
            }
            Ok(None) => {
                self.state = State::Finished;
                None
            }
            Err(e) => {
                self.state = State::Finished;
                Some(Err(DecodeError::Malformed(e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    fn decode_all(input: &str) -> (Vec<u64>, Option<DecodeError>) {
        let decoder = RecordDecoder::new(Cursor::new(input.as_bytes().to_vec())).unwrap();
        let mut ids = Vec::new();
        for item in decoder {
            match item {
                Ok(user) => ids.push(user.id.get()),
                Err(e) => return (ids, Some(e)),
            }
        }
        (ids, None)
    }

    #[test]
    fn test_array_framing() {
        let (ids, err) = decode_all(r#" [ {"id":1,"name":"a"} , {"id":"2","name":"b"} ] "#);
        assert_eq!(ids, vec![1, 2]);
        assert!(err.is_none());
    }

    #[test]
    fn test_object_stream_framing() {
        let (ids, err) = decode_all("{\"id\":1}\n{\"id\":2}{\"id\":3}\r\n");
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(err.is_none());
    }

    #[test]
    fn test_empty_inputs_yield_nothing() {
        for input in ["", "  \n ", "[]", " [ ] "] {
            let (ids, err) = decode_all(input);
            assert!(ids.is_empty(), "{input:?}");
            assert!(err.is_none(), "{input:?}");
        }
    }

    #[test]
    fn test_empty_input_has_no_framing() {
        let decoder = RecordDecoder::new(Cursor::new(Vec::new())).unwrap();
        assert_eq!(decoder.framing(), None);
    }

    #[test]
    fn test_malformed_record_stops_after_good_ones() {
        let (ids, err) = decode_all(r#"[{"id":1},{"id":2},{"id":3},{"id":"x"},{"id":5}]"#);
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(matches!(err, Some(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_truncated_array_is_malformed() {
        let (ids, err) = decode_all(r#"[{"id":1},"#);
        assert_eq!(ids, vec![1]);
        assert!(matches!(err, Some(DecodeError::Malformed(_))));

        let (ids, err) = decode_all(r#"[{"id":1}"#);
        assert_eq!(ids, vec![1]);
        assert!(matches!(err, Some(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_missing_separator_is_malformed() {
        let (ids, err) = decode_all(r#"[{"id":1} {"id":2}]"#);
        assert_eq!(ids, vec![1]);
        let err = err.unwrap();
        assert!(err.to_string().contains("expected `,` or `]`"), "{err}");
    }

    #[test]
    fn test_trailing_comma_is_malformed() {
        let (ids, err) = decode_all(r#"[{"id":1},]"#);
        assert_eq!(ids, vec![1]);
        assert!(err.is_some());
    }

    #[test]
    fn test_garbage_in_object_stream_is_malformed() {
        let (ids, err) = decode_all("{\"id\":1} nonsense");
        assert_eq!(ids, vec![1]);
        assert!(err.is_some());
    }

    #[test]
    fn test_bytes_after_array_are_ignored() {
        let (ids, err) = decode_all(r#"[{"id":1}] trailing garbage"#);
        assert_eq!(ids, vec![1]);
        assert!(err.is_none());
    }

    #[test]
    fn test_small_buffer_decodes_same_records() {
        let input = r#"[{"id":1,"name":"first"},{"id":2,"name":"second"}]"#;
        let reader = BufReader::with_capacity(3, Cursor::new(input.as_bytes().to_vec()));
        let ids: Vec<u64> = RecordDecoder::new(reader)
            .unwrap()
            .map(|r| r.unwrap().id.get())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_cancellation_stops_decoding() {
        let token = CancellationToken::new();
        let mut decoder = RecordDecoder::new(Cursor::new(b"{\"id\":1}{\"id\":2}".to_vec()))
            .unwrap()
            .with_cancellation(token.clone());

        assert_eq!(decoder.next().unwrap().unwrap().id.get(), 1);
        token.cancel();
        assert!(matches!(decoder.next(), Some(Err(DecodeError::Cancelled))));
        assert!(decoder.next().is_none());
        assert_eq!(decoder.decoded(), 1);
    }
}
