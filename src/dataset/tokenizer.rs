//! Streaming JSON event tokenizer
//!
//! Incremental lexer over a chunked byte source. Emits one structural event
//! at a time without materializing the document, so a multi-gigabyte array
//! of records parses in constant memory. Scratch space is bounded by the
//! longest single token (string or number), never the file size.

use std::io::Read;

use crate::utils::DatasetError;

use super::chunk::ChunkedByteSource;

/// Structural event produced by the tokenizer
#[derive(Debug, Clone, PartialEq)]
pub enum JsonEvent {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    /// Object member key
    Key(String),
    String(String),
    UnsignedInt(u64),
    SignedInt(i64),
    Double(f64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

/// What the grammar allows at the current position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// A value (document root, after ':', after ',' in an array)
    Value,
    /// A value or ']' (right after '[')
    ValueOrEnd,
    /// A key or '}' (right after '{')
    KeyOrEnd,
    /// A key (after ',' in an object)
    Key,
    /// ',' or the closing bracket of the innermost container
    CommaOrEnd,
    /// Document complete; only whitespace may follow
    Done,
}

/// Pull-based tokenizer over a byte source
pub struct JsonTokenizer<R> {
    source: ChunkedByteSource<R>,
    stack: Vec<Container>,
    expect: Expect,
    /// Reused token buffer (strings and numbers)
    scratch: Vec<u8>,
}

impl<R: Read> JsonTokenizer<R> {
    pub fn new(source: ChunkedByteSource<R>) -> Self {
        Self {
            source,
            stack: Vec::new(),
            expect: Expect::Value,
            scratch: Vec::new(),
        }
    }

    /// Absolute byte offset of the next unconsumed byte
    pub fn offset(&self) -> u64 {
        self.source.offset()
    }

    /// Next structural event, or `None` once the document has ended
    pub fn next_event(&mut self) -> Result<Option<JsonEvent>, DatasetError> {
        loop {
            let byte = match self.next_nonspace()? {
                Some(b) => b,
                None => {
                    return if self.expect == Expect::Done {
                        Ok(None)
                    } else {
                        Err(self.parse_error("unexpected end of input"))
                    };
                }
            };

            match self.expect {
                Expect::Done => {
                    return Err(
                        self.parse_error(format!("trailing data after document: {:?}", byte as char))
                    );
                }
                Expect::Value => return self.begin_value(byte, false).map(Some),
                Expect::ValueOrEnd => return self.begin_value(byte, true).map(Some),
                Expect::KeyOrEnd => match byte {
                    b'}' => return self.close_container().map(Some),
                    b'"' => return self.read_key().map(Some),
                    _ => {
                        return Err(self.parse_error(format!(
                            "expected key or '}}', got {:?}",
                            byte as char
                        )))
                    }
                },
                Expect::Key => match byte {
                    b'"' => return self.read_key().map(Some),
                    _ => return Err(self.parse_error(format!("expected key, got {:?}", byte as char))),
                },
                Expect::CommaOrEnd => match (byte, self.stack.last().copied()) {
                    (b',', Some(Container::Array)) => {
                        self.expect = Expect::Value;
                    }
                    (b',', Some(Container::Object)) => {
                        self.expect = Expect::Key;
                    }
                    (b']', Some(Container::Array)) | (b'}', Some(Container::Object)) => {
                        return self.close_container().map(Some);
                    }
                    _ => {
                        return Err(self.parse_error(format!(
                            "expected ',' or closing bracket, got {:?}",
                            byte as char
                        )))
                    }
                },
            }
        }
    }

    /// Start parsing a value whose first byte is `byte`. With `allow_end`
    /// set (directly after '['), a ']' closes the array instead.
    fn begin_value(&mut self, byte: u8, allow_end: bool) -> Result<JsonEvent, DatasetError> {
        match byte {
            b']' if allow_end => self.close_container(),
            b'{' => {
                self.stack.push(Container::Object);
                self.expect = Expect::KeyOrEnd;
                Ok(JsonEvent::ObjectStart)
            }
            b'[' => {
                self.stack.push(Container::Array);
                self.expect = Expect::ValueOrEnd;
                Ok(JsonEvent::ArrayStart)
            }
            b'"' => {
                let value = self.read_string()?;
                self.after_value();
                Ok(JsonEvent::String(value))
            }
            b't' => {
                self.read_literal(b"rue")?;
                self.after_value();
                Ok(JsonEvent::Bool(true))
            }
            b'f' => {
                self.read_literal(b"alse")?;
                self.after_value();
                Ok(JsonEvent::Bool(false))
            }
            b'n' => {
                self.read_literal(b"ull")?;
                self.after_value();
                Ok(JsonEvent::Null)
            }
            b'-' | b'0'..=b'9' => {
                let event = self.read_number(byte)?;
                self.after_value();
                Ok(event)
            }
            _ => Err(self.parse_error(format!("unexpected character {:?}", byte as char))),
        }
    }

    /// Pop the innermost container. Callers have already matched the
    /// closing bracket against the container kind.
    fn close_container(&mut self) -> Result<JsonEvent, DatasetError> {
        let container = self
            .stack
            .pop()
            .ok_or_else(|| self.parse_error("closing bracket outside any container"))?;
        self.after_value();
        Ok(match container {
            Container::Object => JsonEvent::ObjectEnd,
            Container::Array => JsonEvent::ArrayEnd,
        })
    }

    fn after_value(&mut self) {
        self.expect = if self.stack.is_empty() {
            Expect::Done
        } else {
            Expect::CommaOrEnd
        };
    }

    /// Parse a key string plus its ':' separator
    fn read_key(&mut self) -> Result<JsonEvent, DatasetError> {
        let key = self.read_string()?;
        match self.next_nonspace()? {
            Some(b':') => {
                self.expect = Expect::Value;
                Ok(JsonEvent::Key(key))
            }
            Some(b) => Err(self.parse_error(format!("expected ':' after key, got {:?}", b as char))),
            None => Err(self.parse_error("unexpected end of input after key")),
        }
    }

    /// Parse a string body; the opening quote has been consumed
    fn read_string(&mut self) -> Result<String, DatasetError> {
        self.scratch.clear();
        loop {
            let byte = self
                .source
                .next_byte()?
                .ok_or_else(|| self.parse_error("unterminated string"))?;
            match byte {
                b'"' => break,
                b'\\' => {
                    let escape = self
                        .source
                        .next_byte()?
                        .ok_or_else(|| self.parse_error("unterminated string escape"))?;
                    match escape {
                        b'"' => self.scratch.push(b'"'),
                        b'\\' => self.scratch.push(b'\\'),
                        b'/' => self.scratch.push(b'/'),
                        b'b' => self.scratch.push(0x08),
                        b'f' => self.scratch.push(0x0C),
                        b'n' => self.scratch.push(b'\n'),
                        b'r' => self.scratch.push(b'\r'),
                        b't' => self.scratch.push(b'\t'),
                        b'u' => {
                            let c = self.read_unicode_escape()?;
                            let mut utf8 = [0u8; 4];
                            self.scratch.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
                        }
                        _ => {
                            return Err(self.parse_error(format!(
                                "invalid escape sequence '\\{}'",
                                escape as char
                            )))
                        }
                    }
                }
                0x00..=0x1F => {
                    return Err(self.parse_error("unescaped control character in string"));
                }
                _ => self.scratch.push(byte),
            }
        }
        match std::str::from_utf8(&self.scratch) {
            Ok(s) => Ok(s.to_string()),
            Err(_) => Err(self.parse_error("invalid UTF-8 in string")),
        }
    }

    /// Parse a \uXXXX escape, consuming a second escape for surrogate pairs
    fn read_unicode_escape(&mut self) -> Result<char, DatasetError> {
        let high = self.read_hex4()?;
        let code_point = match high {
            0xD800..=0xDBFF => {
                let next = [self.source.next_byte()?, self.source.next_byte()?];
                if next != [Some(b'\\'), Some(b'u')] {
                    return Err(self.parse_error("high surrogate not followed by \\u escape"));
                }
                let low = self.read_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.parse_error("invalid low surrogate"));
                }
                0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(self.parse_error("unexpected low surrogate")),
            _ => u32::from(high),
        };
        char::from_u32(code_point).ok_or_else(|| self.parse_error("invalid unicode code point"))
    }

    fn read_hex4(&mut self) -> Result<u16, DatasetError> {
        let mut value: u16 = 0;
        for _ in 0..4 {
            let byte = self
                .source
                .next_byte()?
                .ok_or_else(|| self.parse_error("unterminated unicode escape"))?;
            let digit = (byte as char)
                .to_digit(16)
                .ok_or_else(|| self.parse_error("invalid hex digit in unicode escape"))?;
            value = (value << 4) | digit as u16;
        }
        Ok(value)
    }

    /// Parse a number token starting with `first`. Integers come out as
    /// `UnsignedInt`/`SignedInt`; anything with a fraction, exponent, or
    /// outside 64-bit range comes out as `Double`.
    fn read_number(&mut self, first: u8) -> Result<JsonEvent, DatasetError> {
        self.scratch.clear();
        self.scratch.push(first);
        let mut is_float = false;
        loop {
            match self.source.peek()? {
                Some(b) if b.is_ascii_digit() => {
                    self.scratch.push(b);
                    self.source.next_byte()?;
                }
                Some(b @ (b'.' | b'e' | b'E' | b'+' | b'-')) => {
                    is_float = true;
                    self.scratch.push(b);
                    self.source.next_byte()?;
                }
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.scratch)
            .map_err(|_| self.parse_error("invalid number token"))?;
        if is_float {
            return text
                .parse::<f64>()
                .map(JsonEvent::Double)
                .map_err(|_| self.parse_error(format!("invalid number {:?}", text)));
        }
        if text.starts_with('-') {
            if let Ok(v) = text.parse::<i64>() {
                return Ok(JsonEvent::SignedInt(v));
            }
        } else if let Ok(v) = text.parse::<u64>() {
            return Ok(JsonEvent::UnsignedInt(v));
        }
        // Integer wider than 64 bits
        text.parse::<f64>()
            .map(JsonEvent::Double)
            .map_err(|_| self.parse_error(format!("invalid number {:?}", text)))
    }

    fn read_literal(&mut self, rest: &[u8]) -> Result<(), DatasetError> {
        for &expected in rest {
            match self.source.next_byte()? {
                Some(b) if b == expected => {}
                _ => return Err(self.parse_error("invalid literal")),
            }
        }
        Ok(())
    }

    fn next_nonspace(&mut self) -> Result<Option<u8>, DatasetError> {
        loop {
            match self.source.next_byte()? {
                Some(b' ' | b'\t' | b'\n' | b'\r') => continue,
                other => return Ok(other),
            }
        }
    }

    fn parse_error(&self, message: impl Into<String>) -> DatasetError {
        DatasetError::Parse {
            offset: self.source.offset(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tokenize(input: &str) -> Result<Vec<JsonEvent>, DatasetError> {
        let source = ChunkedByteSource::with_chunk_size(Cursor::new(input.as_bytes().to_vec()), 7);
        let mut tokenizer = JsonTokenizer::new(source);
        let mut events = Vec::new();
        while let Some(event) = tokenizer.next_event()? {
            events.push(event);
        }
        Ok(events)
    }

    #[test]
    fn test_empty_array() {
        assert_eq!(
            tokenize("[]").unwrap(),
            vec![JsonEvent::ArrayStart, JsonEvent::ArrayEnd]
        );
    }

    #[test]
    fn test_record_event_sequence() {
        let input = r#"[{"row_id": 3, "text": "hi", "dim_ids": [1, 2], "weights": [0.5, -1.5]}]"#;
        let events = tokenize(input).unwrap();
        assert_eq!(
            events,
            vec![
                JsonEvent::ArrayStart,
                JsonEvent::ObjectStart,
                JsonEvent::Key("row_id".into()),
                JsonEvent::UnsignedInt(3),
                JsonEvent::Key("text".into()),
                JsonEvent::String("hi".into()),
                JsonEvent::Key("dim_ids".into()),
                JsonEvent::ArrayStart,
                JsonEvent::UnsignedInt(1),
                JsonEvent::UnsignedInt(2),
                JsonEvent::ArrayEnd,
                JsonEvent::Key("weights".into()),
                JsonEvent::ArrayStart,
                JsonEvent::Double(0.5),
                JsonEvent::Double(-1.5),
                JsonEvent::ArrayEnd,
                JsonEvent::ObjectEnd,
                JsonEvent::ArrayEnd,
            ]
        );
    }

    #[test]
    fn test_number_variants() {
        let events = tokenize("[0, -7, 3.25, 1e3, 18446744073709551615]").unwrap();
        assert_eq!(
            events,
            vec![
                JsonEvent::ArrayStart,
                JsonEvent::UnsignedInt(0),
                JsonEvent::SignedInt(-7),
                JsonEvent::Double(3.25),
                JsonEvent::Double(1000.0),
                JsonEvent::UnsignedInt(u64::MAX),
                JsonEvent::ArrayEnd,
            ]
        );
    }

    #[test]
    fn test_integer_wider_than_u64_becomes_double() {
        let events = tokenize("[18446744073709551616]").unwrap();
        assert!(matches!(events[1], JsonEvent::Double(v) if v > 1.8e19));
    }

    #[test]
    fn test_string_escapes() {
        let events = tokenize(r#"["a\"b\\c\nA😀"]"#).unwrap();
        assert_eq!(events[1], JsonEvent::String("a\"b\\c\nA\u{1F600}".into()));
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            tokenize("[true, false, null]").unwrap(),
            vec![
                JsonEvent::ArrayStart,
                JsonEvent::Bool(true),
                JsonEvent::Bool(false),
                JsonEvent::Null,
                JsonEvent::ArrayEnd,
            ]
        );
    }

    #[test]
    fn test_whitespace_between_tokens() {
        let events = tokenize("  [\n\t{ \"k\" :\r1 }\n]  ").unwrap();
        assert_eq!(events.len(), 6);
    }

    #[test]
    fn test_truncated_input_fails_with_offset() {
        let input = r#"[{"row_id": 3"#;
        let source = ChunkedByteSource::new(Cursor::new(input.as_bytes().to_vec()));
        let mut tokenizer = JsonTokenizer::new(source);
        let err = loop {
            match tokenizer.next_event() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected a parse error"),
                Err(e) => break e,
            }
        };
        match err {
            DatasetError::Parse { offset, .. } => assert_eq!(offset, input.len() as u64),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unterminated_string_fails() {
        assert!(matches!(
            tokenize(r#"["abc"#).unwrap_err(),
            DatasetError::Parse { .. }
        ));
    }

    #[test]
    fn test_invalid_token_fails() {
        assert!(matches!(
            tokenize("[tru]").unwrap_err(),
            DatasetError::Parse { .. }
        ));
    }

    #[test]
    fn test_trailing_garbage_fails() {
        assert!(matches!(
            tokenize("[] x").unwrap_err(),
            DatasetError::Parse { .. }
        ));
    }

    #[test]
    fn test_missing_comma_fails() {
        assert!(matches!(
            tokenize("[1 2]").unwrap_err(),
            DatasetError::Parse { .. }
        ));
    }

    #[test]
    fn test_lone_low_surrogate_fails() {
        assert!(matches!(
            tokenize(r#"["\uDE00"]"#).unwrap_err(),
            DatasetError::Parse { .. }
        ));
    }
}
