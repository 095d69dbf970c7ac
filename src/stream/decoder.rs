//! Incremental decoder for concatenated JSON
//!
//! Test runners write their reports as consecutive, self-delimiting JSON
//! values with no separator between them. Output arrives in arbitrary
//! chunks; a chunk boundary never aligns with a value boundary by contract.
//! The decoder tracks bracket depth with full string/escape awareness, so
//! braces inside quoted strings do not confuse the framing, and yields each
//! value as soon as its closing token is seen.

use serde_json::Value;

use crate::common::{Error, Result};

/// Streaming decoder state, scoped to one runner invocation
#[derive(Debug, Default)]
pub struct JsonStreamDecoder {
    /// Bytes of the value currently being assembled
    buf: Vec<u8>,
    /// Open brace/bracket depth; 0 means between values
    depth: usize,
    /// Inside a quoted string
    in_string: bool,
    /// The previous byte was an unconsumed backslash
    escaped: bool,
}

impl JsonStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of runner output, returning every value completed by
    /// it in the order their closing tokens were observed.
    ///
    /// Operates on bytes: multi-byte UTF-8 sequences may split across
    /// chunks, and all JSON structural characters are ASCII, so scanning
    /// bytes is unambiguous.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Value>> {
        let mut values = Vec::new();

        for &byte in chunk {
            if self.depth == 0 {
                if byte.is_ascii_whitespace() {
                    continue;
                }
                match byte {
                    b'{' | b'[' => {
                        self.buf.clear();
                        self.buf.push(byte);
                        self.depth = 1;
                        self.in_string = false;
                        self.escaped = false;
                    }
                    other => {
                        return Err(Error::Parse(format!(
                            "unexpected byte '{}' between JSON values",
                            other as char
                        )));
                    }
                }
                continue;
            }

            self.buf.push(byte);

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        let value = serde_json::from_slice(&self.buf)
                            .map_err(|e| Error::Parse(e.to_string()))?;
                        values.push(value);
                        self.buf.clear();
                    }
                }
                _ => {}
            }
        }

        Ok(values)
    }

    /// Whether a value is still being assembled
    pub fn has_partial(&self) -> bool {
        self.depth > 0
    }

    /// Settle the stream at end of input.
    ///
    /// A pending partial value means the runner was cut off mid-write;
    /// callers that key completion off process exit may skip this check.
    pub fn finish(&self) -> Result<()> {
        if self.has_partial() {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode_all(chunks: &[&[u8]]) -> Vec<Value> {
        let mut decoder = JsonStreamDecoder::new();
        let mut values = Vec::new();
        for chunk in chunks {
            values.extend(decoder.push(chunk).unwrap());
        }
        decoder.finish().unwrap();
        values
    }

    #[test]
    fn test_two_values_one_chunk() {
        let values = decode_all(&[br#"{"a":1}{"b":2}"#]);
        assert_eq!(values, vec![json!({"a": 1}), json!({"b": 2})]);
    }

    #[test]
    fn test_brace_inside_string() {
        let values = decode_all(&[br#"{"a":"}"}{"b":1}"#]);
        assert_eq!(values, vec![json!({"a": "}"}), json!({"b": 1})]);
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let values = decode_all(&[br#"{"a":"\"{"}{"b":"\\"}"#]);
        assert_eq!(values, vec![json!({"a": "\"{"}), json!({"b": "\\"})]);
    }

    #[test]
    fn test_every_chunking_yields_same_values() {
        let input = br#"{"a":1}{"b":"}"}{"c":[1,{"d":"\"]"}]}"#;
        let expected = decode_all(&[input]);
        assert_eq!(expected.len(), 3);

        for split in 0..=input.len() {
            let (left, right) = input.split_at(split);
            let values = decode_all(&[left, right]);
            assert_eq!(values, expected, "split at byte {split}");
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let input = br#" {"name":"t1"} [1,2] {"x":{"y":[]}} "#;
        let chunks: Vec<&[u8]> = input.chunks(1).collect();
        let values = decode_all(&chunks);
        assert_eq!(
            values,
            vec![json!({"name": "t1"}), json!([1, 2]), json!({"x": {"y": []}})]
        );
    }

    #[test]
    fn test_multibyte_utf8_split_across_chunks() {
        let input = r#"{"name":"épreuve"}"#.as_bytes();
        // Split inside the two-byte 'é' sequence
        let split = input.iter().position(|&b| b >= 0x80).unwrap() + 1;
        let (left, right) = input.split_at(split);
        let values = decode_all(&[left, right]);
        assert_eq!(values, vec![json!({"name": "épreuve"})]);
    }

    #[test]
    fn test_whitespace_between_values() {
        let values = decode_all(&[b"{\"a\":1}\n  \t{\"b\":2}\n"]);
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_empty_stream() {
        let mut decoder = JsonStreamDecoder::new();
        assert!(decoder.push(b"").unwrap().is_empty());
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn test_stray_bytes_between_values() {
        let mut decoder = JsonStreamDecoder::new();
        let err = decoder.push(b"{\"a\":1}garbage").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_malformed_value() {
        let mut decoder = JsonStreamDecoder::new();
        let err = decoder.push(b"{\"a\":}").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_truncated_stream() {
        let mut decoder = JsonStreamDecoder::new();
        assert!(decoder.push(b"{\"a\":1}{\"b\":").unwrap().len() == 1);
        assert!(decoder.has_partial());
        assert!(matches!(decoder.finish().unwrap_err(), Error::Truncated));
    }
}
