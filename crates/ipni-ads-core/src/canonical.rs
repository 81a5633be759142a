//! Canonical DAG-CBOR encoding and encoded-length accounting.
//!
//! Advertisements and entry chunks are encoded as DAG-CBOR:
//! - Map keys sorted by their encoded bytes (for text keys this is the
//!   length-first ordering DAG-CBOR requires)
//! - Integers and lengths use the smallest valid header
//! - Definite lengths only
//! - Links are tag 42 over `0x00 || cid bytes`
//!
//! The [`length`] submodule answers "how many bytes would this token take"
//! without writing anything, which is what entry chunk size accounting is
//! built on.

use cid::Cid;
use ciborium::value::Value;

use crate::error::CodecError;

/// CBOR tag for IPLD links.
pub const CID_TAG: u64 = 42;

/// Build the DAG-CBOR value for a link.
///
/// The leading zero byte is the multibase identity prefix DAG-CBOR keeps for
/// historical reasons.
pub fn link_value(cid: &Cid) -> Value {
    let mut bytes = Vec::with_capacity(cid.encoded_len() + 1);
    bytes.push(0x00);
    bytes.extend_from_slice(&cid.to_bytes());
    Value::Tag(CID_TAG, Box::new(Value::Bytes(bytes)))
}

/// Parse a link value back into a CID.
pub fn value_to_link(value: &Value) -> Result<Cid, CodecError> {
    match value {
        Value::Tag(CID_TAG, inner) => match inner.as_ref() {
            Value::Bytes(b) if b.first() == Some(&0x00) => Cid::try_from(&b[1..])
                .map_err(|e| CodecError::Malformed(format!("invalid link: {}", e))),
            _ => Err(CodecError::Malformed("link must be 0x00-prefixed bytes".into())),
        },
        _ => Err(CodecError::Malformed("expected tag 42 link".into())),
    }
}

/// Encode a value to canonical DAG-CBOR bytes.
pub fn encode_dag_cbor(value: &Value) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Decode DAG-CBOR bytes into a value tree.
pub fn decode_dag_cbor(bytes: &[u8]) -> Result<Value, CodecError> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::Malformed(e.to_string()))
}

/// Look up a text key in a decoded map.
pub(crate) fn map_get<'a>(entries: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    entries
        .iter()
        .find(|(k, _)| matches!(k, Value::Text(t) if t == key))
        .map(|(_, v)| v)
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), CodecError> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item)?;
            }
        }
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Tag(tag, inner) => {
            encode_uint(buf, 6, *tag);
            encode_value_to(buf, inner)?;
        }
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(_) => return Err(CodecError::UnsupportedValue("float")),
        _ => return Err(CodecError::UnsupportedValue("unknown value kind")),
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer header with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), CodecError> {
    let mut pairs = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_buf = Vec::new();
        encode_value_to(&mut key_buf, k)?;
        pairs.push((key_buf, v));
    }

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}

/// Encoded lengths of individual CBOR tokens.
pub mod length {
    /// A CBOR token as seen by the length calculation.
    ///
    /// Byte and text tokens carry their payload length; container tokens carry
    /// their item count and contribute only their header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Token {
        Map(usize),
        Array(usize),
        Bytes(usize),
        Text(usize),
        Tag(u64),
    }

    impl Token {
        /// Text token for a key string.
        pub fn text(s: &str) -> Self {
            Token::Text(s.len())
        }

        /// Number of bytes this token occupies once encoded.
        pub fn encoded_len(self) -> usize {
            match self {
                Token::Map(n) | Token::Array(n) => header_len(n as u64),
                Token::Bytes(n) | Token::Text(n) => header_len(n as u64) + n,
                Token::Tag(t) => header_len(t),
            }
        }
    }

    /// Length of a CBOR header carrying the argument `n`.
    pub const fn header_len(n: u64) -> usize {
        if n < 24 {
            1
        } else if n <= 0xff {
            2
        } else if n <= 0xffff {
            3
        } else if n <= 0xffff_ffff {
            5
        } else {
            9
        }
    }

    /// Sum of the encoded lengths of a token stream.
    pub fn tokens_len<I: IntoIterator<Item = Token>>(tokens: I) -> usize {
        tokens.into_iter().map(Token::encoded_len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::length::{header_len, tokens_len, Token};
    use super::*;

    fn empty_dir_cid() -> Cid {
        Cid::try_from("bafybeiczsscdsbs7ffqz55asqdf3smv6klcw3gofszvwlyarci47bgf354").unwrap()
    }

    #[test]
    fn test_integer_encoding() {
        let mut buf = Vec::new();

        encode_uint(&mut buf, 0, 0);
        assert_eq!(buf, vec![0x00]);

        buf.clear();
        encode_uint(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        buf.clear();
        encode_uint(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 24]);

        buf.clear();
        encode_uint(&mut buf, 0, 256);
        assert_eq!(buf, vec![0x19, 0x01, 0x00]);

        buf.clear();
        encode_uint(&mut buf, 4, 65536);
        assert_eq!(buf, vec![0x9a, 0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_header_len_matches_encoder() {
        for n in [0u64, 23, 24, 255, 256, 65535, 65536, u32::MAX as u64, u32::MAX as u64 + 1] {
            let mut buf = Vec::new();
            encode_uint(&mut buf, 2, n);
            assert_eq!(buf.len(), header_len(n), "header for {}", n);
        }
    }

    #[test]
    fn test_map_keys_length_first() {
        // DAG-CBOR orders "Next" before "Entries" because it is shorter.
        let value = Value::Map(vec![
            (Value::Text("Entries".into()), Value::Array(vec![])),
            (Value::Text("Next".into()), Value::Null),
        ]);
        let bytes = encode_dag_cbor(&value).unwrap();

        assert_eq!(bytes[0], 0xa2);
        assert_eq!(&bytes[1..6], b"\x64Next");
    }

    #[test]
    fn test_link_encoding() {
        let cid = empty_dir_cid();
        let bytes = encode_dag_cbor(&link_value(&cid)).unwrap();

        // tag(42) header, then bytes header, then 0x00 prefix
        assert_eq!(&bytes[..2], &[0xd8, 0x2a]);
        assert_eq!(bytes[4], 0x00);
        assert_eq!(
            bytes.len(),
            tokens_len([Token::Tag(CID_TAG), Token::Bytes(cid.encoded_len() + 1)])
        );

        let decoded = decode_dag_cbor(&bytes).unwrap();
        assert_eq!(value_to_link(&decoded).unwrap(), cid);
    }

    #[test]
    fn test_token_lengths_match_ciborium() {
        let value = Value::Map(vec![(
            Value::Text("Entries".into()),
            Value::Array(vec![Value::Bytes(vec![7; 34]), Value::Bytes(vec![9; 300])]),
        )]);
        let ours = encode_dag_cbor(&value).unwrap();

        let mut theirs = Vec::new();
        ciborium::into_writer(&value, &mut theirs).unwrap();
        assert_eq!(ours, theirs);

        let expected = tokens_len([
            Token::Map(1),
            Token::text("Entries"),
            Token::Array(2),
            Token::Bytes(34),
            Token::Bytes(300),
        ]);
        assert_eq!(ours.len(), expected);
    }

    #[test]
    fn test_float_rejected() {
        let result = encode_dag_cbor(&Value::Float(1.5));
        assert_eq!(result, Err(CodecError::UnsupportedValue("float")));
    }
}
