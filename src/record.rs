//! Typed view of one ShaDa entry.
//!
//! A ShaDa file is a flat MessagePack stream where every entry occupies four
//! consecutive values: `kind`, `timestamp`, `length` and `payload`. Only the
//! four kinds that feed Neovim's `v:oldfiles` are ever inspected; everything
//! else is carried through opaque.

use rmpv::Value;

/// Entry kinds as numbered by Neovim's ShaDa format.
pub mod kind {
    pub const HEADER: u64 = 1;
    pub const SEARCH_PATTERN: u64 = 2;
    pub const REPLACEMENT_STRING: u64 = 3;
    pub const HISTORY_ENTRY: u64 = 4;
    pub const REGISTER: u64 = 5;
    pub const VARIABLE: u64 = 6;
    pub const GLOBAL_MARK: u64 = 7;
    pub const JUMP: u64 = 8;
    pub const BUFFER_LIST: u64 = 9;
    pub const LOCAL_MARK: u64 = 10;
    pub const CHANGE: u64 = 11;
}

/// Kinds whose payload names a file that shows up in the oldfiles list.
pub const HISTORY_KINDS: [u64; 4] = [kind::GLOBAL_MARK, kind::JUMP, kind::LOCAL_MARK, kind::CHANGE];

/// Payload key holding the file name.
pub const FILE_NAME_KEY: &[u8] = b"f";

/// Human readable name of a record kind, used in diagnostics.
pub fn kind_name(code: u64) -> &'static str {
    match code {
        kind::HEADER => "header",
        kind::SEARCH_PATTERN => "search_pattern",
        kind::REPLACEMENT_STRING => "replacement_string",
        kind::HISTORY_ENTRY => "history_entry",
        kind::REGISTER => "register",
        kind::VARIABLE => "variable",
        kind::GLOBAL_MARK => "global_mark",
        kind::JUMP => "jump",
        kind::BUFFER_LIST => "buffer_list",
        kind::LOCAL_MARK => "local_mark",
        kind::CHANGE => "change",
        _ => "unknown",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: u64,
    timestamp: u64,
    length: u64,
    payload: Value,
    /// Exact bytes the decoder consumed for all four values.
    raw: Option<Vec<u8>>,
}

impl Record {
    /// Build a record in memory. It will be encoded through the codec.
    pub fn new(kind: u64, timestamp: u64, length: u64, payload: Value) -> Self {
        Self {
            kind,
            timestamp,
            length,
            payload,
            raw: None,
        }
    }

    pub(crate) fn decoded(
        kind: u64,
        timestamp: u64,
        length: u64,
        payload: Value,
        raw: Vec<u8>,
    ) -> Self {
        Self {
            kind,
            timestamp,
            length,
            payload,
            raw: Some(raw),
        }
    }

    pub fn kind(&self) -> u64 {
        self.kind
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Bytes captured at decode time, if this record came from a stream.
    pub fn raw(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    /// `kind`, `timestamp` and `length` as codec values, in stream order.
    pub fn header_values(&self) -> [Value; 3] {
        [
            Value::from(self.kind),
            Value::from(self.timestamp),
            Value::from(self.length),
        ]
    }

    pub fn is_history_affecting(&self) -> bool {
        HISTORY_KINDS.contains(&self.kind)
    }

    /// File name stored under the `f` key of a map payload.
    ///
    /// Both `str` and `bin` encodings are accepted for the key and the value.
    pub fn file_name(&self) -> Option<&[u8]> {
        let Value::Map(entries) = &self.payload else {
            return None;
        };
        entries
            .iter()
            .find(|(k, _)| value_bytes(k) == Some(FILE_NAME_KEY))
            .and_then(|(_, v)| value_bytes(v))
    }
}

fn value_bytes(value: &Value) -> Option<&[u8]> {
    match value {
        Value::String(s) => Some(s.as_bytes()),
        Value::Binary(b) => Some(b.as_slice()),
        _ => None,
    }
}
