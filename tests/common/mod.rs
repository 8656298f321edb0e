#![allow(dead_code)]

use rmpv::Value;

pub const JUMP: u64 = 8;
pub const GLOBAL_MARK: u64 = 7;
pub const LOCAL_MARK: u64 = 10;
pub const CHANGE: u64 = 11;
pub const REGISTER: u64 = 5;
pub const HISTORY_ENTRY: u64 = 4;

/// Encode one ShaDa entry the way Neovim lays it out.
pub fn entry(kind: u64, timestamp: u64, payload: &Value) -> Vec<u8> {
    let mut body = Vec::new();
    rmpv::encode::write_value(&mut body, payload).unwrap();
    let mut out = Vec::new();
    for v in [Value::from(kind), Value::from(timestamp), Value::from(body.len() as u64)] {
        rmpv::encode::write_value(&mut out, &v).unwrap();
    }
    out.extend_from_slice(&body);
    out
}

/// Mark-like payload naming `file`.
pub fn file_payload(file: &str) -> Value {
    Value::Map(vec![
        (Value::from("f"), Value::Binary(file.as_bytes().to_vec())),
        (Value::from("l"), Value::from(12)),
        (Value::from("c"), Value::from(0)),
    ])
}

pub fn file_entry(kind: u64, timestamp: u64, file: &str) -> Vec<u8> {
    entry(kind, timestamp, &file_payload(file))
}

/// Command history entry, never inspected by the filter.
pub fn unrelated_entry(timestamp: u64, text: &str) -> Vec<u8> {
    entry(
        HISTORY_ENTRY,
        timestamp,
        &Value::Array(vec![Value::from(0), Value::from(text)]),
    )
}

pub fn concat(parts: &[Vec<u8>]) -> Vec<u8> {
    parts.concat()
}
