//! Classification of received payloads for display

use serde_json::Value;
use std::fmt;

/// Bytes per hexdump row
pub const HEXDUMP_WIDTH: usize = 16;

/// How a payload will be shown
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadView<'a> {
    /// Not UTF-8
    Binary(&'a [u8]),
    /// JSON object carrying the selected field
    Json(Value),
    /// Printable text
    Text(&'a str),
    /// UTF-8, but neither JSON with the field nor printable
    Unrecognized,
}

/// Decide how to show `bytes`, extracting `field` from JSON objects
pub fn classify<'a>(bytes: &'a [u8], field: &str) -> PayloadView<'a> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => return PayloadView::Binary(bytes),
    };

    if let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(text) {
        if let Some(value) = object.remove(field) {
            return PayloadView::Json(value);
        }
    }

    if text.chars().all(is_printable) {
        PayloadView::Text(text)
    } else {
        PayloadView::Unrecognized
    }
}

fn is_printable(c: char) -> bool {
    matches!(c, ' '..='~' | '\r' | '\n' | '\t')
}

impl fmt::Display for PayloadView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadView::Binary(bytes) => {
                writeln!(f, "binary data:")?;
                write!(f, "{}", hexdump(bytes))
            }
            PayloadView::Json(value) => match serde_json::to_string_pretty(value) {
                Ok(pretty) => write!(f, "{}", pretty),
                Err(_) => write!(f, "{}", value),
            },
            PayloadView::Text(text) => write!(f, "{}", text),
            PayloadView::Unrecognized => write!(f, "unrecognized payload"),
        }
    }
}

/// Offset, hex and ASCII columns, 16 bytes per row
pub fn hexdump(bytes: &[u8]) -> String {
    let mut rows = Vec::with_capacity(bytes.len().div_ceil(HEXDUMP_WIDTH));

    for (row, chunk) in bytes.chunks(HEXDUMP_WIDTH).enumerate() {
        let hex = chunk
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ");
        let ascii: String = chunk
            .iter()
            .map(|&b| if (32..127).contains(&b) { b as char } else { '.' })
            .collect();
        rows.push(format!(
            "{:08x}  {:<width$}  {}",
            row * HEXDUMP_WIDTH,
            hex,
            ascii,
            width = HEXDUMP_WIDTH * 3
        ));
    }

    rows.join("\n")
}
