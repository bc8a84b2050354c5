// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialisation of row sets into tool output.

use recall_core::{ResultShape, Row};
use serde_json::Value;

/// Appended when output was cut at the byte cap.
pub const TRUNCATION_MARKER: &str = "\n[truncated]";

/// Serialises `rows` as JSON in the requested shape.
///
/// `DynamicRows` yields an array of objects. `TypedRecords` yields
/// `{"columns": [...], "rows": [[...]]}` with the column list fixed by the
/// first row; later rows missing a column get `null`.
pub fn render_rows(rows: &[Row], shape: ResultShape) -> String {
    let value = match shape {
        ResultShape::DynamicRows => Value::Array(rows.iter().cloned().map(Value::Object).collect()),
        ResultShape::TypedRecords => {
            let columns: Vec<String> = rows
                .first()
                .map(|r| r.keys().cloned().collect())
                .unwrap_or_default();
            let records: Vec<Value> = rows
                .iter()
                .map(|row| {
                    Value::Array(
                        columns
                            .iter()
                            .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                            .collect(),
                    )
                })
                .collect();
            serde_json::json!({ "columns": columns, "rows": records })
        }
    };
    value.to_string()
}

/// Cuts `text` to at most `max_bytes` on a char boundary, marking the cut.
pub fn truncate_output(text: String, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = text[..end].to_string();
    out.push_str(TRUNCATION_MARKER);
    out
}
