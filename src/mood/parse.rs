//! Recovering a JSON object from free-form model output.

use serde_json::{Map, Value};

/// Only this many leading bytes of a model answer are scanned.
pub const MAX_SCAN_BYTES: usize = 8 * 1024;

/// Parse `text` as a JSON object, or failing that, the first balanced
/// `{...}` block embedded in it that parses as one.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let text = truncate_at_char_boundary(text.trim(), MAX_SCAN_BYTES);
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        return Some(map);
    }

    balanced_blocks(text)
        .into_iter()
        .find_map(|(start, end)| match serde_json::from_str::<Value>(&text[start..end]) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
}

fn truncate_at_char_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Byte ranges of every balanced `{...}` block, ordered by start offset.
///
/// One pass with a stack of open braces. Quotes only count inside a block,
/// so stray quotes in surrounding prose do not hide the object.
fn balanced_blocks(text: &str) -> Vec<(usize, usize)> {
    let mut open = Vec::new();
    let mut blocks = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if !open.is_empty() => in_string = true,
            '{' => open.push(i),
            '}' => {
                if let Some(start) = open.pop() {
                    blocks.push((start, i + 1));
                }
            }
            _ => {}
        }
    }

    blocks.sort_unstable_by_key(|&(start, _)| start);
    blocks
}
