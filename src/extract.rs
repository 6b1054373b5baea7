//! Isolating a JSON object inside free-form model output.
//!
//! Models often wrap the requested object in prose or code fences. This only
//! finds the first balanced `{...}` span; strict decoding happens afterwards.

use crate::error::{ParseEvalError, Result};

/// Return the first balanced `{...}` span in `text`.
///
/// Braces are counted without regard to JSON string literals, so a `}` inside
/// a quoted value closes the span early; the strict decode then rejects it.
pub fn extract_json_object(text: &str) -> Result<&str> {
    let mut start = None;
    let mut depth = 0usize;

    for (i, c) in text.char_indices() {
        match c {
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(start) = start {
                        return Ok(&text[start..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    Err(ParseEvalError::NoBalancedObject(preview(text)))
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 200;
    let mut out: String = text.chars().take(MAX_CHARS).collect();
    if text.chars().count() > MAX_CHARS {
        out.push_str("...");
    }
    out
}
