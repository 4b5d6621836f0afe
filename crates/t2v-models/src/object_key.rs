//! Object key encoding.
//!
//! Key format: `<model>/<prompt>.<ext>`. The model is the first path
//! segment; the prompt is everything after it, minus the file extension.

use crate::prompt::trim_prompt;

/// Build the object key for a generated file.
pub fn encode_object_key(model: &str, prompt: &str, ext: &str) -> String {
    format!("{}/{}.{}", model, prompt, ext.trim_start_matches('.'))
}

/// Split an object key back into `(model, prompt)`.
///
/// Returns `None` for keys that are not exactly two non-empty segments
/// ending in a file extension.
pub fn decode_object_key(key: &str) -> Option<(String, String)> {
    let (model, rest) = key.split_once('/')?;
    if model.is_empty() || rest.is_empty() || rest.contains('/') {
        return None;
    }

    let stem = strip_extension(rest)?;
    let prompt = trim_prompt(stem);
    if prompt.is_empty() {
        return None;
    }

    Some((model.to_string(), prompt))
}

/// Strip a trailing `.ext` (1-5 ASCII alphanumerics).
fn strip_extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    let valid_ext = (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric());
    if !valid_ext || stem.is_empty() {
        return None;
    }
    Some(stem)
}
