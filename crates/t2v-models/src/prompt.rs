//! Prompt cleaning and validation.
//!
//! Every prompt that ends up in a filename, an object key or a catalog cell
//! goes through [`clean_prompt`] first, so the same text always maps to the
//! same key.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum prompt length for single-column prompt lists and HTTP requests.
pub const MAX_PROMPT_LEN: usize = 500;

/// Maximum prompt length for two-column prompt/base-prompt tables.
pub const MAX_TABLE_PROMPT_LEN: usize = 650;

/// Quote characters stripped from both ends of a prompt.
const EDGE_QUOTES: &[char] = &['"', '\''];

/// Characters removed anywhere in a prompt.
const RESERVED_CHARS: &[char] = &['/', '\\', '"'];

/// Errors raised while validating prompts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Prompt #{index} is empty after cleaning")]
    EmptyPrompt { index: usize },

    #[error("Prompt exceeds {max} characters ({len}): {text}")]
    TooLong { text: String, len: usize, max: usize },

    #[error("No prompts provided")]
    NoPrompts,

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Malformed row at line {line}: {message}")]
    MalformedRow { line: u64, message: String },

    #[error("Unsupported prompt file format: {0}")]
    UnsupportedFormat(String),

    #[error("Prompt #{index} repeats an earlier prompt: {prompt}")]
    DuplicatePrompt { index: usize, prompt: String },

    #[error("Invalid field: {0}")]
    InvalidField(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// A prompt paired with its base prompt.
///
/// `base_prompt` is always present; an absent value is the empty string so
/// CSV rows and object metadata keep a stable shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromptEntry {
    pub prompt: String,
    #[serde(default)]
    pub base_prompt: String,
}

impl PromptEntry {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            base_prompt: String::new(),
        }
    }

    pub fn with_base(prompt: impl Into<String>, base_prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            base_prompt: base_prompt.into(),
        }
    }
}

/// Strip surrounding whitespace and quote characters.
///
/// Used on its own when reading prompts back out of filenames and object
/// keys, where reserved characters can no longer appear.
pub fn trim_prompt(raw: &str) -> String {
    let mut current = raw.trim();
    loop {
        let next = current.trim_matches(EDGE_QUOTES).trim();
        if next.len() == current.len() {
            return next.to_string();
        }
        current = next;
    }
}

/// Apply the canonical sanitization rule to a single prompt.
///
/// - surrounding whitespace and `"`/`'` are stripped
/// - `/`, `\` and `"` are removed everywhere
/// - control characters become a single space
pub fn clean_prompt(raw: &str) -> String {
    let trimmed = trim_prompt(raw);

    let mut cleaned = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        if RESERVED_CHARS.contains(&ch) {
            continue;
        }
        if ch.is_control() {
            if !cleaned.ends_with(' ') {
                cleaned.push(' ');
            }
            continue;
        }
        cleaned.push(ch);
    }

    trim_prompt(&cleaned)
}

fn check_length(text: &str, max_len: usize) -> ValidationResult<()> {
    let len = text.chars().count();
    if len > max_len {
        return Err(ValidationError::TooLong {
            text: text.to_string(),
            len,
            max: max_len,
        });
    }
    Ok(())
}

/// Clean and validate a list of prompt entries.
///
/// Fails on the first empty prompt or on the first prompt/base prompt longer
/// than `max_len` characters. The input is left untouched on failure.
pub fn normalize_prompts(
    entries: &[PromptEntry],
    max_len: usize,
) -> ValidationResult<Vec<PromptEntry>> {
    if entries.is_empty() {
        return Err(ValidationError::NoPrompts);
    }

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let prompt = clean_prompt(&entry.prompt);
            let base_prompt = clean_prompt(&entry.base_prompt);

            if prompt.is_empty() {
                return Err(ValidationError::EmptyPrompt { index });
            }
            check_length(&prompt, max_len)?;
            check_length(&base_prompt, max_len)?;

            Ok(PromptEntry {
                prompt,
                base_prompt,
            })
        })
        .collect()
}

/// Whether a prompt is already in canonical form.
pub fn is_normalized(prompt: &str) -> bool {
    !prompt.is_empty() && clean_prompt(prompt) == prompt
}
