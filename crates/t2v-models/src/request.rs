//! Generation request types.
//!
//! The JSON body accepted by `POST /generate` deserializes straight into
//! [`GenerationRequestBody`]; unknown fields are rejected rather than ignored.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::prompt::{
    normalize_prompts, PromptEntry, ValidationError, ValidationResult, MAX_PROMPT_LEN,
};

/// Output resolution passed to the generation program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "144p")]
    R144p,
    #[serde(rename = "240p")]
    R240p,
    #[serde(rename = "360p")]
    R360p,
    #[serde(rename = "480p")]
    R480p,
    #[serde(rename = "720p")]
    R720p,
    #[serde(rename = "1080p")]
    R1080p,
}

impl Resolution {
    pub fn as_arg(&self) -> &'static str {
        match self {
            Resolution::R144p => "144p",
            Resolution::R240p => "240p",
            Resolution::R360p => "360p",
            Resolution::R480p => "480p",
            Resolution::R720p => "720p",
            Resolution::R1080p => "1080p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// Aspect ratio passed to the generation program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    Classic,
    #[serde(rename = "3:4")]
    ClassicPortrait,
}

impl AspectRatio {
    pub fn as_arg(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Square => "1:1",
            AspectRatio::Classic => "4:3",
            AspectRatio::ClassicPortrait => "3:4",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// Number of frames, either a raw count (`"51"`) or a duration (`"4s"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NumFrames(String);

impl NumFrames {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for NumFrames {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_suffix('s').unwrap_or(s);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("invalid num_frames: {s:?} (expected e.g. \"51\" or \"4s\")"));
        }
        if digits.trim_start_matches('0').is_empty() {
            return Err(format!("invalid num_frames: {s:?} (must be positive)"));
        }
        Ok(Self(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for NumFrames {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NumFramesVisitor;

        impl Visitor<'_> for NumFramesVisitor {
            type Value = NumFrames;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a positive frame count or a duration like \"4s\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                v.to_string().parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                if v <= 0 {
                    return Err(E::custom("num_frames must be positive"));
                }
                self.visit_u64(v as u64)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(NumFramesVisitor)
    }
}

/// How generated files are matched back to prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactNaming {
    /// Nth prompt maps to the Nth file in filename order.
    Positional,
    /// The generation program names each file after its prompt.
    #[default]
    PromptAsPath,
}

impl FromStr for ArtifactNaming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positional" => Ok(ArtifactNaming::Positional),
            "prompt_as_path" | "prompt-as-path" => Ok(ArtifactNaming::PromptAsPath),
            other => Err(format!("unknown artifact naming: {other}")),
        }
    }
}

impl fmt::Display for ArtifactNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactNaming::Positional => f.write_str("positional"),
            ArtifactNaming::PromptAsPath => f.write_str("prompt_as_path"),
        }
    }
}

/// Optional knobs forwarded to the generation program.
///
/// Unset fields are left to the model config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_frames: Option<NumFrames>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
}

/// A prompt/base-prompt pair inside a prompt list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptObject {
    pub prompt: String,
    #[serde(default)]
    pub base_prompt: Option<String>,
}

/// One prompt in a request body: either bare text or a [`PromptObject`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PromptItem {
    Text(String),
    Entry(PromptObject),
}

impl From<PromptItem> for PromptEntry {
    fn from(item: PromptItem) -> Self {
        match item {
            PromptItem::Text(prompt) => PromptEntry::new(prompt),
            PromptItem::Entry(PromptObject {
                prompt,
                base_prompt,
            }) => PromptEntry::with_base(prompt, base_prompt.unwrap_or_default()),
        }
    }
}

/// `prompt` field: a single prompt or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PromptInput {
    One(String),
    Many(Vec<PromptItem>),
}

impl PromptInput {
    pub fn into_entries(self) -> Vec<PromptEntry> {
        match self {
            PromptInput::One(prompt) => vec![PromptEntry::new(prompt)],
            PromptInput::Many(items) => items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Raw JSON body of a generation call.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationRequestBody {
    pub model: String,
    pub prompt: PromptInput,
    #[serde(default)]
    pub num_frames: Option<NumFrames>,
    #[serde(default)]
    pub resolution: Option<Resolution>,
    #[serde(default)]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(default)]
    pub naming: Option<ArtifactNaming>,
}

/// A validated generation request.
///
/// Prompts are already cleaned; the model name is checked against the
/// registry later, when the request is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    model: String,
    prompts: Vec<PromptEntry>,
    params: GenerationParams,
    naming: Option<ArtifactNaming>,
}

impl GenerationRequest {
    /// Build a request, normalizing prompts with `max_len`.
    pub fn new(
        model: impl Into<String>,
        prompts: &[PromptEntry],
        max_len: usize,
    ) -> ValidationResult<Self> {
        let model = model.into().trim().to_string();
        if model.is_empty() {
            return Err(ValidationError::InvalidField(
                "model must not be empty".to_string(),
            ));
        }

        let prompts = normalize_prompts(prompts, max_len)?;
        reject_duplicates(&prompts)?;

        Ok(Self {
            model,
            prompts,
            params: GenerationParams::default(),
            naming: None,
        })
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_naming(mut self, naming: ArtifactNaming) -> Self {
        self.naming = Some(naming);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompts(&self) -> &[PromptEntry] {
        &self.prompts
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Naming policy requested by the caller, if any.
    pub fn naming(&self) -> Option<ArtifactNaming> {
        self.naming
    }

    /// Base prompt recorded for `prompt`, empty when unknown.
    pub fn base_prompt_for(&self, prompt: &str) -> String {
        self.prompts
            .iter()
            .find(|p| p.prompt == prompt)
            .map(|p| p.base_prompt.clone())
            .unwrap_or_default()
    }
}

/// Two equal prompts would name the same output file and object key.
fn reject_duplicates(prompts: &[PromptEntry]) -> ValidationResult<()> {
    let mut seen = HashSet::with_capacity(prompts.len());
    for (index, entry) in prompts.iter().enumerate() {
        if !seen.insert(entry.prompt.as_str()) {
            return Err(ValidationError::DuplicatePrompt {
                index,
                prompt: entry.prompt.clone(),
            });
        }
    }
    Ok(())
}

impl TryFrom<GenerationRequestBody> for GenerationRequest {
    type Error = ValidationError;

    fn try_from(body: GenerationRequestBody) -> Result<Self, Self::Error> {
        let entries = body.prompt.into_entries();
        let mut request = GenerationRequest::new(body.model, &entries, MAX_PROMPT_LEN)?;
        request.params = GenerationParams {
            num_frames: body.num_frames,
            resolution: body.resolution,
            aspect_ratio: body.aspect_ratio,
        };
        request.naming = body.naming;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<GenerationRequestBody, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_single_prompt_body() {
        let body = parse(r#"{"model": "opensora-v1-2", "prompt": "a beautiful waterfall"}"#).unwrap();
        let request = GenerationRequest::try_from(body).unwrap();
        assert_eq!(request.model(), "opensora-v1-2");
        assert_eq!(request.prompts(), &[PromptEntry::new("a beautiful waterfall")]);
        assert_eq!(request.naming(), None);
    }

    #[test]
    fn test_mixed_prompt_list() {
        let body = parse(
            r#"{"model": "m", "prompt": ["one", {"prompt": "two", "base_prompt": "base"}],
                "num_frames": "4s", "resolution": "720p", "aspect_ratio": "9:16",
                "naming": "positional"}"#,
        )
        .unwrap();
        let request = GenerationRequest::try_from(body).unwrap();
        assert_eq!(request.prompts().len(), 2);
        assert_eq!(request.base_prompt_for("two"), "base");
        assert_eq!(request.base_prompt_for("one"), "");
        assert_eq!(request.params().resolution, Some(Resolution::R720p));
        assert_eq!(request.params().aspect_ratio, Some(AspectRatio::Portrait));
        assert_eq!(request.params().num_frames.as_ref().unwrap().as_str(), "4s");
        assert_eq!(request.naming(), Some(ArtifactNaming::Positional));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = parse(r#"{"model": "m", "prompt": "p", "seed": 42}"#).unwrap_err();
        assert!(err.to_string().contains("seed"));
    }

    #[test]
    fn test_unknown_field_in_prompt_object_rejected() {
        assert!(parse(
            r#"{"model": "m", "prompt": [{"prompt": "a cat", "base_promt": "typo"}]}"#
        )
        .is_err());
        assert!(parse(r#"{"model": "m", "prompt": [{"prompt": "a cat", "seed": 3}]}"#).is_err());
        assert!(parse(r#"{"model": "m", "prompt": [{"base_prompt": "a cat"}]}"#).is_err());
    }

    #[test]
    fn test_duplicate_prompts_rejected() {
        let body = parse(r#"{"model": "m", "prompt": ["a cat", " a cat "]}"#).unwrap();
        assert_eq!(
            GenerationRequest::try_from(body).unwrap_err(),
            ValidationError::DuplicatePrompt {
                index: 1,
                prompt: "a cat".to_string()
            }
        );
    }

    #[test]
    fn test_missing_model_rejected() {
        assert!(parse(r#"{"prompt": "p"}"#).is_err());
    }

    #[test]
    fn test_invalid_enums_rejected() {
        assert!(parse(r#"{"model": "m", "prompt": "p", "resolution": "8k"}"#).is_err());
        assert!(parse(r#"{"model": "m", "prompt": "p", "aspect_ratio": "2:1"}"#).is_err());
        assert!(parse(r#"{"model": "m", "prompt": "p", "num_frames": "four"}"#).is_err());
        assert!(parse(r#"{"model": "m", "prompt": "p", "num_frames": 0}"#).is_err());
    }

    #[test]
    fn test_num_frames_integer() {
        let body = parse(r#"{"model": "m", "prompt": "p", "num_frames": 51}"#).unwrap();
        assert_eq!(body.num_frames.unwrap().as_str(), "51");
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let body = parse(r#"{"model": "m", "prompt": ["ok", "  "]}"#).unwrap();
        assert_eq!(
            GenerationRequest::try_from(body).unwrap_err(),
            ValidationError::EmptyPrompt { index: 1 }
        );
    }

    #[test]
    fn test_naming_parse() {
        assert_eq!("positional".parse::<ArtifactNaming>().unwrap(), ArtifactNaming::Positional);
        assert_eq!("prompt-as-path".parse::<ArtifactNaming>().unwrap(), ArtifactNaming::PromptAsPath);
        assert!("random".parse::<ArtifactNaming>().is_err());
    }
}
