// rust_core/src/services.rs
// The two generative collaborators the engine depends on, the options it
// hands them, and the prompts it sends. The engine never sees raw backend
// payloads: image output is normalized into an `ImageReference` here, at
// the boundary.

use std::future::Future;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;

use crate::error::ServiceError;
use crate::models::{sniff_image_mime, AbilityEffect, AbilityType, Element, ImageReference, Rarity};
use crate::tables::{self, ImageStyle};

// --- CAPABILITIES ---

#[derive(Debug, Clone, PartialEq)]
pub struct TextOptions {
    /// Upper bound on generated tokens.
    pub max_length: u32,
    pub temperature: f32,
    /// Optional role line sent ahead of the prompt.
    pub system: Option<&'static str>,
}

impl TextOptions {
    pub fn new(max_length: u32, temperature: f32) -> Self {
        Self { max_length, temperature, system: None }
    }

    pub fn with_system(mut self, system: &'static str) -> Self {
        self.system = Some(system);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageOptions {
    pub width: u32,
    pub height: u32,
    pub negative_prompt: &'static str,
    pub guidance_scale: f64,
    pub inference_steps: u32,
}

impl ImageOptions {
    pub fn for_style(style: &ImageStyle) -> Self {
        Self {
            width: tables::IMAGE_SIZE,
            height: tables::IMAGE_SIZE,
            negative_prompt: tables::NEGATIVE_PROMPT,
            guidance_scale: style.guidance_scale,
            inference_steps: style.inference_steps,
        }
    }
}

/// Produces short strings from prompts: names, ability names, flavor text.
pub trait TextService: Send + Sync {
    fn complete(
        &self,
        prompt: &str,
        options: &TextOptions,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;

    /// Cheap reachability check.
    fn ping(&self) -> impl Future<Output = Result<(), ServiceError>> + Send {
        async { Ok(()) }
    }
}

/// Produces an illustration for a prompt.
pub trait ImageService: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
        options: &ImageOptions,
    ) -> impl Future<Output = Result<ImageReference, ServiceError>> + Send;

    fn ping(&self) -> impl Future<Output = Result<(), ServiceError>> + Send {
        async { Ok(()) }
    }
}

/// Stand-in used when no backend is configured: every text request fails
/// (so defaults kick in) and every image is the placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl TextService for Offline {
    async fn complete(&self, _prompt: &str, _options: &TextOptions) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable("no text backend configured".into()))
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        Err(ServiceError::Unavailable("no text backend configured".into()))
    }
}

impl ImageService for Offline {
    async fn generate(&self, _prompt: &str, _options: &ImageOptions) -> Result<ImageReference, ServiceError> {
        Ok(ImageReference::Placeholder)
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        Err(ServiceError::Unavailable("no image backend configured".into()))
    }
}

// --- PROMPTS ---

pub const NAME_SYSTEM: &str = "You are a creative meme card name generator.";
pub const ABILITY_SYSTEM: &str = "You are a meme card ability name generator.";
pub const FLAVOR_SYSTEM: &str = "You are a creative meme card flavor text generator.";

pub fn card_name_prompt(element: Element, rarity: Rarity) -> String {
    format!(
        "Generate a creative and funny name for a {} {} meme card. \
         The name should be meme-related and reference internet culture. Keep it under 4 words.",
        rarity.title().to_lowercase(),
        element.title().to_lowercase()
    )
}

pub fn ability_name_prompt(
    element: Element,
    rarity: Rarity,
    ability_type: AbilityType,
    effects: &[AbilityEffect],
) -> String {
    let combo = effects
        .iter()
        .map(|e| format!("{} {}", e.effect_type.as_str(), e.value))
        .collect::<Vec<_>>()
        .join(" + ");
    format!(
        "Create a {} meme-themed ability name for a {} {} card with {} type effect. \
         The ability does {}. Keep it short and reference internet culture. \
         Format: Name: [2-3 words only]",
        tables::power_word(rarity),
        rarity,
        element,
        ability_type.as_str(),
        combo
    )
}

pub fn flavor_prompt(name: &str, element: Element) -> String {
    format!(
        "Write a short, funny flavor text for a meme card named \"{}\" with {} element. \
         Make it reference internet culture and memes. Keep it under 10 words.",
        name,
        element.title().to_lowercase()
    )
}

pub fn image_prompt_request(name: &str, element: Element, rarity: Rarity, style: &ImageStyle) -> String {
    format!(
        "Create a concise prompt for an AI image generator to create a {} trading card illustration \
         for \"{}\", a {} type card. Focus on clear visuals and {} quality.",
        style.style,
        name,
        element,
        rarity.title().to_lowercase()
    )
}

/// Tidies a completion: first non-empty line, no `Name:` label, no wrapping quotes.
/// `None` when nothing usable is left.
pub fn clean_reply(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line
        .strip_prefix("Name:")
        .or_else(|| line.strip_prefix("name:"))
        .unwrap_or(line)
        .trim();
    let line = line.trim_matches(|c| c == '"' || c == '\'' || c == '*').trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

// --- IMAGE OUTPUT NORMALIZATION ---

fn reference_from_str(s: &str) -> Result<ImageReference, ServiceError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ServiceError::Malformed("empty image output".into()));
    }
    if s.starts_with("http") {
        return Ok(ImageReference::Url(s.to_string()));
    }
    if let Some(rest) = s.strip_prefix("data:") {
        let (declared, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| ServiceError::Malformed("data URI is not base64".into()))?;
        let bytes = BASE64
            .decode(payload)
            .map_err(|e| ServiceError::Malformed(format!("bad base64 in data URI: {}", e)))?;
        // The declared type wins so a JPEG stays a JPEG.
        let mime = if declared.starts_with("image/") {
            declared.to_string()
        } else {
            sniff_image_mime(&bytes)
                .ok_or_else(|| ServiceError::Malformed(format!("data URI is not an image: {}", declared)))?
                .to_string()
        };
        return Ok(ImageReference::InlineData { mime, bytes });
    }
    // Bare base64 only counts when it decodes to a known image format;
    // short words like "none" are valid base64 too.
    BASE64
        .decode(s)
        .ok()
        .and_then(ImageReference::sniffed)
        .ok_or_else(|| ServiceError::Malformed("string output is neither a URL nor an encoded image".into()))
}

/// Turns whatever an image backend returned into an `ImageReference`.
/// Accepts a URL, a `data:` URI, bare base64, an array whose first item is
/// one of those, or an object with a `url` field. Anything else is `Malformed`.
pub fn normalize_image_output(output: &Value) -> Result<ImageReference, ServiceError> {
    match output {
        Value::String(s) => reference_from_str(s),
        Value::Array(items) => match items.first() {
            Some(Value::String(s)) => reference_from_str(s),
            Some(other) => Err(ServiceError::Malformed(format!("unexpected array item: {}", other))),
            None => Err(ServiceError::Malformed("empty output array".into())),
        },
        Value::Object(map) => match map.get("url") {
            Some(Value::String(url)) => reference_from_str(url),
            _ => Err(ServiceError::Malformed("object output without a url".into())),
        },
        other => Err(ServiceError::Malformed(format!("unexpected output: {}", other))),
    }
}
