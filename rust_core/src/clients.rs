// rust_core/src/clients.rs
// HTTP implementations of the two generative backends.
// Text: an OpenAI-compatible chat completions endpoint.
// Images: a Replicate hosted model, called synchronously with `Prefer: wait`.

use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::{GeneratorConfig, ImageBackendConfig, TextBackendConfig};
use crate::error::{ConfigError, ServiceError};
use crate::generator::CardGenerator;
use crate::models::{sniff_image_mime, ImageReference};
use crate::services::{normalize_image_output, ImageOptions, ImageService, TextOptions, TextService};

const USER_AGENT: &str = "MemeCardEngine/1.0";

/// Generator wired to the real backends.
pub type LiveGenerator = CardGenerator<OpenAiTextService, ReplicateImageService>;

impl LiveGenerator {
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, ConfigError> {
        // Both services share one connection pool.
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.http_timeout())
            .build()?;
        Ok(CardGenerator::new(
            OpenAiTextService::new(client.clone(), &config.text),
            ReplicateImageService::new(client, &config.image),
        ))
    }
}

/// Turns a non-2xx response into `Unavailable`, keeping the body for the log.
async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Unavailable(format!("{} - {}", status, body.trim())))
}

// --- TEXT ---

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiTextService {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiTextService {
    pub fn new(client: Client, config: &TextBackendConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    fn chat_request<'a>(&'a self, prompt: &'a str, options: &'a TextOptions) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system {
            messages.push(ChatMessage { role: "system", content: system });
        }
        messages.push(ChatMessage { role: "user", content: prompt });
        ChatRequest {
            model: &self.model,
            messages,
            max_tokens: options.max_length,
            temperature: options.temperature,
        }
    }
}

impl TextService for OpenAiTextService {
    async fn complete(&self, prompt: &str, options: &TextOptions) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.chat_request(prompt, options))
            .send()
            .await?;

        let reply: ChatResponse = ensure_success(response).await?.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ServiceError::Malformed("completion without content".into()))
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }
}

// --- IMAGES ---

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    width: u32,
    height: u32,
    guidance_scale: f64,
    num_inference_steps: u32,
}

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    input: PredictionInput<'a>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl Prediction {
    /// Pulls a usable reference out of a finished prediction.
    fn into_reference(self) -> Result<ImageReference, ServiceError> {
        match self.status.as_str() {
            "failed" | "canceled" => {
                let reason = self.error.map(|e| e.to_string()).unwrap_or_else(|| self.status.clone());
                Err(ServiceError::Unavailable(format!("prediction {}", reason)))
            }
            _ => match self.output {
                Some(Value::Null) | None => Err(ServiceError::Unavailable(format!(
                    "prediction not finished (status '{}')",
                    self.status
                ))),
                Some(output) => normalize_image_output(&output),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplicateImageService {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    inline_images: bool,
}

impl ReplicateImageService {
    pub fn new(client: Client, config: &ImageBackendConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            inline_images: config.inline_images,
        }
    }

    /// Streams an image into memory so it can be embedded in the card.
    async fn download(&self, url: &str) -> Result<ImageReference, ServiceError> {
        let response = ensure_success(self.client.get(url).send().await?).await?;
        if let Some(declared) = response.content_length() {
            check_image_size(usize::try_from(declared).unwrap_or(usize::MAX))?;
        }
        let declared_mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("image/"));

        let mut stream = response.bytes_stream();
        let mut buffer = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            append_chunk(&mut buffer, &chunk?)?;
        }

        if buffer.is_empty() {
            return Err(ServiceError::Malformed(format!("empty image body from {}", url)));
        }
        debug!(bytes = buffer.len(), "image downloaded");

        let bytes = buffer.to_vec();
        let mime = match declared_mime {
            Some(mime) => mime,
            None => sniff_image_mime(&bytes)
                .ok_or_else(|| ServiceError::Malformed(format!("{} did not return an image", url)))?
                .to_string(),
        };
        Ok(ImageReference::InlineData { mime, bytes })
    }
}

/// Largest image body we are willing to hold in memory.
const MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;

fn check_image_size(len: usize) -> Result<(), ServiceError> {
    if len > MAX_IMAGE_BYTES {
        return Err(ServiceError::Malformed(format!(
            "image body of {} bytes exceeds the {} byte limit",
            len, MAX_IMAGE_BYTES
        )));
    }
    Ok(())
}

fn append_chunk(buffer: &mut BytesMut, chunk: &[u8]) -> Result<(), ServiceError> {
    check_image_size(buffer.len() + chunk.len())?;
    buffer.extend_from_slice(chunk);
    Ok(())
}

impl ImageService for ReplicateImageService {
    async fn generate(&self, prompt: &str, options: &ImageOptions) -> Result<ImageReference, ServiceError> {
        let body = PredictionRequest {
            input: PredictionInput {
                prompt,
                negative_prompt: options.negative_prompt,
                width: options.width,
                height: options.height,
                guidance_scale: options.guidance_scale,
                num_inference_steps: options.inference_steps,
            },
        };

        let response = self
            .client
            .post(format!("{}/models/{}/predictions", self.base_url, self.model))
            .bearer_auth(&self.api_key)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await?;

        let prediction: Prediction = ensure_success(response).await?.json().await?;
        let reference = prediction.into_reference()?;

        match reference {
            ImageReference::Url(url) if self.inline_images => self.download(&url).await,
            other => Ok(other),
        }
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }
}
