//! Reqwest-based client for OpenAI-compatible multimodal chat completions.

use std::{fs, path::Path};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{FigcapError, Result},
};

static PYTHON_BLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```python(.*?)```").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Inline an image file as a base64 data URL.
    pub fn image_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| FigcapError::io(path, e))?;
        let url = format!("data:{};base64,{}", mime_for(path), STANDARD.encode(bytes));
        Ok(Self::ImageUrl {
            image_url: ImageUrl { url },
        })
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    pub fn multimodal(role: Role, parts: Vec<ContentPart>) -> Self {
        Self { role, content: parts }
    }
}

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl LlmClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let api_base_url = cfg.get("API_BASE_URL").unwrap_or_else(|| "default".into());
        let base_url = normalize_base_url(&api_base_url);
        let api_key = cfg.get("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());

        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .build()?;

        Ok(Self { http, base_url, api_key })
    }

    /// Single-turn, non-streaming completion. Any non-2xx status is an error.
    pub async fn complete(&self, messages: Vec<ChatMessage>, opts: &ChatOptions) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            let hv = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| FigcapError::Config(format!("invalid API key header: {e}")))?;
            headers.insert(AUTHORIZATION, hv);
        }

        let body = request_body(&messages, opts);
        let resp = self.http.post(&url).headers(headers).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FigcapError::Status { url, status, body });
        }

        let completion: Completion = resp.json().await?;
        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

fn normalize_base_url(api_base_url: &str) -> String {
    if api_base_url == "default" {
        return "https://api.openai.com/v1".to_string();
    }
    let trimmed = api_base_url.trim_end_matches('/');
    if !trimmed.ends_with("/v1") && !trimmed.contains("/v1/") {
        format!("{}/v1", trimmed)
    } else {
        trimmed.to_string()
    }
}

fn request_body(messages: &[ChatMessage], opts: &ChatOptions) -> serde_json::Value {
    serde_json::json!({
        "model": opts.model,
        "messages": messages,
        "max_tokens": opts.max_tokens,
    })
}

/// Prompt asking the model to redraw a figure with matplotlib.
pub fn regeneration_prompt(caption: &str) -> String {
    format!(
        "This is a data visualization figure from an academic paper with the caption of {caption}\nPlease write Python code using matplotlib to draw the exact same plot as this one and save it as a png file with 300dpi."
    )
}

/// Concatenate every ```python fenced block, each trimmed, one per line.
pub fn extract_python_code(text: &str) -> String {
    PYTHON_BLOCK_RE
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
