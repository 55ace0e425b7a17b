use regex::Regex;
use serde_json::{Value as JsonValue, json};
use std::{sync::LazyLock, time::Duration};

use crate::encode::ImagePayload;

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct LlmClient {
    pub base: String,
    pub token: String,
    pub model: String,
}

/// One schema-constrained vision request: instruction text plus inline
/// base64 image parts.
pub struct ImageChatRequest<'a> {
    pub system: &'a str,
    pub text_prompt: &'a str,
    pub images: &'a [ImagePayload],
    pub response_format: JsonValue,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_tokens: Option<u32>,
}

impl LlmClient {
    #[must_use]
    pub const fn new(base: String, token: String, model: String) -> Self {
        Self { base, token, model }
    }

    /// Send one chat request with the images attached as inline data-URL
    /// parts ahead of the instruction text, and parse the reply content as a
    /// JSON object.
    ///
    /// # Errors
    ///
    /// Will return err if the request fails, the endpoint answers non-2xx, or
    /// the reply content cannot be parsed as JSON.
    pub async fn chat_json_images(
        &self,
        http: &reqwest::Client,
        req: ImageChatRequest<'_>,
    ) -> anyhow::Result<JsonValue> {
        let url = format!("{}/chat/completions", self.base.trim_end_matches('/'));

        let mut content: Vec<JsonValue> = req
            .images
            .iter()
            .map(|img| {
                json!({
                    "type": "image_url",
                    "image_url": { "url": img.to_data_url() }
                })
            })
            .collect();
        content.push(json!({ "type": "text", "text": req.text_prompt }));

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": req.system },
                { "role": "user",   "content": content }
            ],
            "temperature": req.temperature,
            "max_tokens": req.max_tokens,
            "response_format": req.response_format,
        });

        let mut http_req = http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(req.timeout)
            .json(&body);

        if !self.token.trim().is_empty() {
            http_req = http_req.bearer_auth(&self.token);
        }

        let resp = http_req.send().await?;
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            anyhow::bail!("LLM HTTP {status}: {text}");
        }

        let envelope: JsonValue = serde_json::from_str(&text)?;
        let content_str = envelope
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("LLM response missing content"))?;

        parse_json_reply(content_str)
    }
}

/// Parse a model reply that should be exactly one JSON object, tolerating
/// surrounding whitespace, markdown fences, and stray prose around the
/// object.
///
/// # Errors
///
/// Will return err if no parseable JSON object can be found.
pub fn parse_json_reply(content: &str) -> anyhow::Result<JsonValue> {
    let trimmed = content.trim();

    if let Ok(js) = serde_json::from_str::<JsonValue>(trimmed) {
        return Ok(js);
    }
    if let Some(js) = extract_fenced_json(trimmed) {
        return Ok(serde_json::from_str(&js)?);
    }
    if let Some(js) = extract_largest_json_object(trimmed) {
        return Ok(serde_json::from_str(&js)?);
    }

    anyhow::bail!(
        "LLM did not return valid JSON. Preview: {}",
        &trimmed.chars().take(500).collect::<String>()
    )
}

/// Extract a JSON object from a ```json ... ``` fenced block.
/// Accepts ```json``` or plain ``` ``` fences (case-insensitive).
fn extract_fenced_json(s: &str) -> Option<String> {
    static FENCE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)```(?:json)?\s*(\{.*?\})\s*```").unwrap());

    FENCE_RE
        .captures(s)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Fallback: find the largest balanced `{ ... }` object in text.
/// String-aware so braces inside quoted strings don't break the depth count.
fn extract_largest_json_object(s: &str) -> Option<String> {
    let mut best: Option<(usize, usize)> = None;
    let mut depth = 0usize;
    let mut start = None;

    let mut in_str = false;
    let mut esc = false;

    for (i, ch) in s.char_indices() {
        if in_str {
            match ch {
                _ if esc => esc = false,
                '\\' => esc = true,
                '"' => in_str = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_str = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0
                    && let Some(st) = start.take()
                {
                    let longer = best.is_none_or(|(a, b)| i - st > b - a);
                    if longer {
                        best = Some((st, i));
                    }
                }
            }
            _ => {}
        }
    }

    best.map(|(a, b)| s[a..=b].to_string())
}
