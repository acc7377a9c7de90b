use crate::config::ConfigHandle;
use crate::i18n::LanguageRegistry;
use crate::provider::{DetectedLanguage, LanguageProvider, ProviderError};
use crate::retry::{retry_when, RetryPolicy};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

/// Chat Completion request
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Shape the detection prompt asks the model to answer with.
#[derive(Debug, Deserialize)]
struct DetectionReply {
    #[serde(default)]
    languages: Vec<DetectionCandidate>,
}

#[derive(Debug, Deserialize)]
struct DetectionCandidate {
    code: String,
    #[serde(default)]
    score: f32,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

fn language_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z]{2,3}(-[A-Za-z]{2,4})?$").expect("language code pattern is valid")
    })
}

fn code_fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("code fence pattern is valid")
    })
}

/// Models sometimes wrap JSON in a markdown fence despite instructions.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match code_fence_pattern().captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

const DETECTION_SYSTEM_PROMPT: &str = r#"You identify the language of chat messages.

Reply with JSON only, no prose and no markdown, in exactly this shape:
{"languages": [{"code": "<code>", "score": <confidence between 0 and 1>}]}

- Use ISO 639-1 codes ("en", "fr", "ja"), adding a region only when it matters ("zh-TW", "pt-PT")
- List the most likely language first; include at most three candidates
- Ignore URLs, @mentions, emoji and code when deciding
- If the text has no identifiable language, reply {"languages": []}"#;

/// Build the system prompt for translation
fn build_translation_system_prompt(source: &str, target: &str) -> String {
    let registry = LanguageRegistry::get();
    format!(
        r#"You are a professional translator for a team chat. Translate the user's message from {} ({}) to {} ({}).

- Reply with the translated text only: no quotes, notes or explanations
- Do not translate @mentions, #channels, URLs, code blocks or inline code
- Preserve markdown formatting, emoji and line breaks
- If the message cannot be translated, reply with it unchanged"#,
        registry.display_name(source),
        source,
        registry.display_name(target),
        target
    )
}

/// Detection and translation through an OpenAI-compatible chat completions
/// endpoint. Settings are read from the live snapshot on every call.
#[derive(Clone)]
pub struct ChatCompletionsProvider {
    client: reqwest::Client,
    config: ConfigHandle,
    retry: RetryPolicy,
}

impl ChatCompletionsProvider {
    pub fn new(client: reqwest::Client, config: ConfigHandle) -> Self {
        Self {
            client,
            config,
            retry: RetryPolicy::remote_call(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn complete(
        &self,
        operation: &str,
        system_prompt: String,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        let settings = self.config.snapshot();
        settings
            .validate()
            .map_err(|e| ProviderError::Unconfigured(e.to_string()))?;
        let api_key = settings.api_key.clone().unwrap_or_default();

        // Reasoning models need higher token limits and don't support temperature
        let is_reasoning = is_reasoning_model(&settings.model);
        let request = ChatRequest {
            model: settings.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_prompt,
                },
                Message {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            max_completion_tokens: if is_reasoning { 16000 } else { max_tokens },
            temperature: if is_reasoning { None } else { Some(temperature) },
            reasoning_effort: if is_reasoning {
                Some("low".to_string())
            } else {
                None
            },
        };

        retry_when(
            &self.retry,
            operation,
            || {
                let pending = self
                    .client
                    .post(&settings.api_url)
                    .bearer_auth(&api_key)
                    .timeout(settings.timeout)
                    .json(&request)
                    .send();

                async move {
                    let response = pending
                        .await
                        .map_err(|e| ProviderError::Request(e.to_string()))?;

                    if !response.status().is_success() {
                        let status = response.status().as_u16();
                        let body = response
                            .text()
                            .await
                            .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
                        return Err(ProviderError::Api { status, body });
                    }

                    let chat_response: ChatResponse = response
                        .json()
                        .await
                        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

                    chat_response
                        .choices
                        .into_iter()
                        .next()
                        .map(|c| c.message.content)
                        .ok_or_else(|| {
                            ProviderError::InvalidResponse("response contained no choices".into())
                        })
                }
            },
            ProviderError::is_retryable,
        )
        .await
    }
}

/// Turn the model's detection answer into candidates, dropping anything that
/// does not look like a language code.
fn parse_detection(content: &str) -> Result<Vec<DetectedLanguage>, ProviderError> {
    let reply: DetectionReply = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| ProviderError::InvalidResponse(format!("detection reply: {}", e)))?;

    Ok(reply
        .languages
        .into_iter()
        .map(|c| DetectedLanguage {
            code: c.code.trim().to_string(),
            score: c.score.clamp(0.0, 1.0),
        })
        .filter(|c| language_code_pattern().is_match(&c.code))
        .collect())
}

#[async_trait]
impl LanguageProvider for ChatCompletionsProvider {
    async fn detect_language(&self, text: &str) -> Result<Vec<DetectedLanguage>, ProviderError> {
        let content = self
            .complete(
                "Language detection",
                DETECTION_SYSTEM_PROMPT.to_string(),
                text,
                200,
                0.0,
            )
            .await?;

        let candidates = parse_detection(&content)?;
        debug!("Detected language candidates: {:?}", candidates);
        Ok(candidates)
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, ProviderError> {
        let content = self
            .complete(
                &format!("Translation {} → {}", source, target),
                build_translation_system_prompt(source, target),
                text,
                4096,
                0.3,
            )
            .await?;

        Ok(keep_surrounding_whitespace(text, &content))
    }
}

/// Replace whatever whitespace the model put around its reply with the
/// input's own leading and trailing whitespace, so an echoed message comes
/// back byte-identical.
fn keep_surrounding_whitespace(input: &str, reply: &str) -> String {
    if input.trim().is_empty() {
        return reply.trim().to_string();
    }
    let leading = &input[..input.len() - input.trim_start().len()];
    let trailing = &input[input.trim_end().len()..];
    format!("{}{}{}", leading, reply.trim(), trailing)
}
