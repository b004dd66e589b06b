//! Translation: send extracted text to a backend and get the target-language text back.
//!
//! Backends sit behind the [`Translator`] trait so the pipeline, the server
//! and the tests never care which service answers. Two are built in:
//!
//! * [`GoogleTranslator`]: the public Google Translate `gtx` endpoint.
//!   No API key; the endpoint is configurable so tests can aim it at a mock.
//! * [`LlmTranslator`]: any `edgequake-llm` provider with a translation prompt.
//!
//! ## Chunking
//!
//! Backends have undocumented size limits. [`translate_text`] splits the text
//! at line boundaries into chunks of at most `max_chunk_chars` characters and
//! translates them in order. A document that fits is sent in exactly one
//! call. A single line longer than the limit is split at whitespace, and the
//! pieces are rejoined with a space so no line break is invented.
//!
//! ## Retry Strategy
//!
//! Off by default (`max_retries = 0`). When enabled, each chunk is retried
//! with exponential backoff (`retry_backoff_ms * 2^attempt`). Every call is
//! bounded by `translate_timeout_secs`.

use crate::config::{PipelineConfig, TargetLanguage, TranslatorBackend};
use crate::error::DocTranslateError;
use crate::pipeline::postprocess;
use crate::prompts::{translation_request, TRANSLATION_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// A service that translates text into one of the supported languages.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Short backend name used in logs and error messages.
    fn name(&self) -> &str;

    /// Translate `text` into `target`. Called once per chunk.
    async fn translate(
        &self,
        text: &str,
        target: TargetLanguage,
    ) -> Result<String, DocTranslateError>;
}

/// Result of translating a whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    /// Number of chunks the text was split into (0 for whitespace-only input).
    pub chunks: usize,
}

/// Build the translator selected in the config.
pub async fn create_translator(
    config: &PipelineConfig,
) -> Result<Arc<dyn Translator>, DocTranslateError> {
    match &config.backend {
        TranslatorBackend::Google { endpoint } => Ok(Arc::new(GoogleTranslator::new(
            endpoint.clone(),
            config.translate_timeout_secs,
        )?)),
        TranslatorBackend::Llm { provider, model } => {
            let provider = resolve_provider(provider.as_deref(), model.as_deref())?;
            Ok(Arc::new(LlmTranslator::new(
                provider,
                config.llm_temperature,
                config.llm_max_tokens,
            )))
        }
    }
}

/// Translate a whole document, chunking and retrying according to `config`.
///
/// Whitespace-only input is returned unchanged without calling the backend.
pub async fn translate_text(
    translator: &dyn Translator,
    text: &str,
    target: TargetLanguage,
    config: &PipelineConfig,
) -> Result<Translation, DocTranslateError> {
    if text.trim().is_empty() {
        warn!("Nothing to translate: extracted text is empty");
        return Ok(Translation {
            text: text.to_string(),
            chunks: 0,
        });
    }

    let chars = text.chars().count();
    if chars > config.max_input_chars {
        return Err(DocTranslateError::InputTooLarge {
            chars,
            limit: config.max_input_chars,
        });
    }

    let chunks = split_into_chunks(text, config.max_chunk_chars);
    info!(
        "Translating {} chars into {} via {} ({} chunk(s))",
        chars,
        target,
        translator.name(),
        chunks.len()
    );

    let mut out = String::with_capacity(text.len());
    for (i, chunk) in chunks.iter().enumerate() {
        let translated = if chunk.text.trim().is_empty() {
            chunk.text.clone()
        } else {
            translate_chunk(translator, &chunk.text, target, config, i + 1).await?
        };
        if i > 0 {
            out.push(if chunk.continues_line { ' ' } else { '\n' });
        }
        out.push_str(&translated);
    }

    Ok(Translation {
        text: out,
        chunks: chunks.len(),
    })
}

/// One chunk with timeout and optional retries.
async fn translate_chunk(
    translator: &dyn Translator,
    text: &str,
    target: TargetLanguage,
    config: &PipelineConfig,
    chunk_num: usize,
) -> Result<String, DocTranslateError> {
    let limit = Duration::from_secs(config.translate_timeout_secs);
    let mut last_err: Option<DocTranslateError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Chunk {}: retry {}/{} after {}ms",
                chunk_num, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let result = match timeout(limit, translator.translate(text, target)).await {
            Ok(r) => r,
            Err(_) => Err(DocTranslateError::TranslationFailed {
                backend: translator.name().to_string(),
                message: format!("timed out after {}s", config.translate_timeout_secs),
            }),
        };

        match result {
            Ok(translated) => {
                debug!(
                    "Chunk {}: {} → {} chars",
                    chunk_num,
                    text.chars().count(),
                    translated.chars().count()
                );
                return Ok(translated);
            }
            Err(e) => {
                warn!("Chunk {}: attempt {} failed: {}", chunk_num, attempt + 1, e);
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| DocTranslateError::TranslationFailed {
        backend: translator.name().to_string(),
        message: "Unknown error".to_string(),
    }))
}

// ── Chunking ─────────────────────────────────────────────────────────────

/// A slice of the source text sent to the backend in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// True when this chunk continues a line the previous chunk started.
    pub continues_line: bool,
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Whole lines are packed greedily. A line longer than `max_chars` is cut at
/// the last whitespace that fits (or hard-cut if there is none).
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<Chunk> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    // Buffer under construction and its length in chars.
    let mut current: Option<(String, usize)> = None;
    let mut current_continues = false;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        match current.take() {
            Some((mut buf, len)) if len + 1 + line_len <= max_chars => {
                buf.push('\n');
                buf.push_str(line);
                current = Some((buf, len + 1 + line_len));
                continue;
            }
            Some((buf, _)) => {
                chunks.push(Chunk {
                    text: buf,
                    continues_line: current_continues,
                });
                current_continues = false;
            }
            None => {}
        }

        if line_len <= max_chars {
            current = Some((line.to_string(), line_len));
            continue;
        }

        // Overlong line: every piece but the last is flushed now.
        let mut pieces = split_long_line(line, max_chars);
        let last = pieces.pop().unwrap_or_default();
        for (i, piece) in pieces.into_iter().enumerate() {
            chunks.push(Chunk {
                text: piece,
                continues_line: i > 0,
            });
        }
        let len = last.chars().count();
        current = Some((last, len));
        current_continues = true;
    }

    if let Some((buf, _)) = current {
        chunks.push(Chunk {
            text: buf,
            continues_line: current_continues,
        });
    }

    chunks
}

/// Cut one line into pieces of at most `max_chars`, preferring whitespace.
fn split_long_line(line: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut pieces = Vec::new();
    let mut start = 0;

    while chars.len() - start > max_chars {
        let window = &chars[start..start + max_chars];
        let cut = window
            .iter()
            .rposition(|c| c.is_whitespace())
            .filter(|&p| p > 0)
            .unwrap_or(max_chars);

        pieces.push(chars[start..start + cut].iter().collect::<String>());
        start += cut;
        // The separating whitespace is restored as a single space on reassembly.
        while start < chars.len() && chars[start].is_whitespace() {
            start += 1;
        }
    }
    pieces.push(chars[start..].iter().collect());
    pieces
}

// ── Google backend ───────────────────────────────────────────────────────

/// The public Google Translate `gtx` endpoint.
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, DocTranslateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DocTranslateError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn failed(&self, message: impl Into<String>) -> DocTranslateError {
        DocTranslateError::TranslationFailed {
            backend: self.name().to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate(
        &self,
        text: &str,
        target: TargetLanguage,
    ) -> Result<String, DocTranslateError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target.code()),
                ("dt", "t"),
            ])
            .form(&[("q", text)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.failed("request timed out")
                } else {
                    self.failed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(self.failed(format!("HTTP {}", response.status())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| self.failed(format!("unreadable response: {e}")))?;

        parse_google_response(&body).ok_or_else(|| self.failed("unexpected response shape"))
    }
}

/// Concatenate the translated segments of a `gtx` reply.
///
/// The reply is a nested array whose first element lists segments as
/// `[translated, source, ...]`. Segments without a translated string
/// (transliteration rows) are skipped.
pub fn parse_google_response(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;
    let mut out = String::new();
    for segment in segments {
        if let Some(s) = segment.get(0).and_then(Value::as_str) {
            out.push_str(s);
        }
    }
    Some(out)
}

// ── LLM backend ──────────────────────────────────────────────────────────

/// Translation through any `edgequake-llm` chat provider.
pub struct LlmTranslator {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl LlmTranslator {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }

    fn build_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    fn name(&self) -> &str {
        "llm"
    }

    async fn translate(
        &self,
        text: &str,
        target: TargetLanguage,
    ) -> Result<String, DocTranslateError> {
        let messages = vec![
            ChatMessage::system(TRANSLATION_SYSTEM_PROMPT),
            ChatMessage::user(translation_request(text, target)),
        ];
        let options = self.build_options();

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| DocTranslateError::TranslationFailed {
                backend: self.name().to_string(),
                message: e.to_string(),
            })?;

        debug!(
            "LLM chunk: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        Ok(postprocess::clean_translation(&response.content))
    }
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. Named provider (+ optional model) → `ProviderFactory::create_llm_provider`.
/// 2. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL` both set.
/// 3. `OPENAI_API_KEY` present → OpenAI with the requested or default model.
/// 4. `ProviderFactory::from_env` auto-detection.
fn resolve_provider(
    provider: Option<&str>,
    model: Option<&str>,
) -> Result<Arc<dyn LLMProvider>, DocTranslateError> {
    const DEFAULT_MODEL: &str = "gpt-4.1-nano";

    let create = |name: &str, model: &str| {
        ProviderFactory::create_llm_provider(name, model).map_err(|e| {
            DocTranslateError::ProviderNotConfigured {
                provider: name.to_string(),
                hint: format!("{e}"),
            }
        })
    };

    if let Some(name) = provider {
        return create(name, model.unwrap_or(DEFAULT_MODEL));
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create(&prov, &env_model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create("openai", model.unwrap_or(DEFAULT_MODEL));
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DocTranslateError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or choose --backend google.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
