//! Configuration types for the upload → translate → PDF pipeline.
//!
//! Every knob lives in [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. The server holds one config for its lifetime and
//! hands a shared reference to each request; the CLI builds one per run.
//!
//! The only setting a deployment must think about is the media root. The
//! rest have defaults that reproduce the classic behaviour: US Letter pages,
//! 40pt margins, 15pt line step, one translation attempt.

use crate::error::DocTranslateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default public endpoint of the Google Translate `gtx` client.
pub const DEFAULT_GOOGLE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Configuration for the translation pipeline.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_doc_translate::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .media_root("/var/lib/doc-translate")
///     .max_chunk_chars(3000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Directory under which uploads are stored while a request runs. Default: `media`.
    ///
    /// Each request gets its own scratch directory inside this root; the
    /// directory is removed once the response has been produced.
    pub media_root: PathBuf,

    /// Directory containing libpdfium. If None, the system library is used.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Which translation backend to call. Default: Google `gtx` endpoint.
    pub backend: TranslatorBackend,

    /// Maximum characters sent to the backend in a single call. Default: 4500.
    ///
    /// The public Google endpoint rejects or truncates requests somewhere
    /// above 5 000 characters. Documents that fit are sent in one call.
    pub max_chunk_chars: usize,

    /// Hard ceiling on the extracted text length. Default: 200 000.
    pub max_input_chars: usize,

    /// Per-call translation timeout in seconds. Default: 60.
    pub translate_timeout_secs: u64,

    /// Retry attempts per chunk on a failed translation call. Default: 0.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Maximum tokens the LLM backend may generate per chunk. Default: 4096.
    pub llm_max_tokens: usize,

    /// Sampling temperature for the LLM backend. Default: 0.1.
    pub llm_temperature: f32,

    /// Upper bound on the multipart body size. Default: None (unlimited).
    pub max_upload_bytes: Option<usize>,

    /// Page geometry of the rendered PDF.
    pub layout: PageLayout,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("media"),
            pdfium_lib_path: None,
            backend: TranslatorBackend::default(),
            max_chunk_chars: 4500,
            max_input_chars: 200_000,
            translate_timeout_secs: 60,
            max_retries: 0,
            retry_backoff_ms: 500,
            llm_max_tokens: 4096,
            llm_temperature: 0.1,
            max_upload_bytes: None,
            layout: PageLayout::default(),
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("media_root", &self.media_root)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("backend", &self.backend)
            .field("max_chunk_chars", &self.max_chunk_chars)
            .field("max_input_chars", &self.max_input_chars)
            .field("translate_timeout_secs", &self.translate_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn media_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.media_root = root.into();
        self
    }

    pub fn pdfium_lib_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(dir.into());
        self
    }

    pub fn backend(mut self, backend: TranslatorBackend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn max_chunk_chars(mut self, n: usize) -> Self {
        self.config.max_chunk_chars = n;
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn translate_timeout_secs(mut self, secs: u64) -> Self {
        self.config.translate_timeout_secs = secs.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn llm_max_tokens(mut self, n: usize) -> Self {
        self.config.llm_max_tokens = n;
        self
    }

    pub fn llm_temperature(mut self, t: f32) -> Self {
        self.config.llm_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_upload_bytes(mut self, limit: Option<usize>) -> Self {
        self.config.max_upload_bytes = limit;
        self
    }

    pub fn layout(mut self, layout: PageLayout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, DocTranslateError> {
        let c = &self.config;
        if c.max_chunk_chars < 100 {
            return Err(DocTranslateError::InvalidConfig(format!(
                "max_chunk_chars must be ≥ 100, got {}",
                c.max_chunk_chars
            )));
        }
        if c.max_input_chars < c.max_chunk_chars {
            return Err(DocTranslateError::InvalidConfig(format!(
                "max_input_chars ({}) must not be smaller than max_chunk_chars ({})",
                c.max_input_chars, c.max_chunk_chars
            )));
        }
        c.layout.validate()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The closed set of languages a document can be translated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetLanguage {
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
}

impl TargetLanguage {
    /// Every selectable language, in form order.
    pub const ALL: [TargetLanguage; 3] = [
        TargetLanguage::Spanish,
        TargetLanguage::French,
        TargetLanguage::German,
    ];

    /// ISO 639-1 code sent to the translation backend.
    pub fn code(self) -> &'static str {
        match self {
            TargetLanguage::Spanish => "es",
            TargetLanguage::French => "fr",
            TargetLanguage::German => "de",
        }
    }

    /// English display name, used as the form label and in LLM prompts.
    pub fn label(self) -> &'static str {
        match self {
            TargetLanguage::Spanish => "Spanish",
            TargetLanguage::French => "French",
            TargetLanguage::German => "German",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TargetLanguage {
    type Err = DocTranslateError;

    /// Parse a language code. Only the exact codes `es`, `fr`, `de` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetLanguage::ALL
            .into_iter()
            .find(|lang| lang.code() == s)
            .ok_or_else(|| {
                DocTranslateError::InvalidForm(format!(
                    "Select a valid choice. {s} is not one of the available choices."
                ))
            })
    }
}

/// Which service performs the translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslatorBackend {
    /// Google Translate `gtx` endpoint (no API key).
    Google { endpoint: String },
    /// Any edgequake-llm provider. Both fields None means auto-detect from env.
    Llm {
        provider: Option<String>,
        model: Option<String>,
    },
}

impl Default for TranslatorBackend {
    fn default() -> Self {
        TranslatorBackend::Google {
            endpoint: DEFAULT_GOOGLE_ENDPOINT.to_string(),
        }
    }
}

/// Geometry of the generated PDF, in PDF points (1/72 inch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    /// Horizontal offset of every line.
    pub margin_left: f32,
    /// Distance from the top edge to the first baseline.
    pub margin_top: f32,
    /// A new page starts once the cursor drops below this.
    pub margin_bottom: f32,
    /// Vertical step between consecutive lines.
    pub line_height: f32,
    pub font_size: f32,
}

impl Default for PageLayout {
    /// US Letter, 40pt margins, 15pt leading, 12pt Helvetica.
    fn default() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            margin_left: 40.0,
            margin_top: 40.0,
            margin_bottom: 40.0,
            line_height: 15.0,
            font_size: 12.0,
        }
    }
}

impl PageLayout {
    /// Baseline of the first line on every page.
    pub fn first_baseline(&self) -> f32 {
        self.page_height - self.margin_top
    }

    /// How many lines one page holds with this geometry.
    pub fn lines_per_page(&self) -> usize {
        let usable = self.first_baseline() - self.margin_bottom;
        (usable / self.line_height).floor() as usize + 1
    }

    fn validate(&self) -> Result<(), DocTranslateError> {
        if self.line_height <= 0.0 || self.font_size <= 0.0 {
            return Err(DocTranslateError::InvalidConfig(
                "line_height and font_size must be positive".into(),
            ));
        }
        if self.first_baseline() < self.margin_bottom {
            return Err(DocTranslateError::InvalidConfig(format!(
                "page height {} leaves no room between top margin {} and bottom margin {}",
                self.page_height, self.margin_top, self.margin_bottom
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_language_parses_known_codes() {
        assert_eq!("es".parse::<TargetLanguage>().unwrap(), TargetLanguage::Spanish);
        assert_eq!("fr".parse::<TargetLanguage>().unwrap(), TargetLanguage::French);
        assert_eq!("de".parse::<TargetLanguage>().unwrap(), TargetLanguage::German);
    }

    #[test]
    fn target_language_rejects_others() {
        for bad in ["", "it", "ES", "spanish", " es"] {
            let err = bad.parse::<TargetLanguage>().unwrap_err();
            assert!(
                err.to_string().contains("not one of the available choices"),
                "{bad:?} → {err}"
            );
        }
    }

    #[test]
    fn target_language_serde_uses_codes() {
        let json = serde_json::to_string(&TargetLanguage::German).unwrap();
        assert_eq!(json, "\"de\"");
        let back: TargetLanguage = serde_json::from_str("\"fr\"").unwrap();
        assert_eq!(back, TargetLanguage::French);
    }

    #[test]
    fn default_layout_fits_48_lines() {
        let layout = PageLayout::default();
        assert_eq!(layout.first_baseline(), 752.0);
        assert_eq!(layout.lines_per_page(), 48);
    }

    #[test]
    fn builder_rejects_tiny_chunks() {
        let err = PipelineConfig::builder().max_chunk_chars(10).build().unwrap_err();
        assert!(matches!(err, DocTranslateError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_input_limit_below_chunk() {
        let err = PipelineConfig::builder()
            .max_chunk_chars(5000)
            .max_input_chars(1000)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_input_chars"));
    }

    #[test]
    fn builder_rejects_degenerate_layout() {
        let layout = PageLayout {
            page_height: 60.0,
            ..PageLayout::default()
        };
        assert!(PipelineConfig::builder().layout(layout).build().is_err());
    }

    #[test]
    fn builder_clamps_temperature_and_timeout() {
        let config = PipelineConfig::builder()
            .llm_temperature(5.0)
            .translate_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(config.llm_temperature, 2.0);
        assert_eq!(config.translate_timeout_secs, 1);
    }

    #[test]
    fn default_backend_is_google() {
        match PipelineConfig::default().backend {
            TranslatorBackend::Google { endpoint } => assert_eq!(endpoint, DEFAULT_GOOGLE_ENDPOINT),
            other => panic!("unexpected backend {other:?}"),
        }
    }
}
