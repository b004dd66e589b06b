//! # edgequake-doc-translate
//!
//! Upload a document, translate its text into Spanish, French or German and
//! get the result back as a PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (.txt .md .csv .pdf)
//!  │
//!  ├─ 1. Intake     validate file + target language (es | fr | de)
//!  ├─ 2. Store      per-request scratch dir under the media root
//!  ├─ 3. Extract    UTF-8 text, or PDF text page by page via pdfium
//!  ├─ 4. Translate  Google gtx endpoint or any edgequake-llm provider
//!  ├─ 5. Render     one PDF line per text line, Helvetica, Letter pages
//!  └─ 6. Deliver    `<name>_translated.pdf` attachment, or the form + error
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc_translate::{create_translator, router, AppState, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder().media_root("media").build()?;
//!     let translator = create_translator(&config).await?;
//!     let app = router(AppState::new(config, translator)?);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc-translate` binary (clap + anyhow + tracing-subscriber) |
//!
//! PDF input needs libpdfium at runtime (system-wide or `PDFIUM_LIB_PATH`).
//! Text formats and PDF output do not.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    PageLayout, PipelineConfig, PipelineConfigBuilder, TargetLanguage, TranslatorBackend,
    DEFAULT_GOOGLE_ENDPOINT,
};
pub use convert::{translate_file, translate_to_file, translate_upload};
pub use error::{DocTranslateError, ErrorKind};
pub use output::{download_name, PipelineStats, TranslatedDocument};
pub use pipeline::render::{create_pdf, RenderedPdf};
pub use pipeline::translate::{create_translator, translate_text, Translator};
pub use server::{router, AppState};
pub use upload::{FormErrors, UploadForm, UploadRequest};
