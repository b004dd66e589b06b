//! Error types for the edgequake-doc-translate library.
//!
//! Every stage of the upload pipeline returns `Result<_, DocTranslateError>`
//! and the HTTP handler is the only place that turns an error into text for
//! the user. Nothing is caught and re-stringified along the way: the variant
//! that leaves a stage is the variant the handler sees.
//!
//! [`ErrorKind`] groups the variants into the coarse taxonomy the handler and
//! the logs care about (validation, I/O, unsupported format, translation,
//! rendering, internal).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-doc-translate library.
#[derive(Debug, Error)]
pub enum DocTranslateError {
    // ── Intake errors ─────────────────────────────────────────────────────
    /// The submitted form failed validation (missing file, bad language).
    #[error("Invalid form submission: {0}")]
    InvalidForm(String),

    // ── Storage errors ────────────────────────────────────────────────────
    /// The uploaded bytes could not be written under the media root.
    #[error("Failed to save uploaded file '{path}': {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The file extension does not map to a supported document format.
    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    /// The file could not be read or its text could not be extracted.
    #[error("Error reading file: {detail}")]
    ReadFailed { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Install libpdfium system-wide or set PDFIUM_LIB_PATH to the directory containing it."
    )]
    PdfiumBindingFailed(String),

    // ── Translation errors ────────────────────────────────────────────────
    /// The translation backend returned an error or an unusable reply.
    #[error("Translation error: {message}")]
    TranslationFailed { backend: String, message: String },

    /// The extracted text exceeds the configured translation size limit.
    #[error("Document too large to translate: {chars} characters (limit {limit})")]
    InputTooLarge { chars: usize, limit: usize },

    /// The configured LLM provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// lopdf could not build or serialise the output document.
    #[error("Failed to render PDF: {0}")]
    RenderFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file (CLI mode).
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error category, used for logging and for deciding what the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Io,
    UnsupportedFormat,
    Translation,
    Render,
    Internal,
}

impl DocTranslateError {
    /// Classify this error into the pipeline's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocTranslateError::InvalidForm(_) => ErrorKind::Validation,
            DocTranslateError::SaveFailed { .. }
            | DocTranslateError::ReadFailed { .. }
            | DocTranslateError::OutputWriteFailed { .. } => ErrorKind::Io,
            DocTranslateError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            DocTranslateError::TranslationFailed { .. }
            | DocTranslateError::InputTooLarge { .. }
            | DocTranslateError::ProviderNotConfigured { .. } => ErrorKind::Translation,
            DocTranslateError::RenderFailed(_) => ErrorKind::Render,
            DocTranslateError::PdfiumBindingFailed(_)
            | DocTranslateError::InvalidConfig(_)
            | DocTranslateError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The message shown on the re-rendered upload form.
    ///
    /// All categories share one template; the error text is interpolated.
    pub fn user_message(&self) -> String {
        format!("An error occurred: {self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = DocTranslateError::UnsupportedFormat {
            extension: ".xyz".into(),
        };
        assert_eq!(e.to_string(), "Unsupported file format: .xyz");
        assert_eq!(e.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn read_failed_carries_detail() {
        let e = DocTranslateError::ReadFailed {
            path: PathBuf::from("/tmp/x.pdf"),
            detail: "PdfiumLibraryInternalError(FormatError)".into(),
        };
        assert!(e.to_string().starts_with("Error reading file:"));
        assert!(e.to_string().contains("FormatError"));
        assert_eq!(e.kind(), ErrorKind::Io);
    }

    #[test]
    fn translation_failed_display() {
        let e = DocTranslateError::TranslationFailed {
            backend: "google".into(),
            message: "HTTP 429 Too Many Requests".into(),
        };
        assert_eq!(e.to_string(), "Translation error: HTTP 429 Too Many Requests");
        assert_eq!(e.kind(), ErrorKind::Translation);
    }

    #[test]
    fn input_too_large_is_translation_kind() {
        let e = DocTranslateError::InputTooLarge {
            chars: 300_000,
            limit: 200_000,
        };
        assert!(e.to_string().contains("300000"));
        assert_eq!(e.kind(), ErrorKind::Translation);
    }

    #[test]
    fn user_message_interpolates_error() {
        let e = DocTranslateError::RenderFailed("xref overflow".into());
        assert_eq!(
            e.user_message(),
            "An error occurred: Failed to render PDF: xref overflow"
        );
        assert_eq!(e.kind(), ErrorKind::Render);
    }
}
