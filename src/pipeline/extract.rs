//! Text extraction: turn a stored upload into one plain-text string.
//!
//! The format is decided once, from the file extension, into the closed
//! [`DocumentFormat`] enum. Everything after that is an exhaustive `match`,
//! so adding a format means adding a variant and the compiler points at
//! every place that has to handle it.
//!
//! ## Why spawn_blocking for PDFs?
//!
//! `pdfium-render` wraps the pdfium C++ library, which uses thread-local
//! state and blocks while it parses. Extraction runs on tokio's blocking pool
//! so worker threads keep serving other requests.

use crate::error::DocTranslateError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.txt`
    PlainText,
    /// `.md`
    Markdown,
    /// `.csv`
    Csv,
    /// `.pdf`
    Pdf,
}

impl DocumentFormat {
    /// Decide the format from the lowercased file extension.
    ///
    /// Fails with [`DocTranslateError::UnsupportedFormat`] naming the extension
    /// (with its leading dot, or empty when the file has none).
    pub fn from_path(path: &Path) -> Result<Self, DocTranslateError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "txt" => Ok(DocumentFormat::PlainText),
            "md" => Ok(DocumentFormat::Markdown),
            "csv" => Ok(DocumentFormat::Csv),
            "pdf" => Ok(DocumentFormat::Pdf),
            "" => Err(DocTranslateError::UnsupportedFormat {
                extension: String::new(),
            }),
            other => Err(DocTranslateError::UnsupportedFormat {
                extension: format!(".{other}"),
            }),
        }
    }

    /// True for formats read as UTF-8 text without parsing.
    pub fn is_text(self) -> bool {
        !matches!(self, DocumentFormat::Pdf)
    }
}

/// Read the textual content of `path`, dispatching on its format.
///
/// `pdfium_lib_path` is the directory holding libpdfium; `None` binds to the
/// system library. It is only touched for PDFs.
pub async fn read_file_content(
    path: &Path,
    pdfium_lib_path: Option<&Path>,
) -> Result<String, DocTranslateError> {
    let format = DocumentFormat::from_path(path)?;
    debug!("Extracting {} as {:?}", path.display(), format);

    let text = match format {
        DocumentFormat::PlainText | DocumentFormat::Markdown | DocumentFormat::Csv => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| DocTranslateError::ReadFailed {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })?;
            decode_utf8_ignoring_errors(&bytes)
        }
        DocumentFormat::Pdf => {
            let pdf_path = path.to_path_buf();
            let lib_dir = pdfium_lib_path.map(Path::to_path_buf);
            tokio::task::spawn_blocking(move || {
                extract_pdf_text_blocking(&pdf_path, lib_dir.as_deref())
            })
            .await
            .map_err(|e| DocTranslateError::Internal(format!("Extraction task panicked: {}", e)))??
        }
    };

    info!("Extracted {} chars from {}", text.chars().count(), path.display());
    Ok(text)
}

/// Decode UTF-8, silently dropping byte sequences that are not valid.
///
/// Unlike `String::from_utf8_lossy` nothing is substituted for the invalid
/// bytes; they simply vanish.
pub fn decode_utf8_ignoring_errors(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// Bind to libpdfium, preferring an explicit directory over the system library.
pub fn bind_pdfium(lib_dir: Option<&Path>) -> Result<Pdfium, DocTranslateError> {
    let bindings = match lib_dir {
        Some(dir) => {
            let lib = Pdfium::pdfium_platform_library_name_at_path(dir);
            Pdfium::bind_to_library(&lib)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| DocTranslateError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of PDF text extraction.
///
/// Pages are visited in order and their text appended with no separator.
/// The first page that fails aborts the whole document.
fn extract_pdf_text_blocking(
    pdf_path: &Path,
    lib_dir: Option<&Path>,
) -> Result<String, DocTranslateError> {
    let pdfium = bind_pdfium(lib_dir)?;

    let read_failed = |detail: String| DocTranslateError::ReadFailed {
        path: PathBuf::from(pdf_path),
        detail,
    };

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| read_failed(format!("{:?}", e)))?;

    let pages = document.pages();
    debug!("PDF loaded: {} pages", pages.len());

    let mut content = String::new();
    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| read_failed(format!("page {}: {:?}", idx + 1, e)))?;
        content.push_str(&text.all());
    }

    Ok(content)
}
