//! Result types returned by the translation pipeline.

use crate::config::TargetLanguage;
use crate::pipeline::render::RenderedPdf;
use serde::Serialize;

/// A finished translation, ready to be sent as an attachment or written out.
#[derive(Debug, Clone)]
pub struct TranslatedDocument {
    /// Sanitised name of the source file.
    pub file_name: String,
    /// `<file_name>_translated.pdf`
    pub download_name: String,
    pub target_language: TargetLanguage,
    pub pdf: RenderedPdf,
    pub stats: PipelineStats,
}

/// Counters and per-stage timings for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub uploaded_bytes: usize,
    pub extracted_chars: usize,
    pub translated_chars: usize,
    /// Backend chunks (0 when there was nothing to translate).
    pub chunks: usize,
    /// Pages in the generated PDF.
    pub pages: usize,
    pub extract_duration_ms: u64,
    pub translate_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Name offered to the browser for the generated PDF.
///
/// The full source name is kept, extension included: `notes.txt` becomes
/// `notes.txt_translated.pdf`.
pub fn download_name(file_name: &str) -> String {
    format!("{file_name}_translated.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_name_keeps_source_extension() {
        assert_eq!(download_name("notes.txt"), "notes.txt_translated.pdf");
        assert_eq!(download_name("report.pdf"), "report.pdf_translated.pdf");
    }

    #[test]
    fn stats_serialise_as_flat_json() {
        let stats = PipelineStats {
            chunks: 2,
            pages: 3,
            ..Default::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["chunks"], 2);
        assert_eq!(json["pages"], 3);
        assert_eq!(json["uploaded_bytes"], 0);
    }
}
