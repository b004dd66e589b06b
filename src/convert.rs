//! End-to-end translation entry points.
//!
//! [`translate_upload`] is what the HTTP handler calls: it persists the
//! upload, then runs the shared pipeline on the stored copy.
//! [`translate_file`] runs the same pipeline on a file that is already on
//! disk (the CLI), and [`translate_to_file`] additionally writes the PDF.
//!
//! Each request walks `Received → Stored → Extracted → Translated → Rendered`
//! and every transition is logged. The first failing stage ends the request;
//! nothing is retried at this level.

use crate::config::{PipelineConfig, TargetLanguage};
use crate::error::DocTranslateError;
use crate::output::{download_name, PipelineStats, TranslatedDocument};
use crate::pipeline::{extract, render, store, translate};
use crate::pipeline::translate::Translator;
use crate::upload::UploadRequest;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run the full pipeline for a validated upload.
///
/// The stored copy lives in a scratch directory that is removed before this
/// function returns, whether it succeeds or not.
pub async fn translate_upload(
    request: &UploadRequest,
    config: &PipelineConfig,
    translator: &dyn Translator,
) -> Result<TranslatedDocument, DocTranslateError> {
    let total_start = Instant::now();
    info!(
        "Received {:?} ({} bytes) → {}",
        request.filename,
        request.content.len(),
        request.target_language
    );

    let stored = store::save_upload(&config.media_root, &request.filename, &request.content)
        .await
        .inspect_err(|e| warn!("Failed at store: {}", e))?;
    info!("Stored as {}", stored.path().display());

    let result = run_pipeline(
        stored.path(),
        stored.file_name(),
        stored.size(),
        request.target_language,
        config,
        translator,
        total_start,
    )
    .await;

    // Scratch directory goes away here.
    drop(stored);
    result
}

/// Translate a file already on disk.
pub async fn translate_file(
    input: impl AsRef<Path>,
    target: TargetLanguage,
    config: &PipelineConfig,
    translator: &dyn Translator,
) -> Result<TranslatedDocument, DocTranslateError> {
    let total_start = Instant::now();
    let input = input.as_ref();
    let size = tokio::fs::metadata(input)
        .await
        .map_err(|e| DocTranslateError::ReadFailed {
            path: input.to_path_buf(),
            detail: e.to_string(),
        })?
        .len() as usize;
    let file_name = input
        .file_name()
        .map(|n| store::sanitize_filename(&n.to_string_lossy()))
        .unwrap_or_else(|| store::sanitize_filename(""));

    info!("Received {} ({} bytes) → {}", input.display(), size, target);
    run_pipeline(input, &file_name, size, target, config, translator, total_start).await
}

/// Translate a file and write the PDF to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn translate_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    target: TargetLanguage,
    config: &PipelineConfig,
    translator: &dyn Translator,
) -> Result<PipelineStats, DocTranslateError> {
    let document = translate_file(input, target, config, translator).await?;
    let path = output_path.as_ref();

    let write_failed = |e: std::io::Error| DocTranslateError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &document.pdf.bytes)
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_failed)?;

    info!("Wrote {} ({} bytes)", path.display(), document.pdf.bytes.len());
    Ok(document.stats)
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_pipeline(
    path: &Path,
    file_name: &str,
    size: usize,
    target: TargetLanguage,
    config: &PipelineConfig,
    translator: &dyn Translator,
    total_start: Instant,
) -> Result<TranslatedDocument, DocTranslateError> {
    // ── Extract ──────────────────────────────────────────────────────────
    let extract_start = Instant::now();
    let text = extract::read_file_content(path, config.pdfium_lib_path.as_deref())
        .await
        .inspect_err(|e| warn!("Failed at extract ({:?}): {}", e.kind(), e))?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    info!("Extracted {} chars in {}ms", text.chars().count(), extract_duration_ms);

    // ── Translate ────────────────────────────────────────────────────────
    let translate_start = Instant::now();
    let translation = translate::translate_text(translator, &text, target, config)
        .await
        .inspect_err(|e| warn!("Failed at translate ({:?}): {}", e.kind(), e))?;
    let translate_duration_ms = translate_start.elapsed().as_millis() as u64;
    info!(
        "Translated into {} ({} chunk(s)) in {}ms",
        target, translation.chunks, translate_duration_ms
    );

    // ── Render ───────────────────────────────────────────────────────────
    let render_start = Instant::now();
    let layout = config.layout.clone();
    let translated_text = translation.text;
    let (pdf, translated_text) = tokio::task::spawn_blocking(move || {
        render::create_pdf(&translated_text, &layout).map(|pdf| (pdf, translated_text))
    })
    .await
    .map_err(|e| DocTranslateError::Internal(format!("Render task panicked: {}", e)))?
    .inspect_err(|e| warn!("Failed at render: {}", e))?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!("Rendered {} page(s) in {}ms", pdf.page_count, render_duration_ms);

    let stats = PipelineStats {
        uploaded_bytes: size,
        extracted_chars: text.chars().count(),
        translated_chars: translated_text.chars().count(),
        chunks: translation.chunks,
        pages: pdf.page_count,
        extract_duration_ms,
        translate_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    debug!("Pipeline stats: {:?}", stats);

    Ok(TranslatedDocument {
        file_name: file_name.to_string(),
        download_name: download_name(file_name),
        target_language: target,
        pdf,
        stats,
    })
}
