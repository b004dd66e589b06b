//! Integration tests for the upload endpoint.
//!
//! The translation backend is replaced by a deterministic stub, so these run
//! offline. Only text formats are exercised here; PDF input needs libpdfium
//! and is covered by the `PDFIUM_TESTS`-gated tests in the library.
//!
//! Run with:
//!   cargo test --test server -- --nocapture

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use edgequake_doc_translate::{
    router, AppState, DocTranslateError, PipelineConfig, TargetLanguage, Translator,
};
use lopdf::content::Content;
use lopdf::{Document, Object};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// "Hello world" → "Hola mundo" in Spanish; otherwise prefixes the language code.
#[derive(Default)]
struct StubTranslator {
    calls: AtomicUsize,
}

#[async_trait]
impl Translator for StubTranslator {
    fn name(&self) -> &str {
        "stub"
    }

    async fn translate(
        &self,
        text: &str,
        target: TargetLanguage,
    ) -> Result<String, DocTranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text == "Hello world" && target == TargetLanguage::Spanish {
            return Ok("Hola mundo".to_string());
        }
        Ok(text
            .lines()
            .map(|l| format!("[{}] {l}", target.code()))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

struct FailingTranslator;

#[async_trait]
impl Translator for FailingTranslator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn translate(
        &self,
        _text: &str,
        _target: TargetLanguage,
    ) -> Result<String, DocTranslateError> {
        Err(DocTranslateError::TranslationFailed {
            backend: "failing".into(),
            message: "quota exceeded".into(),
        })
    }
}

fn test_server(media_root: &Path, translator: Arc<dyn Translator>) -> TestServer {
    test_server_with(PipelineConfig::builder().media_root(media_root), translator)
}

fn test_server_with(
    builder: edgequake_doc_translate::PipelineConfigBuilder,
    translator: Arc<dyn Translator>,
) -> TestServer {
    let config = builder.build().expect("valid config");
    let state = AppState::new(config, translator).expect("app state");
    TestServer::new(router(state)).expect("Failed to create test server")
}

fn upload_form(file_name: &str, content: &'static [u8], lang: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("target_language", lang)
        .add_part("file", Part::bytes(content).file_name(file_name))
}

/// All `Tj` strings drawn in the PDF, in page order.
fn pdf_lines(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("valid PDF");
    let mut lines = Vec::new();
    for page_id in doc.get_pages().values() {
        let content = Content::decode(&doc.get_page_content(*page_id).unwrap()).unwrap();
        for op in content.operations {
            if op.operator == "Tj" {
                if let Object::String(s, _) = &op.operands[0] {
                    lines.push(String::from_utf8_lossy(s).into_owned());
                }
            }
        }
    }
    lines
}

fn page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes).unwrap().get_pages().len()
}

// ── Form ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_upload_shows_form_with_languages() {
    let media = tempfile::tempdir().unwrap();
    let server = test_server(media.path(), Arc::new(StubTranslator::default()));

    let response = server.get("/upload").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("enctype=\"multipart/form-data\""));
    for code in ["es", "fr", "de"] {
        assert!(html.contains(&format!("value=\"{code}\"")), "missing {code}");
    }
    assert!(!html.contains("An error occurred"));
}

#[tokio::test]
async fn root_redirects_to_upload() {
    let media = tempfile::tempdir().unwrap();
    let server = test_server(media.path(), Arc::new(StubTranslator::default()));

    let response = server.get("/").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header(header::LOCATION), "/upload");
}

// ── Success path ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_upload_returns_translated_pdf() {
    let media = tempfile::tempdir().unwrap();
    let server = test_server(media.path(), Arc::new(StubTranslator::default()));

    let response = server
        .post("/upload")
        .multipart(upload_form("notes.txt", b"Hello world", "es"))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header(header::CONTENT_TYPE), "application/pdf");
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"notes.txt_translated.pdf\""
    );
    assert_eq!(pdf_lines(response.as_bytes()), vec!["Hola mundo"]);
}

#[tokio::test]
async fn markdown_and_csv_are_accepted() {
    let media = tempfile::tempdir().unwrap();
    let server = test_server(media.path(), Arc::new(StubTranslator::default()));

    let response = server
        .post("/upload")
        .multipart(upload_form("readme.md", b"# Title\nbody", "fr"))
        .await;
    response.assert_status_ok();
    assert_eq!(pdf_lines(response.as_bytes()), vec!["[fr] # Title", "[fr] body"]);

    let response = server
        .post("/upload")
        .multipart(upload_form("table.CSV", b"a,b\n1,2", "de"))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"table.CSV_translated.pdf\""
    );
    assert_eq!(pdf_lines(response.as_bytes()), vec!["[de] a,b", "[de] 1,2"]);
}

#[tokio::test]
async fn long_document_spans_pages() {
    let media = tempfile::tempdir().unwrap();
    let server = test_server(media.path(), Arc::new(StubTranslator::default()));

    let body: String = (1..=60).map(|i| format!("line {i}\n")).collect();
    let body: &'static [u8] = Box::leak(body.into_bytes().into_boxed_slice());
    let response = server
        .post("/upload")
        .multipart(upload_form("long.txt", body, "es"))
        .await;

    response.assert_status_ok();
    assert_eq!(page_count(response.as_bytes()), 2);
    let lines = pdf_lines(response.as_bytes());
    assert_eq!(lines[0], "[es] line 1");
    assert_eq!(lines[59], "[es] line 60");
}

#[tokio::test]
async fn same_upload_twice_gives_identical_text() {
    let media = tempfile::tempdir().unwrap();
    let server = test_server(media.path(), Arc::new(StubTranslator::default()));

    let first = server
        .post("/upload")
        .multipart(upload_form("notes.txt", b"Hello world", "es"))
        .await;
    let second = server
        .post("/upload")
        .multipart(upload_form("notes.txt", b"Hello world", "es"))
        .await;

    assert_eq!(pdf_lines(first.as_bytes()), pdf_lines(second.as_bytes()));
}

#[tokio::test]
async fn media_root_is_left_empty() {
    let media = tempfile::tempdir().unwrap();
    let server = test_server(media.path(), Arc::new(StubTranslator::default()));

    server
        .post("/upload")
        .multipart(upload_form("notes.txt", b"Hello world", "es"))
        .await
        .assert_status_ok();
    server
        .post("/upload")
        .multipart(upload_form("../../evil.xyz", b"nope", "es"))
        .await
        .assert_status_ok();

    assert_eq!(std::fs::read_dir(media.path()).unwrap().count(), 0);
}

// ── Failure path ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_format_rerenders_form() {
    let media = tempfile::tempdir().unwrap();
    let stub = Arc::new(StubTranslator::default());
    let server = test_server(media.path(), stub.clone());

    let response = server
        .post("/upload")
        .multipart(upload_form("report.xyz", b"some bytes", "fr"))
        .await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("An error occurred: Unsupported file format: .xyz"));
    assert!(html.contains("<option value=\"fr\" selected>"));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn backend_failure_rerenders_form() {
    let media = tempfile::tempdir().unwrap();
    let server = test_server(media.path(), Arc::new(FailingTranslator));

    let response = server
        .post("/upload")
        .multipart(upload_form("notes.txt", b"Hello world", "de"))
        .await;

    response.assert_status_ok();
    assert!(response
        .text()
        .contains("An error occurred: Translation error: quota exceeded"));
    assert!(response.text().contains("<option value=\"de\" selected>"));
}

#[tokio::test]
async fn invalid_language_is_rejected_before_translation() {
    let media = tempfile::tempdir().unwrap();
    let stub = Arc::new(StubTranslator::default());
    let server = test_server(media.path(), stub.clone());

    let response = server
        .post("/upload")
        .multipart(upload_form("notes.txt", b"Hello world", "it"))
        .await;

    response.assert_status_ok();
    assert!(response
        .text()
        .contains("Select a valid choice. it is not one of the available choices."));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read_dir(media.path()).map(|d| d.count()).unwrap_or(0), 0);
}

#[tokio::test]
async fn missing_fields_are_required() {
    let media = tempfile::tempdir().unwrap();
    let server = test_server(media.path(), Arc::new(StubTranslator::default()));

    let response = server
        .post("/upload")
        .multipart(MultipartForm::new().add_text("other", "x"))
        .await;

    response.assert_status_ok();
    let html = response.text();
    assert_eq!(html.matches("This field is required.").count(), 2);
}

#[tokio::test]
async fn empty_file_is_rejected() {
    let media = tempfile::tempdir().unwrap();
    let server = test_server(media.path(), Arc::new(StubTranslator::default()));

    let response = server
        .post("/upload")
        .multipart(upload_form("empty.txt", b"", "es"))
        .await;

    response.assert_status_ok();
    assert!(response.text().contains("The submitted file is empty."));
}

#[tokio::test]
async fn non_multipart_body_rerenders_form() {
    let media = tempfile::tempdir().unwrap();
    let server = test_server(media.path(), Arc::new(StubTranslator::default()));

    let response = server.post("/upload").text("file=notes.txt").await;

    response.assert_status_ok();
    assert!(response.text().contains("An error occurred: Invalid form submission"));
}

#[tokio::test]
async fn upload_limit_is_enforced_when_configured() {
    let media = tempfile::tempdir().unwrap();
    let server = test_server_with(
        PipelineConfig::builder()
            .media_root(media.path())
            .max_upload_bytes(Some(256)),
        Arc::new(StubTranslator::default()),
    );

    let big: &'static [u8] = &[b'a'; 4096];
    let response = server
        .post("/upload")
        .multipart(upload_form("big.txt", big, "es"))
        .await;

    response.assert_status_ok();
    assert!(response.text().contains("An error occurred"));
}
