//! HTTP surface: the upload form and the endpoint that turns an upload into
//! a translated PDF.
//!
//! `POST /upload` always answers `200 OK`. A successful run returns the PDF
//! as an attachment; anything else re-renders the form with field errors or
//! a single `An error occurred: ...` message, keeping the selected language.

use crate::config::{PipelineConfig, TargetLanguage};
use crate::convert::translate_upload;
use crate::error::DocTranslateError;
use crate::output::TranslatedDocument;
use crate::pipeline::translate::Translator;
use crate::upload::{FormErrors, UploadForm};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use minijinja::Environment;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{error, info, warn, Level};

const UPLOAD_TEMPLATE: &str = "upload.html";

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PipelineConfig>,
    pub translator: Arc<dyn Translator>,
    templates: Arc<Environment<'static>>,
}

impl AppState {
    pub fn new(
        config: PipelineConfig,
        translator: Arc<dyn Translator>,
    ) -> Result<Self, DocTranslateError> {
        let mut env = Environment::new();
        env.add_template(UPLOAD_TEMPLATE, include_str!("../templates/upload.html"))
            .map_err(|e| DocTranslateError::Internal(format!("Failed to add template: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            translator,
            templates: Arc::new(env),
        })
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = match state.config.max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/", get(|| async { Redirect::to("/upload") }))
        .route("/upload", get(upload_form).post(upload))
        .layer(body_limit)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// What the form template needs.
#[derive(Debug, Default, Serialize)]
struct FormContext {
    languages: Vec<LanguageOption>,
    selected: Option<String>,
    errors: FormErrors,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct LanguageOption {
    code: &'static str,
    label: &'static str,
}

impl FormContext {
    fn new(selected: Option<String>) -> Self {
        Self {
            languages: TargetLanguage::ALL
                .iter()
                .map(|l| LanguageOption {
                    code: l.code(),
                    label: l.label(),
                })
                .collect(),
            selected,
            ..Default::default()
        }
    }
}

async fn upload_form(State(state): State<AppState>) -> Response {
    render_form(&state, FormContext::new(None))
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let form = match multipart {
        Ok(multipart) => read_form(multipart).await,
        Err(rejection) => Err(DocTranslateError::InvalidForm(rejection.body_text())),
    };

    let form = match form {
        Ok(form) => form,
        Err(e) => {
            warn!("Rejected upload: {}", e);
            let mut ctx = FormContext::new(None);
            ctx.error = Some(e.user_message());
            return render_form(&state, ctx);
        }
    };

    let selected = form.target_language.clone();
    let request = match form.validate() {
        Ok(request) => request,
        Err(errors) => {
            info!("Upload form invalid: {:?}", errors);
            let mut ctx = FormContext::new(selected);
            ctx.errors = errors;
            return render_form(&state, ctx);
        }
    };

    match translate_upload(&request, &state.config, state.translator.as_ref()).await {
        Ok(document) => {
            info!(
                "Delivered {} ({} pages, {}ms)",
                document.download_name, document.stats.pages, document.stats.total_duration_ms
            );
            pdf_response(document)
        }
        Err(e) => {
            warn!("Translation of {:?} failed ({:?}): {}", request.filename, e.kind(), e);
            let mut ctx = FormContext::new(selected);
            ctx.error = Some(e.user_message());
            render_form(&state, ctx)
        }
    }
}

/// Collect the `file` and `target_language` fields; unknown fields are ignored.
async fn read_form(mut multipart: Multipart) -> Result<UploadForm, DocTranslateError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DocTranslateError::InvalidForm(format!("Failed to parse multipart data: {e}")))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                form.file_name = field.file_name().map(str::to_string);
                form.content = Some(field.bytes().await.map_err(|e| {
                    DocTranslateError::InvalidForm(format!("Failed to read file: {e}"))
                })?);
            }
            "target_language" => {
                form.target_language = Some(field.text().await.map_err(|e| {
                    DocTranslateError::InvalidForm(format!("Failed to read target_language: {e}"))
                })?);
            }
            _ => {}
        }
    }

    Ok(form)
}

fn render_form(state: &AppState, ctx: FormContext) -> Response {
    let rendered = state
        .templates
        .get_template(UPLOAD_TEMPLATE)
        .and_then(|t| t.render(&ctx));

    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Could not render template: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

fn pdf_response(document: TranslatedDocument) -> Response {
    let disposition = content_disposition(&document.download_name);
    match HeaderValue::from_str(&disposition) {
        Ok(value) => (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
                (header::CONTENT_DISPOSITION, value),
            ],
            document.pdf.bytes,
        )
            .into_response(),
        Err(e) => {
            error!("Invalid Content-Disposition {:?}: {}", disposition, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

/// `attachment; filename="..."`, plus `filename*` when the name is not ASCII.
///
/// The quoted form escapes `"` and `\`, and replaces anything outside
/// printable ASCII with `_` so the header value stays valid.
pub fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| match c {
            '"' => "\\\"".to_string(),
            '\\' => "\\\\".to_string(),
            ' '..='~' => c.to_string(),
            _ => "_".to_string(),
        })
        .collect();

    if file_name.is_ascii() && !file_name.chars().any(|c| c.is_ascii_control()) {
        format!("attachment; filename=\"{ascii}\"")
    } else {
        format!(
            "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
            urlencoding::encode(file_name)
        )
    }
}
