//! CLI binary for edgequake-doc-translate.
//!
//! `serve` runs the upload endpoint; `translate` runs the same pipeline once
//! on a local file. Both map their flags onto a `PipelineConfig`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use edgequake_doc_translate::{
    create_translator, router, translate_to_file, AppState, PipelineConfig, TargetLanguage,
    TranslatorBackend, DEFAULT_GOOGLE_ENDPOINT,
};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the upload form on http://127.0.0.1:8000/upload
  doc-translate serve

  # Serve on all interfaces with uploads capped at 20 MB
  doc-translate serve --bind 0.0.0.0:8000 --max-upload-bytes 20000000

  # Translate one file into Spanish
  doc-translate translate notes.txt --to es

  # Translate a PDF into German with an LLM and print stats as JSON
  doc-translate translate report.pdf --to de --backend llm --model gpt-4.1-mini --json

BACKENDS:
  google   Public Google Translate endpoint. No key required. (default)
  llm      Any edgequake-llm provider (openai, anthropic, gemini, ollama, ...)

ENVIRONMENT VARIABLES:
  MEDIA_ROOT              Directory for per-request upload scratch space
  PDFIUM_LIB_PATH         Directory containing libpdfium (needed for .pdf input)
  OPENAI_API_KEY          OpenAI API key (llm backend)
  ANTHROPIC_API_KEY       Anthropic API key (llm backend)
  EDGEQUAKE_LLM_PROVIDER  Override provider (llm backend)
  EDGEQUAKE_MODEL         Override model ID (llm backend)
  RUST_LOG                Overrides -v / -q log filtering
"#;

/// Translate uploaded documents and return them as PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "doc-translate",
    version,
    about = "Translate .txt/.md/.csv/.pdf documents into Spanish, French or German PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOC_TRANSLATE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOC_TRANSLATE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP upload endpoint.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "DOC_TRANSLATE_BIND", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
    },

    /// Translate one local file to a PDF.
    Translate {
        /// Input document (.txt, .md, .csv or .pdf).
        input: PathBuf,

        /// Target language code: es, fr or de.
        #[arg(long, short = 't')]
        to: TargetLanguage,

        /// Output PDF path. Defaults to `<input>_translated.pdf` next to the input.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print pipeline stats as JSON on stdout.
        #[arg(long)]
        json: bool,
    },
}

/// Flags shared by both subcommands.
#[derive(Args, Debug)]
struct PipelineArgs {
    /// Directory for upload scratch space.
    #[arg(long, global = true, env = "MEDIA_ROOT", default_value = "media")]
    media_root: PathBuf,

    /// Translation backend.
    #[arg(long, global = true, env = "DOC_TRANSLATE_BACKEND", value_enum, default_value = "google")]
    backend: BackendArg,

    /// LLM provider (llm backend): openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (llm backend).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Google Translate endpoint (google backend).
    #[arg(long, global = true, env = "DOC_TRANSLATE_GOOGLE_ENDPOINT", default_value = DEFAULT_GOOGLE_ENDPOINT)]
    google_endpoint: String,

    /// Directory containing libpdfium; system library when unset.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Largest chunk sent to the backend in one call, in characters.
    #[arg(long, global = true, env = "DOC_TRANSLATE_MAX_CHUNK_CHARS", default_value_t = 4500)]
    max_chunk_chars: usize,

    /// Refuse documents whose extracted text is longer than this.
    #[arg(long, global = true, env = "DOC_TRANSLATE_MAX_INPUT_CHARS", default_value_t = 200_000)]
    max_input_chars: usize,

    /// Per-call translation timeout in seconds.
    #[arg(long, global = true, env = "DOC_TRANSLATE_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Retries per chunk on backend failure.
    #[arg(long, global = true, env = "DOC_TRANSLATE_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Reject upload bodies larger than this many bytes (unlimited when unset).
    #[arg(long, global = true, env = "DOC_TRANSLATE_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,
}

#[derive(ValueEnum, Clone, Debug)]
enum BackendArg {
    Google,
    Llm,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli.pipeline)?;
    tracing::debug!("{:?}", config);
    let translator = create_translator(&config)
        .await
        .context("Failed to set up translation backend")?;

    match cli.command {
        Command::Serve { bind } => {
            let state = AppState::new(config, translator).context("Failed to build app state")?;
            let app = router(state);

            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .with_context(|| format!("Failed to bind {bind}"))?;
            tracing::info!("Listening on http://{}/upload", bind);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Server error")?;
        }
        Command::Translate {
            input,
            to,
            output,
            json,
        } => {
            let output_path = output.unwrap_or_else(|| default_output_path(&input));
            let stats = translate_to_file(&input, &output_path, to, &config, translator.as_ref())
                .await
                .context("Translation failed")?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
                );
            } else if !cli.quiet {
                eprintln!(
                    "{}  {} chars → {} page(s)  {}ms  →  {}",
                    green("✔"),
                    stats.extracted_chars,
                    stats.pages,
                    stats.total_duration_ms,
                    bold(&output_path.display().to_string()),
                );
                eprintln!(
                    "   {} chunk(s)  {}",
                    dim(&stats.chunks.to_string()),
                    dim(&format!(
                        "extract {}ms / translate {}ms / render {}ms",
                        stats.extract_duration_ms,
                        stats.translate_duration_ms,
                        stats.render_duration_ms
                    )),
                );
            }
        }
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(args: &PipelineArgs) -> Result<PipelineConfig> {
    let backend = match args.backend {
        BackendArg::Google => TranslatorBackend::Google {
            endpoint: args.google_endpoint.clone(),
        },
        BackendArg::Llm => TranslatorBackend::Llm {
            provider: args.provider.clone(),
            model: args.model.clone(),
        },
    };

    let mut builder = PipelineConfig::builder()
        .media_root(&args.media_root)
        .backend(backend)
        .max_chunk_chars(args.max_chunk_chars)
        .max_input_chars(args.max_input_chars)
        .translate_timeout_secs(args.timeout)
        .max_retries(args.max_retries)
        .max_upload_bytes(args.max_upload_bytes);

    if let Some(ref dir) = args.pdfium_lib_path {
        builder = builder.pdfium_lib_path(dir);
    }

    builder.build().context("Invalid configuration")
}

/// `notes.txt` → `notes.txt_translated.pdf` in the same directory.
fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(edgequake_doc_translate::download_name(&name))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
