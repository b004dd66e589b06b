//! Pipeline stages for document translation.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and swapped (e.g. another translation backend) without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! store ──▶ extract ──▶ translate ──▶ render
//! (media)   (text/pdf)  (backend)     (lopdf)
//! ```
//!
//! 1. [`store`]     persist the upload in a per-request scratch directory
//! 2. [`extract`]   read text files as UTF-8 or PDFs page by page via pdfium;
//!    PDF work runs in `spawn_blocking` because pdfium is not async-safe
//! 3. [`translate`] chunk the text and drive the backend with timeout and
//!    retry; the only stage with network I/O
//! 4. [`render`]    lay the translation out line by line into a new PDF
//!
//! [`postprocess`] holds the cleanup rules applied to LLM replies.

pub mod extract;
pub mod postprocess;
pub mod render;
pub mod store;
pub mod translate;
