//! System prompts for the LLM translation backend.
//!
//! Kept apart from the backend code so prompt wording can change without
//! touching chunking, retry or error handling, and so tests can inspect the
//! exact text sent to the model.

use crate::config::TargetLanguage;

/// System prompt for translating one chunk of a document.
pub const TRANSLATION_SYSTEM_PROMPT: &str = r#"You are a professional document translator.

Follow these rules precisely:

1. Translate the user's text into the requested target language.
2. Preserve every line break exactly: the output must have the same number
   of lines as the input, in the same order. Blank lines stay blank.
3. Keep numbers, URLs, e-mail addresses, code and CSV delimiters unchanged.
4. If a line is already in the target language, copy it as-is.
5. Output ONLY the translated text.
   - Do NOT wrap it in code fences
   - Do NOT add notes, explanations or a preamble"#;

/// Build the user message for one chunk.
pub fn translation_request(text: &str, target: TargetLanguage) -> String {
    format!(
        "Target language: {} ({})\n\n{}",
        target.label(),
        target.code(),
        text
    )
}
