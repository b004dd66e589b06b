//! Intake: turn a raw form submission into a validated [`UploadRequest`].
//!
//! The HTTP layer only collects fields; every rule about what counts as a
//! valid submission lives here so it can be tested without a server. A
//! rejected form never reaches storage.

use crate::config::TargetLanguage;
use crate::error::DocTranslateError;
use bytes::Bytes;
use serde::Serialize;

/// A validated upload, ready for the pipeline.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Filename as supplied by the client (sanitised later, at storage time).
    pub filename: String,
    pub content: Bytes,
    pub target_language: TargetLanguage,
}

/// Raw form fields as they arrived, before validation.
#[derive(Debug, Default, Clone)]
pub struct UploadForm {
    pub file_name: Option<String>,
    pub content: Option<Bytes>,
    pub target_language: Option<String>,
}

/// Per-field validation messages, rendered next to each form input.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    pub file: Option<String>,
    pub target_language: Option<String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.file.is_none() && self.target_language.is_none()
    }
}

impl From<FormErrors> for DocTranslateError {
    fn from(errors: FormErrors) -> Self {
        let parts: Vec<String> = [
            errors.file.map(|m| format!("file: {m}")),
            errors.target_language.map(|m| format!("target_language: {m}")),
        ]
        .into_iter()
        .flatten()
        .collect();
        DocTranslateError::InvalidForm(parts.join("; "))
    }
}

const REQUIRED: &str = "This field is required.";
const EMPTY_FILE: &str = "The submitted file is empty.";

impl UploadForm {
    /// Validate every field, collecting all problems rather than stopping at the first.
    pub fn validate(self) -> Result<UploadRequest, FormErrors> {
        let mut errors = FormErrors::default();

        let file = match (self.file_name, self.content) {
            (Some(name), Some(content)) if !name.is_empty() => {
                if content.is_empty() {
                    errors.file = Some(EMPTY_FILE.to_string());
                    None
                } else {
                    Some((name, content))
                }
            }
            _ => {
                errors.file = Some(REQUIRED.to_string());
                None
            }
        };

        let target_language = match self.target_language.as_deref().map(str::trim) {
            None | Some("") => {
                errors.target_language = Some(REQUIRED.to_string());
                None
            }
            Some(code) => match code.parse::<TargetLanguage>() {
                Ok(lang) => Some(lang),
                Err(DocTranslateError::InvalidForm(msg)) => {
                    errors.target_language = Some(msg);
                    None
                }
                Err(other) => {
                    errors.target_language = Some(other.to_string());
                    None
                }
            },
        };

        match (file, target_language) {
            (Some((filename, content)), Some(target_language)) if errors.is_empty() => {
                Ok(UploadRequest {
                    filename,
                    content,
                    target_language,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: Option<&str>, content: Option<&'static [u8]>, lang: Option<&str>) -> UploadForm {
        UploadForm {
            file_name: name.map(str::to_string),
            content: content.map(Bytes::from_static),
            target_language: lang.map(str::to_string),
        }
    }

    #[test]
    fn valid_submission_for_every_language() {
        for code in ["es", "fr", "de"] {
            let req = form(Some("notes.txt"), Some(b"Hello world"), Some(code))
                .validate()
                .unwrap();
            assert_eq!(req.filename, "notes.txt");
            assert_eq!(req.target_language.code(), code);
            assert_eq!(&req.content[..], b"Hello world");
        }
    }

    #[test]
    fn missing_file_is_required() {
        let errors = form(None, None, Some("es")).validate().unwrap_err();
        assert_eq!(errors.file.as_deref(), Some(REQUIRED));
        assert!(errors.target_language.is_none());
    }

    #[test]
    fn file_without_name_is_missing() {
        let errors = form(Some(""), Some(b"data"), Some("es")).validate().unwrap_err();
        assert_eq!(errors.file.as_deref(), Some(REQUIRED));
    }

    #[test]
    fn empty_file_rejected() {
        let errors = form(Some("a.txt"), Some(b""), Some("fr")).validate().unwrap_err();
        assert_eq!(errors.file.as_deref(), Some(EMPTY_FILE));
    }

    #[test]
    fn unknown_language_rejected() {
        let errors = form(Some("a.txt"), Some(b"x"), Some("it")).validate().unwrap_err();
        assert_eq!(
            errors.target_language.as_deref(),
            Some("Select a valid choice. it is not one of the available choices.")
        );
    }

    #[test]
    fn all_problems_collected() {
        let errors = form(None, None, None).validate().unwrap_err();
        assert!(errors.file.is_some());
        assert!(errors.target_language.is_some());

        let err: DocTranslateError = errors.into();
        let msg = err.to_string();
        assert!(msg.contains("file: This field is required."), "{msg}");
        assert!(msg.contains("target_language: This field is required."), "{msg}");
    }
}
