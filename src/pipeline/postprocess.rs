//! Post-processing: deterministic cleanup of LLM translation output.
//!
//! Even well-prompted models occasionally wrap their answer in a code fence
//! or emit Windows line endings and zero-width characters. The renderer
//! draws one PDF line per `\n` and can only encode WinAnsi glyphs, so these
//! artefacts show up as stray lines or `?` marks. The Google backend returns
//! plain text and does not go through here.
//!
//! ## Rule Order
//!
//! Fences are stripped first (the regex expects LF after the opening fence
//! once the input is trimmed), then line endings normalised, then invisible
//! characters removed, then trailing newlines dropped.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to one translated chunk.
pub fn clean_translation(input: &str) -> String {
    let s = strip_outer_fences(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    s.trim_end_matches('\n').to_string()
}

// ── Rule 1: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\r?\n(.*?)\r?\n```\s*$").expect("static regex")
});

fn strip_outer_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode ─────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        assert_eq!(clean_translation("```\nHola mundo\n```"), "Hola mundo");
        assert_eq!(clean_translation("```text\nHola\nmundo\n```\n"), "Hola\nmundo");
    }

    #[test]
    fn test_inner_fences_kept() {
        let input = "Antes\n```\ncode\n```\nDespués";
        assert_eq!(clean_translation(input), input);
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(clean_translation("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible() {
        assert_eq!(clean_translation("\u{FEFF}Hola\u{200B} mundo"), "Hola mundo");
    }

    #[test]
    fn test_trailing_newlines_dropped_but_blank_lines_kept() {
        assert_eq!(clean_translation("uno\n\ndos\n\n"), "uno\n\ndos");
    }
}
