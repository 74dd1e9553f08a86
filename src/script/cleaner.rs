//! Подготовка текста реплики к синтезу речи
//!
//! Для арабского текста агрессивная очистка отключена: она съедает
//! огласовки и структуру фразы, поэтому текст только обрезается по краям.

use lazy_static::lazy_static;
use regex::Regex;

use crate::script::classify::{classify_line, LineKind};

lazy_static! {
    static ref INLINE_TAG_RE: Regex = Regex::new(r"\[[^\]]*\]").unwrap();
    static ref INLINE_PAREN_RE: Regex = Regex::new(r"\([^)]*\)").unwrap();
    static ref FORMAT_CHAR_RE: Regex = Regex::new(r"\p{Cf}").unwrap();
    static ref SEPARATOR_RUN_RE: Regex = Regex::new(r"[-_=*~•·]{3,}").unwrap();
    static ref LABEL_PREFIX_RE: Regex = Regex::new(r"^[\p{L}\p{N}_]{1,16}\s*[:：]\s*").unwrap();
    static ref SPACES_RE: Regex = Regex::new(r"\s{2,}").unwrap();
}

/// Есть ли в тексте символы арабского письма
pub fn contains_arabic(text: &str) -> bool {
    text.chars()
        .any(|c| ('\u{0600}'..='\u{06FF}').contains(&c) || ('\u{0750}'..='\u{08FF}').contains(&c))
}

/// Выбрать способ очистки в зависимости от письменности
pub fn prepare_speech_text(text: &str) -> String {
    if contains_arabic(text) {
        text.trim().to_string()
    } else {
        clean_for_speech(text)
    }
}

/// Агрессивная очистка: остаётся только произносимый текст
pub fn clean_for_speech(text: &str) -> String {
    let mut cleaned_lines = Vec::new();

    for raw in text.lines() {
        match classify_line(raw) {
            LineKind::Blank
            | LineKind::Heading
            | LineKind::SectionHeader
            | LineKind::Separator
            | LineKind::MusicMarker
            | LineKind::SoundCue => continue,
            LineKind::LabeledSpeech { .. } | LineKind::Continuation(_) => {}
        }

        let line = INLINE_TAG_RE.replace_all(raw.trim(), "");
        let line = INLINE_PAREN_RE.replace_all(&line, "");
        let line = FORMAT_CHAR_RE.replace_all(&line, "");
        let line = SEPARATOR_RUN_RE.replace_all(&line, " ");
        let line = LABEL_PREFIX_RE.replace(line.trim(), "");
        let line = SPACES_RE.replace_all(&line, " ");
        let line = line.trim();

        if !line.is_empty() {
            cleaned_lines.push(line.to_string());
        }
    }

    cleaned_lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_arabic() {
        assert!(contains_arabic("مرحبا بكم"));
        assert!(contains_arabic("Hello مرحبا"));
        assert!(!contains_arabic("Hello there"));
    }

    #[test]
    fn test_strips_inline_tags_and_label() {
        assert_eq!(clean_for_speech("Mike: Hello [laughs] world"), "Hello world");
        assert_eq!(clean_for_speech("ga: short code label"), "short code label");
    }

    #[test]
    fn test_strips_stage_directions() {
        assert_eq!(prepare_speech_text("Well (laughs) that is true"), "Well that is true");
        assert_eq!(clean_for_speech("Mike: (sighs) Okay (pause) fine"), "Okay fine");
        assert_eq!(prepare_speech_text("(laughs)"), "");
    }

    #[test]
    fn test_strips_format_characters_and_separators() {
        assert_eq!(clean_for_speech("Zero\u{200B}width and ----- dash"), "Zerowidth and dash");
        assert_eq!(clean_for_speech("\u{FEFF}Start"), "Start");
    }

    #[test]
    fn test_removes_structural_lines() {
        let text = "# Title\nINTRO\nMike: BODY\n[music]\n[pause]\n=====\nActual words";
        assert_eq!(clean_for_speech(text), "Actual words");
    }

    #[test]
    fn test_only_tags_becomes_empty() {
        assert_eq!(clean_for_speech("[laughs] [sighs]"), "");
        assert_eq!(prepare_speech_text("   "), "");
    }

    #[test]
    fn test_arabic_kept_as_is() {
        let text = "  مَرْحَبًا [ضحك] بكم  ";
        assert_eq!(prepare_speech_text(text), "مَرْحَبًا [ضحك] بكم");
    }
}
