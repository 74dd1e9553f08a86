//! Классификатор строк сценария
//!
//! Единственное место, где строка сценария относится к одному из видов.
//! Нормализатор, перераспределитель, парсер и очистка для синтеза
//! принимают решения только по результату [`classify_line`].

use lazy_static::lazy_static;
use regex::Regex;

/// Зарезервированная метка музыкальной вставки
pub const MUSIC_MARKER: &str = "[music]";

lazy_static! {
    static ref SECTION_RE: Regex = Regex::new(r"(?i)^(?:intro|body|outro)[:：]?\s*$").unwrap();
    static ref LABELED_SECTION_RE: Regex =
        Regex::new(r"(?i)^[^:：]+[:：]\s*(?:intro|body|outro)\s*$").unwrap();
    static ref SOUND_CUE_RE: Regex = Regex::new(r"^\[[^\]]+\]$").unwrap();
    static ref SEPARATOR_RE: Regex = Regex::new(r"^[-_=*~•·]+$").unwrap();
    static ref LABELED_RE: Regex = Regex::new(r"^([^:：]+)[:：]\s*(.*)$").unwrap();
}

/// Вид строки сценария
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Пустая строка
    Blank,
    /// Любая строка, начинающаяся с `#` (`# Intro`, `#BODY`)
    Heading,
    /// Заголовок раздела INTRO/BODY/OUTRO, возможно с меткой (`Mike: INTRO`)
    SectionHeader,
    /// Разделитель (`-----`)
    Separator,
    /// Музыкальная вставка
    MusicMarker,
    /// Строка, целиком состоящая из ремарки в скобках (`[applause]`)
    SoundCue,
    /// Реплика с меткой говорящего; метка и текст без пробелов по краям
    LabeledSpeech { label: &'a str, text: &'a str },
    /// Строка без метки; текст без пробелов по краям
    Continuation(&'a str),
}

impl LineKind<'_> {
    /// Строка несёт произносимый текст (с меткой или без)
    pub fn is_dialogue(&self) -> bool {
        matches!(self, LineKind::LabeledSpeech { .. } | LineKind::Continuation(_))
    }
}

/// Проверка, что строка в точности является музыкальной меткой
pub fn is_music_marker(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(MUSIC_MARKER)
}

/// Определить вид строки
pub fn classify_line(line: &str) -> LineKind<'_> {
    let stripped = line.trim();

    if stripped.is_empty() {
        return LineKind::Blank;
    }
    if is_music_marker(stripped) {
        return LineKind::MusicMarker;
    }
    if stripped.starts_with('#') {
        return LineKind::Heading;
    }
    if SECTION_RE.is_match(stripped) || LABELED_SECTION_RE.is_match(stripped) {
        return LineKind::SectionHeader;
    }
    if SOUND_CUE_RE.is_match(stripped) {
        return LineKind::SoundCue;
    }
    if SEPARATOR_RE.is_match(stripped) {
        return LineKind::Separator;
    }

    if let Some(caps) = LABELED_RE.captures(stripped) {
        if let (Some(label), Some(text)) = (caps.get(1), caps.get(2)) {
            return LineKind::LabeledSpeech {
                label: label.as_str().trim(),
                text: text.as_str().trim(),
            };
        }
    }

    LineKind::Continuation(stripped)
}
