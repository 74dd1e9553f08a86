//! Разбор сценария на сегменты
//!
//! Строки с меткой `Говорящий: текст` дают реплику, строка без метки
//! продолжает последнего говорящего отдельным сегментом (сегменты не
//! склеиваются). Метки сохраняются в точности как написаны: подбор
//! голоса опирается на них без какой-либо нормализации.

use serde::{Deserialize, Serialize};

use crate::script::classify::{classify_line, LineKind};

/// Сегмент сценария
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// Реплика участника
    Speech { speaker: String, text: String },
    /// Музыкальная вставка
    Music,
}

impl Segment {
    pub fn speech(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Segment::Speech {
            speaker: speaker.into(),
            text: text.into(),
        }
    }

    pub fn is_music(&self) -> bool {
        matches!(self, Segment::Music)
    }
}

/// Разобрать нормализованный сценарий на упорядоченные сегменты
pub fn parse_segments(script: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last_speaker: Option<&str> = None;

    for line in script.lines() {
        match classify_line(line) {
            LineKind::MusicMarker => segments.push(Segment::Music),
            LineKind::LabeledSpeech { label, text } => {
                // Строка "Mike:" без текста только задаёт текущего говорящего
                last_speaker = Some(label);
                if !text.is_empty() {
                    segments.push(Segment::speech(label, text));
                }
            }
            LineKind::Continuation(text) => match last_speaker {
                Some(speaker) => segments.push(Segment::speech(speaker, text)),
                None => log::debug!("Dropping unattributed line: {}", text),
            },
            LineKind::Blank
            | LineKind::Heading
            | LineKind::SectionHeader
            | LineKind::Separator
            | LineKind::SoundCue => {}
        }
    }

    segments
}
