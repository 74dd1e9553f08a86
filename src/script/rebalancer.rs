//! Перераспределение реплик между участниками
//!
//! Генератор сценария иногда отдаёт почти все реплики одному участнику.
//! Перераспределитель назначает каждой строке с репликой следующего по
//! кругу участника. Индекс очереди сквозной для всего сценария.
//!
//! При [`SpeakerPolicy::PreserveLabels`] текст не изменяется: метки,
//! заданные вызывающей стороной, должны доходить до подбора голоса
//! байт в байт.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::SpeakerPolicy;
use crate::script::classify::{classify_line, LineKind};
use crate::speaker::Speaker;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"\w").unwrap();
}

/// Применить политику меток к нормализованному сценарию
pub fn apply_speaker_policy(script: &str, speakers: &[Speaker], policy: SpeakerPolicy) -> String {
    match policy {
        SpeakerPolicy::Rebalance => rebalance_speakers(script, speakers),
        SpeakerPolicy::PreserveLabels => script.to_string(),
    }
}

/// Имена для очереди: имя участника, иначе его роль
fn rotation_names(speakers: &[Speaker]) -> Vec<String> {
    speakers
        .iter()
        .map(|speaker| {
            let name = speaker.trimmed_name();
            if name.is_empty() {
                speaker.role.as_str().to_string()
            } else {
                name.to_string()
            }
        })
        .collect()
}

/// Перераспределить метки говорящих по кругу
pub fn rebalance_speakers(script: &str, speakers: &[Speaker]) -> String {
    let names = rotation_names(speakers);
    if script.is_empty() || names.is_empty() {
        return script.to_string();
    }

    let mut idx = 0usize;

    script
        .lines()
        .map(|line| {
            let text = match classify_line(line) {
                LineKind::LabeledSpeech { text, .. } if !text.is_empty() => text,
                LineKind::Continuation(text) if WORD_RE.is_match(text) => text,
                _ => return line.to_string(),
            };
            let speaker = &names[idx % names.len()];
            idx += 1;
            let leading_ws = &line[..line.len() - line.trim_start().len()];
            format!("{}{}: {}", leading_ws, speaker, text)
        })
        .collect::<Vec<String>>()
        .join("\n")
}
