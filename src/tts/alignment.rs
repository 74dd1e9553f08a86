//! Пословные метки времени из посимвольных

use serde::{Deserialize, Serialize};

use crate::tts::CharacterAlignment;

/// Слово с метками времени относительно начала своего сегмента
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalWord {
    pub word: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    /// Индекс первого символа слова в отправленном тексте
    pub char_start: usize,
}

/// Сгруппировать подряд идущие непробельные символы в слова.
///
/// Начало слова берётся у первого символа, конец у последнего. Если
/// массивы разной длины, лишние элементы игнорируются.
pub fn words_from_alignment(alignment: &CharacterAlignment) -> Vec<LocalWord> {
    let count = alignment
        .characters
        .len()
        .min(alignment.character_start_times_seconds.len())
        .min(alignment.character_end_times_seconds.len());

    let mut words = Vec::new();
    let mut current: Option<LocalWord> = None;

    for i in 0..count {
        let character = &alignment.characters[i];
        let start = alignment.character_start_times_seconds[i].max(0.0);
        let end = alignment.character_end_times_seconds[i].max(start);

        if character.trim().is_empty() {
            if let Some(word) = current.take() {
                words.push(word);
            }
            continue;
        }

        match current.as_mut() {
            Some(word) => {
                word.word.push_str(character);
                word.end_seconds = end.max(word.start_seconds);
            }
            None => {
                current = Some(LocalWord {
                    word: character.clone(),
                    start_seconds: start,
                    end_seconds: end,
                    char_start: i,
                });
            }
        }
    }

    if let Some(word) = current {
        words.push(word);
    }

    words
}
