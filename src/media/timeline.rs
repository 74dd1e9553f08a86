//! Сборка итоговой дорожки и глобальной шкалы слов
//!
//! Фрагменты добавляются строго в порядке сценария. Смещение каждого
//! фрагмента считается по числу уже записанных сэмплов, поэтому метки
//! слов совпадают с реальной позицией в итоговом аудио.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{PodcastError, Result};
use crate::media::audio::{duration_in_seconds, PcmAudio};
use crate::media::music::MusicSlot;
use crate::tts::LocalWord;

/// Слово на глобальной шкале времени
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordTiming {
    pub word: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub speaker: String,
}

/// Диапазон символов синтезированного текста, принадлежащий говорящему
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerSpan {
    pub speaker: String,
    pub char_start: usize,
    pub char_end: usize,
}

impl SpeakerSpan {
    pub fn new(speaker: impl Into<String>, char_start: usize, char_end: usize) -> Self {
        Self {
            speaker: speaker.into(),
            char_start,
            char_end,
        }
    }

    /// Весь текст фрагмента принадлежит одному говорящему
    pub fn whole(speaker: impl Into<String>, text: &str) -> Self {
        Self::new(speaker, 0, text.chars().count())
    }
}

/// Тип фрагмента дорожки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PieceKind {
    Speech { speakers: Vec<String> },
    Music { slot: MusicSlot },
}

/// Фрагмент на итоговой дорожке
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePiece {
    #[serde(flatten)]
    pub kind: PieceKind,
    pub offset_seconds: f64,
    pub duration_seconds: f64,
}

/// Собранная дорожка: аудио, слова и фрагменты
#[derive(Debug, Clone)]
pub struct AudioTimeline {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub words: Vec<WordTiming>,
    pub pieces: Vec<TimelinePiece>,
    pub duration_seconds: f64,
}

/// Последовательная склейка фрагментов
pub struct TimelineAssembler {
    sample_rate: u32,
    samples: Vec<f32>,
    words: Vec<WordTiming>,
    pieces: Vec<TimelinePiece>,
}

impl TimelineAssembler {
    /// Начинает дорожку с тишины заданной длительности
    pub fn new(sample_rate: u32, leading_silence_ms: u32) -> Self {
        let silence = PcmAudio::silence(leading_silence_ms, sample_rate);
        Self {
            sample_rate,
            samples: silence.samples,
            words: Vec::new(),
            pieces: Vec::new(),
        }
    }

    /// Текущее смещение (конец уже записанного аудио), секунды
    pub fn offset_seconds(&self) -> f64 {
        duration_in_seconds(self.samples.len(), self.sample_rate)
    }

    /// Количество добавленных фрагментов (без начальной тишины)
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    fn check_rate(&self, audio: &PcmAudio) -> Result<()> {
        if audio.sample_rate != self.sample_rate {
            return Err(PodcastError::AudioProcessing(format!(
                "Sample rate mismatch: piece has {} Hz, timeline has {} Hz",
                audio.sample_rate, self.sample_rate
            )));
        }
        Ok(())
    }

    /// Добавить речь; `words` содержат метки относительно начала фрагмента.
    ///
    /// Говорящий слова определяется по диапазону символов в `spans`.
    /// Фрагмент нулевой длины пропускается.
    pub fn append_speech(
        &mut self,
        audio: &PcmAudio,
        spans: &[SpeakerSpan],
        words: Option<&[LocalWord]>,
    ) -> Result<()> {
        self.check_rate(audio)?;
        if audio.is_empty() {
            debug!("Skipping empty speech piece");
            return Ok(());
        }

        let offset = self.offset_seconds();
        let duration = audio.duration_seconds();

        if let Some(words) = words {
            let mut floor = self.words.last().map_or(offset, |w| w.start_seconds.max(offset));
            for word in words {
                let start = word.start_seconds.clamp(0.0, duration);
                let end = word.end_seconds.clamp(start, duration);

                let start_seconds = (offset + start).max(floor);
                let end_seconds = (offset + end).max(start_seconds);
                floor = start_seconds;

                self.words.push(WordTiming {
                    word: word.word.clone(),
                    start_seconds,
                    end_seconds,
                    speaker: speaker_at(spans, word.char_start).to_string(),
                });
            }
        }

        let mut speakers: Vec<String> = Vec::new();
        for span in spans {
            if !speakers.contains(&span.speaker) {
                speakers.push(span.speaker.clone());
            }
        }

        self.samples.extend_from_slice(&audio.samples);
        self.pieces.push(TimelinePiece {
            kind: PieceKind::Speech { speakers },
            offset_seconds: offset,
            duration_seconds: duration,
        });
        debug!("Appended speech at {:.3}s ({:.3}s)", offset, duration);
        Ok(())
    }

    /// Добавить музыкальный фрагмент
    pub fn append_music(&mut self, audio: &PcmAudio, slot: MusicSlot) -> Result<()> {
        self.check_rate(audio)?;
        if audio.is_empty() {
            debug!("Skipping empty {} music", slot.as_str());
            return Ok(());
        }

        let offset = self.offset_seconds();
        self.samples.extend_from_slice(&audio.samples);
        self.pieces.push(TimelinePiece {
            kind: PieceKind::Music { slot },
            offset_seconds: offset,
            duration_seconds: audio.duration_seconds(),
        });
        debug!("Appended {} music at {:.3}s", slot.as_str(), offset);
        Ok(())
    }

    /// Завершить сборку
    pub fn finish(self) -> Result<AudioTimeline> {
        if self.pieces.is_empty() {
            return Err(PodcastError::NothingToSynthesize);
        }

        let duration_seconds = duration_in_seconds(self.samples.len(), self.sample_rate);
        info!(
            "Assembled {} pieces, {} words, {:.2}s total",
            self.pieces.len(),
            self.words.len(),
            duration_seconds
        );
        Ok(AudioTimeline {
            samples: self.samples,
            sample_rate: self.sample_rate,
            words: self.words,
            pieces: self.pieces,
            duration_seconds,
        })
    }
}

/// Говорящий, которому принадлежит символ с данным индексом
fn speaker_at(spans: &[SpeakerSpan], char_index: usize) -> &str {
    spans
        .iter()
        .find(|span| char_index >= span.char_start && char_index < span.char_end)
        .or_else(|| spans.iter().rev().find(|span| span.char_start <= char_index))
        .or_else(|| spans.first())
        .map_or("", |span| span.speaker.as_str())
}
