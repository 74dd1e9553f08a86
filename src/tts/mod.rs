//! Модуль для работы с TTS
//!
//! Синтезатор речи является внешним сервисом. Конвейер работает с ним
//! через трейт [`Synthesizer`], который поддерживает две формы вызова:
//! поток байтов без меток времени и ответ с посимвольными метками.

pub mod adapter;
pub mod alignment;
pub mod cache;
pub mod elevenlabs;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::{PodcastError, Result};

pub use adapter::{SpeechSynthesisAdapter, SynthesizedSpeech};
pub use alignment::{words_from_alignment, LocalWord};
pub use cache::SegmentCache;
pub use elevenlabs::ElevenLabsSynthesizer;

/// Поток аудиоданных от синтезатора
pub type AudioChunkStream = BoxStream<'static, Result<Bytes>>;

/// Посимвольные метки времени, выровненные по отправленному тексту
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CharacterAlignment {
    pub characters: Vec<String>,
    pub character_start_times_seconds: Vec<f64>,
    pub character_end_times_seconds: Vec<f64>,
}

/// Ответ синтезатора в режиме с метками времени
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampedAudio {
    pub audio_base64: String,
    #[serde(default)]
    pub alignment: Option<CharacterAlignment>,
}

/// Внешний синтезатор речи
///
/// Реализация может поддерживать только одну из форм вызова; для второй
/// достаточно оставить реализацию по умолчанию, которая возвращает
/// [`PodcastError::Unsupported`].
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Синтез речи потоком байтов
    async fn stream(&self, voice_id: &str, model_id: &str, text: &str) -> Result<AudioChunkStream> {
        let _ = (voice_id, model_id, text);
        Err(PodcastError::Unsupported("streaming".to_string()))
    }

    /// Синтез речи с посимвольными метками времени
    async fn with_timestamps(
        &self,
        voice_id: &str,
        model_id: &str,
        text: &str,
    ) -> Result<TimestampedAudio> {
        let _ = (voice_id, model_id, text);
        Err(PodcastError::Unsupported("timestamped".to_string()))
    }
}
