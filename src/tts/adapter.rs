//! Адаптер синтеза речи
//!
//! Готовит текст реплики, вызывает синтезатор в выбранном режиме и
//! возвращает аудио сегмента вместе с пословными метками, если они есть.
//! Повторных попыток нет: любая ошибка синтезатора проваливает запрос.

use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use futures::StreamExt;
use log::{debug, info, warn};

use crate::config::SynthesisMode;
use crate::error::{PodcastError, Result};
use crate::script::cleaner::prepare_speech_text;
use crate::tts::alignment::{words_from_alignment, LocalWord};
use crate::tts::cache::SegmentCache;
use crate::tts::Synthesizer;

/// Результат синтеза одного сегмента
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedSpeech {
    /// Закодированное аудио (как вернул синтезатор)
    pub audio: Vec<u8>,
    /// Слова с метками относительно начала сегмента; `None`, если время неизвестно
    pub words: Option<Vec<LocalWord>>,
}

/// Адаптер над внешним синтезатором
pub struct SpeechSynthesisAdapter {
    synthesizer: Arc<dyn Synthesizer>,
    model_id: String,
    mode: SynthesisMode,
    cache: Option<SegmentCache>,
}

impl SpeechSynthesisAdapter {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, model_id: impl Into<String>, mode: SynthesisMode) -> Self {
        Self {
            synthesizer,
            model_id: model_id.into(),
            mode,
            cache: None,
        }
    }

    /// Подключить кэш сегментов
    pub fn with_cache(mut self, cache: SegmentCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn mode(&self) -> SynthesisMode {
        self.mode
    }

    /// Очистить текст и синтезировать его
    pub async fn synthesize(&self, text: &str, voice_id: &str) -> Result<SynthesizedSpeech> {
        let prepared = prepare_speech_text(text);
        if prepared.is_empty() {
            return Err(PodcastError::EmptyText);
        }
        self.synthesize_prepared(&prepared, voice_id).await
    }

    /// Синтезировать уже подготовленный текст
    pub async fn synthesize_prepared(&self, text: &str, voice_id: &str) -> Result<SynthesizedSpeech> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(voice_id, &self.model_id, self.mode, text) {
                return Ok(cached);
            }
        }

        let speech = match self.mode {
            SynthesisMode::Timestamped => match self.synthesize_timestamped(text, voice_id).await {
                Err(PodcastError::Unsupported(shape)) => {
                    warn!("Synthesizer does not support {} mode, falling back to streaming", shape);
                    self.synthesize_streaming(text, voice_id).await?
                }
                other => other?,
            },
            SynthesisMode::Streaming => match self.synthesize_streaming(text, voice_id).await {
                Err(PodcastError::Unsupported(shape)) => {
                    warn!("Synthesizer does not support {} mode, falling back to timestamps", shape);
                    self.synthesize_timestamped(text, voice_id).await?
                }
                other => other?,
            },
        };

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(voice_id, &self.model_id, self.mode, text, &speech) {
                warn!("Failed to store segment in cache: {}", e);
            }
        }

        Ok(speech)
    }

    async fn synthesize_streaming(&self, text: &str, voice_id: &str) -> Result<SynthesizedSpeech> {
        debug!("Streaming synthesis with voice {} ({} chars)", voice_id, text.chars().count());
        let mut stream = self
            .synthesizer
            .stream(voice_id, &self.model_id, text)
            .await
            .map_err(into_synthesis_error)?;

        let mut audio = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(into_synthesis_error)?;
            if !chunk.is_empty() {
                audio.extend_from_slice(&chunk);
            }
        }

        info!("Received {} bytes of streamed audio", audio.len());
        Ok(SynthesizedSpeech { audio, words: None })
    }

    async fn synthesize_timestamped(&self, text: &str, voice_id: &str) -> Result<SynthesizedSpeech> {
        debug!("Timestamped synthesis with voice {} ({} chars)", voice_id, text.chars().count());
        let response = self
            .synthesizer
            .with_timestamps(voice_id, &self.model_id, text)
            .await
            .map_err(into_synthesis_error)?;

        let audio = general_purpose::STANDARD
            .decode(response.audio_base64.trim())
            .map_err(|e| PodcastError::Synthesis(format!("Invalid base64 audio payload: {}", e)))?;

        let words = response.alignment.as_ref().map(words_from_alignment);
        info!(
            "Received {} bytes of audio with {} timed words",
            audio.len(),
            words.as_ref().map_or(0, Vec::len)
        );
        Ok(SynthesizedSpeech { audio, words })
    }
}

/// Любая ошибка внешнего вызова становится ошибкой синтеза с исходным текстом
fn into_synthesis_error(error: PodcastError) -> PodcastError {
    match error {
        PodcastError::Synthesis(_) | PodcastError::Unsupported(_) => error,
        other => PodcastError::Synthesis(other.to_string()),
    }
}
