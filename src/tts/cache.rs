//! Модуль для кэширования синтезированных сегментов
//!
//! Если запрос упал на позднем сегменте, повторный запрос не платит
//! заново за уже озвученные сегменты: они берутся из кэша.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{PipelineConfig, SynthesisMode};
use crate::error::Result;
use crate::tts::adapter::SynthesizedSpeech;
use crate::tts::alignment::LocalWord;

/// Структура для управления кэшем сегментов
#[derive(Debug, Clone)]
pub struct SegmentCache {
    /// Директория для кэша
    cache_dir: PathBuf,
}

impl SegmentCache {
    /// Создать кэш из конфигурации
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let cache_dir = match &config.cache_dir {
            Some(dir) => dir.clone(),
            None => std::env::temp_dir().join("podcast-tts-cache"),
        };
        Self::new(cache_dir)
    }

    /// Создать кэш в указанной директории
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir)?;
        }
        Ok(Self { cache_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Получить сегмент из кэша
    pub fn get(
        &self,
        voice_id: &str,
        model_id: &str,
        mode: SynthesisMode,
        text: &str,
    ) -> Option<SynthesizedSpeech> {
        let key = Self::cache_key(voice_id, model_id, mode, text);
        let audio = fs::read(self.audio_path(&key)).ok()?;

        let words = match fs::read(self.words_path(&key)) {
            Ok(json) => match serde_json::from_slice::<Option<Vec<LocalWord>>>(&json) {
                Ok(words) => words,
                Err(e) => {
                    log::warn!("Ignoring corrupt cache entry {}: {}", key, e);
                    return None;
                }
            },
            Err(_) => None,
        };

        log::debug!("Segment cache hit: {}", key);
        Some(SynthesizedSpeech { audio, words })
    }

    /// Добавить сегмент в кэш
    pub fn put(
        &self,
        voice_id: &str,
        model_id: &str,
        mode: SynthesisMode,
        text: &str,
        speech: &SynthesizedSpeech,
    ) -> Result<()> {
        let key = Self::cache_key(voice_id, model_id, mode, text);
        fs::write(self.words_path(&key), serde_json::to_vec(&speech.words)?)?;
        // Аудио пишется последним: без него запись не считается кэшем
        fs::write(self.audio_path(&key), &speech.audio)?;
        Ok(())
    }

    /// Очистить кэш
    pub fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    fn audio_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.audio", key))
    }

    fn words_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.words.json", key))
    }

    /// Генерировать ключ для кэша
    fn cache_key(voice_id: &str, model_id: &str, mode: SynthesisMode, text: &str) -> String {
        let mut hasher = md5::Context::new();
        for part in [voice_id, model_id, mode.as_str(), text] {
            hasher.consume(part.as_bytes());
            hasher.consume([0u8]);
        }
        format!("{:x}", hasher.compute())
    }
}
