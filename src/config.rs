//! Модуль конфигурации библиотеки podcast-tts
//!
//! Конфигурация передаётся в конвейер явно и не меняется во время запроса.

use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use crate::error::{PodcastError, Result};

/// Голос по умолчанию, если ни у одного участника нет своего голоса
pub const FALLBACK_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Модель синтеза по умолчанию
pub const DEFAULT_MODEL_ID: &str = "eleven_turbo_v2";

/// Базовый адрес API ElevenLabs
pub const DEFAULT_API_BASE_URL: &str = "https://api.elevenlabs.io";

/// Режим обращения к синтезатору
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMode {
    /// Поток байтов без временных меток
    Streaming,
    /// Аудио в base64 с посимвольными метками времени
    Timestamped,
}

impl Default for SynthesisMode {
    fn default() -> Self {
        Self::Timestamped
    }
}

impl SynthesisMode {
    /// Получить строковое представление режима
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::Timestamped => "timestamped",
        }
    }
}

/// Политика обработки меток говорящих
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerPolicy {
    /// Перераспределять реплики между всеми участниками по кругу
    Rebalance,
    /// Сохранять метки ровно в том виде, как они написаны
    PreserveLabels,
}

impl Default for SpeakerPolicy {
    fn default() -> Self {
        Self::PreserveLabels
    }
}

/// Имена музыкальных файлов для заставки, основной части и концовки
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MusicSelection {
    pub intro: Option<String>,
    pub body: Option<String>,
    pub outro: Option<String>,
}

/// Конфигурация конвейера
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// API ключ синтезатора
    pub api_key: String,
    /// Базовый адрес API синтезатора
    pub api_base_url: String,
    /// Модель синтеза
    pub model_id: String,
    /// Голос, если ни один участник не задал свой
    pub fallback_voice_id: String,
    /// Режим синтеза
    pub synthesis_mode: SynthesisMode,
    /// Политика меток говорящих
    pub speaker_policy: SpeakerPolicy,
    /// Директория с музыкальными файлами
    pub music_dir: PathBuf,
    /// Выбранная музыка
    pub music: MusicSelection,
    /// Тишина в начале итогового файла, мс
    pub leading_silence_ms: u32,
    /// Частота дискретизации итогового файла
    pub output_sample_rate: u32,
    /// Директория для итоговых артефактов
    pub output_dir: PathBuf,
    /// Озвучивать подряд идущие реплики одним запросом, если голос один
    pub collapse_single_voice: bool,
    /// Кэшировать синтезированные сегменты на диске
    pub use_segment_cache: bool,
    /// Директория для кэша
    pub cache_dir: Option<PathBuf>,
    /// Максимальное количество одновременных запросов к синтезатору
    pub max_concurrent_requests: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            fallback_voice_id: FALLBACK_VOICE_ID.to_string(),
            synthesis_mode: SynthesisMode::default(),
            speaker_policy: SpeakerPolicy::default(),
            music_dir: PathBuf::from("static/music"),
            music: MusicSelection::default(),
            leading_silence_ms: 500,
            output_sample_rate: 44100,
            output_dir: PathBuf::from("static"),
            collapse_single_voice: true,
            use_segment_cache: false,
            cache_dir: None,
            max_concurrent_requests: 1,
        }
    }
}

impl PipelineConfig {
    /// Разобрать конфигурацию из JSON; отсутствующие поля берутся по умолчанию
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Проверить согласованность настроек
    pub fn validate(&self) -> Result<()> {
        if self.model_id.trim().is_empty() {
            return Err(PodcastError::Configuration("model_id must not be empty".to_string()));
        }
        if self.output_sample_rate == 0 {
            return Err(PodcastError::Configuration(
                "output_sample_rate must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(PodcastError::Configuration(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }
        if self.use_segment_cache && self.cache_dir.is_none() {
            log::debug!("Segment cache enabled without cache_dir, using system temp directory");
        }
        Ok(())
    }

    /// Голос по умолчанию; никогда не бывает пустым
    pub fn effective_fallback_voice(&self) -> &str {
        let voice = self.fallback_voice_id.trim();
        if voice.is_empty() {
            FALLBACK_VOICE_ID
        } else {
            voice
        }
    }
}
