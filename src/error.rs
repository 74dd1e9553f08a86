//! Модуль обработки ошибок библиотеки podcast-tts
//!
//! Все ошибки локальны для одного запроса: артефакты записываются только
//! после полностью успешного синтеза, поэтому откатывать нечего.

use thiserror::Error;

/// Ошибки библиотеки podcast-tts
#[derive(Debug, Error)]
pub enum PodcastError {
    /// Ошибка HTTP запроса
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации/десериализации JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Ошибка WAV-кодирования
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Пустой сценарий
    #[error("Script is empty.")]
    EmptyScript,

    /// После очистки не осталось текста для озвучивания
    #[error("Nothing to read after cleaning script.")]
    EmptyText,

    /// Все сегменты дали нулевое аудио
    #[error("no audio data generated")]
    NothingToSynthesize,

    /// Ошибка внешнего синтезатора речи
    #[error("{0}")]
    Synthesis(String),

    /// Синтезатор не поддерживает запрошенный режим
    #[error("Unsupported synthesis shape: {0}")]
    Unsupported(String),

    /// Ошибка генерации сценария
    #[error("Script generation error: {0}")]
    ScriptGeneration(String),

    /// Ошибка обработки аудио
    #[error("Audio processing error: {0}")]
    AudioProcessing(String),

    /// Ошибка конфигурации
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Недопустимый состав участников, стиль или исходный текст
    #[error("{0}")]
    InvalidSetup(String),

    /// Внутренняя ошибка с контекстом
    #[error(transparent)]
    Internal(#[from] anyhow::Error),

    /// Другая ошибка
    #[error("Other error: {0}")]
    Other(String),
}

impl PodcastError {
    /// Ошибка пользовательского ввода (синтез не запускался)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PodcastError::EmptyScript | PodcastError::EmptyText | PodcastError::InvalidSetup(_)
        )
    }
}

impl From<&str> for PodcastError {
    fn from(s: &str) -> Self {
        PodcastError::Other(s.to_string())
    }
}

impl From<String> for PodcastError {
    fn from(s: String) -> Self {
        PodcastError::Other(s)
    }
}

/// Тип Result для библиотеки podcast-tts
pub type Result<T> = std::result::Result<T, PodcastError>;
