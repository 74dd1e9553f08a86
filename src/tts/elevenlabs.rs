//! Модуль для интеграции с ElevenLabs API
//!
//! Две формы вызова:
//! * `POST /v1/text-to-speech/{voice_id}/stream` - поток MP3 без меток;
//! * `POST /v1/text-to-speech/{voice_id}/with-timestamps` - JSON с аудио
//!   в base64 и посимвольными метками времени.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use log::{debug, error, info};
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::{PodcastError, Result};
use crate::tts::{AudioChunkStream, CharacterAlignment, Synthesizer, TimestampedAudio};

const XI_API_KEY_HEADER: &str = "xi-api-key";
const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// Параметры запроса к API
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Ответ API в режиме с метками времени
#[derive(Debug, Deserialize)]
struct TimestampedResponse {
    audio_base64: String,
    #[serde(default)]
    alignment: Option<CharacterAlignment>,
}

/// Клиент синтезатора ElevenLabs
#[derive(Debug, Clone)]
pub struct ElevenLabsSynthesizer {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ElevenLabsSynthesizer {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, crate::config::DEFAULT_API_BASE_URL)
    }

    /// Клиент с другим базовым адресом (прокси, тестовый сервер)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            error!("ElevenLabs API key is empty");
            return Err(PodcastError::Configuration(
                "ElevenLabs API key is required for speech synthesis".to_string(),
            ));
        }

        let client = Client::builder().build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::with_base_url(config.api_key.clone(), config.api_base_url.clone())
    }

    fn endpoint(&self, voice_id: &str, suffix: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}/{}?output_format={}",
            self.base_url, voice_id, suffix, OUTPUT_FORMAT
        )
    }

    async fn post(&self, url: &str, model_id: &str, text: &str) -> Result<Response> {
        debug!("Sending TTS request to {}", url);
        let response = self
            .client
            .post(url)
            .header(XI_API_KEY_HEADER, &self.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&SpeechRequest { text, model_id })
            .send()
            .await
            .map_err(|e| PodcastError::Synthesis(format!("Failed to send TTS request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = match response.text().await {
                Ok(text) => text,
                Err(e) => format!("Failed to read error response: {}", e),
            };
            error!("ElevenLabs API error (status {}): {}", status, error_text);
            return Err(PodcastError::Synthesis(format!(
                "ElevenLabs API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl Synthesizer for ElevenLabsSynthesizer {
    async fn stream(&self, voice_id: &str, model_id: &str, text: &str) -> Result<AudioChunkStream> {
        let url = self.endpoint(voice_id, "stream");
        let response = self.post(&url, model_id, text).await?;
        info!("Streaming audio for voice {}", voice_id);
        Ok(response.bytes_stream().map_err(PodcastError::from).boxed())
    }

    async fn with_timestamps(
        &self,
        voice_id: &str,
        model_id: &str,
        text: &str,
    ) -> Result<TimestampedAudio> {
        let url = self.endpoint(voice_id, "with-timestamps");
        let response = self.post(&url, model_id, text).await?;
        let body: TimestampedResponse = response
            .json()
            .await
            .map_err(|e| PodcastError::Synthesis(format!("Invalid timestamped response: {}", e)))?;

        Ok(TimestampedAudio {
            audio_base64: body.audio_base64,
            alignment: body.alignment,
        })
    }
}
