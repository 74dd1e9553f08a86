//! Генерация сценария и названия выпуска
//!
//! Сам вызов языковой модели спрятан за трейтом [`ScriptProducer`].
//! Здесь собираются промпты, проверяется запрос и нормализуется ответ.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::config::SpeakerPolicy;
use crate::error::{PodcastError, Result};
use crate::script::{apply_speaker_policy, contains_arabic, normalize_script};
use crate::speaker::{validate_roster, Speaker};
use crate::style::{validate_description, validate_roles, ScriptStyle};

/// Модель для сценария и названия
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
/// Сколько символов сценария уходит в промпт названия
pub const TITLE_SCRIPT_CHARS: usize = 4000;
/// Название для пустого сценария
pub const UNTITLED_EPISODE: &str = "Untitled Episode";

const SCRIPT_SYSTEM_PROMPT: &str =
    "You write natural, structured podcast scripts with correct speaker dialogue.";
const TITLE_SYSTEM_PROMPT: &str = "You write concise, catchy podcast titles.";
const SCRIPT_TEMPERATURE: f32 = 0.75;
const TITLE_TEMPERATURE: f32 = 0.7;

/// Запрос к языковой модели
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
}

/// Генератор текста сценария
#[async_trait]
pub trait ScriptProducer: Send + Sync {
    /// Вернуть сырой ответ модели
    async fn produce(&self, request: &PromptRequest) -> Result<String>;
}

// Структуры OpenAI Chat Completions API
#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Генератор на OpenAI Chat Completions
#[derive(Debug, Clone)]
pub struct OpenAiScriptProducer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiScriptProducer {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PodcastError::Configuration("OpenAI API key is not set".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model: DEFAULT_CHAT_MODEL.to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl ScriptProducer for OpenAiScriptProducer {
    async fn produce(&self, request: &PromptRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: Some(request.system.clone()),
                },
                Message {
                    role: "user".to_string(),
                    content: Some(request.prompt.clone()),
                },
            ],
            temperature: request.temperature,
        };

        debug!("Sending chat completion request to {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        debug!("OpenAI API response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await?;
            error!("OpenAI API error: HTTP {}, body: {}", status, error_text);
            return Err(PodcastError::ScriptGeneration(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let completion: ChatCompletion = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PodcastError::ScriptGeneration("OpenAI API returned no choices".to_string()))?;
        Ok(content.trim().to_string())
    }
}

/// Запрос на сценарий
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptRequest {
    pub description: String,
    pub speakers: Vec<Speaker>,
    pub style: ScriptStyle,
}

/// Проверить состав, роли и исходный текст до обращения к модели
pub fn validate_request(request: &ScriptRequest) -> Result<()> {
    validate_roster(&request.speakers)?;
    validate_roles(request.style, &request.speakers)?;
    validate_description(&request.description)?;
    Ok(())
}

/// Промпт для сценария
pub fn build_script_prompt(description: &str, speakers: &[Speaker], style: ScriptStyle) -> String {
    let arabic_instruction = if contains_arabic(description) {
        "Please write the script in Arabic."
    } else {
        ""
    };

    let speaker_info = speakers
        .iter()
        .map(|s| format!("- {} ({}, {})", s.trimmed_name(), s.gender, s.role))
        .collect::<Vec<_>>()
        .join("\n");

    let separator = "--------------------";
    format!(
        "You are a professional podcast scriptwriter.\n\n\
         There should be exactly {count} speaker(s). Use these exact labels:\n\n\
         {speaker_info}\n\n\
         Format the content into a natural podcast script. Do not exceed or invent story details.\n\n\
         STYLE: {style}\n\n\
         {guidelines}\n\n\
         Follow these requirements:\n\n\
         {sep}\nINTRO\n{sep}\n\
         - Greet listeners.\n\
         - Introduce topic + speakers.\n\
         - Include one sound cue in square brackets.\n\n\
         {sep}\nBODY\n{sep}\n\
         - Natural dialogue.\n\
         - All speakers MUST speak multiple times.\n\
         - Turn-taking is REQUIRED.\n\
         - Use smooth transitions like [music fades out] or [pause].\n\n\
         {sep}\nOUTRO\n{sep}\n\
         - Summary or closing thoughts.\n\
         - One closing sound cue.\n\n\
         {sep}\nRULES\n{sep}\n\
         - Every spoken line MUST begin with: SpeakerName:\n\
         - Do NOT use bullet points inside the script.\n\
         - Do NOT use markdown (#, ##, ### headings).\n\
         - Sound cues must be inside square brackets.\n\
         - Keep the script natural and flowing.\n\n\
         {arabic_instruction}\n\n\
         Transform the following text into a structured podcast script:\n\n\
         [TEXT START]\n{description}\n[TEXT END]\n",
        count = speakers.len(),
        speaker_info = speaker_info,
        style = style,
        guidelines = style.guidelines(),
        sep = separator,
        arabic_instruction = arabic_instruction,
        description = description,
    )
}

/// Промпт для названия выпуска; сценарий обрезается до [`TITLE_SCRIPT_CHARS`] символов
pub fn build_title_prompt(script: &str, style: Option<ScriptStyle>) -> String {
    let style_label = style.map_or("General", |s| s.as_str());
    let excerpt: String = script.chars().take(TITLE_SCRIPT_CHARS).collect();
    format!(
        "You are an assistant helping to name a podcast episode.\n\n\
         Write ONE short, catchy podcast episode title in 4–8 words.\n\n\
         Style: {}\n\n\
         Rules:\n\
         - No quotation marks.\n\
         - No episode numbers.\n\
         - No emojis.\n\
         - Title case (Capitalize Major Words).\n\
         - Return ONLY the title text, nothing else.\n\n\
         Script:\n\"\"\"{}\"\"\"\n",
        style_label, excerpt
    )
}

/// Сгенерировать сценарий: проверка, промпт, модель, нормализация и политика меток
pub async fn generate_script(
    producer: &dyn ScriptProducer,
    request: &ScriptRequest,
    policy: SpeakerPolicy,
) -> Result<String> {
    validate_request(request)?;

    let prompt = PromptRequest {
        system: SCRIPT_SYSTEM_PROMPT.to_string(),
        prompt: build_script_prompt(&request.description, &request.speakers, request.style),
        temperature: SCRIPT_TEMPERATURE,
    };
    info!(
        "Generating {} script for {} speaker(s)",
        request.style,
        request.speakers.len()
    );

    let raw = producer.produce(&prompt).await?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PodcastError::ScriptGeneration(
            "Script producer returned an empty script".to_string(),
        ));
    }

    let normalized = normalize_script(raw);
    let script = apply_speaker_policy(&normalized, &request.speakers, policy);
    debug!("Generated script with {} lines", script.lines().count());
    Ok(script)
}

/// Сгенерировать короткое название выпуска
pub async fn generate_title(
    producer: &dyn ScriptProducer,
    script: &str,
    style: Option<ScriptStyle>,
) -> Result<String> {
    if script.trim().is_empty() {
        return Ok(UNTITLED_EPISODE.to_string());
    }

    let prompt = PromptRequest {
        system: TITLE_SYSTEM_PROMPT.to_string(),
        prompt: build_title_prompt(script, style),
        temperature: TITLE_TEMPERATURE,
    };
    let title = producer.produce(&prompt).await?;
    Ok(title.trim().to_string())
}
