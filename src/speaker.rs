//! Участники подкаста и проверка их состава

use std::collections::HashSet;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PodcastError, Result};

/// Максимальное количество участников в одном выпуске
pub const MAX_SPEAKERS: usize = 3;

lazy_static! {
    // Только буквы, слова разделены пробелами
    static ref SPEAKER_NAME_RE: Regex = Regex::new(r"^[^\W\d_]+(?:\s+[^\W\d_]+)*$").unwrap();
}

/// Пол участника (влияет только на подсказку для генератора сценария)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
        }
    }
}

/// Роль участника
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Host => "host",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Участник подкаста. Живёт только в рамках одного запроса.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    pub name: String,
    pub gender: Gender,
    pub role: Role,
    #[serde(default)]
    pub voice_id: Option<String>,
}

impl Speaker {
    /// Создать участника без назначенного голоса
    pub fn new(name: impl Into<String>, gender: Gender, role: Role) -> Self {
        Self {
            name: name.into().trim().to_string(),
            gender,
            role,
            voice_id: None,
        }
    }

    /// Назначить голос синтезатора
    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    /// Имя без пробелов по краям
    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }

    /// Идентификатор голоса, если он задан и не пуст
    pub fn voice(&self) -> Option<&str> {
        self.voice_id
            .as_deref()
            .map(str::trim)
            .filter(|voice| !voice.is_empty())
    }
}

/// Проверка состава участников: количество, имена, уникальность
pub fn validate_roster(speakers: &[Speaker]) -> Result<()> {
    if speakers.is_empty() || speakers.len() > MAX_SPEAKERS {
        return Err(PodcastError::InvalidSetup(
            "Please select a number of speakers between 1 and 3.".to_string(),
        ));
    }

    if speakers.iter().any(|s| s.trimmed_name().is_empty()) {
        return Err(PodcastError::InvalidSetup(
            "Please provide a name for all speakers.".to_string(),
        ));
    }

    if speakers.iter().any(|s| !SPEAKER_NAME_RE.is_match(s.trimmed_name())) {
        return Err(PodcastError::InvalidSetup(
            "Speaker names may contain letters and spaces only, no numbers or symbols.".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for speaker in speakers {
        if !seen.insert(normalize_for_compare(&speaker.name)) {
            return Err(PodcastError::InvalidSetup(
                "Speaker names must be unique within the podcast.".to_string(),
            ));
        }
    }

    Ok(())
}

fn normalize_for_compare(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
