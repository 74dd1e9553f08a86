//! Стили сценария и допустимые составы ролей

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PodcastError, Result};
use crate::speaker::{Role, Speaker};

/// Минимальное количество слов в исходном тексте
pub const MIN_DESCRIPTION_WORDS: usize = 500;
/// Максимальное количество слов в исходном тексте
pub const MAX_DESCRIPTION_WORDS: usize = 2500;

/// Стиль подкаста
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScriptStyle {
    Interview,
    Storytelling,
    Educational,
    Conversational,
}

impl ScriptStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interview => "Interview",
            Self::Storytelling => "Storytelling",
            Self::Educational => "Educational",
            Self::Conversational => "Conversational",
        }
    }

    /// Указания по тону и очерёдности реплик для генератора сценария
    pub fn guidelines(&self) -> &'static str {
        match self {
            Self::Interview => {
                "• Tone: Professional, journalistic.\n\
                 • Flow: Host asks, guest answers.\n\
                 • Turn-taking: MUST alternate speakers.\n\
                 • Goal: Insightful conversation."
            }
            Self::Storytelling => {
                "• Tone: Cinematic and narrative.\n\
                 • Flow: Story with emotional beats.\n\
                 • Turn-taking: All speakers appear in intro, body, outro.\n\
                 • Goal: Immersive storytelling."
            }
            Self::Educational => {
                "• Tone: Clear and helpful.\n\
                 • Flow: Explain → clarify → examples.\n\
                 • Turn-taking: Host + guests engage.\n\
                 • Goal: Learn through dialogue."
            }
            Self::Conversational => {
                "• Tone: Friendly and natural.\n\
                 • Flow: Co-host casual conversation.\n\
                 • Turn-taking: Hosts react and alternate often.\n\
                 • Goal: Feel like real conversation."
            }
        }
    }

    /// Допустимые наборы ролей в порядке перечисления участников
    fn allowed_setups(&self) -> &'static [&'static [Role]] {
        use Role::{Guest, Host};
        match self {
            Self::Interview => &[&[Host, Guest], &[Host, Host, Guest]],
            Self::Storytelling | Self::Educational => {
                &[&[Host], &[Host, Guest], &[Host, Guest, Guest]]
            }
            Self::Conversational => &[&[Host, Host], &[Host, Host, Host]],
        }
    }

    /// Подсказка о допустимых составах
    pub fn setup_hint(&self) -> &'static str {
        match self {
            Self::Interview => {
                "For 'Interview' style, valid setups: 1 host → 1 guest or 2 hosts → 1 guest."
            }
            Self::Storytelling => {
                "For 'Storytelling' style, valid setups: 1 host solo, 1 host → 1 guest, or 1 host → 2 guests."
            }
            Self::Educational => {
                "For 'Educational' style, valid setups: 1 host solo, 1 host → 1 guest, or 1 host → 2 guests."
            }
            Self::Conversational => "For 'Conversational', use 2–3 hosts (no guests).",
        }
    }
}

impl fmt::Display for ScriptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScriptStyle {
    type Err = PodcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "interview" => Ok(Self::Interview),
            "storytelling" => Ok(Self::Storytelling),
            "educational" => Ok(Self::Educational),
            "conversational" => Ok(Self::Conversational),
            "" => Err(PodcastError::InvalidSetup("Please choose a podcast style.".to_string())),
            other => Err(PodcastError::InvalidSetup(format!("Unknown podcast style: {}", other))),
        }
    }
}

/// Проверка, что роли участников соответствуют стилю
pub fn validate_roles(style: ScriptStyle, speakers: &[Speaker]) -> Result<()> {
    let roles: Vec<Role> = speakers.iter().map(|s| s.role).collect();
    let allowed = style
        .allowed_setups()
        .iter()
        .any(|setup| *setup == roles.as_slice());

    if allowed {
        Ok(())
    } else {
        Err(PodcastError::InvalidSetup(style.setup_hint().to_string()))
    }
}

/// Проверка длины исходного текста
pub fn validate_description(description: &str) -> Result<usize> {
    let word_count = description.split_whitespace().count();
    if word_count == 0 {
        return Err(PodcastError::InvalidSetup("Please enter your text.".to_string()));
    }
    if word_count > MAX_DESCRIPTION_WORDS {
        return Err(PodcastError::InvalidSetup(format!(
            "The text exceeds the {}-word limit.",
            MAX_DESCRIPTION_WORDS
        )));
    }
    if word_count < MIN_DESCRIPTION_WORDS {
        return Err(PodcastError::InvalidSetup(format!(
            "Your text must be at least {} words. Current length: {}.",
            MIN_DESCRIPTION_WORDS, word_count
        )));
    }
    Ok(word_count)
}
