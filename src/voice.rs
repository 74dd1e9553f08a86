//! Сопоставление говорящих с голосами синтезатора

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::speaker::{Role, Speaker};

/// Голоса участников и голос по умолчанию
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceMap {
    explicit: HashMap<String, String>,
    default_voice: String,
}

impl VoiceMap {
    /// Построить карту голосов для состава участников.
    ///
    /// Голос по умолчанию: голос первого ведущего, иначе первый заданный
    /// голос, иначе `fallback`. Участники без имени или без голоса в карту
    /// не попадают.
    pub fn resolve(speakers: &[Speaker], fallback: &str) -> Self {
        let named: Vec<&Speaker> = speakers
            .iter()
            .filter(|s| !s.trimmed_name().is_empty())
            .collect();

        let explicit: HashMap<String, String> = named
            .iter()
            .filter_map(|s| s.voice().map(|v| (s.trimmed_name().to_string(), v.to_string())))
            .collect();

        let default_voice = named
            .iter()
            .filter(|s| s.role == Role::Host)
            .find_map(|s| s.voice())
            .or_else(|| named.iter().find_map(|s| s.voice()))
            .unwrap_or(fallback)
            .to_string();

        debug!(
            "Resolved {} explicit voices, default voice {}",
            explicit.len(),
            default_voice
        );
        Self {
            explicit,
            default_voice,
        }
    }

    /// Голос для метки говорящего; неизвестная метка получает голос по умолчанию
    pub fn voice_for(&self, speaker: &str) -> &str {
        self.explicit
            .get(speaker)
            .or_else(|| self.explicit.get(speaker.trim()))
            .map(String::as_str)
            .unwrap_or(&self.default_voice)
    }

    pub fn default_voice(&self) -> &str {
        &self.default_voice
    }

    pub fn explicit(&self) -> &HashMap<String, String> {
        &self.explicit
    }

    /// Количество разных голосов, которые может дать карта
    pub fn distinct_voice_count(&self) -> usize {
        let mut voices: HashSet<&str> = self.explicit.values().map(String::as_str).collect();
        voices.insert(&self.default_voice);
        voices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FALLBACK_VOICE_ID;
    use crate::speaker::Gender;

    #[test]
    fn test_no_host_no_voices_uses_fallback() {
        let speakers = vec![
            Speaker::new("Anna", Gender::Female, Role::Guest),
            Speaker::new("Omar", Gender::Male, Role::Guest),
        ];
        let map = VoiceMap::resolve(&speakers, FALLBACK_VOICE_ID);

        assert_eq!(map.default_voice(), FALLBACK_VOICE_ID);
        assert!(map.explicit().is_empty());
        assert_eq!(map.voice_for("Anna"), FALLBACK_VOICE_ID);
    }

    #[test]
    fn test_host_voice_is_default() {
        let speakers = vec![
            Speaker::new("Guest", Gender::Female, Role::Guest).with_voice("v2"),
            Speaker::new("Host", Gender::Male, Role::Host).with_voice("v1"),
        ];
        let map = VoiceMap::resolve(&speakers, FALLBACK_VOICE_ID);

        assert_eq!(map.default_voice(), "v1");
        assert_eq!(map.voice_for("Guest"), "v2");
        assert_eq!(map.voice_for("Host"), "v1");
        assert_eq!(map.distinct_voice_count(), 2);
    }

    #[test]
    fn test_first_voice_when_host_has_none() {
        let speakers = vec![
            Speaker::new("Host", Gender::Male, Role::Host).with_voice("  "),
            Speaker::new("Guest", Gender::Female, Role::Guest).with_voice("v2"),
        ];
        let map = VoiceMap::resolve(&speakers, FALLBACK_VOICE_ID);

        assert_eq!(map.default_voice(), "v2");
        assert_eq!(map.explicit().len(), 1);
        assert_eq!(map.distinct_voice_count(), 1);
    }

    #[test]
    fn test_unknown_label_never_fails() {
        let speakers = vec![Speaker::new("", Gender::Male, Role::Host).with_voice("v9")];
        let map = VoiceMap::resolve(&speakers, FALLBACK_VOICE_ID);

        assert!(map.explicit().is_empty());
        assert_eq!(map.default_voice(), FALLBACK_VOICE_ID);
        assert_eq!(map.voice_for("ga"), FALLBACK_VOICE_ID);
        assert_eq!(map.voice_for(""), FALLBACK_VOICE_ID);
    }

    #[test]
    fn test_nameless_host_does_not_set_default() {
        let speakers = vec![
            Speaker::new(" ", Gender::Male, Role::Host).with_voice("v9"),
            Speaker::new("Sara", Gender::Female, Role::Guest).with_voice("v2"),
        ];
        let map = VoiceMap::resolve(&speakers, FALLBACK_VOICE_ID);

        assert_eq!(map.default_voice(), "v2");
        assert_eq!(map.voice_for("Mike"), "v2");
    }
}
