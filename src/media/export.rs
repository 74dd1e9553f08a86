//! Запись итоговых артефактов
//!
//! Для каждой сессии хранится один «последний» выпуск: `output.wav` и
//! рядом `timeline.json`. Файлы пишутся во временные файлы в той же
//! директории и затем заменяют предыдущие, поэтому неудачный запрос
//! не оставляет наполовину записанных артефактов.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::error::Result;
use crate::media::audio::write_wav;
use crate::media::timeline::{AudioTimeline, TimelinePiece, WordTiming};

pub const AUDIO_FILE_NAME: &str = "output.wav";
pub const TIMELINE_FILE_NAME: &str = "timeline.json";

/// Пути к записанным артефактам
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub audio_path: PathBuf,
    pub timeline_path: PathBuf,
}

/// Содержимое `timeline.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineRecord {
    pub request_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub sample_rate: u32,
    pub duration_seconds: f64,
    pub words: Vec<WordTiming>,
    pub pieces: Vec<TimelinePiece>,
}

impl TimelineRecord {
    pub fn from_timeline(timeline: &AudioTimeline) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            created_at: Utc::now(),
            sample_rate: timeline.sample_rate,
            duration_seconds: timeline.duration_seconds,
            words: timeline.words.clone(),
            pieces: timeline.pieces.clone(),
        }
    }
}

/// Хранилище артефактов по сессиям
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Директория сессии; идентификатор очищается от служебных символов
    pub fn session_dir(&self, session: &str) -> PathBuf {
        self.root.join(sanitize_session(session))
    }

    /// Записать дорожку и шкалу слов, заменив предыдущие артефакты сессии
    pub fn save(&self, session: &str, timeline: &AudioTimeline) -> Result<Artifacts> {
        let dir = self.session_dir(session);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create artifact directory {}", dir.display()))?;

        let audio_path = dir.join(AUDIO_FILE_NAME);
        let timeline_path = dir.join(TIMELINE_FILE_NAME);

        // Сначала готовим оба временных файла, потом заменяем
        let audio_tmp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        write_wav(BufWriter::new(audio_tmp.as_file()), &timeline.samples, timeline.sample_rate)?;

        let record = TimelineRecord::from_timeline(timeline);
        let mut timeline_tmp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        serde_json::to_writer_pretty(&mut timeline_tmp, &record)?;
        timeline_tmp.flush()?;

        audio_tmp
            .persist(&audio_path)
            .with_context(|| format!("Failed to persist {}", audio_path.display()))?;
        timeline_tmp
            .persist(&timeline_path)
            .with_context(|| format!("Failed to persist {}", timeline_path.display()))?;

        info!(
            "Saved artifacts for session '{}' to {} (request {})",
            session,
            dir.display(),
            record.request_id
        );
        Ok(Artifacts {
            audio_path,
            timeline_path,
        })
    }

    /// Последние артефакты сессии, если они есть
    pub fn last_artifacts(&self, session: &str) -> Option<Artifacts> {
        let dir = self.session_dir(session);
        let audio_path = dir.join(AUDIO_FILE_NAME);
        let timeline_path = dir.join(TIMELINE_FILE_NAME);
        if audio_path.is_file() && timeline_path.is_file() {
            Some(Artifacts {
                audio_path,
                timeline_path,
            })
        } else {
            None
        }
    }

    /// Прочитать `timeline.json` последнего выпуска
    pub fn load_timeline(&self, session: &str) -> Result<Option<TimelineRecord>> {
        let Some(artifacts) = self.last_artifacts(session) else {
            return Ok(None);
        };
        let data = fs::read(&artifacts.timeline_path)?;
        Ok(Some(serde_json::from_slice(&data)?))
    }
}

fn sanitize_session(session: &str) -> String {
    let cleaned: String = session
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "anonymous".to_string()
    } else {
        cleaned
    }
}
