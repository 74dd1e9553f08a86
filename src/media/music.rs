//! Вставка музыки по меткам `[music]`
//!
//! Порядковый номер метки в сценарии определяет, какой файл звучит:
//! первая метка даёт заставку, вторая и третья основную часть,
//! остальные концовку. Отсутствующий файл пропускается.

use std::path::{Component, Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::MusicSelection;
use crate::media::audio::{decode_audio_file, resample, PcmAudio};

/// Место музыкального фрагмента в выпуске
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicSlot {
    Intro,
    Body,
    Outro,
}

impl MusicSlot {
    /// Слот по порядковому номеру метки (с нуля)
    pub fn for_occurrence(index: usize) -> Self {
        match index {
            0 => MusicSlot::Intro,
            1 | 2 => MusicSlot::Body,
            _ => MusicSlot::Outro,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MusicSlot::Intro => "intro",
            MusicSlot::Body => "body",
            MusicSlot::Outro => "outro",
        }
    }

    /// Имя файла, выбранного для этого слота
    pub fn select<'a>(&self, selection: &'a MusicSelection) -> Option<&'a str> {
        let name = match self {
            MusicSlot::Intro => selection.intro.as_deref(),
            MusicSlot::Body => selection.body.as_deref(),
            MusicSlot::Outro => selection.outro.as_deref(),
        };
        name.map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Локальное хранилище музыкальных файлов
#[derive(Debug, Clone)]
pub struct MusicLibrary {
    root: PathBuf,
}

impl MusicLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Путь к файлу, если он существует внутри корня хранилища
    pub fn locate(&self, filename: &str) -> Option<PathBuf> {
        let relative = Path::new(filename);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            warn!("Rejected music asset name outside of library: {}", filename);
            return None;
        }

        let path = self.root.join(relative);
        if path.is_file() {
            Some(path)
        } else {
            None
        }
    }
}

/// Музыкальный фрагмент, готовый к склейке
#[derive(Debug, Clone)]
pub struct MusicClip {
    pub slot: MusicSlot,
    pub path: PathBuf,
    pub audio: PcmAudio,
}

/// Сопоставляет метки музыки с файлами, считая их по порядку
#[derive(Debug)]
pub struct MusicInserter {
    library: MusicLibrary,
    selection: MusicSelection,
    position: usize,
}

impl MusicInserter {
    pub fn new(library: MusicLibrary, selection: MusicSelection) -> Self {
        Self {
            library,
            selection,
            position: 0,
        }
    }

    /// Сколько меток уже обработано
    pub fn position(&self) -> usize {
        self.position
    }

    /// Следующая метка: слот и путь к файлу, если он есть.
    ///
    /// Счётчик увеличивается при каждом вызове, даже если файла нет.
    pub fn next_clip(&mut self) -> (MusicSlot, Option<PathBuf>) {
        let slot = MusicSlot::for_occurrence(self.position);
        self.position += 1;

        let path = match slot.select(&self.selection) {
            Some(name) => {
                let found = self.library.locate(name);
                if found.is_none() {
                    info!("Music asset '{}' for {} not found, skipping", name, slot.as_str());
                }
                found
            }
            None => {
                debug!("No music selected for {}, skipping", slot.as_str());
                None
            }
        };
        (slot, path)
    }

    /// Следующая метка с декодированным аудио в нужной частоте.
    ///
    /// Нечитаемый файл считается отсутствующим: музыка не должна
    /// проваливать весь запрос.
    pub fn load_next(&mut self, target_rate: u32) -> (MusicSlot, Option<MusicClip>) {
        let (slot, path) = self.next_clip();
        let Some(path) = path else {
            return (slot, None);
        };

        let audio = match decode_audio_file(&path).and_then(|audio| resample(audio, target_rate)) {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Failed to load music {}: {}", path.display(), e);
                return (slot, None);
            }
        };

        info!(
            "Loaded {} music {} ({:.2}s)",
            slot.as_str(),
            path.display(),
            audio.duration_seconds()
        );
        (slot, Some(MusicClip { slot, path, audio }))
    }
}
