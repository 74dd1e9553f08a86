//! Модуль для работы с аудио
//!
//! Все фрагменты (речь и музыка) приводятся к общему представлению:
//! моно PCM f32 с единой частотой дискретизации. Только после этого
//! они склеиваются в итоговую дорожку.

pub mod audio;
pub mod music;
pub mod timeline;
pub mod export;

pub use audio::PcmAudio;
pub use music::{MusicInserter, MusicLibrary, MusicSlot};
pub use timeline::{AudioTimeline, SpeakerSpan, TimelineAssembler, WordTiming};
pub use export::{ArtifactStore, Artifacts};
