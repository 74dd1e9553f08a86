//! # Обработка сценария
//!
//! Сценарий проходит через несколько шагов:
//! 1. Нормализация: удаление markdown-заголовков и строк-ремарок в скобках.
//! 2. Перераспределение реплик между участниками (по политике).
//! 3. Разбор на сегменты: реплики и музыкальные вставки.
//! 4. Очистка текста каждой реплики перед синтезом.
//!
//! Все шаги используют общий классификатор строк из [`classify`].

pub mod classify;
pub mod normalizer;
pub mod rebalancer;
pub mod parser;
pub mod cleaner;

pub use classify::{classify_line, LineKind, MUSIC_MARKER};
pub use normalizer::normalize_script;
pub use rebalancer::{apply_speaker_policy, rebalance_speakers};
pub use parser::{parse_segments, Segment};
pub use cleaner::{clean_for_speech, contains_arabic, prepare_speech_text};
