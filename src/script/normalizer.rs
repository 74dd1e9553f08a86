//! Нормализация сгенерированного сценария
//!
//! Удаляются только markdown-заголовки и строки, целиком состоящие из
//! ремарки в скобках. Музыкальная метка сохраняется как есть, всё
//! остальное (включая ремарки внутри реплик) проходит без изменений.

use crate::script::classify::{classify_line, LineKind};

/// Нормализовать сырой текст сценария
pub fn normalize_script(raw: &str) -> String {
    raw.lines()
        .filter(|line| !matches!(classify_line(line), LineKind::Heading | LineKind::SoundCue))
        .collect::<Vec<&str>>()
        .join("\n")
}
