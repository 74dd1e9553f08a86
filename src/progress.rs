//! Обновления прогресса конвейера

use serde::Serialize;
use tokio::sync::mpsc::Sender;

use crate::media::music::MusicSlot;

/// Обновление прогресса для отправки клиенту
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ProgressUpdate {
    /// Началась обработка
    Started,
    /// Нормализация и разбор сценария
    Parsing,
    /// Синтез речи для сегмента
    Synthesizing {
        /// Текущий сегмент
        current: usize,
        /// Общее количество сегментов
        total: usize,
    },
    /// Вставка музыки
    InsertingMusic {
        slot: MusicSlot,
    },
    /// Склейка фрагментов
    Assembling,
    /// Запись артефактов
    Exporting,
    /// Обработка завершена
    Finished,
}

/// Асинхронно отправляет обновление прогресса
pub async fn send_progress(sender: &Option<Sender<ProgressUpdate>>, update: ProgressUpdate) {
    if let Some(sender) = sender {
        let _ = sender.send(update).await;
    }
}
