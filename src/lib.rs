//! Основной файл библиотеки podcast-tts
//!
//! Библиотека превращает сгенерированный сценарий подкаста в одну
//! аудиодорожку с несколькими голосами, музыкальными вставками и
//! глобальной шкалой времени слов.
//!
//! Шаги конвейера: нормализация → (перераспределение реплик) → разбор на
//! сегменты → подбор голосов → синтез → вставка музыки → склейка.

pub mod config;
pub mod error;
pub mod progress;
pub mod speaker;
pub mod style;
pub mod script;
pub mod voice;
pub mod tts;
pub mod media;
pub mod producer;

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc::Sender;

pub use crate::config::{MusicSelection, PipelineConfig, SpeakerPolicy, SynthesisMode};
pub use crate::error::{PodcastError, Result};
pub use crate::media::{AudioTimeline, Artifacts, WordTiming};
pub use crate::progress::ProgressUpdate;
pub use crate::script::Segment;
pub use crate::speaker::{Gender, Role, Speaker};
pub use crate::tts::Synthesizer;
pub use crate::voice::VoiceMap;

use crate::media::audio::{decode_audio_bytes, resample};
use crate::media::{ArtifactStore, MusicInserter, MusicLibrary, SpeakerSpan, TimelineAssembler};
use crate::progress::send_progress;
use crate::script::{apply_speaker_policy, normalize_script, parse_segments, prepare_speech_text};
use crate::tts::{SegmentCache, SpeechSynthesisAdapter, SynthesizedSpeech};

/// Запрос к синтезатору: подготовленный текст одного или нескольких сегментов
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechJob {
    pub voice_id: String,
    pub text: String,
    /// Какие символы `text` принадлежат какому говорящему
    pub spans: Vec<SpeakerSpan>,
}

/// Шаг плана синтеза
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedStep {
    Speech(SpeechJob),
    Music,
}

/// Конвейер «сценарий → аудио»
pub struct PodcastPipeline {
    /// Конфигурация конвейера
    config: PipelineConfig,
    /// Внешний синтезатор речи
    synthesizer: Arc<dyn Synthesizer>,
    /// Канал для отправки прогресса
    progress_sender: Option<Sender<ProgressUpdate>>,
}

impl PodcastPipeline {
    /// Создать конвейер; конфигурация проверяется сразу
    pub fn new(config: PipelineConfig, synthesizer: Arc<dyn Synthesizer>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            synthesizer,
            progress_sender: None,
        })
    }

    /// Подключить канал прогресса
    pub fn with_progress(mut self, sender: Sender<ProgressUpdate>) -> Self {
        self.progress_sender = Some(sender);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Нормализовать сценарий, применить политику меток и разобрать на сегменты
    pub fn prepare_script(&self, script: &str, speakers: &[Speaker]) -> Result<Vec<Segment>> {
        if script.trim().is_empty() {
            return Err(PodcastError::EmptyScript);
        }
        let normalized = normalize_script(script);
        let labeled = apply_speaker_policy(&normalized, speakers, self.config.speaker_policy);
        Ok(parse_segments(&labeled))
    }

    /// Построить план запросов к синтезатору.
    ///
    /// Реплики с пустым после очистки текстом пропускаются. Если голос
    /// один и включено `collapse_single_voice`, подряд идущие реплики
    /// между музыкальными вставками объединяются в один запрос.
    pub fn plan(&self, segments: &[Segment], voices: &VoiceMap) -> Vec<PlannedStep> {
        let collapse = self.config.collapse_single_voice && voices.distinct_voice_count() <= 1;
        let mut steps: Vec<PlannedStep> = Vec::with_capacity(segments.len());

        for segment in segments {
            let (speaker, text) = match segment {
                Segment::Music => {
                    steps.push(PlannedStep::Music);
                    continue;
                }
                Segment::Speech { speaker, text } => (speaker, text),
            };

            let prepared = prepare_speech_text(text);
            if prepared.is_empty() {
                debug!("Skipping segment of {} with no speakable text", speaker);
                continue;
            }

            if collapse {
                if let Some(PlannedStep::Speech(job)) = steps.last_mut() {
                    let start = job.text.chars().count() + 1;
                    job.text.push(' ');
                    job.text.push_str(&prepared);
                    let end = job.text.chars().count();
                    job.spans.push(SpeakerSpan::new(speaker.as_str(), start, end));
                    continue;
                }
            }

            steps.push(PlannedStep::Speech(SpeechJob {
                voice_id: voices.voice_for(speaker).to_string(),
                spans: vec![SpeakerSpan::whole(speaker.as_str(), &prepared)],
                text: prepared,
            }));
        }

        steps
    }

    fn adapter(&self) -> Result<SpeechSynthesisAdapter> {
        let adapter = SpeechSynthesisAdapter::new(
            self.synthesizer.clone(),
            self.config.model_id.clone(),
            self.config.synthesis_mode,
        );
        if self.config.use_segment_cache {
            Ok(adapter.with_cache(SegmentCache::from_config(&self.config)?))
        } else {
            Ok(adapter)
        }
    }

    /// Синтезировать сценарий в одну дорожку со шкалой слов
    pub async fn synthesize(&self, script: &str, speakers: &[Speaker]) -> Result<AudioTimeline> {
        let timeline = self.build_timeline(script, speakers).await?;
        send_progress(&self.progress_sender, ProgressUpdate::Finished).await;
        Ok(timeline)
    }

    /// Синтезировать сценарий и записать артефакты сессии.
    ///
    /// Артефакты записываются только после полностью успешного синтеза.
    pub async fn synthesize_to_artifacts(
        &self,
        session: &str,
        script: &str,
        speakers: &[Speaker],
    ) -> Result<(AudioTimeline, Artifacts)> {
        let timeline = self.build_timeline(script, speakers).await?;

        send_progress(&self.progress_sender, ProgressUpdate::Exporting).await;
        let store = ArtifactStore::new(&self.config.output_dir);
        let artifacts = store.save(session, &timeline)?;

        send_progress(&self.progress_sender, ProgressUpdate::Finished).await;
        Ok((timeline, artifacts))
    }

    async fn build_timeline(&self, script: &str, speakers: &[Speaker]) -> Result<AudioTimeline> {
        info!("Starting podcast synthesis");
        send_progress(&self.progress_sender, ProgressUpdate::Started).await;

        // 1. Разбор сценария
        send_progress(&self.progress_sender, ProgressUpdate::Parsing).await;
        let segments = self.prepare_script(script, speakers)?;
        let voices = VoiceMap::resolve(speakers, self.config.effective_fallback_voice());
        let steps = self.plan(&segments, &voices);

        let jobs: Vec<&SpeechJob> = steps
            .iter()
            .filter_map(|step| match step {
                PlannedStep::Speech(job) => Some(job),
                PlannedStep::Music => None,
            })
            .collect();
        if jobs.is_empty() {
            return Err(PodcastError::EmptyText);
        }
        info!(
            "Parsed {} segments into {} synthesis requests",
            segments.len(),
            jobs.len()
        );

        // 2. Синтез речи; порядок результатов совпадает с порядком сегментов
        let speech = self.synthesize_jobs(&jobs).await?;

        // 3. Склейка речи и музыки
        send_progress(&self.progress_sender, ProgressUpdate::Assembling).await;
        let rate = self.config.output_sample_rate;
        let mut assembler = TimelineAssembler::new(rate, self.config.leading_silence_ms);
        let mut inserter = MusicInserter::new(
            MusicLibrary::new(&self.config.music_dir),
            self.config.music.clone(),
        );
        let mut speech = speech.into_iter();

        for step in &steps {
            match step {
                PlannedStep::Speech(job) => {
                    let Some(result) = speech.next() else {
                        break;
                    };
                    if result.audio.is_empty() {
                        warn!("Synthesizer returned no audio for a segment of {}", job.voice_id);
                        continue;
                    }
                    let pcm = resample(decode_audio_bytes(&result.audio, Some("mp3"))?, rate)?;
                    assembler.append_speech(&pcm, &job.spans, result.words.as_deref())?;
                }
                PlannedStep::Music => {
                    let (slot, clip) = inserter.load_next(rate);
                    send_progress(&self.progress_sender, ProgressUpdate::InsertingMusic { slot }).await;
                    if let Some(clip) = clip {
                        assembler.append_music(&clip.audio, slot)?;
                    }
                }
            }
        }

        assembler.finish()
    }

    async fn synthesize_jobs(&self, jobs: &[&SpeechJob]) -> Result<Vec<SynthesizedSpeech>> {
        let adapter = self.adapter()?;
        let total = jobs.len();
        let concurrency = self.config.max_concurrent_requests.max(1);

        // buffered() отдаёт результаты в исходном порядке
        let mut results = stream::iter(
            jobs.iter()
                .map(|job| adapter.synthesize_prepared(&job.text, &job.voice_id)),
        )
        .buffered(concurrency);

        let mut speech = Vec::with_capacity(total);
        while let Some(result) = results.next().await {
            let current = speech.len() + 1;
            let synthesized = result.map_err(|e| {
                log::error!("Synthesis failed on request {}/{}: {}", current, total, e);
                e
            })?;
            send_progress(
                &self.progress_sender,
                ProgressUpdate::Synthesizing { current, total },
            )
            .await;
            speech.push(synthesized);
        }
        Ok(speech)
    }
}

/// Синтезировать сценарий через ElevenLabs с заданной конфигурацией
pub async fn synthesize_podcast(
    config: PipelineConfig,
    script: &str,
    speakers: &[Speaker],
) -> Result<AudioTimeline> {
    let synthesizer = Arc::new(tts::ElevenLabsSynthesizer::from_config(&config)?);
    PodcastPipeline::new(config, synthesizer)?
        .synthesize(script, speakers)
        .await
}
