//! Тесты конвейера на фейковом синтезаторе
//!
//! Синтезатор возвращает WAV с длительностью, пропорциональной длине
//! текста, и посимвольные метки времени. Частоты совпадают с частотой
//! выходного файла, поэтому смещения можно проверять точно.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use futures::StreamExt;
use tempfile::{tempdir, TempDir};
use tokio::sync::mpsc;

use crate::config::{MusicSelection, PipelineConfig, SynthesisMode};
use crate::error::{PodcastError, Result};
use crate::media::audio::encode_wav_bytes;
use crate::media::timeline::PieceKind;
use crate::media::{ArtifactStore, MusicSlot};
use crate::progress::ProgressUpdate;
use crate::speaker::{Gender, Role, Speaker};
use crate::tts::{AudioChunkStream, CharacterAlignment, Synthesizer, TimestampedAudio};
use crate::PodcastPipeline;

const RATE: u32 = 8000;
const SECONDS_PER_CHAR: f64 = 0.02;
const EPS: f64 = 1e-6;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Синтезатор, который «озвучивает» текст тишиной по 20 мс на символ
struct FakeSynthesizer {
    sample_rate: u32,
    calls: Mutex<Vec<(String, String)>>,
    /// Задержка ответа в зависимости от номера вызова
    delays_ms: Vec<u64>,
}

impl FakeSynthesizer {
    fn new() -> Self {
        Self::with_rate(RATE)
    }

    fn with_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            calls: Mutex::new(Vec::new()),
            delays_ms: Vec::new(),
        }
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Synthesizer for FakeSynthesizer {
    async fn with_timestamps(&self, voice_id: &str, _model_id: &str, text: &str) -> Result<TimestampedAudio> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((voice_id.to_string(), text.to_string()));
            calls.len() - 1
        };
        if let Some(delay) = self.delays_ms.get(index) {
            tokio::time::sleep(Duration::from_millis(*delay)).await;
        }

        let chars: Vec<String> = text.chars().map(|c| c.to_string()).collect();
        let per_char = (SECONDS_PER_CHAR * self.sample_rate as f64) as usize;
        let wav = encode_wav_bytes(&vec![0.1; chars.len() * per_char], self.sample_rate)?;

        let starts = (0..chars.len()).map(|i| i as f64 * SECONDS_PER_CHAR).collect();
        let ends = (0..chars.len()).map(|i| (i + 1) as f64 * SECONDS_PER_CHAR).collect();
        Ok(TimestampedAudio {
            audio_base64: general_purpose::STANDARD.encode(wav),
            alignment: Some(CharacterAlignment {
                characters: chars,
                character_start_times_seconds: starts,
                character_end_times_seconds: ends,
            }),
        })
    }
}

/// Синтезатор, который отдаёт пустой поток
struct SilentSynthesizer;

#[async_trait]
impl Synthesizer for SilentSynthesizer {
    async fn stream(&self, _voice_id: &str, _model_id: &str, _text: &str) -> Result<AudioChunkStream> {
        Ok(futures::stream::empty().boxed())
    }
}

/// Синтезатор, который умеет только поток: WAV режется на куски по 100 байт
struct ChunkedStreamSynthesizer {
    calls: Mutex<usize>,
}

#[async_trait]
impl Synthesizer for ChunkedStreamSynthesizer {
    async fn stream(&self, _voice_id: &str, _model_id: &str, text: &str) -> Result<AudioChunkStream> {
        *self.calls.lock().unwrap() += 1;
        let per_char = (SECONDS_PER_CHAR * RATE as f64) as usize;
        let wav = encode_wav_bytes(&vec![0.1; text.chars().count() * per_char], RATE)?;
        let chunks: Vec<Result<Bytes>> = wav.chunks(100).map(|c| Ok(Bytes::copy_from_slice(c))).collect();
        Ok(futures::stream::iter(chunks).boxed())
    }
}

/// Синтезатор, который падает на втором вызове
struct FlakySynthesizer {
    inner: FakeSynthesizer,
}

#[async_trait]
impl Synthesizer for FlakySynthesizer {
    async fn with_timestamps(&self, voice_id: &str, model_id: &str, text: &str) -> Result<TimestampedAudio> {
        if self.inner.calls().len() == 1 {
            return Err(PodcastError::Synthesis("ElevenLabs API error (401): invalid api key".to_string()));
        }
        self.inner.with_timestamps(voice_id, model_id, text).await
    }
}

fn write_clip(dir: &Path, name: &str, seconds: f64) {
    let samples = vec![0.3; (seconds * RATE as f64) as usize];
    std::fs::write(dir.join(name), encode_wav_bytes(&samples, RATE).unwrap()).unwrap();
}

fn music_dir() -> TempDir {
    let dir = tempdir().unwrap();
    write_clip(dir.path(), "intro.wav", 0.25);
    write_clip(dir.path(), "body.wav", 0.5);
    write_clip(dir.path(), "outro.wav", 0.75);
    dir
}

fn config(music: &Path) -> PipelineConfig {
    PipelineConfig {
        output_sample_rate: RATE,
        music_dir: music.to_path_buf(),
        music: MusicSelection {
            intro: Some("intro.wav".to_string()),
            body: Some("body.wav".to_string()),
            outro: Some("outro.wav".to_string()),
        },
        ..PipelineConfig::default()
    }
}

fn host_and_guest() -> Vec<Speaker> {
    vec![
        Speaker::new("Host", Gender::Male, Role::Host).with_voice("v1"),
        Speaker::new("Guest", Gender::Female, Role::Guest).with_voice("v2"),
    ]
}

fn drain(rx: &mut mpsc::Receiver<ProgressUpdate>) -> Vec<ProgressUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}

#[tokio::test]
async fn test_round_trip_script() {
    init_logger();
    let music = music_dir();
    let synth = Arc::new(FakeSynthesizer::new());
    let pipeline = PodcastPipeline::new(config(music.path()), synth.clone()).unwrap();

    let timeline = pipeline
        .synthesize("Host: Hello there\n[music]\nGuest: Hi back", &host_and_guest())
        .await
        .unwrap();

    assert_eq!(
        synth.calls(),
        vec![
            ("v1".to_string(), "Hello there".to_string()),
            ("v2".to_string(), "Hi back".to_string()),
        ]
    );

    let words: Vec<(&str, &str)> = timeline
        .words
        .iter()
        .map(|w| (w.word.as_str(), w.speaker.as_str()))
        .collect();
    assert_eq!(
        words,
        vec![("Hello", "Host"), ("there", "Host"), ("Hi", "Guest"), ("back", "Guest")]
    );

    // 0.5 тишины, 0.22 речи, 0.25 заставки, 0.14 речи
    assert!((timeline.words[0].start_seconds - 0.5).abs() < EPS);
    assert!((timeline.words[1].start_seconds - 0.62).abs() < EPS);
    assert!((timeline.words[2].start_seconds - 0.97).abs() < EPS);
    assert!((timeline.duration_seconds - 1.11).abs() < EPS);
    assert_eq!(timeline.pieces.len(), 3);
}

#[tokio::test]
async fn test_offsets_accumulate_over_pieces() {
    init_logger();
    let music = tempdir().unwrap();
    let synth = Arc::new(FakeSynthesizer::new());
    let pipeline = PodcastPipeline::new(config(music.path()), synth).unwrap();

    let timeline = pipeline
        .synthesize("Host: one\nGuest: three\nHost: seven", &host_and_guest())
        .await
        .unwrap();

    let d: Vec<f64> = ["one", "three", "seven"]
        .iter()
        .map(|t| t.len() as f64 * SECONDS_PER_CHAR)
        .collect();
    let s = 0.5;
    let expected = [s, s + d[0], s + d[0] + d[1]];

    assert_eq!(timeline.words.len(), 3);
    for (word, offset) in timeline.words.iter().zip(expected.iter()) {
        assert!((word.start_seconds - offset).abs() < EPS, "{:?} vs {}", word, offset);
    }
    assert!((timeline.duration_seconds - (s + d.iter().sum::<f64>())).abs() < EPS);

    let mut previous = 0.0;
    for word in &timeline.words {
        assert!(word.start_seconds >= previous);
        assert!(word.end_seconds >= word.start_seconds);
        previous = word.start_seconds;
    }
}

#[tokio::test]
async fn test_music_markers_map_to_slots() {
    init_logger();
    let music = music_dir();
    let (tx, mut rx) = mpsc::channel(64);
    let pipeline = PodcastPipeline::new(config(music.path()), Arc::new(FakeSynthesizer::new()))
        .unwrap()
        .with_progress(tx);

    let script = "[music]\nHost: Welcome\n[MUSIC]\nGuest: Thanks\n[music]\nHost: Bye\n[music]";
    let timeline = pipeline.synthesize(script, &host_and_guest()).await.unwrap();

    let slots: Vec<MusicSlot> = timeline
        .pieces
        .iter()
        .filter_map(|p| match &p.kind {
            PieceKind::Music { slot } => Some(*slot),
            PieceKind::Speech { .. } => None,
        })
        .collect();
    assert_eq!(
        slots,
        vec![MusicSlot::Intro, MusicSlot::Body, MusicSlot::Body, MusicSlot::Outro]
    );

    // Первое слово после заставки
    assert!((timeline.words[0].start_seconds - 0.75).abs() < EPS);

    let updates = drain(&mut rx);
    assert_eq!(updates.first(), Some(&ProgressUpdate::Started));
    assert_eq!(updates.last(), Some(&ProgressUpdate::Finished));
    assert!(updates.contains(&ProgressUpdate::Synthesizing { current: 3, total: 3 }));
    assert!(updates.contains(&ProgressUpdate::InsertingMusic { slot: MusicSlot::Outro }));
}

#[tokio::test]
async fn test_missing_music_is_skipped() {
    init_logger();
    let empty = tempdir().unwrap();
    let pipeline = PodcastPipeline::new(config(empty.path()), Arc::new(FakeSynthesizer::new())).unwrap();

    let timeline = pipeline
        .synthesize("[music]\nHost: Hello\n[music]", &host_and_guest())
        .await
        .unwrap();

    assert_eq!(timeline.pieces.len(), 1);
    assert!((timeline.words[0].start_seconds - 0.5).abs() < EPS);
}

#[tokio::test]
async fn test_single_voice_collapse() {
    init_logger();
    let music = tempdir().unwrap();
    let synth = Arc::new(FakeSynthesizer::new());
    let pipeline = PodcastPipeline::new(config(music.path()), synth.clone()).unwrap();
    let speakers = vec![
        Speaker::new("Host", Gender::Male, Role::Host),
        Speaker::new("Guest", Gender::Female, Role::Guest),
    ];

    let timeline = pipeline
        .synthesize("Host: Hello\nGuest: Hi\n[music]\nHost: Bye", &speakers)
        .await
        .unwrap();

    let calls = synth.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1, "Hello Hi");
    assert_eq!(calls[1].1, "Bye");
    assert!(calls.iter().all(|(voice, _)| voice == crate::config::FALLBACK_VOICE_ID));

    let speakers: Vec<&str> = timeline.words.iter().map(|w| w.speaker.as_str()).collect();
    assert_eq!(speakers, vec!["Host", "Guest", "Host"]);
}

#[tokio::test]
async fn test_collapse_can_be_disabled() {
    let music = tempdir().unwrap();
    let synth = Arc::new(FakeSynthesizer::new());
    let mut cfg = config(music.path());
    cfg.collapse_single_voice = false;
    let pipeline = PodcastPipeline::new(cfg, synth.clone()).unwrap();
    let speakers = vec![Speaker::new("Host", Gender::Male, Role::Host)];

    pipeline.synthesize("Host: Hello\nHost: Again", &speakers).await.unwrap();
    assert_eq!(synth.calls().len(), 2);
}

#[tokio::test]
async fn test_input_errors_skip_synthesis() {
    let music = tempdir().unwrap();
    let synth = Arc::new(FakeSynthesizer::new());
    let pipeline = PodcastPipeline::new(config(music.path()), synth.clone()).unwrap();

    let empty = pipeline.synthesize("  \n ", &host_and_guest()).await;
    assert!(matches!(empty, Err(PodcastError::EmptyScript)));

    let cues_only = pipeline.synthesize("Host: [laughs]\n[music]", &host_and_guest()).await;
    assert!(matches!(cues_only, Err(PodcastError::EmptyText)));

    assert!(synth.calls().is_empty());
}

#[tokio::test]
async fn test_zero_audio_is_nothing_to_synthesize() {
    let music = tempdir().unwrap();
    let mut cfg = config(music.path());
    cfg.synthesis_mode = SynthesisMode::Streaming;
    let pipeline = PodcastPipeline::new(cfg, Arc::new(SilentSynthesizer)).unwrap();

    let result = pipeline.synthesize("Host: Hello\nGuest: Hi", &host_and_guest()).await;
    match result {
        Err(e) => {
            assert!(matches!(e, PodcastError::NothingToSynthesize));
            assert_eq!(e.to_string(), "no audio data generated");
        }
        Ok(_) => panic!("expected nothing to synthesize"),
    }
}

#[tokio::test]
async fn test_streaming_mode_assembles_without_word_timings() {
    init_logger();
    let music = tempdir().unwrap();
    let mut cfg = config(music.path());
    cfg.synthesis_mode = SynthesisMode::Streaming;
    let synth = Arc::new(ChunkedStreamSynthesizer { calls: Mutex::new(0) });
    let pipeline = PodcastPipeline::new(cfg, synth.clone()).unwrap();

    let timeline = pipeline
        .synthesize("Host: Hello there\nGuest: Hi back", &host_and_guest())
        .await
        .unwrap();

    assert_eq!(*synth.calls.lock().unwrap(), 2);
    assert!(timeline.words.is_empty());
    assert_eq!(timeline.pieces.len(), 2);
    assert!((timeline.pieces[0].offset_seconds - 0.5).abs() < EPS);
    assert!((timeline.pieces[1].offset_seconds - 0.72).abs() < EPS);
    assert!((timeline.duration_seconds - 0.86).abs() < EPS);
    assert_eq!(timeline.samples.len(), 4000 + 1760 + 1120);
    assert!(timeline.samples[..4000].iter().all(|s| *s == 0.0));
    assert!((timeline.samples[4000] - 0.1).abs() < 1e-6);
}

#[tokio::test]
async fn test_synthesis_failure_writes_no_artifacts() {
    let music = tempdir().unwrap();
    let output = tempdir().unwrap();
    let mut cfg = config(music.path());
    cfg.output_dir = output.path().to_path_buf();

    let synth = Arc::new(FlakySynthesizer {
        inner: FakeSynthesizer::new(),
    });
    let pipeline = PodcastPipeline::new(cfg, synth).unwrap();

    let result = pipeline
        .synthesize_to_artifacts("user", "Host: one\nGuest: two\nHost: three", &host_and_guest())
        .await;
    match result {
        Err(PodcastError::Synthesis(message)) => assert!(message.contains("invalid api key")),
        other => panic!("expected synthesis error, got {:?}", other.map(|_| ())),
    }
    assert!(ArtifactStore::new(output.path()).last_artifacts("user").is_none());
}

#[tokio::test]
async fn test_artifacts_written_on_success() {
    let music = music_dir();
    let output = tempdir().unwrap();
    let mut cfg = config(music.path());
    cfg.output_dir = output.path().to_path_buf();
    let (tx, mut rx) = mpsc::channel(64);
    let pipeline = PodcastPipeline::new(cfg, Arc::new(FakeSynthesizer::new()))
        .unwrap()
        .with_progress(tx);

    let (timeline, artifacts) = pipeline
        .synthesize_to_artifacts("user", "Host: Hello\n[music]", &host_and_guest())
        .await
        .unwrap();

    let store = ArtifactStore::new(output.path());
    assert_eq!(store.last_artifacts("user"), Some(artifacts));
    let record = store.load_timeline("user").unwrap().unwrap();
    let saved: Vec<&str> = record.words.iter().map(|w| w.word.as_str()).collect();
    assert_eq!(saved, vec!["Hello"]);
    assert!((record.duration_seconds - timeline.duration_seconds).abs() < EPS);

    let updates = drain(&mut rx);
    let tail = &updates[updates.len() - 2..];
    assert_eq!(tail, &[ProgressUpdate::Exporting, ProgressUpdate::Finished]);
}

#[tokio::test]
async fn test_concurrent_requests_keep_order() {
    let music = tempdir().unwrap();
    let mut cfg = config(music.path());
    cfg.max_concurrent_requests = 3;
    let synth = Arc::new(FakeSynthesizer {
        delays_ms: vec![60, 30, 0],
        ..FakeSynthesizer::new()
    });
    let pipeline = PodcastPipeline::new(cfg, synth).unwrap();

    let timeline = pipeline
        .synthesize("Host: first\nGuest: second\nHost: third", &host_and_guest())
        .await
        .unwrap();

    let words: Vec<&str> = timeline.words.iter().map(|w| w.word.as_str()).collect();
    assert_eq!(words, vec!["first", "second", "third"]);
    assert!((timeline.words[2].start_seconds - (0.5 + 11.0 * SECONDS_PER_CHAR)).abs() < EPS);
}

#[tokio::test]
async fn test_speech_is_resampled_to_output_rate() {
    let music = tempdir().unwrap();
    let pipeline = PodcastPipeline::new(config(music.path()), Arc::new(FakeSynthesizer::with_rate(16000))).unwrap();

    let timeline = pipeline.synthesize("Host: Hello", &host_and_guest()).await.unwrap();

    assert_eq!(timeline.sample_rate, RATE);
    assert!((timeline.duration_seconds - (0.5 + 5.0 * SECONDS_PER_CHAR)).abs() < 1e-3);
}

#[tokio::test]
async fn test_segment_cache_resumes_after_failure() {
    let music = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let mut cfg = config(music.path());
    cfg.use_segment_cache = true;
    cfg.cache_dir = Some(cache.path().to_path_buf());
    let script = "Host: one\nGuest: two";

    let flaky = Arc::new(FlakySynthesizer {
        inner: FakeSynthesizer::new(),
    });
    let failed = PodcastPipeline::new(cfg.clone(), flaky.clone())
        .unwrap()
        .synthesize(script, &host_and_guest())
        .await;
    assert!(failed.is_err());
    assert_eq!(flaky.inner.calls().len(), 1);

    // Повторный запрос берёт первый сегмент из кэша
    let synth = Arc::new(FakeSynthesizer::new());
    PodcastPipeline::new(cfg, synth.clone())
        .unwrap()
        .synthesize(script, &host_and_guest())
        .await
        .unwrap();
    assert_eq!(synth.calls(), vec![("v2".to_string(), "two".to_string())]);
}

#[test]
fn test_invalid_config_is_rejected() {
    let cfg = PipelineConfig {
        max_concurrent_requests: 0,
        ..PipelineConfig::default()
    };
    assert!(matches!(
        PodcastPipeline::new(cfg, Arc::new(SilentSynthesizer)),
        Err(PodcastError::Configuration(_))
    ));
}
