//! # Audio Format Handling
//!
//! Декодирование ответов синтезатора и музыкальных файлов в PCM,
//! передискретизация к общей частоте и запись итогового WAV.

use std::fs;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, warn};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{PodcastError, Result};

/// Размер блока для ресэмплера
const RESAMPLE_CHUNK: usize = 1024;

/// Моно PCM с частотой дискретизации
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl PcmAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    /// Тишина заданной длительности
    pub fn silence(duration_ms: u32, sample_rate: u32) -> Self {
        let count = (sample_rate as u64 * duration_ms as u64 / 1000) as usize;
        Self::new(vec![0.0; count], sample_rate)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Длительность в секундах
    pub fn duration_seconds(&self) -> f64 {
        duration_in_seconds(self.samples.len(), self.sample_rate)
    }
}

/// Вычисляет длительность аудио в секундах
pub fn duration_in_seconds(sample_count: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    sample_count as f64 / sample_rate as f64
}

/// Сводит чередующиеся каналы к моно
fn downmix_interleaved(samples: &[f32], channels: usize, output: &mut Vec<f32>) {
    if channels <= 1 {
        output.extend_from_slice(samples);
        return;
    }
    for frame in samples.chunks(channels) {
        output.push(frame.iter().sum::<f32>() / frame.len() as f32);
    }
}

/// Декодирует аудио из памяти.
///
/// WAV читается через hound, остальные форматы (MP3, AAC) через Symphonia.
/// `extension` служит подсказкой для определения формата.
pub fn decode_audio_bytes(data: &[u8], extension: Option<&str>) -> Result<PcmAudio> {
    if data.is_empty() {
        return Err(PodcastError::AudioProcessing("Audio payload is empty".to_string()));
    }
    if data.starts_with(b"RIFF") {
        return decode_wav(Cursor::new(data));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(data.to_vec())), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| PodcastError::AudioProcessing(format!("Failed to probe audio format: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PodcastError::AudioProcessing("No audio track found".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PodcastError::AudioProcessing(format!("Failed to create decoder: {}", e)))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut pcm_data = Vec::new();

    while let Ok(packet) = format.next_packet() {
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                if sample_rate.is_none() {
                    sample_rate = Some(spec.rate);
                }

                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                downmix_interleaved(sample_buf.samples(), spec.channels.count(), &mut pcm_data);
            }
            Err(e) => {
                // Пропускаем проблемный пакет и продолжаем
                warn!("Failed to decode audio packet: {}", e);
                continue;
            }
        }
    }

    let sample_rate = sample_rate
        .ok_or_else(|| PodcastError::AudioProcessing("Unknown sample rate".to_string()))?;
    debug!("Decoded {} samples at {} Hz", pcm_data.len(), sample_rate);
    Ok(PcmAudio::new(pcm_data, sample_rate))
}

/// Декодирует аудиофайл; формат определяется по расширению
pub fn decode_audio_file<P: AsRef<Path>>(file_path: P) -> Result<PcmAudio> {
    let file_path = file_path.as_ref();
    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    let data = fs::read(file_path)?;
    let audio = decode_audio_bytes(&data, Some(extension.as_str()).filter(|e| !e.is_empty()))?;
    debug!("Decoded audio file {} ({:.2}s)", file_path.display(), audio.duration_seconds());
    Ok(audio)
}

/// Декодирует WAV (8/16/24/32 бит, целые и с плавающей точкой)
fn decode_wav<R: Read>(reader: R) -> Result<PcmAudio> {
    let mut reader = WavReader::new(reader)?;
    let spec = reader.spec();

    let pcm_data: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, bits @ 8..=32) => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
        _ => {
            return Err(PodcastError::AudioProcessing(format!(
                "Unsupported WAV format: {:?}, {} bits",
                spec.sample_format, spec.bits_per_sample
            )));
        }
    };

    let mut mono = Vec::with_capacity(pcm_data.len() / spec.channels.max(1) as usize);
    downmix_interleaved(&pcm_data, spec.channels as usize, &mut mono);
    Ok(PcmAudio::new(mono, spec.sample_rate))
}

/// Передискретизация к заданной частоте (Rubato, sinc-интерполяция)
pub fn resample(audio: PcmAudio, target_rate: u32) -> Result<PcmAudio> {
    if target_rate == 0 {
        return Err(PodcastError::AudioProcessing("Target sample rate is zero".to_string()));
    }
    if audio.sample_rate == target_rate || audio.samples.is_empty() {
        return Ok(PcmAudio::new(audio.samples, target_rate));
    }

    let ratio = target_rate as f64 / audio.sample_rate as f64;
    let expected = (audio.samples.len() as f64 * ratio).round() as usize;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, RESAMPLE_CHUNK, 1)
        .map_err(|e| PodcastError::AudioProcessing(format!("Failed to init resampler: {}", e)))?;

    // Задержка sinc-фильтра в кадрах выхода
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected + delay + RESAMPLE_CHUNK);
    let mut chunks = audio.samples.chunks_exact(RESAMPLE_CHUNK);
    for chunk in &mut chunks {
        let frames = resampler
            .process(&[chunk], None)
            .map_err(|e| PodcastError::AudioProcessing(format!("Resampling failed: {}", e)))?;
        output.extend_from_slice(&frames[0]);
    }

    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        let frames = resampler
            .process_partial(Some(&[remainder][..]), None)
            .map_err(|e| PodcastError::AudioProcessing(format!("Resampling failed: {}", e)))?;
        output.extend_from_slice(&frames[0]);
    }

    // Досливаем хвост фильтра, пока не наберём ожидаемую длину
    for _ in 0..8 {
        if output.len() >= expected + delay {
            break;
        }
        let frames = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| PodcastError::AudioProcessing(format!("Resampling failed: {}", e)))?;
        if frames[0].is_empty() {
            break;
        }
        output.extend_from_slice(&frames[0]);
    }

    output.drain(..delay.min(output.len()));
    output.resize(expected, 0.0);
    debug!(
        "Resampled {} -> {} samples ({} Hz -> {} Hz)",
        audio.samples.len(),
        output.len(),
        audio.sample_rate,
        target_rate
    );
    Ok(PcmAudio::new(output, target_rate))
}

/// Кодирует моно PCM в WAV (32 бита, с плавающей точкой)
pub fn write_wav<W: Write + Seek>(writer: W, pcm_data: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::new(writer, spec)?;
    for &sample in pcm_data {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Кодирует моно PCM в WAV в памяти
pub fn encode_wav_bytes(pcm_data: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    write_wav(&mut cursor, pcm_data, sample_rate)?;
    Ok(cursor.into_inner())
}
