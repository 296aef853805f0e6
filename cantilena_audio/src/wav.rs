// WAV file I/O.

use crate::buffer::{RawAudio, SampleData};
use crate::error::MixError;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::{debug, info};

/// Read a WAV file as `[frames, channels]` audio plus its sample rate.
pub fn read_wav(path: &Path) -> Result<(RawAudio, u32), MixError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;
    let data = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => {
            SampleData::F32(reader.samples::<f32>().collect::<Result<_, _>>()?)
        }
        (SampleFormat::Int, 8) => SampleData::U8(
            reader
                .samples::<i8>()
                .map(|s| s.map(|v| (v as i16 + 128) as u8))
                .collect::<Result<_, _>>()?,
        ),
        (SampleFormat::Int, 16) => {
            SampleData::I16(reader.samples::<i16>().collect::<Result<_, _>>()?)
        }
        (SampleFormat::Int, bits) => {
            // 24-bit and 32-bit both come back as i32 at their native width;
            // shift 24-bit up so full scale matches i32.
            let shift = 32u32.saturating_sub(bits as u32);
            SampleData::I32(
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v << shift))
                    .collect::<Result<_, _>>()?,
            )
        }
    };
    debug!(
        path = %path.display(),
        channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        "read WAV"
    );
    Ok((RawAudio::interleaved(data, channels), spec.sample_rate))
}

/// Write mono samples as 16-bit PCM, creating parent directories. Samples
/// are clamped to [-1, 1].
pub fn write_wav(path: &Path, samples: &[f64], sample_rate: u32) -> Result<(), MixError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * 32767.0).round() as i16)?;
    }
    writer.finalize()?;
    info!(
        path = %path.display(),
        samples = samples.len(),
        sample_rate,
        "saved audio"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::normalize_to_mono_float;

    #[test]
    fn test_write_then_read_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.wav");
        write_wav(&path, &[0.0, 0.5, -0.5, 1.5], 22_050).unwrap();

        let (audio, rate) = read_wav(&path).unwrap();
        assert_eq!(rate, 22_050);
        assert_eq!(audio.shape, vec![4, 1]);
        let mono = normalize_to_mono_float(&audio).unwrap();
        assert!((mono[1] - 0.5).abs() < 1e-3);
        assert!((mono[3] - 32767.0 / 32768.0).abs() < 1e-9, "clamped to full scale");
    }

    #[test]
    fn test_read_stereo_float() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for frame in [[0.25f32, 0.75], [-0.5, -0.5], [0.0, 1.0]] {
            writer.write_sample(frame[0]).unwrap();
            writer.write_sample(frame[1]).unwrap();
        }
        writer.finalize().unwrap();

        let (audio, _) = read_wav(&path).unwrap();
        assert_eq!(audio.shape, vec![3, 2]);
        let mono = normalize_to_mono_float(&audio).unwrap();
        assert_eq!(mono, vec![0.5, -0.5, 0.5]);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(read_wav(Path::new("/definitely/not/here.wav")).is_err());
    }
}
