// Two-track mixing.
//
// `mix` is the whole pipeline for already-decoded tracks: mono conversion,
// length matching (zero padding), per-track gain, sum, then either peak
// normalization to a target level or a plain clip guard.

use crate::buffer::{RawAudio, normalize_to_mono_float};
use crate::error::MixError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Peaks below this are treated as silence and never rescaled.
const SILENCE_PEAK: f64 = 1e-10;

/// How two tracks of different length are brought to the same length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthMode {
    /// Zero-pad the shorter track at the end.
    #[default]
    Pad,
    /// Cut both tracks to the shorter length.
    Truncate,
}

/// Largest absolute sample value, 0.0 for an empty slice.
pub fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0f64, |acc, &s| acc.max(s.abs()))
}

pub fn match_lengths(mut a: Vec<f64>, mut b: Vec<f64>, mode: LengthMode) -> (Vec<f64>, Vec<f64>) {
    debug!(a = a.len(), b = b.len(), ?mode, "matching track lengths");
    if a.len() == b.len() {
        return (a, b);
    }
    match mode {
        LengthMode::Pad => {
            let target = a.len().max(b.len());
            a.resize(target, 0.0);
            b.resize(target, 0.0);
        }
        LengthMode::Truncate => {
            let target = a.len().min(b.len());
            a.truncate(target);
            b.truncate(target);
        }
    }
    (a, b)
}

/// Scale so the peak sits at `target_db` dBFS. Silent input is returned as is.
pub fn normalize_peak(mut samples: Vec<f64>, target_db: f64) -> Vec<f64> {
    let current = peak(&samples);
    if current < SILENCE_PEAK {
        return samples;
    }
    let gain = 10f64.powf(target_db / 20.0) / current;
    for s in &mut samples {
        *s *= gain;
    }
    samples
}

/// Mix two tracks of any shape and format, zero-padding the shorter one.
///
/// With `normalize` the result peaks at `target_db`; without it the result is
/// only scaled down when it would clip.
pub fn mix(
    a: &RawAudio,
    b: &RawAudio,
    volume_a: f64,
    volume_b: f64,
    normalize: bool,
    target_db: f64,
) -> Result<Vec<f64>, MixError> {
    mix_with_mode(a, b, volume_a, volume_b, normalize, target_db, LengthMode::Pad)
}

/// `mix` with an explicit length-matching mode.
pub fn mix_with_mode(
    a: &RawAudio,
    b: &RawAudio,
    volume_a: f64,
    volume_b: f64,
    normalize: bool,
    target_db: f64,
    mode: LengthMode,
) -> Result<Vec<f64>, MixError> {
    let a = normalize_to_mono_float(a)?;
    let b = normalize_to_mono_float(b)?;
    let (a, b) = match_lengths(a, b, mode);

    let mixed: Vec<f64> = a
        .iter()
        .zip(&b)
        .map(|(x, y)| x * volume_a + y * volume_b)
        .collect();

    let out = if normalize {
        normalize_peak(mixed, target_db)
    } else {
        let current = peak(&mixed);
        if current > 1.0 {
            mixed.into_iter().map(|s| s / current).collect()
        } else {
            mixed
        }
    };
    debug!(samples = out.len(), "mixed output ready");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SampleData;

    const SR: usize = 44_100;

    #[test]
    fn test_pad_three_and_five_seconds() {
        let three = vec![0.25; 3 * SR];
        let five = vec![0.5; 5 * SR];
        let (a, b) = match_lengths(three, five, LengthMode::Pad);
        assert_eq!(a.len(), 220_500);
        assert_eq!(b.len(), 220_500);
        assert!(a[3 * SR..].iter().all(|&s| s == 0.0), "padded tail must be silent");
        assert_eq!(a[3 * SR - 1], 0.25);
    }

    #[test]
    fn test_truncate_mode() {
        let (a, b) = match_lengths(vec![1.0; 10], vec![2.0; 4], LengthMode::Truncate);
        assert_eq!((a.len(), b.len()), (4, 4));
    }

    #[test]
    fn test_equal_lengths_untouched() {
        let a = vec![0.1, 0.2, 0.3];
        let b = vec![-0.1, -0.2, -0.3];
        for mode in [LengthMode::Pad, LengthMode::Truncate] {
            let (x, y) = match_lengths(a.clone(), b.clone(), mode);
            assert_eq!(x, a);
            assert_eq!(y, b);
        }
    }

    #[test]
    fn test_normalize_peak_hits_target() {
        let out = normalize_peak(vec![0.1, -0.4, 0.2], -3.0);
        let target = 10f64.powf(-3.0 / 20.0);
        assert!((peak(&out) - target).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_silence_unchanged() {
        let quiet = vec![0.0, 1e-12, -1e-12];
        assert_eq!(normalize_peak(quiet.clone(), -3.0), quiet);
        assert!(normalize_peak(Vec::new(), -3.0).is_empty());
    }

    #[test]
    fn test_mix_normalized_peak_within_target() {
        let a = RawAudio::mono_f64((0..1000).map(|i| (i as f64 * 0.05).sin()).collect());
        let b = RawAudio::mono_f64((0..700).map(|i| (i as f64 * 0.11).cos() * 0.8).collect());
        let out = mix(&a, &b, 0.9, 0.4, true, -3.0).unwrap();
        assert_eq!(out.len(), 1000);
        assert!(peak(&out) <= 10f64.powf(-3.0 / 20.0) + 1e-9);
    }

    #[test]
    fn test_mix_without_normalize_only_guards_clipping() {
        let a = RawAudio::mono_f64(vec![0.2, 0.1]);
        let b = RawAudio::mono_f64(vec![0.2, 0.1]);
        assert_eq!(mix(&a, &b, 1.0, 1.0, false, -3.0).unwrap(), vec![0.4, 0.2]);

        let loud = RawAudio::mono_f64(vec![0.9, -0.3]);
        let out = mix(&loud, &loud, 1.0, 1.0, false, -3.0).unwrap();
        assert!((peak(&out) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mix_truncating() {
        let a = RawAudio::mono_f64(vec![0.1; 8]);
        let b = RawAudio::mono_f64(vec![0.1; 5]);
        let out = mix_with_mode(&a, &b, 1.0, 1.0, false, -3.0, LengthMode::Truncate).unwrap();
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_mix_stereo_and_int16() {
        let stereo = RawAudio::interleaved(SampleData::F32(vec![0.5, 0.5, 0.5, 0.5]), 2);
        let vocal = RawAudio::mono(SampleData::I16(vec![16384, 16384, 16384]));
        let out = mix(&stereo, &vocal, 1.0, 1.0, false, -3.0).unwrap();
        assert_eq!(out, vec![1.0, 1.0, 0.5]);
    }
}
