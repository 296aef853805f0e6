// Sample-rate conversion.
//
// High-quality sinc resampling through rubato, fed in fixed-size chunks
// with the filter's output delay trimmed from the front and the tail flushed
// out with silence, then cut to the expected length. Any
// rubato failure drops to plain linear interpolation for the whole signal.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::{debug, warn};

const CHUNK_SIZE: usize = 4096;
/// Upper bound on zero chunks fed to drain the filter delay.
const MAX_FLUSHES: usize = 8;

/// Resample mono `samples` from `from_rate` to `to_rate`.
pub fn resample(samples: &[f64], from_rate: u32, to_rate: u32) -> Vec<f64> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }
    match resample_sinc(samples, from_rate, to_rate) {
        Ok(out) => out,
        Err(reason) => {
            warn!(%reason, "sinc resampling failed, falling back to linear");
            resample_linear(samples, from_rate, to_rate)
        }
    }
}

fn resample_sinc(samples: &[f64], from_rate: u32, to_rate: u32) -> Result<Vec<f64>, String> {
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = to_rate as f64 / from_rate as f64;
    let chunk_size = CHUNK_SIZE.min(samples.len());
    let mut resampler = SincFixedIn::<f64>::new(ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| format!("failed to create resampler: {e}"))?;

    let expected_len = (samples.len() as f64 * ratio).round() as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected_len + delay + chunk_size);
    let mut pos = 0;
    while pos + chunk_size <= samples.len() {
        let chunk = vec![samples[pos..pos + chunk_size].to_vec()];
        let out = resampler
            .process(chunk.as_slice(), None)
            .map_err(|e| e.to_string())?;
        if let Some(channel) = out.first() {
            output.extend_from_slice(channel);
        }
        pos += chunk_size;
    }

    if pos < samples.len() {
        let chunk = vec![samples[pos..].to_vec()];
        let out = resampler
            .process_partial(Some(chunk.as_slice()), None)
            .map_err(|e| e.to_string())?;
        if let Some(channel) = out.first() {
            output.extend_from_slice(channel);
        }
    }

    // Flush the filter until the delayed tail has come out.
    let mut flushes = 0;
    while output.len() < expected_len + delay && flushes < MAX_FLUSHES {
        let out = resampler
            .process_partial::<Vec<f64>>(None, None)
            .map_err(|e| e.to_string())?;
        match out.first() {
            Some(channel) if !channel.is_empty() => output.extend_from_slice(channel),
            _ => break,
        }
        flushes += 1;
    }

    // The first `delay` frames are filter latency, not signal.
    output.drain(..delay.min(output.len()));
    output.resize(expected_len, 0.0);
    debug!(from_rate, to_rate, input = samples.len(), output = output.len(), "resampled");
    Ok(output)
}

/// Linear interpolation resampler.
pub fn resample_linear(samples: &[f64], from_rate: u32, to_rate: u32) -> Vec<f64> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }
    let step = from_rate as f64 / to_rate as f64;
    let out_len = ((samples.len() as f64) / step).round().max(1.0) as usize;
    let last = samples.len() - 1;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let lo = (pos.floor() as usize).min(last);
            let hi = (lo + 1).min(last);
            let frac = pos - lo as f64;
            samples[lo] * (1.0 - frac) + samples[hi] * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_identity() {
        let s = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&s, 44_100, 44_100), s);
        assert_eq!(resample_linear(&s, 22_050, 22_050), s);
    }

    #[test]
    fn test_linear_halves_length() {
        let s: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let out = resample_linear(&s, 44_100, 22_050);
        assert_eq!(out.len(), 50);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[10], 20.0);
    }

    #[test]
    fn test_linear_upsample_interpolates() {
        let out = resample_linear(&[0.0, 1.0], 1, 2);
        assert_eq!(out.len(), 4);
        assert_eq!(out[1], 0.5);
    }

    #[test]
    fn test_sinc_output_length() {
        let s: Vec<f64> = (0..10_000)
            .map(|i| (i as f64 * 2.0 * std::f64::consts::PI * 440.0 / 44_100.0).sin() * 0.5)
            .collect();
        let out = resample(&s, 44_100, 24_000);
        let expected = (10_000f64 * 24_000.0 / 44_100.0).round() as usize;
        assert_eq!(out.len(), expected);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_sinc_keeps_timing() {
        // An impulse at input sample 1000 must land near output sample 2000
        // after doubling the rate, not a filter length later.
        let mut s = vec![0.0; 8_000];
        s[1_000] = 1.0;
        let out = resample(&s, 8_000, 16_000);
        assert_eq!(out.len(), 16_000);
        let (peak_at, _) = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .unwrap();
        assert!((1_998..=2_002).contains(&peak_at), "peak at {peak_at}");
    }

    #[test]
    fn test_sinc_keeps_tail() {
        // A constant signal is still sounding well into its last chunk.
        let s = vec![0.5; 5_000];
        let out = resample(&s, 16_000, 8_000);
        assert_eq!(out.len(), 2_500);
        assert!((out[2_250] - 0.5).abs() < 0.05, "tail was {}", out[2_250]);
    }
}
