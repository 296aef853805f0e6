// Audio buffers of arbitrary shape and sample format.
//
// `RawAudio` is a flat row-major buffer plus a shape, the way array
// libraries hand audio around: `[samples]`, `[frames, channels]`,
// `[channels, frames]`, or occasionally something deeper that has to be
// flattened. `normalize_to_mono_float` is the one entry point that turns any
// of these into mono f64 in [-1, 1].

use crate::error::MixError;
use crate::mix::peak;
use tracing::{debug, warn};

/// Sample storage. Integer formats carry their native range.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    U8(Vec<u8>),
}

impl SampleData {
    pub fn len(&self) -> usize {
        match self {
            SampleData::F32(v) => v.len(),
            SampleData::F64(v) => v.len(),
            SampleData::I16(v) => v.len(),
            SampleData::I32(v) => v.len(),
            SampleData::U8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn format_name(&self) -> &'static str {
        match self {
            SampleData::F32(_) => "f32",
            SampleData::F64(_) => "f64",
            SampleData::I16(_) => "i16",
            SampleData::I32(_) => "i32",
            SampleData::U8(_) => "u8",
        }
    }

    /// Convert to f64. Integer formats are scaled by their full-scale
    /// magnitude (u8 is unsigned and centered on 128).
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            SampleData::F32(v) => v.iter().map(|&s| s as f64).collect(),
            SampleData::F64(v) => v.clone(),
            SampleData::I16(v) => v.iter().map(|&s| s as f64 / 32768.0).collect(),
            SampleData::I32(v) => v.iter().map(|&s| s as f64 / 2_147_483_648.0).collect(),
            SampleData::U8(v) => v.iter().map(|&s| (s as f64 - 128.0) / 128.0).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawAudio {
    pub data: SampleData,
    pub shape: Vec<usize>,
}

impl RawAudio {
    /// One-dimensional buffer.
    pub fn mono(data: SampleData) -> Self {
        let len = data.len();
        Self {
            data,
            shape: vec![len],
        }
    }

    pub fn mono_f64(samples: Vec<f64>) -> Self {
        Self::mono(SampleData::F64(samples))
    }

    /// Interleaved frames, shape `[frames, channels]`.
    pub fn interleaved(data: SampleData, channels: usize) -> Self {
        let channels = channels.max(1);
        let frames = data.len() / channels;
        Self {
            data,
            shape: vec![frames, channels],
        }
    }
}

/// Average a row-major `[rows, cols]` buffer across `axis` (0 averages each
/// column over rows, 1 averages each row over columns).
fn mean_over_axis(values: &[f64], rows: usize, cols: usize, axis: usize) -> Vec<f64> {
    if axis == 0 {
        (0..cols)
            .map(|c| (0..rows).map(|r| values[r * cols + c]).sum::<f64>() / rows as f64)
            .collect()
    } else {
        values
            .chunks(cols)
            .map(|row| row.iter().sum::<f64>() / cols as f64)
            .collect()
    }
}

/// Bring any buffer to mono f64 in [-1, 1].
///
/// More than two dimensions: flattened. Two dimensions: averaged across the
/// axis of length 2 (the first such axis), otherwise across the smaller axis.
/// After format conversion, a peak above 1.0 is treated as unscaled integer
/// data: above 32767 divide by 32768, otherwise divide by the peak.
pub fn normalize_to_mono_float(audio: &RawAudio) -> Result<Vec<f64>, MixError> {
    let len = audio.data.len();
    let expected: usize = audio.shape.iter().product();
    if audio.shape.is_empty() || expected != len {
        return Err(MixError::ShapeMismatch {
            shape: audio.shape.clone(),
            len,
        });
    }
    debug!(
        shape = ?audio.shape,
        format = audio.data.format_name(),
        "normalizing audio to mono float"
    );

    let values = audio.data.to_f64();
    let mut mono = match audio.shape.as_slice() {
        [rows, cols] => {
            let (rows, cols) = (*rows, *cols);
            if rows == 0 || cols == 0 {
                Vec::new()
            } else if rows == 2 {
                mean_over_axis(&values, rows, cols, 0)
            } else if cols == 2 {
                mean_over_axis(&values, rows, cols, 1)
            } else if rows < cols {
                mean_over_axis(&values, rows, cols, 0)
            } else {
                mean_over_axis(&values, rows, cols, 1)
            }
        }
        dims if dims.len() > 2 => {
            warn!(dims = dims.len(), "audio has more than 2 dimensions, flattening");
            values
        }
        _ => values,
    };

    let max = peak(&mono);
    if max > 1.0 {
        let divisor = if max > 32767.0 { 32768.0 } else { max };
        for sample in &mut mono {
            *sample /= divisor;
        }
    }
    debug!(samples = mono.len(), "mono audio ready");
    Ok(mono)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_float_passthrough() {
        let audio = RawAudio::mono_f64(vec![0.0, 0.5, -0.25]);
        assert_eq!(normalize_to_mono_float(&audio).unwrap(), vec![0.0, 0.5, -0.25]);
    }

    #[test]
    fn test_two_rows_treated_as_channels_first() {
        let audio = RawAudio {
            data: SampleData::F64(vec![0.2, 0.4, -1.0, 0.0]),
            shape: vec![2, 2],
        };
        // A 2x2 buffer is ambiguous; the first axis is taken as channels.
        let mono = normalize_to_mono_float(&audio).unwrap();
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - (-0.4)).abs() < 1e-12);
        assert!((mono[1] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_frames_by_two_channels() {
        let audio = RawAudio::interleaved(SampleData::F32(vec![0.5, 0.5, 0.0, 1.0, -0.5, -0.5]), 2);
        assert_eq!(audio.shape, vec![3, 2]);
        let mono = normalize_to_mono_float(&audio).unwrap();
        assert_eq!(mono, vec![0.5, 0.5, -0.5]);
    }

    #[test]
    fn test_channels_first_multichannel() {
        // 3 channels x 4 frames: smaller axis is 0.
        let audio = RawAudio {
            data: SampleData::F64(vec![
                0.3, 0.3, 0.3, 0.3, //
                0.0, 0.0, 0.0, 0.0, //
                -0.3, -0.3, -0.3, 0.6,
            ]),
            shape: vec![3, 4],
        };
        let mono = normalize_to_mono_float(&audio).unwrap();
        assert_eq!(mono.len(), 4);
        assert!(mono[0].abs() < 1e-12);
        assert!((mono[3] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_int16_scaled_to_unit_range() {
        let audio = RawAudio::mono(SampleData::I16(vec![i16::MIN, 0, 16384]));
        let mono = normalize_to_mono_float(&audio).unwrap();
        assert_eq!(mono, vec![-1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_unscaled_float_pcm_divided() {
        let big = RawAudio::mono_f64(vec![32768.0, -16384.0]);
        assert_eq!(normalize_to_mono_float(&big).unwrap(), vec![1.0, -0.5]);
        let hot = RawAudio::mono_f64(vec![2.0, -1.0]);
        assert_eq!(normalize_to_mono_float(&hot).unwrap(), vec![1.0, -0.5]);
    }

    #[test]
    fn test_deep_shape_flattened() {
        let audio = RawAudio {
            data: SampleData::F64(vec![0.1; 8]),
            shape: vec![2, 2, 2],
        };
        assert_eq!(normalize_to_mono_float(&audio).unwrap().len(), 8);
    }

    #[test]
    fn test_shape_mismatch() {
        let audio = RawAudio {
            data: SampleData::F64(vec![0.0; 5]),
            shape: vec![2, 2],
        };
        assert!(matches!(
            normalize_to_mono_float(&audio),
            Err(MixError::ShapeMismatch { len: 5, .. })
        ));
    }
}
