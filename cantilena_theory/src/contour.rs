// Melodic contour shapes.
//
// A contour is a sequence of small non-negative integers, one per note. The
// melody generator subtracts 2 from each value and uses the result as a step
// through its pitch pool, so a value of 2 holds the current pitch, larger
// values climb and smaller values fall.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourShape {
    #[default]
    Wave,
    Ascending,
    Descending,
    Arch,
    Flat,
}

impl ContourShape {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "wave" => Some(ContourShape::Wave),
            "ascending" => Some(ContourShape::Ascending),
            "descending" => Some(ContourShape::Descending),
            "arch" => Some(ContourShape::Arch),
            "flat" => Some(ContourShape::Flat),
            _ => None,
        }
    }
}

/// Contour values for `len` notes.
pub fn melodic_contour(len: usize, shape: ContourShape) -> Vec<i32> {
    (0..len)
        .map(|i| match shape {
            ContourShape::Wave => (2.0 * (i as f64 * PI / 4.0).sin() + 2.0).round() as i32,
            ContourShape::Ascending => (i % 5) as i32,
            ContourShape::Descending => ((len - i) % 5) as i32,
            ContourShape::Arch => i.min(len - 1 - i) as i32,
            ContourShape::Flat => 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_values() {
        assert_eq!(
            melodic_contour(9, ContourShape::Wave),
            vec![2, 3, 4, 3, 2, 1, 0, 1, 2]
        );
    }

    #[test]
    fn test_linear_shapes() {
        assert_eq!(melodic_contour(6, ContourShape::Ascending), vec![0, 1, 2, 3, 4, 0]);
        assert_eq!(melodic_contour(6, ContourShape::Descending), vec![1, 0, 4, 3, 2, 1]);
        assert_eq!(melodic_contour(5, ContourShape::Arch), vec![0, 1, 2, 1, 0]);
        assert_eq!(melodic_contour(3, ContourShape::Flat), vec![0, 0, 0]);
    }

    #[test]
    fn test_empty_contour() {
        for shape in [
            ContourShape::Wave,
            ContourShape::Ascending,
            ContourShape::Descending,
            ContourShape::Arch,
            ContourShape::Flat,
        ] {
            assert!(melodic_contour(0, shape).is_empty());
        }
    }

    #[test]
    fn test_parse_shape() {
        assert_eq!(ContourShape::parse("Arch"), Some(ContourShape::Arch));
        assert_eq!(ContourShape::parse("zigzag"), None);
    }
}
