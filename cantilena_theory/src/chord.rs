// Chord names and voicings for the backing track.
//
// Chord symbols arrive as free text from the suggestion service ("Am",
// "G7", "Fmaj7", "Csus4"). Parsing is deliberately narrow: a root with an
// optional accidental, then one of a fixed set of quality suffixes. Anything
// else parses to None and the accompaniment writer plays a bar of rest.

use crate::pitch::PitchClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Major7,
    Minor7,
    Sus2,
    Sus4,
}

impl ChordQuality {
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "" | "maj" | "M" => ChordQuality::Major,
            "m" | "min" | "-" => ChordQuality::Minor,
            "dim" | "o" => ChordQuality::Diminished,
            "aug" | "+" => ChordQuality::Augmented,
            "7" | "dom7" => ChordQuality::Dominant7,
            "maj7" | "M7" => ChordQuality::Major7,
            "m7" | "min7" => ChordQuality::Minor7,
            "sus2" => ChordQuality::Sus2,
            "sus4" | "sus" => ChordQuality::Sus4,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub root: PitchClass,
    pub quality: ChordQuality,
}

impl Chord {
    /// Parse a chord symbol such as "C", "F#m", "Bbmaj7" or "Gsus4".
    pub fn parse(symbol: &str) -> Option<Self> {
        let symbol = symbol.trim();
        let mut root_len = symbol.chars().next()?.len_utf8();
        if matches!(symbol[root_len..].chars().next(), Some('#' | 'b')) {
            root_len += 1;
        }
        let root = PitchClass::parse(&symbol[..root_len])?;
        let quality = ChordQuality::from_suffix(&symbol[root_len..])?;
        Some(Chord { root, quality })
    }

    /// MIDI number of the root in `octave` (C4 = 60).
    pub fn root_midi(self, octave: u8) -> u8 {
        (octave + 1) * 12 + self.root.index()
    }

    /// Closed-position voicing stacked up from the root in `octave`.
    pub fn voicing(self, octave: u8) -> Vec<u8> {
        let root = self.root_midi(octave);
        self.quality
            .intervals()
            .iter()
            .map(|&step| root + step)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_symbols() {
        assert_eq!(
            Chord::parse("Am"),
            Some(Chord { root: PitchClass::A, quality: ChordQuality::Minor })
        );
        assert_eq!(
            Chord::parse("Bbmaj7"),
            Some(Chord { root: PitchClass::As, quality: ChordQuality::Major7 })
        );
        assert_eq!(
            Chord::parse("G7"),
            Some(Chord { root: PitchClass::G, quality: ChordQuality::Dominant7 })
        );
        assert_eq!(
            Chord::parse("F#dim"),
            Some(Chord { root: PitchClass::Fs, quality: ChordQuality::Diminished })
        );
    }

    #[test]
    fn test_parse_rejects_junk() {
        assert_eq!(Chord::parse(""), None);
        assert_eq!(Chord::parse("Xm"), None);
        assert_eq!(Chord::parse("Cadd9"), None);
        assert_eq!(Chord::parse("和弦"), None);
    }

    #[test]
    fn test_voicing() {
        let c = Chord::parse("C").unwrap();
        assert_eq!(c.voicing(4), vec![60, 64, 67]);
        let am7 = Chord::parse("Am7").unwrap();
        assert_eq!(am7.voicing(4), vec![69, 72, 76, 79]);
        assert_eq!(am7.root_midi(2), 45);
    }
}
