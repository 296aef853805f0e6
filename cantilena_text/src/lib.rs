// Cantilena lyric text processing.
//
// Turns raw lyrics into the ordered list of lyric units a melody is aligned
// to. A lyric unit is one Chinese character or one estimated English
// syllable; every later stage counts units, so the functions here are the
// single source of truth for "how many notes does this line need".
//
// Architecture:
// - language.rs: `Language` tag and CJK-ratio language detection
// - normalize.rs: NFKC cleaning and line splitting
// - tokenize.rs: Per-language unit tokenizers and the English syllable
//   heuristic
// - structure.rs: `SyllableInfo` / `LineAnalysis` and `analyze_structure`,
//   which assigns global indices, stress levels and line/word-end flags
//
// Everything here is pure and deterministic.

pub mod language;
pub mod normalize;
pub mod structure;
pub mod tokenize;

pub use language::{Language, detect_language};
pub use normalize::{clean_lyrics, split_into_lines};
pub use structure::{LineAnalysis, SyllableInfo, analyze_structure};
pub use tokenize::{estimate_syllables, tokenize_chinese, tokenize_english, tokenize_lyrics};
