// SoundFont discovery.
//
// The search list is data, not behavior: `default_soundfont_candidates`
// produces the usual install locations with `~` expanded against the given
// home directory, and `discover_soundfont` picks the first that exists. The
// caller injects the result into the mixer configuration.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

const COMMON_SOUNDFONTS: [&str; 7] = [
    "/usr/share/sounds/sf2/FluidR3_GM.sf2",
    "/usr/share/soundfonts/FluidR3_GM.sf2",
    "/usr/share/sounds/sf2/default.sf2",
    "~/.fluidsynth/default_sound_font.sf2",
    "C:/soundfonts/FluidR3_GM.sf2",
    "/usr/local/share/fluidsynth/FluidR3_GM.sf2",
    "/opt/homebrew/share/fluidsynth/FluidR3_GM.sf2",
];

/// Expand a leading `~` against `home`. Without a home the path is returned
/// unchanged.
pub fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Usual SoundFont install locations.
pub fn default_soundfont_candidates(home: Option<&Path>) -> Vec<PathBuf> {
    COMMON_SOUNDFONTS
        .iter()
        .map(|path| expand_home(path, home))
        .collect()
}

/// First candidate that is an existing file.
pub fn discover_soundfont(candidates: &[PathBuf]) -> Option<PathBuf> {
    let found = candidates.iter().find(|path| path.is_file()).cloned();
    match &found {
        Some(path) => info!(path = %path.display(), "Found soundfont"),
        None => warn!(
            searched = candidates.len(),
            "No soundfont found; MIDI rendering will fail"
        ),
    }
    found
}
