// Cantilena composer: CLI entry point.
//
// Turns lyrics into a melody, a MIDI score, a synthesized vocal and a final
// mix. The pipeline: analysis → melody → alignment gate → synthesizer input
// → MIDI → vocal → mix → metadata.
//
// Usage:
//   cargo run -p cantilena_song -- [--lyrics TEXT|FILE] [--title T]
//     [--output-dir DIR] [--config FILE] [--no-synthesis] [--no-midi]
//     [--no-mix] [--accompaniment] [--seed N] [--soundfont FILE]
//   cargo run -p cantilena_song -- --print-input --lyrics TEXT
//   cargo run -p cantilena_song -- --mix-only --midi-file M --vocal-file V
//
// Logging goes through tracing; set LOG_LEVEL (e.g. `debug`) to change the
// filter.

use anyhow::{Context, Result, bail};
use cantilena_song::{ComposeOptions, Composer, ComposerConfig, MixLevels, Song, safe_title};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_LYRICS: &str = "小酒窝长睫毛是你最美的记号";

#[derive(Parser, Debug)]
#[clap(about = "Compose a song from lyrics")]
struct CliArgs {
    /// Lyrics text, or a path to a file containing them.
    #[clap(long)]
    pub lyrics: Option<String>,

    /// Song title, used for output file names.
    #[clap(long, default_value = "MySong")]
    pub title: String,

    /// Output directory (overrides the config file).
    #[clap(long)]
    pub output_dir: Option<PathBuf>,

    /// JSON config file.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Skip vocal synthesis.
    #[clap(long)]
    pub no_synthesis: bool,

    /// Skip MIDI export.
    #[clap(long)]
    pub no_midi: bool,

    /// Skip the final mix.
    #[clap(long)]
    pub no_mix: bool,

    /// Backing track volume in the final mix.
    #[clap(long, default_value_t = 0.9)]
    pub melody_volume: f64,

    /// Vocal volume in the final mix.
    #[clap(long, default_value_t = 0.4)]
    pub vocal_volume: f64,

    /// SoundFont used to render the backing track.
    #[clap(long)]
    pub soundfont: Option<PathBuf>,

    /// Seed for the rule-based melody fallback.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Add drum, bass and chord tracks to the MIDI file.
    #[clap(long)]
    pub accompaniment: bool,

    /// Print the synthesizer input as JSON and exit.
    #[clap(long)]
    pub print_input: bool,

    /// Only mix an existing MIDI file and vocal WAV.
    #[clap(long)]
    pub mix_only: bool,

    #[clap(long)]
    pub midi_file: Option<PathBuf>,

    #[clap(long)]
    pub vocal_file: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("LOG_LEVEL")
        .from_env_lossy();
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init();
}

fn load_config(cli_args: &CliArgs) -> Result<ComposerConfig> {
    let mut config = match &cli_args.config {
        Some(path) => ComposerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ComposerConfig::default(),
    };
    config.apply_env_overrides(|name| std::env::var(name).ok());

    if let Some(dir) = &cli_args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(seed) = cli_args.seed {
        config.melody.seed = Some(seed);
    }
    if cli_args.accompaniment {
        config.accompaniment = true;
    }
    Ok(config)
}

/// `--lyrics` names a file when one exists at that path.
fn read_lyrics(arg: Option<&str>) -> Result<String> {
    match arg {
        None => {
            println!("No lyrics given, using the demo lyrics.");
            Ok(DEMO_LYRICS.to_string())
        }
        Some(value) if Path::new(value).is_file() => std::fs::read_to_string(value)
            .with_context(|| format!("Failed to read lyrics file {value}")),
        Some(value) => Ok(value.to_string()),
    }
}

fn print_summary(song: &Song) {
    println!();
    println!("=== {} ===", song.title);
    println!("Stage: {}", song.stage);
    if let Some(analysis) = &song.analysis {
        println!(
            "Language: {}, key {}, {} BPM, {}, {}",
            analysis.language.name(),
            analysis.suggested_key,
            analysis.suggested_tempo,
            analysis.emotional_tone.name(),
            analysis.suggested_style.name(),
        );
    }
    if let Some(melody) = &song.melody {
        println!(
            "Melody: {} words, {} notes, {:.1}s",
            melody.word_notes.len(),
            melody.note_count(),
            melody.total_duration()
        );
    }
    let outputs = [
        ("MIDI", &song.midi_path),
        ("Vocal", &song.vocal_audio_path),
        ("Final mix", &song.final_audio_path),
        ("Metadata", &song.metadata_path),
    ];
    for (label, path) in outputs {
        match path {
            Some(p) => println!("  {label}: {}", p.display()),
            None => println!("  {label}: -"),
        }
    }
    for failure in &song.failures {
        println!("  Failed ({}): {}", failure.stage, failure.message);
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli_args = CliArgs::parse();
    let config = load_config(&cli_args)?;
    let levels = MixLevels {
        melody_volume: cli_args.melody_volume,
        vocal_volume: cli_args.vocal_volume,
    };

    println!("=== Cantilena Composer ===");
    println!("Output: {}", config.output_dir.display());
    if let Some(seed) = config.melody.seed {
        println!("Seed: {}", seed);
    }
    println!();

    println!("[1/4] Setting up components...");
    let composer = Composer::from_config(config, cli_args.soundfont.clone());

    if cli_args.mix_only {
        let (Some(midi), Some(vocal)) = (&cli_args.midi_file, &cli_args.vocal_file) else {
            bail!("--mix-only needs both --midi-file and --vocal-file");
        };
        let output = composer
            .config()
            .output_dir
            .join(format!("{}_final.wav", safe_title(&cli_args.title)));
        println!("[2/4] Mixing {} with {}...", midi.display(), vocal.display());
        let path = composer
            .mix_existing(midi, vocal, &output, levels)
            .context("Mixing failed")?;
        println!("Final mix: {}", path.display());
        return Ok(());
    }

    println!("[2/4] Reading lyrics...");
    let lyrics = read_lyrics(cli_args.lyrics.as_deref())?;
    println!("  {} characters.", lyrics.chars().count());

    if cli_args.print_input {
        println!("[3/4] Preparing synthesizer input...");
        let input = composer.prepare_synth_input(&lyrics)?;
        println!("[4/4] Synthesizer input ({} units):", input.unit_count());
        println!("{}", serde_json::to_string_pretty(&input.to_payload())?);
        return Ok(());
    }

    let options = ComposeOptions {
        synthesize: !cli_args.no_synthesis,
        export_midi: !cli_args.no_midi,
        create_final_mix: !cli_args.no_mix,
        accompaniment: composer.config().accompaniment,
        levels,
    };
    println!("[3/4] Composing \"{}\"...", cli_args.title);
    let song = composer
        .compose(&lyrics, &cli_args.title, &options)
        .context("Composition failed")?;

    println!("[4/4] Done.");
    print_summary(&song);
    Ok(())
}
