/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::lattice::{DEFAULT_SPACING, FACE_TOLERANCE};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct CubeConfig {
    pub animation: AnimationConfig,
    pub detector: DetectorConfig,
    pub scramble_length: usize,
    /// Empty = logging disabled.
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct AnimationConfig {
    pub turn_duration_ms: u64,
    pub tick_rate_ms: u64,
    pub spacing: f32,    // cublet edge + gap
}

#[derive(Clone, Debug)]
pub struct DetectorConfig {
    pub poll_interval_ms: u64,
    pub grace_ms: u64,       // idle time before an unmarked batch counts as done
    pub failsafe_ms: u64,    // no activity at all for this long forces completion
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    animation: TomlAnimation,
    #[serde(default)]
    detector: TomlDetector,
    #[serde(default)]
    scramble: TomlScramble,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlAnimation {
    #[serde(default = "default_turn_duration")]
    turn_duration_ms: u64,
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_spacing")]
    spacing: f32,
}

#[derive(Deserialize, Debug)]
struct TomlDetector {
    #[serde(default = "default_poll_interval")]
    poll_interval_ms: u64,
    #[serde(default = "default_grace")]
    grace_ms: u64,
    #[serde(default = "default_failsafe")]
    failsafe_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlScramble {
    #[serde(default = "default_scramble_length")]
    length: usize,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    log_file: String,
}

// ── Defaults ──

fn default_turn_duration() -> u64 { 500 }
fn default_tick_rate() -> u64 { 16 }       // ~60 updates per second
fn default_spacing() -> f32 { DEFAULT_SPACING }
fn default_poll_interval() -> u64 { 300 }
fn default_grace() -> u64 { 1500 }
fn default_failsafe() -> u64 { 15_000 }
fn default_scramble_length() -> usize { 20 }

impl Default for TomlAnimation {
    fn default() -> Self {
        TomlAnimation {
            turn_duration_ms: default_turn_duration(),
            tick_rate_ms: default_tick_rate(),
            spacing: default_spacing(),
        }
    }
}

impl Default for TomlDetector {
    fn default() -> Self {
        TomlDetector {
            poll_interval_ms: default_poll_interval(),
            grace_ms: default_grace(),
            failsafe_ms: default_failsafe(),
        }
    }
}

impl Default for TomlScramble {
    fn default() -> Self {
        TomlScramble { length: default_scramble_length() }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { log_file: String::new() }
    }
}

impl From<TomlConfig> for CubeConfig {
    fn from(t: TomlConfig) -> Self {
        // Below twice the face tolerance the middle layer falls inside the
        // face band and the visual check can never agree with the lattice.
        let spacing = if t.animation.spacing >= 2.0 * FACE_TOLERANCE { t.animation.spacing } else { default_spacing() };
        let poll_interval_ms = t.detector.poll_interval_ms.max(1);
        // A single turn produces no activity between its start and its settle.
        let failsafe_ms = t.detector.failsafe_ms
            .max(t.detector.grace_ms)
            .max(t.animation.turn_duration_ms + poll_interval_ms);
        CubeConfig {
            animation: AnimationConfig {
                turn_duration_ms: t.animation.turn_duration_ms,
                tick_rate_ms: t.animation.tick_rate_ms.max(1),
                spacing,
            },
            detector: DetectorConfig {
                poll_interval_ms,
                grace_ms: t.detector.grace_ms,
                failsafe_ms,
            },
            scramble_length: t.scramble.length,
            log_file: (!t.general.log_file.is_empty()).then(|| PathBuf::from(t.general.log_file)),
        }
    }
}

impl Default for CubeConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

// ── Loading ──

impl CubeConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        load_toml(&candidate_dirs()).into()
    }

    /// Parse config text directly. Errors fall back to defaults.
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Self {
        parse_toml(text).into()
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text),
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str) -> TomlConfig {
    toml::from_str::<TomlConfig>(text).unwrap_or_else(|e| {
        eprintln!("Warning: config.toml parse error: {e}");
        eprintln!("Using default settings.");
        TomlConfig::default()
    })
}
