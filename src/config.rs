/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// The one thing that cannot be defaulted away is an empty level list.

use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_LIVES: u32 = 3;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub game: GameSettings,
    pub speed: SpeedConfig,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSettings {
    pub lives: u32,
    /// Level sources in play order.
    pub level_files: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    #[serde(default = "default_lives")]
    lives: i64,
    #[serde(default = "default_level_files")]
    level_files: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_lives() -> i64 { DEFAULT_LIVES as i64 }
fn default_tick_rate() -> u64 { 16 }   // ~60 fps
fn default_levels_dir() -> String { "levels".into() }
fn default_level_files() -> Vec<String> {
    vec!["level1.toml".into(), "level2.toml".into(), "level3.toml".into()]
}

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame {
            lives: default_lives(),
            level_files: default_level_files(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    pub fn load() -> Result<Self, ConfigError> {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs)
    }

    /// Load from one explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        Self::resolve(parse_toml(&text), &[base])
    }

    /// Parse config text; relative `levels_dir` resolves against the CWD.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::resolve(parse_toml(text), &[])
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Result<Self, ConfigError> {
        let lives = match u32::try_from(toml_cfg.game.lives) {
            Ok(n) if n > 0 => n,
            _ => {
                warn!("invalid lives {}, using {DEFAULT_LIVES}", toml_cfg.game.lives);
                DEFAULT_LIVES
            }
        };

        let level_files: Vec<String> = toml_cfg
            .game
            .level_files
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        if level_files.is_empty() {
            return Err(ConfigError::NoLevels);
        }

        let tick_rate_ms = if toml_cfg.speed.tick_rate_ms == 0 {
            warn!("tick_rate_ms must be positive, using {}", default_tick_rate());
            default_tick_rate()
        } else {
            toml_cfg.speed.tick_rate_ms
        };

        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs
                .iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        Ok(GameConfig {
            game: GameSettings { lives, level_files },
            speed: SpeedConfig { tick_rate_ms },
            levels_dir,
        })
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            game: GameSettings {
                lives: DEFAULT_LIVES,
                level_files: default_level_files(),
            },
            speed: SpeedConfig {
                tick_rate_ms: default_tick_rate(),
            },
            levels_dir: PathBuf::from(default_levels_dir()),
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds data next to the real one.
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
                Err(source) => warn!("{}", ConfigError::Read { path, source }),
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("config.toml parse error: {e}; using default settings");
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.game.lives, 3);
        assert_eq!(cfg.game.level_files.len(), 3);
        assert_eq!(cfg.speed.tick_rate_ms, 16);
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
    }

    #[test]
    fn reads_every_section() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [game]
            lives = 5
            level_files = ["a.toml", "b.toml"]
            [speed]
            tick_rate_ms = 33
            [general]
            levels_dir = "/opt/stickrun/levels"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.game.lives, 5);
        assert_eq!(cfg.game.level_files, vec!["a.toml", "b.toml"]);
        assert_eq!(cfg.speed.tick_rate_ms, 33);
        assert_eq!(cfg.levels_dir, PathBuf::from("/opt/stickrun/levels"));
    }

    #[test]
    fn non_positive_lives_fall_back() {
        for lives in ["0", "-4"] {
            let cfg = GameConfig::from_toml_str(&format!("[game]\nlives = {lives}")).unwrap();
            assert_eq!(cfg.game.lives, DEFAULT_LIVES);
        }
    }

    #[test]
    fn empty_level_list_is_fatal() {
        let err = GameConfig::from_toml_str("[game]\nlevel_files = []").unwrap_err();
        assert!(matches!(err, ConfigError::NoLevels));

        let err = GameConfig::from_toml_str("[game]\nlevel_files = [\"  \"]").unwrap_err();
        assert!(matches!(err, ConfigError::NoLevels));
    }

    #[test]
    fn malformed_file_uses_defaults() {
        let cfg = GameConfig::from_toml_str("[game\nlives = ").unwrap();
        assert_eq!(cfg.game.lives, DEFAULT_LIVES);
    }

    #[test]
    fn load_from_resolves_levels_next_to_the_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("stages")).unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\nlevels_dir = \"stages\"").unwrap();

        let cfg = GameConfig::load_from(&path).unwrap();
        assert_eq!(cfg.levels_dir, dir.path().join("stages"));
    }

    #[test]
    fn load_from_missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GameConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
