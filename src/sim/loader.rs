/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels_dir/<name>` on disk
///   2. Built-in embedded levels (same names)
///
/// ## Format (`.toml`):
///   ```toml
///   height = 400.0
///   width = 2000.0
///   floor_height = 360.0
///   target_seconds = 30
///   hero_x = 40.0
///   hero_size = "normal"
///
///   [[entities]]
///   kind = "slime"
///   x = 600.0
///   y = 340.0
///   strategy = "patrol"
///   speed = 1.0
///   range = 80.0
///   ```
///
/// Entity kinds: `platform`, `mushroom`, `slime`, `flag`, `cloud`.
/// A negative `target_seconds` falls back to 30; non-positive width or
/// height rejects the level.

use std::collections::HashMap;
use std::path::PathBuf;

use log::{debug, warn};
use serde::Deserialize;

use crate::domain::actors::{Cloud, Flag, Mushroom, Platform, Slime};
use crate::domain::ai::{Strategy, StrategyKind};
use crate::domain::entity::Entity;
use crate::domain::hero::HeroSize;
use crate::error::LevelError;
use crate::sim::level::{Level, LevelMeta, DEFAULT_TARGET_SECONDS};

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct LevelDescription {
    pub height: f64,
    pub width: f64,
    pub floor_height: f64,
    #[serde(default = "default_target_seconds")]
    pub target_seconds: i64,
    pub hero_x: f64,
    #[serde(default = "default_hero_size")]
    pub hero_size: String,
    #[serde(default)]
    pub entities: Vec<EntityDescription>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityDescription {
    Platform { x: f64, y: f64, width: f64, height: f64 },
    Mushroom { x: f64, y: f64 },
    Slime {
        x: f64,
        y: f64,
        #[serde(default)]
        start_left: bool,
        #[serde(default)]
        strategy: StrategyKind,
        #[serde(default = "default_slime_speed")]
        speed: f64,
        #[serde(default = "default_slime_range")]
        range: f64,
    },
    Flag { x: f64, y: f64 },
    Cloud {
        x: f64,
        y: f64,
        #[serde(default = "default_cloud_speed")]
        speed: f64,
    },
}

fn default_target_seconds() -> i64 { DEFAULT_TARGET_SECONDS as i64 }
fn default_hero_size() -> String { "normal".into() }
fn default_slime_speed() -> f64 { 1.0 }
fn default_slime_range() -> f64 { 60.0 }
fn default_cloud_speed() -> f64 { 0.3 }

/// Source of level descriptions, addressed by name.
pub trait LevelLoader {
    fn load(&self, name: &str) -> Result<LevelDescription, LevelError>;
}

/// Parse and validate one level file.
pub fn parse_level(name: &str, text: &str) -> Result<LevelDescription, LevelError> {
    let desc: LevelDescription = toml::from_str(text).map_err(|source| LevelError::Parse {
        name: name.to_string(),
        source,
    })?;
    if desc.width <= 0.0 || desc.height <= 0.0 {
        return Err(LevelError::InvalidDimensions { name: name.to_string() });
    }
    Ok(desc)
}

/// Build a fully wired level from its description.
pub fn build_level(source: &str, desc: &LevelDescription) -> Level {
    let target_seconds = match u64::try_from(desc.target_seconds) {
        Ok(n) => n,
        Err(_) => {
            warn!(
                "{source}: negative target_seconds {}, using {DEFAULT_TARGET_SECONDS}",
                desc.target_seconds
            );
            DEFAULT_TARGET_SECONDS
        }
    };

    let meta = LevelMeta {
        source: source.to_string(),
        height: desc.height,
        width: desc.width,
        floor_height: desc.floor_height,
        hero_x: desc.hero_x,
        hero_size: HeroSize::from_tag(&desc.hero_size),
        target_seconds,
    };

    let entities: Vec<Box<dyn Entity>> = desc.entities.iter().map(build_entity).collect();
    debug!("{source}: built {} entities", entities.len());
    Level::new(meta, entities)
}

fn build_entity(desc: &EntityDescription) -> Box<dyn Entity> {
    match *desc {
        EntityDescription::Platform { x, y, width, height } => Box::new(Platform::new(x, y, width, height)),
        EntityDescription::Mushroom { x, y } => Box::new(Mushroom::new(x, y)),
        EntityDescription::Slime { x, y, start_left, strategy, speed, range } => {
            Box::new(Slime::new(x, y, start_left, Strategy::from_kind(strategy, speed, range)))
        }
        EntityDescription::Flag { x, y } => Box::new(Flag::new(x, y)),
        EntityDescription::Cloud { x, y, speed } => Box::new(Cloud::new(x, y, speed)),
    }
}

// ── Loaders ──

/// Reads `<dir>/<name>`, falling back to the embedded level of that name.
#[derive(Clone, Debug)]
pub struct FileLevelLoader {
    dir: PathBuf,
}

impl FileLevelLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileLevelLoader { dir: dir.into() }
    }
}

impl LevelLoader for FileLevelLoader {
    fn load(&self, name: &str) -> Result<LevelDescription, LevelError> {
        let path = self.dir.join(name);
        if path.is_file() {
            let text = std::fs::read_to_string(&path)
                .map_err(|source| LevelError::Read { path: path.clone(), source })?;
            debug!("loading level {}", path.display());
            return parse_level(name, &text);
        }
        match embedded_level(name) {
            Some(text) => {
                debug!("loading embedded level {name}");
                parse_level(name, text)
            }
            None => Err(LevelError::NotFound { name: name.to_string() }),
        }
    }
}

/// Levels held as text in memory, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct MemoryLevelLoader {
    levels: HashMap<String, String>,
}

impl MemoryLevelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, name: &str, text: &str) -> Self {
        self.levels.insert(name.to_string(), text.to_string());
        self
    }
}

impl LevelLoader for MemoryLevelLoader {
    fn load(&self, name: &str) -> Result<LevelDescription, LevelError> {
        let text = self
            .levels
            .get(name)
            .ok_or_else(|| LevelError::NotFound { name: name.to_string() })?;
        parse_level(name, text)
    }
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

const EMBEDDED: &[(&str, &str)] = &[
    ("level1.toml", include_str!("../../levels/level1.toml")),
    ("level2.toml", include_str!("../../levels/level2.toml")),
    ("level3.toml", include_str!("../../levels/level3.toml")),
];

fn embedded_level(name: &str) -> Option<&'static str> {
    EMBEDDED.iter().find(|(n, _)| *n == name).map(|(_, text)| *text)
}
