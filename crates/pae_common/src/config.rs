//! PAE Quest configuration.
//!
//! Config file: --config path, $PAE_CONFIG, ~/.config/pae-quest/config.toml
//! or /etc/pae-quest/config.toml, first one found wins.

use crate::achievements::AchievementCatalog;
use crate::error::{PaeError, PaeResult};
use crate::protein::ProteinCatalog;
use crate::question_client::QuestionServiceConfig;
use crate::settings::{Audience, Difficulty, GameMode, MapType};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Largest grid the UI and daemon accept
pub const MAX_GRID_SIZE: usize = 64;

/// Reject grid sizes outside `1..=MAX_GRID_SIZE`
pub fn check_grid_size(size: usize) -> PaeResult<()> {
    if size == 0 || size > MAX_GRID_SIZE {
        return Err(PaeError::InvalidInput(format!(
            "Grid size must be between 1 and {}",
            MAX_GRID_SIZE
        )));
    }
    Ok(())
}

/// Initial game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameDefaults {
    pub protein: String,
    pub map_type: MapType,
    pub grid_size: usize,
    pub difficulty: Difficulty,
    pub audience: Audience,
    pub game_mode: GameMode,
}

impl Default for GameDefaults {
    fn default() -> Self {
        Self {
            protein: "p1".to_string(),
            map_type: MapType::Full,
            grid_size: 5,
            difficulty: Difficulty::Beginner,
            audience: Audience::Elementary,
            game_mode: GameMode::Challenge,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Progress directory; the user data directory when unset
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:7870".to_string(),
        }
    }
}

/// Optional replacement catalogs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON protein catalog
    pub proteins_path: Option<PathBuf>,
    /// TOML achievement catalog
    pub achievements_path: Option<PathBuf>,
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub game: GameDefaults,
    pub question_service: QuestionServiceConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
}

impl GameConfig {
    /// ~/.config/pae-quest/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("pae-quest").join("config.toml"))
    }

    /// /etc/pae-quest/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/pae-quest/config.toml")
    }

    /// First config file in lookup order, if any.
    ///
    /// An explicit path is returned even if it does not exist, so that
    /// loading reports it.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(env_path) = std::env::var("PAE_CONFIG") {
            if !env_path.is_empty() {
                return Some(PathBuf::from(env_path));
            }
        }
        if let Some(user) = Self::user_config_path() {
            if user.exists() {
                return Some(user);
            }
        }
        let system = Self::system_config_path();
        system.exists().then_some(system)
    }

    /// Load, apply environment overrides and validate
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_path(explicit) {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Apply PAE_QUESTION_ENDPOINT and PAE_DATA_DIR from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("PAE_QUESTION_ENDPOINT").filter(|v| !v.is_empty()) {
            self.question_service.endpoint = endpoint;
        }
        if let Some(dir) = lookup("PAE_DATA_DIR").filter(|v| !v.is_empty()) {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> Result<(), PaeError> {
        if self.game.grid_size == 0 || self.game.grid_size > MAX_GRID_SIZE {
            return Err(PaeError::Config(format!(
                "game.grid_size must be between 1 and {}, got {}",
                MAX_GRID_SIZE, self.game.grid_size
            )));
        }
        if self.question_service.timeout_secs == 0 {
            return Err(PaeError::Config(
                "question_service.timeout_secs must be positive".to_string(),
            ));
        }
        if self.question_service.quiz_length == 0 {
            return Err(PaeError::Config(
                "question_service.quiz_length must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Configured protein catalog, or the built-in one
    pub fn protein_catalog(&self) -> Result<ProteinCatalog> {
        match &self.catalog.proteins_path {
            Some(path) => ProteinCatalog::from_path(path)
                .with_context(|| format!("Failed to load protein catalog {}", path.display())),
            None => Ok(ProteinCatalog::builtin()?),
        }
    }

    /// Configured achievement catalog, or the default one
    pub fn achievement_catalog(&self) -> Result<AchievementCatalog> {
        match &self.catalog.achievements_path {
            Some(path) => AchievementCatalog::from_path(path)
                .with_context(|| format!("Failed to load achievement catalog {}", path.display())),
            None => Ok(AchievementCatalog::default()),
        }
    }

    /// Progress directory: configured, or ~/.local/share/pae-quest
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|d| d.join("pae-quest"))
                .context("Cannot determine user data directory"),
        }
    }
}
