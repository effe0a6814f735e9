use crate::ollama::GenerationOptions;
use crate::reveal::RevealRate;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MIN_ANIMATION_SPEED: f64 = 10.0;
pub const MAX_ANIMATION_SPEED: f64 = 100.0;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    /// Explicit backend executable; searched before PATH.
    #[serde(default)]
    pub ollama_binary: Option<PathBuf>,
    #[serde(default)]
    pub conversations_dir: Option<PathBuf>,
    #[serde(default = "default_animation_speed")]
    pub animation_speed: f64,
    #[serde(default)]
    pub generation: GenerationOptions,
}

/// Immutable copy of the tunables a single submission runs with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub generation: GenerationOptions,
    pub reveal: RevealRate,
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_animation_speed() -> f64 {
    20.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            ollama_binary: None,
            conversations_dir: None,
            animation_speed: default_animation_speed(),
            generation: GenerationOptions::default(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "neuratalk", "neuratalk")
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Missing file yields defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        let temp_path = path.with_extension("toml.tmp");
        fs::write(&temp_path, contents)?;
        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn conversations_root(&self) -> PathBuf {
        if let Some(dir) = &self.conversations_dir {
            return dir.clone();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join("conversations"))
            .unwrap_or_else(|| PathBuf::from("conversations"))
    }

    pub fn set_animation_speed(&mut self, speed: f64) {
        self.animation_speed = speed.clamp(MIN_ANIMATION_SPEED, MAX_ANIMATION_SPEED);
    }

    pub fn settings(&self) -> Settings {
        Settings {
            generation: self.generation,
            reveal: RevealRate::from_speed(self.animation_speed),
        }
    }
}
