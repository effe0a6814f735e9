//! Discovery of models installed in the local Ollama runtime.

use crate::error::DiscoveryError;
use directories::BaseDirs;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

#[cfg(windows)]
const BINARY_NAME: &str = "ollama.exe";
#[cfg(not(windows))]
const BINARY_NAME: &str = "ollama";

/// Lists installed models by shelling out to the backend binary.
///
/// Holds no state beyond an optional explicit binary; every call re-runs the
/// query and nothing is cached.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    binary: Option<PathBuf>,
}

impl ModelCatalog {
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self { binary }
    }

    /// Explicit binary first, then PATH, then the per-OS install locations.
    pub fn locate_backend(&self) -> Result<PathBuf, DiscoveryError> {
        if let Some(path) = &self.binary {
            return if path.is_file() {
                Ok(path.clone())
            } else {
                Err(DiscoveryError::BackendUnavailable(format!(
                    "configured binary {} does not exist",
                    path.display()
                )))
            };
        }

        search_path(BINARY_NAME)
            .or_else(|| fallback_locations().into_iter().find(|p| p.is_file()))
            .ok_or_else(|| {
                DiscoveryError::BackendUnavailable(
                    "ollama not found in PATH or common installation locations".to_string(),
                )
            })
    }

    /// Blocking. Runs a status probe (`ollama ps`) and then `ollama list`.
    pub fn list_models(&self) -> Result<Vec<String>, DiscoveryError> {
        let binary = self.locate_backend()?;
        debug!(binary = %binary.display(), "Found ollama binary");

        run(&binary, "ps").map_err(|e| {
            DiscoveryError::BackendUnavailable(format!("ollama service is not running: {e}"))
        })?;

        let output = run(&binary, "list").map_err(|e| {
            DiscoveryError::BackendUnavailable(format!("failed to list models: {e}"))
        })?;

        let names = parse_model_list(&output);
        if names.is_empty() {
            return Err(DiscoveryError::NoModelsInstalled);
        }
        info!(count = names.len(), "Discovered installed models");
        Ok(names)
    }
}

/// Skips everything up to the `NAME` header, then takes the first column of
/// every non-empty line.
pub fn parse_model_list(output: &str) -> Vec<String> {
    output
        .lines()
        .skip_while(|line| !line.starts_with("NAME"))
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

fn run(binary: &Path, arg: &str) -> Result<String, String> {
    let output = Command::new(binary)
        .arg(arg)
        .output()
        .map_err(|e| e.to_string())?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{} ({})", output.status, stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn search_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn fallback_locations() -> Vec<PathBuf> {
    let home = BaseDirs::new().map(|b| b.home_dir().to_path_buf());

    let mut paths = Vec::new();
    if cfg!(target_os = "macos") {
        paths.push(PathBuf::from("/usr/local/bin/ollama"));
        paths.push(PathBuf::from("/opt/homebrew/bin/ollama"));
        if let Some(home) = home {
            paths.push(home.join("go/bin/ollama"));
        }
    } else if cfg!(target_os = "windows") {
        paths.push(PathBuf::from("C:\\Program Files\\Ollama\\ollama.exe"));
        paths.push(PathBuf::from("C:\\Program Files (x86)\\Ollama\\ollama.exe"));
        if let Some(local) = BaseDirs::new().map(|b| b.data_local_dir().to_path_buf()) {
            paths.push(local.join("ollama").join("ollama.exe"));
        }
    } else {
        paths.push(PathBuf::from("/usr/bin/ollama"));
        paths.push(PathBuf::from("/usr/local/bin/ollama"));
        if let Some(home) = home {
            paths.push(home.join("go/bin/ollama"));
        }
    }
    paths
}
