//! Configuration vault – reads/writes `~/.ringside/config.toml`.

use ringside_types::Tuning;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted operator configuration stored in `~/.ringside/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Rounds to run back to back before exiting.
    #[serde(default = "default_rounds")]
    pub rounds: u32,

    /// Safety limit on control cycles per round.
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u64,

    /// Fixed seed for the turn randomizer; entropy-seeded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Controller constants, the `[tuning]` table.
    #[serde(default)]
    pub tuning: Tuning,
}

fn default_rounds() -> u32 {
    1
}
fn default_max_cycles() -> u64 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            max_cycles: default_max_cycles(),
            seed: None,
            tuning: Tuning::default(),
        }
    }
}

/// Return the path to `~/.ringside/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".ringside").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path, apply overrides and validate it.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    cfg.tuning.validate().map_err(|e| e.to_string())?;
    Ok(Some(cfg))
}

/// Apply `RINGSIDE_*` environment variable overrides to `cfg`.
///
/// Values that do not parse are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `RINGSIDE_BORDER_THRESHOLD` | `tuning.border_threshold` |
/// | `RINGSIDE_ACCEL_THRESHOLD` | `tuning.accel_threshold` |
/// | `RINGSIDE_CYCLE_PERIOD_MS` | `tuning.cycle_period_ms` |
/// | `RINGSIDE_COUNTDOWN_MS` | `tuning.countdown_ms` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Some(v) = env_parse("RINGSIDE_BORDER_THRESHOLD") {
        cfg.tuning.border_threshold = v;
    }
    if let Some(v) = env_parse("RINGSIDE_ACCEL_THRESHOLD") {
        cfg.tuning.accel_threshold = v;
    }
    if let Some(v) = env_parse("RINGSIDE_CYCLE_PERIOD_MS") {
        cfg.tuning.cycle_period_ms = v;
    }
    if let Some(v) = env_parse("RINGSIDE_COUNTDOWN_MS") {
        cfg.tuning.countdown_ms = v;
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Save the config to disk, creating `~/.ringside/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Owner only (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
