//! Configuration file parsing for `starfish.toml`.
//!
//! Searches the current directory then its ancestors, falling back to
//! `~/.config/starfish/starfish.toml` if no project-level file is found.

use crate::error::CliError;
use serde::{Deserialize, Serialize};
use starfish_core::Value;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "starfish.toml";

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct StarfishConfig {
    #[serde(default)]
    pub run: RunSection,
}

/// The `[run]` table. Every field is optional so command-line flags can
/// be layered on top.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct RunSection {
    /// Milliseconds to wait between ticks.
    pub delay: Option<u64>,
    pub output_codebox: Option<bool>,
    pub output_stack: Option<bool>,
    /// Seed for the `x` instruction.
    pub seed: Option<u64>,
    pub max_ticks: Option<u64>,
    /// Reverse values moved by `[` and `]`.
    pub compatibility: Option<bool>,
    /// Initial stack, bottom first: `stack = [1, 2.5, 104]`
    pub stack: Option<Vec<Value>>,
}

impl RunSection {
    /// Layer `overrides` on top of `self`; any field set there wins.
    pub fn overridden_by(self, overrides: RunSection) -> RunSection {
        RunSection {
            delay: overrides.delay.or(self.delay),
            output_codebox: overrides.output_codebox.or(self.output_codebox),
            output_stack: overrides.output_stack.or(self.output_stack),
            seed: overrides.seed.or(self.seed),
            max_ticks: overrides.max_ticks.or(self.max_ticks),
            compatibility: overrides.compatibility.or(self.compatibility),
            stack: overrides.stack.or(self.stack),
        }
    }
}

impl StarfishConfig {
    /// Load config from `starfish.toml`, searching the current dir then
    /// parents. Returns `Default` when no file is found.
    pub fn load() -> Result<Self, CliError> {
        let Ok(cwd) = std::env::current_dir() else {
            return Ok(Self::default());
        };
        match Self::discover_from(&cwd) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("cannot read '{}': {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| CliError::Config(format!("invalid toml in '{}': {}", path.display(), e)))
    }

    /// Find the config file that applies to `start`.
    pub fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.is_file() {
                return Some(config_path);
            }
            if !dir.pop() {
                break;
            }
        }
        // Try global config
        let global = home_dir()?
            .join(".config")
            .join("starfish")
            .join(CONFIG_FILE);
        global.is_file().then_some(global)
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
