//! Engine configuration
//!
//! Controls the ignore-file name the local bridge looks for and the
//! commands the session runs for install and start. Loaded from a JSON
//! file when present; every field has a default so a missing or partial
//! file is fine.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A program plus its arguments, as one session command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Shell-style rendering for command-echo output lines.
    pub fn display(&self) -> String {
        let mut rendered = format!("$ {}", self.program);
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Name of the project ignore file read during local-directory imports
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,

    /// Dependency installation command
    #[serde(default = "default_install_command")]
    pub install: CommandSpec,

    /// Long-lived dev server command
    #[serde(default = "default_start_command")]
    pub start: CommandSpec,
}

fn default_ignore_file() -> String {
    ".gitignore".to_string()
}

fn default_install_command() -> CommandSpec {
    CommandSpec::new("pnpm", ["install"])
}

fn default_start_command() -> CommandSpec {
    CommandSpec::new("pnpm", ["run", "dev"])
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ignore_file: default_ignore_file(),
            install: default_install_command(),
            start: default_start_command(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file. A missing or malformed file
    /// falls back to defaults with a logged warning.
    pub fn load_from_file(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("invalid config file {}: {err}", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.ignore_file, ".gitignore");
        assert_eq!(config.install.display(), "$ pnpm install");
        assert_eq!(config.start.display(), "$ pnpm run dev");
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"install": {"program": "npm", "args": ["ci"]}}"#).unwrap();
        assert_eq!(config.install, CommandSpec::new("npm", ["ci"]));
        assert_eq!(config.ignore_file, ".gitignore");
        assert_eq!(config.start, CommandSpec::new("pnpm", ["run", "dev"]));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = EngineConfig::load_from_file(Path::new("/definitely/not/here.json"));
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_roundtrip() {
        let config = EngineConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
