use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use datagres_db::DEFAULT_PAGE_SIZE;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{cli::Args, errors::DatagresError};

const CONFIG_FILE: &str = "config.json";

/// Settings read from `config.json`; anything missing takes its default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub page_size: u32,
    /// Rows before the last loaded row at which the next page is requested
    pub scroll_threshold: u32,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            scroll_threshold: 5,
            log_level: "info".to_string(),
            tick_rate_ms: 100,
        }
    }
}

#[must_use]
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "datagres")
}

impl Config {
    /// `<config dir>/datagres/config.json` for the current platform
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Read the config at `path`. A missing file gives the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DatagresError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| {
            DatagresError::Config(format!("{}: {e}", path.display()))
        })
    }

    /// Load from `--config` or the default location, then apply command line
    /// overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn from_args(args: &Args) -> Result<Self, DatagresError> {
        let path = args.config.clone().or_else(Self::default_path);
        let mut config = match path {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        Ok(config)
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(page_size) = args.page_size {
            self.page_size = page_size;
        }
        if let Some(threshold) = args.threshold {
            self.scroll_threshold = threshold;
        }
        self.page_size = self.page_size.max(1);
    }

    #[must_use]
    pub const fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        use clap::Parser;

        let mut argv = vec!["datagres", "sqlite::memory:", "users"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("datagres-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load(Path::new("/nonexistent/datagres.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let path = temp_file("partial.json", r#"{ "page_size": 25 }"#);
        let config = Config::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.page_size, 25);
        assert_eq!(config.scroll_threshold, 5);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let path = temp_file("invalid.json", "{ page_size: }");
        let result = Config::load(&path);
        fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(DatagresError::Config(_))));
    }

    #[test]
    fn test_args_override_file() {
        let path = temp_file("override.json", r#"{ "page_size": 25, "scroll_threshold": 3 }"#);
        let config =
            Config::from_args(&args(&["--config", path.to_str().unwrap(), "--page-size", "10"]))
                .unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.page_size, 10);
        assert_eq!(config.scroll_threshold, 3);
    }
}
