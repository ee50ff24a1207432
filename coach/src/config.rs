//! Configuration for the coach.
//!
//! Every tunable has a compiled-in default and can be overridden through a
//! dedicated environment variable. Command-line flags override both.

use std::path::{Path, PathBuf};

use anyhow::Context;
use engine::EngineConfig;

/// Default search depth for reviews and one-off queries.
const DEFAULT_ANALYSIS_DEPTH: u32 = 12;

/// Default engine strength; 20 is full strength.
const DEFAULT_SKILL_LEVEL: u8 = 20;

const DEFAULT_THREADS: u32 = 1;

const DEFAULT_HASH_MB: u32 = 64;

/// Explicit engine executable.
///
/// Priority:
/// 1. `CHESSCOACH_ENGINE_PATH` env variable if set
/// 2. `None`, so the common install locations are probed
pub fn get_engine_path() -> Option<PathBuf> {
    std::env::var_os("CHESSCOACH_ENGINE_PATH").map(PathBuf::from)
}

/// Search depth.
///
/// Priority:
/// 1. `CHESSCOACH_ANALYSIS_DEPTH` env variable if set (falls back to default
///    if the value cannot be parsed as a `u32`)
/// 2. `12` as fallback
pub fn get_analysis_depth() -> u32 {
    parse_var("CHESSCOACH_ANALYSIS_DEPTH", DEFAULT_ANALYSIS_DEPTH)
}

/// Engine skill level, 0-20.
pub fn get_skill_level() -> u8 {
    parse_var("CHESSCOACH_SKILL_LEVEL", DEFAULT_SKILL_LEVEL)
}

pub fn get_threads() -> u32 {
    parse_var("CHESSCOACH_THREADS", DEFAULT_THREADS)
}

pub fn get_hash_mb() -> u32 {
    parse_var("CHESSCOACH_HASH_MB", DEFAULT_HASH_MB)
}

/// Directory for rolling log files. Unset means log to stderr.
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var_os("CHESSCOACH_LOG_DIR").map(PathBuf::from)
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| parse_or(&value))
        .unwrap_or(default)
}

fn parse_or<T: std::str::FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoachConfig {
    pub engine_path: Option<PathBuf>,
    pub depth: u32,
    pub skill_level: u8,
    pub threads: u32,
    pub hash_mb: u32,
    pub log_dir: Option<PathBuf>,
}

impl CoachConfig {
    pub fn from_env() -> Self {
        Self {
            engine_path: get_engine_path(),
            depth: get_analysis_depth(),
            skill_level: get_skill_level(),
            threads: get_threads(),
            hash_mb: get_hash_mb(),
            log_dir: get_log_dir(),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            path: self.engine_path.clone(),
            skill_level: Some(self.skill_level),
            threads: Some(self.threads),
            hash_mb: Some(self.hash_mb),
        }
    }

    /// Create the log directory, if one is configured, and return it.
    pub fn prepare_log_dir(&self) -> anyhow::Result<Option<&Path>> {
        let Some(dir) = self.log_dir.as_deref() else {
            return Ok(None);
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create log directory {}", dir.display()))?;
        Ok(Some(dir))
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            engine_path: None,
            depth: DEFAULT_ANALYSIS_DEPTH,
            skill_level: DEFAULT_SKILL_LEVEL,
            threads: DEFAULT_THREADS,
            hash_mb: DEFAULT_HASH_MB,
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or() {
        assert_eq!(parse_or::<u32>(" 18 "), Some(18));
        assert_eq!(parse_or::<u32>("deep"), None);
        assert_eq!(parse_or::<u8>("300"), None);
    }

    #[test]
    fn test_engine_config_carries_tunables() {
        let config = CoachConfig {
            engine_path: Some(PathBuf::from("/opt/sf")),
            threads: 4,
            ..CoachConfig::default()
        };
        let engine = config.engine_config();
        assert_eq!(engine.path.as_deref(), Some(std::path::Path::new("/opt/sf")));
        assert_eq!(engine.threads, Some(4));
        assert_eq!(engine.hash_mb, Some(64));
        assert_eq!(engine.skill_level, Some(20));
    }

    #[test]
    fn test_prepare_log_dir_creates_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs/coach");
        let config = CoachConfig {
            log_dir: Some(dir.clone()),
            ..CoachConfig::default()
        };
        assert_eq!(config.prepare_log_dir().unwrap(), Some(dir.as_path()));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_prepare_log_dir_reports_unusable_path() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not-a-dir");
        std::fs::write(&file, "").unwrap();
        let config = CoachConfig {
            log_dir: Some(file.join("logs")),
            ..CoachConfig::default()
        };
        let err = config.prepare_log_dir().unwrap_err();
        assert!(err.to_string().contains("cannot create log directory"));
        assert_eq!(CoachConfig::default().prepare_log_dir().unwrap(), None);
    }

    // Env mutation is avoided in tests; parsing is covered by test_parse_or.
}
