use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::common::http::DEFAULT_USER_AGENT;
use crate::youtube::YOUTUBE_HOST;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Base URL of the video site.
    pub host: String,
    pub user_agent: String,
    /// Directory for downloaded media. Falls back to a per-OS cache
    /// location when unset.
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub filters: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            host: YOUTUBE_HOST.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_dir: None,
        }
    }
}

impl ResolverConfig {
    /// Resolved media cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .or_else(default_cache_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join("youtube_cache")
    }
}

fn default_cache_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Caches/ytstream"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var("LOCALAPPDATA")
            .ok()
            .map(|d| PathBuf::from(d).join("ytstream/cache"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        std::env::var("XDG_CACHE_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".cache"))
            })
            .map(|d| d.join("ytstream"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.resolver.host, "https://www.youtube.com");
        assert!(config.resolver.user_agent.contains("Chrome/87"));
        assert!(config.logging.level.is_none());
    }

    #[test]
    fn deserialize_partial() {
        let config: Config =
            serde_json::from_str(r#"{"logging": {"level": "debug"}}"#).unwrap();
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.resolver.host, "https://www.youtube.com");
    }

    #[test]
    fn cache_dir_override() {
        let config = ResolverConfig {
            cache_dir: Some(PathBuf::from("/tmp/media")),
            ..Default::default()
        };
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/media/youtube_cache"));
    }
}
