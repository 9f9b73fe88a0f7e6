use crate::dispatcher::OverlapPolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// 包管理器命令，未设置时自动探测
    pub command: Option<String>,
    pub explicit_only: bool,
    /// 同名包只保留第一条
    pub dedup_by_name: bool,
    pub timeout_secs: u64,
    pub dark_mode: bool,
    pub overlap_policy: OverlapPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: None,
            explicit_only: false,
            dedup_by_name: false,
            timeout_secs: 30,
            dark_mode: false,
            overlap_policy: OverlapPolicy::default(),
        }
    }
}

impl Config {
    /// `PACVIEW_CONFIG` > `~/.config/pacview/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PACVIEW_CONFIG") {
            return PathBuf::from(path);
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".config/pacview/config.toml")
    }

    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件 {} 失败", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("解析配置文件 {} 失败", path.display()))?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
