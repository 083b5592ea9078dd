//! 客户端配置
//!
//! 读取优先级（后者覆盖前者）：
//! 1. 内置默认值
//! 2. 配置文件 `~/.config/notification-center/config.json`
//! 3. 环境变量 `NOTIFY_BASE_URL` / `NOTIFY_API_TOKEN`
//! 4. 命令行参数（由 main 处理）

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 默认后端地址
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// 默认请求超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// 默认刷新间隔（秒）
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 后端 API 根地址
    pub base_url: String,
    /// Bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// 请求超时（秒）
    pub timeout_secs: u64,
    /// TUI 自动刷新间隔（秒）
    pub refresh_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

impl Config {
    /// 配置文件路径
    pub fn path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("notification-center")
            .join("config.json")
    }

    /// 从默认路径和环境变量加载
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::path())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// 从指定文件加载，文件不存在时返回默认值
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;

        debug!(path = %path.display(), base_url = %config.base_url, "config loaded");
        Ok(config)
    }

    /// 环境变量覆盖（空值忽略）
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("NOTIFY_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(token) = lookup("NOTIFY_API_TOKEN").filter(|v| !v.is_empty()) {
            self.api_token = Some(token);
        }
    }
}
