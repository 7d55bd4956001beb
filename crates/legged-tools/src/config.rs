//! 客户端配置
//!
//! 配置文件位置：
//! - Linux: `~/.config/legged/config.toml`
//! - macOS: `~/Library/Application Support/legged/config.toml`
//! - Windows: `%APPDATA%\legged\config.toml`
//!
//! ```toml
//! [call]
//! poll_interval_ms = 100
//!
//! [stream]
//! capacity = 2
//! chunk_ms = 100
//! idle_backoff_ms = 10
//! capture_command = "arecord -q -t raw -f S16_LE -c 1 -r 24000"
//! ```
//!
//! 缺省的字段取默认值，所以空文件也是合法配置。

use crate::pcm::PcmFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 字段值不合法（如容量为 0）
    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Unable to determine the user config directory")]
    NoConfigDir,
}

/// 可中断调用配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallSettings {
    /// 中断信号轮询间隔（毫秒）
    pub poll_interval_ms: u64,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

impl CallSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// 每块时长上限（毫秒）
pub const MAX_CHUNK_MS: u64 = 10_000;

/// 有损流水线配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// 队列容量（块数）
    pub capacity: usize,
    /// 每块时长（毫秒）
    pub chunk_ms: u64,
    /// 队列为空时消费方的睡眠时间（毫秒）
    pub idle_backoff_ms: u64,
    /// 采集命令（标准输出为原始 PCM）
    pub capture_command: String,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            capacity: 2,
            chunk_ms: 100,
            idle_backoff_ms: 10,
            capture_command: PcmFormat::VOICE.capture_command().unwrap_or_default(),
        }
    }
}

impl StreamSettings {
    pub fn chunk_duration(&self) -> Duration {
        Duration::from_millis(self.chunk_ms)
    }

    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }

    /// 按给定 PCM 格式换算的块大小（字节）
    pub fn chunk_bytes(&self, format: &PcmFormat) -> usize {
        format.bytes_per_chunk(self.chunk_duration())
    }
}

/// 客户端配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub call: CallSettings,
    pub stream: StreamSettings,
}

impl ClientConfig {
    /// 默认配置文件路径：`<config_dir>/legged/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push("legged");
        path.push("config.toml");
        Ok(path)
    }

    /// 解析并校验 TOML 文本
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 从文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 从默认路径加载，文件不存在时返回默认配置
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    /// 保存到文件（自动创建父目录）
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.validate()?;
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// 校验字段取值
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.call.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "call.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.stream.capacity == 0 {
            return Err(ConfigError::Invalid(
                "stream.capacity must be at least 1".to_string(),
            ));
        }
        if self.stream.chunk_ms == 0 {
            return Err(ConfigError::Invalid(
                "stream.chunk_ms must be greater than 0".to_string(),
            ));
        }
        if self.stream.chunk_ms > MAX_CHUNK_MS {
            return Err(ConfigError::Invalid(format!(
                "stream.chunk_ms must be at most {} (got {})",
                MAX_CHUNK_MS, self.stream.chunk_ms
            )));
        }
        Ok(())
    }
}
