//! 配置管理命令
//!
//! 读写 `<config_dir>/legged/config.toml`（或 `--config-file` 指定的路径）

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use legged_sdk::tools::ClientConfig;
use std::path::Path;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 设置配置项
    Set {
        /// 中断轮询间隔（毫秒）
        #[arg(long = "poll-ms")]
        poll_ms: Option<u64>,

        /// 队列容量（块数）
        #[arg(long)]
        capacity: Option<usize>,

        /// 每块时长（毫秒）
        #[arg(long = "chunk-ms")]
        chunk_ms: Option<u64>,

        /// 队列为空时的睡眠时间（毫秒）
        #[arg(long = "idle-backoff-ms")]
        idle_backoff_ms: Option<u64>,

        /// 采集命令
        #[arg(long = "capture-command")]
        capture_command: Option<String>,
    },

    /// 获取配置项
    Get {
        /// 配置项名称（如 stream.capacity）
        #[arg(default_value = "all")]
        key: String,
    },

    /// 检查配置
    Check,
}

/// 加载配置，文件不存在时使用默认配置
pub fn load(path: &Path) -> Result<ClientConfig> {
    if !path.exists() {
        return Ok(ClientConfig::default());
    }
    ClientConfig::load_from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// 读取单个配置项
fn lookup(config: &ClientConfig, key: &str) -> Option<String> {
    let value = match key {
        "call.poll_interval_ms" => config.call.poll_interval_ms.to_string(),
        "stream.capacity" => config.stream.capacity.to_string(),
        "stream.chunk_ms" => config.stream.chunk_ms.to_string(),
        "stream.idle_backoff_ms" => config.stream.idle_backoff_ms.to_string(),
        "stream.capture_command" => config.stream.capture_command.clone(),
        _ => return None,
    };
    Some(value)
}

impl ConfigCommand {
    pub fn execute(self, path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Set {
                poll_ms,
                capacity,
                chunk_ms,
                idle_backoff_ms,
                capture_command,
            } => {
                let mut config = load(path)?;

                if let Some(v) = poll_ms {
                    config.call.poll_interval_ms = v;
                    println!("✅ 设置轮询间隔: {} ms", v);
                }
                if let Some(v) = capacity {
                    config.stream.capacity = v;
                    println!("✅ 设置队列容量: {}", v);
                }
                if let Some(v) = chunk_ms {
                    config.stream.chunk_ms = v;
                    println!("✅ 设置块时长: {} ms", v);
                }
                if let Some(v) = idle_backoff_ms {
                    config.stream.idle_backoff_ms = v;
                    println!("✅ 设置空闲睡眠: {} ms", v);
                }
                if let Some(v) = capture_command {
                    println!("✅ 设置采集命令: {}", v);
                    config.stream.capture_command = v;
                }

                config
                    .save_to_file(path)
                    .with_context(|| format!("Failed to save config to {}", path.display()))?;
                Ok(())
            },

            ConfigCommand::Get { key } => {
                let config = load(path)?;
                if key == "all" {
                    print!("{}", config.to_toml_string()?);
                    return Ok(());
                }
                match lookup(&config, &key) {
                    Some(value) => println!("{}", value),
                    None => bail!("Unknown config key: {}", key),
                }
                Ok(())
            },

            ConfigCommand::Check => {
                println!("配置文件: {}", path.display());
                if !path.exists() {
                    println!("  (不存在，使用默认配置)");
                }
                let config = load(path)?;
                println!("  轮询间隔: {} ms", config.call.poll_interval_ms);
                println!("  队列容量: {}", config.stream.capacity);
                println!("  块时长: {} ms", config.stream.chunk_ms);
                println!("  空闲睡眠: {} ms", config.stream.idle_backoff_ms);
                println!("  采集命令: {}", config.stream.capture_command);
                println!("✅ 配置有效");
                Ok(())
            },
        }
    }
}
