//! # Legged CLI
//!
//! Command-line interface for interruptible robot calls and lossy audio streaming.
//!
//! ```bash
//! # 在 Ctrl+C 保护下执行一个长时间运行的调用（Ctrl+C 只取消这次调用）
//! legged-cli call -- motion-client run-sequence wave
//!
//! # 采集麦克风并发布（默认使用配置中的采集命令）
//! legged-cli stream --capacity 2 --chunk-ms 100
//!
//! # 配置管理
//! legged-cli config set --capacity 4
//! legged-cli config get stream.capacity
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use legged_sdk::tools::ClientConfig;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

use commands::{CallCommand, ConfigCommand, StreamCommand};

/// Legged CLI - 足式机器人客户端命令行工具
#[derive(Parser, Debug)]
#[command(name = "legged-cli")]
#[command(about = "Command-line interface for interruptible robot calls and lossy audio streaming", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认: <config_dir>/legged/config.toml）
    #[arg(long, global = true)]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 在可中断控制器下执行外部程序
    Call {
        #[command(flatten)]
        args: CallCommand,
    },

    /// 通过有损流水线采集并发布数据
    Stream {
        #[command(flatten)]
        args: StreamCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn config_path(cli_path: Option<PathBuf>) -> Result<PathBuf> {
    match cli_path {
        Some(path) => Ok(path),
        None => ClientConfig::default_path().context("Failed to locate config file"),
    }
}

fn main() -> Result<ExitCode> {
    // 初始化日志
    legged_sdk::init_logger!("legged_cli=info,legged_call=info,legged_stream=info,warn");

    let cli = Cli::parse();
    let path = config_path(cli.config_file)?;

    match cli.command {
        Commands::Call { args } => args.execute(&commands::config::load(&path)?),

        Commands::Stream { args } => args.execute(&commands::config::load(&path)?),

        Commands::Config(cmd) => {
            cmd.execute(&path)?;
            Ok(ExitCode::SUCCESS)
        },
    }
}
