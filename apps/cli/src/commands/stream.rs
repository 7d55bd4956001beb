//! 流式发布命令
//!
//! 采集源（文件或采集程序）→ 有损流水线 → 发布（写文件或打印块信息）。
//! Ctrl+C 停止采集，已缓冲的块不再发布。

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Args;
use legged_sdk::call::InterruptSignal;
use legged_sdk::settings;
use legged_sdk::stream::{
    ChunkSink, ChunkSource, CommandSource, LossyPipeline, PumpExit, ReaderSource, WriterSink, pump,
};
use legged_sdk::tools::{ClientConfig, PcmFormat};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// 流式发布命令参数
#[derive(Args, Debug)]
pub struct StreamCommand {
    /// 从原始 PCM 文件读取
    #[arg(long, conflicts_with = "command")]
    pub file: Option<PathBuf>,

    /// 采集命令（覆盖配置，标准输出为原始 PCM）
    #[arg(long)]
    pub command: Option<String>,

    /// 队列容量（覆盖配置）
    #[arg(long)]
    pub capacity: Option<usize>,

    /// 每块时长（毫秒，覆盖配置）
    #[arg(long = "chunk-ms")]
    pub chunk_ms: Option<u64>,

    /// 发布到文件（默认只打印每块信息）
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// 发布目标
enum Output {
    File(WriterSink<BufWriter<File>>),
    Log { format: PcmFormat, published: u64 },
}

impl ChunkSink for Output {
    type Error = io::Error;

    fn send(&mut self, chunk: Bytes) -> Result<(), Self::Error> {
        match self {
            Output::File(sink) => sink.send(chunk),
            Output::Log { format, published } => {
                *published += 1;
                info!(
                    "📤 Published chunk #{} ({} bytes, {:?})",
                    published,
                    chunk.len(),
                    format.chunk_duration(chunk.len())
                );
                Ok(())
            },
        }
    }
}

impl Output {
    fn finish(self) -> io::Result<()> {
        match self {
            Output::File(sink) => sink.into_inner().flush(),
            Output::Log { .. } => Ok(()),
        }
    }
}

impl StreamCommand {
    /// 命令行参数覆盖配置文件
    fn effective_config(&self, config: &ClientConfig) -> Result<ClientConfig> {
        let mut config = config.clone();
        if let Some(capacity) = self.capacity {
            config.stream.capacity = capacity;
        }
        if let Some(chunk_ms) = self.chunk_ms {
            config.stream.chunk_ms = chunk_ms;
        }
        if let Some(ref command) = self.command {
            config.stream.capture_command = command.clone();
        }
        config.validate()?;
        Ok(config)
    }

    /// 打开数据源；文件按块时长节拍读取，模拟实时采集
    fn open_source(
        &self,
        config: &ClientConfig,
        format: &PcmFormat,
        chunk_size: usize,
    ) -> Result<Box<dyn ChunkSource>> {
        match self.file {
            Some(ref path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                println!("📂 数据源: {}", path.display());
                let source =
                    ReaderSource::new(file, chunk_size).paced(format.chunk_duration(chunk_size));
                Ok(Box::new(source))
            },
            None => {
                let source =
                    CommandSource::from_command_line(&config.stream.capture_command, chunk_size)?;
                println!("🎙️  数据源: {}", config.stream.capture_command);
                Ok(Box::new(source))
            },
        }
    }

    /// 执行流式发布
    pub fn execute(&self, config: &ClientConfig) -> Result<ExitCode> {
        let config = self.effective_config(config)?;
        let format = PcmFormat::VOICE;
        let chunk_size = settings::chunk_bytes(&config, &format);

        let source = self.open_source(&config, &format, chunk_size)?;
        let pipeline = LossyPipeline::new(source, settings::pipeline_config(&config))?;

        let mut output = match self.output {
            Some(ref path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                Output::File(WriterSink::new(BufWriter::new(file)))
            },
            None => Output::Log {
                format,
                published: 0,
            },
        };

        let signal = InterruptSignal::global();
        signal
            .install_ctrlc_handler()
            .context("Failed to install Ctrl+C handler")?;

        pipeline.start()?;
        println!(
            "▶️  开始发布（容量 {}，每块 {} 字节），按 Ctrl+C 停止",
            pipeline.capacity(),
            chunk_size
        );

        let pumped = pump(&pipeline, &mut output, &settings::pump_options(&config), || {
            !signal.is_raised()
        });
        pipeline.stop()?;
        let report = pumped.context("Failed to publish chunk")?;
        output.finish().context("Failed to flush output")?;

        if report.exit == PumpExit::Interrupted {
            signal.clear();
            println!("⚠️  已中断");
        }

        let stats = pipeline.stats();
        println!(
            "📊 采集 {} 块，丢弃 {} 块，发布 {} 块（{} 字节）",
            stats.produced, stats.dropped, report.chunks, report.bytes
        );

        match pipeline.last_error() {
            Some(e) => {
                eprintln!("❌ 数据源错误: {}", e);
                Ok(ExitCode::FAILURE)
            },
            None => Ok(ExitCode::SUCCESS),
        }
    }
}
