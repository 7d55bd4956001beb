//! 数据源（Chunk Source）
//!
//! 生产线程从数据源阻塞读取数据块。内置两种实现：
//! - [`ReaderSource`]：对任意 `Read`（文件、管道）按固定大小切块
//! - [`CommandSource`]：启动采集程序（如 `arecord`），读取其标准输出
//!
//! # 自定义数据源
//!
//! ```rust
//! use bytes::Bytes;
//! use legged_stream::{ChunkSource, SourceError};
//!
//! /// 产生固定数量的测试块
//! struct Counter {
//!     remaining: u8,
//! }
//!
//! impl ChunkSource for Counter {
//!     fn read_next(&mut self) -> Result<Option<Bytes>, SourceError> {
//!         if self.remaining == 0 {
//!             return Ok(None); // 数据源结束
//!         }
//!         self.remaining -= 1;
//!         Ok(Some(Bytes::from(vec![self.remaining; 4])))
//!     }
//! }
//! ```

use crate::error::SourceError;
use bytes::{Bytes, BytesMut};
use std::io::{ErrorKind, Read};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 数据源 Trait
///
/// 由生产线程独占使用：`open` 在 `start()` 的调用方线程上执行（失败则启动失败），
/// `read_next` 和 `close` 在生产线程上执行。
pub trait ChunkSource: Send + 'static {
    /// 打开数据源（默认无操作）
    fn open(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    /// 阻塞读取下一个数据块
    ///
    /// - `Ok(Some(chunk))`：新数据
    /// - `Ok(None)`：数据源正常结束
    /// - `Err(e)`：读取失败，生产线程随之结束
    fn read_next(&mut self) -> Result<Option<Bytes>, SourceError>;

    /// 释放数据源（生产线程退出时调用一次，默认无操作）
    fn close(&mut self) {}
}

impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    fn open(&mut self) -> Result<(), SourceError> {
        (**self).open()
    }

    fn read_next(&mut self) -> Result<Option<Bytes>, SourceError> {
        (**self).read_next()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// 定长切块的 Reader 数据源
///
/// 每次读满 `chunk_size` 字节才返回（与 `fread` 一致），流末尾的不足一块的数据作为最后一块返回。
/// 读到一半出错时，先返回已读到的部分，错误在下一次 `read_next` 返回。
///
/// 文件等可以全速读取的 Reader 可以用 [`paced`](Self::paced) 按实时节奏交付，
/// 行为与采集设备一致：第 k 块在启动后 k 个间隔时才返回。
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    chunk_size: usize,
    pace: Option<Duration>,
    next_due: Option<Instant>,
    pending_error: Option<SourceError>,
}

impl<R: Read + Send + 'static> ReaderSource<R> {
    /// `chunk_size` 为 0 时按 1 处理
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            pace: None,
            next_due: None,
            pending_error: None,
        }
    }

    /// 每块间隔 `interval` 交付（零间隔等同于不限速）
    pub fn paced(mut self, interval: Duration) -> Self {
        self.pace = (!interval.is_zero()).then_some(interval);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn pace(&self) -> Option<Duration> {
        self.pace
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// 等到下一块的交付时刻；落后时不补睡，直接交付
    fn wait_for_slot(&mut self) {
        let Some(interval) = self.pace else {
            return;
        };
        let now = Instant::now();
        let due = *self.next_due.get_or_insert(now + interval);
        if due > now {
            thread::sleep(due - now);
        }
        self.next_due = Some(due.max(now) + interval);
    }
}

impl<R: Read + Send + 'static> ChunkSource for ReaderSource<R> {
    fn read_next(&mut self) -> Result<Option<Bytes>, SourceError> {
        if let Some(e) = self.pending_error.take() {
            return Err(e);
        }

        let mut buf = BytesMut::zeroed(self.chunk_size);
        let mut filled = 0;

        while filled < self.chunk_size {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if filled == 0 => return Err(e.into()),
                Err(e) => {
                    self.pending_error = Some(e.into());
                    break;
                },
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);
        self.wait_for_slot();
        Ok(Some(buf.freeze()))
    }
}

/// 外部采集程序数据源
///
/// `open` 时启动程序（标准输出接管道），`read_next` 从标准输出定长读取，
/// `close`（或 Drop）时结束并回收子进程。
///
/// # 示例
///
/// ```rust,no_run
/// use legged_stream::{CommandSource, LossyPipeline, PipelineConfig};
///
/// // 24kHz / 单声道 / 16-bit，100ms 一块 = 4800 字节
/// let source = CommandSource::from_command_line("arecord -q -t raw -f S16_LE -c 1 -r 24000", 4800)?;
/// let pipeline = LossyPipeline::new(source, PipelineConfig::default())?;
/// pipeline.start()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
    chunk_size: usize,
    child: Option<Child>,
    stdout: Option<ReaderSource<ChildStdout>>,
}

impl CommandSource {
    pub fn new<I, S>(program: impl Into<String>, args: I, chunk_size: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            chunk_size: chunk_size.max(1),
            child: None,
            stdout: None,
        }
    }

    /// 从空白分隔的命令行构造（不支持引号转义）
    pub fn from_command_line(line: &str, chunk_size: usize) -> Result<Self, SourceError> {
        let mut parts = line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| SourceError::Open("empty capture command".to_string()))?;
        Ok(Self::new(program, parts, chunk_size))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn shutdown(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            // 程序可能已自行退出
            let _ = child.kill();
            match child.wait() {
                Ok(status) => debug!("`{}` exited: {}", self.program, status),
                Err(e) => warn!("Failed to reap `{}`: {}", self.program, e),
            }
        }
    }
}

impl ChunkSource for CommandSource {
    fn open(&mut self) -> Result<(), SourceError> {
        if self.child.is_some() {
            return Ok(());
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| SourceError::Open(format!("`{}`: {}", self.program, e)))?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SourceError::Open(format!(
                "`{}`: stdout not captured",
                self.program
            )));
        };

        debug!("Capture command `{}` started (pid {})", self.program, child.id());
        self.stdout = Some(ReaderSource::new(stdout, self.chunk_size));
        self.child = Some(child);
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<Bytes>, SourceError> {
        match self.stdout.as_mut() {
            Some(reader) => reader.read_next(),
            None => Err(SourceError::Read(format!("`{}` is not running", self.program))),
        }
    }

    fn close(&mut self) {
        self.shutdown();
    }
}

impl Drop for CommandSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}
