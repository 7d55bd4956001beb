//! 消费循环（Consumer Pump）
//!
//! 有数据立即发送，没有数据就睡眠 `idle_backoff` 后再试，直到流水线结束
//! 或 `keep_running` 返回 `false`。消费方从不阻塞在队列上。

use crate::pipeline::LossyPipeline;
use crate::source::ChunkSource;
use crate::state::PipelineState;
use bytes::Bytes;
use std::io::Write;
use std::thread;
use std::time::Duration;
use tracing::{debug, trace};

/// 数据块接收方 Trait
///
/// 典型实现是一次总线发布调用；发送失败时 [`pump`] 立即返回该错误。
pub trait ChunkSink {
    type Error;

    fn send(&mut self, chunk: Bytes) -> Result<(), Self::Error>;
}

/// 写入任意 `Write` 的接收方
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
    flush_each: bool,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            flush_each: false,
        }
    }

    /// 每块写入后立即 flush（管道下游需要低延迟时使用）
    pub fn flush_each(mut self, flush_each: bool) -> Self {
        self.flush_each = flush_each;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ChunkSink for WriterSink<W> {
    type Error = std::io::Error;

    fn send(&mut self, chunk: Bytes) -> Result<(), Self::Error> {
        self.writer.write_all(&chunk)?;
        if self.flush_each {
            self.writer.flush()?;
        }
        Ok(())
    }
}

/// 闭包接收方
///
/// ```rust
/// use bytes::Bytes;
/// use legged_stream::{ChunkSink, FnSink};
///
/// let mut sizes = Vec::new();
/// let mut sink = FnSink::new(|chunk: Bytes| {
///     sizes.push(chunk.len());
///     Ok::<(), std::convert::Infallible>(())
/// });
/// sink.send(Bytes::from_static(b"abc")).unwrap();
/// drop(sink);
/// assert_eq!(sizes, vec![3]);
/// ```
pub struct FnSink<F> {
    f: F,
}

impl<F> FnSink<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, E> ChunkSink for FnSink<F>
where
    F: FnMut(Bytes) -> Result<(), E>,
{
    type Error = E;

    fn send(&mut self, chunk: Bytes) -> Result<(), Self::Error> {
        (self.f)(chunk)
    }
}

/// 消费循环配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpOptions {
    /// 队列为空时的睡眠时间
    pub idle_backoff: Duration,
}

impl Default for PumpOptions {
    fn default() -> Self {
        Self {
            idle_backoff: Duration::from_millis(10),
        }
    }
}

/// 消费循环结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// 生产线程已结束且队列已取空
    Finished,
    /// `keep_running` 返回 false
    Interrupted,
    /// 流水线尚未启动（Idle），没有可等待的数据
    NotStarted,
}

/// 消费循环统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpReport {
    /// 发送的块数
    pub chunks: u64,
    /// 发送的字节数
    pub bytes: u64,
    /// 空轮询次数
    pub idle_polls: u64,
    pub exit: PumpExit,
}

/// 运行消费循环
///
/// 每轮先检查 `keep_running`，再 `try_take`：有数据立即交给 `sink`，
/// 否则睡眠 `options.idle_backoff`。`sink` 出错时立即返回该错误。
/// 本函数不会停止流水线，由调用方决定何时 `stop()`；对尚未 `start()`
/// 的流水线立即返回 [`PumpExit::NotStarted`]。
pub fn pump<S, K, F>(
    pipeline: &LossyPipeline<S>,
    sink: &mut K,
    options: &PumpOptions,
    mut keep_running: F,
) -> Result<PumpReport, K::Error>
where
    S: ChunkSource,
    K: ChunkSink,
    F: FnMut() -> bool,
{
    let mut chunks = 0u64;
    let mut bytes = 0u64;
    let mut idle_polls = 0u64;

    if pipeline.state() == PipelineState::Idle {
        debug!("Pump called on a pipeline that was never started");
        return Ok(PumpReport {
            chunks,
            bytes,
            idle_polls,
            exit: PumpExit::NotStarted,
        });
    }

    let exit = loop {
        if !keep_running() {
            break PumpExit::Interrupted;
        }

        match pipeline.try_take() {
            Some(chunk) => {
                let len = chunk.len() as u64;
                trace!("Sending chunk ({} bytes)", len);
                sink.send(chunk)?;
                chunks += 1;
                bytes += len;
            },
            None if pipeline.is_finished() => break PumpExit::Finished,
            None => {
                idle_polls += 1;
                thread::sleep(options.idle_backoff);
            },
        }
    };

    debug!(
        "Pump exited ({:?}): {} chunks, {} bytes, {} idle polls",
        exit, chunks, bytes, idle_polls
    );
    Ok(PumpReport {
        chunks,
        bytes,
        idle_polls,
        exit,
    })
}
