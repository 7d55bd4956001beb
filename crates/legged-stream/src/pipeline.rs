//! 有损流水线（Bounded Lossy Pipeline）
//!
//! 在实时生产方（如麦克风采集）和节奏不定的消费方（如总线发布）之间做解耦：
//! - 生产线程独占数据源，阻塞读取后推入丢旧有界队列，从不因下游而变慢
//! - 消费方只能通过非阻塞的 [`LossyPipeline::try_take`] 取数据
//! - 队列锁只在单次 push / pop 期间持有，绝不跨越数据源 IO
//!
//! 队列容量很小（默认 2），最坏情况下的数据新鲜度被限制在 N 个块以内；
//! 满时丢最旧的块，优先交付最新数据。

use crate::error::{PipelineError, SourceError};
use crate::queue::DropOldestQueue;
use crate::source::ChunkSource;
use crate::state::{AtomicPipelineState, PipelineState};
use bytes::Bytes;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Drop 时等待生产线程的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinOutcome {
    Joined,
    Panicked,
    /// 超时，线程被分离（阻塞在数据源中的线程会在读取返回后自行退出）
    TimedOut,
}

/// 检查间隔
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// 在 `timeout` 内等待线程结束，超时则分离
fn join_within(handle: JoinHandle<()>, timeout: Duration) -> JoinOutcome {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return JoinOutcome::TimedOut;
        }
        thread::sleep(JOIN_POLL_INTERVAL);
    }
    match handle.join() {
        Ok(()) => JoinOutcome::Joined,
        Err(_) => JoinOutcome::Panicked,
    }
}

/// 流水线配置
///
/// # Example
///
/// ```
/// use legged_stream::PipelineConfig;
/// use std::time::Duration;
///
/// // 默认配置（容量 2，Drop 时最多等待 2s）
/// let config = PipelineConfig::default();
///
/// let config = PipelineConfig {
///     capacity: 4,
///     thread_name: "mic-capture".to_string(),
///     join_timeout: Duration::from_secs(1),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// 队列容量（块数），至少为 1
    pub capacity: usize,
    /// 生产线程名称
    pub thread_name: String,
    /// Drop 时等待生产线程退出的最长时间（`stop()` 无限等待）
    pub join_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: 2,
            thread_name: "legged-producer".to_string(),
            join_timeout: Duration::from_secs(2),
        }
    }
}

/// 生产线程退出原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducerExit {
    /// 调用方请求停止
    StopRequested,
    /// 数据源正常结束
    SourceExhausted,
    /// 数据源读取失败
    SourceFailed(SourceError),
}

/// 流水线计数快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// 从数据源读到的块数
    pub produced: u64,
    /// 因队列满被淘汰的块数
    pub dropped: u64,
    /// 被消费方取走的块数
    pub taken: u64,
}

/// 生产线程与控制方共享的状态
struct Shared {
    queue: Mutex<DropOldestQueue<Bytes>>,
    state: AtomicPipelineState,
    stop_requested: AtomicBool,
    exit: Mutex<Option<ProducerExit>>,
    produced: AtomicU64,
    dropped: AtomicU64,
    taken: AtomicU64,
}

impl Shared {
    fn push(&self, chunk: Bytes) {
        // 锁只覆盖这一次 push；被淘汰的块在锁外释放
        let evicted = self.queue.lock().push(chunk);
        self.produced.fetch_add(1, Ordering::Relaxed);
        if evicted.is_some() {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            trace!("Queue full, dropped oldest chunk (total dropped: {})", dropped);
        }
    }
}

/// 控制方状态（启动 / 停止互斥）
struct Control<S> {
    source: Option<S>,
    producer: Option<JoinHandle<()>>,
}

/// 有损流水线
///
/// # 生命周期
///
/// `Idle → Running → Stopping → Stopped`，Stopped 为终态，不能重新启动。
///
/// # 示例
///
/// ```rust
/// use legged_stream::{LossyPipeline, PipelineConfig, ReaderSource};
/// use std::io::Cursor;
///
/// let source = ReaderSource::new(Cursor::new(vec![0u8; 4800 * 3]), 4800);
/// let pipeline = LossyPipeline::new(source, PipelineConfig::default())?;
/// pipeline.start()?;
///
/// while !pipeline.is_finished() {
///     match pipeline.try_take() {
///         Some(chunk) => println!("publish {} bytes", chunk.len()),
///         None => std::thread::sleep(std::time::Duration::from_millis(10)),
///     }
/// }
/// pipeline.stop()?;
/// # Ok::<(), legged_stream::PipelineError>(())
/// ```
pub struct LossyPipeline<S: ChunkSource> {
    shared: Arc<Shared>,
    control: Mutex<Control<S>>,
    config: PipelineConfig,
}

impl<S: ChunkSource> LossyPipeline<S> {
    /// 创建流水线（不启动）
    pub fn new(source: S, config: PipelineConfig) -> Result<Self, PipelineError> {
        let capacity = NonZeroUsize::new(config.capacity)
            .ok_or(PipelineError::InvalidCapacity(config.capacity))?;

        Ok(Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(DropOldestQueue::new(capacity)),
                state: AtomicPipelineState::new(PipelineState::Idle),
                stop_requested: AtomicBool::new(false),
                exit: Mutex::new(None),
                produced: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
                taken: AtomicU64::new(0),
            }),
            control: Mutex::new(Control {
                source: Some(source),
                producer: None,
            }),
            config,
        })
    }

    /// 使用默认配置和指定容量创建
    pub fn with_capacity(source: S, capacity: usize) -> Result<Self, PipelineError> {
        Self::new(
            source,
            PipelineConfig {
                capacity,
                ..PipelineConfig::default()
            },
        )
    }

    /// 启动生产线程
    ///
    /// 数据源在调用方线程上打开，打开失败时返回 [`PipelineError::SourceOpen`]，
    /// 流水线保持 Idle，可以重试。
    pub fn start(&self) -> Result<(), PipelineError> {
        let mut control = self.control.lock();

        match self.shared.state.get() {
            PipelineState::Idle => {},
            PipelineState::Running | PipelineState::Stopping => {
                return Err(PipelineError::AlreadyRunning);
            },
            PipelineState::Stopped => return Err(PipelineError::AlreadyStopped),
        }

        let Some(mut source) = control.source.take() else {
            return Err(PipelineError::AlreadyStopped);
        };

        if let Err(e) = source.open() {
            warn!("Failed to open source: {}", e);
            control.source = Some(source);
            return Err(PipelineError::SourceOpen(e));
        }

        // 先置 Running 再启动线程：生产线程结束时用 Running → Stopping 迁移
        self.shared.state.set(PipelineState::Running);

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || produce(source, shared));

        match spawned {
            Ok(handle) => {
                control.producer = Some(handle);
                info!(
                    "Pipeline started (capacity: {}, thread: '{}')",
                    self.config.capacity, self.config.thread_name
                );
                Ok(())
            },
            Err(e) => {
                // 数据源随闭包一起被释放，无法再次启动
                error!("Failed to spawn producer thread: {}", e);
                self.shared.state.set(PipelineState::Stopped);
                Err(PipelineError::Spawn(e))
            },
        }
    }

    /// 非阻塞地取出最旧的块
    pub fn try_take(&self) -> Option<Bytes> {
        let chunk = self.shared.queue.lock().pop();
        if chunk.is_some() {
            self.shared.taken.fetch_add(1, Ordering::Relaxed);
        }
        chunk
    }

    /// 停止生产线程并等待其退出
    ///
    /// 幂等：已停止时直接返回 `Ok(())`。从未启动的流水线直接进入 Stopped。
    /// 队列中剩余的块仍可通过 `try_take` 取出。
    pub fn stop(&self) -> Result<(), PipelineError> {
        let mut control = self.control.lock();

        if self.shared.state.get().is_stopped() {
            return Ok(());
        }

        self.shared.stop_requested.store(true, Ordering::Release);
        self.shared
            .state
            .transition(PipelineState::Running, PipelineState::Stopping);

        let result = match control.producer.take() {
            Some(handle) => {
                debug!("Waiting for producer thread to exit");
                handle.join().map_err(|_| {
                    error!("Producer thread panicked");
                    PipelineError::ProducerPanicked
                })
            },
            None => Ok(()),
        };

        // 从未启动的数据源直接释放
        control.source = None;
        self.shared.state.set(PipelineState::Stopped);

        let stats = self.stats();
        info!(
            "Pipeline stopped (produced: {}, dropped: {}, taken: {})",
            stats.produced, stats.dropped, stats.taken
        );
        result
    }

    pub fn state(&self) -> PipelineState {
        self.shared.state.get()
    }

    /// 生产线程已结束且队列已取空
    pub fn is_finished(&self) -> bool {
        matches!(
            self.state(),
            PipelineState::Stopping | PipelineState::Stopped
        ) && self.shared.queue.lock().is_empty()
    }

    /// 当前缓冲的块数
    pub fn len(&self) -> usize {
        self.shared.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.queue.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            produced: self.shared.produced.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
            taken: self.shared.taken.load(Ordering::Relaxed),
        }
    }

    /// 生产线程退出原因（仍在运行时为 `None`）
    pub fn exit_reason(&self) -> Option<ProducerExit> {
        self.shared.exit.lock().clone()
    }

    /// 数据源的最后一次错误
    pub fn last_error(&self) -> Option<SourceError> {
        match self.shared.exit.lock().as_ref() {
            Some(ProducerExit::SourceFailed(e)) => Some(e.clone()),
            _ => None,
        }
    }
}

impl<S: ChunkSource> Drop for LossyPipeline<S> {
    fn drop(&mut self) {
        self.shared.stop_requested.store(true, Ordering::Release);

        if let Some(handle) = self.control.get_mut().producer.take() {
            match join_within(handle, self.config.join_timeout) {
                JoinOutcome::Joined => {},
                JoinOutcome::Panicked => error!("Producer thread panicked"),
                JoinOutcome::TimedOut => error!(
                    "Producer thread did not exit within {:?}, detaching it",
                    self.config.join_timeout
                ),
            }
        }

        self.shared.state.set(PipelineState::Stopped);
    }
}

/// 生产线程主循环
fn produce<S: ChunkSource>(mut source: S, shared: Arc<Shared>) {
    #[cfg(feature = "realtime")]
    {
        use thread_priority::*;

        match set_current_thread_priority(ThreadPriority::Max) {
            Ok(_) => info!("Producer thread priority set to MAX (realtime)"),
            Err(e) => warn!(
                "Failed to set producer thread priority: {:?}. \
                On Linux, you may need to run with CAP_SYS_NICE or use rtkit.",
                e
            ),
        }
    }

    let exit = loop {
        // Acquire：看到 stop 请求时，也能看到请求前的所有写入
        if shared.stop_requested.load(Ordering::Acquire) {
            break ProducerExit::StopRequested;
        }

        match source.read_next() {
            Ok(Some(chunk)) if chunk.is_empty() => continue,
            Ok(Some(chunk)) => shared.push(chunk),
            Ok(None) => {
                debug!("Source exhausted");
                break ProducerExit::SourceExhausted;
            },
            Err(e) => {
                warn!("Source read failed, stopping producer: {}", e);
                break ProducerExit::SourceFailed(e);
            },
        }
    };

    source.close();

    // 先记录退出原因，再迁移到 Stopping：看到 Stopping 的一方一定能读到原因
    *shared.exit.lock() = Some(exit);
    shared
        .state
        .transition(PipelineState::Running, PipelineState::Stopping);
    trace!("Producer thread exiting");
}
