//! 流水线错误类型定义

use std::io;
use thiserror::Error;

/// 数据源错误
///
/// 需要 `Clone`：生产线程退出后，错误会作为“最后一次错误”保留下来供调用方读取。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// 数据源无法打开（程序不存在、设备不可用）
    #[error("Failed to open source: {0}")]
    Open(String),

    /// 读取失败
    #[error("Source read failed: {0}")]
    Read(String),

    /// 底层 IO 错误
    #[error("Source I/O error ({kind:?}): {message}")]
    Io { kind: io::ErrorKind, message: String },
}

impl From<io::Error> for SourceError {
    fn from(e: io::Error) -> Self {
        Self::Io {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// 流水线错误类型
///
/// 只用于生命周期误用和环境故障；数据源耗尽、读取出错属于正常结束，
/// 通过 [`ProducerExit`](crate::ProducerExit) 报告。
#[derive(Error, Debug)]
pub enum PipelineError {
    /// 重复启动（未经 stop）
    #[error("Pipeline is already running")]
    AlreadyRunning,

    /// 已停止的流水线不能再次启动
    #[error("Pipeline has been stopped and cannot be restarted")]
    AlreadyStopped,

    /// 队列容量必须至少为 1
    #[error("Invalid queue capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    /// 数据源启动失败，流水线保持 Idle
    #[error("Failed to start source: {0}")]
    SourceOpen(#[source] SourceError),

    /// 无法创建生产线程
    #[error("Failed to spawn producer thread: {0}")]
    Spawn(#[from] io::Error),

    /// 生产线程 panic
    #[error("Producer thread panicked")]
    ProducerPanicked,
}
