//! 有损流水线模块
//!
//! 本模块提供实时数据流（如麦克风音频）到发布方的解耦能力，包括：
//! - 丢旧有界队列（[`DropOldestQueue`]）：满时淘汰最旧的块，长度不超过容量
//! - 流水线生命周期（[`LossyPipeline`]）：独立生产线程、非阻塞 `try_take`、幂等 `stop`
//! - 数据源抽象（[`ChunkSource`]）及内置实现：Reader 切块、外部采集程序
//! - 消费循环（[`pump`]）：有数据立即发送，无数据时短暂睡眠
//!
//! # 使用场景
//!
//! 生产方按实时节奏产生数据、绝不能被下游阻塞，而消费方节奏不定、
//! 偶尔丢几块旧数据可以接受的场景。

mod error;
pub mod pipeline;
pub mod pump;
pub mod queue;
pub mod source;
pub mod state;

pub use error::{PipelineError, SourceError};
pub use pipeline::{LossyPipeline, PipelineConfig, PipelineStats, ProducerExit};
pub use pump::{ChunkSink, FnSink, PumpExit, PumpOptions, PumpReport, WriterSink, pump};
pub use queue::DropOldestQueue;
pub use source::{ChunkSource, CommandSource, ReaderSource};
pub use state::{AtomicPipelineState, PipelineState};
