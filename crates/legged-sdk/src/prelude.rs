//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use legged_sdk::prelude::*;
//! ```

// 可中断调用
pub use legged_call::{
    CallController, CallFailure, CallOutcome, CancellableCall, CommandCall, FnCall,
    InterruptSignal, NativeStatus,
};

// 有损流水线
pub use legged_stream::{
    ChunkSink, ChunkSource, CommandSource, LossyPipeline, PipelineConfig, PumpOptions,
    ReaderSource, pump,
};

// 配置
pub use legged_tools::{ClientConfig, PcmFormat};

// 错误类型
pub use legged_call::CallError;
pub use legged_stream::{PipelineError, SourceError};
pub use legged_tools::ConfigError;
