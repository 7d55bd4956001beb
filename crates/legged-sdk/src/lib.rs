//! Legged SDK - 足式机器人客户端 Rust SDK
//!
//! 面向机器人运动服务与语音通道的客户端基础设施。
//!
//! # 架构设计
//!
//! - **可中断调用** (`call`): 阻塞远端调用的协作式取消，Ctrl+C 触发，最多取消一次
//! - **有损流水线** (`stream`): 实时生产线程 + 丢旧有界队列 + 非阻塞消费
//! - **工具** (`tools`): TOML 配置、PCM 分块计算
//!
//! 两个核心模块互不依赖，可以组合使用：流水线消费方的每一次发布调用都可以交给
//! 可中断调用控制器执行。
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use legged_sdk::prelude::*;
//! use std::sync::Arc;
//!
//! legged_sdk::init_logger!();
//! InterruptSignal::global().install_ctrlc_handler()?;
//!
//! let call = CommandCall::new("motion-client").arg("run-sequence");
//! let outcome = CallController::global().execute(Arc::new(call))?;
//! println!("{}", outcome);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use legged_call as call;
pub use legged_stream as stream;
pub use legged_tools as tools;

// Prelude 模块
pub mod prelude;

mod logging;
pub mod settings;

pub use logging::init_logging;

// 常用类型
pub use legged_call::{CallController, CallOutcome, InterruptSignal};
pub use legged_stream::{LossyPipeline, PipelineConfig};
pub use legged_tools::ClientConfig;

/// 初始化日志
///
/// - `RUST_LOG` 已设置时以它为准，否则使用给定的默认指令（缺省为 `info`）
/// - `log` crate 的记录通过 `tracing-log` 转发
/// - 重复调用无副作用
///
/// ```rust
/// legged_sdk::init_logger!();
/// legged_sdk::init_logger!("legged_stream=debug,info");
/// ```
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logging("info")
    };
    ($directive:expr) => {
        $crate::init_logging($directive)
    };
}
