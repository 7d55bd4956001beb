//! 可中断调用模块
//!
//! 本模块提供对远端运动服务的阻塞调用进行协作式取消的能力，包括：
//! - 进程级中断信号（Ctrl+C → test-and-clear）
//! - 可取消调用句柄抽象（[`CancellableCall`]）
//! - 可中断调用控制器（[`CallController`]）：调用线程执行、调用方线程轮询、最多取消一次
//! - 结果分类（[`CallOutcome`]）：区分用户取消与服务端中止
//!
//! # 使用场景
//!
//! 执行运动序列、切换状态等可能持续数十秒的调用时，用户需要随时按 Ctrl+C 终止，
//! 而底层客户端的阻塞调用本身无法“select”中断信号。
//!
//! ```rust,no_run
//! use legged_call::{CallController, FnCall, InterruptSignal, NativeStatus};
//! use std::sync::Arc;
//!
//! InterruptSignal::global().install_ctrlc_handler()?;
//!
//! let call = FnCall::new(
//!     || NativeStatus::ok("execution-1"), // 阻塞的远端调用
//!     || {},                               // 取消该调用
//! );
//! let outcome = CallController::global().execute(Arc::new(call))?;
//! println!("{}", outcome);
//! # Ok::<(), legged_call::CallError>(())
//! ```

mod command;
mod controller;
mod error;
mod outcome;
mod signal;

pub use command::CommandCall;
pub use controller::{CallConfig, CallController, CancellableCall, FnCall};
pub use error::{CallError, CallFailure};
pub use outcome::{CallOutcome, CallStatus, NativeStatus};
pub use signal::InterruptSignal;
