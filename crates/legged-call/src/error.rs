//! 调用层错误类型定义
//!
//! 两类错误严格区分：
//! - [`CallError`]：编程或运行环境错误（线程无法创建、调用体 panic），以 `Err` 返回
//! - [`CallFailure`]：正常运行中可能出现的失败（用户取消、远端失败、传输失败），
//!   由 [`CallOutcome::into_result`](crate::CallOutcome::into_result) 按需转换

use thiserror::Error;

/// 控制器错误类型
///
/// 只有前置条件被破坏时才会出现，取消、断线等属于正常结果，见 [`CallOutcome`](crate::CallOutcome)。
#[derive(Error, Debug)]
pub enum CallError {
    /// 无法创建调用线程
    #[error("Failed to spawn call thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// 调用线程 panic，没有产生任何状态
    #[error("Call thread panicked before reporting a status")]
    WorkerPanicked,

    /// 安装 Ctrl+C 处理器失败（通常是进程内已安装过）
    #[error("Failed to install interrupt handler: {0}")]
    SignalHandler(#[from] ctrlc::Error),
}

/// 调用失败分类
///
/// 调用方通过 `outcome.into_result()?` 决定用户取消是否算作失败，
/// 控制器本身只负责分类。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallFailure {
    /// 用户中断，已请求取消
    #[error("Call cancelled by user")]
    UserCancelled,

    /// 远端执行完毕但报告失败
    #[error("Remote reported failure: {0}")]
    RemoteFailure(String),

    /// 调用本身未能完成（网络、超时、协议）
    #[error("Transport failure: {0}")]
    TransportFailure(String),
}
