//! 调用结果分类
//!
//! [`NativeStatus`] 是调用句柄自己报告的原始状态，[`CallOutcome`] 是控制器对外给出的结论。
//! 二者的区别在于“取消”：原始状态为 Cancelled 只说明调用被中止，
//! 只有本次调用确实发出过取消请求时才归类为用户取消。

use crate::error::CallFailure;
use std::fmt;

/// 调用句柄报告的原始状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeStatus {
    /// 调用完成（远端给出了应答，应答本身可能是失败）
    Finished { success: bool, detail: String },
    /// 调用被中止（可能是我们请求的，也可能是服务端主动中止）
    Cancelled { detail: String },
    /// 传输层错误（网络、超时、协议）
    TransportError { detail: String },
}

impl NativeStatus {
    /// 成功完成
    pub fn ok(detail: impl Into<String>) -> Self {
        Self::Finished {
            success: true,
            detail: detail.into(),
        }
    }

    /// 远端报告失败
    pub fn failed(detail: impl Into<String>) -> Self {
        Self::Finished {
            success: false,
            detail: detail.into(),
        }
    }

    /// 调用被中止
    pub fn cancelled(detail: impl Into<String>) -> Self {
        Self::Cancelled {
            detail: detail.into(),
        }
    }

    /// 传输层错误
    pub fn transport(detail: impl Into<String>) -> Self {
        Self::TransportError {
            detail: detail.into(),
        }
    }
}

/// 原始状态分类器
///
/// 调用句柄的返回类型实现此 trait，把自身协议的状态码映射到 [`NativeStatus`]。
///
/// # 示例
///
/// ```rust
/// use legged_call::{CallStatus, NativeStatus};
///
/// struct RpcStatus {
///     code: i32,
///     message: String,
/// }
///
/// impl CallStatus for RpcStatus {
///     fn classify(&self) -> NativeStatus {
///         match self.code {
///             0 => NativeStatus::ok(self.message.clone()),
///             1 => NativeStatus::cancelled(self.message.clone()),
///             _ => NativeStatus::transport(self.message.clone()),
///         }
///     }
/// }
///
/// let status = RpcStatus { code: 1, message: "CANCELLED".into() };
/// assert_eq!(status.classify(), NativeStatus::cancelled("CANCELLED"));
/// ```
pub trait CallStatus {
    fn classify(&self) -> NativeStatus;
}

impl CallStatus for NativeStatus {
    fn classify(&self) -> NativeStatus {
        self.clone()
    }
}

/// 一次受控调用的最终结果
///
/// 每次 [`CallController::execute`](crate::CallController::execute) 恰好产生一个。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// 调用完成，`success` 为远端给出的结论
    Completed { success: bool, detail: String },
    /// 本次调用期间请求了取消，且调用以取消结束
    Cancelled { by_user: bool },
    /// 调用未能完成
    TransportFailed { detail: String },
}

impl CallOutcome {
    /// 根据原始状态和本次是否请求过取消得出结论
    ///
    /// - `Finished` 一律为 `Completed`（取消请求来得太晚，没有生效）
    /// - `Cancelled` 只有在本次请求过取消时才是用户取消，否则视为服务端中止
    /// - `TransportError` 一律为 `TransportFailed`
    pub fn classify(native: NativeStatus, cancel_requested: bool) -> Self {
        match native {
            NativeStatus::Finished { success, detail } => Self::Completed { success, detail },
            NativeStatus::Cancelled { .. } if cancel_requested => Self::Cancelled { by_user: true },
            NativeStatus::Cancelled { detail } => Self::TransportFailed {
                detail: format!("aborted without a cancel request: {}", detail),
            },
            NativeStatus::TransportError { detail } => Self::TransportFailed { detail },
        }
    }

    /// 是否成功完成
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { success: true, .. })
    }

    /// 是否被取消
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// 转换为 `Result`，成功时返回远端给出的说明
    pub fn into_result(self) -> Result<String, CallFailure> {
        match self {
            Self::Completed {
                success: true,
                detail,
            } => Ok(detail),
            Self::Completed {
                success: false,
                detail,
            } => Err(CallFailure::RemoteFailure(detail)),
            Self::Cancelled { .. } => Err(CallFailure::UserCancelled),
            Self::TransportFailed { detail } => Err(CallFailure::TransportFailure(detail)),
        }
    }
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed {
                success: true,
                detail,
            } => write!(f, "completed: {}", detail),
            Self::Completed {
                success: false,
                detail,
            } => write!(f, "failed: {}", detail),
            Self::Cancelled { by_user: true } => write!(f, "cancelled by user"),
            Self::Cancelled { by_user: false } => write!(f, "cancelled"),
            Self::TransportFailed { detail } => write!(f, "transport failed: {}", detail),
        }
    }
}
