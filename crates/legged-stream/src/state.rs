//! 流水线生命周期状态
//!
//! ```text
//! Idle ──start()──▶ Running ──stop()/数据源结束──▶ Stopping ──join──▶ Stopped
//!   └───────────────────stop()（从未启动）────────────────────────────▶ Stopped
//! ```
//!
//! Stopped 为终态，没有任何迁出。

use std::sync::atomic::{AtomicU8, Ordering};

/// 流水线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PipelineState {
    /// 已创建，尚未启动（默认）
    #[default]
    Idle = 0,

    /// 生产线程运行中
    Running = 1,

    /// 已请求停止，或数据源已结束；生产线程尚未被 join
    Stopping = 2,

    /// 生产线程已退出并被 join
    Stopped = 3,
}

impl PipelineState {
    /// 从 u8 转换
    ///
    /// 无效值视为 Stopped（终态，不会再触发任何操作）。
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }

    /// 转换为 u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// 生产线程是否可能还在写入队列
    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    /// 是否为终态
    pub fn is_stopped(self) -> bool {
        self == Self::Stopped
    }
}

/// 流水线状态（原子版本，用于生产线程与控制方共享）
#[derive(Debug)]
pub struct AtomicPipelineState {
    inner: AtomicU8,
}

impl AtomicPipelineState {
    pub fn new(state: PipelineState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    /// 获取当前状态
    pub fn get(&self) -> PipelineState {
        PipelineState::from_u8(self.inner.load(Ordering::Acquire))
    }

    /// 设置状态
    pub fn set(&self, state: PipelineState) {
        self.inner.store(state.as_u8(), Ordering::Release);
    }

    /// 比较并交换
    ///
    /// 只有当前状态等于 `current` 时才迁移到 `new`，返回是否迁移成功。
    /// 生产线程用它做 Running → Stopping，避免覆盖控制方已写入的 Stopped。
    pub fn transition(&self, current: PipelineState, new: PipelineState) -> bool {
        self.inner
            .compare_exchange(
                current.as_u8(),
                new.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl Default for AtomicPipelineState {
    fn default() -> Self {
        Self::new(PipelineState::Idle)
    }
}
