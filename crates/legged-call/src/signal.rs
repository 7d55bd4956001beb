//! 中断信号（Interrupt Signal）
//!
//! 进程级、单比特、边沿触发的中断标志：
//! - 由外部事件（Ctrl+C 处理器、其他线程）通过 [`InterruptSignal::raise`] 异步置位
//! - 由读取方通过 [`InterruptSignal::take`] 原子地测试并清除，每次置位最多被消费一次
//!
//! # 使用示例
//!
//! ```rust
//! use legged_call::InterruptSignal;
//!
//! let signal = InterruptSignal::new();
//! signal.raise();
//!
//! assert!(signal.take());   // 第一次读取：消费信号
//! assert!(!signal.take());  // 第二次读取：不会看到过期信号
//! ```

use crate::error::CallError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

static GLOBAL: OnceLock<InterruptSignal> = OnceLock::new();

/// 中断信号
///
/// 克隆得到的实例共享同一个标志位，可以把一个克隆交给信号处理器，另一个交给控制器。
#[derive(Debug, Clone, Default)]
pub struct InterruptSignal {
    raised: Arc<AtomicBool>,
}

impl InterruptSignal {
    /// 创建独立的中断信号（主要用于测试和嵌入场景）
    #[must_use]
    pub fn new() -> Self {
        Self {
            raised: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 进程级中断信号
    ///
    /// 所有调用返回同一个实例，Ctrl+C 处理器应安装在它上面。
    pub fn global() -> &'static InterruptSignal {
        GLOBAL.get_or_init(InterruptSignal::new)
    }

    /// 置位（可在任意线程、信号处理器中调用）
    pub fn raise(&self) {
        // Release：置位前的写入对消费方可见
        self.raised.store(true, Ordering::Release);
    }

    /// 原子地测试并清除
    ///
    /// 返回 `true` 表示本次调用消费了一次中断。
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::AcqRel)
    }

    /// 查看当前状态（不清除）
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// 丢弃尚未消费的中断
    pub fn clear(&self) {
        self.raised.store(false, Ordering::Release);
    }

    /// 将 Ctrl+C（SIGINT）接到此信号上
    ///
    /// 每个进程只能安装一次处理器，重复安装返回 [`CallError::SignalHandler`]。
    pub fn install_ctrlc_handler(&self) -> Result<(), CallError> {
        let signal = self.clone();
        ctrlc::set_handler(move || signal.raise())?;
        Ok(())
    }
}
