//! 可中断调用控制器（Interruptible Call Controller）
//!
//! 负责在专用线程上执行一次阻塞、可取消的调用，同时在调用方线程上轮询中断信号，
//! 在不要求调用本身感知中断的前提下实现协作式取消。
//!
//! # 线程模型
//!
//! ```text
//! 调用方线程（轮询）                    调用线程
//! ──────────────────                    ────────
//! spawn ───────────────────────────────▶ handle.invoke()（可能长时间阻塞）
//! loop {                                     │
//!   recv_timeout(poll_interval)              │
//!   超时 → signal.take() ? handle.cancel()   │
//! } ◀──────────── 完成通道（一次性）──────── send(status)
//! join
//! ```
//!
//! - 取消请求每次调用最多发出一次；之后的中断不被本次调用消费，留给调用方处理
//! - 取消只是建议性的，可能与自然完成竞争，两种结果都会被正确分类
//! - 调用本身没有超时，只有中断路径能缩短等待时间

use crate::error::CallError;
use crate::outcome::{CallOutcome, CallStatus};
use crate::signal::InterruptSignal;
use crossbeam_channel::{RecvTimeoutError, bounded};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 可取消调用句柄
///
/// 句柄在调用线程上被 `invoke`，在轮询线程上被 `cancel`，因此要求 `Send + Sync`。
///
/// # 实现要求
///
/// - `invoke` 阻塞直到调用结束，返回原始状态
/// - `cancel` 即发即忘，可能与自然完成竞争，不能 panic
pub trait CancellableCall: Send + Sync + 'static {
    /// 原始状态类型
    type Status: CallStatus + Send + 'static;

    /// 执行调用（阻塞）
    fn invoke(&self) -> Self::Status;

    /// 请求取消（非阻塞）
    fn cancel(&self);
}

/// 由两个闭包组成的调用句柄
///
/// 适合把已有客户端的“阻塞调用 + 取消上下文”直接包装起来。
///
/// # 示例
///
/// ```rust
/// use legged_call::{CallController, FnCall, InterruptSignal, NativeStatus};
/// use std::sync::Arc;
///
/// let call = FnCall::new(|| NativeStatus::ok("execution-1"), || {});
/// let controller = CallController::new(InterruptSignal::new());
///
/// let outcome = controller.execute(Arc::new(call)).unwrap();
/// assert!(outcome.is_success());
/// ```
pub struct FnCall<I, C> {
    invoke: I,
    cancel: C,
}

impl<I, C> FnCall<I, C> {
    pub fn new(invoke: I, cancel: C) -> Self {
        Self { invoke, cancel }
    }
}

impl<I, C, S> CancellableCall for FnCall<I, C>
where
    I: Fn() -> S + Send + Sync + 'static,
    C: Fn() + Send + Sync + 'static,
    S: CallStatus + Send + 'static,
{
    type Status = S;

    fn invoke(&self) -> S {
        (self.invoke)()
    }

    fn cancel(&self) {
        (self.cancel)()
    }
}

/// 控制器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallConfig {
    /// 轮询间隔，决定取消延迟的上限
    pub poll_interval: Duration,
    /// 调用线程名称
    pub thread_name: String,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            thread_name: "legged-call".to_string(),
        }
    }
}

/// 可中断调用控制器
///
/// 控制器本身无状态，可重复使用；每次 [`execute`](Self::execute) 是一次独立调用。
#[derive(Debug, Clone)]
pub struct CallController {
    signal: InterruptSignal,
    config: CallConfig,
}

impl CallController {
    /// 使用默认配置创建控制器
    pub fn new(signal: InterruptSignal) -> Self {
        Self::with_config(signal, CallConfig::default())
    }

    pub fn with_config(signal: InterruptSignal, config: CallConfig) -> Self {
        Self { signal, config }
    }

    /// 绑定进程级中断信号的控制器
    pub fn global() -> Self {
        Self::new(InterruptSignal::global().clone())
    }

    pub fn signal(&self) -> &InterruptSignal {
        &self.signal
    }

    pub fn config(&self) -> &CallConfig {
        &self.config
    }

    /// 执行一次可中断调用
    ///
    /// 阻塞直到调用结束（自然完成或取消生效），返回分类后的结果。
    /// 网络错误、远端失败、用户取消都以 `Ok(CallOutcome)` 返回；
    /// 只有调用线程无法创建或 panic 时返回 `Err`。
    pub fn execute<H: CancellableCall>(&self, handle: Arc<H>) -> Result<CallOutcome, CallError> {
        // 容量 1：调用线程发送后立即退出，不依赖轮询方是否还在接收
        let (done_tx, done_rx) = bounded::<H::Status>(1);
        let worker_handle = Arc::clone(&handle);
        let started = Instant::now();

        let worker = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || {
                let status = worker_handle.invoke();
                let _ = done_tx.send(status);
            })?;

        debug!(
            "Call launched on thread '{}', polling every {:?}",
            self.config.thread_name, self.config.poll_interval
        );

        let mut cancel_requested = false;
        let status = loop {
            match done_rx.recv_timeout(self.config.poll_interval) {
                Ok(status) => break Some(status),
                Err(RecvTimeoutError::Timeout) => {
                    // 取消只发一次，之后的中断留给调用方
                    if !cancel_requested && self.signal.take() {
                        cancel_requested = true;
                        info!(
                            "Interrupt received after {:?}, requesting cancellation",
                            started.elapsed()
                        );
                        handle.cancel();
                    }
                },
                Err(RecvTimeoutError::Disconnected) => break None,
            }
        };

        // 状态已送达，调用线程随即退出
        let joined = worker.join();

        let Some(status) = status else {
            warn!("Call thread exited without reporting a status");
            return Err(CallError::WorkerPanicked);
        };
        if joined.is_err() {
            warn!("Call thread panicked after reporting its status");
        }

        let outcome = CallOutcome::classify(status.classify(), cancel_requested);
        match &outcome {
            CallOutcome::TransportFailed { detail } => {
                warn!("Call transport failure after {:?}: {}", started.elapsed(), detail)
            },
            _ => debug!("Call finished after {:?}: {}", started.elapsed(), outcome),
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::NativeStatus;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    /// 按脚本运行的调用句柄
    ///
    /// - 运行 `duration` 后自然结束，返回 `natural`
    /// - 若 `honor_cancel` 为真，收到取消后尽快以 Cancelled 结束
    /// - 若在结束前收到过取消，返回 `on_cancel`
    struct ScriptedCall {
        duration: Duration,
        natural: NativeStatus,
        on_cancel: NativeStatus,
        honor_cancel: bool,
        cancelled: AtomicBool,
        cancel_count: AtomicU64,
    }

    impl ScriptedCall {
        fn new(duration: Duration, natural: NativeStatus) -> Self {
            Self {
                duration,
                natural,
                on_cancel: NativeStatus::cancelled("CANCELLED"),
                honor_cancel: false,
                cancelled: AtomicBool::new(false),
                cancel_count: AtomicU64::new(0),
            }
        }

        fn honoring_cancel(mut self) -> Self {
            self.honor_cancel = true;
            self
        }

        fn cancel_count(&self) -> u64 {
            self.cancel_count.load(Ordering::SeqCst)
        }
    }

    impl CancellableCall for ScriptedCall {
        type Status = NativeStatus;

        fn invoke(&self) -> NativeStatus {
            let start = Instant::now();
            while start.elapsed() < self.duration {
                if self.honor_cancel && self.cancelled.load(Ordering::SeqCst) {
                    break;
                }
                thread::sleep(Duration::from_millis(2));
            }
            if self.cancelled.load(Ordering::SeqCst) {
                self.on_cancel.clone()
            } else {
                self.natural.clone()
            }
        }

        fn cancel(&self) {
            self.cancel_count.fetch_add(1, Ordering::SeqCst);
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }

    fn raise_after(signal: &InterruptSignal, delay: Duration) -> thread::JoinHandle<()> {
        let signal = signal.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            signal.raise();
        })
    }

    fn fast_config() -> CallConfig {
        CallConfig {
            poll_interval: Duration::from_millis(10),
            ..CallConfig::default()
        }
    }

    #[test]
    fn test_interrupt_before_completion_is_user_cancel() {
        // 50ms 中断，调用在 200ms 以 CANCELLED 自然结束
        let signal = InterruptSignal::new();
        let controller = CallController::new(signal.clone());
        let call = Arc::new(ScriptedCall::new(
            Duration::from_millis(200),
            NativeStatus::ok("done"),
        ));

        let raiser = raise_after(&signal, Duration::from_millis(50));
        let outcome = controller.execute(Arc::clone(&call)).unwrap();
        raiser.join().unwrap();

        assert_eq!(outcome, CallOutcome::Cancelled { by_user: true });
        assert_eq!(call.cancel_count(), 1);
        assert!(!signal.is_raised(), "interrupt should have been consumed");
    }

    #[test]
    fn test_late_interrupt_is_ignored() {
        // 50ms 成功完成，60ms 才中断
        let signal = InterruptSignal::new();
        let controller = CallController::new(signal.clone());
        let call = Arc::new(ScriptedCall::new(
            Duration::from_millis(50),
            NativeStatus::ok("execution-7"),
        ));

        let raiser = raise_after(&signal, Duration::from_millis(60));
        let outcome = controller.execute(Arc::clone(&call)).unwrap();
        raiser.join().unwrap();

        assert_eq!(
            outcome,
            CallOutcome::Completed {
                success: true,
                detail: "execution-7".to_string()
            }
        );
        assert_eq!(call.cancel_count(), 0);
        // 本次调用没有消费它，调用方仍能看到
        assert!(signal.take());
    }

    #[test]
    fn test_no_interrupt_mirrors_native_status() {
        let cases = vec![
            (
                NativeStatus::ok("ok"),
                CallOutcome::Completed {
                    success: true,
                    detail: "ok".to_string(),
                },
            ),
            (
                NativeStatus::failed("robot not ready"),
                CallOutcome::Completed {
                    success: false,
                    detail: "robot not ready".to_string(),
                },
            ),
            (
                NativeStatus::transport("UNAVAILABLE"),
                CallOutcome::TransportFailed {
                    detail: "UNAVAILABLE".to_string(),
                },
            ),
        ];

        let controller = CallController::with_config(InterruptSignal::new(), fast_config());
        for (native, expected) in cases {
            let call = Arc::new(ScriptedCall::new(Duration::from_millis(30), native));
            let outcome = controller.execute(Arc::clone(&call)).unwrap();
            assert_eq!(outcome, expected);
            assert_eq!(call.cancel_count(), 0);
        }
    }

    #[test]
    fn test_server_abort_is_transport_failure() {
        let controller = CallController::with_config(InterruptSignal::new(), fast_config());
        let call = Arc::new(ScriptedCall::new(
            Duration::from_millis(20),
            NativeStatus::cancelled("CANCELLED by server"),
        ));

        let outcome = controller.execute(call).unwrap();
        assert!(matches!(outcome, CallOutcome::TransportFailed { .. }));
    }

    #[test]
    fn test_second_interrupt_does_not_cancel_twice() {
        // 句柄不理会取消，400ms 后才结束；期间中断两次
        let signal = InterruptSignal::new();
        let controller = CallController::with_config(signal.clone(), fast_config());
        let call = Arc::new(ScriptedCall::new(
            Duration::from_millis(400),
            NativeStatus::ok("done"),
        ));

        let first = raise_after(&signal, Duration::from_millis(50));
        let second = raise_after(&signal, Duration::from_millis(200));
        let outcome = controller.execute(Arc::clone(&call)).unwrap();
        first.join().unwrap();
        second.join().unwrap();

        assert_eq!(outcome, CallOutcome::Cancelled { by_user: true });
        assert_eq!(call.cancel_count(), 1);
        // 第二次中断留给调用方
        assert!(signal.take());
    }

    #[test]
    fn test_cancel_latency_bounded_by_poll_interval() {
        let signal = InterruptSignal::new();
        let controller = CallController::new(signal.clone());
        let call = Arc::new(
            ScriptedCall::new(Duration::from_secs(10), NativeStatus::ok("never")).honoring_cancel(),
        );

        signal.raise();
        let start = Instant::now();
        let outcome = controller.execute(Arc::clone(&call)).unwrap();
        let elapsed = start.elapsed();

        assert!(outcome.is_cancelled());
        assert!(
            elapsed < Duration::from_millis(500),
            "cancellation took {:?}",
            elapsed
        );
    }

    #[test]
    fn test_cancel_racing_success_reports_completed() {
        // 句柄收到取消后仍返回成功：以原始状态为准
        let signal = InterruptSignal::new();
        let controller = CallController::with_config(signal.clone(), fast_config());
        let mut scripted = ScriptedCall::new(Duration::from_millis(80), NativeStatus::ok("done"));
        scripted.on_cancel = NativeStatus::ok("done");
        let call = Arc::new(scripted);

        signal.raise();
        let outcome = controller.execute(Arc::clone(&call)).unwrap();

        assert!(outcome.is_success());
        assert_eq!(call.cancel_count(), 1);
    }

    #[test]
    fn test_worker_panic_is_error() {
        let controller = CallController::with_config(InterruptSignal::new(), fast_config());
        let call = FnCall::new(
            || -> NativeStatus { panic!("invoke exploded") },
            || {},
        );

        let result = controller.execute(Arc::new(call));
        assert!(matches!(result, Err(CallError::WorkerPanicked)));
    }

    #[test]
    fn test_fn_call_cancel_is_forwarded() {
        let signal = InterruptSignal::new();
        let controller = CallController::with_config(signal.clone(), fast_config());
        let cancelled = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&cancelled);
        let observed = Arc::clone(&cancelled);
        let call = FnCall::new(
            move || {
                while !observed.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(2));
                }
                NativeStatus::cancelled("CANCELLED")
            },
            move || flag.store(true, Ordering::SeqCst),
        );

        signal.raise();
        let outcome = controller.execute(Arc::new(call)).unwrap();
        assert_eq!(outcome, CallOutcome::Cancelled { by_user: true });
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[test]
    fn test_controller_is_reusable() {
        let signal = InterruptSignal::new();
        let controller = CallController::with_config(signal.clone(), fast_config());

        signal.raise();
        let first = controller
            .execute(Arc::new(
                ScriptedCall::new(Duration::from_millis(100), NativeStatus::ok("a")).honoring_cancel(),
            ))
            .unwrap();
        assert!(first.is_cancelled());

        // 上一次的中断已被消费，不会影响下一次调用
        let second = controller
            .execute(Arc::new(ScriptedCall::new(
                Duration::from_millis(30),
                NativeStatus::ok("b"),
            )))
            .unwrap();
        assert!(second.is_success());
    }

    #[test]
    fn test_default_config() {
        let config = CallConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.thread_name, "legged-call");
    }
}
