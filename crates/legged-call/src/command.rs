//! 外部程序调用句柄
//!
//! 把一个外部程序的完整运行过程包装成 [`CancellableCall`]：
//! `invoke` 启动子进程并等待其退出，`cancel` 结束子进程。
//! 命令行工具用它在 Ctrl+C 下安全地运行长时间任务（例如调用厂商的运动序列工具）。
//!
//! # 状态映射
//!
//! | 情况 | 原始状态 |
//! |------|----------|
//! | 退出码 0 | `Finished { success: true }` |
//! | 非零退出码（未请求取消） | `Finished { success: false }` |
//! | 请求取消后以失败退出 | `Cancelled` |
//! | 被他人发出的信号终止 | `TransportError` |
//! | 启动或等待失败 | `TransportError` |

use crate::controller::CancellableCall;
use crate::outcome::NativeStatus;
use parking_lot::Mutex;
use std::process::{Child, Command, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// 子进程状态轮询间隔
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 外部程序调用句柄
///
/// 每个句柄只运行一次；需要再次运行时创建新的句柄。
///
/// # 示例
///
/// ```rust,no_run
/// use legged_call::{CallController, CommandCall, InterruptSignal};
/// use std::sync::Arc;
///
/// let call = CommandCall::new("sleep").arg("5");
/// let controller = CallController::new(InterruptSignal::global().clone());
/// let outcome = controller.execute(Arc::new(call)).unwrap();
/// println!("{}", outcome);
/// ```
#[derive(Debug)]
pub struct CommandCall {
    program: String,
    args: Vec<String>,
    /// 运行中的子进程，`cancel` 通过它结束进程
    child: Mutex<Option<Child>>,
    cancel_requested: AtomicBool,
}

impl CommandCall {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            child: Mutex::new(None),
            cancel_requested: AtomicBool::new(false),
        }
    }

    /// 追加一个参数
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// 追加多个参数
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// 可读的命令行（用于日志）
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);

        // 子进程放进独立进程组：终端的 Ctrl+C 只送达本进程，由控制器决定是否取消
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        command
    }

    fn classify_exit(&self, status: ExitStatus) -> NativeStatus {
        if status.success() {
            return NativeStatus::ok(status.to_string());
        }
        if self.cancel_requested.load(Ordering::Acquire) {
            return NativeStatus::cancelled(status.to_string());
        }
        match status.code() {
            Some(_) => NativeStatus::failed(status.to_string()),
            // 没有退出码：被我们以外的信号终止
            None => NativeStatus::transport(format!("`{}` {}", self.program, status)),
        }
    }
}

impl CancellableCall for CommandCall {
    type Status = NativeStatus;

    fn invoke(&self) -> NativeStatus {
        {
            let mut slot = self.child.lock();
            if slot.is_some() {
                return NativeStatus::transport(format!("`{}` is already running", self.program));
            }
            // 取消先于启动到达：不再启动
            if self.cancel_requested.load(Ordering::Acquire) {
                return NativeStatus::cancelled("cancelled before start");
            }
            match self.build_command().spawn() {
                Ok(child) => {
                    debug!("Spawned `{}` (pid {})", self.command_line(), child.id());
                    *slot = Some(child);
                },
                Err(e) => {
                    return NativeStatus::transport(format!(
                        "failed to spawn `{}`: {}",
                        self.program, e
                    ));
                },
            }
        }

        // 轮询 try_wait，不长时间持锁，保证 cancel 随时能拿到子进程
        loop {
            let waited = {
                let mut slot = self.child.lock();
                match slot.as_mut() {
                    Some(child) => child.try_wait(),
                    None => {
                        return NativeStatus::transport(format!(
                            "`{}` handle lost while running",
                            self.program
                        ));
                    },
                }
            };

            match waited {
                Ok(Some(status)) => {
                    self.child.lock().take();
                    return self.classify_exit(status);
                },
                Ok(None) => thread::sleep(WAIT_POLL_INTERVAL),
                Err(e) => {
                    self.child.lock().take();
                    return NativeStatus::transport(format!(
                        "failed to wait for `{}`: {}",
                        self.program, e
                    ));
                },
            }
        }
    }

    fn cancel(&self) {
        self.cancel_requested.store(true, Ordering::Release);

        let mut slot = self.child.lock();
        if let Some(child) = slot.as_mut() {
            debug!("Killing `{}` (pid {})", self.program, child.id());
            // 进程可能已自然退出，kill 失败不影响结果
            if let Err(e) = child.kill() {
                warn!("Failed to kill `{}`: {}", self.program, e);
            }
        }
    }
}
