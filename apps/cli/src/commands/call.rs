//! 可中断调用命令
//!
//! 在可中断控制器下运行外部程序：Ctrl+C 只取消这一次调用，进程本身正常退出。

use anyhow::{Context, Result, bail};
use clap::Args;
use legged_sdk::call::{CallController, CallFailure, CommandCall, InterruptSignal};
use legged_sdk::settings;
use legged_sdk::tools::ClientConfig;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 用户取消时的退出码（与 shell 中 SIGINT 的约定一致）
const EXIT_CANCELLED: u8 = 130;

/// 调用命令参数
#[derive(Args, Debug)]
pub struct CallCommand {
    /// 中断轮询间隔（毫秒，覆盖配置）
    #[arg(long = "poll-ms")]
    pub poll_ms: Option<u64>,

    /// 要执行的程序及其参数（放在 `--` 之后）
    #[arg(required = true, last = true)]
    pub command: Vec<String>,
}

impl CallCommand {
    /// 执行调用
    pub fn execute(&self, config: &ClientConfig) -> Result<ExitCode> {
        let mut call_config = settings::call_config(config);
        if let Some(poll_ms) = self.poll_ms {
            if poll_ms == 0 {
                bail!("--poll-ms must be greater than 0");
            }
            call_config.poll_interval = Duration::from_millis(poll_ms);
        }

        let Some((program, args)) = self.command.split_first() else {
            bail!("No program given");
        };
        let call = CommandCall::new(program.as_str()).args(args.iter().cloned());

        let signal = InterruptSignal::global();
        signal
            .install_ctrlc_handler()
            .context("Failed to install Ctrl+C handler")?;
        let controller = CallController::with_config(signal.clone(), call_config);

        println!("▶️  执行: {}", call.command_line());
        info!(
            "Running `{}` (poll interval {:?})",
            call.program(),
            controller.config().poll_interval
        );

        let outcome = controller.execute(Arc::new(call))?;

        match outcome.into_result() {
            Ok(detail) => {
                println!("✅ 完成: {}", detail);
                Ok(ExitCode::SUCCESS)
            },
            Err(CallFailure::UserCancelled) => {
                println!("⚠️  已取消");
                Ok(ExitCode::from(EXIT_CANCELLED))
            },
            Err(failure) => {
                eprintln!("❌ {}", failure);
                Ok(ExitCode::FAILURE)
            },
        }
    }
}
