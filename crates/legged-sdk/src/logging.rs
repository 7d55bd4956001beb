//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 安装全局 `tracing` 订阅者，返回本次调用是否完成了安装
///
/// 通常通过 [`init_logger!`](crate::init_logger) 调用。
pub fn init_logging(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }

    // log → tracing 桥接；已有 logger 时保持原状
    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::debug!("log bridge not installed: {}", e);
    }
    true
}
