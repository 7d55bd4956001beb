//! 配置到运行参数的转换
//!
//! `legged-tools` 不依赖核心模块，这里负责把 [`ClientConfig`] 翻译成
//! 各模块自己的配置类型。

use legged_call::CallConfig;
use legged_stream::{PipelineConfig, PumpOptions};
use legged_tools::{ClientConfig, PcmFormat};

/// 可中断调用配置
pub fn call_config(config: &ClientConfig) -> CallConfig {
    CallConfig {
        poll_interval: config.call.poll_interval(),
        ..CallConfig::default()
    }
}

/// 流水线配置
pub fn pipeline_config(config: &ClientConfig) -> PipelineConfig {
    PipelineConfig {
        capacity: config.stream.capacity,
        ..PipelineConfig::default()
    }
}

/// 消费循环配置
pub fn pump_options(config: &ClientConfig) -> PumpOptions {
    PumpOptions {
        idle_backoff: config.stream.idle_backoff(),
    }
}

/// 采集数据源每次读取的字节数
pub fn chunk_bytes(config: &ClientConfig, format: &PcmFormat) -> usize {
    config.stream.chunk_bytes(format)
}
