//! # Legged Tools - 共享配置与数据格式
//!
//! **依赖原则**: 不依赖任何 workspace crate，`legged-call` / `legged-stream` 也不依赖本 crate，
//! 由应用层（CLI、`legged-sdk`）把配置翻译成各模块的参数。
//!
//! ## 包含模块
//!
//! - `config` - 客户端配置（TOML 文件）
//! - `pcm` - PCM 音频格式与分块大小计算

pub mod config;
pub mod pcm;

pub use config::{CallSettings, ClientConfig, ConfigError, MAX_CHUNK_MS, StreamSettings};
pub use pcm::PcmFormat;
