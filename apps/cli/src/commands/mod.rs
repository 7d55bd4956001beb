//! 命令定义和实现

pub mod call;
pub mod config;
pub mod stream;

pub use call::CallCommand;
pub use config::ConfigCommand;
pub use stream::StreamCommand;
