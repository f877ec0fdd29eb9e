//! 命令定义和实现

pub mod decode;
pub mod monitor;

pub use decode::DecodeCommand;
pub use monitor::MonitorCommand;
