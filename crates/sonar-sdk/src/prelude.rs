//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use sonar_sdk::prelude::*;
//! ```

// 驱动层
pub use crate::driver::{MetricsSnapshot, PipelineConfig, Reading, Sonar, SonarBuilder};

// 协议层
pub use crate::protocol::{DeviceVariant, Inches};

// 通道层（常用 Trait）
pub use crate::io::{AnalogInput, SerialChannel};

// 错误类型
pub use crate::driver::DriverError;
pub use crate::io::ChannelError;
pub use crate::protocol::ProtocolError;
