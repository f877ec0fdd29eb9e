//! Sonar SDK - MaxBotix 超声波测距仪 Rust SDK
//!
//! 同时支持串口（`R` + 数字 + `CR` 帧）与模拟量两路读数，
//! 后台 IO 线程空闲时退避等待，读数以不可变快照原子发布。
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **通道层** (`io`): 串口 / 模拟量硬件抽象，支持真实串口、文件流和 sysfs
//! - **协议层** (`protocol`): 增量帧解析与单位换算
//! - **驱动层** (`driver`): IO 线程管理、读数发布、采样率统计
//!
//! # 快速开始
//!
//! ```no_run
//! use sonar_sdk::prelude::*;
//!
//! sonar_sdk::init_logger();
//!
//! let sonar = SonarBuilder::new()
//!     .variant(DeviceVariant::Mb1013)
//!     .reader_device("/dev/ttyUSB0")
//!     .build()
//!     .unwrap();
//!
//! match sonar.current_range() {
//!     Some(range) => println!("{:.2}", range),
//!     None => println!("unavailable"),
//! }
//! ```

pub mod prelude;

/// 通道层
pub mod io {
    pub use sonar_io::*;
}

/// 协议层
pub mod protocol {
    pub use sonar_protocol::*;
}

/// 驱动层
pub mod driver {
    pub use sonar_driver::*;
}

// --- 常用类型 ---
pub use sonar_driver::{DriverError, PipelineConfig, Reading, Sonar, SonarBuilder};
pub use sonar_io::{AnalogInput, ChannelError, SerialChannel};
pub use sonar_protocol::{DeviceVariant, FrameParser, Inches, ProtocolError};

/// 初始化日志（`RUST_LOG` 控制级别，默认 info）
///
/// 同时把 `log` crate 的记录桥接到 tracing。重复调用是安全的，
/// 只有第一次生效。
pub fn init_logger() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();

    let _ = tracing_log::LogTracer::init();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
}
