//! 驱动层模块
//!
//! 本模块提供 MaxBotix 超声波测距仪的设备驱动功能，包括：
//! - IO 线程管理（空闲退避、协作式退出）
//! - 读数发布（ArcSwap 无锁读取，不会出现撕裂读）
//! - 帧解码与单位换算
//! - 采样率统计与连接健康监测
//!
//! # 使用场景
//!
//! ```no_run
//! use sonar_driver::SonarBuilder;
//! use sonar_protocol::DeviceVariant;
//!
//! let sonar = SonarBuilder::new()
//!     .variant(DeviceVariant::Mb1013)
//!     .reader_device("/dev/ttyUSB0")
//!     .build()
//!     .unwrap();
//!
//! if let Some(range) = sonar.current_range() {
//!     println!("range: {:.2}, rate: {:.1} Hz", range, sonar.current_rate());
//! }
//! ```

mod builder;
pub mod decoder;
mod error;
pub mod health;
pub mod metrics;
pub mod pipeline;
pub mod sample_rate;
mod sonar;
pub mod state;

pub use builder::SonarBuilder;
pub use decoder::RangeDecoder;
pub use error::DriverError;
pub use health::{ConnectionMonitor, LinkState};
pub use metrics::{MetricsSnapshot, SonarMetrics};
pub use pipeline::{PipelineConfig, io_loop};
pub use sample_rate::{SampleRateCounts, SampleRateEstimator};
pub use sonar::Sonar;
pub use state::{Reading, SonarContext};
