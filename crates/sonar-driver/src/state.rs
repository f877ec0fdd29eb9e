//! 共享状态定义
//!
//! IO 线程是唯一的写者，消费者线程只读：
//! - 最新读数：`ArcSwapOption`，整体替换不可变快照，读者永远看不到半更新的读数
//! - 采样率 / 指标 / 连接监测：原子计数器

use crate::health::ConnectionMonitor;
use crate::metrics::SonarMetrics;
use crate::sample_rate::SampleRateEstimator;
use arc_swap::ArcSwapOption;
use sonar_protocol::{DeviceVariant, Inches};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 一次完整帧解码后的读数快照
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// 串口原始读数（MB1013 为毫米，MB1200 为厘米）
    pub raw_magnitude: u32,
    /// 换算后的距离
    pub range: Inches,
    /// 产生该读数的传感器型号
    pub variant: DeviceVariant,
    /// 自通道建立以来的帧序号（从 1 开始）
    pub sequence: u64,
    /// 解码完成时刻
    pub received_at: Instant,
}

/// IO 线程与消费者之间共享的上下文
pub struct SonarContext {
    /// 最新读数（`None` 表示尚未解码出任何帧）
    pub reading: ArcSwapOption<Reading>,
    /// 有效帧到达率
    pub sample_rate: SampleRateEstimator,
    /// 连接健康监测
    pub connection: ConnectionMonitor,
    /// 链路指标
    pub metrics: SonarMetrics,
}

impl SonarContext {
    /// 创建新的上下文
    ///
    /// # 参数
    /// - `health_timeout`: 超过该时长未收到有效帧即视为连接降级
    pub fn new(health_timeout: Duration) -> Self {
        Self {
            reading: ArcSwapOption::empty(),
            sample_rate: SampleRateEstimator::new(),
            connection: ConnectionMonitor::new(health_timeout),
            metrics: SonarMetrics::new(),
        }
    }

    /// 最新读数（无锁）
    pub fn latest(&self) -> Option<Reading> {
        self.reading.load().as_deref().copied()
    }

    /// 发布新读数
    pub fn publish(&self, reading: Reading) {
        self.reading.store(Some(Arc::new(reading)));
    }
}

impl Default for SonarContext {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
