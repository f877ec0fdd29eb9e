//! 驱动性能指标模块
//!
//! 提供零开销的原子计数器，用于监控串口链路的健康状态。
//! 所有计数器都使用原子操作，可以在任何线程安全地读取，不会引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 实时指标
///
/// # 使用示例
///
/// ```rust
/// use sonar_driver::SonarMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = SonarMetrics::default();
/// metrics.frames_valid.fetch_add(1, Ordering::Relaxed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.frames_valid, 1);
/// ```
#[derive(Debug, Default)]
pub struct SonarMetrics {
    /// `read_chunk` 调用总次数
    pub reads_total: AtomicU64,

    /// 收到的原始字节数
    pub bytes_received: AtomicU64,

    /// 成功解码的帧数
    pub frames_valid: AtomicU64,

    /// 被丢弃的畸形帧数（非法字节、空帧、数值溢出）
    pub frames_malformed: AtomicU64,

    /// 空读取次数（零字节或读取超时，正常现象）
    pub idle_reads: AtomicU64,

    /// 读取错误次数（设备断开、IO 错误等）
    ///
    /// 持续增长说明串口处于降级状态，IO 线程会按退避间隔不断重试。
    pub read_errors: AtomicU64,
}

impl SonarMetrics {
    /// 创建新的指标实例（所有计数器初始化为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指标快照
    ///
    /// 各计数器分别原子读取，不同计数器之间可能有微小的时间差。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reads_total: self.reads_total.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            frames_valid: self.frames_valid.load(Ordering::Relaxed),
            frames_malformed: self.frames_malformed.load(Ordering::Relaxed),
            idle_reads: self.idle_reads.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.reads_total.store(0, Ordering::Relaxed);
        self.bytes_received.store(0, Ordering::Relaxed);
        self.frames_valid.store(0, Ordering::Relaxed);
        self.frames_malformed.store(0, Ordering::Relaxed);
        self.idle_reads.store(0, Ordering::Relaxed);
        self.read_errors.store(0, Ordering::Relaxed);
    }
}

/// 指标快照（不可变）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub reads_total: u64,
    pub bytes_received: u64,
    pub frames_valid: u64,
    pub frames_malformed: u64,
    pub idle_reads: u64,
    pub read_errors: u64,
}

impl MetricsSnapshot {
    /// 畸形帧占全部帧的比例（0.0 ~ 1.0）
    pub fn malformed_ratio(&self) -> f64 {
        let total = self.frames_valid + self.frames_malformed;
        if total == 0 {
            0.0
        } else {
            self.frames_malformed as f64 / total as f64
        }
    }
}
