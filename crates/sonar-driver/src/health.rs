//! 串口链路健康监测
//!
//! 记录最近一次有效帧的时刻，超过 `timeout` 没有新帧即视为链路降级
//! （拔线、断电、波特率错误都表现为"串口静默"）。
//!
//! 时刻以相对于监测器创建时刻的微秒数存放在 `AtomicU64` 中，
//! IO 线程写、任意线程读，不受系统时钟调整影响。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 链路状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// 尚未收到任何有效帧，仍在启动宽限期内
    Starting,
    /// 最近 `timeout` 内收到过有效帧
    Healthy,
    /// 超过 `timeout` 没有有效帧
    Stale,
}

/// 链路健康监测器
#[derive(Debug)]
pub struct ConnectionMonitor {
    created: Instant,
    /// 最近一帧的偏移（微秒）+ 1；0 表示从未收到
    last_frame_us: AtomicU64,
    timeout: Duration,
}

impl ConnectionMonitor {
    /// 创建监测器，启动宽限期从现在开始
    ///
    /// ```
    /// # use sonar_driver::health::{ConnectionMonitor, LinkState};
    /// # use std::time::Duration;
    /// let monitor = ConnectionMonitor::new(Duration::from_secs(1));
    /// assert_eq!(monitor.state(), LinkState::Starting);
    /// monitor.register_frame();
    /// assert_eq!(monitor.state(), LinkState::Healthy);
    /// ```
    pub fn new(timeout: Duration) -> Self {
        Self {
            created: Instant::now(),
            last_frame_us: AtomicU64::new(0),
            timeout,
        }
    }

    /// 记录一帧有效数据
    pub fn register_frame(&self) {
        self.register_frame_at(Instant::now());
    }

    pub fn register_frame_at(&self, at: Instant) {
        let offset = at.saturating_duration_since(self.created).as_micros() as u64;
        self.last_frame_us.store(offset + 1, Ordering::Release);
    }

    fn last_frame_offset(&self) -> Option<Duration> {
        match self.last_frame_us.load(Ordering::Acquire) {
            0 => None,
            us => Some(Duration::from_micros(us - 1)),
        }
    }

    /// 是否收到过有效帧
    pub fn has_seen_frame(&self) -> bool {
        self.last_frame_offset().is_some()
    }

    /// 距离最近一帧（从未收到则距离创建）的时长
    pub fn time_since_last_frame(&self) -> Duration {
        let since_created = self.created.elapsed();
        match self.last_frame_offset() {
            Some(offset) => since_created.saturating_sub(offset),
            None => since_created,
        }
    }

    pub fn state(&self) -> LinkState {
        let quiet = self.time_since_last_frame() >= self.timeout;
        match (self.has_seen_frame(), quiet) {
            (_, true) => LinkState::Stale,
            (false, false) => LinkState::Starting,
            (true, false) => LinkState::Healthy,
        }
    }

    /// 链路未降级（宽限期内或最近有帧）
    pub fn check_connection(&self) -> bool {
        self.state() != LinkState::Stale
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
