//! 采样率统计模块
//!
//! 统计有效帧的到达频率（Frames Per Second），用于报告与诊断。
//!
//! 采用"读取即重置"的窗口：每次查询返回自上次查询以来的平均到达率，
//! 然后开启新窗口。相比固定长度的滑动平均，这种方式能更快反映
//! 突发或稀疏的到达。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 窗口时长下限（避免除零，至少 1ms）
const MIN_WINDOW_SECS: f64 = 0.001;

/// 采样率估计器
///
/// 所有状态都是原子变量，时间以相对于 `anchor` 的微秒数存储，
/// 因此 IO 线程调用 `record_arrival` 与任意数量的消费者调用
/// `current_rate` 可以并发进行，无需加锁。
#[derive(Debug)]
pub struct SampleRateEstimator {
    /// 时间基准点（创建时确定，之后不变）
    anchor: Instant,
    /// 当前窗口内的到达次数
    window_count: AtomicU64,
    /// 当前窗口开始时间（相对 anchor 的微秒数）
    window_start_us: AtomicU64,
    /// 累计到达次数（不随窗口重置）
    total: AtomicU64,
    /// 最近一次到达时间（相对 anchor 的微秒数 + 1，0 表示尚无到达）
    last_arrival_us: AtomicU64,
}

impl SampleRateEstimator {
    /// 创建新的估计器，窗口从当前时刻开始
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// 创建新的估计器，窗口从 `start` 开始
    ///
    /// 早于 `start` 的时间戳都按 `start` 处理。
    pub fn starting_at(start: Instant) -> Self {
        Self {
            anchor: start,
            window_count: AtomicU64::new(0),
            window_start_us: AtomicU64::new(0),
            total: AtomicU64::new(0),
            last_arrival_us: AtomicU64::new(0),
        }
    }

    fn micros_since_anchor(&self, t: Instant) -> u64 {
        t.saturating_duration_since(self.anchor).as_micros() as u64
    }

    /// 记录一次到达
    pub fn record_arrival(&self, timestamp: Instant) {
        let at_us = self.micros_since_anchor(timestamp);
        self.window_count.fetch_add(1, Ordering::AcqRel);
        self.total.fetch_add(1, Ordering::Relaxed);
        self.last_arrival_us.store(at_us + 1, Ordering::Release);
    }

    /// 计算自上次查询以来的到达率（次/秒），并开启新窗口
    pub fn current_rate(&self) -> f64 {
        self.current_rate_at(Instant::now())
    }

    /// 以 `now` 为窗口结束时刻计算到达率，并开启新窗口
    pub fn current_rate_at(&self, now: Instant) -> f64 {
        let now_us = self.micros_since_anchor(now);
        let start_us = self.window_start_us.swap(now_us, Ordering::AcqRel);
        let count = self.window_count.swap(0, Ordering::AcqRel);
        Self::rate(count, now_us.saturating_sub(start_us))
    }

    /// 计算当前窗口的到达率，但不重置窗口
    pub fn peek_rate_at(&self, now: Instant) -> f64 {
        let now_us = self.micros_since_anchor(now);
        let start_us = self.window_start_us.load(Ordering::Acquire);
        let count = self.window_count.load(Ordering::Acquire);
        Self::rate(count, now_us.saturating_sub(start_us))
    }

    fn rate(count: u64, elapsed_us: u64) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let elapsed_secs = (elapsed_us as f64 / 1_000_000.0).max(MIN_WINDOW_SECS);
        count as f64 / elapsed_secs
    }

    /// 丢弃当前窗口，从当前时刻重新开始统计
    pub fn reset(&self) {
        self.reset_at(Instant::now());
    }

    /// 丢弃当前窗口，从 `now` 重新开始统计
    pub fn reset_at(&self, now: Instant) {
        self.window_start_us.store(self.micros_since_anchor(now), Ordering::Release);
        self.window_count.store(0, Ordering::Release);
    }

    /// 累计到达次数
    pub fn total_arrivals(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// 最近一次到达时间
    pub fn last_arrival(&self) -> Option<Instant> {
        match self.last_arrival_us.load(Ordering::Acquire) {
            0 => None,
            us => Some(self.anchor + Duration::from_micros(us - 1)),
        }
    }

    /// 获取原始计数器值
    pub fn counts(&self) -> SampleRateCounts {
        SampleRateCounts {
            window: self.window_count.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
        }
    }
}

impl Default for SampleRateEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// 采样计数器值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRateCounts {
    /// 当前窗口内的到达次数
    pub window: u64,
    /// 累计到达次数
    pub total: u64,
}
