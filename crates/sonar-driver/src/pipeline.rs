//! Pipeline IO 循环模块
//!
//! 负责后台 IO 线程的串口读取、帧解码与读数发布。
//!
//! # 空闲策略
//!
//! 串口没有数据（零字节读取或读取超时）时，线程按指数退避等待，
//! 而不是立即重试：空闲时几乎不占用 CPU，数据恢复后退避立即复位。
//! 等待本身是在停止通道上的 `recv_timeout`，因此退出信号可以随时打断等待。

use crate::decoder::RangeDecoder;
use crate::error::DriverError;
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use sonar_io::{ChannelError, SerialChannel};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Pipeline 配置
///
/// # Example
///
/// ```
/// use sonar_driver::PipelineConfig;
///
/// // 默认配置（20ms 读取超时，1~50ms 空闲退避）
/// let config = PipelineConfig::default();
///
/// // 自定义配置
/// let config = PipelineConfig {
///     idle_backoff_max_ms: 10,
///     ..PipelineConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// 单次串口读取的最长阻塞时间（毫秒）
    pub read_timeout_ms: u64,
    /// 空闲退避起始等待（毫秒）
    pub idle_backoff_min_ms: u64,
    /// 空闲退避最长等待（毫秒）
    pub idle_backoff_max_ms: u64,
    /// 读取出错后的重试间隔（毫秒）
    pub error_backoff_ms: u64,
    /// 超过该时长未收到有效帧即视为连接降级（毫秒）
    pub health_timeout_ms: u64,
    /// 读取缓冲区大小（字节）
    pub read_buffer_size: usize,
    /// 启动时是否丢弃串口中积压的陈旧数据
    pub clear_input_on_start: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 20,
            idle_backoff_min_ms: 1,
            idle_backoff_max_ms: 50,
            error_backoff_ms: 200,
            health_timeout_ms: 1000,
            read_buffer_size: 64,
            clear_input_on_start: true,
        }
    }
}

impl PipelineConfig {
    /// 检查配置是否合理
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.read_buffer_size == 0 {
            return Err(DriverError::InvalidConfig(
                "read_buffer_size must be greater than 0".to_string(),
            ));
        }
        if self.idle_backoff_max_ms == 0 {
            return Err(DriverError::InvalidConfig(
                "idle_backoff_max_ms must be greater than 0".to_string(),
            ));
        }
        if self.idle_backoff_min_ms > self.idle_backoff_max_ms {
            return Err(DriverError::InvalidConfig(format!(
                "idle_backoff_min_ms ({}) exceeds idle_backoff_max_ms ({})",
                self.idle_backoff_min_ms, self.idle_backoff_max_ms
            )));
        }
        if self.health_timeout_ms == 0 {
            return Err(DriverError::InvalidConfig(
                "health_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }
}

/// 空闲指数退避
#[derive(Debug)]
pub(crate) struct IdleBackoff {
    min: Duration,
    max: Duration,
    current: Duration,
}

impl IdleBackoff {
    pub(crate) fn new(min: Duration, max: Duration) -> Self {
        let min = min.max(Duration::from_micros(100));
        Self {
            min,
            max: max.max(min),
            current: min,
        }
    }

    /// 返回本次等待时长，并把下一次等待加倍（不超过上限）
    pub(crate) fn next_wait(&mut self) -> Duration {
        let wait = self.current;
        self.current = (self.current * 2).min(self.max);
        wait
    }

    pub(crate) fn reset(&mut self) {
        self.current = self.min;
    }
}

/// 停止信号检查结果
fn stop_requested(stop_rx: &Receiver<()>) -> bool {
    match stop_rx.try_recv() {
        Ok(()) | Err(TryRecvError::Disconnected) => true,
        Err(TryRecvError::Empty) => false,
    }
}

/// 在停止通道上等待 `wait`，期间收到停止信号则返回 true
fn wait_or_stop(stop_rx: &Receiver<()>, wait: Duration) -> bool {
    match stop_rx.recv_timeout(wait) {
        Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        Err(RecvTimeoutError::Timeout) => false,
    }
}

/// IO 线程循环
///
/// # 参数
/// - `channel`: 串口通道（移动进线程，循环退出时释放）
/// - `decoder`: 读数解码器（持有共享上下文）
/// - `config`: Pipeline 配置
/// - `stop_rx`: 停止信号（收到消息或发送端全部释放即退出）
///
/// 除停止信号外，任何错误都不会让循环退出：读取失败时按
/// `error_backoff` 等待后重试。
pub fn io_loop(
    mut channel: impl SerialChannel,
    mut decoder: RangeDecoder,
    config: PipelineConfig,
    stop_rx: Receiver<()>,
) {
    let ctx = decoder.context().clone();
    let metrics = &ctx.metrics;

    if let Err(e) = channel.set_read_timeout(config.read_timeout()) {
        warn!("Failed to set serial read timeout: {}", e);
    }
    if config.clear_input_on_start
        && let Err(e) = channel.clear_input()
    {
        warn!("Failed to clear stale serial input: {}", e);
    }

    let mut buf = vec![0u8; config.read_buffer_size.max(1)];
    let mut backoff = IdleBackoff::new(
        Duration::from_millis(config.idle_backoff_min_ms),
        Duration::from_millis(config.idle_backoff_max_ms),
    );
    let mut consecutive_errors: u64 = 0;

    info!("Sonar IO thread started ({})", decoder.variant());

    loop {
        if stop_requested(&stop_rx) {
            trace!("IO thread: stop requested");
            break;
        }

        metrics.reads_total.fetch_add(1, Ordering::Relaxed);
        let wait = match channel.read_chunk(&mut buf) {
            Ok(0) | Err(ChannelError::Timeout) => {
                metrics.idle_reads.fetch_add(1, Ordering::Relaxed);
                Some(backoff.next_wait())
            },
            Ok(n) => {
                if consecutive_errors > 0 {
                    info!(
                        "Serial channel recovered after {} failed reads",
                        consecutive_errors
                    );
                    consecutive_errors = 0;
                }
                backoff.reset();
                decoder.feed(&buf[..n]);
                None
            },
            Err(e) => {
                metrics.read_errors.fetch_add(1, Ordering::Relaxed);
                consecutive_errors += 1;
                if consecutive_errors == 1 {
                    if e.is_fatal() {
                        error!("Serial read failed: {}, retrying every {:?}", e, config.error_backoff());
                    } else {
                        warn!("Serial read failed: {}, retrying every {:?}", e, config.error_backoff());
                    }
                } else {
                    debug!("Serial read failed again ({}): {}", consecutive_errors, e);
                }
                // 串口恢复后残帧已不可信
                decoder.discard_partial();
                backoff.reset();
                Some(config.error_backoff())
            },
        };

        if let Some(wait) = wait
            && wait_or_stop(&stop_rx, wait)
        {
            trace!("IO thread: stop requested while waiting");
            break;
        }
    }

    info!("Sonar IO thread: loop exited");
}
