//! Sonar API 模块
//!
//! 提供对外的 `Sonar` 结构体，封装底层 IO 线程和状态同步细节。

use crate::decoder::RangeDecoder;
use crate::error::DriverError;
use crate::health::LinkState;
use crate::metrics::MetricsSnapshot;
use crate::pipeline::{IdleBackoff, PipelineConfig, io_loop};
use crate::sample_rate::SampleRateCounts;
use crate::state::{Reading, SonarContext};
use crossbeam_channel::Sender;
use sonar_io::{AnalogInput, SerialChannel};
use sonar_protocol::{DeviceVariant, Inches, convert_analog};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// IO 线程退出等待上限
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// 等待新读数时的轮询间隔（从 1ms 起指数增长）
const WAIT_POLL_MIN: Duration = Duration::from_millis(1);
const WAIT_POLL_MAX: Duration = Duration::from_millis(16);

/// Extension trait for timeout-capable thread joins
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> thread::Result<()> {
        let (tx, rx) = crossbeam_channel::bounded(1);

        // The watchdog outlives us on timeout; the OS reclaims it on exit
        thread::spawn(move || {
            let _ = tx.send(self.join().map(|_| ()));
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Thread join timeout",
            ))),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                Err(Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "Thread panicked during join",
                )))
            },
        }
    }
}

/// 串口通道 trait object
pub(crate) type BoxedSerial = Box<dyn SerialChannel + Send>;

/// 模拟量输入 trait object
pub(crate) type BoxedAnalog = Box<dyn AnalogInput>;

/// 测距仪对外 API
///
/// 串口通道（若有）由后台 IO 线程独占；所有 getter 都是无锁读取，
/// 可以在任意线程、以任意频率调用。
pub struct Sonar {
    variant: DeviceVariant,
    ctx: Arc<SonarContext>,
    analog: Option<BoxedAnalog>,
    /// 停止信号（发送或释放都会让 IO 线程退出）
    stop_tx: Option<Sender<()>>,
    io_thread: Option<JoinHandle<()>>,
}

impl Sonar {
    /// 创建新的 `Sonar` 实例
    ///
    /// # 参数
    /// - `variant`: 传感器型号
    /// - `serial`: 串口通道，`None` 表示未接串口（串口读数始终不可用）
    /// - `analog`: 模拟量输入，`None` 表示未接模拟量
    /// - `config`: Pipeline 配置
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 配置不合法
    /// - `DriverError::IoThread`: 无法创建 IO 线程
    pub fn new(
        variant: DeviceVariant,
        serial: Option<BoxedSerial>,
        analog: Option<BoxedAnalog>,
        config: PipelineConfig,
    ) -> Result<Self, DriverError> {
        config.validate()?;

        let ctx = Arc::new(SonarContext::new(config.health_timeout()));

        let (stop_tx, io_thread) = match serial {
            Some(channel) => {
                let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
                let decoder = RangeDecoder::new(variant, ctx.clone());
                let handle = thread::Builder::new()
                    .name("sonar-io".to_string())
                    .spawn(move || io_loop(channel, decoder, config, stop_rx))
                    .map_err(|e| DriverError::IoThread(e.to_string()))?;
                (Some(stop_tx), Some(handle))
            },
            None => (None, None),
        };

        info!(
            "{} sonar started (serial: {}, analog: {})",
            variant,
            io_thread.is_some(),
            analog.is_some()
        );

        Ok(Self {
            variant,
            ctx,
            analog,
            stop_tx,
            io_thread,
        })
    }

    /// 最新串口距离（`None` 表示未接串口或尚未解码出任何帧）
    pub fn current_range(&self) -> Option<Inches> {
        self.ctx.latest().map(|r| r.range)
    }

    /// 最新串口读数快照（原始值、换算值、序号、时间戳来自同一帧）
    pub fn current_reading(&self) -> Option<Reading> {
        self.ctx.latest()
    }

    /// 按需读取模拟量距离
    ///
    /// 未接模拟量或读取失败时返回 `None`（失败会记录 warn 日志）。
    pub fn current_analog_range(&self) -> Option<Inches> {
        let analog = self.analog.as_ref()?;
        match analog.read_code() {
            Ok(code) => Some(convert_analog(code, self.variant)),
            Err(e) => {
                warn!("{} analog read failed: {}", self.variant, e);
                None
            },
        }
    }

    /// 自上次查询以来的有效帧率（Hz），并开始新的统计窗口
    ///
    /// 未接串口时始终为 0.0。
    pub fn current_rate(&self) -> f64 {
        if !self.has_serial() {
            return 0.0;
        }
        self.ctx.sample_rate.current_rate()
    }

    /// 帧计数（当前窗口 / 累计），不影响统计窗口
    pub fn sample_counts(&self) -> SampleRateCounts {
        self.ctx.sample_rate.counts()
    }

    /// 重置采样率统计窗口
    pub fn reset_sample_rate(&self) {
        self.ctx.sample_rate.reset();
    }

    /// 获取链路指标快照
    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    /// 串口是否在 `health_timeout` 内收到过有效帧
    ///
    /// 未接串口时返回 false。
    pub fn is_healthy(&self) -> bool {
        self.has_serial() && self.is_running() && self.ctx.connection.check_connection()
    }

    /// 串口链路状态（未接串口时为 `Stale`）
    pub fn link_state(&self) -> LinkState {
        if self.has_serial() {
            self.ctx.connection.state()
        } else {
            LinkState::Stale
        }
    }

    /// IO 线程是否仍在运行
    pub fn is_running(&self) -> bool {
        self.io_thread.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 距离上一帧有效数据的时间
    pub fn time_since_last_frame(&self) -> Duration {
        self.ctx.connection.time_since_last_frame()
    }

    /// 等待第一帧读数（已有读数时立即返回）
    ///
    /// # 错误
    /// - `DriverError::ChannelUnavailable`: 未接串口
    /// - `DriverError::Timeout`: 超时前没有读数
    pub fn wait_for_reading(&self, timeout: Duration) -> Result<Reading, DriverError> {
        self.wait_for_reading_after(0, timeout)
    }

    /// 等待序号大于 `sequence` 的读数
    ///
    /// 轮询间隔按指数退避增长（上限 16ms），且不会睡过 `timeout`。
    pub fn wait_for_reading_after(
        &self,
        sequence: u64,
        timeout: Duration,
    ) -> Result<Reading, DriverError> {
        if !self.has_serial() {
            return Err(DriverError::ChannelUnavailable("serial"));
        }

        let deadline = Instant::now() + timeout;
        let mut backoff = IdleBackoff::new(WAIT_POLL_MIN, WAIT_POLL_MAX);
        loop {
            if let Some(reading) = self.ctx.latest()
                && reading.sequence > sequence
            {
                return Ok(reading);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DriverError::Timeout);
            }
            thread::sleep(backoff.next_wait().min(remaining));
        }
    }

    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    pub fn has_serial(&self) -> bool {
        self.io_thread.is_some()
    }

    pub fn has_analog(&self) -> bool {
        self.analog.is_some()
    }

    /// 共享上下文（高级用法）
    pub fn context(&self) -> &Arc<SonarContext> {
        &self.ctx
    }

    /// 停止 IO 线程并等待其退出
    ///
    /// 返回后串口通道已被释放。
    pub fn shutdown(mut self) -> Result<(), DriverError> {
        self.stop_io_thread()
    }

    fn stop_io_thread(&mut self) -> Result<(), DriverError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            // 线程可能已经退出，忽略发送失败
            let _ = stop_tx.try_send(());
        }

        if let Some(handle) = self.io_thread.take() {
            handle.join_timeout(JOIN_TIMEOUT).map_err(|_| {
                DriverError::IoThread(format!(
                    "IO thread panicked or failed to shut down within {:?}",
                    JOIN_TIMEOUT
                ))
            })?;
            info!("{} sonar stopped", self.variant);
        }
        Ok(())
    }
}

impl Drop for Sonar {
    fn drop(&mut self) {
        if let Err(e) = self.stop_io_thread() {
            error!("{}", e);
        }
    }
}
