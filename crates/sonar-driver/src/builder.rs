//! Builder 模式实现
//!
//! 提供链式构造 `Sonar` 实例的便捷方式。

use crate::error::DriverError;
use crate::pipeline::PipelineConfig;
use crate::sonar::{BoxedAnalog, BoxedSerial, Sonar};
use sonar_io::{AnalogInput, ReaderChannel, SerialChannel, SysfsAnalogInput};
use sonar_protocol::DeviceVariant;
use std::path::PathBuf;
use tracing::debug;

/// 串口数据来源
enum SerialSource {
    /// 调用方直接提供的通道
    Channel(BoxedSerial),
    /// 真实串口设备（`serialport` feature）
    #[cfg(feature = "serialport")]
    Device(String),
    /// 以普通文件方式读取的设备或录制文件
    Reader(PathBuf),
}

/// Sonar Builder（链式构造）
///
/// 串口与模拟量都是可选的；两者都不配置时得到的 `Sonar` 所有读数都不可用。
///
/// # Example
///
/// ```no_run
/// use sonar_driver::{SonarBuilder, PipelineConfig};
/// use sonar_protocol::DeviceVariant;
///
/// // 串口 + 模拟量
/// let sonar = SonarBuilder::new()
///     .variant(DeviceVariant::Mb1200)
///     .reader_device("/dev/ttyUSB0")
///     .analog_sysfs("/sys/bus/iio/devices/iio:device0/in_voltage0_raw")
///     .build()
///     .unwrap();
///
/// // 自定义 Pipeline 配置
/// let config = PipelineConfig {
///     idle_backoff_max_ms: 10,
///     ..PipelineConfig::default()
/// };
/// let sonar = SonarBuilder::new()
///     .reader_device("/dev/ttyUSB0")
///     .pipeline_config(config)
///     .build()
///     .unwrap();
/// ```
pub struct SonarBuilder {
    /// 传感器型号（默认 MB1013）
    variant: DeviceVariant,
    serial: Option<SerialSource>,
    /// 串口波特率（仅对 `serial_device` 生效）
    baud_rate: Option<u32>,
    analog: Option<BoxedAnalog>,
    pipeline_config: Option<PipelineConfig>,
}

impl SonarBuilder {
    /// 创建新的 Builder
    pub fn new() -> Self {
        Self {
            variant: DeviceVariant::default(),
            serial: None,
            baud_rate: None,
            analog: None,
            pipeline_config: None,
        }
    }

    /// 设置传感器型号
    pub fn variant(mut self, variant: DeviceVariant) -> Self {
        self.variant = variant;
        self
    }

    /// 使用已经打开的串口通道
    ///
    /// 会覆盖之前设置的 `serial_device` / `reader_device`。
    pub fn serial_channel(mut self, channel: impl SerialChannel + Send + 'static) -> Self {
        self.serial = Some(SerialSource::Channel(Box::new(channel)));
        self
    }

    /// 打开真实串口设备（如 `/dev/ttyUSB0`、`COM3`）
    #[cfg(feature = "serialport")]
    pub fn serial_device(mut self, path: impl Into<String>) -> Self {
        self.serial = Some(SerialSource::Device(path.into()));
        self
    }

    /// 以普通文件方式读取串口设备（tty 需事先配置好波特率）、FIFO 或录制文件
    ///
    /// Unix 下读取前以 `poll` 等待数据，IO 线程在设备沉默时仍能及时响应退出。
    pub fn reader_device(mut self, path: impl Into<PathBuf>) -> Self {
        self.serial = Some(SerialSource::Reader(path.into()));
        self
    }

    /// 设置串口波特率（可选，默认 9600）
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = Some(baud_rate);
        self
    }

    /// 使用自定义模拟量输入
    pub fn analog_input(mut self, input: impl AnalogInput + 'static) -> Self {
        self.analog = Some(Box::new(input));
        self
    }

    /// 从 sysfs 文本节点读取模拟量（Linux IIO）
    pub fn analog_sysfs(mut self, path: impl Into<PathBuf>) -> Self {
        self.analog = Some(Box::new(SysfsAnalogInput::new(path)));
        self
    }

    /// 设置 Pipeline 配置（可选）
    pub fn pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline_config = Some(config);
        self
    }

    /// 构建 `Sonar` 实例
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: Pipeline 配置不合法
    /// - `DriverError::Channel`: 串口设备打开失败
    /// - `DriverError::IoThread`: IO 线程创建失败
    pub fn build(self) -> Result<Sonar, DriverError> {
        let config = self.pipeline_config.unwrap_or_default();
        config.validate()?;

        let serial = match self.serial {
            Some(source) => Some(Self::open_serial(source, self.baud_rate, &config)?),
            None => None,
        };

        Sonar::new(self.variant, serial, self.analog, config)
    }

    #[cfg_attr(not(feature = "serialport"), allow(unused_variables))]
    fn open_serial(
        source: SerialSource,
        baud_rate: Option<u32>,
        config: &PipelineConfig,
    ) -> Result<BoxedSerial, DriverError> {
        match source {
            SerialSource::Channel(channel) => Ok(channel),
            #[cfg(feature = "serialport")]
            SerialSource::Device(path) => {
                let baud_rate = baud_rate.unwrap_or(sonar_protocol::constants::DEFAULT_BAUD_RATE);
                debug!("Opening serial port {} at {} baud", path, baud_rate);
                let port = sonar_io::SerialPortChannel::open(&path, baud_rate, config.read_timeout())?;
                Ok(Box::new(port))
            },
            SerialSource::Reader(path) => {
                debug!("Opening {} as a byte stream", path.display());
                Ok(Box::new(ReaderChannel::open(&path)?))
            },
        }
    }
}

impl Default for SonarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonar_io::{MockAnalogInput, MockSerialChannel};
    use sonar_protocol::Inches;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_sonar_builder_new() {
        let builder = SonarBuilder::new();
        assert_eq!(builder.variant, DeviceVariant::Mb1013);
        assert!(builder.serial.is_none());
        assert!(builder.baud_rate.is_none());
        assert!(builder.analog.is_none());
        assert!(builder.pipeline_config.is_none());
    }

    #[test]
    fn test_sonar_builder_chain() {
        let config = PipelineConfig {
            read_timeout_ms: 5,
            ..PipelineConfig::default()
        };
        let builder = SonarBuilder::new()
            .variant(DeviceVariant::Mb1200)
            .reader_device("/dev/null")
            .baud_rate(19200)
            .analog_sysfs("/tmp/in_voltage0_raw")
            .pipeline_config(config.clone());

        assert_eq!(builder.variant, DeviceVariant::Mb1200);
        assert!(matches!(builder.serial, Some(SerialSource::Reader(_))));
        assert_eq!(builder.baud_rate, Some(19200));
        assert!(builder.analog.is_some());
        assert_eq!(builder.pipeline_config, Some(config));
    }

    #[test]
    fn test_sonar_builder_default() {
        let builder = SonarBuilder::default();
        assert_eq!(builder.variant, DeviceVariant::default());
        assert!(builder.serial.is_none());
    }

    #[test]
    fn test_build_without_channels() {
        let sonar = SonarBuilder::new().build().unwrap();
        assert!(!sonar.has_serial());
        assert!(!sonar.has_analog());
        assert!(sonar.current_range().is_none());
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let config = PipelineConfig {
            idle_backoff_min_ms: 100,
            idle_backoff_max_ms: 1,
            ..PipelineConfig::default()
        };
        let result = SonarBuilder::new().pipeline_config(config).build();
        assert!(matches!(result, Err(DriverError::InvalidConfig(_))));
    }

    #[test]
    fn test_build_missing_reader_device_fails() {
        let result = SonarBuilder::new()
            .reader_device("/nonexistent/sonar/ttyUSB9")
            .build();
        assert!(matches!(result, Err(DriverError::Channel(_))));
    }

    #[test]
    fn test_build_with_mock_channels() {
        let (channel, handle) = MockSerialChannel::new();
        let sonar = SonarBuilder::new()
            .variant(DeviceVariant::Mb1013)
            .serial_channel(channel)
            .analog_input(MockAnalogInput::new(2540))
            .pipeline_config(PipelineConfig {
                clear_input_on_start: false,
                ..PipelineConfig::default()
            })
            .build()
            .unwrap();

        assert!(sonar.has_serial());
        assert!(sonar.has_analog());
        assert_eq!(sonar.current_analog_range(), Some(Inches(125.0)));

        handle.push(b"R0508\r");
        let reading = sonar.wait_for_reading(Duration::from_secs(2)).unwrap();
        assert_eq!(reading.range, Inches(20.0));
    }

    #[test]
    fn test_build_reads_capture_file() {
        let mut capture = tempfile::NamedTempFile::new().unwrap();
        capture.write_all(b"garbage R0254\rR0508\r").unwrap();
        capture.flush().unwrap();

        let config = PipelineConfig {
            clear_input_on_start: false,
            ..PipelineConfig::default()
        };
        let sonar = SonarBuilder::new()
            .reader_device(capture.path())
            .pipeline_config(config)
            .build()
            .unwrap();

        let start = std::time::Instant::now();
        while sonar.sample_counts().total < 2 && start.elapsed() < Duration::from_secs(2) {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(sonar.current_range(), Some(Inches(20.0)));
        assert_eq!(sonar.get_metrics().frames_valid, 2);
    }
}
