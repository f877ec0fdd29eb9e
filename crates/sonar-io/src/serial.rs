//! 真实串口后端（基于 `serialport` crate）

use crate::{ChannelError, SerialChannel};
use std::io::{ErrorKind, Read};
use std::time::Duration;
use tracing::debug;

/// 串口通道
///
/// 默认 8N1、无流控，与 MaxBotix 传感器的 TTL/RS232 输出一致。
pub struct SerialPortChannel {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialPortChannel {
    /// 打开串口
    ///
    /// # 参数
    /// - `path`: 设备路径（如 `/dev/ttyUSB0`、`COM3`）
    /// - `baud_rate`: 波特率（传感器固定为 9600）
    /// - `timeout`: 单次读取最长阻塞时间
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self, ChannelError> {
        let port = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(map_serialport_error)?;

        debug!("Opened serial port {} at {} baud", path, baud_rate);
        Ok(Self { port })
    }

    /// 从已打开的串口构造
    pub fn from_port(port: Box<dyn serialport::SerialPort>) -> Self {
        Self { port }
    }

    /// 设备名称（如果后端可以提供）
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl SerialChannel for SerialPortChannel {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                Err(ChannelError::Timeout)
            },
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(0),
            Err(e) if matches!(e.kind(), ErrorKind::BrokenPipe | ErrorKind::NotConnected) => {
                Err(ChannelError::Disconnected)
            },
            Err(e) => Err(ChannelError::Io(e)),
        }
    }

    fn clear_input(&mut self) -> Result<(), ChannelError> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(map_serialport_error)
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), ChannelError> {
        self.port.set_timeout(timeout).map_err(map_serialport_error)
    }
}

fn map_serialport_error(e: serialport::Error) -> ChannelError {
    match e.kind() {
        serialport::ErrorKind::NoDevice => ChannelError::Disconnected,
        serialport::ErrorKind::Io(kind) => ChannelError::Io(std::io::Error::new(kind, e.description)),
        _ => ChannelError::Device(e.description),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_no_device() {
        let e = serialport::Error::new(serialport::ErrorKind::NoDevice, "gone");
        assert!(matches!(map_serialport_error(e), ChannelError::Disconnected));
    }

    #[test]
    fn test_map_io_kind() {
        let e = serialport::Error::new(
            serialport::ErrorKind::Io(ErrorKind::PermissionDenied),
            "denied",
        );
        match map_serialport_error(e) {
            ChannelError::Io(io) => assert_eq!(io.kind(), ErrorKind::PermissionDenied),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_map_invalid_input() {
        let e = serialport::Error::new(serialport::ErrorKind::InvalidInput, "bad baud");
        assert!(matches!(map_serialport_error(e), ChannelError::Device(msg) if msg == "bad baud"));
    }

    #[test]
    fn test_open_missing_device_fails() {
        let result = SerialPortChannel::open(
            "/dev/sonar-does-not-exist",
            9600,
            Duration::from_millis(10),
        );
        assert!(result.is_err());
    }
}
