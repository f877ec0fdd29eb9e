//! # Sonar IO Layer
//!
//! 通道硬件抽象层，为驱动层提供统一的串口与模拟量读取接口。
//!
//! - [`SerialChannel`]: 按块读取原始串口字节
//! - [`AnalogInput`]: 按需读取模拟量 ADC 码值
//!
//! 具体后端：
//! - [`ReaderChannel`]: 任意 `std::io::Read`（tty 设备文件、管道、录制文件），Unix 下以 `poll` 实现读超时
//! - `SerialPortChannel`: 真实串口（`serialport` feature）
//! - [`SysfsAnalogInput`]: Linux IIO sysfs 文本节点
//! - `MockSerialChannel` / `MockAnalogInput`: 测试用（`mock` feature）

use std::time::Duration;
use thiserror::Error;

pub mod analog;
pub mod reader;

#[cfg(feature = "serialport")]
pub mod serial;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use analog::SysfsAnalogInput;
pub use reader::{ReadReady, ReaderChannel};

#[cfg(feature = "serialport")]
pub use serial::SerialPortChannel;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockAnalogInput, MockSerialChannel, MockSerialHandle};

/// 通道层统一错误类型
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Read timeout")]
    Timeout,
    #[error("Channel disconnected")]
    Disconnected,
    #[error("Device Error: {0}")]
    Device(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl ChannelError {
    /// 设备层面的错误（断开、拔出等），重试前通常需要更长的等待
    pub fn is_fatal(&self) -> bool {
        matches!(self, ChannelError::Disconnected | ChannelError::Device(_))
    }
}

/// 串口字节流通道
///
/// `read_chunk` 允许返回 `Ok(0)`（暂无数据），调用方负责决定何时再次读取。
pub trait SerialChannel {
    /// 读取一块原始字节，返回写入 `buf` 的字节数
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError>;

    /// 丢弃输入缓冲区中的陈旧数据
    fn clear_input(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }

    /// 设置单次读取的最长阻塞时间
    fn set_read_timeout(&mut self, _timeout: Duration) -> Result<(), ChannelError> {
        Ok(())
    }
}

impl<T: SerialChannel + ?Sized> SerialChannel for Box<T> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError> {
        (**self).read_chunk(buf)
    }

    fn clear_input(&mut self) -> Result<(), ChannelError> {
        (**self).clear_input()
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), ChannelError> {
        (**self).set_read_timeout(timeout)
    }
}

/// 模拟量输入
///
/// 同步按需读取，无共享可变状态，可从任意线程调用。
pub trait AnalogInput: Send + Sync {
    /// 读取当前 ADC 码值
    fn read_code(&self) -> Result<u32, ChannelError>;
}

impl<T: AnalogInput + ?Sized> AnalogInput for Box<T> {
    fn read_code(&self) -> Result<u32, ChannelError> {
        (**self).read_code()
    }
}

impl<T: AnalogInput + ?Sized> AnalogInput for std::sync::Arc<T> {
    fn read_code(&self) -> Result<u32, ChannelError> {
        (**self).read_code()
    }
}
