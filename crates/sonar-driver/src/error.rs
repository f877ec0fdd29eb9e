//! 驱动层错误类型定义

use sonar_io::ChannelError;
use sonar_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 通道（串口/模拟量）错误
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 所需通道未配置
    #[error("{0} channel is not configured")]
    ChannelUnavailable(&'static str),

    /// 配置无效
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// IO 线程错误
    #[error("IO thread error: {0}")]
    IoThread(String),

    /// 操作超时
    #[error("Operation timeout")]
    Timeout,
}
