//! # Sonar Protocol
//!
//! MaxBotix 超声波测距仪串口协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 帧格式常量定义
//! - `frame`: 增量字节流帧解析器
//! - `variant`: 传感器型号及其换算系数
//! - `units`: 强类型长度单位与换算函数
//!
//! ## 帧格式
//!
//! 传感器以 ASCII 文本连续输出读数：
//!
//! ```text
//! frame      := 'R' digit+ CR
//! digit      := '0'..'9'
//! ```
//!
//! 帧外的任何字节都会被丢弃，直到下一个起始标记。

pub mod constants;
pub mod frame;
pub mod units;
pub mod variant;

// 重新导出常用类型
pub use constants::*;
pub use frame::{FrameOutcome, FrameOutcomes, FrameParser, ParserState};
pub use units::{Inches, convert_analog, convert_serial};
pub use variant::{DeviceVariant, ScaleFactor};

use thiserror::Error;

/// 协议解析错误类型
///
/// 所有错误都只代表"当前帧被丢弃"，解析器本身始终可以继续工作。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 帧内出现了既不是数字也不是终止符的字节
    #[error("Invalid byte 0x{byte:02X} inside frame")]
    InvalidByte { byte: u8 },

    /// 起始标记与终止符之间没有任何数字
    #[error("Empty frame: no digits between start marker and terminator")]
    EmptyFrame,

    /// 累加值超过物理上限
    #[error("Magnitude overflow: exceeds {limit}")]
    MagnitudeOverflow { limit: u32 },

    /// 未知的传感器型号名称
    #[error("Unknown device variant: {0}")]
    UnknownVariant(String),
}

impl ProtocolError {
    /// 是否属于"畸形帧"（需要被计入诊断计数器）
    pub fn is_malformed_frame(&self) -> bool {
        !matches!(self, ProtocolError::UnknownVariant(_))
    }
}
