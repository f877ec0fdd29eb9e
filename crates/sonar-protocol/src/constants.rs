//! 协议常量定义

/// 帧起始标记 `'R'`
pub const START_MARKER: u8 = b'R';

/// 帧终止符 `CR`
pub const TERMINATOR: u8 = b'\r';

/// 单帧支持的最大数字位数
///
/// MB1013 输出 4 位毫米值，MB1200 输出 3 位厘米值，5 位留有余量。
pub const MAX_DIGITS: u32 = 5;

/// 单帧允许的最大原始读数（超过即视为畸形帧）
pub const MAX_MAGNITUDE: u32 = 10u32.pow(MAX_DIGITS) - 1;

/// 传感器串口默认波特率（9600 8N1）
pub const DEFAULT_BAUD_RATE: u32 = 9600;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_constants() {
        assert_eq!(START_MARKER, 0x52);
        assert_eq!(TERMINATOR, 0x0D);
        assert_eq!(MAX_MAGNITUDE, 99_999);
    }
}
