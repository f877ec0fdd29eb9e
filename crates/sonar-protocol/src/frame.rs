//! 增量字节流帧解析器
//!
//! 串口数据以任意大小的块到达（可能为空，也可能只有 1 字节），
//! 帧边界可能落在块内任意位置或跨越多个块。解析器逐字节推进状态机，
//! 因此无论如何切分输入，解码结果都完全一致。
//!
//! # 状态机
//!
//! ```text
//!            'R'                      CR (至少 1 位数字)
//! SeekingStart ──► Accumulating ──────────────────► SeekingStart (输出读数)
//!      ▲               │  '0'..'9': pending = pending * 10 + d
//!      │               │
//!      └───────────────┘  其他字节 / 溢出 / 空帧: 丢弃当前帧
//! ```
//!
//! 帧内再次出现 `'R'` 时，当前帧被丢弃，并立即以该字节开始新帧。

use crate::ProtocolError;
use crate::constants::{MAX_MAGNITUDE, START_MARKER, TERMINATOR};
use smallvec::SmallVec;

/// 单帧解析结果：成功时为原始读数，失败时为被丢弃的原因
pub type FrameOutcome = Result<u32, ProtocolError>;

/// 一次 `feed` 产生的全部结果
///
/// 典型的串口块只包含 0~2 帧，内联容量避免了堆分配。
pub type FrameOutcomes = SmallVec<[FrameOutcome; 4]>;

/// 解析器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    /// 等待起始标记，其他字节全部丢弃
    #[default]
    SeekingStart,
    /// 已收到起始标记，正在累加数字
    Accumulating,
}

/// 串口帧解析器
///
/// # Example
///
/// ```
/// use sonar_protocol::FrameParser;
///
/// let mut parser = FrameParser::new();
/// assert!(parser.feed(b"R01").is_empty());
/// let out = parser.feed(b"00\r");
/// assert_eq!(out.as_slice(), &[Ok(100)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FrameParser {
    state: ParserState,
    /// 正在累加的读数（仅在 `Accumulating` 状态下有意义）
    pending: u32,
    /// 当前帧是否已收到过数字
    saw_digit: bool,
}

impl FrameParser {
    /// 创建新的解析器（初始状态为 `SeekingStart`）
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前状态
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// 当前累加值
    pub fn pending(&self) -> u32 {
        self.pending
    }

    /// 丢弃正在解析的帧，回到 `SeekingStart`
    pub fn reset(&mut self) {
        self.state = ParserState::SeekingStart;
        self.pending = 0;
        self.saw_digit = false;
    }

    /// 推进单个字节
    ///
    /// 返回 `Some(Ok(v))` 表示完成了一帧，`Some(Err(_))` 表示丢弃了一帧，
    /// `None` 表示该字节没有结束任何帧。
    pub fn push(&mut self, byte: u8) -> Option<FrameOutcome> {
        match self.state {
            ParserState::SeekingStart => {
                if byte == START_MARKER {
                    self.begin_frame();
                }
                None
            },
            ParserState::Accumulating => match byte {
                TERMINATOR => {
                    let outcome = if !self.saw_digit {
                        Err(ProtocolError::EmptyFrame)
                    } else {
                        Ok(self.pending)
                    };
                    self.reset();
                    Some(outcome)
                },
                b'0'..=b'9' => {
                    let next = self
                        .pending
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(u32::from(byte - b'0')))
                        .filter(|&v| v <= MAX_MAGNITUDE);
                    match next {
                        Some(v) => {
                            self.pending = v;
                            self.saw_digit = true;
                            None
                        },
                        None => {
                            self.reset();
                            Some(Err(ProtocolError::MagnitudeOverflow {
                                limit: MAX_MAGNITUDE,
                            }))
                        },
                    }
                },
                START_MARKER => {
                    // 重新同步：丢弃残帧，并以该字节开始新帧
                    self.begin_frame();
                    Some(Err(ProtocolError::InvalidByte { byte }))
                },
                _ => {
                    self.reset();
                    Some(Err(ProtocolError::InvalidByte { byte }))
                },
            },
        }
    }

    /// 推进一整块数据
    ///
    /// 空块是合法输入，不会改变任何状态。
    pub fn feed(&mut self, chunk: &[u8]) -> FrameOutcomes {
        chunk.iter().filter_map(|&b| self.push(b)).collect()
    }

    fn begin_frame(&mut self) {
        self.state = ParserState::Accumulating;
        self.pending = 0;
        self.saw_digit = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(outcomes: &FrameOutcomes) -> Vec<u32> {
        outcomes.iter().filter_map(|o| o.as_ref().ok().copied()).collect()
    }

    #[test]
    fn test_single_frame() {
        let mut parser = FrameParser::new();
        let out = parser.feed(b"R0254\r");
        assert_eq!(out.as_slice(), &[Ok(254)]);
        assert_eq!(parser.state(), ParserState::SeekingStart);
        assert_eq!(parser.pending(), 0);
    }

    #[test]
    fn test_multiple_frames_in_one_chunk() {
        let mut parser = FrameParser::new();
        let out = parser.feed(b"R0300\rR0301\rR0302\r");
        assert_eq!(frames(&out), vec![300, 301, 302]);
    }

    #[test]
    fn test_leading_noise_is_ignored() {
        let mut parser = FrameParser::new();
        let out = parser.feed(b"\x00\xFF123\rMaxBotix\rR0500\r");
        assert_eq!(out.as_slice(), &[Ok(500)]);
    }

    #[test]
    fn test_frame_split_across_single_byte_chunks() {
        let mut parser = FrameParser::new();
        let mut all = Vec::new();
        for b in b"R1234\r" {
            all.extend(frames(&parser.feed(std::slice::from_ref(b))));
        }
        assert_eq!(all, vec![1234]);
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let mut parser = FrameParser::new();
        parser.feed(b"R12");
        for _ in 0..10 {
            assert!(parser.feed(&[]).is_empty());
        }
        assert_eq!(parser.state(), ParserState::Accumulating);
        assert_eq!(parser.pending(), 12);

        assert_eq!(parser.feed(b"\r").as_slice(), &[Ok(12)]);
    }

    #[test]
    fn test_invalid_byte_abandons_frame() {
        let mut parser = FrameParser::new();
        let out = parser.feed(b"RXY12\r");
        assert_eq!(
            out.as_slice(),
            &[Err(ProtocolError::InvalidByte { byte: b'X' })]
        );
        assert_eq!(parser.state(), ParserState::SeekingStart);
        assert_eq!(parser.pending(), 0);

        let out = parser.feed(b"R0100\r");
        assert_eq!(out.as_slice(), &[Ok(100)]);
    }

    #[test]
    fn test_invalid_byte_mid_digits() {
        let mut parser = FrameParser::new();
        let out = parser.feed(b"R12 34\rR0042\r");
        assert_eq!(
            out.as_slice(),
            &[Err(ProtocolError::InvalidByte { byte: b' ' }), Ok(42)]
        );
    }

    #[test]
    fn test_start_marker_resynchronises() {
        let mut parser = FrameParser::new();
        let out = parser.feed(b"R12R0100\r");
        assert_eq!(
            out.as_slice(),
            &[Err(ProtocolError::InvalidByte { byte: b'R' }), Ok(100)]
        );
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let mut parser = FrameParser::new();
        let out = parser.feed(b"R\rR7\r");
        assert_eq!(out.as_slice(), &[Err(ProtocolError::EmptyFrame), Ok(7)]);
    }

    #[test]
    fn test_magnitude_overflow() {
        let mut parser = FrameParser::new();
        let out = parser.feed(b"R123456\rR99999\r");
        assert_eq!(
            out.as_slice(),
            &[
                Err(ProtocolError::MagnitudeOverflow {
                    limit: MAX_MAGNITUDE
                }),
                Ok(99_999)
            ]
        );
        assert_eq!(parser.state(), ParserState::SeekingStart);
    }

    #[test]
    fn test_leading_zeros_do_not_count_towards_overflow() {
        let mut parser = FrameParser::new();
        let out = parser.feed(b"R00000000042\r");
        assert_eq!(out.as_slice(), &[Ok(42)]);
    }

    #[test]
    fn test_long_run_of_leading_zeros() {
        let mut parser = FrameParser::new();
        parser.push(START_MARKER);
        let zeros = vec![b'0'; 1 << 20];
        for _ in 0..64 {
            assert!(parser.feed(&zeros).is_empty());
        }
        assert_eq!(parser.state(), ParserState::Accumulating);
        assert_eq!(parser.push(TERMINATOR), Some(Ok(0)));

        // 标志位随新帧清零，空帧仍被拒绝
        assert_eq!(parser.feed(b"R\r").as_slice(), &[Err(ProtocolError::EmptyFrame)]);
        assert_eq!(parser.feed(b"R0\r").as_slice(), &[Ok(0)]);
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut parser = FrameParser::new();
        parser.feed(b"R98");
        parser.reset();
        assert_eq!(parser.state(), ParserState::SeekingStart);
        assert_eq!(parser.pending(), 0);
        // 残余数字与终止符都在帧外，应被忽略
        assert!(parser.feed(b"76\r").is_empty());
    }
}
