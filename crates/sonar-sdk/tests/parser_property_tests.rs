//! 帧解析器的属性测试
//!
//! 使用 proptest 验证分块无关性与状态复位。

use proptest::prelude::*;
use sonar_sdk::protocol::constants::{MAX_DIGITS, MAX_MAGNITUDE};
use sonar_sdk::protocol::{FrameParser, ParserState, ProtocolError};

fn frame(value: u32) -> Vec<u8> {
    format!("R{value}\r").into_bytes()
}

/// 按给定切分点把字节流切成若干块，并在块之间插入空块
fn split_with_empties(bytes: &[u8], cuts: &[usize], empties: &[bool]) -> Vec<Vec<u8>> {
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
    points.sort_unstable();

    let mut chunks = Vec::new();
    let mut start = 0;
    for (i, &p) in points.iter().enumerate() {
        chunks.push(bytes[start..p].to_vec());
        if empties.get(i).copied().unwrap_or(false) {
            chunks.push(Vec::new());
        }
        start = p;
    }
    chunks.push(bytes[start..].to_vec());
    chunks
}

/// 逐块喂入，收集所有成功解码的读数
fn decode_chunks(parser: &mut FrameParser, chunks: &[Vec<u8>]) -> Vec<u32> {
    chunks
        .iter()
        .flat_map(|chunk| parser.feed(chunk))
        .filter_map(Result::ok)
        .collect()
}

proptest! {
    /// 任意合法读数都能被完整解码
    #[test]
    fn every_valid_magnitude_decodes(value in 0..=MAX_MAGNITUDE) {
        let mut parser = FrameParser::new();
        let outcomes = parser.feed(&frame(value));
        prop_assert_eq!(outcomes.len(), 1);
        prop_assert_eq!(outcomes[0].clone(), Ok(value));
        prop_assert_eq!(parser.state(), ParserState::SeekingStart);
        prop_assert_eq!(parser.pending(), 0);
    }

    /// 前导零不影响读数
    #[test]
    fn leading_zeros_are_accepted(value in 0..1000u32) {
        let mut parser = FrameParser::new();
        let text = format!("R{:0width$}\r", value, width = MAX_DIGITS as usize);
        let outcomes = parser.feed(text.as_bytes());
        prop_assert_eq!(outcomes[0].clone(), Ok(value));
    }

    /// 任意切分（含空块）得到的读数与整块喂入一致
    #[test]
    fn chunk_boundaries_do_not_matter(
        values in prop::collection::vec(0..=MAX_MAGNITUDE, 1..8),
        cuts in prop::collection::vec(any::<usize>(), 0..16),
        empties in prop::collection::vec(any::<bool>(), 0..16),
    ) {
        let stream: Vec<u8> = values.iter().flat_map(|&v| frame(v)).collect();

        let mut whole = FrameParser::new();
        let expected = decode_chunks(&mut whole, &[stream.clone()]);
        prop_assert_eq!(&expected, &values);

        let mut split = FrameParser::new();
        let chunks = split_with_empties(&stream, &cuts, &empties);
        prop_assert_eq!(decode_chunks(&mut split, &chunks), expected);
    }

    /// 单字节喂入与整块喂入一致
    #[test]
    fn byte_by_byte_matches_whole(value in 0..=MAX_MAGNITUDE) {
        let mut parser = FrameParser::new();
        let mut decoded = Vec::new();
        for byte in frame(value) {
            decoded.extend(parser.push(byte).and_then(Result::ok));
        }
        prop_assert_eq!(decoded, vec![value]);
    }

    /// 帧外的噪声（不含起始标记）被忽略
    #[test]
    fn noise_between_frames_is_ignored(
        noise in prop::collection::vec(any::<u8>().prop_filter("no start marker", |b| *b != b'R'), 0..32),
        value in 0..=MAX_MAGNITUDE,
    ) {
        let mut parser = FrameParser::new();
        let mut stream = noise.clone();
        stream.extend(frame(value));
        let decoded = decode_chunks(&mut parser, &[stream]);
        prop_assert_eq!(decoded, vec![value]);
    }

    /// 畸形帧之后的合法帧仍能正确解码
    #[test]
    fn recovers_after_malformed_frame(
        digits in "[0-9]{0,4}",
        junk in any::<u8>().prop_filter("not a digit, marker or terminator",
            |b| !b.is_ascii_digit() && *b != b'R' && *b != b'\r'),
        value in 0..=MAX_MAGNITUDE,
    ) {
        let mut parser = FrameParser::new();
        let mut stream = format!("R{digits}").into_bytes();
        stream.push(junk);
        stream.extend(b"12\r");

        let outcomes = parser.feed(&stream);
        prop_assert_eq!(outcomes.len(), 1);
        prop_assert_eq!(outcomes[0].clone(), Err(ProtocolError::InvalidByte { byte: junk }));
        prop_assert_eq!(parser.state(), ParserState::SeekingStart);
        prop_assert_eq!(parser.pending(), 0);

        let decoded = decode_chunks(&mut parser, &[frame(value)]);
        prop_assert_eq!(decoded, vec![value]);
    }

    /// 超过位数上限的帧被整体丢弃
    #[test]
    fn oversized_magnitude_is_rejected(value in (MAX_MAGNITUDE + 1)..=u32::MAX) {
        let mut parser = FrameParser::new();
        let outcomes = parser.feed(&frame(value));
        prop_assert!(outcomes.iter().all(|o| o.is_err()));
        let has_overflow = outcomes.iter().any(|o| matches!(o, Err(ProtocolError::MagnitudeOverflow { .. })));
        prop_assert!(has_overflow);

        let decoded = decode_chunks(&mut parser, &[frame(42)]);
        prop_assert_eq!(decoded, vec![42]);
    }

    /// 空块不改变任何状态
    #[test]
    fn empty_chunks_are_idempotent(prefix in "R[0-9]{0,5}", repeats in 1..50usize) {
        let mut parser = FrameParser::new();
        parser.feed(prefix.as_bytes());
        let state = parser.state();
        let pending = parser.pending();

        for _ in 0..repeats {
            prop_assert!(parser.feed(&[]).is_empty());
        }
        prop_assert_eq!(parser.state(), state);
        prop_assert_eq!(parser.pending(), pending);
    }
}

#[test]
fn malformed_sequence_then_valid_frame() {
    let mut parser = FrameParser::new();
    let mut decoded = Vec::new();
    for outcome in parser.feed(b"RXY12\rR0100\r") {
        if let Ok(value) = outcome {
            decoded.push(value);
        }
    }
    assert_eq!(decoded, vec![100]);
}
