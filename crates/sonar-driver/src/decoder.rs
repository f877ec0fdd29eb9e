//! 帧解码与发布
//!
//! `RangeDecoder` 把原始字节块送入帧解析器，每完成一帧就：
//! 1. 按型号换算为英寸
//! 2. 原子发布新的 [`Reading`] 快照
//! 3. 记录一次到达（采样率）并刷新连接监测
//!
//! IO 线程内部使用它；不需要后台线程的调用方也可以直接持有它，
//! 自行调用 [`RangeDecoder::feed`]。

use crate::state::{Reading, SonarContext};
use sonar_protocol::{DeviceVariant, FrameParser, convert_serial};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{debug, trace};

/// 串口读数解码器
pub struct RangeDecoder {
    parser: FrameParser,
    variant: DeviceVariant,
    ctx: Arc<SonarContext>,
    sequence: u64,
}

impl RangeDecoder {
    pub fn new(variant: DeviceVariant, ctx: Arc<SonarContext>) -> Self {
        Self {
            parser: FrameParser::new(),
            variant,
            ctx,
            sequence: 0,
        }
    }

    /// 处理一块原始字节，返回本块完成的有效帧数
    ///
    /// 空块不做任何事。
    pub fn feed(&mut self, chunk: &[u8]) -> usize {
        self.feed_at(chunk, Instant::now())
    }

    /// 同 [`feed`](Self::feed)，但使用调用方提供的到达时间
    pub fn feed_at(&mut self, chunk: &[u8], now: Instant) -> usize {
        if chunk.is_empty() {
            return 0;
        }

        let ctx = Arc::clone(&self.ctx);
        ctx.metrics.bytes_received.fetch_add(chunk.len() as u64, Ordering::Relaxed);

        let mut decoded = 0;
        for outcome in self.parser.feed(chunk) {
            match outcome {
                Ok(raw) => {
                    self.publish(raw, now);
                    decoded += 1;
                },
                Err(e) => {
                    ctx.metrics.frames_malformed.fetch_add(1, Ordering::Relaxed);
                    debug!("Dropped malformed {} frame: {}", self.variant, e);
                },
            }
        }
        decoded
    }

    fn publish(&mut self, raw: u32, now: Instant) {
        self.sequence += 1;
        let reading = Reading {
            raw_magnitude: raw,
            range: convert_serial(raw, self.variant),
            variant: self.variant,
            sequence: self.sequence,
            received_at: now,
        };
        trace!(
            "{} frame #{}: raw={} range={:.2}",
            self.variant, reading.sequence, raw, reading.range
        );

        self.ctx.publish(reading);
        self.ctx.sample_rate.record_arrival(now);
        self.ctx.connection.register_frame_at(now);
        self.ctx.metrics.frames_valid.fetch_add(1, Ordering::Relaxed);
    }

    /// 丢弃正在解析的残帧（例如串口重新打开之后）
    pub fn discard_partial(&mut self) {
        self.parser.reset();
    }

    pub fn parser(&self) -> &FrameParser {
        &self.parser
    }

    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    pub fn context(&self) -> &Arc<SonarContext> {
        &self.ctx
    }
}
