//! 解码命令
//!
//! 离线解码录制的串口字节流，逐帧打印原始读数与换算后的距离。

use anyhow::{Context, Result, bail};
use clap::Args;
use sonar_sdk::protocol::{FrameParser, convert_serial};
use sonar_sdk::{DeviceVariant, Inches, ProtocolError};
use std::fs;
use std::path::PathBuf;

/// 解码命令参数
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// 录制文件路径
    pub file: PathBuf,

    /// 传感器型号：mb1013 | mb1200
    #[arg(short, long, default_value_t = DeviceVariant::Mb1013)]
    pub variant: DeviceVariant,

    /// 按给定大小分块喂入解析器（模拟串口的分段到达）
    #[arg(long, default_value_t = 64)]
    pub chunk_size: usize,
}

/// 单帧解码结果
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedFrame {
    Valid { raw: u32, range: Inches },
    Malformed(ProtocolError),
}

/// 解码汇总
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DecodeSummary {
    pub frames: Vec<DecodedFrame>,
    pub valid: usize,
    pub malformed: usize,
}

/// 分块解码整段字节流
pub fn decode_stream(bytes: &[u8], variant: DeviceVariant, chunk_size: usize) -> DecodeSummary {
    let mut parser = FrameParser::new();
    let mut summary = DecodeSummary::default();

    for chunk in bytes.chunks(chunk_size.max(1)) {
        for outcome in parser.feed(chunk) {
            match outcome {
                Ok(raw) => {
                    summary.valid += 1;
                    summary.frames.push(DecodedFrame::Valid {
                        raw,
                        range: convert_serial(raw, variant),
                    });
                },
                Err(e) => {
                    summary.malformed += 1;
                    summary.frames.push(DecodedFrame::Malformed(e));
                },
            }
        }
    }
    summary
}

impl DecodeCommand {
    pub fn execute(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("--chunk-size must be greater than 0");
        }

        let bytes = fs::read(&self.file)
            .with_context(|| format!("Failed to read capture {}", self.file.display()))?;
        let summary = decode_stream(&bytes, self.variant, self.chunk_size);

        let mut index = 0;
        for frame in &summary.frames {
            match frame {
                DecodedFrame::Valid { raw, range } => {
                    index += 1;
                    println!("#{index:<6} raw={raw:<6} {range:.2}");
                },
                DecodedFrame::Malformed(e) => println!("        ⚠️  dropped frame: {e}"),
            }
        }

        println!(
            "\n{} bytes, {} {} frames, {} malformed",
            bytes.len(),
            summary.valid,
            self.variant,
            summary.malformed
        );
        Ok(())
    }
}
