//! 监控命令
//!
//! 按固定频率打印 `<型号> Serial` / `<型号> Rate` / `<型号> Analog`，
//! 直到收到 Ctrl+C，然后关闭驱动。

use crate::config::CliConfig;
use anyhow::{Context, Result, bail};
use clap::Args;
use sonar_sdk::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

/// 默认报告频率（Hz）
const DEFAULT_FREQUENCY: f64 = 10.0;

/// 监控命令参数
#[derive(Args, Debug, Default)]
pub struct MonitorCommand {
    /// 串口设备（覆盖配置）
    #[arg(short, long)]
    pub device: Option<String>,

    /// 串口波特率（默认 9600）
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// 把设备当作普通字节流读取（预先配置好的 tty、命名管道等）
    #[arg(long)]
    pub stream: bool,

    /// 模拟量 sysfs 节点（覆盖配置）
    #[arg(short, long)]
    pub analog: Option<PathBuf>,

    /// 传感器型号：mb1013 | mb1200
    #[arg(short, long)]
    pub variant: Option<DeviceVariant>,

    /// 报告频率（Hz）
    #[arg(short, long)]
    pub frequency: Option<f64>,

    /// TOML 配置文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// 合并配置文件与命令行参数后的最终设置
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub variant: DeviceVariant,
    pub device: Option<String>,
    pub baud_rate: Option<u32>,
    pub analog: Option<PathBuf>,
    pub interval: Duration,
    pub pipeline: PipelineConfig,
}

impl MonitorCommand {
    /// 命令行参数优先于配置文件
    pub fn resolve(&self, file: CliConfig) -> Result<MonitorSettings> {
        let frequency = self.frequency.or(file.frequency).unwrap_or(DEFAULT_FREQUENCY);
        if !frequency.is_finite() || frequency <= 0.0 {
            bail!("Report frequency must be a positive number, got {}", frequency);
        }

        let settings = MonitorSettings {
            variant: self.variant.or(file.variant).unwrap_or_default(),
            device: self.device.clone().or(file.device),
            baud_rate: self.baud.or(file.baud_rate),
            analog: self.analog.clone().or(file.analog),
            interval: Duration::from_secs_f64(1.0 / frequency),
            pipeline: file.pipeline.unwrap_or_default(),
        };

        if settings.device.is_none() && settings.analog.is_none() {
            bail!("Neither a serial device nor an analog input is configured");
        }
        Ok(settings)
    }

    fn build_sonar(&self, settings: &MonitorSettings) -> Result<Sonar> {
        let mut builder = SonarBuilder::new()
            .variant(settings.variant)
            .pipeline_config(settings.pipeline.clone());

        if let Some(device) = &settings.device {
            builder = if self.stream {
                builder.reader_device(device)
            } else {
                builder.serial_device(device.as_str())
            };
            if let Some(baud) = settings.baud_rate {
                builder = builder.baud_rate(baud);
            }
        }
        if let Some(analog) = &settings.analog {
            builder = builder.analog_sysfs(analog);
        }

        builder.build().context("Failed to start sonar driver")
    }

    pub fn execute(&self) -> Result<()> {
        let file = CliConfig::load_optional(self.config.as_deref())?;
        let settings = self.resolve(file)?;
        let sonar = self.build_sonar(&settings)?;

        println!(
            "📊 {} 监控中 ({:.1} Hz)...",
            settings.variant,
            1.0 / settings.interval.as_secs_f64()
        );
        println!("按 Ctrl+C 停止\n");

        // 设置 Ctrl+C 处理
        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        })
        .context("Failed to install Ctrl+C handler")?;

        // 丢弃启动阶段的统计
        sonar.reset_sample_rate();

        while running.load(Ordering::SeqCst) {
            std::thread::sleep(settings.interval);
            for line in report_lines(&sonar) {
                println!("{line}");
            }
        }

        println!("\n收到退出信号，正在关闭...");
        let metrics = sonar.get_metrics();
        info!(
            "frames: {} valid, {} malformed, {} read errors",
            metrics.frames_valid, metrics.frames_malformed, metrics.read_errors
        );
        sonar.shutdown()?;
        Ok(())
    }
}

fn format_range(range: Option<Inches>) -> String {
    match range {
        Some(range) => format!("{:.2}", range),
        None => "unavailable".to_string(),
    }
}

/// 一次报告的输出行（只报告已配置的通道）
pub fn report_lines(sonar: &Sonar) -> Vec<String> {
    let model = sonar.variant().name();
    let mut lines = Vec::with_capacity(3);

    if sonar.has_serial() {
        lines.push(format!("{model} Serial: {}", format_range(sonar.current_range())));
        lines.push(format!("{model} Rate: {:.1} Hz", sonar.current_rate()));
    }
    if sonar.has_analog() {
        lines.push(format!("{model} Analog: {}", format_range(sonar.current_analog_range())));
    }
    lines
}
