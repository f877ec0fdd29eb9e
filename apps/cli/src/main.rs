//! # Sonar CLI
//!
//! Command-line reporter for MaxBotix ultrasonic range finders.
//!
//! ```bash
//! # 实时监控（Ctrl+C 停止）
//! sonar-cli monitor --device /dev/ttyUSB0 --variant mb1200 --frequency 5
//!
//! # 使用配置文件，命令行参数覆盖文件中的值
//! sonar-cli monitor --config sonar.toml --frequency 20
//!
//! # 离线解码录制的串口数据
//! sonar-cli decode capture.bin --variant mb1013
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

use commands::{DecodeCommand, MonitorCommand};

/// Sonar CLI - 超声波测距仪命令行工具
#[derive(Parser, Debug)]
#[command(name = "sonar-cli")]
#[command(about = "Command-line reporter for MaxBotix range finders", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 周期性打印串口距离、帧率与模拟量距离
    Monitor {
        #[command(flatten)]
        args: MonitorCommand,
    },

    /// 离线解码录制的串口字节流
    Decode {
        #[command(flatten)]
        args: DecodeCommand,
    },
}

fn main() -> Result<()> {
    sonar_sdk::init_logger();

    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor { args } => args.execute(),
        Commands::Decode { args } => args.execute(),
    }
}
