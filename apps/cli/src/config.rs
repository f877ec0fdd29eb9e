//! 配置文件
//!
//! TOML 格式，所有字段都可选：
//!
//! ```toml
//! variant = "mb1200"
//! device = "/dev/ttyUSB0"
//! baud_rate = 9600
//! analog = "/sys/bus/iio/devices/iio:device0/in_voltage0_raw"
//! frequency = 10.0
//!
//! [pipeline]
//! idle_backoff_max_ms = 20
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sonar_sdk::{DeviceVariant, PipelineConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// 传感器型号
    pub variant: Option<DeviceVariant>,

    /// 串口设备路径
    pub device: Option<String>,

    /// 串口波特率
    pub baud_rate: Option<u32>,

    /// 模拟量 sysfs 节点
    pub analog: Option<PathBuf>,

    /// 报告频率（Hz）
    pub frequency: Option<f64>,

    /// IO 线程配置
    pub pipeline: Option<PipelineConfig>,
}

impl CliConfig {
    /// 加载配置文件
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 加载可选的配置文件，未指定时返回默认配置
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
