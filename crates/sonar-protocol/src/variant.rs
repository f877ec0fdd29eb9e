//! 传感器型号定义
//!
//! 每个型号携带两组固定的换算系数：
//! - 串口系数：原生单位 → 英寸（毫米或厘米每英寸）
//! - 模拟量系数：ADC 码值 → 英寸（每英寸的 bit 数）
//!
//! 系数以精确有理数存储，避免 `25.4 / 1.25` 这类浮点常量引入的舍入误差。

use crate::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// 精确有理数换算系数：`numerator / denominator`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFactor {
    pub numerator: u32,
    pub denominator: u32,
}

impl ScaleFactor {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// `value / (numerator / denominator)`，先乘后除以保持精度
    #[inline]
    pub fn divide(self, value: u32) -> f64 {
        (f64::from(value) * f64::from(self.denominator)) / f64::from(self.numerator)
    }

    /// 系数的浮点值（仅用于展示）
    pub fn as_f64(self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator)
    }
}

/// 传感器型号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DeviceVariant {
    /// MB1013（HRLV-MaxSonar-EZ）：串口输出毫米，模拟量 1.25mm/bit
    #[default]
    Mb1013,
    /// MB1200（XL-MaxSonar-EZ）：串口输出厘米，模拟量 0.25cm/bit
    Mb1200,
}

impl DeviceVariant {
    /// 全部已知型号
    pub const ALL: [DeviceVariant; 2] = [DeviceVariant::Mb1013, DeviceVariant::Mb1200];

    /// 串口换算系数（原生单位每英寸）
    pub const fn serial_factor(self) -> ScaleFactor {
        match self {
            // 25.4 mm/inch
            DeviceVariant::Mb1013 => ScaleFactor::new(254, 10),
            // 2.54 cm/inch
            DeviceVariant::Mb1200 => ScaleFactor::new(254, 100),
        }
    }

    /// 模拟量换算系数（bit 每英寸）
    pub const fn analog_factor(self) -> ScaleFactor {
        match self {
            // 25.40mm/inch / 1.25mm/bit
            DeviceVariant::Mb1013 => ScaleFactor::new(2540, 125),
            // 2.54cm/inch / 0.25cm/bit
            DeviceVariant::Mb1200 => ScaleFactor::new(254, 25),
        }
    }

    /// 型号名称（用于日志与报告）
    pub const fn name(self) -> &'static str {
        match self {
            DeviceVariant::Mb1013 => "MB1013",
            DeviceVariant::Mb1200 => "MB1200",
        }
    }
}

impl fmt::Display for DeviceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceVariant {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceVariant::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProtocolError::UnknownVariant(s.to_string()))
    }
}
