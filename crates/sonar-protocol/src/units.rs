//! 强类型长度单位与换算
//!
//! 所有对外输出的距离都以英寸表示，使用 NewType 防止与原始读数混用。
//!
//! ```rust
//! use sonar_protocol::{DeviceVariant, convert_serial};
//!
//! let range = convert_serial(254, DeviceVariant::Mb1013);
//! assert!((range.0 - 10.0).abs() < 1e-9);
//! ```

use crate::variant::DeviceVariant;
use std::fmt;

/// 英寸（NewType）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inches(pub f64);

impl Inches {
    pub const ZERO: Self = Inches(0.0);

    #[inline]
    pub const fn new(value: f64) -> Self {
        Inches(value)
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Inches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(precision) = f.precision() {
            write!(f, "{:.*} in", precision, self.0)
        } else {
            write!(f, "{} in", self.0)
        }
    }
}

/// 串口原始读数 → 英寸
#[inline]
pub fn convert_serial(raw_magnitude: u32, variant: DeviceVariant) -> Inches {
    Inches(variant.serial_factor().divide(raw_magnitude))
}

/// 模拟量 ADC 码值 → 英寸
#[inline]
pub fn convert_analog(raw_code: u32, variant: DeviceVariant) -> Inches {
    Inches(variant.analog_factor().divide(raw_code))
}
