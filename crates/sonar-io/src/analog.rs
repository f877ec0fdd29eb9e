//! 模拟量输入后端

use crate::{AnalogInput, ChannelError};
use std::path::{Path, PathBuf};

/// 从文本节点读取 ADC 码值
///
/// 适用于 Linux IIO 子系统（如 `/sys/bus/iio/devices/iio:device0/in_voltage0_raw`），
/// 每次读取都重新打开文件，不持有任何状态。
#[derive(Debug, Clone)]
pub struct SysfsAnalogInput {
    path: PathBuf,
}

impl SysfsAnalogInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AnalogInput for SysfsAnalogInput {
    fn read_code(&self) -> Result<u32, ChannelError> {
        let text = std::fs::read_to_string(&self.path)?;
        let trimmed = text.trim();
        trimmed.parse::<u32>().map_err(|e| {
            ChannelError::InvalidData(format!(
                "{}: cannot parse {:?} as ADC code: {}",
                self.path.display(),
                trimmed,
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_code() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2032").unwrap();

        let input = SysfsAnalogInput::new(file.path());
        assert_eq!(input.read_code().unwrap(), 2032);
    }

    #[test]
    fn test_read_code_rereads_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let input = SysfsAnalogInput::new(file.path());

        std::fs::write(file.path(), "100\n").unwrap();
        assert_eq!(input.read_code().unwrap(), 100);

        std::fs::write(file.path(), "200\n").unwrap();
        assert_eq!(input.read_code().unwrap(), 200);
    }

    #[test]
    fn test_invalid_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "-12").unwrap();

        let input = SysfsAnalogInput::new(file.path());
        assert!(matches!(input.read_code(), Err(ChannelError::InvalidData(_))));
    }

    #[test]
    fn test_missing_file() {
        let input = SysfsAnalogInput::new("/nonexistent/in_voltage0_raw");
        assert!(matches!(input.read_code(), Err(ChannelError::Io(_))));
    }
}
