//! 基于 `std::io::Read` 的串口通道
//!
//! 适用于已经由系统配置好的 tty 设备文件、管道以及录制下来的原始字节文件。

use crate::{ChannelError, SerialChannel};
use std::fs::File;
use std::io::{self, Cursor, ErrorKind, Read};
use std::path::Path;
use std::time::Duration;

/// 读取前的就绪等待
///
/// 设置了读超时后，[`ReaderChannel`] 会先调用 `wait_readable`，返回 `false`
/// 即视为本次读取超时，不再进入可能永久阻塞的 `read`。
pub trait ReadReady {
    /// 等待数据可读，超时返回 `Ok(false)`
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool>;
}

/// tty / FIFO 通过 `poll(POLLIN)` 等待；普通文件总是立即就绪
#[cfg(unix)]
impl ReadReady for File {
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        use nix::errno::Errno;
        use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
        use std::os::fd::AsFd;

        let pollfd = PollFd::new(self.as_fd(), PollFlags::POLLIN);
        let timeout_ms = timeout.as_millis().min(u16::MAX as u128) as u16;
        match poll(&mut [pollfd], PollTimeout::from(timeout_ms)) {
            Ok(0) => Ok(false),
            // POLLHUP（写端关闭）也算就绪，随后的 read 返回 EOF
            Ok(_) => Ok(true),
            // 被信号打断，按一次超时处理，由调用方重新检查退出信号
            Err(Errno::EINTR) => Ok(false),
            Err(e) => Err(io::Error::other(format!("poll failed: {}", e))),
        }
    }
}

#[cfg(not(unix))]
impl ReadReady for File {
    fn wait_readable(&self, _timeout: Duration) -> io::Result<bool> {
        Ok(true)
    }
}

impl<T: AsRef<[u8]>> ReadReady for Cursor<T> {
    fn wait_readable(&self, _timeout: Duration) -> io::Result<bool> {
        Ok(true)
    }
}

/// `Read` 实现的串口通道适配器
///
/// 错误映射：
/// - 等待就绪超时 / `WouldBlock` / `TimedOut` → [`ChannelError::Timeout`]
/// - `Interrupted` → 自动重试
/// - EOF → `Ok(0)`（对 tty 而言只是暂时没有数据）
#[derive(Debug)]
pub struct ReaderChannel<R> {
    inner: R,
    /// `None` 表示直接阻塞在 `read` 上
    read_timeout: Option<Duration>,
}

impl<R: Read + ReadReady> ReaderChannel<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            read_timeout: None,
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl ReaderChannel<File> {
    /// 以只读方式打开设备文件或录制文件
    ///
    /// 打开 FIFO 时会阻塞到写端出现为止。
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ChannelError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ChannelError::Device(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Ok(Self::new(file))
    }
}

impl<R: Read + ReadReady> SerialChannel for ReaderChannel<R> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError> {
        if let Some(timeout) = self.read_timeout
            && !self.inner.wait_readable(timeout)?
        {
            return Err(ChannelError::Timeout);
        }

        loop {
            match self.inner.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(ChannelError::Timeout);
                },
                Err(e) => return Err(ChannelError::Io(e)),
            }
        }
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), ChannelError> {
        self.read_timeout = Some(timeout);
        Ok(())
    }
}
