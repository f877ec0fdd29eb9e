//! Mock 通道（无硬件依赖，用于测试）
//!
//! `MockSerialChannel` 由 [`MockSerialHandle`] 从其他线程注入数据与错误，
//! 读取端在没有数据时按读取超时阻塞，行为与真实串口一致。

use crate::{AnalogInput, ChannelError, SerialChannel};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

enum MockEvent {
    Data(Vec<u8>),
    Error(ChannelError),
}

/// Mock 串口通道
pub struct MockSerialChannel {
    rx: Receiver<MockEvent>,
    /// 上一次读取未能放入缓冲区的剩余字节
    leftover: Vec<u8>,
    read_timeout: Duration,
    reads: Arc<AtomicU64>,
    clears: Arc<AtomicU64>,
    _alive: Arc<()>,
}

/// Mock 串口的注入端
#[derive(Clone)]
pub struct MockSerialHandle {
    tx: Sender<MockEvent>,
    reads: Arc<AtomicU64>,
    clears: Arc<AtomicU64>,
    alive: Weak<()>,
}

impl MockSerialChannel {
    pub fn new() -> (Self, MockSerialHandle) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let reads = Arc::new(AtomicU64::new(0));
        let clears = Arc::new(AtomicU64::new(0));
        let alive = Arc::new(());
        let handle = MockSerialHandle {
            tx,
            reads: reads.clone(),
            clears: clears.clone(),
            alive: Arc::downgrade(&alive),
        };
        let channel = Self {
            rx,
            leftover: Vec::new(),
            read_timeout: Duration::from_millis(10),
            reads,
            clears,
            _alive: alive,
        };
        (channel, handle)
    }
}

impl SerialChannel for MockSerialChannel {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError> {
        self.reads.fetch_add(1, Ordering::Relaxed);

        if self.leftover.is_empty() {
            match self.rx.recv_timeout(self.read_timeout) {
                Ok(MockEvent::Data(data)) => self.leftover = data,
                Ok(MockEvent::Error(e)) => return Err(e),
                Err(RecvTimeoutError::Timeout) => return Err(ChannelError::Timeout),
                Err(RecvTimeoutError::Disconnected) => return Err(ChannelError::Disconnected),
            }
        }

        let n = self.leftover.len().min(buf.len());
        buf[..n].copy_from_slice(&self.leftover[..n]);
        self.leftover.drain(..n);
        Ok(n)
    }

    fn clear_input(&mut self) -> Result<(), ChannelError> {
        self.clears.fetch_add(1, Ordering::Relaxed);
        self.leftover.clear();
        while let Ok(event) = self.rx.try_recv() {
            if let MockEvent::Error(e) = event {
                return Err(e);
            }
        }
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), ChannelError> {
        self.read_timeout = timeout;
        Ok(())
    }
}

impl MockSerialHandle {
    /// 注入一块数据（空块表示一次零字节读取）
    pub fn push(&self, data: &[u8]) {
        let _ = self.tx.send(MockEvent::Data(data.to_vec()));
    }

    /// 注入一次读取错误
    pub fn push_error(&self, error: ChannelError) {
        let _ = self.tx.send(MockEvent::Error(error));
    }

    /// 已发生的 `read_chunk` 调用次数
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// 已发生的 `clear_input` 调用次数
    pub fn clears(&self) -> u64 {
        self.clears.load(Ordering::Relaxed)
    }

    /// 读取端是否已被释放（IO 线程退出后为 true）
    pub fn is_released(&self) -> bool {
        self.alive.strong_count() == 0
    }
}

/// Mock 模拟量输入
#[derive(Debug, Default)]
pub struct MockAnalogInput {
    code: AtomicU32,
    fail: AtomicBool,
}

impl MockAnalogInput {
    pub fn new(code: u32) -> Self {
        Self {
            code: AtomicU32::new(code),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_code(&self, code: u32) {
        self.code.store(code, Ordering::Relaxed);
    }

    /// 让后续读取返回错误
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }
}

impl AnalogInput for MockAnalogInput {
    fn read_code(&self) -> Result<u32, ChannelError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(ChannelError::Device("mock analog failure".into()));
        }
        Ok(self.code.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_read_and_leftover() {
        let (mut channel, handle) = MockSerialChannel::new();
        handle.push(b"R0254\r");

        let mut buf = [0u8; 4];
        assert_eq!(channel.read_chunk(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"R025");
        assert_eq!(channel.read_chunk(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"4\r");
        assert_eq!(handle.reads(), 2);
    }

    #[test]
    fn test_mock_timeout_when_empty() {
        let (mut channel, _handle) = MockSerialChannel::new();
        channel.set_read_timeout(Duration::from_millis(1)).unwrap();
        let mut buf = [0u8; 4];
        assert!(matches!(channel.read_chunk(&mut buf), Err(ChannelError::Timeout)));
    }

    #[test]
    fn test_mock_injected_error() {
        let (mut channel, handle) = MockSerialChannel::new();
        handle.push_error(ChannelError::Device("boom".into()));
        let mut buf = [0u8; 4];
        assert!(matches!(channel.read_chunk(&mut buf), Err(ChannelError::Device(_))));
    }

    #[test]
    fn test_mock_disconnected_when_handle_dropped() {
        let (mut channel, handle) = MockSerialChannel::new();
        drop(handle);
        let mut buf = [0u8; 4];
        assert!(matches!(channel.read_chunk(&mut buf), Err(ChannelError::Disconnected)));
    }

    #[test]
    fn test_mock_clear_input_discards_pending() {
        let (mut channel, handle) = MockSerialChannel::new();
        handle.push(b"stale");
        channel.clear_input().unwrap();
        assert_eq!(handle.clears(), 1);

        channel.set_read_timeout(Duration::from_millis(1)).unwrap();
        let mut buf = [0u8; 8];
        assert!(matches!(channel.read_chunk(&mut buf), Err(ChannelError::Timeout)));
    }

    #[test]
    fn test_mock_handle_release() {
        let (channel, handle) = MockSerialChannel::new();
        assert!(!handle.is_released());
        drop(channel);
        assert!(handle.is_released());
    }

    #[test]
    fn test_mock_analog() {
        let input = MockAnalogInput::new(100);
        assert_eq!(input.read_code().unwrap(), 100);
        input.set_code(250);
        assert_eq!(input.read_code().unwrap(), 250);
        input.set_failing(true);
        assert!(input.read_code().is_err());
    }
}
