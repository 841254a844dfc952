//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits
//! for use in unit and integration tests.

#![cfg(any(test, feature = "std"))]

use crate::mmio::RegisterIo;
use crate::pipeline::{DisplayPipeline, HandlerKey, LcdManagerConfig, VideoMode};
use crate::power::PowerResource;

/// Number of 32-bit slots in the mock register file (256-byte window).
pub const MOCK_REGISTER_SLOTS: usize = 64;

/// Capacity of the register write log, and of the read log.
pub const MOCK_WRITE_LOG_LEN: usize = 256;

/// One recorded register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    /// Byte offset written
    pub offset: u16,
    /// Value written
    pub value: u32,
}

/// Mock register file
///
/// Registers behave like plain memory, except for an optional read port whose
/// reads are served from a queue (a FIFO port on real hardware).
///
/// Accesses past the log capacity are not recorded. The log accessors panic
/// once that has happened, so a test can never assert on a truncated log;
/// call [`clear_log`](MockRegisters::clear_log) between phases of a long test.
pub struct MockRegisters {
    slots: [u32; MOCK_REGISTER_SLOTS],
    writes: heapless::Vec<RegisterWrite, MOCK_WRITE_LOG_LEN>,
    reads: heapless::Vec<u16, MOCK_WRITE_LOG_LEN>,
    overflowed: bool,
    fifo_port: Option<u16>,
    fifo: heapless::Deque<u32, 64>,
}

impl MockRegisters {
    /// Create a zeroed register file with no FIFO port.
    pub fn new() -> Self {
        Self {
            slots: [0; MOCK_REGISTER_SLOTS],
            writes: heapless::Vec::new(),
            reads: heapless::Vec::new(),
            overflowed: false,
            fifo_port: None,
            fifo: heapless::Deque::new(),
        }
    }

    /// Serve reads of `offset` from the queue filled by [`push_read`].
    ///
    /// [`push_read`]: MockRegisters::push_read
    pub fn with_fifo_port(mut self, offset: u16) -> Self {
        self.fifo_port = Some(offset);
        self
    }

    /// Queue a value to be returned by the next FIFO-port read.
    pub fn push_read(&mut self, value: u32) -> Result<(), u32> {
        self.fifo.push_back(value)
    }

    /// Preset a register without logging a write.
    pub fn set(&mut self, offset: u16, value: u32) {
        if let Some(slot) = self.slots.get_mut(usize::from(offset >> 2)) {
            *slot = value;
        }
    }

    /// Current register contents, without logging a read.
    pub fn get(&self, offset: u16) -> u32 {
        self.slots
            .get(usize::from(offset >> 2))
            .copied()
            .unwrap_or(0)
    }

    /// All writes since creation or the last [`clear_log`].
    ///
    /// [`clear_log`]: MockRegisters::clear_log
    ///
    /// # Panics
    ///
    /// If the log overflowed since it was last cleared.
    pub fn writes(&self) -> &[RegisterWrite] {
        self.assert_complete_log();
        &self.writes
    }

    /// Writes to one offset, in order.
    ///
    /// # Panics
    ///
    /// If the log overflowed since it was last cleared.
    pub fn writes_to(&self, offset: u16) -> impl Iterator<Item = u32> + '_ {
        self.writes()
            .iter()
            .filter(move |w| w.offset == offset)
            .map(|w| w.value)
    }

    /// Offsets read since creation or the last [`clear_log`].
    ///
    /// [`clear_log`]: MockRegisters::clear_log
    ///
    /// # Panics
    ///
    /// If the log overflowed since it was last cleared.
    pub fn reads(&self) -> &[u16] {
        self.assert_complete_log();
        &self.reads
    }

    /// Total number of register accesses logged.
    ///
    /// # Panics
    ///
    /// If the log overflowed since it was last cleared.
    pub fn access_count(&self) -> usize {
        self.assert_complete_log();
        self.writes.len().saturating_add(self.reads.len())
    }

    /// `true` if an access was dropped because the log was full.
    pub fn log_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Forget logged accesses; register contents are kept.
    pub fn clear_log(&mut self) {
        self.writes.clear();
        self.reads.clear();
        self.overflowed = false;
    }

    fn assert_complete_log(&self) {
        assert!(
            !self.overflowed,
            "mock register log overflowed ({MOCK_WRITE_LOG_LEN} entries); clear_log() between phases"
        );
    }
}

impl Default for MockRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterIo for MockRegisters {
    fn read(&mut self, offset: u16) -> u32 {
        if self.reads.push(offset).is_err() {
            self.overflowed = true;
        }
        if self.fifo_port == Some(offset) {
            return self.fifo.pop_front().unwrap_or(0);
        }
        self.get(offset)
    }

    fn write(&mut self, offset: u16, value: u32) {
        if self.writes.push(RegisterWrite { offset, value }).is_err() {
            self.overflowed = true;
        }
        self.set(offset, value);
    }
}

/// Mock power domain
///
/// Tracks the reference count and can be told to refuse the next acquire.
#[derive(Debug, Default)]
pub struct MockPower {
    refcount: u32,
    acquires: u32,
    /// When set, `acquire` fails without touching the count.
    pub fail_acquire: bool,
}

/// Error returned by [`MockPower`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockPowerError {
    /// Acquire refused by test setup
    Refused,
    /// Release without a matching acquire
    Unbalanced,
}

impl MockPower {
    /// Create an unpowered domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Outstanding references.
    pub fn refcount(&self) -> u32 {
        self.refcount
    }

    /// Successful acquires over the lifetime of the mock.
    pub fn acquire_count(&self) -> u32 {
        self.acquires
    }

    /// Returns `true` while any reference is held.
    pub fn is_powered(&self) -> bool {
        self.refcount > 0
    }
}

impl PowerResource for MockPower {
    type Error = MockPowerError;

    fn acquire(&mut self) -> Result<(), Self::Error> {
        if self.fail_acquire {
            return Err(MockPowerError::Refused);
        }
        self.refcount = self.refcount.saturating_add(1);
        self.acquires = self.acquires.saturating_add(1);
        Ok(())
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.refcount = self
            .refcount
            .checked_sub(1)
            .ok_or(MockPowerError::Unbalanced)?;
        Ok(())
    }
}

/// Error returned by [`MockPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockPipelineError {
    /// A handler is already registered under this key
    AlreadyRegistered,
    /// No handler registered under this key
    NotRegistered,
    /// Failure injected by test setup
    Injected,
}

/// Mock display pipeline
///
/// Records every call so tests can assert on sequencing.
#[derive(Debug, Default)]
pub struct MockPipeline {
    registered: Option<HandlerKey>,
    enabled: bool,
    timings: Option<VideoMode>,
    lcd_config: Option<LcdManagerConfig>,
    start_updates: u32,
    disables: u32,
    /// When set, `enable` fails.
    pub fail_enable: bool,
    /// When set, `register_framedone_handler` fails.
    pub fail_register: bool,
}

impl MockPipeline {
    /// Create an idle pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key of the registered frame-done handler, if any.
    pub fn registered(&self) -> Option<HandlerKey> {
        self.registered
    }

    /// Returns `true` while the manager is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Last timings programmed.
    pub fn timings(&self) -> Option<VideoMode> {
        self.timings
    }

    /// Last LCD manager configuration programmed.
    pub fn lcd_config(&self) -> Option<LcdManagerConfig> {
        self.lcd_config
    }

    /// Number of `start_update` calls.
    pub fn start_updates(&self) -> u32 {
        self.start_updates
    }

    /// Number of `disable` calls.
    pub fn disables(&self) -> u32 {
        self.disables
    }
}

impl DisplayPipeline for MockPipeline {
    type Error = MockPipelineError;

    fn register_framedone_handler(&mut self, key: HandlerKey) -> Result<(), Self::Error> {
        if self.fail_register {
            return Err(MockPipelineError::Injected);
        }
        if self.registered.is_some() {
            return Err(MockPipelineError::AlreadyRegistered);
        }
        self.registered = Some(key);
        Ok(())
    }

    fn unregister_framedone_handler(&mut self, key: HandlerKey) -> Result<(), Self::Error> {
        if self.registered != Some(key) {
            return Err(MockPipelineError::NotRegistered);
        }
        self.registered = None;
        Ok(())
    }

    fn set_timings(&mut self, mode: &VideoMode) {
        self.timings = Some(*mode);
    }

    fn set_lcd_config(&mut self, config: &LcdManagerConfig) -> Result<(), Self::Error> {
        self.lcd_config = Some(*config);
        Ok(())
    }

    fn enable(&mut self) -> Result<(), Self::Error> {
        if self.fail_enable {
            return Err(MockPipelineError::Injected);
        }
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.disables = self.disables.saturating_add(1);
    }

    fn start_update(&mut self) {
        self.start_updates = self.start_updates.saturating_add(1);
    }
}
