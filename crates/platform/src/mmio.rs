//! Register-file access abstraction
//!
//! Display interface blocks expose a small window of 32-bit registers.
//! Drivers talk to that window through [`RegisterIo`] so the same driver code
//! runs against real memory-mapped hardware ([`MmioRegisters`]) and against
//! the recording mock used in host tests (`mocks::MockRegisters`).
//!
//! # Bit-field helpers
//!
//! Field positions follow the datasheet convention of an inclusive
//! `high:low` bit range, e.g. the CS-select field of a control register at
//! bits `3:2` is addressed as `(3, 2)`.
//!
//! ```
//! use platform::mmio::{field_get, field_modify, field_value};
//!
//! assert_eq!(field_value(0b11, 3, 2), 0b1100);
//! assert_eq!(field_modify(0xFFFF_FFFF, 0, 3, 2), 0xFFFF_FFF3);
//! assert_eq!(field_get(0xA5, 7, 4), 0xA);
//! ```

use core::ptr::NonNull;

/// Mask covering bits `high..=low` (inclusive), already shifted into place.
#[must_use]
pub const fn field_mask(high: u32, low: u32) -> u32 {
    let width = high.wrapping_sub(low).wrapping_add(1);
    if width >= 32 {
        u32::MAX
    } else {
        1u32.wrapping_shl(width).wrapping_sub(1).wrapping_shl(low)
    }
}

/// Place `value` into bits `high..=low`; bits outside the field are dropped.
#[must_use]
pub const fn field_value(value: u32, high: u32, low: u32) -> u32 {
    value.wrapping_shl(low) & field_mask(high, low)
}

/// Replace bits `high..=low` of `orig` with `value`.
#[must_use]
pub const fn field_modify(orig: u32, value: u32, high: u32, low: u32) -> u32 {
    (orig & !field_mask(high, low)) | field_value(value, high, low)
}

/// Extract bits `high..=low` of `value`, shifted down to bit 0.
#[must_use]
pub const fn field_get(value: u32, high: u32, low: u32) -> u32 {
    (value & field_mask(high, low)).wrapping_shr(low)
}

/// Raw 32-bit access to a fixed register window.
///
/// Offsets are byte offsets from the start of the window. Implementations do
/// no validation beyond addressing: there is no logic in this layer.
pub trait RegisterIo {
    /// Read the 32-bit register at `offset`.
    ///
    /// Takes `&mut self` because reads of FIFO-style ports (e.g. a read-data
    /// port) have side effects on the hardware.
    fn read(&mut self, offset: u16) -> u32;

    /// Write `value` to the 32-bit register at `offset`.
    fn write(&mut self, offset: u16, value: u32);

    /// Read-modify-write bits `high..=low` of the register at `offset`.
    fn modify(&mut self, offset: u16, high: u32, low: u32, value: u32) {
        let orig = self.read(offset);
        self.write(offset, field_modify(orig, value, high, low));
    }
}

/// [`RegisterIo`] over a memory-mapped peripheral window.
///
/// Every access is a single volatile 32-bit load or store.
pub struct MmioRegisters {
    base: NonNull<u32>,
    len: usize,
}

impl MmioRegisters {
    /// Wrap the register window starting at `base`, `len` bytes long.
    ///
    /// Returns `None` if `base` is null or not 4-byte aligned.
    ///
    /// # Safety
    ///
    /// `base..base + len` must be a valid, mapped device register window for
    /// the whole lifetime of the returned value, and no other code may hold a
    /// Rust reference into it.
    pub unsafe fn new(base: *mut u8, len: usize) -> Option<Self> {
        if base.align_offset(core::mem::align_of::<u32>()) != 0 {
            return None;
        }
        NonNull::new(base.cast::<u32>()).map(|base| Self { base, len })
    }

    /// Size of the mapped window in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the window is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn slot(&self, offset: u16) -> Option<*mut u32> {
        let offset = usize::from(offset);
        if offset & 0x3 != 0 || offset.saturating_add(4) > self.len {
            return None;
        }
        // SAFETY: `offset + 4 <= len` was checked above and the constructor's
        // contract guarantees the window is mapped for `len` bytes.
        Some(unsafe { self.base.as_ptr().add(offset >> 2) })
    }
}

impl RegisterIo for MmioRegisters {
    fn read(&mut self, offset: u16) -> u32 {
        match self.slot(offset) {
            // SAFETY: `slot` only returns aligned pointers inside the window.
            Some(ptr) => unsafe { core::ptr::read_volatile(ptr) },
            None => 0,
        }
    }

    fn write(&mut self, offset: u16, value: u32) {
        if let Some(ptr) = self.slot(offset) {
            // SAFETY: `slot` only returns aligned pointers inside the window.
            unsafe { core::ptr::write_volatile(ptr, value) }
        }
    }
}

// SAFETY: the window is device memory owned exclusively by this value; moving
// it to another execution context does not alias it.
unsafe impl Send for MmioRegisters {}
