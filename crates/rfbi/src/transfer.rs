//! Raw command, parameter and read streaming
//!
//! Each bus cycle moves one register write (or read) worth of data: a byte on
//! an 8-line bus, a little-endian 16-bit unit on a 16-line bus. The 9- and
//! 12-line modes are only used for pixel streaming from the display
//! pipeline and are refused here before any register is touched.
//!
//! Whole-frame transfers live on the controller, which owns the completion
//! slot; see [`RfbiBus::transfer_area`](crate::controller::RfbiBus::transfer_area).

use platform::mmio::RegisterIo;

use crate::error::TransferError;
use crate::format::ParallelMode;
use crate::registers::{CMD, PARAM, READ};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Byte,
    Halfword,
}

fn unit_for(mode: Option<ParallelMode>, len: usize) -> Result<Unit, TransferError> {
    match mode {
        None => Err(TransferError::NotConfigured),
        Some(ParallelMode::Lines8) => Ok(Unit::Byte),
        Some(ParallelMode::Lines16) if len & 1 != 0 => Err(TransferError::MisalignedLength),
        Some(ParallelMode::Lines16) => Ok(Unit::Halfword),
        Some(ParallelMode::Lines9 | ParallelMode::Lines12) => {
            Err(TransferError::UnsupportedParallelMode)
        }
    }
}

fn write_port<R: RegisterIo + ?Sized>(
    regs: &mut R,
    port: u16,
    mode: Option<ParallelMode>,
    bytes: &[u8],
) -> Result<(), TransferError> {
    match unit_for(mode, bytes.len())? {
        Unit::Byte => {
            for &b in bytes {
                regs.write(port, u32::from(b));
            }
        }
        Unit::Halfword => {
            for pair in bytes.chunks_exact(2) {
                if let &[lo, hi] = pair {
                    regs.write(port, u32::from(u16::from_le_bytes([lo, hi])));
                }
            }
        }
    }
    Ok(())
}

/// Write `bytes` to the command port.
pub fn write_command<R: RegisterIo + ?Sized>(
    regs: &mut R,
    mode: Option<ParallelMode>,
    bytes: &[u8],
) -> Result<(), TransferError> {
    write_port(regs, CMD, mode, bytes)
}

/// Write `bytes` to the parameter port.
pub fn write_data<R: RegisterIo + ?Sized>(
    regs: &mut R,
    mode: Option<ParallelMode>,
    bytes: &[u8],
) -> Result<(), TransferError> {
    write_port(regs, PARAM, mode, bytes)
}

/// Fill `buf` from the read port.
///
/// Every unit is fetched with a dummy write to READ, which starts the read
/// cycle on the bus, followed by a read of READ.
pub fn read_data<R: RegisterIo + ?Sized>(
    regs: &mut R,
    mode: Option<ParallelMode>,
    buf: &mut [u8],
) -> Result<(), TransferError> {
    match unit_for(mode, buf.len())? {
        Unit::Byte => {
            for b in buf.iter_mut() {
                regs.write(READ, 0);
                let [lo, ..] = regs.read(READ).to_le_bytes();
                *b = lo;
            }
        }
        Unit::Halfword => {
            for pair in buf.chunks_exact_mut(2) {
                regs.write(READ, 0);
                let [lo, hi, ..] = regs.read(READ).to_le_bytes();
                pair.copy_from_slice(&[lo, hi]);
            }
        }
    }
    Ok(())
}
