//! RFBI register map
//!
//! Byte offsets into the 256-byte RFBI window and the bit fields the driver
//! touches. Per-chip-select registers repeat every [`CHANNEL_STRIDE`] bytes.

use platform::mmio::{field_get, field_modify, field_value, RegisterIo};

/// Module revision (major 7:4, minor 3:0).
pub const REVISION: u16 = 0x000;
/// System configuration.
pub const SYSCONFIG: u16 = 0x010;
/// System status.
pub const SYSSTATUS: u16 = 0x014;
/// Bus control: enable, bypass, chip-select, internal trigger.
pub const CONTROL: u16 = 0x040;
/// Pixels in the next frame transfer.
pub const PIXEL_CNT: u16 = 0x044;
/// Line number for line-triggered transfers.
pub const LINE_NUMBER: u16 = 0x048;
/// Command write port.
pub const CMD: u16 = 0x04c;
/// Parameter write port.
pub const PARAM: u16 = 0x050;
/// Pixel data port.
pub const DATA: u16 = 0x054;
/// Read port; a dummy write starts each read cycle.
pub const READ: u16 = 0x058;
/// Bus status.
pub const STATUS: u16 = 0x05c;
/// VSYNC minimum width.
pub const VSYNC_WIDTH: u16 = 0x090;
/// HSYNC minimum width.
pub const HSYNC_WIDTH: u16 = 0x094;

/// Distance between the register sets of chip-select 0 and 1.
pub const CHANNEL_STRIDE: u16 = 0x18;

const CONFIG_BASE: u16 = 0x060;
const ONOFF_TIME_BASE: u16 = 0x064;
const CYCLE_TIME_BASE: u16 = 0x068;
const DATA_CYCLE1_BASE: u16 = 0x06c;
const DATA_CYCLE2_BASE: u16 = 0x070;
const DATA_CYCLE3_BASE: u16 = 0x074;

/// Inclusive `high:low` bit range inside a 32-bit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Most significant bit
    pub high: u32,
    /// Least significant bit
    pub low: u32,
}

impl Field {
    /// Single-bit field.
    pub const fn bit(n: u32) -> Self {
        Self { high: n, low: n }
    }

    /// Multi-bit field `high..=low`.
    pub const fn range(high: u32, low: u32) -> Self {
        Self { high, low }
    }

    /// `value` shifted into this field.
    pub const fn value(self, value: u32) -> u32 {
        field_value(value, self.high, self.low)
    }

    /// This field of `word`, shifted down to bit 0.
    pub const fn get(self, word: u32) -> u32 {
        field_get(word, self.high, self.low)
    }

    /// `orig` with this field replaced by `value`.
    pub const fn modify(self, orig: u32, value: u32) -> u32 {
        field_modify(orig, value, self.high, self.low)
    }

    /// Largest value the field can hold.
    pub const fn max(self) -> u32 {
        field_get(u32::MAX, self.high, self.low)
    }
}

/// Read-modify-write one field of the register at `offset`.
pub fn modify_field<R: RegisterIo + ?Sized>(regs: &mut R, offset: u16, field: Field, value: u32) {
    regs.modify(offset, field.high, field.low, value);
}

/// CONTROL register fields.
pub mod control {
    use super::Field;

    /// Start the transfer; cleared on frame-done
    pub const ENABLE: Field = Field::bit(0);
    /// Bypass mode (direct pixel path)
    pub const BYPASS: Field = Field::bit(1);
    /// Active chip-select: 0 none, 1 CS0, 2 CS1
    pub const CS_SELECT: Field = Field::range(3, 2);
    /// Internal trigger enable
    pub const ITE: Field = Field::bit(4);
}

/// CONFIG(n) register fields.
pub mod config {
    use super::Field;

    /// Parallel mode code
    pub const PARALLEL_MODE: Field = Field::range(1, 0);
    /// Trigger mode
    pub const TRIGGER_MODE: Field = Field::range(3, 2);
    /// Timing granularity: 0 = x1, 1 = x2
    pub const CYCLE_GRANULARITY: Field = Field::bit(4);
    /// Pixel datatype code
    pub const DATATYPE: Field = Field::range(6, 5);
    /// L4 interconnect access format
    pub const L4_FORMAT: Field = Field::range(8, 7);
    /// Cycle format code
    pub const CYCLE_FORMAT: Field = Field::range(10, 9);
    /// A0 polarity
    pub const A0_POLARITY: Field = Field::bit(16);
    /// RE polarity
    pub const RE_POLARITY: Field = Field::bit(17);
    /// WE polarity
    pub const WE_POLARITY: Field = Field::bit(18);
    /// CS polarity
    pub const CS_POLARITY: Field = Field::bit(19);
    /// TE/VSYNC polarity
    pub const TE_VSYNC_POLARITY: Field = Field::bit(20);
    /// HSYNC polarity
    pub const HSYNC_POLARITY: Field = Field::bit(21);
}

/// ONOFF_TIME(n) register fields, in ticks.
pub mod onoff {
    use super::Field;

    /// CS assertion
    pub const CS_ON: Field = Field::range(3, 0);
    /// CS deassertion
    pub const CS_OFF: Field = Field::range(9, 4);
    /// WE assertion
    pub const WE_ON: Field = Field::range(13, 10);
    /// WE deassertion
    pub const WE_OFF: Field = Field::range(19, 14);
    /// RE assertion
    pub const RE_ON: Field = Field::range(23, 20);
    /// RE deassertion
    pub const RE_OFF: Field = Field::range(29, 24);
}

/// CYCLE_TIME(n) register fields, in ticks.
pub mod cycle {
    use super::Field;

    /// Write cycle length
    pub const WE_CYCLE: Field = Field::range(5, 0);
    /// Read cycle length
    pub const RE_CYCLE: Field = Field::range(11, 6);
    /// Minimum CS high pulse between accesses
    pub const CS_PULSE: Field = Field::range(17, 12);
    /// Read data access time
    pub const ACCESS: Field = Field::range(27, 22);
}

/// Chip-select channel ("module") of the RFBI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipSelect {
    /// First chip-select
    #[default]
    Cs0,
    /// Second chip-select
    Cs1,
}

impl ChipSelect {
    /// Channel index, 0 or 1.
    pub const fn index(self) -> u16 {
        match self {
            Self::Cs0 => 0,
            Self::Cs1 => 1,
        }
    }

    /// Value of CONTROL CS-select that routes the bus to this channel.
    pub const fn select_code(self) -> u32 {
        match self {
            Self::Cs0 => 1,
            Self::Cs1 => 2,
        }
    }

    const fn banked(self, base: u16) -> u16 {
        match self {
            Self::Cs0 => base,
            Self::Cs1 => base.wrapping_add(CHANNEL_STRIDE),
        }
    }

    /// CONFIG(n)
    pub const fn config(self) -> u16 {
        self.banked(CONFIG_BASE)
    }

    /// ONOFF_TIME(n)
    pub const fn onoff_time(self) -> u16 {
        self.banked(ONOFF_TIME_BASE)
    }

    /// CYCLE_TIME(n)
    pub const fn cycle_time(self) -> u16 {
        self.banked(CYCLE_TIME_BASE)
    }

    /// DATA_CYCLE1..3(n), in register order.
    pub const fn data_cycles(self) -> [u16; 3] {
        [
            self.banked(DATA_CYCLE1_BASE),
            self.banked(DATA_CYCLE2_BASE),
            self.banked(DATA_CYCLE3_BASE),
        ]
    }
}

impl core::fmt::Display for ChipSelect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "CS{}", self.index())
    }
}

/// Decoded REVISION register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Revision {
    /// Major revision
    pub major: u8,
    /// Minor revision
    pub minor: u8,
}

impl Revision {
    const MAJOR: Field = Field::range(7, 4);
    const MINOR: Field = Field::range(3, 0);

    /// Decode a raw REVISION value.
    pub fn from_raw(raw: u32) -> Self {
        let [major, ..] = Self::MAJOR.get(raw).to_le_bytes();
        let [minor, ..] = Self::MINOR.get(raw).to_le_bytes();
        Self { major, minor }
    }
}

impl core::fmt::Display for Revision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
