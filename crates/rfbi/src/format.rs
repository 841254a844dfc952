//! Bus format: pixel depth over a parallel bus
//!
//! A pixel of `bit_depth` bits is carried over `line_count` data lines in one,
//! two or three bus cycles ("1:1", "2:1", "3:1"), or two pixels in three
//! cycles ("3:2"). The data-cycle registers tell the hardware how many bits
//! move in each cycle.

use platform::mmio::RegisterIo;

use crate::error::ConfigError;
use crate::registers::{config, control, ChipSelect, CONTROL};

/// Pixel bit depth accepted by the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitDepth {
    /// 12 bpp
    Bpp12,
    /// 16 bpp
    Bpp16,
    /// 18 bpp
    Bpp18,
    /// 24 bpp
    Bpp24,
}

impl BitDepth {
    /// Map a bit count to a supported depth.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            12 => Some(Self::Bpp12),
            16 => Some(Self::Bpp16),
            18 => Some(Self::Bpp18),
            24 => Some(Self::Bpp24),
            _ => None,
        }
    }

    /// Bits per pixel.
    pub fn bits(self) -> u8 {
        match self {
            Self::Bpp12 => 12,
            Self::Bpp16 => 16,
            Self::Bpp18 => 18,
            Self::Bpp24 => 24,
        }
    }

    /// CONFIG datatype code.
    pub fn datatype_code(self) -> u32 {
        match self {
            Self::Bpp12 => 0,
            Self::Bpp16 => 1,
            Self::Bpp18 => 2,
            Self::Bpp24 => 3,
        }
    }
}

/// Electrical width of the data bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParallelMode {
    /// 8 data lines
    Lines8,
    /// 9 data lines
    Lines9,
    /// 12 data lines
    Lines12,
    /// 16 data lines
    Lines16,
}

impl ParallelMode {
    /// Map a line count to a supported mode.
    pub fn from_lines(lines: u8) -> Option<Self> {
        match lines {
            8 => Some(Self::Lines8),
            9 => Some(Self::Lines9),
            12 => Some(Self::Lines12),
            16 => Some(Self::Lines16),
            _ => None,
        }
    }

    /// Number of data lines.
    pub fn lines(self) -> u8 {
        match self {
            Self::Lines8 => 8,
            Self::Lines9 => 9,
            Self::Lines12 => 12,
            Self::Lines16 => 16,
        }
    }

    /// CONFIG parallel mode code.
    pub fn code(self) -> u32 {
        match self {
            Self::Lines8 => 0,
            Self::Lines9 => 1,
            Self::Lines12 => 2,
            Self::Lines16 => 3,
        }
    }
}

/// Bus cycles per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleFormat {
    /// One pixel per cycle
    OneToOne,
    /// One pixel over two cycles
    TwoToOne,
    /// One pixel over three cycles
    ThreeToOne,
    /// Two pixels over three cycles
    ThreeToTwo,
}

impl CycleFormat {
    /// CONFIG cycle format code.
    pub fn code(self) -> u32 {
        match self {
            Self::OneToOne => 0,
            Self::TwoToOne => 1,
            Self::ThreeToOne => 2,
            Self::ThreeToTwo => 3,
        }
    }

    /// Classify `bit_depth` over `line_count` lines.
    ///
    /// `line_count` must be non-zero.
    fn classify(bit_depth: u32, line_count: u32) -> Result<Self, ConfigError> {
        if bit_depth.checked_rem(line_count) == Some(0) {
            return match bit_depth.checked_div(line_count) {
                Some(1) => Ok(Self::OneToOne),
                Some(2) => Ok(Self::TwoToOne),
                Some(3) => Ok(Self::ThreeToOne),
                _ => Err(ConfigError::UnsupportedRatio),
            };
        }
        let double = bit_depth.saturating_mul(2);
        if double.checked_rem(line_count) == Some(0) && double.checked_div(line_count) == Some(3) {
            return Ok(Self::ThreeToTwo);
        }
        Err(ConfigError::UnsupportedRatio)
    }
}

impl core::fmt::Display for CycleFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::OneToOne => "1:1",
            Self::TwoToOne => "2:1",
            Self::ThreeToOne => "3:1",
            Self::ThreeToTwo => "3:2",
        };
        f.write_str(s)
    }
}

/// A validated pixel depth / line count pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusFormat {
    bit_depth: BitDepth,
    parallel_mode: ParallelMode,
    cycle_format: CycleFormat,
    data_cycles: [u32; 3],
}

impl BusFormat {
    /// Validate `bit_depth` bits per pixel over `line_count` lines.
    ///
    /// The ratio is checked before the individual values, so an odd pair such
    /// as 11 bpp over 4 lines reports [`ConfigError::UnsupportedRatio`].
    ///
    /// ```
    /// use rfbi::format::{BusFormat, CycleFormat};
    ///
    /// let fmt = BusFormat::new(24, 16).unwrap();
    /// assert_eq!(fmt.cycle_format(), CycleFormat::ThreeToTwo);
    /// assert_eq!(fmt.data_cycles(), [16, 8 | 8 << 16, 16 << 16]);
    /// ```
    pub fn new(bit_depth: u8, line_count: u8) -> Result<Self, ConfigError> {
        if line_count == 0 {
            return Err(ConfigError::UnsupportedFormat);
        }
        let cycle_format = CycleFormat::classify(u32::from(bit_depth), u32::from(line_count))?;
        let bit_depth = BitDepth::from_bits(bit_depth).ok_or(ConfigError::UnsupportedFormat)?;
        let parallel_mode =
            ParallelMode::from_lines(line_count).ok_or(ConfigError::UnsupportedFormat)?;

        let lines = u32::from(line_count);
        let half = lines.wrapping_shr(1);
        let data_cycles = match cycle_format {
            CycleFormat::OneToOne => [lines, 0, 0],
            CycleFormat::TwoToOne => [lines, lines, 0],
            CycleFormat::ThreeToOne => [lines, lines, lines],
            CycleFormat::ThreeToTwo => [lines, half | half.wrapping_shl(16), lines.wrapping_shl(16)],
        };

        Ok(Self {
            bit_depth,
            parallel_mode,
            cycle_format,
            data_cycles,
        })
    }

    /// Pixel depth
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Bus width
    pub fn parallel_mode(&self) -> ParallelMode {
        self.parallel_mode
    }

    /// Cycles per pixel
    pub fn cycle_format(&self) -> CycleFormat {
        self.cycle_format
    }

    /// DATA_CYCLE1..3 values.
    pub fn data_cycles(&self) -> [u32; 3] {
        self.data_cycles
    }

    /// CONFIG(n) value for this format.
    ///
    /// Trigger mode, granularity, L4 format and the strobe polarities are
    /// zero; TE/VSYNC and HSYNC polarity are set.
    pub fn config_word(&self) -> u32 {
        config::PARALLEL_MODE.value(self.parallel_mode.code())
            | config::TRIGGER_MODE.value(0)
            | config::CYCLE_GRANULARITY.value(0)
            | config::DATATYPE.value(self.bit_depth.datatype_code())
            | config::L4_FORMAT.value(0)
            | config::CYCLE_FORMAT.value(self.cycle_format.code())
            | config::TE_VSYNC_POLARITY.value(1)
            | config::HSYNC_POLARITY.value(1)
    }
}

/// Program `format` into chip-select channel `cs` and route the bus to it.
///
/// The chip-select is detached while the channel is reprogrammed.
pub fn configure_bus<R: RegisterIo + ?Sized>(regs: &mut R, cs: ChipSelect, format: &BusFormat) {
    let ctrl = regs.read(CONTROL);
    regs.write(CONTROL, control::CS_SELECT.modify(ctrl, 0));

    regs.write(cs.config(), format.config_word());
    for (offset, value) in cs.data_cycles().into_iter().zip(format.data_cycles()) {
        regs.write(offset, value);
    }

    let ctrl = regs.read(CONTROL);
    let ctrl = control::CS_SELECT.modify(ctrl, cs.select_code());
    regs.write(CONTROL, control::BYPASS.modify(ctrl, 0));
}
