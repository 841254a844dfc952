//! Static per-output configuration
//!
//! Everything the bus controller needs to know about the attached chip before
//! the first `enable`. Board support code builds one of these (see the
//! `n8x0` crate for a preset) and hands it to [`Rfbi::new`].
//!
//! [`Rfbi::new`]: crate::controller::Rfbi::new

use platform::pipeline::VideoMode;

use crate::registers::ChipSelect;
use crate::timing::TimingRequirement;

/// RFBI output configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RfbiConfig {
    /// Chip-select channel the display controller hangs off
    pub chip_select: ChipSelect,
    /// Bits per pixel on the bus
    pub pixel_size: u8,
    /// Number of data lines
    pub data_lines: u8,
    /// Strobe timings from the chip datasheet
    pub timings: TimingRequirement,
    /// Display video mode; the active area sizes full-frame updates
    pub video_mode: VideoMode,
    /// Synchronise transfers to the tearing-effect line instead of the
    /// internal trigger
    pub te_enabled: bool,
}

impl Default for RfbiConfig {
    fn default() -> Self {
        Self {
            chip_select: ChipSelect::Cs0,
            pixel_size: 16,
            data_lines: 16,
            timings: TimingRequirement::default(),
            video_mode: VideoMode::default(),
            te_enabled: false,
        }
    }
}
