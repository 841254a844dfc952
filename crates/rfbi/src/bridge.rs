//! Display-chain bridge adapter
//!
//! Mode validation, mode set and enable/disable for a display chain that sees
//! the RFBI as one link. Enable and disable take the bus lock around the
//! controller operation, so they serialise with any bus user.

use embassy_sync::blocking_mutex::raw::RawMutex;
use platform::mmio::RegisterIo;
use platform::pipeline::{DisplayPipeline, LcdManagerConfig, VideoMode};
use platform::power::PowerResource;

use crate::controller::Rfbi;
use crate::error::RfbiError;

/// Outcome of [`RfbiBridge::mode_valid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeStatus {
    /// Mode can be driven
    Valid,
    /// Mode has an empty active area
    Invalid,
    /// Pixel clock is zero or faster than the interface clock
    ClockRange,
}

/// Bridge view of an [`Rfbi`].
pub struct RfbiBridge<'r, 'd, M: RawMutex, R, P, D> {
    rfbi: &'r Rfbi<'d, M, R, P, D>,
}

impl<'r, 'd, M, R, P, D> RfbiBridge<'r, 'd, M, R, P, D>
where
    M: RawMutex,
    R: RegisterIo,
    P: PowerResource,
    D: DisplayPipeline,
{
    /// Wrap a controller.
    pub fn new(rfbi: &'r Rfbi<'d, M, R, P, D>) -> Self {
        Self { rfbi }
    }

    /// Check whether `mode` can be driven over this interface.
    pub fn mode_valid(&self, mode: &VideoMode) -> ModeStatus {
        if mode.hactive == 0 || mode.vactive == 0 {
            return ModeStatus::Invalid;
        }
        let pixel_clock = u64::from(mode.pixel_clock_hz);
        if pixel_clock == 0 || pixel_clock > self.rfbi.clock().rate_hz() {
            return ModeStatus::ClockRange;
        }
        ModeStatus::Valid
    }

    /// Adopt `mode` and push the LCD manager configuration for it.
    pub async fn mode_set(&self, mode: &VideoMode) -> Result<LcdManagerConfig, RfbiError> {
        debug!("rfbi bridge: mode set {}x{}", mode.hactive, mode.vactive);
        let mut bus = self.rfbi.bus_lock().await;
        bus.set_video_mode(mode);
        let lcd = bus.config_lcd_manager();
        bus.bus_unlock();
        lcd
    }

    /// Lock the bus, enable the output, unlock.
    pub async fn enable(&self) -> Result<(), RfbiError> {
        debug!("rfbi bridge: enable");
        let mut bus = self.rfbi.bus_lock().await;
        let result = bus.enable();
        bus.bus_unlock();
        result
    }

    /// Lock the bus, disable the output, unlock.
    pub async fn disable(&self) {
        debug!("rfbi bridge: disable");
        let mut bus = self.rfbi.bus_lock().await;
        bus.disable();
        bus.bus_unlock();
    }
}
