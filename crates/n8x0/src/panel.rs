//! Nokia N800/N810 panel
//!
//! 800x480 LCD behind a Blizzard controller on RFBI chip-select 0. Register
//! traffic runs over 8 data lines, pixels over 16, always at 16 bpp.
//!
//! Only full-screen updates are supported: the controller's window engine can
//! do partial updates, but the frame transfer length is fixed by the video
//! mode's active area.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use platform::mmio::RegisterIo;
use platform::pipeline::{DisplayPipeline, VideoMode};
use platform::power::PowerResource;
use rfbi::controller::{FrameDone, FrameDoneSignal, Rfbi};
use rfbi::registers::ChipSelect;
use rfbi::{RfbiConfig, RfbiError, TimingRequirement};

use crate::blizzard::{Blizzard, BlizzardError, ControllerVersion, PllStatus};

/// Active width in pixels
pub const PANEL_WIDTH: u16 = 800;
/// Active height in lines
pub const PANEL_HEIGHT: u16 = 480;
/// Physical width
pub const PANEL_WIDTH_MM: u32 = 77;
/// Physical height
pub const PANEL_HEIGHT_MM: u32 = 46;

/// Bits per pixel on the bus
const PIXEL_SIZE: u8 = 16;
/// Data lines while talking to the controller's registers
const CONTROL_DATA_LINES: u8 = 8;

/// Panel video mode, 21.94 MHz pixel clock.
pub const fn n8x0_video_mode() -> VideoMode {
    VideoMode {
        pixel_clock_hz: 21_940_000,
        hactive: PANEL_WIDTH,
        vactive: PANEL_HEIGHT,
        hfront_porch: 28,
        hsync_len: 4,
        hback_porch: 24,
        vfront_porch: 3,
        vsync_len: 3,
        vback_porch: 4,
    }
}

/// Blizzard strobe timings, in picoseconds.
pub const fn n8x0_rfbi_timings() -> TimingRequirement {
    TimingRequirement {
        cs_on_time: 0,
        cs_off_time: 36_000,
        we_on_time: 9_000,
        we_off_time: 18_000,
        we_cycle_time: 36_000,
        re_on_time: 9_000,
        re_off_time: 27_000,
        re_cycle_time: 36_000,
        access_time: 27_000,
        cs_pulse_width: 0,
    }
}

/// RFBI output configuration for this board.
pub fn rfbi_config() -> RfbiConfig {
    RfbiConfig {
        chip_select: ChipSelect::Cs0,
        pixel_size: PIXEL_SIZE,
        data_lines: CONTROL_DATA_LINES,
        timings: n8x0_rfbi_timings(),
        video_mode: n8x0_video_mode(),
        te_enabled: false,
    }
}

/// Errors from panel operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelError {
    /// RFBI refused an operation
    Bus(RfbiError),
    /// Controller did not identify as a Blizzard
    UnknownController(u8),
    /// Update region is not the full screen
    InvalidRegion,
}

impl core::fmt::Display for PanelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::UnknownController(rev) => write!(f, "unknown controller, rev code {rev:#04x}"),
            Self::InvalidRegion => write!(f, "only full-screen updates are supported"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PanelError {}

impl From<RfbiError> for PanelError {
    fn from(e: RfbiError) -> Self {
        Self::Bus(e)
    }
}

impl From<BlizzardError> for PanelError {
    fn from(e: BlizzardError) -> Self {
        match e {
            BlizzardError::Bus(e) => Self::Bus(e),
            BlizzardError::UnknownController(rev) => Self::UnknownController(rev),
        }
    }
}

/// `true` if the region covers exactly the active area of `mode`.
pub fn is_full_screen(mode: &VideoMode, x: u16, y: u16, w: u16, h: u16) -> bool {
    x == 0 && y == 0 && w == mode.hactive && h == mode.vactive
}

/// N8x0 panel on an RFBI output.
pub struct N8x0Panel<'r, 'd, M: RawMutex, R, P, D, DELAY> {
    rfbi: &'r Rfbi<'d, M, R, P, D>,
    done: &'d FrameDoneSignal<M>,
    blizzard: Blizzard<DELAY>,
    mode: VideoMode,
}

impl<'r, 'd, M, R, P, D, DELAY> N8x0Panel<'r, 'd, M, R, P, D, DELAY>
where
    M: RawMutex,
    R: RegisterIo,
    P: PowerResource,
    D: DisplayPipeline,
    DELAY: DelayNs,
{
    /// Attach to `rfbi`. Frame completions arrive on `done`.
    pub fn new(rfbi: &'r Rfbi<'d, M, R, P, D>, done: &'d FrameDoneSignal<M>, delay: DELAY) -> Self {
        Self {
            rfbi,
            done,
            blizzard: Blizzard::new(delay),
            mode: n8x0_video_mode(),
        }
    }

    /// Panel video mode.
    pub fn mode(&self) -> &VideoMode {
        &self.mode
    }

    /// Physical size, width x height in millimetres.
    pub fn dimensions_mm(&self) -> (u32, u32) {
        (PANEL_WIDTH_MM, PANEL_HEIGHT_MM)
    }

    /// Controller variant, once powered on.
    pub fn controller_version(&self) -> Option<ControllerVersion> {
        self.blizzard.version()
    }

    /// Bring up the RFBI output and the controller.
    ///
    /// If the controller fails to come up the output is disabled again.
    pub async fn power_on(&mut self) -> Result<PllStatus, PanelError> {
        let rfbi = self.rfbi;
        let mut bus = rfbi.bus_lock().await;

        bus.set_video_mode(&self.mode);
        bus.set_interface_timings(&n8x0_rfbi_timings());
        bus.set_pixel_size(PIXEL_SIZE);
        bus.set_data_lines(CONTROL_DATA_LINES);

        if let Err(e) = bus.enable() {
            error!("n8x0: rfbi enable failed: {}", e);
            return Err(e.into());
        }

        let brought_up = match self.blizzard.detect(&mut bus) {
            Ok(_) => self.blizzard.init(&mut bus).await,
            Err(e) => Err(e),
        };
        let status = match brought_up {
            Ok(status) => status,
            Err(e) => {
                error!("n8x0: controller bring-up failed: {}", e);
                bus.disable();
                return Err(e.into());
            }
        };

        bus.bus_unlock();
        info!("n8x0: panel on");
        Ok(status)
    }

    /// Push one frame and wait for it to go out.
    ///
    /// The region must be the full screen.
    pub async fn update(&mut self, x: u16, y: u16, w: u16, h: u16) -> Result<FrameDone, PanelError> {
        if !is_full_screen(&self.mode, x, y, w, h) {
            return Err(PanelError::InvalidRegion);
        }

        let rfbi = self.rfbi;
        let mut bus = rfbi.bus_lock().await;
        self.blizzard.setup_update(&mut bus, x, y, w, h)?;
        bus.update(self.done, 0)?;
        let frame = self.done.wait().await;
        bus.bus_unlock();
        Ok(frame)
    }

    /// Put the controller to sleep and disable the output.
    ///
    /// The output is disabled even if the controller could not be reached.
    pub async fn power_off(&mut self) -> Result<(), PanelError> {
        let rfbi = self.rfbi;
        let mut bus = rfbi.bus_lock().await;
        let slept = self.blizzard.sleep(&mut bus).await;
        if let Err(e) = slept {
            warn!("n8x0: controller sleep failed: {}", e);
        }
        bus.disable();
        bus.bus_unlock();
        info!("n8x0: panel off");
        slept.map_err(Into::into)
    }
}
