//! Blizzard framebuffer controller client
//!
//! Register access, detection, PLL bring-up, sleep and update-window setup
//! for the Epson S1D1374x, driven over any [`RfbiOps`] bus. The caller holds
//! the bus lock for the whole of every call: nothing here locks or unlocks.
//!
//! Register traffic needs 8-line mode. [`Blizzard::setup_update`] and
//! [`Blizzard::sleep`] switch the bus themselves; after `setup_update` the
//! bus is left in 16-line mode, ready for pixel data.

use embedded_hal_async::delay::DelayNs;
use rfbi::{RfbiError, RfbiOps};

use crate::registers::{
    COLOR_RGB565, CONFIG_STRAP_MASK, DISPLAY_MODE_NORMAL, MODE_FIELD_MASK, PLL_DIV_LOCKED,
    PLL_MODE_ENABLED, POWER_SAVE_SLEEP, REG_CONFIG, REG_DISPLAY_MODE, REG_INPUT_WIN_X_START_0,
    REG_PLL_DIV, REG_PLL_MODE, REG_POWER_SAVE, REG_REV_CODE, REV_PRODUCT_MASK,
    REV_PRODUCT_S1D13744, REV_PRODUCT_S1D13745, REV_REVISION_MASK, SRC_WRITE_LCD,
    SRC_WRITE_LCD_BACKGROUND, SRC_WRITE_LCD_DESTRUCTIVE, WINDOW_PAYLOAD_LEN,
};

/// Upper bound on PLL lock polls (1 ms apart).
pub const PLL_POLL_LIMIT: u16 = 1000;

/// Polls beyond which a lock is reported as slow.
pub const PLL_SLOW_POLLS: u16 = 100;

/// Settle time after entering sleep.
const SLEEP_SETTLE_MS: u32 = 100;

/// Line count for register access.
const REGISTER_DATA_LINES: u8 = 8;

/// Line count for pixel data.
const PIXEL_DATA_LINES: u8 = 16;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Detected controller variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerVersion {
    /// S1D13744
    S1D13744,
    /// S1D13745 ("Hailstorm"), with overlay support
    S1D13745,
}

impl ControllerVersion {
    /// Identify the product from a REV_CODE readback.
    pub fn from_rev_code(rev: u8) -> Option<Self> {
        match rev & REV_PRODUCT_MASK {
            REV_PRODUCT_S1D13744 => Some(Self::S1D13744),
            REV_PRODUCT_S1D13745 => Some(Self::S1D13745),
            _ => None,
        }
    }

    /// Data source selector for a plain LCD update.
    pub fn data_source(self) -> u8 {
        match self {
            Self::S1D13744 => SRC_WRITE_LCD,
            Self::S1D13745 => SRC_WRITE_LCD_BACKGROUND,
        }
    }
}

impl core::fmt::Display for ControllerVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::S1D13744 => write!(f, "S1D13744"),
            Self::S1D13745 => write!(f, "S1D13745"),
        }
    }
}

/// Errors from the controller client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlizzardError {
    /// The RFBI refused a transfer
    Bus(RfbiError),
    /// REV_CODE does not name a known product
    UnknownController(u8),
}

impl core::fmt::Display for BlizzardError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::UnknownController(rev) => write!(f, "unknown controller, rev code {rev:#04x}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BlizzardError {}

impl From<RfbiError> for BlizzardError {
    fn from(e: RfbiError) -> Self {
        Self::Bus(e)
    }
}

/// Outcome of the PLL lock wait in [`Blizzard::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllStatus {
    /// Delays taken before lock was seen (or the cap was hit)
    pub polls: u16,
    /// Lock bit observed
    pub locked: bool,
}

impl PllStatus {
    /// Lock took longer than expected, or never came.
    pub fn is_slow(&self) -> bool {
        !self.locked || self.polls > PLL_SLOW_POLLS
    }
}

// ---------------------------------------------------------------------------
// Register access
// ---------------------------------------------------------------------------

/// Write `data` starting at register `reg`.
pub fn write_reg<'d, B: RfbiOps<'d> + ?Sized>(
    bus: &mut B,
    reg: u8,
    data: &[u8],
) -> Result<(), RfbiError> {
    bus.write_command(&[reg])?;
    bus.write_data(data)
}

/// Read `buf.len()` bytes starting at register `reg`.
pub fn read_reg<'d, B: RfbiOps<'d> + ?Sized>(
    bus: &mut B,
    reg: u8,
    buf: &mut [u8],
) -> Result<(), RfbiError> {
    bus.write_command(&[reg])?;
    bus.read_data(buf)
}

fn read_u8<'d, B: RfbiOps<'d> + ?Sized>(bus: &mut B, reg: u8) -> Result<u8, RfbiError> {
    let mut value = [0u8];
    read_reg(bus, reg, &mut value)?;
    let [v] = value;
    Ok(v)
}

/// Read-modify-write of the two-bit mode field at the bottom of `reg`.
fn set_mode_field<'d, B: RfbiOps<'d> + ?Sized>(
    bus: &mut B,
    reg: u8,
    mode: u8,
) -> Result<(), RfbiError> {
    let current = read_u8(bus, reg)?;
    write_reg(bus, reg, &[(current & !MODE_FIELD_MASK) | (mode & MODE_FIELD_MASK)])
}

/// Window block for an update of `w` x `h` pixels at (`x`, `y`).
///
/// Input and output windows are identical: start X, start Y, end X, end Y as
/// little-endian halfwords, twice, then the colour format and data source.
pub fn window_payload(x: u16, y: u16, w: u16, h: u16, source: u8) -> [u8; WINDOW_PAYLOAD_LEN] {
    let x_end = x.saturating_add(w.saturating_sub(1));
    let y_end = y.saturating_add(h.saturating_sub(1));
    let [x0, x1] = x.to_le_bytes();
    let [y0, y1] = y.to_le_bytes();
    let [xe0, xe1] = x_end.to_le_bytes();
    let [ye0, ye1] = y_end.to_le_bytes();
    let window = [x0, x1, y0, y1, xe0, xe1, ye0, ye1];

    let tail = [COLOR_RGB565, source];

    let mut payload = [0u8; WINDOW_PAYLOAD_LEN];
    let bytes = window.iter().chain(window.iter()).chain(tail.iter());
    for (dst, src) in payload.iter_mut().zip(bytes) {
        *dst = *src;
    }
    payload
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// S1D1374x client state.
pub struct Blizzard<DELAY> {
    delay: DELAY,
    version: Option<ControllerVersion>,
}

impl<DELAY: DelayNs> Blizzard<DELAY> {
    /// Create a client. Nothing is sent until [`detect`](Self::detect).
    pub fn new(delay: DELAY) -> Self {
        Self {
            delay,
            version: None,
        }
    }

    /// Variant found by the last successful [`detect`](Self::detect).
    pub fn version(&self) -> Option<ControllerVersion> {
        self.version
    }

    /// Identify the controller.
    ///
    /// Warns when the PLL lock bit is clear, which means no bootloader
    /// brought the chip up; [`init`](Self::init) will have to.
    pub fn detect<'d, B: RfbiOps<'d> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> Result<ControllerVersion, BlizzardError> {
        if read_u8(bus, REG_PLL_DIV)? & PLL_DIV_LOCKED == 0 {
            warn!("blizzard: controller not initialised by the bootloader");
        }

        let rev = read_u8(bus, REG_REV_CODE)?;
        let conf = read_u8(bus, REG_CONFIG)?;

        let Some(version) = ControllerVersion::from_rev_code(rev) else {
            error!("blizzard: invalid rev code {:#x}", rev);
            return Err(BlizzardError::UnknownController(rev));
        };

        info!(
            "blizzard: {} rev {} conf {}",
            version,
            rev & REV_REVISION_MASK,
            conf & CONFIG_STRAP_MASK
        );
        self.version = Some(version);
        Ok(version)
    }

    /// Leave power save, start the PLL and switch to normal display.
    ///
    /// A PLL that is slow to lock, or never locks within
    /// [`PLL_POLL_LIMIT`] polls, is logged and reported in the returned
    /// status. Initialisation carries on regardless.
    pub async fn init<'d, B: RfbiOps<'d> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> Result<PllStatus, BlizzardError> {
        set_mode_field(bus, REG_POWER_SAVE, 0)?;
        set_mode_field(bus, REG_PLL_MODE, PLL_MODE_ENABLED)?;

        let mut status = PllStatus {
            polls: 0,
            locked: false,
        };
        loop {
            if read_u8(bus, REG_PLL_DIV)? & PLL_DIV_LOCKED != 0 {
                status.locked = true;
                break;
            }
            if status.polls >= PLL_POLL_LIMIT {
                break;
            }
            self.delay.delay_ms(1).await;
            status.polls = status.polls.saturating_add(1);
        }
        if status.is_slow() {
            warn!("blizzard: PLL lock slow, {} ms", status.polls);
        } else {
            debug!("blizzard: PLL locked after {} ms", status.polls);
        }

        write_reg(bus, REG_DISPLAY_MODE, &[DISPLAY_MODE_NORMAL])?;
        Ok(status)
    }

    /// Enter power save.
    pub async fn sleep<'d, B: RfbiOps<'d> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> Result<(), BlizzardError> {
        bus.set_data_lines(REGISTER_DATA_LINES);
        bus.configure()?;

        set_mode_field(bus, REG_POWER_SAVE, POWER_SAVE_SLEEP)?;
        self.delay.delay_ms(SLEEP_SETTLE_MS).await;
        debug!("blizzard: asleep");
        Ok(())
    }

    /// Load the update window and leave the bus ready for pixel data.
    pub fn setup_update<'d, B: RfbiOps<'d> + ?Sized>(
        &mut self,
        bus: &mut B,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
    ) -> Result<(), BlizzardError> {
        let source = self
            .version
            .map_or(SRC_WRITE_LCD_DESTRUCTIVE, ControllerVersion::data_source);
        let payload = window_payload(x, y, w, h, source);

        bus.set_data_lines(REGISTER_DATA_LINES);
        bus.configure()?;
        write_reg(bus, REG_INPUT_WIN_X_START_0, &payload)?;
        bus.set_data_lines(PIXEL_DATA_LINES);
        bus.configure()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use rfbi::{TimingRequirement, TransferError};
    use std::collections::VecDeque;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Command(Vec<u8>),
        Data(Vec<u8>),
        Read(usize),
        DataLines(u8),
        Configure,
    }

    /// Records bus traffic and serves reads from a queue.
    #[derive(Default)]
    struct RecordingBus {
        events: Vec<Event>,
        reads: VecDeque<u8>,
        data_lines: u8,
    }

    impl RecordingBus {
        fn with_reads(reads: &[u8]) -> Self {
            Self {
                reads: reads.iter().copied().collect(),
                data_lines: 8,
                ..Self::default()
            }
        }

        fn register_writes(&self) -> Vec<(u8, Vec<u8>)> {
            let mut out = Vec::new();
            let mut cmd = None;
            for e in &self.events {
                match e {
                    Event::Command(c) => cmd = c.first().copied(),
                    Event::Data(d) => out.push((cmd.unwrap(), d.clone())),
                    _ => {}
                }
            }
            out
        }
    }

    impl RfbiOps<'static> for RecordingBus {
        type Done = ();

        fn configure(&mut self) -> Result<(), RfbiError> {
            self.events.push(Event::Configure);
            Ok(())
        }
        fn enable(&mut self) -> Result<(), RfbiError> {
            Ok(())
        }
        fn disable(&mut self) {}
        fn update(&mut self, _done: &'static (), _context: u32) -> Result<(), RfbiError> {
            Ok(())
        }
        fn set_pixel_size(&mut self, _pixel_size: u8) {}
        fn set_data_lines(&mut self, data_lines: u8) {
            self.data_lines = data_lines;
            self.events.push(Event::DataLines(data_lines));
        }
        fn set_rfbi_timings(&mut self, _timings: &TimingRequirement) {}
        fn write_command(&mut self, bytes: &[u8]) -> Result<(), RfbiError> {
            if self.data_lines != 8 {
                return Err(TransferError::MisalignedLength.into());
            }
            self.events.push(Event::Command(bytes.to_vec()));
            Ok(())
        }
        fn write_data(&mut self, bytes: &[u8]) -> Result<(), RfbiError> {
            self.events.push(Event::Data(bytes.to_vec()));
            Ok(())
        }
        fn read_data(&mut self, buf: &mut [u8]) -> Result<(), RfbiError> {
            self.events.push(Event::Read(buf.len()));
            for b in buf.iter_mut() {
                *b = self.reads.pop_front().unwrap_or(0);
            }
            Ok(())
        }
    }

    /// Counts milliseconds slept.
    #[derive(Default)]
    struct CountingDelay {
        ms: u32,
    }

    impl DelayNs for CountingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.ms = self.ms.saturating_add(ns / 1_000_000);
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.ms = self.ms.saturating_add(ms);
        }
    }

    #[test]
    fn test_read_reg_sends_command_then_reads() {
        let mut bus = RecordingBus::with_reads(&[0x5A]);
        let mut buf = [0u8];
        read_reg(&mut bus, REG_REV_CODE, &mut buf).unwrap();
        assert_eq!(buf, [0x5A]);
        assert_eq!(
            bus.events,
            vec![Event::Command(vec![REG_REV_CODE]), Event::Read(1)]
        );
    }

    #[test]
    fn test_detect_s1d13745() {
        let mut bus = RecordingBus::with_reads(&[PLL_DIV_LOCKED, 0xa5, 0x03]);
        let mut blizzard = Blizzard::new(NoopDelay::new());
        assert_eq!(blizzard.detect(&mut bus).unwrap(), ControllerVersion::S1D13745);
        assert_eq!(blizzard.version(), Some(ControllerVersion::S1D13745));
    }

    #[test]
    fn test_detect_s1d13744_without_bootloader() {
        let mut bus = RecordingBus::with_reads(&[0x00, 0x9c, 0x00]);
        let mut blizzard = Blizzard::new(NoopDelay::new());
        assert_eq!(blizzard.detect(&mut bus).unwrap(), ControllerVersion::S1D13744);
    }

    #[test]
    fn test_detect_unknown_rev_code() {
        let mut bus = RecordingBus::with_reads(&[PLL_DIV_LOCKED, 0x42, 0x00]);
        let mut blizzard = Blizzard::new(NoopDelay::new());
        assert_eq!(
            blizzard.detect(&mut bus),
            Err(BlizzardError::UnknownController(0x42))
        );
        assert_eq!(blizzard.version(), None);
    }

    #[test]
    fn test_detect_propagates_bus_error() {
        let mut bus = RecordingBus::with_reads(&[]);
        bus.data_lines = 16;
        let mut blizzard = Blizzard::new(NoopDelay::new());
        assert_eq!(
            blizzard.detect(&mut bus),
            Err(BlizzardError::Bus(TransferError::MisalignedLength.into()))
        );
    }

    #[test]
    fn test_init_register_sequence() {
        // POWER_SAVE, PLL_MODE, then PLL_DIV already locked.
        let mut bus = RecordingBus::with_reads(&[0xFF, 0xFE, PLL_DIV_LOCKED]);
        let mut blizzard = Blizzard::new(CountingDelay::default());
        let status = block_on(blizzard.init(&mut bus)).unwrap();

        assert_eq!(
            status,
            PllStatus {
                polls: 0,
                locked: true
            }
        );
        assert_eq!(
            bus.register_writes(),
            vec![
                (REG_POWER_SAVE, vec![0xFC]),
                (REG_PLL_MODE, vec![0xFD]),
                (REG_DISPLAY_MODE, vec![DISPLAY_MODE_NORMAL]),
            ]
        );
        assert_eq!(blizzard.delay.ms, 0);
    }

    #[test]
    fn test_init_polls_until_lock() {
        let mut bus = RecordingBus::with_reads(&[0, 0, 0, 0, 0, PLL_DIV_LOCKED]);
        let mut blizzard = Blizzard::new(CountingDelay::default());
        let status = block_on(blizzard.init(&mut bus)).unwrap();
        assert_eq!(status.polls, 3);
        assert!(status.locked);
        assert!(!status.is_slow());
        assert_eq!(blizzard.delay.ms, 3);
    }

    #[test]
    fn test_init_pll_timeout_is_not_fatal() {
        // Queue runs dry: every PLL_DIV read returns 0.
        let mut bus = RecordingBus::with_reads(&[0, 0]);
        let mut blizzard = Blizzard::new(CountingDelay::default());
        let status = block_on(blizzard.init(&mut bus)).unwrap();
        assert_eq!(
            status,
            PllStatus {
                polls: PLL_POLL_LIMIT,
                locked: false
            }
        );
        assert!(status.is_slow());
        assert_eq!(blizzard.delay.ms, u32::from(PLL_POLL_LIMIT));
        assert_eq!(
            bus.register_writes().last(),
            Some(&(REG_DISPLAY_MODE, vec![DISPLAY_MODE_NORMAL]))
        );
    }

    #[test]
    fn test_slow_lock_is_flagged() {
        let status = PllStatus {
            polls: PLL_SLOW_POLLS.saturating_add(1),
            locked: true,
        };
        assert!(status.is_slow());
    }

    #[test]
    fn test_sleep_switches_to_8_lines_and_sets_power_save() {
        let mut bus = RecordingBus::with_reads(&[0x10]);
        bus.data_lines = 16;
        let mut blizzard = Blizzard::new(CountingDelay::default());
        block_on(blizzard.sleep(&mut bus)).unwrap();

        assert_eq!(
            bus.events.first(),
            Some(&Event::DataLines(REGISTER_DATA_LINES))
        );
        assert_eq!(bus.events.get(1), Some(&Event::Configure));
        assert_eq!(bus.register_writes(), vec![(REG_POWER_SAVE, vec![0x13])]);
        assert_eq!(blizzard.delay.ms, 100);
    }

    #[test]
    fn test_window_payload_full_screen() {
        let payload = window_payload(0, 0, 800, 480, SRC_WRITE_LCD_BACKGROUND);
        assert_eq!(
            payload,
            [
                0x00, 0x00, 0x00, 0x00, 0x1F, 0x03, 0xDF, 0x01, // input window
                0x00, 0x00, 0x00, 0x00, 0x1F, 0x03, 0xDF, 0x01, // output window
                COLOR_RGB565, SRC_WRITE_LCD_BACKGROUND,
            ]
        );
    }

    #[test]
    fn test_window_payload_offset_little_endian() {
        let payload = window_payload(0x0102, 0x0304, 2, 2, SRC_WRITE_LCD);
        assert_eq!(
            payload.get(..8).unwrap(),
            &[0x02, 0x01, 0x04, 0x03, 0x03, 0x01, 0x05, 0x03]
        );
    }

    #[test]
    fn test_setup_update_sequence() {
        let mut bus = RecordingBus::with_reads(&[]);
        let mut blizzard = Blizzard::new(NoopDelay::new());
        blizzard.setup_update(&mut bus, 0, 0, 800, 480).unwrap();

        let payload = window_payload(0, 0, 800, 480, SRC_WRITE_LCD_DESTRUCTIVE);
        assert_eq!(
            bus.events,
            vec![
                Event::DataLines(8),
                Event::Configure,
                Event::Command(vec![REG_INPUT_WIN_X_START_0]),
                Event::Data(payload.to_vec()),
                Event::DataLines(16),
                Event::Configure,
            ]
        );
    }

    #[test]
    fn test_setup_update_source_follows_version() {
        let mut bus = RecordingBus::with_reads(&[PLL_DIV_LOCKED, 0x9c, 0x00]);
        let mut blizzard = Blizzard::new(NoopDelay::new());
        blizzard.detect(&mut bus).unwrap();
        blizzard.setup_update(&mut bus, 0, 0, 1, 1).unwrap();

        let (_, payload) = bus.register_writes().pop().unwrap();
        assert_eq!(payload.last(), Some(&SRC_WRITE_LCD));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            std::format!("{}", BlizzardError::UnknownController(0x42)),
            "unknown controller, rev code 0x42"
        );
    }
}
