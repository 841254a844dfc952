//! Bus-user operations table
//!
//! Display controller clients (panels, framebuffer chips) talk to the bus
//! through this trait rather than a concrete controller, so they can be
//! driven by [`RfbiBus`] on hardware and by a recorder in tests. The caller
//! is responsible for holding the bus lock: the trait is only implemented on
//! the lock guard.

use embassy_sync::blocking_mutex::raw::RawMutex;
use platform::mmio::RegisterIo;
use platform::pipeline::DisplayPipeline;
use platform::power::PowerResource;

use crate::controller::{FrameDoneSignal, RfbiBus};
use crate::error::RfbiError;
use crate::timing::TimingRequirement;

/// Operations a bus user may perform while holding the bus.
///
/// `'d` is the lifetime of completion handles passed to [`update`].
///
/// [`update`]: RfbiOps::update
pub trait RfbiOps<'d> {
    /// Completion handle type for frame updates.
    type Done: ?Sized;

    /// Reprogram the bus format from the current pixel size and data lines.
    fn configure(&mut self) -> Result<(), RfbiError>;

    /// Power up and start the output.
    fn enable(&mut self) -> Result<(), RfbiError>;

    /// Stop the output.
    fn disable(&mut self);

    /// Transfer one full frame; `done` fires when it has gone out.
    fn update(&mut self, done: &'d Self::Done, context: u32) -> Result<(), RfbiError>;

    /// Bits per pixel for the next `configure`.
    fn set_pixel_size(&mut self, pixel_size: u8);

    /// Data line count for the next `configure`.
    fn set_data_lines(&mut self, data_lines: u8);

    /// Strobe timings for the next `enable`.
    fn set_rfbi_timings(&mut self, timings: &TimingRequirement);

    /// Write command bytes.
    fn write_command(&mut self, bytes: &[u8]) -> Result<(), RfbiError>;

    /// Write parameter bytes.
    fn write_data(&mut self, bytes: &[u8]) -> Result<(), RfbiError>;

    /// Read bytes.
    fn read_data(&mut self, buf: &mut [u8]) -> Result<(), RfbiError>;
}

impl<'a, 'd, M, R, P, D> RfbiOps<'d> for RfbiBus<'a, 'd, M, R, P, D>
where
    M: RawMutex,
    R: RegisterIo,
    P: PowerResource,
    D: DisplayPipeline,
{
    type Done = FrameDoneSignal<M>;

    fn configure(&mut self) -> Result<(), RfbiError> {
        RfbiBus::configure(self)
    }

    fn enable(&mut self) -> Result<(), RfbiError> {
        RfbiBus::enable(self)
    }

    fn disable(&mut self) {
        RfbiBus::disable(self);
    }

    fn update(&mut self, done: &'d Self::Done, context: u32) -> Result<(), RfbiError> {
        RfbiBus::update(self, done, context)
    }

    fn set_pixel_size(&mut self, pixel_size: u8) {
        RfbiBus::set_pixel_size(self, pixel_size);
    }

    fn set_data_lines(&mut self, data_lines: u8) {
        RfbiBus::set_data_lines(self, data_lines);
    }

    fn set_rfbi_timings(&mut self, timings: &TimingRequirement) {
        self.set_interface_timings(timings);
    }

    fn write_command(&mut self, bytes: &[u8]) -> Result<(), RfbiError> {
        RfbiBus::write_command(self, bytes)
    }

    fn write_data(&mut self, bytes: &[u8]) -> Result<(), RfbiError> {
        RfbiBus::write_data(self, bytes)
    }

    fn read_data(&mut self, buf: &mut [u8]) -> Result<(), RfbiError> {
        RfbiBus::read_data(self, buf)
    }
}
