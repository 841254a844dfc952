//! RFBI bus controller
//!
//! [`Rfbi`] owns the register window, the power domain and the display
//! pipeline handle for one RFBI output. Bus users take exclusive ownership
//! with [`Rfbi::bus_lock`]; every bus operation lives on the returned
//! [`RfbiBus`] guard, so it is impossible to drive the bus without holding
//! the lock.
//!
//! # Locking
//!
//! Two locks with different jobs:
//!
//! - the **bus lock** (`embassy_sync::mutex::Mutex`) is held by a bus user
//!   across a whole command sequence and may be awaited;
//! - the **register lock** (`embassy_sync::blocking_mutex::Mutex`) guards the
//!   register file and the pending completion, and is only ever held for a
//!   few register accesses.
//!
//! [`Rfbi::frame_done`] runs from the frame-done interrupt path. It needs the
//! register lock only, so it completes while a bus user still holds the bus
//! lock (which it normally does: it is waiting for that very completion).
//!
//! # Lifecycle
//!
//! ```text
//!  Idle ──enable()──► Configuring ──ok──► Enabled ──disable()──► Idle
//!                         │
//!                         └──error──► (previous phase, resources rolled back)
//! ```
//!
//! Disabling with a transfer in flight does not cancel it: a later
//! `frame_done` still signals the recorded completion.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_sync::signal::Signal;
use platform::mmio::RegisterIo;
use platform::pipeline::{
    ClockInfo, DisplayPipeline, HandlerKey, IoPadMode, LcdManagerConfig, VideoMode,
};
use platform::power::PowerResource;

use crate::clock::ClockContext;
use crate::config::RfbiConfig;
use crate::error::{ResourceError, RfbiError, TransferError};
use crate::format::{configure_bus, BusFormat, ParallelMode};
use crate::registers::{self, control, modify_field, ChipSelect, Revision, CONTROL, PIXEL_CNT, REVISION};
use crate::timing::{InterfaceTimings, SolvedTiming, TimingRequirement, TimingTicks};
use crate::transfer;

/// Completion delivered when a frame transfer finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameDone {
    /// Opaque value passed to `transfer_area`
    pub context: u32,
    /// Pixels in the finished transfer
    pub pixels: u32,
}

/// Completion handle for frame transfers.
pub type FrameDoneSignal<M> = Signal<M, FrameDone>;

/// Controller lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusPhase {
    /// Powered down
    Idle,
    /// `enable` in progress
    Configuring,
    /// Ready for transfers
    Enabled,
}

struct Pending<'d, M: RawMutex> {
    done: &'d FrameDoneSignal<M>,
    context: u32,
    pixels: u32,
}

struct Shared<'d, M: RawMutex, R> {
    regs: R,
    pending: Option<Pending<'d, M>>,
}

struct BusState<P, D> {
    power: P,
    pipeline: D,
    config: RfbiConfig,
    timings: InterfaceTimings,
    parallel_mode: Option<ParallelMode>,
    phase: BusPhase,
    handler_registered: bool,
}

/// One RFBI output.
///
/// `'d` is the lifetime of the completion signals handed to
/// [`RfbiBus::transfer_area`].
pub struct Rfbi<'d, M: RawMutex, R, P, D> {
    shared: BlockingMutex<M, RefCell<Shared<'d, M, R>>>,
    bus: Mutex<M, BusState<P, D>>,
    clock: ClockContext,
    chip_select: ChipSelect,
}

impl<'d, M, R, P, D> Rfbi<'d, M, R, P, D>
where
    M: RawMutex,
    R: RegisterIo,
    P: PowerResource,
    D: DisplayPipeline,
{
    /// Create a controller in the [`BusPhase::Idle`] phase.
    ///
    /// Nothing is written to hardware until the bus is locked and enabled.
    pub fn new(regs: R, power: P, pipeline: D, clock: ClockContext, config: RfbiConfig) -> Self {
        Self {
            shared: BlockingMutex::new(RefCell::new(Shared {
                regs,
                pending: None,
            })),
            bus: Mutex::new(BusState {
                power,
                pipeline,
                config,
                timings: InterfaceTimings::new(config.timings),
                parallel_mode: None,
                phase: BusPhase::Idle,
                handler_registered: false,
            }),
            clock,
            chip_select: config.chip_select,
        }
    }

    /// Wait for exclusive ownership of the bus.
    pub async fn bus_lock(&self) -> RfbiBus<'_, 'd, M, R, P, D> {
        let state = self.bus.lock().await;
        debug!("rfbi: bus locked");
        RfbiBus { rfbi: self, state }
    }

    /// Take the bus if nobody holds it.
    pub fn try_bus_lock(&self) -> Option<RfbiBus<'_, 'd, M, R, P, D>> {
        let state = self.bus.try_lock().ok()?;
        Some(RfbiBus { rfbi: self, state })
    }

    /// Frame-done interrupt entry point.
    ///
    /// Clears CONTROL enable and signals the pending completion exactly once.
    /// Does nothing if no transfer is pending.
    pub fn frame_done(&self) {
        let pending = self.with_shared(|shared| {
            let pending = shared.pending.take()?;
            modify_field(&mut shared.regs, CONTROL, control::ENABLE, 0);
            Some(pending)
        });
        if let Some(pending) = pending {
            debug!("rfbi: frame done, {} pixels", pending.pixels);
            pending.done.signal(FrameDone {
                context: pending.context,
                pixels: pending.pixels,
            });
        }
    }

    /// Returns `true` while a frame transfer awaits frame-done.
    pub fn is_transfer_pending(&self) -> bool {
        self.with_shared(|shared| shared.pending.is_some())
    }

    /// Run `f` with the register file.
    ///
    /// For status inspection; bus sequencing belongs on [`RfbiBus`].
    pub fn with_registers<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        self.with_shared(|shared| f(&mut shared.regs))
    }

    /// Interface clock used by the timing solver.
    pub fn clock(&self) -> &ClockContext {
        &self.clock
    }

    /// Chip-select channel of this output.
    pub fn chip_select(&self) -> ChipSelect {
        self.chip_select
    }

    fn with_shared<T>(&self, f: impl FnOnce(&mut Shared<'d, M, R>) -> T) -> T {
        self.shared.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

/// Exclusive bus ownership; dropping it unlocks the bus.
pub struct RfbiBus<'a, 'd, M: RawMutex, R, P, D> {
    rfbi: &'a Rfbi<'d, M, R, P, D>,
    state: MutexGuard<'a, M, BusState<P, D>>,
}

impl<'a, 'd, M, R, P, D> RfbiBus<'a, 'd, M, R, P, D>
where
    M: RawMutex,
    R: RegisterIo,
    P: PowerResource,
    D: DisplayPipeline,
{
    /// Release the bus.
    pub fn bus_unlock(self) {
        debug!("rfbi: bus unlocked");
    }

    /// Current lifecycle phase.
    pub fn state(&self) -> BusPhase {
        self.state.phase
    }

    /// Current configuration.
    pub fn config(&self) -> &RfbiConfig {
        &self.state.config
    }

    /// Parallel mode of the last successful [`configure`](Self::configure).
    pub fn parallel_mode(&self) -> Option<ParallelMode> {
        self.state.parallel_mode
    }

    /// Cached timing solution, if the current requirement has been solved.
    pub fn solved_timings(&self) -> Option<SolvedTiming> {
        self.state.timings.solved().copied()
    }

    /// Power domain handle.
    pub fn power(&mut self) -> &mut P {
        &mut self.state.power
    }

    /// Display pipeline handle.
    pub fn pipeline(&mut self) -> &mut D {
        &mut self.state.pipeline
    }

    /// Bits per pixel for the next `configure`.
    pub fn set_pixel_size(&mut self, pixel_size: u8) {
        self.state.config.pixel_size = pixel_size;
    }

    /// Data line count for the next `configure`.
    pub fn set_data_lines(&mut self, data_lines: u8) {
        self.state.config.data_lines = data_lines;
    }

    /// Replace the strobe timings; they are re-solved on the next `enable`.
    pub fn set_interface_timings(&mut self, timings: &TimingRequirement) {
        self.state.config.timings = *timings;
        self.state.timings.set(*timings);
    }

    /// Video mode used for pipeline timings and full-frame updates.
    pub fn set_video_mode(&mut self, mode: &VideoMode) {
        self.state.config.video_mode = *mode;
    }

    /// Trigger transfers from the tearing-effect line.
    pub fn set_te_enabled(&mut self, enabled: bool) {
        self.state.config.te_enabled = enabled;
    }

    /// Program the bus format from the current pixel size and data lines.
    pub fn configure(&mut self) -> Result<(), RfbiError> {
        let RfbiConfig {
            pixel_size,
            data_lines,
            ..
        } = self.state.config;
        let format = BusFormat::new(pixel_size, data_lines).map_err(|e| {
            error!("rfbi: {} bpp over {} lines: {}", pixel_size, data_lines, e);
            e
        })?;
        let cs = self.rfbi.chip_select;
        self.rfbi.with_registers(|regs| configure_bus(regs, cs, &format));
        self.state.parallel_mode = Some(format.parallel_mode());
        debug!(
            "rfbi: {} configured, {} bpp over {} lines, cycle format {}",
            cs,
            pixel_size,
            data_lines,
            format.cycle_format()
        );
        Ok(())
    }

    /// Power up and start the output.
    ///
    /// Acquires power, registers the frame-done handler, configures the bus,
    /// programs the solved timings and enables the display manager. On any
    /// failure after power-up the handler is unregistered and power released
    /// before the error is returned.
    pub fn enable(&mut self) -> Result<(), RfbiError> {
        let cs = self.rfbi.chip_select;
        debug!("rfbi: enable {}", cs);

        if self.state.power.acquire().is_err() {
            error!("rfbi: power domain unavailable");
            return Err(ResourceError::PowerResourceUnavailable.into());
        }

        let previous = self.state.phase;
        self.state.phase = BusPhase::Configuring;
        let mut registered = false;

        match self.bring_up(&mut registered) {
            Ok(()) => {
                self.state.phase = BusPhase::Enabled;
                info!("rfbi: {} enabled", cs);
                Ok(())
            }
            Err(e) => {
                error!("rfbi: enable failed: {}", e);
                if registered {
                    self.unregister_handler();
                }
                self.release_power();
                self.state.phase = previous;
                Err(e)
            }
        }
    }

    fn bring_up(&mut self, registered: &mut bool) -> Result<(), RfbiError> {
        if self.state.handler_registered {
            return Err(ResourceError::HandlerRegistrationFailed.into());
        }
        let key = self.handler_key();
        self.state
            .pipeline
            .register_framedone_handler(key)
            .map_err(|_| ResourceError::HandlerRegistrationFailed)?;
        self.state.handler_registered = true;
        *registered = true;

        self.configure()?;
        self.program_timings()?;

        let mode = self.state.config.video_mode;
        self.state.pipeline.set_timings(&mode);
        self.state
            .pipeline
            .enable()
            .map_err(|_| ResourceError::ManagerEnableFailed)?;
        Ok(())
    }

    fn program_timings(&mut self) -> Result<SolvedTiming, RfbiError> {
        let clock = self.rfbi.clock;
        let solved = self.state.timings.solve(&clock)?;
        let cs = self.rfbi.chip_select;
        self.rfbi.with_registers(|regs| {
            regs.write(cs.onoff_time(), solved.words.onoff);
            regs.write(cs.cycle_time(), solved.words.cycle);
            modify_field(regs, cs.config(), registers::config::CYCLE_GRANULARITY, solved.granularity);
        });

        let t = TimingTicks::unpack(solved.words);
        debug!(
            "rfbi: tick {} ps, cs {}/{}, we {}/{}/{}, re {}/{}/{}, access {}, cs pulse {}",
            clock.tick_time_ps(solved.granularity),
            t.cs_on,
            t.cs_off,
            t.we_on,
            t.we_off,
            t.we_cycle,
            t.re_on,
            t.re_off,
            t.re_cycle,
            t.access,
            t.cs_pulse
        );
        Ok(solved)
    }

    /// Stop the output and drop its resources.
    ///
    /// Teardown failures are logged, never returned. Does nothing unless the
    /// bus is enabled.
    pub fn disable(&mut self) {
        if self.state.phase != BusPhase::Enabled {
            debug!("rfbi: disable ignored, bus not enabled");
            return;
        }
        self.state.pipeline.disable();
        if self.state.handler_registered {
            self.unregister_handler();
        }
        self.release_power();
        self.state.phase = BusPhase::Idle;
        info!("rfbi: {} disabled", self.rfbi.chip_select);
    }

    fn handler_key(&self) -> HandlerKey {
        HandlerKey(u32::from(self.rfbi.chip_select.index()))
    }

    fn unregister_handler(&mut self) {
        let key = self.handler_key();
        if self.state.pipeline.unregister_framedone_handler(key).is_err() {
            warn!("rfbi: frame-done handler unregister failed");
        }
        self.state.handler_registered = false;
    }

    fn release_power(&mut self) {
        if self.state.power.release().is_err() {
            warn!("rfbi: power release failed");
        }
    }

    /// Start a `width` x `height` frame transfer.
    ///
    /// Returns as soon as the hardware is kicked; `done` is signalled from
    /// [`Rfbi::frame_done`] with `context` when the frame has gone out.
    pub fn transfer_area(
        &mut self,
        width: u16,
        height: u16,
        done: &'d FrameDoneSignal<M>,
        context: u32,
    ) -> Result<(), RfbiError> {
        if self.state.phase != BusPhase::Enabled {
            return Err(TransferError::NotEnabled.into());
        }
        if self.rfbi.is_transfer_pending() {
            error!("rfbi: transfer refused, previous frame still pending");
            return Err(TransferError::TransferAlreadyPending.into());
        }
        debug!("rfbi: transfer {}x{}", width, height);

        self.state.pipeline.start_update();

        let pixels = u32::from(width).saturating_mul(u32::from(height));
        let te_enabled = self.state.config.te_enabled;
        done.reset();
        self.rfbi.with_shared(|shared| {
            shared.pending = Some(Pending {
                done,
                context,
                pixels,
            });
            shared.regs.write(PIXEL_CNT, pixels);
            let mut ctrl = control::ENABLE.modify(shared.regs.read(CONTROL), 1);
            if !te_enabled {
                ctrl = control::ITE.modify(ctrl, 1);
            }
            shared.regs.write(CONTROL, ctrl);
        });
        Ok(())
    }

    /// Transfer the full active area of the current video mode.
    pub fn update(&mut self, done: &'d FrameDoneSignal<M>, context: u32) -> Result<(), RfbiError> {
        let mode = self.state.config.video_mode;
        self.transfer_area(mode.hactive, mode.vactive, done, context)
    }

    /// Write command bytes.
    pub fn write_command(&mut self, bytes: &[u8]) -> Result<(), RfbiError> {
        let mode = self.state.parallel_mode;
        self.rfbi
            .with_registers(|regs| transfer::write_command(regs, mode, bytes))
            .map_err(|e| {
                error!("rfbi: write_command: {}", e);
                e.into()
            })
    }

    /// Write parameter bytes.
    pub fn write_data(&mut self, bytes: &[u8]) -> Result<(), RfbiError> {
        let mode = self.state.parallel_mode;
        self.rfbi
            .with_registers(|regs| transfer::write_data(regs, mode, bytes))
            .map_err(|e| {
                error!("rfbi: write_data: {}", e);
                e.into()
            })
    }

    /// Read bytes from the controller.
    pub fn read_data(&mut self, buf: &mut [u8]) -> Result<(), RfbiError> {
        let mode = self.state.parallel_mode;
        self.rfbi
            .with_registers(|regs| transfer::read_data(regs, mode, buf))
            .map_err(|e| {
                error!("rfbi: read_data: {}", e);
                e.into()
            })
    }

    /// Read the module revision, powering the block just for the read.
    pub fn read_revision(&mut self) -> Result<Revision, RfbiError> {
        if self.state.power.acquire().is_err() {
            error!("rfbi: power domain unavailable");
            return Err(ResourceError::PowerResourceUnavailable.into());
        }
        let rev = Revision::from_raw(self.rfbi.with_registers(|regs| regs.read(REVISION)));
        self.release_power();
        info!("rfbi: revision {}", rev);
        Ok(rev)
    }

    /// Push the video mode and RFBI LCD manager settings to the pipeline.
    ///
    /// The pixel clock divider is derived from the RFBI interface (L4) clock
    /// this bus was built with. Boards whose display functional clock runs at
    /// a different rate use [`config_lcd_manager_with_fck`].
    ///
    /// [`config_lcd_manager_with_fck`]: Self::config_lcd_manager_with_fck
    pub fn config_lcd_manager(&mut self) -> Result<LcdManagerConfig, RfbiError> {
        let rate_hz = self.rfbi.clock.rate_hz();
        self.config_lcd_manager_with_fck(rate_hz)
    }

    /// [`config_lcd_manager`](Self::config_lcd_manager) against an explicit
    /// display functional clock.
    ///
    /// The pixel clock divider is `fck_hz` over the video mode's pixel clock,
    /// clamped to `1..=u16::MAX`, or 1 if the pixel clock is unset.
    pub fn config_lcd_manager_with_fck(
        &mut self,
        fck_hz: u64,
    ) -> Result<LcdManagerConfig, RfbiError> {
        let mode = self.state.config.video_mode;
        self.state.pipeline.set_timings(&mode);

        let pck_div = fck_hz
            .checked_div(u64::from(mode.pixel_clock_hz))
            .map_or(1, |div| u16::try_from(div).unwrap_or(u16::MAX))
            .max(1);
        let lcd = LcdManagerConfig {
            io_pad_mode: IoPadMode::Rfbi,
            stall_mode: true,
            fifo_handcheck: false,
            clock_info: ClockInfo {
                lck_div: 1,
                pck_div,
            },
            video_port_width: self.state.config.pixel_size,
            lcden_sig_polarity: false,
        };
        self.state
            .pipeline
            .set_lcd_config(&lcd)
            .map_err(|_| ResourceError::ManagerEnableFailed)?;
        debug!("rfbi: lcd manager configured, pck_div {}", pck_div);
        Ok(lcd)
    }
}
