//! Bus controller integration tests: drive the full RFBI stack against the
//! recording register, power and pipeline mocks.
//!
//! Run with: cargo test -p rfbi --test integration_bus

#![allow(clippy::unwrap_used)]

use embassy_futures::join::join;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use platform::mocks::{MockPipeline, MockPower, MockRegisters};
use platform::pipeline::{HandlerKey, VideoMode};
use rfbi::registers::{ChipSelect, CONTROL, PIXEL_CNT};
use rfbi::timing::TimingRequirement;
use rfbi::{
    BusPhase, ClockContext, FrameDone, FrameDoneSignal, ModeStatus, ParallelMode, ResourceError,
    Rfbi, RfbiBridge, RfbiConfig, RfbiError, RfbiOps, TransferError,
};

type Raw = CriticalSectionRawMutex;
type TestRfbi<'d> = Rfbi<'d, Raw, MockRegisters, MockPower, MockPipeline>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn n8x0_timings() -> TimingRequirement {
    TimingRequirement {
        cs_on_time: 0,
        we_on_time: 9_000,
        we_off_time: 18_000,
        we_cycle_time: 36_000,
        re_on_time: 9_000,
        re_off_time: 27_000,
        re_cycle_time: 36_000,
        access_time: 27_000,
        cs_off_time: 36_000,
        cs_pulse_width: 0,
    }
}

fn config() -> RfbiConfig {
    RfbiConfig {
        chip_select: ChipSelect::Cs0,
        pixel_size: 16,
        data_lines: 8,
        timings: n8x0_timings(),
        video_mode: VideoMode {
            pixel_clock_hz: 21_940_000,
            hactive: 800,
            vactive: 480,
            ..VideoMode::default()
        },
        te_enabled: false,
    }
}

/// 50 MHz interface clock: 20 ns tick.
fn rfbi<'d>(config: RfbiConfig) -> TestRfbi<'d> {
    Rfbi::new(
        MockRegisters::new(),
        MockPower::new(),
        MockPipeline::new(),
        ClockContext::from_l4_khz(50_000).unwrap(),
        config,
    )
}

// ---------------------------------------------------------------------------
// Test: enable programs bus format and timings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_enable_programs_registers() {
    let rfbi = rfbi(config());
    let mut bus = rfbi.bus_lock().await;

    bus.enable().unwrap();

    assert_eq!(bus.state(), BusPhase::Enabled);
    assert_eq!(bus.parallel_mode(), Some(ParallelMode::Lines8));
    assert_eq!(bus.power().refcount(), 1);
    assert_eq!(bus.pipeline().registered(), Some(HandlerKey(0)));
    assert!(bus.pipeline().is_enabled());
    assert_eq!(bus.pipeline().timings().map(|m| m.hactive), Some(800));

    rfbi.with_registers(|regs| {
        assert_eq!(regs.get(CONTROL), 0x4, "CS0 selected, bypass off");
        assert_eq!(regs.get(0x060), 0x0030_0220, "16 bpp over 8 lines, 2:1");
        assert_eq!(regs.get(0x064), 0x0210_8420, "ONOFF_TIME(0)");
        assert_eq!(regs.get(0x068), 0x0080_0082, "CYCLE_TIME(0)");
        assert_eq!([regs.get(0x06c), regs.get(0x070), regs.get(0x074)], [8, 8, 0]);
    });
}

#[tokio::test]
async fn test_fast_clock_sets_granularity() {
    let rfbi: TestRfbi<'_> = Rfbi::new(
        MockRegisters::new(),
        MockPower::new(),
        MockPipeline::new(),
        ClockContext::from_l4_khz(2_000_000).unwrap(),
        config(),
    );
    let mut bus = rfbi.bus_lock().await;
    bus.enable().unwrap();

    let solved = bus.solved_timings().unwrap();
    assert_eq!(solved.divider, 2);
    rfbi.with_registers(|regs| {
        assert_eq!(regs.get(0x064), 0x1B94_A640);
        assert_eq!(regs.get(0x068), 0x06C0_0924);
        assert_eq!(regs.get(0x060) & 0x10, 0x10, "granularity bit");
    });
}

#[tokio::test]
async fn test_enable_on_cs1_programs_channel_one() {
    let rfbi: TestRfbi<'_> = Rfbi::new(
        MockRegisters::new(),
        MockPower::new(),
        MockPipeline::new(),
        ClockContext::from_l4_khz(2_000_000).unwrap(),
        RfbiConfig {
            chip_select: ChipSelect::Cs1,
            ..config()
        },
    );
    let mut bus = rfbi.bus_lock().await;
    bus.enable().unwrap();

    assert_eq!(bus.solved_timings().unwrap().divider, 2);
    rfbi.with_registers(|regs| {
        assert_eq!(regs.writes_to(0x07c).last(), Some(0x1B94_A640), "ONOFF_TIME(1)");
        assert_eq!(regs.writes_to(0x080).last(), Some(0x06C0_0924), "CYCLE_TIME(1)");
        assert_eq!(regs.get(0x078) & 0x10, 0x10, "granularity bit in CONFIG(1)");
        assert_eq!((regs.get(CONTROL) >> 2) & 0x3, 2, "CS1 selected");
        for offset in [0x060, 0x064, 0x068] {
            assert_eq!(regs.writes_to(offset).count(), 0, "module 0 at {offset:#x} untouched");
        }
    });
}

// ---------------------------------------------------------------------------
// Test: enable failures roll back
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_enable_without_power_fails_cleanly() {
    let rfbi = rfbi(config());
    let mut bus = rfbi.bus_lock().await;
    bus.power().fail_acquire = true;

    assert_eq!(
        bus.enable(),
        Err(RfbiError::Resource(ResourceError::PowerResourceUnavailable))
    );
    assert_eq!(bus.state(), BusPhase::Idle);
    assert_eq!(bus.pipeline().registered(), None);
    rfbi.with_registers(|regs| assert_eq!(regs.access_count(), 0));
}

#[tokio::test]
async fn test_unsatisfiable_timing_releases_everything() {
    let rfbi: TestRfbi<'_> = Rfbi::new(
        MockRegisters::new(),
        MockPower::new(),
        MockPipeline::new(),
        ClockContext::from_l4_khz(10_000_000).unwrap(),
        config(),
    );
    let mut bus = rfbi.bus_lock().await;

    assert_eq!(
        bus.enable(),
        Err(RfbiError::Timing(rfbi::TimingError::TimingUnsatisfiable))
    );
    assert_eq!(bus.state(), BusPhase::Idle);
    assert_eq!(bus.power().refcount(), 0);
    assert_eq!(bus.pipeline().registered(), None);
    assert!(!bus.pipeline().is_enabled());
}

#[tokio::test]
async fn test_manager_enable_failure_releases_everything() {
    let rfbi = rfbi(config());
    let mut bus = rfbi.bus_lock().await;
    bus.pipeline().fail_enable = true;

    assert_eq!(
        bus.enable(),
        Err(RfbiError::Resource(ResourceError::ManagerEnableFailed))
    );
    assert_eq!(bus.power().refcount(), 0);
    assert_eq!(bus.pipeline().registered(), None);
}

#[tokio::test]
async fn test_bad_format_fails_enable() {
    let rfbi = rfbi(RfbiConfig {
        pixel_size: 11,
        data_lines: 4,
        ..config()
    });
    let mut bus = rfbi.bus_lock().await;

    assert_eq!(
        bus.enable(),
        Err(RfbiError::Config(rfbi::ConfigError::UnsupportedRatio))
    );
    assert_eq!(bus.power().refcount(), 0);
    assert_eq!(bus.pipeline().registered(), None);
}

#[tokio::test]
async fn test_double_enable_refused_without_leaking_power() {
    let rfbi = rfbi(config());
    let mut bus = rfbi.bus_lock().await;
    bus.enable().unwrap();

    assert_eq!(
        bus.enable(),
        Err(RfbiError::Resource(ResourceError::HandlerRegistrationFailed))
    );
    // First enable's resources are untouched.
    assert_eq!(bus.state(), BusPhase::Enabled);
    assert_eq!(bus.power().refcount(), 1);
    assert_eq!(bus.pipeline().registered(), Some(HandlerKey(0)));
}

// ---------------------------------------------------------------------------
// Test: frame transfer and completion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_transfer_and_frame_done() {
    let done: FrameDoneSignal<Raw> = Signal::new();
    let rfbi = rfbi(config());
    let mut bus = rfbi.bus_lock().await;
    bus.enable().unwrap();

    bus.transfer_area(800, 480, &done, 7).unwrap();

    assert_eq!(bus.pipeline().start_updates(), 1);
    assert!(rfbi.is_transfer_pending());
    rfbi.with_registers(|regs| {
        assert_eq!(regs.get(PIXEL_CNT), 384_000);
        assert_eq!(regs.get(CONTROL), 0x15, "enable + ITE + CS0");
    });

    // Interrupt path completes while the owner still holds the bus.
    rfbi.frame_done();
    assert_eq!(
        done.wait().await,
        FrameDone {
            context: 7,
            pixels: 384_000
        }
    );
    assert!(!rfbi.is_transfer_pending());
    rfbi.with_registers(|regs| assert_eq!(regs.get(CONTROL), 0x14));

    // Exactly once.
    rfbi.frame_done();
    assert!(!done.signaled());
}

#[tokio::test]
async fn test_second_transfer_refused_while_pending() {
    let done: FrameDoneSignal<Raw> = Signal::new();
    let rfbi = rfbi(config());
    let mut bus = rfbi.bus_lock().await;
    bus.enable().unwrap();

    bus.transfer_area(10, 10, &done, 1).unwrap();
    assert_eq!(
        bus.transfer_area(10, 10, &done, 2),
        Err(RfbiError::Transfer(TransferError::TransferAlreadyPending))
    );
    assert_eq!(bus.pipeline().start_updates(), 1);

    rfbi.frame_done();
    assert_eq!(done.wait().await.context, 1);
    bus.transfer_area(10, 10, &done, 3).unwrap();
}

#[tokio::test]
async fn test_te_enabled_leaves_internal_trigger_off() {
    let done: FrameDoneSignal<Raw> = Signal::new();
    let rfbi = rfbi(RfbiConfig {
        te_enabled: true,
        ..config()
    });
    let mut bus = rfbi.bus_lock().await;
    bus.enable().unwrap();
    bus.update(&done, 0).unwrap();
    rfbi.with_registers(|regs| assert_eq!(regs.get(CONTROL), 0x5));
}

#[tokio::test]
async fn test_transfer_requires_enabled_bus() {
    let done: FrameDoneSignal<Raw> = Signal::new();
    let rfbi = rfbi(config());
    let mut bus = rfbi.bus_lock().await;
    assert_eq!(
        bus.transfer_area(1, 1, &done, 0),
        Err(RfbiError::Transfer(TransferError::NotEnabled))
    );
    assert_eq!(bus.pipeline().start_updates(), 0);
}

#[tokio::test]
async fn test_disable_keeps_pending_completion() {
    let done: FrameDoneSignal<Raw> = Signal::new();
    let rfbi = rfbi(config());
    let mut bus = rfbi.bus_lock().await;
    bus.enable().unwrap();
    bus.update(&done, 9).unwrap();
    bus.disable();

    assert_eq!(bus.state(), BusPhase::Idle);
    assert!(rfbi.is_transfer_pending());
    rfbi.frame_done();
    assert_eq!(done.wait().await.context, 9);
}

// ---------------------------------------------------------------------------
// Test: disable
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_disable_releases_resources() {
    let rfbi = rfbi(config());
    let mut bus = rfbi.bus_lock().await;
    bus.enable().unwrap();
    bus.disable();

    assert_eq!(bus.state(), BusPhase::Idle);
    assert_eq!(bus.power().refcount(), 0);
    assert_eq!(bus.pipeline().registered(), None);
    assert!(!bus.pipeline().is_enabled());

    // Second disable is a no-op.
    bus.disable();
    assert_eq!(bus.pipeline().disables(), 1);
}

#[tokio::test]
async fn test_reenable_after_disable() {
    let rfbi = rfbi(config());
    let mut bus = rfbi.bus_lock().await;
    bus.enable().unwrap();
    bus.disable();
    bus.enable().unwrap();
    assert_eq!(bus.power().acquire_count(), 2);
    assert_eq!(bus.power().refcount(), 1);
}

// ---------------------------------------------------------------------------
// Test: raw streaming through the ops surface
// ---------------------------------------------------------------------------

fn write_reg<'d, B: RfbiOps<'d>>(bus: &mut B, reg: u8, value: u8) -> Result<(), RfbiError> {
    bus.write_command(&[reg])?;
    bus.write_data(&[value])
}

#[tokio::test]
async fn test_ops_surface_streams_bytes() {
    let rfbi = rfbi(config());
    let mut bus = rfbi.bus_lock().await;
    bus.enable().unwrap();
    rfbi.with_registers(|regs| regs.clear_log());

    write_reg(&mut bus, 0xe6, 0x03).unwrap();

    rfbi.with_registers(|regs| {
        assert_eq!(regs.writes_to(0x04c).collect::<Vec<_>>(), vec![0xe6]);
        assert_eq!(regs.writes_to(0x050).collect::<Vec<_>>(), vec![0x03]);
    });
}

#[tokio::test]
async fn test_streaming_before_configure_refused() {
    let rfbi = rfbi(config());
    let mut bus = rfbi.bus_lock().await;
    assert_eq!(
        bus.write_command(&[0]),
        Err(RfbiError::Transfer(TransferError::NotConfigured))
    );
}

#[tokio::test]
async fn test_streaming_in_12_line_mode_touches_nothing() {
    let rfbi = rfbi(RfbiConfig {
        pixel_size: 24,
        data_lines: 12,
        ..config()
    });
    let mut bus = rfbi.bus_lock().await;
    bus.configure().unwrap();
    rfbi.with_registers(|regs| regs.clear_log());

    assert_eq!(
        bus.write_data(&[1, 2]),
        Err(RfbiError::Transfer(TransferError::UnsupportedParallelMode))
    );
    rfbi.with_registers(|regs| assert_eq!(regs.access_count(), 0));
}

// ---------------------------------------------------------------------------
// Test: bus lock exclusion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_bus_lock_serialises_owners() {
    let rfbi = rfbi(config());
    let first = rfbi.bus_lock().await;
    assert!(rfbi.try_bus_lock().is_none());

    let waiter = async {
        let bus = rfbi.bus_lock().await;
        bus.state()
    };
    let releaser = async move {
        tokio::task::yield_now().await;
        first.bus_unlock();
    };
    let (state, ()) = join(waiter, releaser).await;
    assert_eq!(state, BusPhase::Idle);
}

#[tokio::test]
async fn test_read_revision_balances_power() {
    let rfbi = rfbi(config());
    rfbi.with_registers(|regs| regs.set(0x000, 0x0000_0021));
    let mut bus = rfbi.bus_lock().await;

    let rev = bus.read_revision().unwrap();
    assert_eq!((rev.major, rev.minor), (2, 1));
    assert_eq!(bus.power().refcount(), 0);
    assert_eq!(bus.power().acquire_count(), 1);
}

// ---------------------------------------------------------------------------
// Test: bridge surface
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_bridge_enable_disable() {
    let rfbi = rfbi(config());
    let bridge = RfbiBridge::new(&rfbi);

    bridge.enable().await.unwrap();
    {
        let mut bus = rfbi.bus_lock().await;
        assert_eq!(bus.state(), BusPhase::Enabled);
        assert_eq!(bus.power().refcount(), 1);
    }
    bridge.disable().await;
    let mut bus = rfbi.try_bus_lock().unwrap();
    assert_eq!(bus.state(), BusPhase::Idle);
    assert_eq!(bus.power().refcount(), 0);
}

#[tokio::test]
async fn test_bridge_mode_set_and_validation() {
    let rfbi = rfbi(config());
    let bridge = RfbiBridge::new(&rfbi);
    let mode = VideoMode {
        pixel_clock_hz: 10_000_000,
        hactive: 320,
        vactive: 240,
        ..VideoMode::default()
    };

    assert_eq!(bridge.mode_valid(&mode), ModeStatus::Valid);
    assert_eq!(
        bridge.mode_valid(&VideoMode { pixel_clock_hz: 0, ..mode }),
        ModeStatus::ClockRange
    );
    assert_eq!(
        bridge.mode_valid(&VideoMode { hactive: 0, ..mode }),
        ModeStatus::Invalid
    );

    let lcd = bridge.mode_set(&mode).await.unwrap();
    assert_eq!(lcd.clock_info.pck_div, 5);
    assert_eq!(rfbi.bus_lock().await.config().video_mode, mode);
}
