//! Remote FrameBuffer Interface (RFBI) bus driver
//!
//! The RFBI is a parallel 8/9/12/16-line bus from the display subsystem to an
//! external display controller chip that keeps its own framebuffer. This
//! crate programs it from datasheet-level requirements and sequences bus
//! transactions under a single bus owner.
//!
//! # Architecture
//!
//! ```text
//! Bus users (panel / controller clients)
//!         ↓  RfbiOps, RfbiBridge
//! controller  ── Rfbi / RfbiBus: lock, enable, disable, transfer, frame-done
//!         ↓
//! format   timing   transfer
//!         ↓
//! registers (platform::RegisterIo)
//! ```
//!
//! - [`timing`] - picosecond requirements → divider + packed timing words
//! - [`format`] - pixel depth / data lines → CONFIG and data-cycle words
//! - [`transfer`] - command, parameter and read streaming
//! - [`controller`] - bus lock, lifecycle and frame transfers
//! - [`ops`] / [`bridge`] - integration surfaces
//!
//! # Features
//!
//! - `defmt`: log through defmt and derive `defmt::Format` (hardware)
//! - `tracing`: log through tracing (host / emulator)
//! - `std`: implement `std::error::Error`
//!
//! # Example
//!
//! ```no_run
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use platform::{DisplayPipeline, PowerResource, RegisterIo};
//! use rfbi::controller::{FrameDoneSignal, Rfbi};
//!
//! async fn refresh<'d, R, P, D>(
//!     rfbi: &Rfbi<'d, CriticalSectionRawMutex, R, P, D>,
//!     done: &'d FrameDoneSignal<CriticalSectionRawMutex>,
//! ) -> Result<(), rfbi::RfbiError>
//! where
//!     R: RegisterIo,
//!     P: PowerResource,
//!     D: DisplayPipeline,
//! {
//!     let mut bus = rfbi.bus_lock().await;
//!     bus.update(done, 0)?;
//!     done.wait().await;
//!     bus.bus_unlock();
//!     Ok(())
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
mod fmt;

pub mod bridge;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod ops;
pub mod registers;
pub mod timing;
pub mod transfer;

pub use bridge::{ModeStatus, RfbiBridge};
pub use clock::ClockContext;
pub use config::RfbiConfig;
pub use controller::{BusPhase, FrameDone, FrameDoneSignal, Rfbi, RfbiBus};
pub use error::{ConfigError, ResourceError, RfbiError, TimingError, TransferError};
pub use format::{BusFormat, CycleFormat, ParallelMode};
pub use ops::RfbiOps;
pub use timing::{solve, SolvedTiming, TimingRequirement};
