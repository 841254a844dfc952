//! Platform abstractions for display interface drivers
//!
//! This crate holds the collaborator traits a display bus driver is written
//! against, so the driver can be developed and tested without hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Panel / controller clients (n8x0)
//!         ↓
//! Bus drivers (rfbi)
//!         ↓
//! Platform abstractions (this crate - traits + shared types)
//!         ↓
//! Hardware (memory-mapped registers, PM runtime, display manager)
//! ```
//!
//! # Modules
//!
//! - [`mmio`] - 32-bit register window access and bit-field helpers
//! - [`power`] - reference-counted power/clock domain
//! - [`pipeline`] - display manager: timings, LCD config, frame-done handlers
//! - `mocks` - recording test doubles (`test` or `std` feature)
//!
//! # Features
//!
//! - `std`: build `mocks` for use by other crates' tests
//! - `defmt`: derive `defmt::Format` on shared types
//!
//! # Example
//!
//! ```
//! use platform::mmio::RegisterIo;
//!
//! fn enable_bit0<R: RegisterIo>(regs: &mut R) {
//!     regs.modify(0x40, 0, 0, 1);
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
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod mmio;
pub mod mocks;
pub mod pipeline;
pub mod power;

pub use mmio::{MmioRegisters, RegisterIo};
pub use pipeline::{ClockInfo, DisplayPipeline, HandlerKey, IoPadMode, LcdManagerConfig, VideoMode};
pub use power::{AlwaysOn, PowerResource};
