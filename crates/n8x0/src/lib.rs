//! Nokia N800/N810 display: Blizzard controller over RFBI
//!
//! The N8x0 LCD sits behind an Epson S1D13744/S1D13745 ("Blizzard")
//! framebuffer controller, which the SoC reaches over the RFBI parallel bus.
//! This crate is a bus *user*: it never touches RFBI registers directly.
//!
//! - [`registers`] - Blizzard register map and field values
//! - [`blizzard`] - controller client, generic over [`rfbi::RfbiOps`]
//! - [`panel`] - board presets and the power-on / update / power-off flow
//!
//! # Example
//!
//! ```no_run
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use embedded_hal_async::delay::DelayNs;
//! use n8x0::panel::N8x0Panel;
//! use platform::{DisplayPipeline, PowerResource, RegisterIo};
//! use rfbi::controller::{FrameDoneSignal, Rfbi};
//!
//! async fn show<'d, R, P, D, T>(
//!     rfbi: &Rfbi<'d, CriticalSectionRawMutex, R, P, D>,
//!     done: &'d FrameDoneSignal<CriticalSectionRawMutex>,
//!     delay: T,
//! ) -> Result<(), n8x0::PanelError>
//! where
//!     R: RegisterIo,
//!     P: PowerResource,
//!     D: DisplayPipeline,
//!     T: DelayNs,
//! {
//!     let mut panel = N8x0Panel::new(rfbi, done, delay);
//!     panel.power_on().await?;
//!     panel.update(0, 0, 800, 480).await?;
//!     panel.power_off().await
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
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)] // chip and register names in doc comments
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
mod fmt;

pub mod blizzard;
pub mod panel;
pub mod registers;

pub use blizzard::{Blizzard, BlizzardError, ControllerVersion, PllStatus};
pub use panel::{n8x0_rfbi_timings, n8x0_video_mode, rfbi_config, N8x0Panel, PanelError};
