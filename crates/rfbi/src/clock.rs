//! Interface clock context
//!
//! The RFBI strobes are timed in ticks of the L4 interface clock, optionally
//! doubled by the one-bit cycle granularity field.

use crate::error::TimingError;

/// Largest divider the granularity bit can express.
pub const MAX_DIVIDER: u32 = 2;

const PS_PER_MS: u32 = 1_000_000_000;

/// Interface clock as seen by the timing solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockContext {
    period_ps: u32,
    max_divider: u32,
}

impl ClockContext {
    /// Derive the tick period from the interface clock rate in kHz.
    ///
    /// The period is truncated to whole picoseconds. Rates of zero or above
    /// 1 THz (a sub-picosecond period) are rejected.
    ///
    /// ```
    /// use rfbi::clock::ClockContext;
    ///
    /// let clock = ClockContext::from_l4_khz(50_000).unwrap();
    /// assert_eq!(clock.period_ps(), 20_000);
    /// ```
    pub fn from_l4_khz(khz: u32) -> Result<Self, TimingError> {
        let period_ps = PS_PER_MS.checked_div(khz).ok_or(TimingError::InvalidClock)?;
        Self::from_period_ps(period_ps)
    }

    /// Build a context directly from a tick period.
    pub fn from_period_ps(period_ps: u32) -> Result<Self, TimingError> {
        if period_ps == 0 {
            return Err(TimingError::InvalidClock);
        }
        Ok(Self {
            period_ps,
            max_divider: MAX_DIVIDER,
        })
    }

    /// Limit the dividers the solver may try; clamped to `1..=MAX_DIVIDER`.
    #[must_use]
    pub fn with_max_divider(mut self, max_divider: u32) -> Self {
        self.max_divider = max_divider.clamp(1, MAX_DIVIDER);
        self
    }

    /// Undivided tick period in picoseconds.
    pub fn period_ps(&self) -> u32 {
        self.period_ps
    }

    /// Largest divider the solver will try.
    pub fn max_divider(&self) -> u32 {
        self.max_divider
    }

    /// Interface clock rate in Hz implied by the period.
    pub fn rate_hz(&self) -> u64 {
        1_000_000_000_000u64
            .checked_div(u64::from(self.period_ps))
            .unwrap_or(0)
    }

    /// Tick length with `divider` applied.
    pub fn tick_ps(&self, divider: u32) -> u64 {
        u64::from(self.period_ps).saturating_mul(u64::from(divider))
    }

    /// Effective tick for a programmed granularity bit.
    pub fn tick_time_ps(&self, granularity: u32) -> u64 {
        self.tick_ps(granularity.saturating_add(1))
    }
}
