//! Interface timing solver
//!
//! Converts a chip's datasheet strobe timings (picoseconds) into the two
//! packed per-chip-select timing words and the cycle granularity bit.
//!
//! # Algorithm
//!
//! Dividers are tried in ascending order, `1..=max_divider`. For each, every
//! field is rounded up to a whole number of ticks, then the ordering rules
//! are applied:
//!
//! ```text
//! we_off   > we_on                       (bump to we_on + 1)
//! re_off   > re_on                       (bump to re_on + 1)
//! cs_off   > cs_on, cs_off >= we_off, re_off
//! access   > re_on
//! we_cycle >= we_off, re_cycle >= re_off
//! ```
//!
//! The first divider where every field fits its register width wins.
//! Smaller dividers give finer timing, so they are always preferred.

use crate::clock::ClockContext;
use crate::error::TimingError;
use crate::registers::{cycle, onoff};

/// Picosecond strobe timings for one chip-select channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingRequirement {
    /// CS assertion
    pub cs_on_time: u32,
    /// CS deassertion
    pub cs_off_time: u32,
    /// WE assertion
    pub we_on_time: u32,
    /// WE deassertion
    pub we_off_time: u32,
    /// Write cycle
    pub we_cycle_time: u32,
    /// RE assertion
    pub re_on_time: u32,
    /// RE deassertion
    pub re_off_time: u32,
    /// Read cycle
    pub re_cycle_time: u32,
    /// Read data access
    pub access_time: u32,
    /// Minimum CS high pulse
    pub cs_pulse_width: u32,
}

impl TimingRequirement {
    /// Every field rounded up to a multiple of `tick_ps`.
    ///
    /// Values that would not fit a `u32` after rounding saturate.
    #[must_use]
    pub fn rounded_up(&self, tick_ps: u64) -> Self {
        let round = |ps: u32| -> u32 {
            let ticks = u64::from(ps).div_ceil(tick_ps.max(1));
            u32::try_from(ticks.saturating_mul(tick_ps)).unwrap_or(u32::MAX)
        };
        Self {
            cs_on_time: round(self.cs_on_time),
            cs_off_time: round(self.cs_off_time),
            we_on_time: round(self.we_on_time),
            we_off_time: round(self.we_off_time),
            we_cycle_time: round(self.we_cycle_time),
            re_on_time: round(self.re_on_time),
            re_off_time: round(self.re_off_time),
            re_cycle_time: round(self.re_cycle_time),
            access_time: round(self.access_time),
            cs_pulse_width: round(self.cs_pulse_width),
        }
    }
}

/// Per-field tick counts as programmed into the timing words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingTicks {
    /// CS assertion
    pub cs_on: u32,
    /// CS deassertion
    pub cs_off: u32,
    /// WE assertion
    pub we_on: u32,
    /// WE deassertion
    pub we_off: u32,
    /// Write cycle
    pub we_cycle: u32,
    /// RE assertion
    pub re_on: u32,
    /// RE deassertion
    pub re_off: u32,
    /// Read cycle
    pub re_cycle: u32,
    /// Read data access
    pub access: u32,
    /// Minimum CS high pulse
    pub cs_pulse: u32,
}

impl TimingTicks {
    /// Pack into the ONOFF_TIME and CYCLE_TIME words.
    ///
    /// Fields wider than their register slot are truncated; [`solve`] never
    /// produces such values.
    pub fn pack(&self) -> TimingWords {
        let onoff = onoff::CS_ON.value(self.cs_on)
            | onoff::CS_OFF.value(self.cs_off)
            | onoff::WE_ON.value(self.we_on)
            | onoff::WE_OFF.value(self.we_off)
            | onoff::RE_ON.value(self.re_on)
            | onoff::RE_OFF.value(self.re_off);
        let cycle = cycle::WE_CYCLE.value(self.we_cycle)
            | cycle::RE_CYCLE.value(self.re_cycle)
            | cycle::CS_PULSE.value(self.cs_pulse)
            | cycle::ACCESS.value(self.access);
        TimingWords { onoff, cycle }
    }

    /// Decode programmed timing words back into tick counts.
    pub fn unpack(words: TimingWords) -> Self {
        Self {
            cs_on: onoff::CS_ON.get(words.onoff),
            cs_off: onoff::CS_OFF.get(words.onoff),
            we_on: onoff::WE_ON.get(words.onoff),
            we_off: onoff::WE_OFF.get(words.onoff),
            re_on: onoff::RE_ON.get(words.onoff),
            re_off: onoff::RE_OFF.get(words.onoff),
            we_cycle: cycle::WE_CYCLE.get(words.cycle),
            re_cycle: cycle::RE_CYCLE.get(words.cycle),
            cs_pulse: cycle::CS_PULSE.get(words.cycle),
            access: cycle::ACCESS.get(words.cycle),
        }
    }

    fn fits(&self) -> bool {
        self.we_on <= onoff::WE_ON.max()
            && self.we_off <= onoff::WE_OFF.max()
            && self.re_on <= onoff::RE_ON.max()
            && self.re_off <= onoff::RE_OFF.max()
            && self.cs_on <= onoff::CS_ON.max()
            && self.cs_off <= onoff::CS_OFF.max()
            && self.access <= cycle::ACCESS.max()
            && self.we_cycle <= cycle::WE_CYCLE.max()
            && self.re_cycle <= cycle::RE_CYCLE.max()
            && self.cs_pulse <= cycle::CS_PULSE.max()
    }
}

/// Packed ONOFF_TIME (word A) and CYCLE_TIME (word B) values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingWords {
    /// ONOFF_TIME(n)
    pub onoff: u32,
    /// CYCLE_TIME(n)
    pub cycle: u32,
}

/// Result of a successful [`solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SolvedTiming {
    /// Requirement rounded up to whole ticks at the chosen divider
    pub rounded: TimingRequirement,
    /// Tick counts after the ordering rules
    pub ticks: TimingTicks,
    /// Chosen clock divider, 1 or 2
    pub divider: u32,
    /// Packed timing words
    pub words: TimingWords,
    /// CONFIG cycle granularity bit, `divider - 1`
    pub granularity: u32,
}

impl SolvedTiming {
    /// `[onoff, cycle, granularity]`, the three values written to hardware.
    pub fn words(&self) -> [u32; 3] {
        [self.words.onoff, self.words.cycle, self.granularity]
    }
}

/// Find the smallest divider at which `req` can be programmed.
///
/// ```
/// use rfbi::clock::ClockContext;
/// use rfbi::timing::{solve, TimingRequirement};
///
/// let req = TimingRequirement { we_on_time: 9_000, we_off_time: 18_000, ..Default::default() };
/// let solved = solve(&req, &ClockContext::from_period_ps(20_000).unwrap()).unwrap();
/// assert_eq!((solved.ticks.we_on, solved.ticks.we_off), (1, 2));
/// assert_eq!(solved.divider, 1);
/// ```
pub fn solve(req: &TimingRequirement, clock: &ClockContext) -> Result<SolvedTiming, TimingError> {
    for divider in 1..=clock.max_divider() {
        let tick = clock.tick_ps(divider);
        let rounded = req.rounded_up(tick);
        let Some(ticks) = ticks_for(&rounded, tick) else {
            debug!("rfbi timing: divider {} does not fit", divider);
            continue;
        };
        debug!("rfbi timing: divider {} fits", divider);
        return Ok(SolvedTiming {
            rounded,
            ticks,
            divider,
            words: ticks.pack(),
            granularity: divider.saturating_sub(1),
        });
    }
    Err(TimingError::TimingUnsatisfiable)
}

fn to_ticks(ps: u32, tick: u64) -> u32 {
    let ticks = u64::from(ps).div_ceil(tick.max(1));
    u32::try_from(ticks).unwrap_or(u32::MAX)
}

/// Apply the ordering rules at one tick length; `None` if a field overflows.
fn ticks_for(rounded: &TimingRequirement, tick: u64) -> Option<TimingTicks> {
    let mut t = TimingTicks {
        cs_on: to_ticks(rounded.cs_on_time, tick),
        cs_off: to_ticks(rounded.cs_off_time, tick),
        we_on: to_ticks(rounded.we_on_time, tick),
        we_off: to_ticks(rounded.we_off_time, tick),
        we_cycle: to_ticks(rounded.we_cycle_time, tick),
        re_on: to_ticks(rounded.re_on_time, tick),
        re_off: to_ticks(rounded.re_off_time, tick),
        re_cycle: to_ticks(rounded.re_cycle_time, tick),
        access: to_ticks(rounded.access_time, tick),
        cs_pulse: to_ticks(rounded.cs_pulse_width, tick),
    };

    if t.we_off <= t.we_on {
        t.we_off = t.we_on.saturating_add(1);
    }
    if t.re_off <= t.re_on {
        t.re_off = t.re_on.saturating_add(1);
    }
    if t.cs_off <= t.cs_on {
        t.cs_off = t.cs_on.saturating_add(1);
    }
    t.cs_off = t.cs_off.max(t.we_off).max(t.re_off);
    if t.access <= t.re_on {
        t.access = t.re_on.saturating_add(1);
    }
    t.we_cycle = t.we_cycle.max(t.we_off);
    t.re_cycle = t.re_cycle.max(t.re_off);

    t.fits().then_some(t)
}

/// A timing requirement together with its cached solution.
///
/// Changing the requirement drops the cached solution; the next
/// [`InterfaceTimings::solve`] recomputes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterfaceTimings {
    requirement: TimingRequirement,
    solved: Option<SolvedTiming>,
}

impl InterfaceTimings {
    /// Wrap a requirement; nothing is solved yet.
    pub fn new(requirement: TimingRequirement) -> Self {
        Self {
            requirement,
            solved: None,
        }
    }

    /// Current requirement.
    pub fn requirement(&self) -> &TimingRequirement {
        &self.requirement
    }

    /// Replace the requirement and invalidate the cached solution.
    pub fn set(&mut self, requirement: TimingRequirement) {
        self.requirement = requirement;
        self.solved = None;
    }

    /// Returns `true` once a solution is cached.
    pub fn converted(&self) -> bool {
        self.solved.is_some()
    }

    /// Cached solution, if any.
    pub fn solved(&self) -> Option<&SolvedTiming> {
        self.solved.as_ref()
    }

    /// Solve (or reuse the cached solution) for `clock`.
    pub fn solve(&mut self, clock: &ClockContext) -> Result<SolvedTiming, TimingError> {
        if let Some(solved) = self.solved {
            return Ok(solved);
        }
        let solved = solve(&self.requirement, clock)?;
        self.solved = Some(solved);
        Ok(solved)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Nokia N8x0 Blizzard timings.
    fn n8x0() -> TimingRequirement {
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

    fn clock(period_ps: u32) -> ClockContext {
        ClockContext::from_period_ps(period_ps).unwrap()
    }

    #[test]
    fn test_slow_clock_uses_divider_one() {
        let solved = solve(&n8x0(), &clock(20_000)).unwrap();
        assert_eq!(solved.divider, 1);
        assert_eq!(solved.words(), [0x0210_8420, 0x0080_0082, 0]);
    }

    #[test]
    fn test_fast_clock_falls_back_to_divider_two() {
        // At 500 ps we_on needs 18 ticks, which overflows the 4-bit field.
        let solved = solve(&n8x0(), &clock(500)).unwrap();
        assert_eq!(solved.divider, 2);
        assert_eq!(solved.words(), [0x1B94_A640, 0x06C0_0924, 1]);
        assert_eq!(solved.rounded.we_on_time, 9_000);
    }

    #[test]
    fn test_unsatisfiable_when_no_divider_fits() {
        assert_eq!(
            solve(&n8x0(), &clock(100)),
            Err(TimingError::TimingUnsatisfiable)
        );
    }

    #[test]
    fn test_max_divider_one_refuses_fallback() {
        let clk = clock(500).with_max_divider(1);
        assert_eq!(solve(&n8x0(), &clk), Err(TimingError::TimingUnsatisfiable));
    }

    #[test]
    fn test_we_off_bumped_past_we_on() {
        let req = TimingRequirement {
            we_on_time: 9_000,
            we_off_time: 18_000,
            ..TimingRequirement::default()
        };
        let solved = solve(&req, &clock(20_000)).unwrap();
        // Both round to one tick; off must follow on.
        assert_eq!((solved.ticks.we_on, solved.ticks.we_off), (1, 2));
        assert_eq!(solved.rounded.we_off_time, 20_000);
    }

    #[test]
    fn test_cs_off_covers_strobes() {
        let req = TimingRequirement {
            cs_off_time: 1_000,
            re_on_time: 40_000,
            re_off_time: 100_000,
            ..TimingRequirement::default()
        };
        let solved = solve(&req, &clock(20_000)).unwrap();
        assert_eq!(solved.ticks.re_off, 5);
        assert_eq!(solved.ticks.cs_off, 5);
        // access <= re_on is bumped to re_on + 1.
        assert_eq!(solved.ticks.access, 3);
        assert_eq!(solved.ticks.re_cycle, 5);
    }

    #[test]
    fn test_zero_requirement_produces_minimal_strobes() {
        let solved = solve(&TimingRequirement::default(), &clock(20_000)).unwrap();
        let t = solved.ticks;
        assert_eq!((t.we_off, t.re_off, t.cs_off, t.access), (1, 1, 1, 1));
        assert_eq!((t.we_cycle, t.re_cycle, t.cs_pulse), (1, 1, 0));
    }

    #[test]
    fn test_unpack_inverts_pack() {
        let solved = solve(&n8x0(), &clock(500)).unwrap();
        assert_eq!(TimingTicks::unpack(solved.words), solved.ticks);
    }

    #[test]
    fn test_cache_invalidated_on_set() {
        let mut timings = InterfaceTimings::new(n8x0());
        assert!(!timings.converted());
        timings.solve(&clock(20_000)).unwrap();
        assert!(timings.converted());

        timings.set(TimingRequirement::default());
        assert!(!timings.converted());
        assert_eq!(timings.solved(), None);
    }
}
