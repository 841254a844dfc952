//! Power-domain abstraction
//!
//! A display interface block sits in a power/clock domain that is shared with
//! other display hardware. Drivers take a reference on the domain before
//! touching registers and drop it when they are done; the provider keeps the
//! domain up while any reference is outstanding.

/// Reference-counted power and functional-clock domain.
///
/// Calls are expected to be balanced: every successful [`acquire`] is paired
/// with exactly one [`release`].
///
/// [`acquire`]: PowerResource::acquire
/// [`release`]: PowerResource::release
pub trait PowerResource {
    /// Error type
    type Error: core::fmt::Debug;

    /// Take a reference on the domain, powering it up if this is the first.
    fn acquire(&mut self) -> Result<(), Self::Error>;

    /// Drop a reference on the domain.
    fn release(&mut self) -> Result<(), Self::Error>;
}

/// Always-on domain: acquire and release are no-ops.
///
/// Useful on boards where the display interface clock is never gated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlwaysOn;

impl PowerResource for AlwaysOn {
    type Error = core::convert::Infallible;

    fn acquire(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<P: PowerResource + ?Sized> PowerResource for &mut P {
    type Error = P::Error;

    fn acquire(&mut self) -> Result<(), Self::Error> {
        (**self).acquire()
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        (**self).release()
    }
}
