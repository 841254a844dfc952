//! RFBI error types
//!
//! One enum per concern, wrapped by [`RfbiError`] so `?` composes across the
//! formatter, solver, transfer engine and controller.

/// Bus format rejected by the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pixel depth or line count not supported by the hardware
    UnsupportedFormat,
    /// Pixel depth is not a 1:1, 2:1, 3:1 or 3:2 multiple of the line count
    UnsupportedRatio,
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnsupportedFormat => write!(f, "unsupported bit depth or data line count"),
            Self::UnsupportedRatio => write!(f, "unsupported bit depth to data line ratio"),
        }
    }
}

/// Timing requirement cannot be programmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimingError {
    /// No divider makes every field fit its register width
    TimingUnsatisfiable,
    /// Interface clock rate is zero or too fast to give a whole-ps period
    InvalidClock,
}

#[cfg(feature = "std")]
impl std::error::Error for TimingError {}

impl core::fmt::Display for TimingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TimingUnsatisfiable => write!(f, "timing requirement does not fit any clock divider"),
            Self::InvalidClock => write!(f, "invalid interface clock rate"),
        }
    }
}

/// Raw streaming or frame transfer refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// A frame transfer is still waiting for frame-done
    TransferAlreadyPending,
    /// Odd byte count on a 16-line bus
    MisalignedLength,
    /// Raw streaming is only defined for 8 and 16 data lines
    UnsupportedParallelMode,
    /// The bus has not been configured yet
    NotConfigured,
    /// Frame transfer requested while the bus is not enabled
    NotEnabled,
}

#[cfg(feature = "std")]
impl std::error::Error for TransferError {}

impl core::fmt::Display for TransferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TransferAlreadyPending => write!(f, "frame transfer already pending"),
            Self::MisalignedLength => write!(f, "buffer length not a multiple of the bus width"),
            Self::UnsupportedParallelMode => write!(f, "raw streaming not supported in this parallel mode"),
            Self::NotConfigured => write!(f, "bus not configured"),
            Self::NotEnabled => write!(f, "bus not enabled"),
        }
    }
}

/// A collaborator refused a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResourceError {
    /// Power domain could not be acquired
    PowerResourceUnavailable,
    /// Frame-done handler already registered or refused by the pipeline
    HandlerRegistrationFailed,
    /// Display manager rejected its configuration or failed to enable
    ManagerEnableFailed,
}

#[cfg(feature = "std")]
impl std::error::Error for ResourceError {}

impl core::fmt::Display for ResourceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PowerResourceUnavailable => write!(f, "power resource unavailable"),
            Self::HandlerRegistrationFailed => write!(f, "frame-done handler registration failed"),
            Self::ManagerEnableFailed => write!(f, "display manager enable failed"),
        }
    }
}

/// Any RFBI driver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RfbiError {
    /// Bus format error
    Config(ConfigError),
    /// Timing error
    Timing(TimingError),
    /// Transfer error
    Transfer(TransferError),
    /// Resource error
    Resource(ResourceError),
}

#[cfg(feature = "std")]
impl std::error::Error for RfbiError {}

impl core::fmt::Display for RfbiError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Timing(e) => write!(f, "timing: {e}"),
            Self::Transfer(e) => write!(f, "transfer: {e}"),
            Self::Resource(e) => write!(f, "resource: {e}"),
        }
    }
}

impl From<ConfigError> for RfbiError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<TimingError> for RfbiError {
    fn from(e: TimingError) -> Self {
        Self::Timing(e)
    }
}

impl From<TransferError> for RfbiError {
    fn from(e: TransferError) -> Self {
        Self::Transfer(e)
    }
}

impl From<ResourceError> for RfbiError {
    fn from(e: ResourceError) -> Self {
        Self::Resource(e)
    }
}
