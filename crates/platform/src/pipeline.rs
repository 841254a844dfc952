//! Display pipeline abstraction
//!
//! The display controller's overlay/manager block feeds pixels to the output
//! interfaces. A bus driver such as RFBI never composes pixels itself: it
//! pushes timings and manager configuration here, asks the pipeline to start
//! an update, and is told about frame completion through a handler it
//! registers under a [`HandlerKey`].

/// Video timing for one output, in pixels, lines and Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VideoMode {
    /// Pixel clock in Hz
    pub pixel_clock_hz: u32,
    /// Active width in pixels
    pub hactive: u16,
    /// Active height in lines
    pub vactive: u16,
    /// Horizontal front porch
    pub hfront_porch: u16,
    /// Horizontal sync length
    pub hsync_len: u16,
    /// Horizontal back porch
    pub hback_porch: u16,
    /// Vertical front porch
    pub vfront_porch: u16,
    /// Vertical sync length
    pub vsync_len: u16,
    /// Vertical back porch
    pub vback_porch: u16,
}

impl VideoMode {
    /// Number of pixels in the active area.
    #[must_use]
    pub fn active_pixels(&self) -> u32 {
        u32::from(self.hactive).saturating_mul(u32::from(self.vactive))
    }
}

/// Pad multiplexing of the LCD output pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoPadMode {
    /// Pins owned by the parallel RGB interface
    #[default]
    Rgb,
    /// Pins owned by the remote framebuffer interface
    Rfbi,
    /// Pins reset to their default function
    Reset,
}

/// Logical and pixel clock dividers for the LCD manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockInfo {
    /// Logic clock divider
    pub lck_div: u16,
    /// Pixel clock divider
    pub pck_div: u16,
}

impl Default for ClockInfo {
    fn default() -> Self {
        Self {
            lck_div: 1,
            pck_div: 1,
        }
    }
}

/// LCD manager configuration pushed by an output driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LcdManagerConfig {
    /// Pin ownership
    pub io_pad_mode: IoPadMode,
    /// Stop after each frame instead of free-running
    pub stall_mode: bool,
    /// FIFO handshake with the output
    pub fifo_handcheck: bool,
    /// Clock dividers
    pub clock_info: ClockInfo,
    /// Width of the video port in bits
    pub video_port_width: u8,
    /// Invert the LCD enable signal
    pub lcden_sig_polarity: bool,
}

/// Identifies a frame-done handler registration.
///
/// Drivers pick a key that is unique per instance (e.g. their chip-select
/// module) so the pipeline can refuse a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandlerKey(pub u32);

/// Display pipeline (overlay manager) interface
pub trait DisplayPipeline {
    /// Error type
    type Error: core::fmt::Debug;

    /// Register a frame-done handler under `key`.
    ///
    /// Fails if a handler is already registered for `key`.
    fn register_framedone_handler(&mut self, key: HandlerKey) -> Result<(), Self::Error>;

    /// Remove the handler registered under `key`.
    fn unregister_framedone_handler(&mut self, key: HandlerKey) -> Result<(), Self::Error>;

    /// Program output timings.
    fn set_timings(&mut self, mode: &VideoMode);

    /// Program the LCD manager.
    fn set_lcd_config(&mut self, config: &LcdManagerConfig) -> Result<(), Self::Error>;

    /// Enable the manager feeding this output.
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// Disable the manager feeding this output.
    fn disable(&mut self);

    /// Kick the manager to start streaming one frame.
    fn start_update(&mut self);
}

impl<P: DisplayPipeline + ?Sized> DisplayPipeline for &mut P {
    type Error = P::Error;

    fn register_framedone_handler(&mut self, key: HandlerKey) -> Result<(), Self::Error> {
        (**self).register_framedone_handler(key)
    }

    fn unregister_framedone_handler(&mut self, key: HandlerKey) -> Result<(), Self::Error> {
        (**self).unregister_framedone_handler(key)
    }

    fn set_timings(&mut self, mode: &VideoMode) {
        (**self).set_timings(mode);
    }

    fn set_lcd_config(&mut self, config: &LcdManagerConfig) -> Result<(), Self::Error> {
        (**self).set_lcd_config(config)
    }

    fn enable(&mut self) -> Result<(), Self::Error> {
        (**self).enable()
    }

    fn disable(&mut self) {
        (**self).disable();
    }

    fn start_update(&mut self) {
        (**self).start_update();
    }
}
