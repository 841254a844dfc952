//! S1D13744 / S1D13745 ("Blizzard") register map
//!
//! Source: Epson S1D13744 and S1D13745 hardware functional specifications,
//! cross-checked against the Nokia N800/N810 board support code.
//!
//! # Access model
//!
//! Every register is addressed by a one-byte command on the RFBI command port
//! followed by the data bytes on the parameter port. Registers are 8 bits
//! wide; multi-byte writes auto-increment the address, which is how the
//! 18-byte update window is loaded in one transaction starting at
//! [`REG_INPUT_WIN_X_START_0`].
//!
//! Register access must happen with the bus in 8-line mode. Pixel data goes
//! over 16 lines.

// ---------------------------------------------------------------------------
// Register addresses
// ---------------------------------------------------------------------------

/// Revision code. Bits\[7:2\] identify the product, bits\[1:0\] the revision.
pub const REG_REV_CODE: u8 = 0x00;
/// Configuration readback. Bits\[2:0\] reflect the CNF strap pins.
pub const REG_CONFIG: u8 = 0x02;
/// PLL divider. Bit 7 reads back PLL lock.
pub const REG_PLL_DIV: u8 = 0x04;
/// PLL lock range
pub const REG_PLL_LOCK_RANGE: u8 = 0x06;
/// PLL clock synthesis 0
pub const REG_PLL_CLOCK_SYNTH_0: u8 = 0x08;
/// PLL clock synthesis 1
pub const REG_PLL_CLOCK_SYNTH_1: u8 = 0x0a;
/// PLL mode. Bits\[1:0\] select the PLL operating mode.
pub const REG_PLL_MODE: u8 = 0x0c;
/// Clock source select
pub const REG_CLK_SRC: u8 = 0x0e;
/// Memory bank 0 activate
pub const REG_MEM_BANK0_ACTIVATE: u8 = 0x10;
/// Memory bank 0 status
pub const REG_MEM_BANK0_STATUS: u8 = 0x14;
/// Panel configuration
pub const REG_PANEL_CONFIGURATION: u8 = 0x28;
/// Horizontal display width
pub const REG_HDISP: u8 = 0x2a;
/// Horizontal non-display period
pub const REG_HNDP: u8 = 0x2c;
/// Vertical display height, low byte
pub const REG_VDISP0: u8 = 0x2e;
/// Vertical display height, high byte
pub const REG_VDISP1: u8 = 0x30;
/// Vertical non-display period
pub const REG_VNDP: u8 = 0x32;
/// Horizontal sync width
pub const REG_HSW: u8 = 0x34;
/// Vertical sync width
pub const REG_VSW: u8 = 0x38;
/// Display mode
pub const REG_DISPLAY_MODE: u8 = 0x68;
/// First byte of the input/output window block (18 bytes, auto-increment)
pub const REG_INPUT_WIN_X_START_0: u8 = 0x6c;
/// Data source select
pub const REG_DATA_SOURCE_SELECT: u8 = 0x8e;
/// Display memory data port
pub const REG_DISP_MEM_DATA_PORT: u8 = 0x90;
/// Display memory read address 0
pub const REG_DISP_MEM_READ_ADDR0: u8 = 0x92;
/// Power save. Bits\[1:0\] = 0b11 enters sleep.
pub const REG_POWER_SAVE: u8 = 0xe6;
/// Non-display period control / status
pub const REG_NDISP_CTRL_STATUS: u8 = 0xe8;

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// `REG_PLL_DIV` bit 7: PLL locked (also set once a bootloader brought the
/// chip up)
pub const PLL_DIV_LOCKED: u8 = 0x80;

/// `REG_PLL_MODE` / `REG_POWER_SAVE` two-bit mode field
pub const MODE_FIELD_MASK: u8 = 0x03;

/// `REG_PLL_MODE` bits\[1:0\]: PLL enabled
pub const PLL_MODE_ENABLED: u8 = 0x01;

/// `REG_POWER_SAVE` bits\[1:0\]: sleep
pub const POWER_SAVE_SLEEP: u8 = 0x03;

/// `REG_DISPLAY_MODE`: normal display from memory
pub const DISPLAY_MODE_NORMAL: u8 = 0x01;

/// `REG_REV_CODE` product-code mask
pub const REV_PRODUCT_MASK: u8 = 0xfc;
/// `REG_REV_CODE` product code of the S1D13744
pub const REV_PRODUCT_S1D13744: u8 = 0x9c;
/// `REG_REV_CODE` product code of the S1D13745
pub const REV_PRODUCT_S1D13745: u8 = 0xa4;
/// `REG_REV_CODE` revision mask
pub const REV_REVISION_MASK: u8 = 0x03;
/// `REG_CONFIG` strap-pin mask
pub const CONFIG_STRAP_MASK: u8 = 0x07;

// ---------------------------------------------------------------------------
// Window block: colour format and data source selectors
// ---------------------------------------------------------------------------

/// Input colour format RGB 5-6-5
pub const COLOR_RGB565: u8 = 0x01;
/// Input colour format YUV 4:2:0
pub const COLOR_YUV420: u8 = 0x09;

/// S1D13745: write to the LCD background plane
pub const SRC_WRITE_LCD_BACKGROUND: u8 = 0x00;
/// Write to the LCD, discarding overlay contents
pub const SRC_WRITE_LCD_DESTRUCTIVE: u8 = 0x01;
/// S1D13745: enable the overlay plane
pub const SRC_ENABLE_OVERLAY: u8 = 0x04;
/// S1D13745: disable the overlay plane
pub const SRC_DISABLE_OVERLAY: u8 = 0x05;
/// S1D13744: write to the LCD
pub const SRC_WRITE_LCD: u8 = 0x00;

/// Length of the window block written at `REG_INPUT_WIN_X_START_0`
pub const WINDOW_PAYLOAD_LEN: usize = 18;
