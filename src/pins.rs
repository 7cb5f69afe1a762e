//! GPIO / peripheral pin assignments for the radar bridge board.
//!
//! Single source of truth: the sensing engine's [`HardwareConfig`] and the
//! status LED driver both read from here.

// ---------------------------------------------------------------------------
// Radar front-end (SPI + control lines)
// ---------------------------------------------------------------------------

pub const RADAR_SPI_MOSI_GPIO: i32 = 11;
pub const RADAR_SPI_MISO_GPIO: i32 = 13;
pub const RADAR_SPI_CLK_GPIO: i32 = 12;
/// Chip select, driven HIGH when idle.
pub const RADAR_SPI_CS_GPIO: i32 = 10;
/// Active-low reset, driven HIGH after power-up.
pub const RADAR_RESET_GPIO: i32 = 14;
/// Enables the radar's LDO supply.
pub const RADAR_LDO_EN_GPIO: i32 = 5;
/// Data-ready interrupt, input with pull-down.
pub const RADAR_IRQ_GPIO: i32 = 4;

/// Radar SPI clock (25 MHz).
pub const RADAR_SPI_FREQ_HZ: u32 = 25_000_000;

// ---------------------------------------------------------------------------
// Status LED (discrete RGB, active HIGH)
// ---------------------------------------------------------------------------

pub const LED_R_GPIO: i32 = 1;
pub const LED_G_GPIO: i32 = 2;
pub const LED_B_GPIO: i32 = 3;

/// Wiring handed to the sensing engine's `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareConfig {
    pub spi_mosi: i32,
    pub spi_miso: i32,
    pub spi_clk: i32,
    pub spi_cs: i32,
    pub reset: i32,
    pub ldo_en: i32,
    pub irq: i32,
    pub spi_freq_hz: u32,
}

impl HardwareConfig {
    /// Pin-out of the production board.
    pub const fn board() -> Self {
        Self {
            spi_mosi: RADAR_SPI_MOSI_GPIO,
            spi_miso: RADAR_SPI_MISO_GPIO,
            spi_clk: RADAR_SPI_CLK_GPIO,
            spi_cs: RADAR_SPI_CS_GPIO,
            reset: RADAR_RESET_GPIO,
            ldo_en: RADAR_LDO_EN_GPIO,
            irq: RADAR_IRQ_GPIO,
            spi_freq_hz: RADAR_SPI_FREQ_HZ,
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self::board()
    }
}
