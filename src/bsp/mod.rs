//! Board support package
//!
//! Code that builds on top of MCU-specific HAL (hal and hal_ext) to implement
//! support for the board and the peripherals located on it.

pub mod button;
pub mod can;

use crate::hal;
use hal::gpio;

/// Core clock
pub const SYSCLK_HZ: u32 = 48_000_000;
/// APB clock, feeds the CAN peripheral
pub const PCLK_HZ: u32 = 24_000_000;
/// External oscillator, used with the `crystal` feature
pub const CRYSTAL_HZ: u32 = 8_000_000;

pub type CanTx = gpio::gpiob::PB9<gpio::Alternate<gpio::AF4>>;
pub type CanRx = gpio::gpiob::PB8<gpio::Alternate<gpio::AF4>>;
pub type ButtonPin = gpio::gpioa::PA0<gpio::Input<gpio::PullDown>>;

/// Configure system clocks
///
/// With the `crystal` feature the 8 MHz HSE (bypass) is used as the source,
/// otherwise the internal 48 MHz oscillator.
pub fn clocks(rcc: hal::pac::RCC, flash: &mut hal::pac::FLASH) -> hal::rcc::Rcc {
    use hal::rcc::{RccExt, HSEBypassMode};
    use hal::time::Hertz;

    let clk_config = rcc
        .configure()
        .sysclk(Hertz(SYSCLK_HZ))
        .pclk(Hertz(PCLK_HZ));
    let clk_config = if cfg!(feature = "crystal") {
        clk_config.hse(Hertz(CRYSTAL_HZ), HSEBypassMode::Bypassed)
    } else {
        clk_config.hsi48()
    };
    clk_config.freeze(flash)
}
