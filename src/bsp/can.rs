use bxcan::filter::Mask32;

use crate::hal;
use crate::config::BusConfig;
use crate::utils::InfallibleResult;
use super::{CanRx, CanTx, PCLK_HZ};

pub type Can = bxcan::Can<hal::can::CanInstance<CanTx, CanRx>>;

/// Configure the CAN peripheral and join the bus
///
/// All frames are accepted into FIFO 0. Panics if the configured bitrate cannot
/// be generated from the peripheral clock.
pub fn init(
    can: hal::pac::CAN,
    (tx, rx): (CanTx, CanRx),
    config: &BusConfig,
    rcc: &mut hal::rcc::Rcc,
) -> Can {
    let timing = config.bit_timing(PCLK_HZ)
        .expect("Bitrate not reachable with current clock");
    defmt::debug!("CAN {} {}", config.bitrate, timing);

    let instance = hal::can::CanInstance::new(can, tx, rx, rcc);
    let mut can = bxcan::Can::builder(instance)
        .set_bit_timing(timing.bits())
        .set_loopback(config.loopback)
        .set_silent(config.silent)
        .leave_disabled();

    can.modify_filters().enable_bank(0, Mask32::accept_all());
    defmt::info!("Driver installed");

    // Waits for 11 recessive bits
    nb::block!(can.enable_non_blocking()).infallible();
    defmt::info!("Driver started");

    can
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal_ext::can::CanBus;
    use crate::protocol::Bus;

    fn assert_bus<B: Bus>() {}

    #[test]
    fn board_driver_is_a_bus() {
        assert_bus::<CanBus<Can, fn() -> u32>>();
    }
}
