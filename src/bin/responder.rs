#![no_main]
#![no_std]

use panic_probe as _;
use defmt_rtt as _;
use stm32f0xx_hal as hal;
use canlink as lib;

#[rtic::app(device = crate::hal::pac)]
mod app {
    use cortex_m::interrupt::free as ifree;
    use super::hal;
    use hal::prelude::*;

    use super::lib;
    use lib::bsp;
    use lib::config::CONFIG;
    use lib::hal_ext::can::CanBus;
    use lib::protocol::Responder;

    type Bus = CanBus<bsp::can::Can, fn() -> u32>;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        bus: Bus,
        responder: Responder<fn() -> u32>,
    }

    #[monotonic(binds = SysTick, default = true)]
    type Mono = systick_monotonic::Systick<MONO_HZ>;
    pub const MONO_HZ: u32 = 1000;

    fn now_ms() -> u32 {
        monotonics::now().ticks() as u32
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        let core = cx.core;
        let mut dev = cx.device;

        let mut rcc = bsp::clocks(dev.RCC, &mut dev.FLASH);

        defmt::info!("Liftoff! responder {=str} ({=str})",
            lib::build_info::PKG_VERSION,
            lib::build_info::GIT_VERSION.unwrap_or("unknown"));

        let gpiob = dev.GPIOB.split(&mut rcc);
        let can_rx = ifree(|cs| gpiob.pb8.into_alternate_af4(cs));
        let can_tx = ifree(|cs| gpiob.pb9.into_alternate_af4(cs));

        // Frames are polled from idle, no CAN interrupts
        let can = bsp::can::init(dev.CAN, (can_tx, can_rx), &CONFIG.bus, &mut rcc);

        let local = Local {
            bus: CanBus::new(can, now_ms),
            // Uptime in milliseconds is sent as the data value
            responder: Responder::new(now_ms, CONFIG.tx_timeout_ms),
        };

        let mono = systick_monotonic::Systick::new(core.SYST, bsp::SYSCLK_HZ);

        (Shared {}, local, init::Monotonics(mono))
    }

    #[idle(local = [bus, responder])]
    fn idle(cx: idle::Context) -> ! {
        cx.local.responder.run(cx.local.bus)
    }
}
