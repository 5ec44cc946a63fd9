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
    use lib::bsp::{self, button::Button};
    use lib::config::CONFIG;
    use lib::hal_ext::can::CanBus;
    use lib::protocol::{Mailbox, Trigger, Inbox, Transmitter, Controller};

    type Bus = CanBus<bsp::can::Can, fn() -> u32>;

    #[shared]
    struct Shared {
        bus: Bus,
    }

    #[local]
    struct Local {
        button: Button,
        trigger: Trigger<'static>,
        inbox: Inbox<'static>,
        transmitter: Transmitter,
        receiver: Controller,
    }

    #[monotonic(binds = SysTick, default = true)]
    type Mono = systick_monotonic::Systick<MONO_HZ>;
    pub const MONO_HZ: u32 = 1000;

    fn now_ms() -> u32 {
        // Millisecond ticks, wrap-around is handled by the protocol timeouts
        monotonics::now().ticks() as u32
    }

    #[init(local = [mailbox: Mailbox = Mailbox::new()])]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        let core = cx.core;
        let mut dev = cx.device;

        let mut rcc = bsp::clocks(dev.RCC, &mut dev.FLASH);

        defmt::info!("Liftoff! controller {=str} ({=str})",
            lib::build_info::PKG_VERSION,
            lib::build_info::GIT_VERSION.unwrap_or("unknown"));

        // Pinout
        let gpioa = dev.GPIOA.split(&mut rcc);
        let gpiob = dev.GPIOB.split(&mut rcc);
        let can_rx = ifree(|cs| gpiob.pb8.into_alternate_af4(cs));
        let can_tx = ifree(|cs| gpiob.pb9.into_alternate_af4(cs));
        let button = ifree(|cs| gpioa.pa0.into_pull_down_input(cs));

        // CAN with interrupt on each received frame
        let mut can = bsp::can::init(dev.CAN, (can_tx, can_rx), &CONFIG.bus, &mut rcc);
        can.enable_interrupt(bxcan::Interrupt::Fifo0MessagePending);
        let bus: Bus = CanBus::new(can, now_ms);

        // Command path: button interrupt -> mailbox -> transmitter in idle
        let (trigger, inbox) = cx.local.mailbox.split();
        let button = Button::new(button, dev.EXTI, &mut dev.SYSCFG, CONFIG.trigger.edge, &mut rcc);
        defmt::info!("Trigger on {} edge", CONFIG.trigger.edge);

        let shared = Shared {
            bus,
        };

        let local = Local {
            button,
            trigger,
            inbox,
            transmitter: Transmitter::new(CONFIG.tx_timeout_ms),
            receiver: Controller::new(),
        };

        let mono = systick_monotonic::Systick::new(core.SYST, bsp::SYSCLK_HZ);

        (shared, local, init::Monotonics(mono))
    }

    /// Button edge
    ///
    /// Must never block, a command that does not fit in the mailbox is dropped.
    #[task(binds = EXTI0_1, priority = 3, local = [button, trigger])]
    fn on_button(cx: on_button::Context) {
        if cx.local.button.clear() {
            cx.local.trigger.on_edge();
        }
    }

    /// Receive all frames waiting in FIFO 0
    #[task(binds = CEC_CAN, priority = 2, shared = [bus], local = [receiver])]
    fn can_rx(mut cx: can_rx::Context) {
        let receiver = cx.local.receiver;
        let n = cx.shared.bus.lock(|bus| receiver.drain(bus));
        if n == 0 {
            defmt::trace!("CAN interrupt without frames");
        }
    }

    /// Transmitter loop
    ///
    /// Sleeps until a command arrives, then holds the bus for a single transmission attempt.
    #[idle(shared = [bus], local = [inbox, transmitter])]
    fn idle(mut cx: idle::Context) -> ! {
        let inbox = cx.local.inbox;
        let transmitter = cx.local.transmitter;
        loop {
            let command = inbox.dequeue_blocking(rtic::export::wfi);
            cx.shared.bus.lock(|bus| transmitter.handle(command, bus));
        }
    }
}
