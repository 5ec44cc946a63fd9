use crate::hal;
use crate::hal_ext::exti::{Edge, Exti};
use super::ButtonPin;

/// User button generating interrupts on EXTI0
pub struct Button {
    /// Kept to hold the pin in input mode
    _pin: ButtonPin,
    exti: Exti<0>,
}

impl Button {
    pub fn new(
        pin: ButtonPin,
        exti: hal::pac::EXTI,
        syscfg: &mut hal::pac::SYSCFG,
        edge: Edge,
        rcc: &mut hal::rcc::Rcc,
    ) -> Self {
        let exti = Exti::new(exti, syscfg, edge, rcc);
        Self { _pin: pin, exti }
    }

    /// Acknowledge the interrupt, must be called in EXTI0_1 handler
    ///
    /// Returns `false` if the interrupt has not been raised by the button.
    pub fn clear(&mut self) -> bool {
        self.exti.clear_pending()
    }
}
