use crate::hal;

/// Signal edge that raises an interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Edge {
    Rising,
    Falling,
    Both,
}

impl Edge {
    pub const fn rising(&self) -> bool {
        matches!(self, Self::Rising | Self::Both)
    }

    pub const fn falling(&self) -> bool {
        matches!(self, Self::Falling | Self::Both)
    }
}

/// External interrupt line connected to GPIO port A
///
/// Takes ownership of the whole EXTI peripheral as only a single line is in use.
pub struct Exti<const LINE: u8> {
    exti: hal::pac::EXTI,
}

impl<const LINE: u8> Exti<LINE> {
    const MASK: u32 = 1 << LINE;

    /// Route the pin to the line and unmask the interrupt for given edge
    pub fn new(
        exti: hal::pac::EXTI,
        syscfg: &mut hal::pac::SYSCFG,
        edge: Edge,
        _rcc: &mut hal::rcc::Rcc,
    ) -> Self {
        // Only lines 0-3 are selected in EXTICR1
        assert!(LINE < 4);

        // SYSCFG clock is not managed by HAL
        let rcc_regs = unsafe { &*hal::pac::RCC::ptr() };
        rcc_regs.apb2enr.modify(|_, w| w.syscfgen().set_bit());

        // Port A is 0b0000
        syscfg.exticr1.modify(|r, w| unsafe { w.bits(r.bits() & !(0xf << (4 * LINE))) });

        let mut line = Self { exti };
        line.set_edge(edge);
        line.clear_pending();
        line.listen();
        line
    }

    pub fn set_edge(&mut self, edge: Edge) {
        self.exti.rtsr.modify(|r, w| unsafe { w.bits(with_bit(r.bits(), Self::MASK, edge.rising())) });
        self.exti.ftsr.modify(|r, w| unsafe { w.bits(with_bit(r.bits(), Self::MASK, edge.falling())) });
    }

    pub fn listen(&mut self) {
        self.exti.imr.modify(|r, w| unsafe { w.bits(r.bits() | Self::MASK) });
    }

    pub fn is_pending(&self) -> bool {
        self.exti.pr.read().bits() & Self::MASK != 0
    }

    /// Clear pending flag, returns `true` if it was set
    pub fn clear_pending(&mut self) -> bool {
        let pending = self.is_pending();
        // Write 1 to clear
        self.exti.pr.write(|w| unsafe { w.bits(Self::MASK) });
        pending
    }
}

const fn with_bit(bits: u32, mask: u32, set: bool) -> u32 {
    if set { bits | mask } else { bits & !mask }
}
