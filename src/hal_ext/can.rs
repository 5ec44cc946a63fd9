use bitfield::bitfield;
use embedded_hal::can::{ExtendedId, Id, StandardId};

use crate::protocol::bus::{Bus, Clock, RxError, Timeout, TxError};
use crate::protocol::catalog::Frame;

/// Non-blocking access to a CAN controller
pub trait CanDriver {
    /// Place frame in a free transmit mailbox
    ///
    /// May return a lower priority pending frame that has been removed to make space.
    fn try_transmit(&mut self, frame: &Frame) -> nb::Result<Option<Frame>, TxError>;

    /// Take the oldest frame from the receive FIFO
    fn try_receive(&mut self) -> nb::Result<Frame, RxError>;
}

impl<I: bxcan::Instance> CanDriver for bxcan::Can<I> {
    fn try_transmit(&mut self, frame: &Frame) -> nb::Result<Option<Frame>, TxError> {
        let raw = to_bxcan(frame).ok_or(nb::Error::Other(TxError::InvalidFrame))?;
        match self.transmit(&raw) {
            Ok(status) => Ok(status.dequeued_frame().and_then(from_bxcan)),
            Err(nb::Error::WouldBlock) => Err(nb::Error::WouldBlock),
            Err(nb::Error::Other(e)) => match e {},
        }
    }

    fn try_receive(&mut self) -> nb::Result<Frame, RxError> {
        match self.receive() {
            Ok(raw) => {
                if raw.is_remote_frame() {
                    defmt::debug!("Rx remote frame, dlc={=u8}", raw.dlc());
                }
                from_bxcan(&raw).ok_or(nb::Error::Other(RxError::Bus))
            },
            Err(nb::Error::WouldBlock) => Err(nb::Error::WouldBlock),
            Err(nb::Error::Other(_overrun)) => {
                defmt::warn!("Rx FIFO overrun");
                Err(nb::Error::Other(RxError::Bus))
            },
        }
    }
}

fn to_bxcan(frame: &Frame) -> Option<bxcan::Frame> {
    let id: bxcan::Id = match frame.id() {
        Id::Standard(id) => bxcan::StandardId::new(id.as_raw())?.into(),
        Id::Extended(id) => bxcan::ExtendedId::new(id.as_raw())?.into(),
    };
    Some(bxcan::Frame::new_data(id, bxcan::Data::new(frame.data())?))
}

/// Remote frames are converted to frames with empty payload
fn from_bxcan(raw: &bxcan::Frame) -> Option<Frame> {
    let id: Id = match raw.id() {
        bxcan::Id::Standard(id) => StandardId::new(id.as_raw())?.into(),
        bxcan::Id::Extended(id) => ExtendedId::new(id.as_raw())?.into(),
    };
    let data = match raw.data() {
        Some(data) => &data[..],
        None => &[],
    };
    Frame::new(id, data)
}

/// [`Bus`] implementation on top of a non-blocking CAN driver
///
/// Driver calls are retried until they succeed or the [`Timeout`] expires, using
/// the clock to measure elapsed time.
///
/// The single-shot hint of a frame is not passed to the controller: bxCAN can
/// only disable automatic retransmission for all mailboxes at once.
pub struct CanBus<C, K> {
    can: C,
    clock: K,
}

impl<C: CanDriver, K: Clock> CanBus<C, K> {
    /// Wrap a driver that has already been configured and enabled
    pub fn new(can: C, clock: K) -> Self {
        Self { can, clock }
    }
}

impl<C: CanDriver, K: Clock> Bus for CanBus<C, K> {
    fn transmit(&mut self, frame: &Frame, timeout: Timeout) -> Result<(), TxError> {
        let start = self.clock.now_ms();
        loop {
            match self.can.try_transmit(frame) {
                Ok(None) => return Ok(()),
                Ok(Some(displaced)) => {
                    // Lower priority frame has been removed from a mailbox to make space
                    defmt::warn!("Tx dropped pending frame: {}", displaced);
                    return Ok(());
                },
                Err(nb::Error::WouldBlock) => {
                    if timeout.expired(start, self.clock.now_ms()) {
                        return Err(TxError::Timeout);
                    }
                },
                Err(nb::Error::Other(e)) => {
                    defmt::error!("Tx driver error: {}", e);
                    return Err(e);
                },
            }
        }
    }

    fn receive(&mut self, timeout: Timeout) -> Result<Frame, RxError> {
        let start = self.clock.now_ms();
        loop {
            match self.can.try_receive() {
                Ok(frame) => return Ok(frame),
                Err(nb::Error::WouldBlock) => {
                    if timeout.expired(start, self.clock.now_ms()) {
                        return Err(RxError::Timeout);
                    }
                },
                Err(nb::Error::Other(e)) => return Err(e),
            }
        }
    }
}

bitfield! {
    /// Value of the bxCAN bit timing register (CAN_BTR)
    ///
    /// All fields hold the register encoding, i.e. the actual value minus one.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct BitTiming(u32);
    impl Debug;
    pub u16, brp, set_brp: 9, 0;
    pub u8, ts1, set_ts1: 19, 16;
    pub u8, ts2, set_ts2: 22, 20;
    pub u8, sjw, set_sjw: 25, 24;
}

impl BitTiming {
    const MAX_PRESCALER: u32 = 1024;
    const MAX_TS1: u32 = 16;
    const MAX_TS2: u32 = 8;
    const SJW: u32 = 1;

    /// Compute bit timing for given peripheral clock and bitrate
    ///
    /// Uses the largest number of time quanta per bit (16 down to 8) that divides
    /// the clock exactly, with sample point at 87.5% of the bit. Returns `None`
    /// if the bitrate cannot be reached exactly.
    pub fn for_bitrate(pclk_hz: u32, bitrate_hz: u32) -> Option<Self> {
        if bitrate_hz == 0 {
            return None;
        }
        let quanta = (8..=16u32).rev()
            .find(|tq| bitrate_hz.checked_mul(*tq).map_or(false, |f| pclk_hz % f == 0))?;
        let prescaler = pclk_hz / (bitrate_hz * quanta);
        let sample = quanta * 7 / 8;
        let ts1 = sample - 1;
        let ts2 = quanta - sample;

        if !(1..=Self::MAX_PRESCALER).contains(&prescaler)
            || !(1..=Self::MAX_TS1).contains(&ts1)
            || !(1..=Self::MAX_TS2).contains(&ts2) {
            return None;
        }

        let mut timing = Self(0);
        timing.set_brp((prescaler - 1) as u16);
        timing.set_ts1((ts1 - 1) as u8);
        timing.set_ts2((ts2 - 1) as u8);
        timing.set_sjw((Self::SJW - 1) as u8);
        Some(timing)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn prescaler(&self) -> u32 {
        self.brp() as u32 + 1
    }

    /// Number of time quanta in a bit, including the sync segment
    pub fn time_quanta(&self) -> u32 {
        1 + (self.ts1() as u32 + 1) + (self.ts2() as u32 + 1)
    }

    pub fn bitrate(&self, pclk_hz: u32) -> u32 {
        pclk_hz / (self.prescaler() * self.time_quanta())
    }
}

impl defmt::Format for BitTiming {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "BitTiming {{ brp: {=u16}, ts1: {=u8}, ts2: {=u8}, sjw: {=u8} }}",
            self.brp(), self.ts1(), self.ts2(), self.sjw());
    }
}
