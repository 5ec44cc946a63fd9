use defmt::Format;

use super::bus::{Bus, Clock, RxError, Timeout, TxError};
use super::catalog::{data, Frame, MessageId, Role, UnknownId};

/// Reason for ignoring a received frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Rejected {
    /// Identifier outside of the catalog
    Unknown(UnknownId),
    /// Catalog message that this role never receives
    NotForRole(MessageId),
}

/// What the controller learned from a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Reception {
    PingResponse,
    Data(u32),
    StopResponse,
    Rejected(Rejected),
}

/// What the responder did with a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Response {
    Sent(MessageId),
    Failed(MessageId, TxError),
    Rejected(Rejected),
}

fn reject(role: Role, rejected: Rejected) -> Rejected {
    defmt::error!("{}: invalid identifier {}", role, rejected);
    rejected
}

/// Controller side receiver, only reports what arrives
#[derive(Default)]
pub struct Controller;

impl Controller {
    pub const fn new() -> Self {
        Self
    }

    pub fn on_frame(&mut self, frame: &Frame) -> Reception {
        let id = match frame.kind() {
            Ok(id) => id,
            Err(unknown) => return Reception::Rejected(reject(Role::Controller, Rejected::Unknown(unknown))),
        };

        match id {
            MessageId::ResponderPing => {
                defmt::info!("Ping response");
                Reception::PingResponse
            },
            MessageId::ResponderData => {
                let value = data::decode(frame.data());
                defmt::info!("Received data value {=u32}", value);
                Reception::Data(value)
            },
            MessageId::ResponderStop => {
                defmt::info!("Stop response");
                Reception::StopResponse
            },
            MessageId::ControllerStop | MessageId::ControllerStart | MessageId::ControllerPing => {
                Reception::Rejected(reject(Role::Controller, Rejected::NotForRole(id)))
            },
        }
    }

    /// Handle all frames that are already waiting, returns the number of frames handled
    pub fn drain<B: Bus>(&mut self, bus: &mut B) -> usize {
        let mut n = 0;
        loop {
            match bus.receive(Timeout::Poll) {
                Ok(frame) => {
                    self.on_frame(&frame);
                    n += 1;
                },
                Err(RxError::Timeout) => return n,
                Err(RxError::Bus) => defmt::warn!("Rx error, frames lost"),
            }
        }
    }
}

/// Responder side receiver that answers each command
///
/// The data frame is kept between requests and only its payload is rewritten.
pub struct Responder<K> {
    clock: K,
    timeout: Timeout,
    data: Frame,
}

impl<K: Clock> Responder<K> {
    /// Create responder sampling data from given clock
    pub fn new(clock: K, timeout_ms: u32) -> Self {
        Self {
            clock,
            timeout: Timeout::After(timeout_ms),
            data: Frame::message(MessageId::ResponderData),
        }
    }

    pub fn on_frame<B: Bus>(&mut self, frame: &Frame, bus: &mut B) -> Response {
        let id = match frame.kind() {
            Ok(id) => id,
            Err(unknown) => return Response::Rejected(reject(Role::Responder, Rejected::Unknown(unknown))),
        };

        match id {
            MessageId::ControllerPing => self.send(MessageId::ResponderPing, bus),
            MessageId::ControllerStart => {
                // Tick count stands in for sensor data
                let value = self.clock.now_ms();
                data::encode(value, self.data.data_mut());
                let response = self.send_data(bus);
                if let Response::Sent(_) = response {
                    defmt::info!("Transmitted data value {=u32}", value);
                }
                response
            },
            MessageId::ControllerStop => self.send(MessageId::ResponderStop, bus),
            MessageId::ResponderStop | MessageId::ResponderData | MessageId::ResponderPing => {
                Response::Rejected(reject(Role::Responder, Rejected::NotForRole(id)))
            },
        }
    }

    /// Receiver loop, never returns
    pub fn run<B: Bus>(&mut self, bus: &mut B) -> ! {
        loop {
            match bus.receive(Timeout::Never) {
                Ok(frame) => {
                    self.on_frame(&frame, bus);
                },
                Err(e) => defmt::warn!("Rx error: {}", e),
            }
        }
    }

    fn send<B: Bus>(&mut self, id: MessageId, bus: &mut B) -> Response {
        Self::transmit(id, &Frame::message(id), self.timeout, bus)
    }

    fn send_data<B: Bus>(&mut self, bus: &mut B) -> Response {
        Self::transmit(MessageId::ResponderData, &self.data, self.timeout, bus)
    }

    fn transmit<B: Bus>(id: MessageId, frame: &Frame, timeout: Timeout, bus: &mut B) -> Response {
        match bus.transmit(frame, timeout) {
            Ok(()) => {
                defmt::info!("Transmitted {}", id);
                Response::Sent(id)
            },
            Err(e) => {
                defmt::error!("{} failed: {}", id, e);
                Response::Failed(id, e)
            },
        }
    }
}
