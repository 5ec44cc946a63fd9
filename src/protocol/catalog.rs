use defmt::Format;
use embedded_hal::can::{Id, StandardId};
use heapless::Vec;
use static_assertions as sa;

/// Maximum number of data bytes in a classic CAN frame
pub const MAX_PAYLOAD: usize = 8;

/// Length of the [`MessageId::ResponderData`] payload
pub const DATA_LEN: usize = 4;

sa::const_assert!(DATA_LEN <= MAX_PAYLOAD);
sa::const_assert!(DATA_LEN <= core::mem::size_of::<u32>());

/// One of the two nodes taking part in the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Role {
    /// Issues commands, triggered by the button
    Controller,
    /// Answers commands
    Responder,
}

/// Identifiers of all messages understood on the bus
///
/// Controller and responder use separate identifier ranges; the identifier
/// fully determines the payload layout.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum MessageId {
    ControllerStop = 0x0a0,
    ControllerStart = 0x0a1,
    ControllerPing = 0x0a2,
    ResponderStop = 0x0b0,
    ResponderData = 0x0b1,
    ResponderPing = 0x0b2,
}

impl MessageId {
    pub const ALL: [MessageId; 6] = [
        Self::ControllerStop,
        Self::ControllerStart,
        Self::ControllerPing,
        Self::ResponderStop,
        Self::ResponderData,
        Self::ResponderPing,
    ];

    pub const fn raw(self) -> u16 {
        self as u16
    }

    pub const fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0x0a0 => Some(Self::ControllerStop),
            0x0a1 => Some(Self::ControllerStart),
            0x0a2 => Some(Self::ControllerPing),
            0x0b0 => Some(Self::ResponderStop),
            0x0b1 => Some(Self::ResponderData),
            0x0b2 => Some(Self::ResponderPing),
            _ => None,
        }
    }

    pub const fn payload_len(self) -> usize {
        match self {
            Self::ResponderData => DATA_LEN,
            _ => 0,
        }
    }

    /// Only the ping is sent without automatic retransmission
    pub const fn single_shot(self) -> bool {
        matches!(self, Self::ControllerPing)
    }

    pub fn id(self) -> Id {
        // All catalog identifiers fit in 11 bits (checked in tests)
        match StandardId::new(self.raw()) {
            Some(id) => Id::Standard(id),
            None => unreachable!(),
        }
    }
}

/// Received identifier that is not part of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownId(pub Id);

impl Format for UnknownId {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", RawId(self.0))
    }
}

/// Log any identifier with its format
struct RawId(Id);

impl Format for RawId {
    fn format(&self, f: defmt::Formatter) {
        match self.0 {
            Id::Standard(id) => defmt::write!(f, "std:{=u16:#x}", id.as_raw()),
            Id::Extended(id) => defmt::write!(f, "ext:{=u32:#x}", id.as_raw()),
        }
    }
}

impl TryFrom<Id> for MessageId {
    type Error = UnknownId;

    fn try_from(id: Id) -> Result<Self, Self::Error> {
        match id {
            Id::Standard(raw) => Self::from_raw(raw.as_raw()).ok_or(UnknownId(id)),
            Id::Extended(_) => Err(UnknownId(id)),
        }
    }
}

/// Frame as seen by the protocol logic
///
/// Payload is stored inline, so frames never allocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    id: Id,
    data: Vec<u8, MAX_PAYLOAD>,
    single_shot: bool,
}

impl Frame {
    /// Create frame with arbitrary identifier, `None` if data does not fit
    pub fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        Some(Self {
            id: id.into(),
            data: Vec::from_slice(data).ok()?,
            single_shot: false,
        })
    }

    /// Create catalog message with zeroed payload of the proper length
    pub fn message(id: MessageId) -> Self {
        let mut data = Vec::new();
        // Cannot fail, payload_len <= MAX_PAYLOAD
        data.resize_default(id.payload_len()).ok();
        Self {
            id: id.id(),
            data,
            single_shot: id.single_shot(),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Catalog identifier of this frame
    pub fn kind(&self) -> Result<MessageId, UnknownId> {
        MessageId::try_from(self.id)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Modify payload in place, the length stays unchanged
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn dlc(&self) -> usize {
        self.data.len()
    }

    pub fn is_single_shot(&self) -> bool {
        self.single_shot
    }
}

impl Format for Frame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Frame {{ id: {}, data: {=[u8]:x}, single_shot: {=bool} }}",
            RawId(self.id), self.data(), self.single_shot);
    }
}

/// Encoding of the [`MessageId::ResponderData`] payload
pub mod data {
    use super::DATA_LEN;

    /// Write value as little-endian bytes
    pub fn encode(value: u32, buf: &mut [u8]) {
        buf[..DATA_LEN].copy_from_slice(&value.to_le_bytes());
    }

    /// Decode up to 4 little-endian bytes, bytes past the 4th are ignored
    pub fn decode(bytes: &[u8]) -> u32 {
        bytes.iter()
            .take(DATA_LEN)
            .enumerate()
            .fold(0, |acc, (i, &b)| acc | (b as u32) << (8 * i))
    }
}
