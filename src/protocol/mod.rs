//! Command/response protocol between the controller and the responder
//!
//! The controller turns button presses into commands passed through a single-slot
//! [`Mailbox`] to the [`Transmitter`], which sends one catalog message per command.
//! The [`Responder`] answers each command, the [`Controller`] receiver only reports
//! the answers. All parts are generic over the [`Bus`] so that they can run with
//! the real CAN driver as well as with a mock in tests.

/// Transport abstraction with timeouts
pub mod bus;
/// Messages understood by both nodes
pub mod catalog;
/// Command handoff from interrupt to transmitter
pub mod mailbox;
/// Identifier based dispatch of received frames
pub mod receiver;
/// Command transmission
pub mod transmitter;

pub use bus::{Bus, Clock, Timeout, TxError, RxError};
pub use catalog::{Frame, MessageId, Role};
pub use mailbox::{Command, Mailbox, Trigger, Inbox};
pub use receiver::{Controller, Responder};
pub use transmitter::Transmitter;
