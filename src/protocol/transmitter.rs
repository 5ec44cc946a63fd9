use defmt::Format;

use super::bus::{Bus, Timeout, TxError};
use super::catalog::{Frame, MessageId};
use super::mailbox::{Command, Inbox};

/// Result of handling a single command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum TxOutcome {
    Sent(MessageId),
    Failed(MessageId, TxError),
    /// Command has no message assigned
    Unmapped(Command),
}

/// Controller side command transmitter
///
/// Each command results in at most one transmission attempt; failed attempts
/// are only logged.
pub struct Transmitter {
    timeout: Timeout,
}

impl Transmitter {
    pub const fn new(timeout_ms: u32) -> Self {
        Self { timeout: Timeout::After(timeout_ms) }
    }

    /// Message sent for a given command
    pub const fn message(command: Command) -> Option<MessageId> {
        match command {
            Command::SendPing => Some(MessageId::ControllerPing),
            Command::SendStartCommand => Some(MessageId::ControllerStart),
            Command::SendStopCommand => Some(MessageId::ControllerStop),
            Command::RequestExit => None,
        }
    }

    /// Perform a single transmission for the command
    pub fn handle<B: Bus>(&self, command: Command, bus: &mut B) -> TxOutcome {
        let id = match Self::message(command) {
            Some(id) => id,
            None => {
                defmt::warn!("No message for command {}", command);
                return TxOutcome::Unmapped(command);
            },
        };

        match bus.transmit(&Frame::message(id), self.timeout) {
            Ok(()) => {
                defmt::info!("Tx {} transmitted", id);
                TxOutcome::Sent(id)
            },
            Err(e) => {
                defmt::error!("Tx {} failed: {}", id, e);
                TxOutcome::Failed(id, e)
            },
        }
    }

    /// Wait for the next command and transmit it
    pub fn step<B: Bus>(&self, inbox: &mut Inbox<'_>, bus: &mut B, wait: impl FnMut()) -> TxOutcome {
        let command = inbox.dequeue_blocking(wait);
        self.handle(command, bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::bus::mock::BusMock;
    use crate::protocol::mailbox::Mailbox;

    #[test]
    fn command_mapping() {
        assert_eq!(Transmitter::message(Command::SendPing), Some(MessageId::ControllerPing));
        assert_eq!(Transmitter::message(Command::SendStartCommand), Some(MessageId::ControllerStart));
        assert_eq!(Transmitter::message(Command::SendStopCommand), Some(MessageId::ControllerStop));
        assert_eq!(Transmitter::message(Command::RequestExit), None);
    }

    #[test]
    fn transmits_with_configured_timeout() {
        let mut bus = BusMock::new();
        let tx = Transmitter::new(1000);
        assert_eq!(tx.handle(Command::SendStartCommand, &mut bus), TxOutcome::Sent(MessageId::ControllerStart));
        assert_eq!(bus.sent, vec![(Frame::message(MessageId::ControllerStart), Timeout::After(1000))]);
    }

    #[test]
    fn ping_is_single_shot() {
        let mut bus = BusMock::new();
        let tx = Transmitter::new(1000);
        tx.handle(Command::SendPing, &mut bus);
        let frames = bus.sent_frames();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_single_shot());
        assert!(frames[0].data().is_empty());
    }

    #[test]
    fn exit_transmits_nothing() {
        let mut bus = BusMock::new();
        let tx = Transmitter::new(1000);
        assert_eq!(tx.handle(Command::RequestExit, &mut bus), TxOutcome::Unmapped(Command::RequestExit));
        assert!(bus.sent.is_empty());
    }

    #[test]
    fn failure_is_not_retried() {
        let mut bus = BusMock::new();
        bus.fail_next(TxError::Timeout);
        let tx = Transmitter::new(1000);

        let outcome = tx.handle(Command::SendStopCommand, &mut bus);
        assert_eq!(outcome, TxOutcome::Failed(MessageId::ControllerStop, TxError::Timeout));
        assert!(bus.sent.is_empty());
        assert!(bus.tx_results.is_empty());

        // Next command goes through normally
        assert_eq!(tx.handle(Command::SendStopCommand, &mut bus), TxOutcome::Sent(MessageId::ControllerStop));
        assert_eq!(bus.sent.len(), 1);
    }

    #[test]
    fn double_trigger_sends_once() {
        let mut mailbox = Mailbox::new();
        let (mut trigger, mut inbox) = mailbox.split();
        let mut bus = BusMock::new();
        let tx = Transmitter::new(1000);

        trigger.on_edge();
        trigger.on_edge();

        let outcome = tx.step(&mut inbox, &mut bus, || panic!("Command should be pending"));
        assert_eq!(outcome, TxOutcome::Sent(MessageId::ControllerStart));
        assert!(!inbox.is_pending());
        assert_eq!(bus.sent_frames(), vec![Frame::message(MessageId::ControllerStart)]);
    }

    #[test]
    fn triggers_after_consumption_are_sent() {
        let mut mailbox = Mailbox::new();
        let (mut trigger, mut inbox) = mailbox.split();
        let mut bus = BusMock::new();
        let tx = Transmitter::new(1000);

        for _ in 0..3 {
            assert!(trigger.on_edge());
            tx.step(&mut inbox, &mut bus, || panic!("Command should be pending"));
        }
        assert_eq!(bus.sent.len(), 3);
    }
}
