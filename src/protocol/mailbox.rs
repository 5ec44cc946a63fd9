use defmt::Format;
use heapless::spsc::{Queue, Producer, Consumer};

/// Action requested from the transmitter, never sent on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Command {
    SendPing,
    SendStartCommand,
    SendStopCommand,
    RequestExit,
}

/// Command produced by the edge trigger
pub const EDGE_COMMAND: Command = Command::SendStartCommand;

// spsc::Queue keeps one slot empty to tell full from empty
const SLOTS: usize = 2;

/// Single-slot command handoff between an interrupt and the transmitter loop
///
/// Backed by a lock-free SPSC queue with capacity 1. The [`Trigger`] side never
/// blocks: when a command is already pending the new one is dropped, so a burst
/// of triggers results in a single command.
pub struct Mailbox {
    queue: Queue<Command, SLOTS>,
}

/// Producer side of the [`Mailbox`], safe to use from interrupt context
pub struct Trigger<'a> {
    tx: Producer<'a, Command, SLOTS>,
}

/// Consumer side of the [`Mailbox`]
pub struct Inbox<'a> {
    rx: Consumer<'a, Command, SLOTS>,
}

impl Mailbox {
    pub const fn new() -> Self {
        Self { queue: Queue::new() }
    }

    /// Split into trigger and inbox endpoints
    ///
    /// Usually the mailbox is a `'static` resource, which gives `'static` endpoints.
    pub fn split(&mut self) -> (Trigger<'_>, Inbox<'_>) {
        let (tx, rx) = self.queue.split();
        (Trigger { tx }, Inbox { rx })
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Trigger<'a> {
    /// Store the command if the slot is empty; `false` means it was dropped
    pub fn try_enqueue(&mut self, command: Command) -> bool {
        self.tx.enqueue(command).is_ok()
    }

    /// Handle a trigger edge
    pub fn on_edge(&mut self) -> bool {
        self.try_enqueue(EDGE_COMMAND)
    }
}

impl<'a> Inbox<'a> {
    pub fn try_dequeue(&mut self) -> Option<Command> {
        self.rx.dequeue()
    }

    pub fn is_pending(&self) -> bool {
        self.rx.ready()
    }

    /// Wait until a command is available and take it
    ///
    /// `wait` is called while the slot is empty, e.g. [`cortex_m::asm::wfi`] to sleep
    /// until the next interrupt.
    pub fn dequeue_blocking(&mut self, mut wait: impl FnMut()) -> Command {
        loop {
            if let Some(command) = self.rx.dequeue() {
                return command;
            }
            wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn enqueue_into_empty() {
        let mut mailbox = Mailbox::new();
        let (mut trigger, mut inbox) = mailbox.split();
        assert!(!inbox.is_pending());
        assert!(trigger.try_enqueue(Command::SendPing));
        assert!(inbox.is_pending());
        assert_eq!(inbox.try_dequeue(), Some(Command::SendPing));
        assert_eq!(inbox.try_dequeue(), None);
    }

    #[test]
    fn second_command_dropped() {
        let mut mailbox = Mailbox::new();
        let (mut trigger, mut inbox) = mailbox.split();
        assert!(trigger.try_enqueue(Command::SendStartCommand));
        assert!(!trigger.try_enqueue(Command::SendStopCommand));
        assert!(!trigger.try_enqueue(Command::RequestExit));
        // First one preserved
        assert_eq!(inbox.try_dequeue(), Some(Command::SendStartCommand));
        assert_eq!(inbox.try_dequeue(), None);
    }

    #[test]
    fn slot_reusable_after_dequeue() {
        let mut mailbox = Mailbox::new();
        let (mut trigger, mut inbox) = mailbox.split();
        for command in [Command::SendPing, Command::SendStopCommand, Command::SendStartCommand] {
            assert!(trigger.try_enqueue(command));
            assert_eq!(inbox.try_dequeue(), Some(command));
        }
    }

    #[test]
    fn edge_enqueues_start() {
        let mut mailbox = Mailbox::new();
        let (mut trigger, mut inbox) = mailbox.split();
        assert!(trigger.on_edge());
        assert!(!trigger.on_edge());
        assert_eq!(inbox.try_dequeue(), Some(Command::SendStartCommand));
    }

    #[test]
    fn blocking_returns_pending_without_waiting() {
        let mut mailbox = Mailbox::new();
        let (mut trigger, mut inbox) = mailbox.split();
        trigger.try_enqueue(Command::SendStopCommand);
        let command = inbox.dequeue_blocking(|| panic!("Should not wait"));
        assert_eq!(command, Command::SendStopCommand);
    }

    #[test]
    fn blocking_waits_for_producer_thread() {
        let waits = AtomicUsize::new(0);
        let mut mailbox = Mailbox::new();
        let (mut trigger, mut inbox) = mailbox.split();

        let command = std::thread::scope(|s| {
            let consumer = s.spawn(|| {
                inbox.dequeue_blocking(|| {
                    waits.fetch_add(1, Ordering::Relaxed);
                    std::thread::yield_now();
                })
            });
            // Let the consumer spin on an empty slot first
            while waits.load(Ordering::Relaxed) == 0 {
                std::thread::yield_now();
            }
            assert!(trigger.on_edge());
            consumer.join().unwrap()
        });

        assert_eq!(command, Command::SendStartCommand);
        assert!(waits.load(Ordering::Relaxed) > 0);
    }
}
