//! Single-writer, single-reader latest-value handoff.

use parking_lot::Mutex;

/// A one-slot mailbox: writers overwrite, the reader takes the latest.
///
/// This is the handoff between background workers and the render thread.
/// Publishing never blocks on the consumer and a slow consumer only ever
/// skips intermediate values, never observes them out of order.
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Replace whatever is in the slot with `value`.
    pub fn publish(&self, value: T) {
        *self.slot.lock() = Some(value);
    }

    /// Take the latest value, leaving the slot empty. `None` when nothing
    /// new arrived since the last take.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_value_wins() {
        let mailbox = Mailbox::new();
        mailbox.publish(1);
        mailbox.publish(2);
        assert_eq!(mailbox.take(), Some(2));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_empty_take_is_none() {
        let mailbox: Mailbox<u32> = Mailbox::new();
        assert_eq!(mailbox.take(), None);
    }
}
