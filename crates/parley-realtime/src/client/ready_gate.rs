//! Holds events that arrive before the `Ready` snapshot.
//!
//! A client cannot apply a `User:Update` or `Message:New` before it has the
//! snapshot those events patch. The gate queues them until `Ready` shows up,
//! then hands back `Ready` followed by everything queued, in arrival order.

use std::collections::VecDeque;

use crate::message::types::ServerEvent;

/// Anything the gate can tell apart from the snapshot event.
pub trait GatedEvent {
    fn is_ready(&self) -> bool;
}

impl GatedEvent for ServerEvent {
    fn is_ready(&self) -> bool {
        ServerEvent::is_ready(self)
    }
}

/// Ordered buffer plus a ready flag.
#[derive(Debug)]
pub struct ReadyGate<E> {
    ready: bool,
    pending: VecDeque<E>,
}

impl<E> Default for ReadyGate<E> {
    fn default() -> Self {
        Self {
            ready: false,
            pending: VecDeque::new(),
        }
    }
}

impl<E: GatedEvent> ReadyGate<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one incoming event; returns what the client should apply now.
    ///
    /// `Ready` is never queued: it opens the gate and comes back first,
    /// followed by the drained queue.
    pub fn offer(&mut self, event: E) -> Vec<E> {
        if event.is_ready() {
            self.ready = true;
            let mut out = Vec::with_capacity(self.pending.len() + 1);
            out.push(event);
            out.extend(self.pending.drain(..));
            return out;
        }

        if self.ready {
            vec![event]
        } else {
            self.pending.push_back(event);
            Vec::new()
        }
    }

    /// Drain whatever is queued without opening the gate.
    pub fn flush(&mut self) -> Vec<E> {
        self.pending.drain(..).collect()
    }

    /// Close the gate and drop the queue, ready for a reconnect.
    pub fn reset(&mut self) {
        self.ready = false;
        self.pending.clear();
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Ev {
        Ready,
        Other(u32),
    }

    impl GatedEvent for Ev {
        fn is_ready(&self) -> bool {
            matches!(self, Ev::Ready)
        }
    }

    #[test]
    fn test_events_before_ready_are_held_in_order() {
        let mut gate = ReadyGate::new();
        assert!(gate.offer(Ev::Other(1)).is_empty());
        assert!(gate.offer(Ev::Other(2)).is_empty());
        assert_eq!(gate.pending_len(), 2);

        let out = gate.offer(Ev::Ready);
        assert_eq!(out, vec![Ev::Ready, Ev::Other(1), Ev::Other(2)]);
        assert!(gate.is_ready());
        assert_eq!(gate.pending_len(), 0);

        assert_eq!(gate.offer(Ev::Other(3)), vec![Ev::Other(3)]);
    }

    #[test]
    fn test_ready_is_never_queued() {
        let mut gate: ReadyGate<Ev> = ReadyGate::new();
        assert_eq!(gate.offer(Ev::Ready), vec![Ev::Ready]);
        assert_eq!(gate.pending_len(), 0);
    }

    #[test]
    fn test_reset_rearms_the_gate() {
        let mut gate = ReadyGate::new();
        gate.offer(Ev::Ready);
        gate.reset();
        assert!(!gate.is_ready());
        assert!(gate.offer(Ev::Other(7)).is_empty());
        assert_eq!(gate.flush(), vec![Ev::Other(7)]);
        assert!(!gate.is_ready());
    }

    #[test]
    fn test_server_events_use_the_ready_variant() {
        use crate::message::types::Exception;
        let mut gate = ReadyGate::new();
        let ex = ServerEvent::Exception(Exception {
            kind: "x".into(),
            message: "y".into(),
        });
        assert!(gate.offer(ex).is_empty());
        assert_eq!(gate.pending_len(), 1);
    }
}
