//! Per-kind request numbering used to tell current answers from stale ones

/// Identifies one issued gateway call of a given kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

/// Monotonic request counter for one call kind.
///
/// Only the most recently issued ticket is current. `invalidate` moves the counter past every
/// outstanding ticket without issuing a new one.
#[derive(Debug, Clone, Default)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn issue(&mut self) -> Ticket {
        self.latest = self.latest.saturating_add(1);
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }

    pub fn invalidate(&mut self) {
        self.latest = self.latest.saturating_add(1);
    }
}
