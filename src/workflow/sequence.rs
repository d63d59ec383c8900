//! Per-stage request tokens
//!
//! Every remote call takes a ticket before it is sent. When the response
//! arrives, only the most recently issued ticket is accepted, so a late
//! answer to a superseded request cannot overwrite newer state.

/// Monotonic token identifying one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RequestSequence {
    issued: u64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Drop every outstanding ticket without issuing a new request.
    pub fn invalidate(&mut self) {
        self.issued += 1;
    }
}
