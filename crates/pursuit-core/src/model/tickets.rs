use super::transport::TransportMode;
use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Consumable resource kinds held by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ticket {
    Taxi,
    Bus,
    Underground,
    Concealment,
    Double,
}

impl Ticket {
    /// Ticket matching a transport mode. Ferry edges have no dedicated ticket.
    pub const fn for_mode(mode: TransportMode) -> Option<Ticket> {
        match mode {
            TransportMode::Taxi => Some(Ticket::Taxi),
            TransportMode::Bus => Some(Ticket::Bus),
            TransportMode::Underground => Some(Ticket::Underground),
            TransportMode::Ferry => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Ticket::Taxi => "taxi",
            Ticket::Bus => "bus",
            Ticket::Underground => "underground",
            Ticket::Concealment => "concealment",
            Ticket::Double => "double",
        }
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TicketError {
    #[error("no {0} ticket remaining")]
    Exhausted(Ticket),
    #[error("no ticket can pay for a {0} move")]
    Unpayable(TransportMode),
}

/// Per-player ticket counts.
///
/// Counts are unsigned; [`TicketInventory::consume`] refuses to go below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TicketInventory {
    taxi: u8,
    bus: u8,
    underground: u8,
    #[serde(default)]
    concealment: u8,
    #[serde(default)]
    double: u8,
}

impl TicketInventory {
    pub const fn new(taxi: u8, bus: u8, underground: u8) -> Self {
        Self {
            taxi,
            bus,
            underground,
            concealment: 0,
            double: 0,
        }
    }

    pub const fn with_concealment(mut self, count: u8) -> Self {
        self.concealment = count;
        self
    }

    pub const fn with_double(mut self, count: u8) -> Self {
        self.double = count;
        self
    }

    pub const fn detective_default() -> Self {
        Self::new(10, 8, 4)
    }

    /// The culprit receives one concealment ticket per detective in play.
    pub fn culprit_default(detectives: usize) -> Self {
        let concealment = u8::try_from(detectives).unwrap_or(u8::MAX);
        Self::new(4, 3, 3).with_concealment(concealment).with_double(2)
    }

    pub const fn count(&self, ticket: Ticket) -> u8 {
        match ticket {
            Ticket::Taxi => self.taxi,
            Ticket::Bus => self.bus,
            Ticket::Underground => self.underground,
            Ticket::Concealment => self.concealment,
            Ticket::Double => self.double,
        }
    }

    /// Tickets of the mode itself (ferry always reports zero).
    pub const fn mode_count(&self, mode: TransportMode) -> u8 {
        match Ticket::for_mode(mode) {
            Some(ticket) => self.count(ticket),
            None => 0,
        }
    }

    pub const fn can_travel(&self, mode: TransportMode) -> bool {
        self.mode_count(mode) > 0 || self.concealment > 0
    }

    /// Ticket that would pay for a move by `mode`: the matching ticket first,
    /// then a concealment ticket.
    pub fn payment_for(&self, mode: TransportMode) -> Option<Ticket> {
        match Ticket::for_mode(mode) {
            Some(ticket) if self.count(ticket) > 0 => Some(ticket),
            _ if self.concealment > 0 => Some(Ticket::Concealment),
            _ => None,
        }
    }

    pub fn is_stranded(&self) -> bool {
        TransportMode::ALL.iter().all(|mode| !self.can_travel(*mode))
    }

    pub fn consume(&mut self, ticket: Ticket) -> Result<(), TicketError> {
        let slot = self.slot_mut(ticket);
        if *slot == 0 {
            return Err(TicketError::Exhausted(ticket));
        }
        *slot -= 1;
        Ok(())
    }

    /// Pays for one move by `mode`, returning the ticket that was spent.
    pub fn pay_for(&mut self, mode: TransportMode) -> Result<Ticket, TicketError> {
        let ticket = self
            .payment_for(mode)
            .ok_or(TicketError::Unpayable(mode))?;
        self.consume(ticket)?;
        Ok(ticket)
    }

    /// Returns a ticket to the inventory. Used to reconstruct earlier inventories.
    pub fn restore(&mut self, ticket: Ticket) {
        let slot = self.slot_mut(ticket);
        *slot = slot.saturating_add(1);
    }

    fn slot_mut(&mut self, ticket: Ticket) -> &mut u8 {
        match ticket {
            Ticket::Taxi => &mut self.taxi,
            Ticket::Bus => &mut self.bus,
            Ticket::Underground => &mut self.underground,
            Ticket::Concealment => &mut self.concealment,
            Ticket::Double => &mut self.double,
        }
    }
}

impl fmt::Display for TicketInventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "taxi {}, bus {}, underground {}, concealment {}, double {}",
            self.taxi, self.bus, self.underground, self.concealment, self.double
        )
    }
}
