use crate::models::StatusMessage;

/// Unico slot per il messaggio di stato.
///
/// Ogni nuovo messaggio sostituisce il precedente e incrementa il token;
/// una scadenza con token vecchio viene ignorata.
#[derive(Debug, Default)]
pub struct StatusSlot {
    current: Option<StatusMessage>,
    token: u64,
}

/// Effetto sul timer di auto-cancellazione
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerChange {
    Schedule { token: u64, after: std::time::Duration },
    Cancel,
}

impl StatusSlot {
    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }

    pub fn show(&mut self, message: StatusMessage) -> TimerChange {
        self.token += 1;
        let change = match message.ttl {
            Some(after) => TimerChange::Schedule {
                token: self.token,
                after,
            },
            None => TimerChange::Cancel,
        };
        self.current = Some(message);
        change
    }

    pub fn clear(&mut self) -> TimerChange {
        self.token += 1;
        self.current = None;
        TimerChange::Cancel
    }

    /// Returns true if the message was cleared.
    pub fn expire(&mut self, token: u64) -> bool {
        if token != self.token || self.current.is_none() {
            return false;
        }
        self.current = None;
        true
    }
}
