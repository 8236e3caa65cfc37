//! Bus-wide all-or-none delivery.
//!
//! A broadcast appends one word to *every* live channel or to none. The
//! check pass and the commit pass run back to back with no suspension
//! point between them, so on this single-threaded bus the check result is
//! authoritative at commit time and no channel is ever left half-updated.

use std::rc::Rc;

use crate::channel::{Channel, ChannelId};
use crate::error::{record, BusError};
use crate::Bus;

/// Outcome of one check-then-commit pass.
enum Probe {
    Delivered,
    /// The bus holds no live channels.
    Empty,
    /// Check failed: this channel had no space. Nothing was mutated.
    FullAt(ChannelId),
}

impl Bus {
    /// Attempts to append `word` to every live channel without blocking.
    ///
    /// All-or-none: if any live channel is full, no channel is mutated.
    /// On success one parked receiver is woken per channel.
    ///
    /// # Errors
    ///
    /// - [`BusError::NoChannel`] if the bus has no live channels.
    /// - [`BusError::WouldBlock`] if some live channel is full.
    ///
    /// # Example
    ///
    /// ```
    /// use weft_bus::{Bus, BusError};
    ///
    /// let bus = Bus::new();
    /// let first = bus.open(1);
    /// let second = bus.open(1);
    ///
    /// bus.try_send(first, 9).unwrap();
    /// assert_eq!(bus.try_broadcast(7), Err(BusError::WouldBlock));
    /// assert_eq!(bus.len(second), Some(0)); // untouched
    ///
    /// bus.try_recv(first).unwrap();
    /// assert_eq!(bus.try_broadcast(7), Ok(()));
    /// assert_eq!(bus.try_recv(first), Ok(7));
    /// assert_eq!(bus.try_recv(second), Ok(7));
    /// ```
    pub fn try_broadcast(&self, word: u32) -> Result<(), BusError> {
        let result = match self.broadcast_probe(word) {
            Probe::Delivered => Ok(()),
            Probe::Empty => Err(BusError::NoChannel),
            Probe::FullAt(_) => Err(BusError::WouldBlock),
        };
        record(result)
    }

    /// Appends `word` to every live channel, parking while any is full.
    ///
    /// Each retry reruns the whole all-or-none pass against the *current*
    /// live set: channels opened or closed while this task was parked are
    /// picked up on the next pass.
    ///
    /// # Errors
    ///
    /// [`BusError::NoChannel`] if the bus had no live channels at some
    /// retry.
    pub async fn broadcast(&self, word: u32) -> Result<(), BusError> {
        let result = loop {
            match self.broadcast_probe(word) {
                Probe::Delivered => break Ok(()),
                Probe::Empty => break Err(BusError::NoChannel),
                Probe::FullAt(id) => {
                    // Park on the channel that refused the word. If it is
                    // closed while we sleep, close wakes us and the next
                    // probe sees the updated live set.
                    let _ = self.park_sender(id).await;
                }
            }
        };
        record(result)
    }

    fn broadcast_probe(&self, word: u32) -> Probe {
        let channels: Vec<(ChannelId, Rc<Channel>)> = {
            let table = self.table.borrow();
            table
                .iter_live()
                .map(|(id, channel)| (id, Rc::clone(channel)))
                .collect()
        };
        if channels.is_empty() {
            return Probe::Empty;
        }

        // Check pass: mutate nothing until every channel has space.
        for (id, channel) in &channels {
            if channel.is_full() {
                return Probe::FullAt(*id);
            }
        }

        // Commit pass.
        for (_, channel) in &channels {
            channel.push(word);
            channel.receivers.wake_one();
        }
        Probe::Delivered
    }

    async fn park_sender(&self, id: ChannelId) -> Result<(), BusError> {
        let channel = self.channel(id)?;
        channel.senders.wait().await;
        Ok(())
    }
}
