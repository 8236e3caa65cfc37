//! Multi-word transfer with partial progress.
//!
//! Batch operations move as many words as the channel allows in one call
//! and report the count. The blocking variants park only on zero progress;
//! once at least one word has moved they return immediately, so a caller
//! streaming a large slice drives its own outer loop.
//!
//! One receiver is woken per word appended (and one sender per word
//! drained): a k-word batch can satisfy k parked peers, where a single
//! wake would rely on each peer chaining the next.

use crate::channel::ChannelId;
use crate::error::{record, BusError};
use crate::Bus;

impl Bus {
    /// Attempts to append a prefix of `words` without blocking.
    ///
    /// Appends `min(words.len(), free space)` words and returns the count,
    /// waking one parked receiver per word. An empty `words` succeeds with
    /// `0` immediately.
    ///
    /// # Errors
    ///
    /// - [`BusError::NoChannel`] if `id` does not name a live channel.
    /// - [`BusError::WouldBlock`] if the channel is full and `words` is
    ///   non-empty.
    ///
    /// # Example
    ///
    /// ```
    /// use weft_bus::Bus;
    ///
    /// let bus = Bus::new();
    /// let id = bus.open(3);
    ///
    /// // Only three of five words fit.
    /// assert_eq!(bus.try_send_many(id, &[1, 2, 3, 4, 5]), Ok(3));
    /// assert_eq!(bus.try_recv(id), Ok(1));
    /// ```
    pub fn try_send_many(&self, id: ChannelId, words: &[u32]) -> Result<usize, BusError> {
        record(self.try_send_many_inner(id, words))
    }

    fn try_send_many_inner(&self, id: ChannelId, words: &[u32]) -> Result<usize, BusError> {
        let channel = self.channel(id)?;
        if words.is_empty() {
            return Ok(0);
        }
        let count = words.len().min(channel.free_space());
        if count == 0 {
            return Err(BusError::WouldBlock);
        }
        channel.extend(&words[..count]);
        for _ in 0..count {
            channel.receivers.wake_one();
        }
        Ok(count)
    }

    /// Appends a prefix of `words`, parking until at least one fits.
    ///
    /// Returns the size of the *first* non-empty batch written, which may
    /// be smaller than `words.len()`. An empty `words` succeeds with `0`.
    ///
    /// # Errors
    ///
    /// [`BusError::NoChannel`] if the channel does not exist, or was
    /// closed while this task was parked.
    pub async fn send_many(&self, id: ChannelId, words: &[u32]) -> Result<usize, BusError> {
        if words.is_empty() {
            return record(self.channel(id).map(|_| 0));
        }
        let result = loop {
            let channel = match self.channel(id) {
                Ok(channel) => channel,
                Err(err) => break Err(err),
            };

            let count = words.len().min(channel.free_space());
            if count > 0 {
                channel.extend(&words[..count]);
                for _ in 0..count {
                    channel.receivers.wake_one();
                }
                if !channel.is_full() {
                    channel.senders.wake_one();
                }
                break Ok(count);
            }

            channel.senders.wait().await;
            if channel.is_closed() {
                break Err(BusError::NoChannel);
            }
        };
        record(result)
    }

    /// Attempts to drain buffered words into `out` without blocking.
    ///
    /// Moves `min(out.len(), buffered)` words into the front of `out` and
    /// returns the count, waking one parked sender per word. An empty
    /// `out` succeeds with `0` immediately.
    ///
    /// # Errors
    ///
    /// - [`BusError::NoChannel`] if `id` does not name a live channel.
    /// - [`BusError::WouldBlock`] if the channel is empty and `out` is
    ///   non-empty.
    ///
    /// # Example
    ///
    /// ```
    /// use weft_bus::Bus;
    ///
    /// let bus = Bus::new();
    /// let id = bus.open(4);
    /// bus.try_send_many(id, &[7, 8]).unwrap();
    ///
    /// let mut out = [0u32; 4];
    /// assert_eq!(bus.try_recv_many(id, &mut out), Ok(2));
    /// assert_eq!(&out[..2], &[7, 8]);
    /// ```
    pub fn try_recv_many(&self, id: ChannelId, out: &mut [u32]) -> Result<usize, BusError> {
        record(self.try_recv_many_inner(id, out))
    }

    fn try_recv_many_inner(&self, id: ChannelId, out: &mut [u32]) -> Result<usize, BusError> {
        let channel = self.channel(id)?;
        if out.is_empty() {
            return Ok(0);
        }
        let count = channel.drain_into(out);
        if count == 0 {
            return Err(BusError::WouldBlock);
        }
        for _ in 0..count {
            channel.senders.wake_one();
        }
        Ok(count)
    }

    /// Drains buffered words into `out`, parking until at least one is
    /// available.
    ///
    /// Returns the size of the first non-empty batch drained. An empty
    /// `out` succeeds with `0`.
    ///
    /// # Errors
    ///
    /// [`BusError::NoChannel`] if the channel does not exist, or was
    /// closed while this task was parked.
    pub async fn recv_many(&self, id: ChannelId, out: &mut [u32]) -> Result<usize, BusError> {
        if out.is_empty() {
            return record(self.channel(id).map(|_| 0));
        }
        let result = loop {
            let channel = match self.channel(id) {
                Ok(channel) => channel,
                Err(err) => break Err(err),
            };

            let count = channel.drain_into(out);
            if count > 0 {
                for _ in 0..count {
                    channel.senders.wake_one();
                }
                if !channel.is_empty() {
                    channel.receivers.wake_one();
                }
                break Ok(count);
            }

            channel.receivers.wait().await;
            if channel.is_closed() {
                break Err(BusError::NoChannel);
            }
        };
        record(result)
    }
}
