//! The bus: a descriptor table plus blocking and non-blocking word transfer.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::channel::{Channel, ChannelId};
use crate::error::{record, set_last_error, BusError, ErrorCode};
use crate::table::ChannelTable;

/// A cooperative in-process message bus.
///
/// The bus multiplexes a dynamically-grown family of bounded word channels
/// between tasks on one thread. Producers append 32-bit words; consumers
/// drain them in FIFO order per channel. When a channel is full (resp.
/// empty), [`send`](Bus::send) (resp. [`recv`](Bus::recv)) parks the caller
/// until space (resp. data) appears or the channel is closed; the `try_*`
/// variants return [`BusError::WouldBlock`] instead.
///
/// All methods take `&self`; the bus is single-threaded by construction
/// (`!Send`, no locks, no atomics) and safe to share through an
/// [`Rc`](std::rc::Rc) between tasks on a local executor.
///
/// # Example
///
/// ```
/// use weft_bus::Bus;
///
/// futures::executor::block_on(async {
///     let bus = Bus::new();
///     let id = bus.open(2);
///
///     bus.send(id, 7).await.unwrap();
///     bus.send(id, 8).await.unwrap();
///     assert_eq!(bus.recv(id).await.unwrap(), 7);
///     assert_eq!(bus.recv(id).await.unwrap(), 8);
/// });
/// ```
pub struct Bus {
    pub(crate) table: RefCell<ChannelTable>,
}

impl Bus {
    /// Creates a bus with no channels.
    pub fn new() -> Self {
        Self {
            table: RefCell::new(ChannelTable::new()),
        }
    }

    /// Creates a bus whose descriptor table is pre-sized for `channels`
    /// channels, avoiding early table growth.
    pub fn with_capacity(channels: usize) -> Self {
        Self {
            table: RefCell::new(ChannelTable::with_capacity(channels)),
        }
    }

    // ------------------------------------------------------------------------
    // Channel lifecycle
    // ------------------------------------------------------------------------

    /// Opens a channel holding at most `capacity` words and returns its id.
    ///
    /// A `capacity` of zero is coerced to one. Ids are dense indices:
    /// closed slots are reused lowest-first before the table grows.
    ///
    /// # Example
    ///
    /// ```
    /// use weft_bus::Bus;
    ///
    /// let bus = Bus::new();
    /// assert_eq!(bus.open(4).index(), 0);
    /// assert_eq!(bus.open(0).index(), 1); // capacity coerced to 1
    /// ```
    pub fn open(&self, capacity: usize) -> ChannelId {
        let id = self.table.borrow_mut().open(capacity);
        log::trace!("channel {id} opened, capacity {}", capacity.max(1));
        set_last_error(ErrorCode::None);
        id
    }

    /// Closes a channel, releasing every parked sender and receiver.
    ///
    /// The slot is vacated and the channel marked closed *before* any
    /// waiter is woken; released tasks observe the close on resumption and
    /// return [`BusError::NoChannel`], even if the slot has already been
    /// reused for a fresh channel by then. Each wait entry is unlinked by
    /// this call, not by the woken task, which is why no cooperative yield
    /// is needed here and `close` stays synchronous.
    ///
    /// Unknown (or already closed) ids are ignored; the last-error cell is
    /// left untouched either way.
    pub fn close(&self, id: ChannelId) {
        let detached = self.table.borrow_mut().detach(id);
        let Some(channel) = detached else { return };

        channel.mark_closed();
        let released = channel.senders.wake_all() + channel.receivers.wake_all();
        log::trace!("channel {id} closed, released {released} waiters");
        // Parked futures still hold their own reference to the channel, so
        // dropping ours here can never free storage a waiter will touch.
    }

    pub(crate) fn channel(&self, id: ChannelId) -> Result<Rc<Channel>, BusError> {
        self.table.borrow().get(id).ok_or(BusError::NoChannel)
    }

    // ------------------------------------------------------------------------
    // Non-blocking transfer
    // ------------------------------------------------------------------------

    /// Attempts to append `word` without blocking.
    ///
    /// On success one parked receiver is woken.
    ///
    /// # Errors
    ///
    /// - [`BusError::NoChannel`] if `id` does not name a live channel.
    /// - [`BusError::WouldBlock`] if the channel is full.
    ///
    /// # Example
    ///
    /// ```
    /// use weft_bus::{Bus, BusError};
    ///
    /// let bus = Bus::new();
    /// let id = bus.open(1);
    ///
    /// assert!(bus.try_send(id, 1).is_ok());
    /// assert_eq!(bus.try_send(id, 2), Err(BusError::WouldBlock));
    /// ```
    pub fn try_send(&self, id: ChannelId, word: u32) -> Result<(), BusError> {
        record(self.try_send_inner(id, word))
    }

    fn try_send_inner(&self, id: ChannelId, word: u32) -> Result<(), BusError> {
        let channel = self.channel(id)?;
        if channel.is_full() {
            return Err(BusError::WouldBlock);
        }
        channel.push(word);
        channel.receivers.wake_one();
        Ok(())
    }

    /// Attempts to pop the oldest word without blocking.
    ///
    /// On success one parked sender is woken.
    ///
    /// # Errors
    ///
    /// - [`BusError::NoChannel`] if `id` does not name a live channel.
    /// - [`BusError::WouldBlock`] if the channel is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use weft_bus::{Bus, BusError};
    ///
    /// let bus = Bus::new();
    /// let id = bus.open(1);
    ///
    /// assert_eq!(bus.try_recv(id), Err(BusError::WouldBlock));
    /// bus.try_send(id, 9).unwrap();
    /// assert_eq!(bus.try_recv(id), Ok(9));
    /// ```
    pub fn try_recv(&self, id: ChannelId) -> Result<u32, BusError> {
        record(self.try_recv_inner(id))
    }

    fn try_recv_inner(&self, id: ChannelId) -> Result<u32, BusError> {
        let channel = self.channel(id)?;
        let word = channel.pop().ok_or(BusError::WouldBlock)?;
        channel.senders.wake_one();
        Ok(word)
    }

    // ------------------------------------------------------------------------
    // Blocking transfer
    // ------------------------------------------------------------------------

    /// Appends `word`, parking until the channel has space.
    ///
    /// The channel is re-resolved on every retry: a close while this task
    /// was parked is observed as [`BusError::NoChannel`] on the next pass,
    /// never as an access to released channel state.
    ///
    /// # Errors
    ///
    /// [`BusError::NoChannel`] if the channel does not exist, or was
    /// closed while this task was parked.
    pub async fn send(&self, id: ChannelId, word: u32) -> Result<(), BusError> {
        let result = loop {
            let channel = match self.channel(id) {
                Ok(channel) => channel,
                Err(err) => break Err(err),
            };

            if !channel.is_full() {
                channel.push(word);
                channel.receivers.wake_one();
                // Chain wakeup: if space remains, the next parked sender can
                // proceed without waiting for a receive.
                if !channel.is_full() {
                    channel.senders.wake_one();
                }
                break Ok(());
            }

            channel.senders.wait().await;
            if channel.is_closed() {
                break Err(BusError::NoChannel);
            }
        };
        record(result)
    }

    /// Pops the oldest word, parking until the channel has data.
    ///
    /// Re-resolves the channel on every retry, like [`send`](Bus::send).
    ///
    /// # Errors
    ///
    /// [`BusError::NoChannel`] if the channel does not exist, or was
    /// closed while this task was parked.
    pub async fn recv(&self, id: ChannelId) -> Result<u32, BusError> {
        let result = loop {
            let channel = match self.channel(id) {
                Ok(channel) => channel,
                Err(err) => break Err(err),
            };

            if let Some(word) = channel.pop() {
                channel.senders.wake_one();
                // Chain wakeup: more data means the next parked receiver can
                // proceed as well.
                if !channel.is_empty() {
                    channel.receivers.wake_one();
                }
                break Ok(word);
            }

            channel.receivers.wait().await;
            if channel.is_closed() {
                break Err(BusError::NoChannel);
            }
        };
        record(result)
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    /// Returns the number of live channels.
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.table.borrow().live()
    }

    /// Returns the capacity of channel `id`, or `None` if it is not live.
    pub fn capacity(&self, id: ChannelId) -> Option<usize> {
        self.table.borrow().get(id).map(|channel| channel.capacity())
    }

    /// Returns the number of buffered words in channel `id`.
    pub fn len(&self, id: ChannelId) -> Option<usize> {
        self.table.borrow().get(id).map(|channel| channel.len())
    }

    /// Returns `true` if channel `id` holds no words.
    pub fn is_empty(&self, id: ChannelId) -> Option<bool> {
        self.table.borrow().get(id).map(|channel| channel.is_empty())
    }

    /// Returns the number of senders parked on channel `id`.
    pub fn blocked_senders(&self, id: ChannelId) -> Option<usize> {
        self.table.borrow().get(id).map(|channel| channel.senders.len())
    }

    /// Returns the number of receivers parked on channel `id`.
    pub fn blocked_receivers(&self, id: ChannelId) -> Option<usize> {
        self.table.borrow().get(id).map(|channel| channel.receivers.len())
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("channels", &self.channel_count())
            .finish_non_exhaustive()
    }
}
