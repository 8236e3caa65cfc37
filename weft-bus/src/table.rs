//! Descriptor table: dense integer ids over channel slots.
//!
//! Ids are plain slot indices. A closed channel leaves a hole; holes are
//! reused lowest-first so ids stay compact across churn. When no hole
//! exists the slot array doubles (`0 → 2 → 4 → …`), which keeps the
//! amortized open cost constant and, because ids are indices rather than
//! pointers, makes reallocation invisible to callers.

use std::rc::Rc;

use crate::channel::{Channel, ChannelId};

pub(crate) struct ChannelTable {
    slots: Vec<Option<Rc<Channel>>>,
    live: usize,
}

impl ChannelTable {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }

    pub(crate) fn with_capacity(channels: usize) -> Self {
        Self {
            slots: vec![None; channels],
            live: 0,
        }
    }

    /// Number of live channels (occupied slots).
    #[inline]
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    /// Installs a fresh channel and returns its id.
    ///
    /// A `capacity` of zero is coerced to one: every channel can hold at
    /// least a single word.
    pub(crate) fn open(&mut self, capacity: usize) -> ChannelId {
        let channel = Rc::new(Channel::new(capacity.max(1)));

        if let Some(index) = self.slots.iter().position(Option::is_none) {
            self.slots[index] = Some(channel);
            self.live += 1;
            return ChannelId::new(index);
        }

        let old_len = self.slots.len();
        let new_len = (old_len * 2).max(2);
        self.slots.resize_with(new_len, || None);
        self.slots[old_len] = Some(channel);
        self.live += 1;
        ChannelId::new(old_len)
    }

    pub(crate) fn get(&self, id: ChannelId) -> Option<Rc<Channel>> {
        self.slots.get(id.index()).and_then(Clone::clone)
    }

    /// Empties the slot, handing the channel back to the caller. Returns
    /// `None` for unknown ids.
    pub(crate) fn detach(&mut self, id: ChannelId) -> Option<Rc<Channel>> {
        let channel = self.slots.get_mut(id.index())?.take()?;
        self.live -= 1;
        Some(channel)
    }

    /// Iterates live channels in id order.
    #[cfg(feature = "broadcast")]
    pub(crate) fn iter_live(&self) -> impl Iterator<Item = (ChannelId, &Rc<Channel>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|channel| (ChannelId::new(index), channel)))
    }
}
