//! A FIFO wait list for single-threaded cooperative tasks.
//!
//! `weft-wait` provides [`WaitList`], an ordered set of parked tasks with
//! explicit wake operations. It is the suspension primitive underneath
//! `weft-bus`: a task that cannot make progress parks itself at the tail of
//! a list, and whichever task later creates the awaited condition pops the
//! head and wakes it.
//!
//! # Model
//!
//! The list is strictly single-threaded: state lives in [`Cell`]/[`RefCell`]
//! and the type is `!Send`. "Parking" is expressed through the `Future`
//! returned by [`WaitList::wait`]: the first poll links the caller into the
//! list and returns `Pending`; the future completes once [`wake_one`] (or
//! [`wake_all`]) has selected it.
//!
//! Each entry is a small reference-counted slot shared between the list and
//! the parked future. The future owns its slot for as long as it exists, so
//! the list can be torn down, drained, or raced against cancellation without
//! ever touching freed storage.
//!
//! # Wake protocol
//!
//! [`wake_one`] pops the head entry and marks it woken *before* invoking its
//! waker. Popping first has two consequences:
//!
//! - two wakers can never select the same entry, and
//! - the woken future has nothing left to unlink; its cleanup is a no-op.
//!
//! Wake order is insertion order, so waiters are served FIFO.
//!
//! # Cancellation
//!
//! Dropping a pending [`Wait`] future marks its entry cancelled; the list
//! discards cancelled entries lazily the next time it pops. Dropping a
//! future that was already selected by [`wake_one`] (woken, but never
//! polled again) forwards the wake to the next waiter, so a wakeup is
//! never lost to cancellation.
//!
//! # Example
//!
//! ```
//! use std::future::Future;
//! use std::pin::Pin;
//! use std::task::{Context, Waker};
//!
//! use weft_wait::WaitList;
//!
//! let list = WaitList::new();
//! let mut parked = list.wait();
//!
//! let mut cx = Context::from_waker(Waker::noop());
//! assert!(Pin::new(&mut parked).poll(&mut cx).is_pending());
//! assert_eq!(list.len(), 1);
//!
//! assert!(list.wake_one());
//! assert!(Pin::new(&mut parked).poll(&mut cx).is_ready());
//! assert!(list.is_empty());
//! ```
//!
//! [`wake_one`]: WaitList::wake_one
//! [`wake_all`]: WaitList::wake_all

#![warn(missing_docs, missing_debug_implementations)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum SlotState {
    /// Linked in a list, waiting to be selected.
    Waiting,
    /// Selected by a wake; the owning future completes on its next poll.
    Woken,
    /// The owning future was dropped while still waiting.
    Cancelled,
}

/// One parked task. Shared between the list (queue position) and the
/// [`Wait`] future (ownership).
struct Slot {
    state: Cell<SlotState>,
    waker: RefCell<Option<Waker>>,
}

/// An ordered set of parked tasks with FIFO wake order.
///
/// See the [module documentation](self) for the wake and cancellation
/// protocol.
pub struct WaitList {
    slots: RefCell<VecDeque<Rc<Slot>>>,
    /// Entries in `Waiting` state. Cancelled entries still queued do not
    /// count.
    waiting: Cell<usize>,
}

impl WaitList {
    /// Creates an empty wait list.
    pub const fn new() -> Self {
        Self {
            slots: RefCell::new(VecDeque::new()),
            waiting: Cell::new(0),
        }
    }

    /// Returns the number of tasks currently parked on this list.
    #[inline]
    pub fn len(&self) -> usize {
        self.waiting.get()
    }

    /// Returns `true` if no task is parked on this list.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.waiting.get() == 0
    }

    /// Parks the calling task at the tail of the list.
    ///
    /// The returned future links itself on first poll and completes once a
    /// wake selects it. Dropping it before completion unlinks it (see the
    /// [module documentation](self) on cancellation).
    pub fn wait(&self) -> Wait<'_> {
        Wait {
            list: self,
            slot: None,
        }
    }

    /// Wakes the task that has been parked the longest.
    ///
    /// The entry is unlinked *before* its waker runs, so the woken future
    /// performs no list access on resumption. Returns `true` if a task was
    /// woken, `false` if the list held no live waiters.
    ///
    /// # Example
    ///
    /// ```
    /// use weft_wait::WaitList;
    ///
    /// let list = WaitList::new();
    /// assert!(!list.wake_one()); // nothing parked
    /// ```
    pub fn wake_one(&self) -> bool {
        let slot = loop {
            let popped = self.slots.borrow_mut().pop_front();
            match popped {
                None => return false,
                Some(slot) if slot.state.get() == SlotState::Waiting => break slot,
                // Cancelled entry: discard and keep looking.
                Some(_) => {}
            }
        };

        slot.state.set(SlotState::Woken);
        self.waiting.set(self.waiting.get() - 1);

        // The list borrow is released; a waker may do anything it likes.
        let waker = slot.waker.borrow_mut().take();
        if let Some(waker) = waker {
            waker.wake();
        }
        true
    }

    /// Wakes every parked task, in FIFO order.
    ///
    /// Returns the number of tasks woken.
    pub fn wake_all(&self) -> usize {
        let mut woken = 0;
        while self.wake_one() {
            woken += 1;
        }
        woken
    }
}

impl Default for WaitList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WaitList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitList")
            .field("waiting", &self.waiting.get())
            .finish_non_exhaustive()
    }
}

/// Future returned by [`WaitList::wait`].
///
/// Completes when a wake on the owning list selects this waiter.
pub struct Wait<'a> {
    list: &'a WaitList,
    /// `Some` from the first poll until completion or cancellation.
    slot: Option<Rc<Slot>>,
}

impl Future for Wait<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let me = self.get_mut();
        match &me.slot {
            None => {
                let slot = Rc::new(Slot {
                    state: Cell::new(SlotState::Waiting),
                    waker: RefCell::new(Some(cx.waker().clone())),
                });
                me.list.slots.borrow_mut().push_back(Rc::clone(&slot));
                me.list.waiting.set(me.list.waiting.get() + 1);
                me.slot = Some(slot);
                Poll::Pending
            }
            Some(slot) => {
                if slot.state.get() == SlotState::Woken {
                    me.slot = None;
                    return Poll::Ready(());
                }
                // Still waiting; refresh the waker in case the task moved.
                *slot.waker.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl Drop for Wait<'_> {
    fn drop(&mut self) {
        let Some(slot) = self.slot.take() else { return };
        match slot.state.get() {
            SlotState::Waiting => {
                slot.state.set(SlotState::Cancelled);
                self.list.waiting.set(self.list.waiting.get() - 1);
            }
            // Selected but never resumed: the wake must not be lost.
            SlotState::Woken => {
                self.list.wake_one();
            }
            SlotState::Cancelled => {}
        }
    }
}

impl fmt::Debug for Wait<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wait")
            .field("linked", &self.slot.is_some())
            .finish_non_exhaustive()
    }
}
