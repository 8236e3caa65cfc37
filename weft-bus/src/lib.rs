//! A cooperative in-process message bus over bounded word channels.
//!
//! `weft-bus` multiplexes an unbounded, dynamically-grown family of bounded
//! FIFO channels between cooperative tasks on a single thread. Producers
//! submit 32-bit words, consumers drain them in per-channel FIFO order, and
//! blocked parties park on per-channel wait lists (see [`weft_wait`]) until
//! the other side makes progress or the channel is closed.
//!
//! # Execution model
//!
//! The whole bus is single-threaded and cooperative:
//!
//! ```text
//! ┌────────────────────────── one executor thread ──────────────────────────┐
//! │  producer task ── send ──▶ ┌─────────────┐ ◀── recv ── consumer task    │
//! │       │ full? park         │  Bus        │        empty? park │         │
//! │       ▼                    │  ┌────────┐ │                    ▼         │
//! │  [send wait list] ◀─wake── │  │channel │ │ ──wake─▶ [recv wait list]    │
//! │                            │  │  table │ │                              │
//! │                            │  └────────┘ │                              │
//! │                            └─────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There are no locks, no atomics, and no memory fences anywhere in the
//! crate: between two of its own suspension points a task has exclusive
//! access to bus state. [`Bus`] is deliberately `!Send`; share it between
//! tasks with an [`Rc`](std::rc::Rc) on any local (non-work-stealing)
//! executor. Blocking operations are `async fn`s; the `try_*` variants
//! never suspend.
//!
//! # Channels and ids
//!
//! [`Bus::open`] hands out dense integer [`ChannelId`]s backed by a slot
//! table with hole reuse: closing a channel vacates its slot, and the next
//! open reuses the lowest vacant slot before the table grows (by doubling).
//! An id is stable for its channel's lifetime.
//!
//! # Closing with parked waiters
//!
//! [`Bus::close`] may run while tasks are parked on the channel. The slot
//! is vacated and the channel marked closed first, then every waiter is
//! unlinked and woken by the closer; released tasks observe the close on
//! resumption and return [`BusError::NoChannel`], even if their slot was
//! already reused for a fresh channel. Parked futures keep the channel
//! state alive through their own reference, so teardown can never race a
//! waiter into freed storage.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//!
//! use futures::executor::LocalPool;
//! use futures::task::LocalSpawnExt;
//! use weft_bus::Bus;
//!
//! let mut pool = LocalPool::new();
//! let bus = Rc::new(Bus::new());
//! let id = bus.open(1);
//!
//! let producer = Rc::clone(&bus);
//! pool.spawner()
//!     .spawn_local(async move {
//!         for word in 0..4 {
//!             producer.send(id, word).await.unwrap();
//!         }
//!     })
//!     .unwrap();
//!
//! let consumer = Rc::clone(&bus);
//! pool.spawner()
//!     .spawn_local(async move {
//!         for want in 0..4 {
//!             assert_eq!(consumer.recv(id).await.unwrap(), want);
//!         }
//!     })
//!     .unwrap();
//!
//! pool.run();
//! ```
//!
//! # Errors
//!
//! Operations return [`BusError`] directly. In addition, every operation
//! records its outcome in a thread-local [`ErrorCode`] cell readable
//! through [`last_error`], a compatibility surface for callers ported
//! from errno-style APIs.
//!
//! # Feature flags
//!
//! - `batch` (default): multi-word transfer with partial progress,
//!   [`Bus::send_many`], [`Bus::recv_many`] and their `try_*` variants.
//! - `broadcast` (default): all-or-none delivery to every live channel,
//!   [`Bus::broadcast`] and [`Bus::try_broadcast`].

#![warn(missing_docs, missing_debug_implementations)]

mod bus;
mod channel;
mod error;
mod table;

#[cfg(feature = "batch")]
mod batch;
#[cfg(feature = "broadcast")]
mod broadcast;

pub use bus::Bus;
pub use channel::ChannelId;
pub use error::{last_error, set_last_error, BusError, ErrorCode};
