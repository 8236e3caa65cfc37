//! Batch transfer tests: partial progress, zero-progress parking, k-wakes.

#![cfg(feature = "batch")]

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::Executor;
use futures::executor::block_on;
use weft_bus::{last_error, Bus, BusError, ErrorCode};

// ============================================================================
// Non-blocking batch
// ============================================================================

#[test]
fn partial_batch_is_clipped_to_free_space() {
    let bus = Bus::new();
    let id = bus.open(3);

    assert_eq!(bus.try_send_many(id, &[1, 2, 3, 4, 5]), Ok(3));
    assert_eq!(last_error(), ErrorCode::None);
    assert_eq!(bus.len(id), Some(3));

    for want in [1, 2, 3] {
        assert_eq!(bus.try_recv(id), Ok(want));
    }
}

#[test]
fn full_channel_refuses_batch() {
    let bus = Bus::new();
    let id = bus.open(2);
    bus.try_send_many(id, &[8, 9]).unwrap();

    assert_eq!(bus.try_send_many(id, &[1]), Err(BusError::WouldBlock));
    assert_eq!(last_error(), ErrorCode::WouldBlock);
    assert_eq!(bus.len(id), Some(2));
}

#[test]
fn empty_channel_refuses_drain() {
    let bus = Bus::new();
    let id = bus.open(2);

    let mut out = [0u32; 2];
    assert_eq!(bus.try_recv_many(id, &mut out), Err(BusError::WouldBlock));
    assert_eq!(last_error(), ErrorCode::WouldBlock);
}

#[test]
fn drain_is_clipped_both_ways() {
    let bus = Bus::new();
    let id = bus.open(4);
    bus.try_send_many(id, &[1, 2, 3]).unwrap();

    let mut small = [0u32; 2];
    assert_eq!(bus.try_recv_many(id, &mut small), Ok(2));
    assert_eq!(small, [1, 2]);

    let mut large = [0u32; 4];
    assert_eq!(bus.try_recv_many(id, &mut large), Ok(1));
    assert_eq!(large[0], 3);
}

#[test]
fn empty_slices_succeed_immediately() {
    let bus = Bus::new();
    let id = bus.open(1);
    bus.try_send(id, 1).unwrap(); // full: a non-empty send would block

    assert_eq!(bus.try_send_many(id, &[]), Ok(0));
    assert_eq!(last_error(), ErrorCode::None);

    bus.try_recv(id).unwrap(); // empty: a non-empty drain would block
    assert_eq!(bus.try_recv_many(id, &mut []), Ok(0));
    assert_eq!(last_error(), ErrorCode::None);

    bus.close(id);
    assert_eq!(bus.try_send_many(id, &[]), Err(BusError::NoChannel));
}

#[test]
fn batch_ops_on_stale_id_are_no_channel() {
    let bus = Bus::new();
    let id = bus.open(2);
    bus.close(id);

    let mut out = [0u32; 2];
    assert_eq!(bus.try_send_many(id, &[1, 2]), Err(BusError::NoChannel));
    assert_eq!(bus.try_recv_many(id, &mut out), Err(BusError::NoChannel));
    assert_eq!(last_error(), ErrorCode::NoChannel);
}

// ============================================================================
// Blocking batch
// ============================================================================

#[test]
fn send_many_without_contention() {
    block_on(async {
        let bus = Bus::new();
        let id = bus.open(4);

        assert_eq!(bus.send_many(id, &[1, 2, 3]).await, Ok(3));
        assert_eq!(bus.send_many(id, &[]).await, Ok(0));

        let mut out = [0u32; 4];
        assert_eq!(bus.recv_many(id, &mut out).await, Ok(3));
        assert_eq!(&out[..3], &[1, 2, 3]);
        assert_eq!(bus.recv_many(id, &mut []).await, Ok(0));
    });
}

#[test]
fn send_many_returns_first_nonzero_batch() {
    let mut executor = Executor::new();
    let bus = Rc::new(Bus::new());
    let id = bus.open(2);
    bus.try_send_many(id, &[8, 9]).unwrap();

    let outcome = Rc::new(Cell::new(None));
    let producer = Rc::clone(&bus);
    let slot = Rc::clone(&outcome);
    executor.spawn(async move {
        slot.set(Some(producer.send_many(id, &[1, 2, 3]).await));
    });

    executor.run_until_stalled();
    assert_eq!(outcome.get(), None);
    assert_eq!(bus.blocked_senders(id), Some(1));

    // One slot frees up; the sender takes it and returns without waiting
    // for room for the rest.
    assert_eq!(bus.try_recv(id), Ok(8));
    executor.run_until_stalled();
    assert!(executor.all_done());
    assert_eq!(outcome.get(), Some(Ok(1)));
    assert_eq!(bus.try_recv(id), Ok(9));
    assert_eq!(bus.try_recv(id), Ok(1));
}

#[test]
fn batch_send_wakes_one_receiver_per_word() {
    let mut executor = Executor::new();
    let bus = Rc::new(Bus::new());
    let id = bus.open(4);

    let received = Rc::new(RefCell::new(Vec::new()));
    let mut tasks = Vec::new();
    for _ in 0..4 {
        let consumer = Rc::clone(&bus);
        let sink = Rc::clone(&received);
        tasks.push(executor.spawn(async move {
            let word = consumer.recv(id).await.unwrap();
            sink.borrow_mut().push(word);
        }));
    }
    executor.run_until_stalled();
    assert_eq!(bus.blocked_receivers(id), Some(4));

    // Three words satisfy exactly three of the four parked receivers.
    assert_eq!(bus.try_send_many(id, &[1, 2, 3]), Ok(3));
    executor.run_until_stalled();

    assert_eq!(*received.borrow(), vec![1, 2, 3]);
    assert!(!executor.done(tasks[3]));
    assert_eq!(bus.blocked_receivers(id), Some(1));
}

#[test]
fn batch_drain_wakes_one_sender_per_word() {
    let mut executor = Executor::new();
    let bus = Rc::new(Bus::new());
    let id = bus.open(2);
    bus.try_send_many(id, &[1, 2]).unwrap();

    for word in [3u32, 4] {
        let producer = Rc::clone(&bus);
        executor.spawn(async move {
            producer.send(id, word).await.unwrap();
        });
    }
    executor.run_until_stalled();
    assert_eq!(bus.blocked_senders(id), Some(2));

    // Draining two words frees two slots and releases both senders.
    let mut out = [0u32; 2];
    assert_eq!(bus.try_recv_many(id, &mut out), Ok(2));
    assert_eq!(out, [1, 2]);

    executor.run_until_stalled();
    assert!(executor.all_done());
    assert_eq!(bus.len(id), Some(2));
    assert_eq!(bus.try_recv(id), Ok(3));
    assert_eq!(bus.try_recv(id), Ok(4));
}

#[test]
fn recv_many_parks_until_data() {
    let mut executor = Executor::new();
    let bus = Rc::new(Bus::new());
    let id = bus.open(4);

    let outcome = Rc::new(Cell::new(None));
    let consumer = Rc::clone(&bus);
    let slot = Rc::clone(&outcome);
    executor.spawn(async move {
        let mut out = [0u32; 3];
        let result = consumer.recv_many(id, &mut out).await;
        slot.set(Some(result.map(|count| out[..count].to_vec())));
    });

    executor.run_until_stalled();
    assert_eq!(bus.blocked_receivers(id), Some(1));

    bus.try_send(id, 5).unwrap();
    executor.run_until_stalled();
    assert!(executor.all_done());
    // First non-empty batch: a single word, not a filled slice.
    assert_eq!(outcome.take(), Some(Ok(vec![5])));
}

#[test]
fn close_releases_parked_batch_sender() {
    let mut executor = Executor::new();
    let bus = Rc::new(Bus::new());
    let id = bus.open(1);
    bus.try_send(id, 0).unwrap();

    let outcome = Rc::new(Cell::new(None));
    let producer = Rc::clone(&bus);
    let slot = Rc::clone(&outcome);
    executor.spawn(async move {
        slot.set(Some(producer.send_many(id, &[7, 8]).await));
    });
    executor.run_until_stalled();
    assert_eq!(bus.blocked_senders(id), Some(1));

    bus.close(id);
    executor.run_until_stalled();
    assert!(executor.all_done());
    assert_eq!(outcome.get(), Some(Err(BusError::NoChannel)));
}
