//! A deterministic single-thread executor for bus tests.
//!
//! Tasks are polled from a FIFO ready queue: spawn order first, then wake
//! order. Re-polling happens only when a task's waker fires, so tests can
//! assert exact park/wake interleavings.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Wake, Waker};

type LocalFuture = Pin<Box<dyn Future<Output = ()>>>;

struct TaskWaker {
    id: usize,
    ready: Arc<Mutex<VecDeque<usize>>>,
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.ready.lock().unwrap().push_back(self.id);
    }
}

pub struct Executor {
    tasks: Vec<Option<LocalFuture>>,
    ready: Arc<Mutex<VecDeque<usize>>>,
}

impl Executor {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            ready: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Queues a task; it is first polled on the next run. Returns a task
    /// id usable with [`done`](Self::done) and [`cancel`](Self::cancel).
    pub fn spawn(&mut self, future: impl Future<Output = ()> + 'static) -> usize {
        let id = self.tasks.len();
        self.tasks.push(Some(Box::pin(future)));
        self.ready.lock().unwrap().push_back(id);
        id
    }

    /// Polls ready tasks until every one is parked or complete. Returns
    /// the number of polls performed.
    pub fn run_until_stalled(&mut self) -> usize {
        let mut polls = 0;
        loop {
            let id = self.ready.lock().unwrap().pop_front();
            let Some(id) = id else { break };
            // Spurious entries for finished or cancelled tasks are skipped.
            let Some(future) = self.tasks[id].as_mut() else {
                continue;
            };

            let waker = Waker::from(Arc::new(TaskWaker {
                id,
                ready: Arc::clone(&self.ready),
            }));
            let mut cx = Context::from_waker(&waker);
            polls += 1;
            if future.as_mut().poll(&mut cx).is_ready() {
                self.tasks[id] = None;
            }
        }
        polls
    }

    /// `true` once the task has run to completion.
    pub fn done(&self, id: usize) -> bool {
        self.tasks[id].is_none()
    }

    /// `true` once every spawned task has run to completion.
    pub fn all_done(&self) -> bool {
        self.tasks.iter().all(Option::is_none)
    }

    /// Drops a task in place, parked or not, without polling it again.
    pub fn cancel(&mut self, id: usize) {
        self.tasks[id] = None;
    }
}
