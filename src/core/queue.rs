//! Bounded multi-producer, single-consumer entry queue
//!
//! Producers call [`BoundedQueue::try_enqueue`], which never blocks: a full,
//! completed or disposed queue rejects the item and the caller drops it.
//! The single consumer suspends in [`BoundedQueue::wait_for_data`] until an
//! item arrives, the queue is completed and drained, or its
//! [`CancellationToken`] fires.

use crossbeam_channel::{bounded, Receiver, Select, Sender, TryRecvError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation signal shared between the logger and its dispatcher
///
/// Cancelling drops the internal sender, which disconnects the channel and
/// wakes anything selecting on it.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<CancelInner>,
}

struct CancelInner {
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (trigger, signal) = bounded(0);
        Self {
            inner: Arc::new(CancelInner {
                trigger: Mutex::new(Some(trigger)),
                signal,
            }),
        }
    }

    /// Fire the signal; idempotent
    pub fn cancel(&self) {
        self.inner.trigger.lock().take();
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.inner.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of waiting for queue data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// At least one item can be dequeued
    Ready,
    /// The deadline passed with nothing to dequeue
    TimedOut,
    /// The queue is completed and empty, or disposed
    Closed,
    /// The cancellation token fired
    Cancelled,
}

pub struct BoundedQueue<T> {
    /// Dropped on completion so the receiver observes disconnection
    sender: RwLock<Option<Sender<T>>>,
    receiver: Receiver<T>,
    capacity: usize,
    completed: AtomicBool,
    disposed: AtomicBool,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender: RwLock::new(Some(sender)),
            receiver,
            capacity,
            completed: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    /// Enqueue without blocking
    ///
    /// Returns `false` when the queue is full, completed or disposed; the
    /// item is dropped and nothing already queued is affected.
    pub fn try_enqueue(&self, item: T) -> bool {
        match self.sender.read().as_ref() {
            Some(sender) => sender.try_send(item).is_ok(),
            None => false,
        }
    }

    /// Pop the oldest item without blocking
    pub fn try_dequeue(&self) -> Option<T> {
        if self.is_disposed() {
            return None;
        }
        self.receiver.try_recv().ok()
    }

    /// Suspend until data is available
    ///
    /// Returns `true` immediately if items are present, `false` once the
    /// queue is completed and empty, disposed, or `cancel` fires.
    pub fn wait_for_data(&self, cancel: &CancellationToken) -> bool {
        self.wait(cancel, None) == WaitOutcome::Ready
    }

    /// Like [`BoundedQueue::wait_for_data`] but gives up after `timeout`
    pub fn wait_for_data_timeout(
        &self,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> WaitOutcome {
        self.wait(cancel, Some(Instant::now() + timeout))
    }

    fn wait(&self, cancel: &CancellationToken, deadline: Option<Instant>) -> WaitOutcome {
        loop {
            if self.is_disposed() {
                return WaitOutcome::Closed;
            }
            if !self.receiver.is_empty() {
                return WaitOutcome::Ready;
            }
            if cancel.is_cancelled() {
                return WaitOutcome::Cancelled;
            }
            if self.is_completed() {
                return WaitOutcome::Closed;
            }

            let mut select = Select::new();
            select.recv(&self.receiver);
            select.recv(cancel.signal());
            let woke = match deadline {
                Some(deadline) => select.ready_deadline(deadline).is_ok(),
                None => {
                    let _ = select.ready();
                    true
                }
            };
            if !woke {
                return if self.receiver.is_empty() {
                    WaitOutcome::TimedOut
                } else {
                    WaitOutcome::Ready
                };
            }
        }
    }

    /// Stop accepting items and wake the consumer; idempotent
    ///
    /// Items already queued stay available to `try_dequeue`.
    pub fn complete(&self) {
        let mut sender = self.sender.write();
        self.completed.store(true, Ordering::Release);
        sender.take();
    }

    /// Complete the queue and discard anything left in it; idempotent
    pub fn dispose(&self) {
        self.complete();
        if !self.disposed.swap(true, Ordering::AcqRel) {
            while self.receiver.try_recv().is_ok() {}
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
