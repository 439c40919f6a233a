//! Background consumer loop
//!
//! The dispatcher drains the queue into a batch and hands the batch to
//! every sink when either trigger fires: the batch reaches `batch_size`, or
//! `flush_interval` has passed since the last flush. It runs on one named
//! thread per logger and only exits once the queue is completed and empty
//! or the cancellation token fires.

use super::{
    diagnostics::Diagnostics,
    error::LoggerError,
    log_entry::LogEntry,
    metrics::LoggerMetrics,
    queue::{BoundedQueue, CancellationToken, WaitOutcome},
    sink::Sink,
};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use parking_lot::Mutex;
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Sinks shared between the dispatcher and the owning logger
///
/// Only the dispatcher writes through them; the logger locks them solely to
/// close the sinks when the dispatcher failed to stop in time.
pub type SharedSinks = Arc<Mutex<Vec<Box<dyn Sink>>>>;

const THREAD_NAME: &str = "batchlog-dispatcher";

/// Observable phase of the consumer loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DispatcherState {
    /// Waiting for entries or for the flush window
    Idle = 0,
    /// Moving queued entries into the batch
    Draining = 1,
    /// Handing a batch to the sinks
    Flushing = 2,
    /// Final flush done and sinks closed
    Stopped = 3,
}

impl DispatcherState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => DispatcherState::Idle,
            1 => DispatcherState::Draining,
            2 => DispatcherState::Flushing,
            _ => DispatcherState::Stopped,
        }
    }
}

pub struct Dispatcher {
    queue: Arc<BoundedQueue<LogEntry>>,
    sinks: SharedSinks,
    cancel: CancellationToken,
    batch_size: usize,
    flush_interval: Duration,
    metrics: Arc<LoggerMetrics>,
    diagnostics: Diagnostics,
    state: Arc<AtomicU8>,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<BoundedQueue<LogEntry>>,
        sinks: SharedSinks,
        cancel: CancellationToken,
        batch_size: usize,
        flush_interval: Duration,
        metrics: Arc<LoggerMetrics>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            queue,
            sinks,
            cancel,
            batch_size: batch_size.max(1),
            flush_interval,
            metrics,
            diagnostics,
            state: Arc::new(AtomicU8::new(DispatcherState::Idle as u8)),
        }
    }

    /// Start the consumer loop on its own thread
    ///
    /// # Errors
    ///
    /// Returns error if the OS refuses to spawn the thread
    pub fn spawn(self) -> io::Result<DispatcherHandle> {
        let (done_tx, done_rx) = bounded::<()>(0);
        let state = Arc::clone(&self.state);
        let diagnostics = self.diagnostics.clone();

        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                // Dropped on exit, including unwinding, which wakes `wait`
                let _done = done_tx;
                self.run();
            })?;

        Ok(DispatcherHandle {
            thread: Some(thread),
            done: done_rx,
            state,
            diagnostics,
        })
    }

    fn set_state(&self, state: DispatcherState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn run(self) {
        let mut batch: Vec<LogEntry> = Vec::with_capacity(self.batch_size);
        let mut last_flush = Instant::now();

        loop {
            self.set_state(DispatcherState::Idle);

            // An empty batch has no deadline; a pending one must go out when
            // the interval since the last flush runs out
            let outcome = if batch.is_empty() {
                if self.queue.wait_for_data(&self.cancel) {
                    WaitOutcome::Ready
                } else {
                    WaitOutcome::Closed
                }
            } else {
                let remaining = self.flush_interval.saturating_sub(last_flush.elapsed());
                self.queue.wait_for_data_timeout(&self.cancel, remaining)
            };

            match outcome {
                WaitOutcome::Ready => {}
                WaitOutcome::TimedOut => {
                    self.flush(&mut batch);
                    last_flush = Instant::now();
                    continue;
                }
                WaitOutcome::Closed | WaitOutcome::Cancelled => break,
            }

            self.set_state(DispatcherState::Draining);
            while let Some(entry) = self.queue.try_dequeue() {
                batch.push(entry);
                if batch.len() >= self.batch_size {
                    self.flush(&mut batch);
                    last_flush = Instant::now();
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    self.set_state(DispatcherState::Draining);
                }
            }

            // The clock is only read when the size trigger left entries behind
            if !batch.is_empty() && last_flush.elapsed() >= self.flush_interval {
                self.flush(&mut batch);
                last_flush = Instant::now();
            }

            if self.cancel.is_cancelled() {
                break;
            }
        }

        self.flush(&mut batch);
        self.close_sinks();
        self.set_state(DispatcherState::Stopped);
    }

    /// Hand `batch` to every sink, then clear it
    ///
    /// A failing or panicking sink is reported and skipped; the other sinks
    /// still receive the batch.
    fn flush(&self, batch: &mut Vec<LogEntry>) {
        if batch.is_empty() {
            return;
        }
        self.set_state(DispatcherState::Flushing);

        let mut sinks = self.sinks.lock();
        for sink in sinks.iter_mut() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                sink.write_batch(batch)?;
                sink.flush()
            }));
            self.handle_result(sink.name(), result);
        }
        drop(sinks);

        self.metrics.record_batch(batch.len());
        batch.clear();
    }

    fn close_sinks(&self) {
        let mut sinks = self.sinks.lock();
        for sink in sinks.iter_mut() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| sink.close()));
            self.handle_result(sink.name(), result);
        }
    }

    fn handle_result(
        &self,
        sink: &str,
        result: thread::Result<super::error::Result<()>>,
    ) {
        let error = match result {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e,
            Err(payload) => LoggerError::SinkPanicked {
                sink: sink.to_string(),
                message: panic_message(payload.as_ref()),
            },
        };
        self.metrics.record_sink_error();
        self.diagnostics.report(&error);
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Join handle for a running dispatcher
pub struct DispatcherHandle {
    thread: Option<thread::JoinHandle<()>>,
    done: Receiver<()>,
    state: Arc<AtomicU8>,
    diagnostics: Diagnostics,
}

impl DispatcherHandle {
    /// Wait up to `timeout` for the loop to exit
    ///
    /// Returns `true` once the thread has finished and been joined.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        match self.done.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(thread) = self.thread.take() {
                    if let Err(payload) = thread.join() {
                        self.diagnostics.report(&LoggerError::SinkPanicked {
                            sink: THREAD_NAME.to_string(),
                            message: panic_message(payload.as_ref()),
                        });
                    }
                }
                true
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.state.load(Ordering::Acquire))
    }
}
