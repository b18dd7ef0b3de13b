//! Bounded frame handoff between the decode producer and the playback
//! consumer.
//!
//! A [`FrameChannel`] is a fixed-capacity FIFO shared by exactly one
//! producer thread and one consumer thread. [`FrameChannel::push`] blocks
//! while the queue is full, which bounds memory growth when decoding
//! outruns rendering; [`FrameChannel::pop`] blocks while the queue is
//! empty and the channel is still open. When the consumer removes the last
//! queued item the channel signals its drain condition, which
//! [`FrameChannel::wait_drained`] exposes to the top-level controller so
//! decode/scale contexts are only released after every buffered frame has
//! been consumed.
//!
//! All queue state lives under a single lock; the not-full, not-empty and
//! drain conditions share it. An optional [`ChannelObserver`] supplied at
//! construction is notified (outside the lock, with a status snapshot)
//! after each add and after each non-empty-to-empty transition.
//!
//! The channel assumes single-producer/single-consumer use. Pushing after
//! [`FrameChannel::close`] is a programming error and panics.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// Default queue capacity used by the playback driver.
pub const DEFAULT_CAPACITY: usize = 10;

/// Snapshot of the channel's synchronization state, taken at the moment a
/// transition happened and handed to the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStatus {
    /// Queue length right after the transition.
    pub len: usize,
    /// True iff the queue held at least one item after the transition.
    pub has_data: bool,
}

/// Observer capability invoked on queue transitions.
///
/// Replaces ad hoc callback/argument slots: the observer is a typed object
/// supplied at construction. Both methods default to no-ops. Observers run
/// on the thread that caused the transition and must not call back into
/// the channel.
pub trait ChannelObserver: Send + Sync {
    /// An item was appended.
    fn on_add(&self, _status: &ChannelStatus) {}

    /// The queue transitioned from non-empty to empty.
    fn on_drain(&self, _status: &ChannelStatus) {}
}

/// Observer that ignores every transition.
pub struct NoopObserver;

impl ChannelObserver for NoopObserver {}

struct Inner<T> {
    queue: VecDeque<T>,
    has_data: bool,
    closed: bool,
}

/// Bounded single-producer/single-consumer FIFO with a drain signal.
pub struct FrameChannel<T> {
    inner: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    drained: Condvar,
    capacity: usize,
    observer: Box<dyn ChannelObserver>,
}

impl<T> FrameChannel<T> {
    /// Creates an empty channel with the given fixed capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_observer(capacity, NoopObserver)
    }

    /// Creates an empty channel with an observer notified on add/drain.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_observer(capacity: usize, observer: impl ChannelObserver + 'static) -> Self {
        assert!(capacity > 0, "channel capacity must be positive");
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::with_capacity(capacity),
                has_data: false,
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            drained: Condvar::new(),
            capacity,
            observer: Box::new(observer),
        }
    }

    /// Appends an item at the tail, blocking while the queue is full.
    ///
    /// Items are never dropped or reordered.
    ///
    /// # Panics
    ///
    /// Panics if the channel has been closed (contract violation).
    pub fn push(&self, item: T) {
        let status = {
            let mut inner = self.inner.lock();
            while inner.queue.len() == self.capacity && !inner.closed {
                self.not_full.wait(&mut inner);
            }
            assert!(!inner.closed, "push on closed channel");
            inner.queue.push_back(item);
            inner.has_data = true;
            self.not_empty.notify_one();
            ChannelStatus {
                len: inner.queue.len(),
                has_data: true,
            }
        };
        self.observer.on_add(&status);
    }

    /// Removes and returns the head item, blocking while the queue is
    /// empty and the channel is open.
    ///
    /// Returns `None` once the channel is closed and fully drained. On the
    /// non-empty-to-empty transition the drain condition is signalled
    /// exactly once.
    pub fn pop(&self) -> Option<T> {
        let (item, drain_status) = {
            let mut inner = self.inner.lock();
            while inner.queue.is_empty() {
                if inner.closed {
                    return None;
                }
                self.not_empty.wait(&mut inner);
            }
            let item = inner.queue.pop_front()?;
            self.not_full.notify_one();
            let drain_status = if inner.queue.is_empty() {
                inner.has_data = false;
                self.drained.notify_all();
                Some(ChannelStatus {
                    len: 0,
                    has_data: false,
                })
            } else {
                None
            };
            (item, drain_status)
        };
        if let Some(status) = drain_status {
            self.observer.on_drain(&status);
        }
        Some(item)
    }

    /// Blocks until the queue is observed empty under the channel lock.
    ///
    /// Used by the controller at end-of-stream to guarantee every pushed
    /// frame has been consumed before shared decode resources are torn
    /// down.
    pub fn wait_drained(&self) {
        let mut inner = self.inner.lock();
        while inner.has_data {
            self.drained.wait(&mut inner);
        }
    }

    /// Marks end-of-stream: no further pushes will arrive.
    ///
    /// Wakes blocked consumers so `pop` can return `None`.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
        self.drained.notify_all();
    }

    /// Current queue length.
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fixed capacity chosen at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True iff the queue currently holds at least one item.
    pub fn has_data(&self) -> bool {
        self.inner.lock().has_data
    }
}
