use keywell_core::Key;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tracing::warn;

/// FIFO store of reserved-but-unissued keys.
///
/// The buffer is the only shared mutable state of the supply: a single
/// mutex guards the queue, so concurrent [`try_take`](Self::try_take) calls
/// can never hand the same key to two consumers. Keys are issued in arrival
/// order, so earlier batches drain before newer ones.
#[derive(Debug)]
pub struct KeyBuffer {
    state: Mutex<BufferState>,
    capacity: usize,
    available: Notify,
}

#[derive(Debug)]
struct BufferState {
    queue: VecDeque<Key>,
    /// Mirror of `queue` upholding the no-key-twice invariant. A hit here
    /// means the remote broke its never-reissue contract.
    resident: HashSet<Key>,
}

impl KeyBuffer {
    /// Creates an empty buffer with a hard capacity ceiling.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(BufferState {
                queue: VecDeque::with_capacity(capacity),
                resident: HashSet::with_capacity(capacity),
            }),
            capacity,
            available: Notify::new(),
        }
    }

    /// Pops the oldest key, or `None` when the buffer is empty. Never
    /// blocks.
    pub fn try_take(&self) -> Option<Key> {
        let mut state = self.lock();
        let key = state.queue.pop_front()?;
        state.resident.remove(&key);
        Some(key)
    }

    /// Appends a batch in order, up to capacity.
    ///
    /// Keys beyond the remaining capacity are discarded — over-fetching is
    /// an accepted trade-off that keeps batch sizing simple — as are keys
    /// already resident. Returns the count actually added and wakes bounded
    /// waiters when that count is non-zero.
    pub fn put(&self, batch: Vec<Key>) -> usize {
        let mut added = 0;
        {
            let mut state = self.lock();
            for key in batch {
                if state.queue.len() >= self.capacity {
                    break;
                }
                if !state.resident.insert(key.clone()) {
                    warn!(key = %key, "dropping key already resident in buffer");
                    continue;
                }
                state.queue.push_back(key);
                added += 1;
            }
        }
        if added > 0 {
            self.available.notify_waiters();
        }
        added
    }

    /// Number of keys currently resident.
    pub fn occupancy(&self) -> usize {
        self.lock().queue.len()
    }

    /// The hard ceiling this buffer was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Future that resolves once keys are added.
    ///
    /// Callers must `enable` the returned future before re-checking
    /// [`try_take`](Self::try_take), otherwise a put landing between the
    /// check and the await is missed.
    pub fn notified(&self) -> Notified<'_> {
        self.available.notified()
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        // A poisoned lock only means another thread panicked mid-call; the
        // queue and mirror are updated together, so the state stays usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
