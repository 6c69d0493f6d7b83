use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use trackloop_core::Frame;

/// Bounded hand-off queue between the transport receive path and the
/// detection worker.
///
/// Frames arrive on the network context and are drained by a single
/// CPU-bound worker; when the worker falls behind, the oldest frame is
/// dropped so memory stays bounded and detection works on the freshest
/// backlog. Depth and the cumulative drop count are observable.
#[derive(Clone)]
pub struct FrameQueue {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    notify: Notify,
    capacity: usize,
}

struct State {
    frames: VecDeque<Frame>,
    dropped: u64,
    closed: bool,
}

impl FrameQueue {
    pub fn new(capacity: usize) -> FrameQueue {
        assert!(capacity > 0, "queue capacity must be positive");
        FrameQueue {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    frames: VecDeque::with_capacity(capacity),
                    dropped: 0,
                    closed: false,
                }),
                notify: Notify::new(),
                capacity,
            }),
        }
    }

    /// Enqueue a frame, evicting the oldest one if the queue is full.
    /// Returns `false` if an eviction happened or the queue is closed.
    pub fn push(&self, frame: Frame) -> bool {
        let mut state = self.inner.state.lock().unwrap();
        if state.closed {
            return false;
        }
        let mut evicted = false;
        if state.frames.len() == self.inner.capacity {
            state.frames.pop_front();
            state.dropped += 1;
            evicted = true;
        }
        state.frames.push_back(frame);
        drop(state);
        self.inner.notify.notify_one();
        !evicted
    }

    /// Dequeue the next frame, waiting until one is available. Returns
    /// `None` once the queue is closed and drained.
    pub async fn pop(&self) -> Option<Frame> {
        loop {
            {
                let mut state = self.inner.state.lock().unwrap();
                if let Some(frame) = state.frames.pop_front() {
                    return Some(frame);
                }
                if state.closed {
                    return None;
                }
            }
            self.inner.notify.notified().await;
        }
    }

    /// Current backlog depth.
    pub fn len(&self) -> usize {
        self.inner.state.lock().unwrap().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of frames evicted so far.
    pub fn dropped(&self) -> u64 {
        self.inner.state.lock().unwrap().dropped
    }

    /// Close the queue. Pending frames are still handed out; after the
    /// backlog drains, `pop` returns `None`.
    pub fn close(&self) {
        self.inner.state.lock().unwrap().closed = true;
        self.inner.notify.notify_one();
    }
}
