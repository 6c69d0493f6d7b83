use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};

/// Lifecycle of a peer link. Transitions are explicit and checked; the
/// handshake drives `Idle -> Negotiating -> Connected`, the first media
/// frame (or `begin_streaming` on the sending side) drives
/// `Connected -> Streaming`, and `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Negotiating,
    Connected,
    Streaming,
    Closed,
}

impl LinkState {
    fn allows(self, next: LinkState) -> bool {
        use LinkState::*;
        matches!(
            (self, next),
            (Idle, Negotiating)
                | (Negotiating, Connected)
                | (Connected, Streaming)
                | (Negotiating, Closed)
                | (Connected, Closed)
                | (Streaming, Closed)
        )
    }
}

/// State cell shared between the two halves of a split link.
#[derive(Clone, Debug)]
pub(crate) struct SharedLinkState {
    inner: Arc<Mutex<LinkState>>,
}

impl SharedLinkState {
    pub(crate) fn new() -> SharedLinkState {
        SharedLinkState {
            inner: Arc::new(Mutex::new(LinkState::Idle)),
        }
    }

    pub(crate) fn get(&self) -> LinkState {
        *self.inner.lock().unwrap()
    }

    /// Advance to `next`, failing on a transition the lifecycle does not
    /// name. Closing an already closed link is a no-op.
    pub(crate) fn advance(&self, next: LinkState) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        if *state == LinkState::Closed && next == LinkState::Closed {
            return Ok(());
        }
        if !state.allows(next) {
            bail!("invalid link transition {:?} -> {:?}", *state, next);
        }
        *state = next;
        Ok(())
    }

    pub(crate) fn require(&self, allowed: &[LinkState]) -> Result<()> {
        let state = self.get();
        if !allowed.contains(&state) {
            bail!("operation not allowed in link state {:?}", state);
        }
        Ok(())
    }
}
