// src/feed.rs
//! Change notification between the store and open screens.
//!
//! Every write through [`crate::store::Store`] publishes a [`Change`]. A
//! screen holds a [`Subscription`]; dropping it unregisters the listener.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// Which table a write touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    Users,
    Sessions,
    Goals,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    senders: Vec<(u64, Sender<Change>)>,
}

fn lock(listeners: &Mutex<Listeners>) -> MutexGuard<'_, Listeners> {
    // A panicking publisher cannot leave the list half-updated.
    listeners.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Default)]
pub struct ChangeFeed {
    listeners: Arc<Mutex<Listeners>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.senders.push((id, sender));
        Subscription {
            id,
            receiver,
            feed: Arc::downgrade(&self.listeners),
        }
    }

    /// Notifies every live subscriber. Listeners whose receiver is gone are pruned.
    pub fn publish(&self, change: Change) {
        lock(&self.listeners)
            .senders
            .retain(|(_, sender)| sender.send(change).is_ok());
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).senders.len()
    }
}

/// Outcome of waiting on a [`Subscription`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wait {
    /// Every change queued since the last wait, oldest first.
    Changed(Vec<Change>),
    TimedOut,
    /// The feed was dropped; nothing will arrive any more.
    Closed,
}

pub struct Subscription {
    id: u64,
    receiver: Receiver<Change>,
    feed: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Blocks for up to `timeout` for one change, then drains whatever else is
    /// already queued so a burst of writes is handled as one batch.
    pub fn wait(&self, timeout: Duration) -> Wait {
        match self.receiver.recv_timeout(timeout) {
            Ok(first) => {
                let mut batch = vec![first];
                batch.extend(self.receiver.try_iter());
                Wait::Changed(batch)
            }
            Err(RecvTimeoutError::Timeout) => Wait::TimedOut,
            Err(RecvTimeoutError::Disconnected) => Wait::Closed,
        }
    }

    /// Non-blocking variant of [`Subscription::wait`].
    pub fn drain(&self) -> Vec<Change> {
        self.receiver.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.feed.upgrade() {
            lock(&listeners)
                .senders
                .retain(|(id, _)| *id != self.id);
        }
    }
}

/// Shared flag tying background work to the lifetime of a screen.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
