// src/screen.rs
//! Lifetime of one open home screen.
//!
//! The screen subscribes to the store before its worker starts, so no write
//! between opening and the first pass is missed. The worker computes
//! snapshots off the UI thread; the UI thread calls [`HomeScreen::pump`] to
//! apply the newest one. Closing cancels the worker and detaches the view.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::feed::{CancellationToken, Subscription, Wait};
use crate::identity::IdentityProvider;
use crate::presenter::{HomePresenter, HomeSnapshot, HomeView};

/// How often an idle worker checks for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Source of "now" for refresh passes.
pub trait Clock: Send + Sync + 'static {
    type Tz: TimeZone;
    fn now(&self) -> DateTime<Self::Tz>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Tz = Local;
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock<Tz: TimeZone>(pub DateTime<Tz>);

impl<Tz> Clock for FixedClock<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync,
{
    type Tz = Tz;
    fn now(&self) -> DateTime<Tz> {
        self.0.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    /// Listening, nothing rendered yet.
    Subscribed,
    Rendered,
    Closed,
}

pub struct HomeScreen<V, I, C>
where
    V: HomeView,
    I: IdentityProvider + 'static,
    C: Clock,
{
    presenter: Arc<HomePresenter<I>>,
    clock: Arc<C>,
    view: Option<V>,
    updates: Receiver<HomeSnapshot>,
    token: CancellationToken,
    worker: Option<JoinHandle<()>>,
    state: ScreenState,
}

impl<V, I, C> HomeScreen<V, I, C>
where
    V: HomeView,
    I: IdentityProvider + 'static,
    C: Clock,
{
    /// Subscribes to the store and starts the refresh worker. The first
    /// snapshot is computed right away; call [`HomeScreen::pump`] or
    /// [`HomeScreen::wait_for_render`] to show it.
    pub fn open(presenter: HomePresenter<I>, view: V, clock: C) -> Result<Self> {
        let presenter = Arc::new(presenter);
        let clock = Arc::new(clock);
        let subscription = presenter.store().subscribe();
        let token = CancellationToken::new();
        let (sender, updates) = mpsc::channel();

        let worker = {
            let presenter = Arc::clone(&presenter);
            let clock = Arc::clone(&clock);
            let token = token.clone();
            thread::Builder::new()
                .name("home-refresh".to_string())
                .spawn(move || run_worker(&presenter, clock.as_ref(), &subscription, &token, &sender))
                .context("Failed to start the home screen refresh worker")?
        };
        debug!("Home screen opened");

        Ok(Self {
            presenter,
            clock,
            view: Some(view),
            updates,
            token,
            worker: Some(worker),
            state: ScreenState::Subscribed,
        })
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    /// `None` once the screen is closed.
    pub fn view(&self) -> Option<&V> {
        self.view.as_ref()
    }

    /// Applies the newest pending snapshot, skipping stale ones.
    /// Returns whether the view changed.
    pub fn pump(&mut self) -> bool {
        let latest = self.updates.try_iter().last();
        self.apply(latest)
    }

    /// Blocks up to `timeout` for a snapshot, then behaves like [`HomeScreen::pump`].
    pub fn wait_for_render(&mut self, timeout: Duration) -> bool {
        if self.view.is_none() {
            return false;
        }
        match self.updates.recv_timeout(timeout) {
            Ok(first) => {
                let latest = self.updates.try_iter().last().unwrap_or(first);
                self.apply(Some(latest))
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Home refresh worker is gone");
                false
            }
        }
    }

    fn apply(&mut self, snapshot: Option<HomeSnapshot>) -> bool {
        match (self.view.as_mut(), snapshot) {
            (Some(view), Some(snapshot)) => {
                snapshot.apply(view);
                self.state = ScreenState::Rendered;
                true
            }
            _ => false,
        }
    }

    /// Writes the goal's new state. The re-render arrives through the
    /// store's change notification like any other update.
    pub fn toggle_goal(&self, goal_id: i64, completed: bool) -> Result<()> {
        let now = self.clock.now().with_timezone(&Utc);
        self.presenter.toggle_goal(goal_id, completed, now)?;
        Ok(())
    }

    /// Stops the worker and detaches the view. Idempotent.
    pub fn close(&mut self) {
        self.token.cancel();
        self.view = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Home refresh worker panicked");
            }
            debug!("Home screen closed");
        }
        self.state = ScreenState::Closed;
    }
}

impl<V, I, C> Drop for HomeScreen<V, I, C>
where
    V: HomeView,
    I: IdentityProvider + 'static,
    C: Clock,
{
    fn drop(&mut self) {
        self.close();
    }
}

fn run_worker<I: IdentityProvider, C: Clock>(
    presenter: &HomePresenter<I>,
    clock: &C,
    subscription: &Subscription,
    token: &CancellationToken,
    sender: &Sender<HomeSnapshot>,
) {
    let mut dirty = true;
    loop {
        if token.is_cancelled() {
            break;
        }
        if dirty {
            dirty = false;
            match presenter.snapshot(&clock.now()) {
                Ok(Some(snapshot)) => {
                    if token.is_cancelled() || sender.send(snapshot).is_err() {
                        break;
                    }
                }
                Ok(None) => warn!("No signed-in user, home dashboard not rendered"),
                Err(e) => error!("Home dashboard refresh failed: {e:#}"),
            }
        }
        match subscription.wait(POLL_INTERVAL) {
            Wait::Changed(changes) => {
                debug!(?changes, "Store changed, refreshing");
                dirty = true;
            }
            Wait::TimedOut => {}
            Wait::Closed => break,
        }
    }
}
