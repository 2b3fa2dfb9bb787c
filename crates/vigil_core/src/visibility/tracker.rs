//! Application visibility tracker.
//!
//! # Responsibility
//! - Hold the current host visibility snapshot.
//! - Turn host lifecycle signals into edge-triggered listener callbacks.
//! - Hand out cancellation handles so listeners can detach themselves.
//!
//! # Invariants
//! - Repeated host signals for the same state produce no callbacks.
//! - Subscribing never replays the current state (no catch-up events).
//! - Listener callbacks run without the state lock held.
//! - Once `Subscription::cancel` returns, no new delivery starts for it.

use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use uuid::Uuid;

/// Host visibility as last reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostVisibility {
    /// No host signal received yet; treated as not visible.
    Unknown,
    Foreground,
    Background,
}

/// Visibility edge delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    EnteredForeground,
    EnteredBackground,
}

impl Transition {
    fn target(self) -> HostVisibility {
        match self {
            Self::EnteredForeground => HostVisibility::Foreground,
            Self::EnteredBackground => HostVisibility::Background,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::EnteredForeground => "foreground",
            Self::EnteredBackground => "background",
        }
    }
}

/// Receiver of visibility edges.
///
/// Each callback gets its own subscription handle; calling
/// [`Subscription::cancel`] inside the callback makes it one-shot.
pub trait VisibilityListener: Send + Sync {
    fn on_enter_foreground(&self, _subscription: &Subscription) {}
    fn on_enter_background(&self, _subscription: &Subscription) {}
}

/// Cancellation handle for one registered listener.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: Uuid,
    active: Arc<AtomicBool>,
    tracker: Weak<TrackerShared>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Detaches the listener. Idempotent; safe to call from its own callback.
    pub fn cancel(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(shared) = self.tracker.upgrade() {
            shared
                .lock_state()
                .listeners
                .retain(|entry| entry.subscription.id != self.id);
        }
        debug!(
            "event=visibility_unsubscribe module=visibility status=ok subscription={}",
            self.id
        );
    }
}

#[derive(Clone)]
struct ListenerEntry {
    subscription: Subscription,
    listener: Arc<dyn VisibilityListener>,
}

struct TrackerState {
    visibility: HostVisibility,
    listeners: Vec<ListenerEntry>,
}

#[derive(Debug)]
struct TrackerShared {
    state: Mutex<TrackerState>,
    // Serializes edge detection with delivery so listeners see edges in order.
    dispatch: Mutex<()>,
}

impl std::fmt::Debug for TrackerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerState")
            .field("visibility", &self.visibility)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TrackerShared {
    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Process visibility tracker handle. Clones share the same state.
#[derive(Debug, Clone)]
pub struct VisibilityTracker {
    shared: Arc<TrackerShared>,
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(TrackerShared {
                state: Mutex::new(TrackerState {
                    visibility: HostVisibility::Unknown,
                    listeners: Vec::new(),
                }),
                dispatch: Mutex::new(()),
            }),
        }
    }

    /// Returns whether the app is confirmed to be in the foreground.
    pub fn is_visible(&self) -> bool {
        self.visibility() == HostVisibility::Foreground
    }

    pub fn visibility(&self) -> HostVisibility {
        self.shared.lock_state().visibility
    }

    pub fn listener_count(&self) -> usize {
        self.shared.lock_state().listeners.len()
    }

    /// Registers `listener` for future edges only.
    pub fn subscribe(&self, listener: Arc<dyn VisibilityListener>) -> Subscription {
        let subscription = Subscription {
            id: Uuid::new_v4(),
            active: Arc::new(AtomicBool::new(true)),
            tracker: Arc::downgrade(&self.shared),
        };
        self.shared.lock_state().listeners.push(ListenerEntry {
            subscription: subscription.clone(),
            listener,
        });
        debug!(
            "event=visibility_subscribe module=visibility status=ok subscription={}",
            subscription.id
        );
        subscription
    }

    /// Runs `callback` on the next `transition` edge, then detaches.
    pub fn subscribe_once<F>(&self, transition: Transition, callback: F) -> Subscription
    where
        F: FnOnce() + Send + 'static,
    {
        let callback: OnceCallback = Box::new(callback);
        self.subscribe(Arc::new(OnceListener {
            transition,
            callback: Mutex::new(Some(callback)),
        }))
    }

    /// Host signal: the app moved to the foreground.
    ///
    /// Returns `true` when this signal was an edge and listeners were notified.
    pub fn enter_foreground(&self) -> bool {
        self.apply(Transition::EnteredForeground)
    }

    /// Host signal: the app moved to the background.
    ///
    /// Returns `true` when this signal was an edge and listeners were notified.
    pub fn enter_background(&self) -> bool {
        self.apply(Transition::EnteredBackground)
    }

    fn apply(&self, transition: Transition) -> bool {
        let _dispatch = self
            .shared
            .dispatch
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let listeners = {
            let mut state = self.shared.lock_state();
            if state.visibility == transition.target() {
                debug!(
                    "event=visibility_signal module=visibility status=skip state={}",
                    transition.as_str()
                );
                return false;
            }
            state.visibility = transition.target();
            state.listeners.clone()
        };

        info!(
            "event=visibility_transition module=visibility status=ok state={} listeners={}",
            transition.as_str(),
            listeners.len()
        );

        for entry in listeners {
            if !entry.subscription.is_active() {
                continue;
            }
            match transition {
                Transition::EnteredForeground => {
                    entry.listener.on_enter_foreground(&entry.subscription)
                }
                Transition::EnteredBackground => {
                    entry.listener.on_enter_background(&entry.subscription)
                }
            }
        }
        true
    }
}

type OnceCallback = Box<dyn FnOnce() + Send>;

struct OnceListener {
    transition: Transition,
    callback: Mutex<Option<OnceCallback>>,
}

impl OnceListener {
    fn fire(&self, transition: Transition, subscription: &Subscription) {
        if transition != self.transition {
            return;
        }
        subscription.cancel();
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl VisibilityListener for OnceListener {
    fn on_enter_foreground(&self, subscription: &Subscription) {
        self.fire(Transition::EnteredForeground, subscription);
    }

    fn on_enter_background(&self, subscription: &Subscription) {
        self.fire(Transition::EnteredBackground, subscription);
    }
}
