use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vigil_core::{HostVisibility, Subscription, Transition, VisibilityListener, VisibilityTracker};

/// Detaches itself on the first foreground edge.
#[derive(Default)]
struct OneShotForeground {
    foreground: AtomicUsize,
    background: AtomicUsize,
}

impl VisibilityListener for OneShotForeground {
    fn on_enter_foreground(&self, subscription: &Subscription) {
        self.foreground.fetch_add(1, Ordering::SeqCst);
        subscription.cancel();
    }

    fn on_enter_background(&self, _subscription: &Subscription) {
        self.background.fetch_add(1, Ordering::SeqCst);
    }
}

/// Subscribes a second listener from inside its own callback.
struct Spawner {
    tracker: VisibilityTracker,
    spawned: Mutex<Vec<Arc<OneShotForeground>>>,
}

impl VisibilityListener for Spawner {
    fn on_enter_background(&self, _subscription: &Subscription) {
        let child = Arc::new(OneShotForeground::default());
        self.tracker.subscribe(child.clone());
        self.spawned.lock().expect("spawned lock").push(child);
    }
}

#[test]
fn self_cancelling_listener_receives_one_foreground_edge() {
    let tracker = VisibilityTracker::new();
    let listener = Arc::new(OneShotForeground::default());
    let subscription = tracker.subscribe(listener.clone());

    tracker.enter_background();
    tracker.enter_foreground();
    tracker.enter_background();
    tracker.enter_foreground();

    assert_eq!(listener.foreground.load(Ordering::SeqCst), 1);
    assert_eq!(listener.background.load(Ordering::SeqCst), 1);
    assert!(!subscription.is_active());
    assert_eq!(tracker.listener_count(), 0);
}

#[test]
fn listener_may_subscribe_from_callback_without_catch_up() {
    let tracker = VisibilityTracker::new();
    let spawner = Arc::new(Spawner {
        tracker: tracker.clone(),
        spawned: Mutex::new(Vec::new()),
    });
    tracker.subscribe(spawner.clone());

    tracker.enter_background();

    let spawned = spawner.spawned.lock().expect("spawned lock").clone();
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0].background.load(Ordering::SeqCst), 0);
    assert_eq!(tracker.listener_count(), 2);

    tracker.enter_foreground();
    assert_eq!(spawned[0].foreground.load(Ordering::SeqCst), 1);
    assert_eq!(tracker.listener_count(), 1);
}

#[test]
fn first_host_signal_is_an_edge_from_unknown() {
    let tracker = VisibilityTracker::new();
    assert_eq!(tracker.visibility(), HostVisibility::Unknown);

    assert!(tracker.enter_background());
    assert_eq!(tracker.visibility(), HostVisibility::Background);
    assert!(!tracker.is_visible());
}

#[test]
fn cancelling_another_listener_mid_dispatch_skips_it() {
    struct Canceller {
        victim: Mutex<Option<Subscription>>,
    }

    impl VisibilityListener for Canceller {
        fn on_enter_background(&self, _subscription: &Subscription) {
            if let Some(victim) = self.victim.lock().expect("victim lock").take() {
                victim.cancel();
            }
        }
    }

    let tracker = VisibilityTracker::new();
    let canceller = Arc::new(Canceller {
        victim: Mutex::new(None),
    });
    tracker.subscribe(canceller.clone());
    let victim = Arc::new(OneShotForeground::default());
    let victim_subscription = tracker.subscribe(victim.clone());
    *canceller.victim.lock().expect("victim lock") = Some(victim_subscription);

    tracker.enter_background();

    assert_eq!(victim.background.load(Ordering::SeqCst), 0);
    assert_eq!(tracker.listener_count(), 1);
}

#[test]
fn subscribe_once_detaches_before_running_callback() {
    let tracker = VisibilityTracker::new();
    let observed = Arc::new(Mutex::new(None));
    let observer = tracker.clone();
    let slot = Arc::clone(&observed);
    tracker.subscribe_once(Transition::EnteredBackground, move || {
        *slot.lock().expect("slot lock") = Some(observer.listener_count());
    });

    tracker.enter_background();

    assert_eq!(*observed.lock().expect("slot lock"), Some(0));
}
