//! Reference-counted indicator coordinator.
//!
//! # Responsibility
//! - Count active tasks and remember the descriptor of the current run.
//! - Decide when the host indicator is presented or withdrawn, both on
//!   start/stop calls and on visibility transitions.
//!
//! # Invariants
//! - The task counter never goes below zero; a stop at zero changes nothing.
//! - The zero-to-nonzero and nonzero-to-zero edges are each observed by
//!   exactly one caller (decided under one state lock).
//! - Presenter calls are issued under the same lock, so present/withdraw are
//!   never reordered.
//! - Presenter failures are logged and swallowed; callers never see them.
//! - A foreground transition withdraws the indicator and, unless
//!   `reattach_after_foreground` is set, detaches from the tracker until the
//!   next zero-to-nonzero edge.
//! - Every zero-to-nonzero edge swaps in a fresh observer subscription, so a
//!   transition callback already in flight for the previous run is ignored.

use crate::config::{CoordinatorConfig, PresentationPolicy, TitlePolicy};
use crate::indicator::presenter::{IndicatorPresenter, IndicatorRequest};
use crate::model::task::{CoordinatorSnapshot, IndicatorPhase, TaskDescriptor};
use crate::visibility::{Subscription, VisibilityListener, VisibilityTracker};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Shared handle to one coordinator. Clones drive the same state.
#[derive(Clone)]
pub struct TaskCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: CoordinatorConfig,
    presenter: Arc<dyn IndicatorPresenter>,
    tracker: VisibilityTracker,
    state: Mutex<CoordinatorState>,
}

#[derive(Default)]
struct CoordinatorState {
    active_tasks: u64,
    descriptor: Option<TaskDescriptor>,
    shown: bool,
    observer: Option<Subscription>,
}

impl CoordinatorState {
    fn phase(&self) -> IndicatorPhase {
        if self.active_tasks == 0 {
            IndicatorPhase::Idle
        } else if self.shown {
            IndicatorPhase::ActiveShown
        } else {
            IndicatorPhase::ActiveHidden
        }
    }

    fn is_current_observer(&self, subscription: &Subscription) -> bool {
        self.observer
            .as_ref()
            .is_some_and(|observer| observer.id() == subscription.id())
    }
}

impl TaskCoordinator {
    /// Builds a coordinator and subscribes it to `tracker`.
    pub fn new(
        tracker: VisibilityTracker,
        presenter: Arc<dyn IndicatorPresenter>,
        config: CoordinatorConfig,
    ) -> Self {
        let inner = Arc::new(CoordinatorInner {
            config,
            presenter,
            tracker,
            state: Mutex::new(CoordinatorState::default()),
        });
        {
            let mut state = inner.lock_state();
            inner.attach_observer(&mut state);
        }
        info!(
            "event=coordinator_init module=coordinator status=ok presentation={:?} title_policy={:?} reattach={}",
            inner.config.presentation, inner.config.title, inner.config.reattach_after_foreground
        );
        Self { inner }
    }

    /// Registers one active task.
    ///
    /// Blank or malformed `category` falls back to the configured default.
    pub fn start(&self, title: &str, category: &str) {
        self.inner.start(title, category);
    }

    /// Releases one active task. Extra releases are ignored.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Starts a task that is stopped when the returned guard drops.
    pub fn begin(&self, title: &str, category: &str) -> TaskGuard {
        self.start(title, category);
        TaskGuard {
            coordinator: self.clone(),
            released: false,
        }
    }

    pub fn active_tasks(&self) -> u64 {
        self.inner.lock_state().active_tasks
    }

    /// Descriptor the indicator currently describes, if any task is active.
    pub fn descriptor(&self) -> Option<TaskDescriptor> {
        self.inner.lock_state().descriptor.clone()
    }

    pub fn phase(&self) -> IndicatorPhase {
        self.inner.lock_state().phase()
    }

    /// Whether visibility transitions still reach this coordinator.
    pub fn is_observing(&self) -> bool {
        self.inner.lock_state().observer.is_some()
    }

    pub fn snapshot(&self) -> CoordinatorSnapshot {
        let state = self.inner.lock_state();
        CoordinatorSnapshot {
            active_tasks: state.active_tasks,
            descriptor: state.descriptor.clone(),
            phase: state.phase(),
            observer_attached: state.observer.is_some(),
            app_visible: self.inner.tracker.is_visible(),
        }
    }

    pub fn tracker(&self) -> &VisibilityTracker {
        &self.inner.tracker
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }
}

impl CoordinatorInner {
    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("event=state_lock module=coordinator status=recovered reason=poisoned");
                poisoned.into_inner()
            }
        }
    }

    fn start(self: &Arc<Self>, title: &str, category: &str) {
        let descriptor = TaskDescriptor::new(
            title.trim(),
            self.config.resolve_category(Some(category)),
        );

        let mut state = self.lock_state();
        let previous = state.active_tasks;
        state.active_tasks = previous.saturating_add(1);
        debug!(
            "event=task_request module=coordinator status=ok active_tasks={} category={}",
            state.active_tasks,
            descriptor.category()
        );

        if previous == 0 {
            state.descriptor = Some(descriptor.clone());
            self.attach_observer(&mut state);
            if self.may_present_on_start() {
                self.present(&mut state, &descriptor, "first_task");
            } else {
                info!(
                    "event=indicator_present module=coordinator status=deferred reason=first_task category={}",
                    descriptor.category()
                );
            }
            return;
        }

        if self.config.title == TitlePolicy::FollowLatest {
            state.descriptor = Some(descriptor.clone());
            if state.shown {
                self.present(&mut state, &descriptor, "title_update");
            }
        }
    }

    fn stop(&self) {
        let mut state = self.lock_state();
        if state.active_tasks == 0 {
            debug!("event=task_release module=coordinator status=skip reason=no_active_tasks");
            return;
        }

        state.active_tasks -= 1;
        debug!(
            "event=task_release module=coordinator status=ok active_tasks={}",
            state.active_tasks
        );
        if state.active_tasks == 0 {
            state.descriptor = None;
            self.withdraw(&mut state, "last_task");
        }
    }

    fn handle_background(&self, subscription: &Subscription) {
        let mut state = self.lock_state();
        if !state.is_current_observer(subscription) {
            return;
        }
        if state.active_tasks == 0 {
            return;
        }
        if let Some(descriptor) = state.descriptor.clone() {
            self.present(&mut state, &descriptor, "app_background");
        }
    }

    fn handle_foreground(&self, subscription: &Subscription) {
        let mut state = self.lock_state();
        if !state.is_current_observer(subscription) {
            return;
        }
        self.withdraw(&mut state, "app_foreground");
        if !self.config.reattach_after_foreground {
            subscription.cancel();
            state.observer = None;
            info!(
                "event=visibility_detach module=coordinator status=ok active_tasks={}",
                state.active_tasks
            );
        }
    }

    fn may_present_on_start(&self) -> bool {
        let visible = self.tracker.is_visible();
        match self.config.presentation {
            PresentationPolicy::BackgroundOnly => !visible,
            PresentationPolicy::WhileVisible => visible,
        }
    }

    /// Replaces the current observer subscription with a new one.
    fn attach_observer(self: &Arc<Self>, state: &mut CoordinatorState) {
        if let Some(previous) = state.observer.take() {
            previous.cancel();
        }
        let observer = CoordinatorObserver {
            coordinator: Arc::downgrade(self),
        };
        state.observer = Some(self.tracker.subscribe(Arc::new(observer)));
    }

    fn present(&self, state: &mut CoordinatorState, descriptor: &TaskDescriptor, reason: &str) {
        let request = IndicatorRequest::new(descriptor.title(), descriptor.category());
        match self.presenter.present(&request) {
            Ok(()) => {
                state.shown = true;
                info!(
                    "event=indicator_present module=coordinator status=ok reason={} category={} title_chars={}",
                    reason,
                    descriptor.category(),
                    descriptor.title().chars().count()
                );
            }
            Err(err) => {
                warn!(
                    "event=indicator_present module=coordinator status=error reason={} error_code={} error={}",
                    reason,
                    err.code(),
                    err
                );
            }
        }
    }

    fn withdraw(&self, state: &mut CoordinatorState, reason: &str) {
        // The host may still show it after a failure, but we never retry.
        state.shown = false;
        match self.presenter.withdraw() {
            Ok(()) => info!(
                "event=indicator_withdraw module=coordinator status=ok reason={}",
                reason
            ),
            Err(err) => warn!(
                "event=indicator_withdraw module=coordinator status=error reason={} error_code={} error={}",
                reason,
                err.code(),
                err
            ),
        }
    }
}

impl Drop for CoordinatorInner {
    fn drop(&mut self) {
        let observer = match self.state.get_mut() {
            Ok(state) => state.observer.take(),
            Err(poisoned) => poisoned.into_inner().observer.take(),
        };
        if let Some(observer) = observer {
            observer.cancel();
        }
    }
}

struct CoordinatorObserver {
    coordinator: Weak<CoordinatorInner>,
}

impl VisibilityListener for CoordinatorObserver {
    fn on_enter_foreground(&self, subscription: &Subscription) {
        match self.coordinator.upgrade() {
            Some(coordinator) => coordinator.handle_foreground(subscription),
            None => subscription.cancel(),
        }
    }

    fn on_enter_background(&self, subscription: &Subscription) {
        match self.coordinator.upgrade() {
            Some(coordinator) => coordinator.handle_background(subscription),
            None => subscription.cancel(),
        }
    }
}

/// Active task that is released when dropped.
#[must_use = "dropping the guard releases the task immediately"]
pub struct TaskGuard {
    coordinator: TaskCoordinator,
    released: bool,
}

impl TaskGuard {
    /// Releases the task now instead of at drop.
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.coordinator.stop();
        }
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.release_once();
    }
}
