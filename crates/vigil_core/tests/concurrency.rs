use std::sync::{Arc, Barrier};
use std::thread;
use vigil_core::{
    CoordinatorConfig, IndicatorCommand, IndicatorPhase, RecordingPresenter, TaskCoordinator,
    VisibilityTracker,
};

fn backgrounded() -> (VisibilityTracker, Arc<RecordingPresenter>, TaskCoordinator) {
    let tracker = VisibilityTracker::new();
    tracker.enter_background();
    let presenter = Arc::new(RecordingPresenter::new());
    let coordinator = TaskCoordinator::new(
        tracker.clone(),
        presenter.clone(),
        CoordinatorConfig::default(),
    );
    (tracker, presenter, coordinator)
}

fn run_concurrently(threads: usize, action: impl Fn(usize) + Send + Sync + 'static) {
    let barrier = Arc::new(Barrier::new(threads));
    let action = Arc::new(action);
    let handles: Vec<_> = (0..threads)
        .map(|index| {
            let barrier = Arc::clone(&barrier);
            let action = Arc::clone(&action);
            thread::spawn(move || {
                barrier.wait();
                action(index);
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker thread should not panic");
    }
}

#[test]
fn two_racing_requests_present_once() {
    for _ in 0..100 {
        let (_tracker, presenter, coordinator) = backgrounded();
        let shared = coordinator.clone();
        run_concurrently(2, move |index| {
            shared.start(&format!("Task {index}"), "sync");
        });

        assert_eq!(coordinator.active_tasks(), 2);
        assert_eq!(presenter.present_count(), 1);
    }
}

#[test]
fn many_racing_requests_and_releases_see_one_edge_each() {
    const WORKERS: usize = 16;
    for _ in 0..25 {
        let (_tracker, presenter, coordinator) = backgrounded();

        let starter = coordinator.clone();
        run_concurrently(WORKERS, move |_| starter.start("Backup", "sync"));
        assert_eq!(coordinator.active_tasks(), WORKERS as u64);
        assert_eq!(presenter.present_count(), 1);

        // Extra releases race the real ones and must not double-withdraw.
        let stopper = coordinator.clone();
        run_concurrently(WORKERS + 4, move |_| stopper.stop());
        assert_eq!(coordinator.active_tasks(), 0);
        assert_eq!(presenter.withdraw_count(), 1);
        assert_eq!(coordinator.phase(), IndicatorPhase::Idle);
    }
}

#[test]
fn transitions_racing_task_churn_end_consistently() {
    let (tracker, presenter, coordinator) = backgrounded();
    let flipper = tracker.clone();
    let churn = coordinator.clone();

    run_concurrently(9, move |index| {
        if index == 0 {
            for round in 0..200 {
                if round % 2 == 0 {
                    flipper.enter_foreground();
                } else {
                    flipper.enter_background();
                }
            }
        } else {
            for _ in 0..200 {
                churn.start("Sync", "sync");
                churn.stop();
            }
        }
    });

    assert_eq!(coordinator.active_tasks(), 0);
    assert_eq!(coordinator.phase(), IndicatorPhase::Idle);
    assert_eq!(coordinator.descriptor(), None);
    assert_eq!(
        presenter.commands().last(),
        Some(&IndicatorCommand::Withdraw)
    );
}
