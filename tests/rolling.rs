// ABOUTME: Integration tests for blue/green swaps of worker pairs.
// ABOUTME: Round trips, abort safety, persistence failures, and the single-flight guard.

mod support;

use fleetvisor::process_state::{ProcessStateStore, RollingGroupKey, RollingPair};
use fleetvisor::report::FailureKind;
use fleetvisor::rolling::{
    ActiveColorStore, GroupRestart, RollingDeploymentController, RollingPolicy, SingleFlight,
    SwapPhase,
};
use fleetvisor::stopper::StopPolicy;
use fleetvisor::supervisor::ProcessState;
use fleetvisor::types::{Color, ColorPair};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use support::{Call, FakeSupervisor, init_tracing};

fn color(s: &str) -> Color {
    Color::new(s).unwrap()
}

fn ingest_key() -> RollingGroupKey {
    RollingGroupKey::new("ingest-worker", 0)
}

fn controller(dir: &Path) -> RollingDeploymentController {
    RollingDeploymentController::new(
        Arc::new(ActiveColorStore::new(dir, ColorPair::default())),
        Arc::new(SingleFlight::new()),
        RollingPolicy {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(1),
        },
        StopPolicy::default(),
    )
}

fn ingest_pair_supervisor() -> Arc<FakeSupervisor> {
    FakeSupervisor::new(
        "svc",
        &[
            ("ingest-worker-blue", ProcessState::Running),
            ("ingest-worker-green", ProcessState::Stopped),
        ],
    )
}

async fn ingest_pair(sup: &FakeSupervisor) -> RollingPair {
    let snapshot = ProcessStateStore::default().snapshot(sup).await.unwrap();
    snapshot.groups().get(&ingest_key()).unwrap()
}

mod round_trip {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn two_swaps_return_to_the_first_color() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path());
        let sup = ingest_pair_supervisor();
        let pair = ingest_pair(&sup).await;

        let record = controller.swap(sup.as_ref(), &pair).await;
        assert_eq!(record.phase, SwapPhase::Done, "{record:?}");
        assert_eq!(record.from, color("blue"));
        assert_eq!(record.to, color("green"));
        assert_eq!(controller.active_color(&ingest_key()), color("green"));
        assert_eq!(sup.state_of("ingest-worker-green"), ProcessState::Running);
        assert!(sup.state_of("ingest-worker-blue").is_stopped());

        let record = controller.swap(sup.as_ref(), &pair).await;
        assert_eq!(record.phase, SwapPhase::Done, "{record:?}");
        assert_eq!(controller.active_color(&ingest_key()), color("blue"));
        assert_eq!(sup.state_of("ingest-worker-blue"), ProcessState::Running);
        assert!(sup.state_of("ingest-worker-green").is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn inactive_instance_is_started_without_waiting() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let sup = ingest_pair_supervisor();
        let pair = ingest_pair(&sup).await;

        controller(dir.path()).swap(sup.as_ref(), &pair).await;

        assert!(
            sup.calls()
                .contains(&Call::Start("svc:ingest-worker-green".into(), false))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_keeps_waiting_until_running() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path());
        let sup = ingest_pair_supervisor();
        sup.start_lands_in("ingest-worker-green", ProcessState::Backoff);
        let pair = ingest_pair(&sup).await;

        let waiter = {
            let sup = Arc::clone(&sup);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(3)).await;
                sup.set_state("ingest-worker-green", ProcessState::Running);
            })
        };

        let record = controller.swap(sup.as_ref(), &pair).await;
        waiter.await.unwrap();

        assert_eq!(record.phase, SwapPhase::Done, "{record:?}");
        assert_eq!(controller.active_color(&ingest_key()), color("green"));
    }
}

mod abort_safety {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timeout_leaves_pointer_and_stops_new_instance() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path());
        let sup = ingest_pair_supervisor();
        sup.start_lands_in("ingest-worker-green", ProcessState::Starting);
        let pair = ingest_pair(&sup).await;

        let record = controller.swap(sup.as_ref(), &pair).await;

        assert_eq!(record.phase, SwapPhase::AbortedBeforeSwitch);
        assert_eq!(record.error.as_ref().unwrap().kind, FailureKind::Timeout);
        assert_eq!(controller.active_color(&ingest_key()), color("blue"));
        assert!(!controller.store().path_for(&ingest_key()).exists());
        assert!(sup.state_of("ingest-worker-green").is_stopped());
        assert_eq!(sup.state_of("ingest-worker-blue"), ProcessState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_start_aborts_immediately() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path());
        let sup = ingest_pair_supervisor();
        sup.start_lands_in("ingest-worker-green", ProcessState::Fatal);
        let pair = ingest_pair(&sup).await;

        let record = controller.swap(sup.as_ref(), &pair).await;

        assert_eq!(record.phase, SwapPhase::AbortedBeforeSwitch);
        assert_eq!(controller.active_color(&ingest_key()), color("blue"));
        assert_eq!(sup.state_of("ingest-worker-blue"), ProcessState::Running);
        assert_eq!(sup.stops_of("ingest-worker-blue"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pointer_write_failure_is_a_persistence_inconsistency() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let controller = controller(&blocker.join("state"));
        let sup = ingest_pair_supervisor();
        let pair = ingest_pair(&sup).await;

        let record = controller.swap(sup.as_ref(), &pair).await;

        assert_eq!(record.phase, SwapPhase::AbortedAfterSwitch);
        let error = record.error.unwrap();
        assert_eq!(error.kind, FailureKind::PersistenceInconsistency);
        assert!(error.message.contains("green is running"));
        // The new instance keeps serving; the old one is left alone.
        assert_eq!(sup.state_of("ingest-worker-green"), ProcessState::Running);
        assert_eq!(sup.state_of("ingest-worker-blue"), ProcessState::Running);
    }
}

mod single_flight {
    use super::*;

    #[tokio::test]
    async fn second_swap_for_same_group_is_refused() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let flights = Arc::new(SingleFlight::new());
        let controller = RollingDeploymentController::new(
            Arc::new(ActiveColorStore::new(dir.path(), ColorPair::default())),
            Arc::clone(&flights),
            RollingPolicy::default(),
            StopPolicy::default(),
        );
        let sup = ingest_pair_supervisor();
        let pair = ingest_pair(&sup).await;

        let _held = flights.try_acquire(ingest_key()).unwrap();
        let record = controller.swap(sup.as_ref(), &pair).await;

        assert_eq!(record.phase, SwapPhase::AbortedBeforeSwitch);
        assert!(record.error.unwrap().message.contains("already in progress"));
        assert_eq!(sup.starts_of("ingest-worker-green"), 0);
    }
}

mod incomplete_pairs {
    use super::*;

    #[tokio::test]
    async fn lone_color_restarts_in_place_without_touching_pointer() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path());
        let sup = FakeSupervisor::new("svc", &[("ingest-worker-green", ProcessState::Running)]);
        let snapshot = ProcessStateStore::default().snapshot(sup.as_ref()).await.unwrap();
        let pair = snapshot.groups().get(&ingest_key()).unwrap();

        let outcome = controller.restart_group(sup.as_ref(), &snapshot, &pair).await;

        let GroupRestart::Fallback(batch) = outcome else {
            panic!("expected fallback, got {outcome:?}");
        };
        assert!(batch.all_succeeded(), "{batch:?}");
        assert_eq!(sup.stops_of("ingest-worker-green"), 1);
        assert_eq!(sup.starts_of("ingest-worker-green"), 1);
        assert_eq!(sup.state_of("ingest-worker-green"), ProcessState::Running);
        assert!(!controller.store().path_for(&ingest_key()).exists());
    }

    #[tokio::test(start_paused = true)]
    async fn indices_are_independent_pairs() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path());
        let sup = FakeSupervisor::new(
            "svc",
            &[
                ("ingest-worker-blue-1", ProcessState::Running),
                ("ingest-worker-green-1", ProcessState::Stopped),
                ("ingest-worker-blue-2", ProcessState::Running),
                ("ingest-worker-green-2", ProcessState::Stopped),
            ],
        );
        let snapshot = ProcessStateStore::default().snapshot(sup.as_ref()).await.unwrap();
        let pairs = snapshot.groups().pairs();
        assert_eq!(pairs.len(), 2);

        let first = controller.swap(sup.as_ref(), &pairs[0]).await;
        assert_eq!(first.phase, SwapPhase::Done);

        assert_eq!(
            controller.active_color(&RollingGroupKey::new("ingest-worker", 1)),
            color("green")
        );
        assert_eq!(
            controller.active_color(&RollingGroupKey::new("ingest-worker", 2)),
            color("blue")
        );
        assert_eq!(sup.state_of("ingest-worker-blue-2"), ProcessState::Running);
    }
}
