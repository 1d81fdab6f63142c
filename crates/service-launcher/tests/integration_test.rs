use service_launcher::mock::{CallLog, MockInitializer, MockService};
use service_launcher::{service_fn, BoxError, LaunchError, Launcher, RunReport, StopError};
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// --- Helpers ---

fn spawn_run(launcher: Launcher, token: &CancellationToken) -> JoinHandle<RunReport> {
    service_launcher::tracing::try_setup_tracing();
    tokio::spawn(launcher.run_with_report(token.clone()))
}

async fn finish(handle: JoinHandle<RunReport>) -> RunReport {
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("launcher did not terminate")
        .expect("launcher task panicked")
}

fn assert_all_starts_before_stops(log: &CallLog) {
    let events = log.events();
    let last_start = events.iter().rposition(|e| e.starts_with("start:"));
    let first_stop = events.iter().position(|e| e.starts_with("stop:"));
    if let (Some(last_start), Some(first_stop)) = (last_start, first_stop) {
        assert!(
            last_start < first_stop,
            "a stop was issued before every start began: {events:?}"
        );
    }
}

// --- Scenario A: cancellation stops services in reverse order ---

#[tokio::test]
async fn cancellation_stops_services_in_reverse_order() {
    let log = CallLog::new();
    let mut launcher = Launcher::new();
    launcher
        .add_service(MockService::new("A", &log))
        .add_service(MockService::new("B", &log))
        .add_service(MockService::new("C", &log));

    let token = CancellationToken::new();
    let handle = spawn_run(launcher, &token);

    log.wait_for_starts(3).await;
    token.cancel();

    let report = finish(handle).await;
    assert!(report.is_ok());
    assert!(report.stop_errors.is_empty());
    assert_eq!(log.stops(), vec!["C", "B", "A"]);
    assert_all_starts_before_stops(&log);
}

// --- Scenario B: a failing initializer aborts the run ---

#[tokio::test]
async fn failing_initializer_aborts_before_services_start() {
    let log = CallLog::new();
    let mut launcher = Launcher::new();
    launcher
        .add_initializer(MockInitializer::new("X", &log))
        .add_initializer(MockInitializer::new("Y", &log).fail("init failed"))
        .add_initializer(MockInitializer::new("Z", &log))
        .add_service(MockService::new("A", &log));

    let err = launcher.run(CancellationToken::new()).await.unwrap_err();

    assert!(err.to_string().contains("init failed"), "{err}");
    assert!(matches!(err, LaunchError::Initializer { index: 1, .. }));
    assert_eq!(err.name(), "Y");
    assert_eq!(log.inits(), vec!["X", "Y"]);
    assert!(log.starts().is_empty());
    assert!(log.stops().is_empty());
}

#[tokio::test]
async fn initializers_run_in_order_before_services() {
    let log = CallLog::new();
    let mut launcher = Launcher::new();
    launcher
        .add_service(MockService::new("A", &log))
        .add_initializer(MockInitializer::new("X", &log))
        .add_initializer(MockInitializer::new("Y", &log));

    let token = CancellationToken::new();
    let handle = spawn_run(launcher, &token);
    log.wait_for_starts(1).await;
    token.cancel();

    assert!(finish(handle).await.is_ok());
    assert_eq!(&log.events()[..3], ["init:X", "init:Y", "start:A"]);
}

// --- Scenario C: a failing start triggers full shutdown ---

#[tokio::test]
async fn failing_start_shuts_everything_down() {
    let log = CallLog::new();
    let mut launcher = Launcher::new();
    launcher
        .add_service(MockService::new("A", &log))
        .add_service(MockService::new("B", &log).fail_start("listen failed"));

    // Nobody ever cancels this token: the failure alone must end the run.
    let report = finish(spawn_run(launcher, &CancellationToken::new())).await;

    let err = report.result.unwrap_err();
    match &err {
        LaunchError::ServiceStart { index, name, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(name, "B");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.source().unwrap().to_string(), "listen failed");

    let mut starts = log.starts();
    starts.sort();
    assert_eq!(starts, vec!["A", "B"]);
    assert_eq!(log.stops(), vec!["B", "A"]);
    assert_all_starts_before_stops(&log);
}

#[tokio::test]
async fn failing_start_cancels_sibling_tokens() {
    let observed = Arc::new(AtomicBool::new(false));
    let flag = observed.clone();

    let mut launcher = Launcher::new();
    launcher
        .add_service(service_fn(
            "sibling",
            move |token: CancellationToken| {
                let flag = flag.clone();
                async move {
                    token.cancelled().await;
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            },
            |_token| async { Ok(()) },
        ))
        .add_service(service_fn(
            "broken",
            |_token| async { Err::<(), BoxError>("boom".into()) },
            |_token| async { Ok(()) },
        ));

    let err = launcher.run(CancellationToken::new()).await.unwrap_err();
    assert_eq!(err.name(), "broken");
    assert!(observed.load(Ordering::SeqCst));
}

// --- Scenario D: stop failures are collected, never fatal ---

#[tokio::test]
async fn stop_failure_does_not_halt_shutdown() {
    let log = CallLog::new();
    let mut launcher = Launcher::new();
    launcher
        .add_service(MockService::new("A", &log))
        .add_service(MockService::new("B", &log).fail_stop("flush failed"))
        .add_service(MockService::new("C", &log));

    let token = CancellationToken::new();
    let handle = spawn_run(launcher, &token);
    log.wait_for_starts(3).await;
    token.cancel();

    let report = finish(handle).await;
    assert!(report.is_ok());
    assert_eq!(log.stops(), vec!["C", "B", "A"]);

    assert_eq!(report.stop_errors.len(), 1);
    let stop_err = &report.stop_errors[0];
    assert!(matches!(stop_err, StopError::Failed { index: 1, .. }));
    assert_eq!(stop_err.source().unwrap().to_string(), "flush failed");
}

#[tokio::test]
async fn stop_panic_does_not_halt_shutdown() {
    let log = CallLog::new();
    let mut launcher = Launcher::new();
    launcher
        .add_service(MockService::new("A", &log))
        .add_service(MockService::new("B", &log).panic_on_stop("flush exploded"));

    let token = CancellationToken::new();
    let handle = spawn_run(launcher, &token);
    log.wait_for_starts(2).await;
    token.cancel();

    let report = finish(handle).await;
    assert!(report.is_ok());
    assert_eq!(log.stops(), vec!["B", "A"]);

    assert_eq!(report.stop_errors.len(), 1);
    match &report.stop_errors[0] {
        StopError::Panicked { index, name, message } => {
            assert_eq!(*index, 1);
            assert_eq!(name, "B");
            assert_eq!(message, "flush exploded");
        }
        other => panic!("unexpected stop error: {other}"),
    }
}

#[tokio::test]
async fn stop_failure_does_not_replace_root_cause() {
    let log = CallLog::new();
    let mut launcher = Launcher::new();
    launcher
        .add_service(MockService::new("A", &log).fail_stop("flush failed"))
        .add_service(MockService::new("B", &log).fail_start("listen failed"));

    let report = finish(spawn_run(launcher, &CancellationToken::new())).await;

    assert_eq!(report.stop_errors.len(), 1);
    assert_eq!(report.stop_errors[0].name(), "A");
    let err = report.into_result().unwrap_err();
    assert!(matches!(err, LaunchError::ServiceStart { index: 1, .. }));
    assert_eq!(log.stops(), vec!["B", "A"]);
}

// --- Shutdown deadline ---

#[tokio::test]
async fn slow_stop_times_out_and_later_services_still_stop() {
    let log = CallLog::new();
    let mut launcher = Launcher::new();
    launcher
        .set_shutdown_timeout(Duration::from_millis(50))
        .add_service(MockService::new("A", &log))
        .add_service(MockService::new("B", &log).stop_delay(Duration::from_secs(10)));

    let token = CancellationToken::new();
    let handle = spawn_run(launcher, &token);
    log.wait_for_starts(2).await;

    let started = std::time::Instant::now();
    token.cancel();
    let report = finish(handle).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(report.is_ok());
    assert_eq!(log.stops(), vec!["B", "A"]);
    assert_eq!(report.stop_errors.len(), 1);
    assert!(report.stop_errors[0].is_timeout());
    assert_eq!(report.stop_errors[0].name(), "B");
}

#[tokio::test]
async fn stop_token_is_independent_of_run_token() {
    let mut launcher = Launcher::new();
    launcher.add_service(service_fn(
        "checker",
        |token: CancellationToken| async move {
            token.cancelled().await;
            Ok(())
        },
        |token: CancellationToken| async move {
            if token.is_cancelled() {
                Err::<(), BoxError>("stop token already cancelled".into())
            } else {
                Ok(())
            }
        },
    ));

    let token = CancellationToken::new();
    token.cancel();
    let report = finish(spawn_run(launcher, &token)).await;

    assert!(report.is_ok());
    assert!(report.stop_errors.is_empty());
}

#[tokio::test]
async fn hanging_start_is_aborted_at_deadline() {
    let log = CallLog::new();
    let mut launcher = Launcher::new();
    launcher
        .set_shutdown_timeout(Duration::from_millis(50))
        .add_service(MockService::new("stuck", &log).hang_on_start());

    let token = CancellationToken::new();
    let handle = spawn_run(launcher, &token);
    log.wait_for_starts(1).await;
    token.cancel();

    let report = finish(handle).await;
    assert!(report.is_ok());
    assert_eq!(log.stops(), vec!["stuck"]);
}

// --- Edge cases ---

#[tokio::test]
async fn premature_clean_exit_does_not_trigger_shutdown() {
    let log = CallLog::new();
    let mut launcher = Launcher::new();
    launcher
        .add_service(MockService::new("A", &log).exit_immediately())
        .add_service(MockService::new("B", &log));

    let token = CancellationToken::new();
    let handle = spawn_run(launcher, &token);
    log.wait_for_starts(2).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!handle.is_finished());
    assert!(log.stops().is_empty());

    token.cancel();
    let report = finish(handle).await;
    assert!(report.is_ok());
    assert_eq!(log.stops(), vec!["B", "A"]);
}

#[tokio::test]
async fn panicking_start_is_reported_as_root_cause() {
    let log = CallLog::new();
    let mut launcher = Launcher::new();
    launcher
        .add_service(MockService::new("A", &log))
        .add_service(MockService::new("B", &log).panic_on_start("kaboom"));

    let report = finish(spawn_run(launcher, &CancellationToken::new())).await;

    match report.result {
        Err(LaunchError::ServicePanicked { index, name, message }) => {
            assert_eq!(index, 1);
            assert_eq!(name, "B");
            assert_eq!(message, "kaboom");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(log.stops(), vec!["B", "A"]);
}

#[tokio::test]
async fn duplicate_names_are_started_and_stopped_by_position() {
    let log = CallLog::new();
    let mut launcher = Launcher::new();
    launcher.add_services([
        Arc::new(MockService::new("twin", &log)) as Arc<dyn service_launcher::Service>,
        Arc::new(MockService::new("twin", &log).fail_stop("second")),
    ]);

    let token = CancellationToken::new();
    let handle = spawn_run(launcher, &token);
    log.wait_for_starts(2).await;
    token.cancel();

    let report = finish(handle).await;
    assert_eq!(log.stops(), vec!["twin", "twin"]);
    assert_eq!(report.stop_errors.len(), 1);
    assert_eq!(report.stop_errors[0].index(), 1);
}
