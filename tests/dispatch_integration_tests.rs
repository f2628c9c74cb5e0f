//! Engine-level tests: FIFO ordering, report contents, shutdown draining.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use proptest::prelude::*;

use common::FakeSdk;
use motionctl::dispatch::{Operation, Output};
use motionctl::error::{DriveError, ErrorKind};
use motionctl::sdk::MotionSdk;
use motionctl::services::MotionService;

/// Succeeds with a fixed integer.
struct Value(i64);

impl Operation for Value {
    fn name(&self) -> &'static str {
        "value"
    }
    fn execute(self: Box<Self>, _: &dyn MotionSdk) -> Result<Output, DriveError> {
        Ok(Output::Int(self.0))
    }
}

/// Fails with the given error.
struct Failing(DriveError);

impl Operation for Failing {
    fn name(&self) -> &'static str {
        "failing"
    }
    fn execute(self: Box<Self>, _: &dyn MotionSdk) -> Result<Output, DriveError> {
        Err(self.0)
    }
}

/// Signals when execution begins, then holds the worker for a while.
struct Slow {
    started: mpsc::Sender<()>,
    hold: Duration,
    value: i64,
}

impl Operation for Slow {
    fn name(&self) -> &'static str {
        "slow"
    }
    fn execute(self: Box<Self>, _: &dyn MotionSdk) -> Result<Output, DriveError> {
        let _ = self.started.send(());
        thread::sleep(self.hold);
        Ok(Output::Int(self.value))
    }
}

fn new_service() -> MotionService {
    MotionService::new(Arc::new(FakeSdk::new()))
}

#[test]
fn test_success_report_carries_output_42() {
    let mut service = new_service();
    let report_slot = Arc::new(Mutex::new(None));
    let calls = Arc::new(AtomicUsize::new(0));

    let slot = Arc::clone(&report_slot);
    let call_count = Arc::clone(&calls);
    service.submit(
        Box::new(Value(42)),
        move |report| {
            call_count.fetch_add(1, Ordering::SeqCst);
            *slot.lock().unwrap() = Some(report);
        },
    );
    service.stop();
    assert_eq!(service.process_completed(), 1);

    let report = report_slot.lock().unwrap().take().expect("report expected");
    assert_eq!(report.output, Some(Output::Int(42)));
    assert!(report.error.is_none());
    assert!(report.is_success());
    // Callback ran exactly once.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_domain_failure_reports_on_error_channel_only() {
    let mut service = new_service();
    let mut errors = service.subscribe_errors();

    service.submit(
        Box::new(Failing(DriveError::MissingResource(
            "No dictionary selected.".to_string(),
        ))),
        |_| panic!("callback must not fire for a failed task"),
    );
    service.stop();

    // No success callback.
    assert_eq!(service.process_completed(), 0);

    let report = errors.try_recv().expect("one error report expected");
    assert!(report.output.is_none());
    let error = report.error.expect("error must be set");
    assert_eq!(error.kind(), ErrorKind::MissingResource);
    assert_eq!(error.message(), "No dictionary selected.");
}

#[test]
fn test_worker_survives_domain_failures() {
    let mut service = new_service();
    let mut errors = service.subscribe_errors();
    let outputs = Arc::new(Mutex::new(Vec::new()));

    for i in 0..3 {
        let outputs = Arc::clone(&outputs);
        service.submit(
            Box::new(Failing(DriveError::Connection(format!("link down {i}")))),
            |_| {},
        );
        service.submit(
            Box::new(Value(i)),
            move |report| outputs.lock().unwrap().push(report.output.unwrap()),
        );
    }
    service.stop();
    assert_eq!(service.process_completed(), 3);

    let outputs = outputs.lock().unwrap();
    assert_eq!(
        *outputs,
        vec![Output::Int(0), Output::Int(1), Output::Int(2)]
    );
    for i in 0..3 {
        let report = errors.try_recv().expect("error report expected");
        assert_eq!(
            report.error.unwrap().message(),
            format!("link down {i}")
        );
    }
}

#[test]
fn test_callbacks_fire_in_submission_order() {
    let mut service = new_service();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 1..=3 {
        let order = Arc::clone(&order);
        service.submit(
            Box::new(Value(i)),
            move |report| {
                if let Some(Output::Int(v)) = report.output {
                    order.lock().unwrap().push(v);
                }
            },
        );
    }
    service.stop();
    service.process_completed();

    assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_stop_drains_queued_tasks_then_exits() {
    let mut service = new_service();
    let order = Arc::new(Mutex::new(Vec::new()));
    let (started_tx, started_rx) = mpsc::channel();

    let push = |order: &Arc<Mutex<Vec<i64>>>| {
        let order = Arc::clone(order);
        move |report: motionctl::Report| {
            if let Some(Output::Int(v)) = report.output {
                order.lock().unwrap().push(v);
            }
        }
    };

    service.submit(Box::new(Value(1)), push(&order));
    service.submit(
        Box::new(Slow {
            started: started_tx,
            hold: Duration::from_millis(100),
            value: 2,
        }),
        push(&order),
    );
    service.submit(Box::new(Value(3)), push(&order));

    // Stop while task 2 is mid-execution and task 3 is still queued.
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("task 2 should start");
    service.stop();
    assert!(!service.is_running());

    // 2 completed, 3 executed anyway; both reported, in order.
    assert_eq!(service.process_completed(), 3);
    assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);

    // Nothing submitted after stop ever executes.
    service.submit(Box::new(Value(4)), |_| panic!("must never run"));
    assert_eq!(service.process_completed(), 0);
}

#[test]
fn test_report_timing_fields() {
    let mut service = new_service();
    let report_slot = Arc::new(Mutex::new(None));
    let (started_tx, _started_rx) = mpsc::channel();

    let slot = Arc::clone(&report_slot);
    let before = std::time::SystemTime::now();
    service.submit(
        Box::new(Slow {
            started: started_tx,
            hold: Duration::from_millis(50),
            value: 0,
        }),
        move |report| *slot.lock().unwrap() = Some(report),
    );
    service.stop();
    service.process_completed();

    let report = report_slot.lock().unwrap().take().unwrap();
    assert!(report.duration >= Duration::from_millis(50));
    assert!(report.timestamp >= before);
    assert_eq!(report.operation_name, "slow");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// For any mix of succeeding and failing tasks, success callbacks fire
    /// in submission order and error reports arrive in submission order.
    #[test]
    fn prop_reports_preserve_fifo(plan in prop::collection::vec(any::<bool>(), 1..20)) {
        let mut service = new_service();
        let mut errors = service.subscribe_errors();
        let successes = Arc::new(Mutex::new(Vec::new()));

        let mut expected_success = Vec::new();
        let mut expected_failure = Vec::new();
        for (i, fail) in plan.iter().enumerate() {
            let i = i as i64;
            if *fail {
                expected_failure.push(format!("task {i}"));
                service.submit(
                    Box::new(Failing(DriveError::Connection(format!("task {i}")))),
                    |_| {},
                );
            } else {
                expected_success.push(Output::Int(i));
                let successes = Arc::clone(&successes);
                service.submit(
                    Box::new(Value(i)),
                    move |report| successes.lock().unwrap().push(report.output.unwrap()),
                );
            }
        }
        service.stop();
        service.process_completed();

        prop_assert_eq!(&*successes.lock().unwrap(), &expected_success);
        for expected in expected_failure {
            let report = errors.try_recv().expect("error report expected");
            let error = report.error.unwrap();
            prop_assert_eq!(error.message(), expected);
        }
    }
}
