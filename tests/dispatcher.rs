//! Command dispatcher behavior against a mocked control transport.

mod common;

use std::time::{Duration, Instant};

use common::{init_tracing, test_config, MockTransport};
use ptzlink::session::Command;
use ptzlink::{CameraError, CommandDispatcher, Direction, DispatcherOptions};

#[tokio::test]
async fn command_latency_is_independent_of_device_round_trips() {
    init_tracing();
    let transport = MockTransport::new().with_latency(Duration::from_millis(200));
    let sent = transport.sent.clone();
    let dispatcher = CommandDispatcher::connect(transport, test_config()).await.unwrap();

    let started = Instant::now();
    for _ in 0..5 {
        dispatcher.move_instant(Direction::Right, 1.0);
    }
    dispatcher.stop_instant();
    let elapsed = started.elapsed();

    // Six dispatches against a 200ms round trip must not cost even one
    // round trip on the calling task.
    assert!(elapsed < Duration::from_millis(100), "dispatch took {elapsed:?}");

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rapid_move_burst_followed_by_stop_converges_to_stopped() {
    init_tracing();
    let transport = MockTransport::new().with_latency(Duration::from_millis(50));
    let sent = transport.sent.clone();
    let options = DispatcherOptions { max_in_flight: 2, ..Default::default() };
    let dispatcher =
        CommandDispatcher::connect_with(transport, test_config(), options).await.unwrap();

    for _ in 0..10 {
        dispatcher.move_instant(Direction::Left, 1.0);
    }
    dispatcher.stop_instant();

    tokio::time::sleep(Duration::from_millis(300)).await;

    let sent = sent.lock().unwrap();
    assert!(sent.iter().any(|c| matches!(c, Command::Stop)), "stop must reach the device");
    // Two moves fit the budget, eight were superseded and dropped.
    assert_eq!(dispatcher.dropped_commands(), 8);
    assert_eq!(sent.len(), 3);
}

#[tokio::test]
async fn rejected_credentials_yield_a_connection_error_and_no_dispatcher() {
    init_tracing();
    let transport = MockTransport::new().rejecting_auth();

    let result = CommandDispatcher::connect(transport, test_config()).await;
    match result {
        Err(CameraError::Connection { reason, .. }) => {
            assert!(reason.contains("rejected"));
        }
        Err(other) => panic!("expected a connection error, got {other:?}"),
        Ok(_) => panic!("connect must not succeed against rejected credentials"),
    }
}

#[tokio::test]
async fn keep_alive_probes_run_on_schedule() {
    init_tracing();
    let transport = MockTransport::new();
    let probes = transport.probes.clone();
    let options = DispatcherOptions {
        keep_alive: Duration::from_millis(30),
        ..Default::default()
    };
    let dispatcher =
        CommandDispatcher::connect_with(transport, test_config(), options).await.unwrap();

    tokio::time::sleep(Duration::from_millis(110)).await;
    let probed = probes.load(std::sync::atomic::Ordering::SeqCst);
    assert!(probed >= 2, "expected at least two probes, saw {probed}");

    // Shutdown halts the schedule.
    dispatcher.shutdown();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let after_shutdown = probes.load(std::sync::atomic::Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(probes.load(std::sync::atomic::Ordering::SeqCst), after_shutdown);
}

#[tokio::test]
async fn preset_recall_and_scaled_moves_carry_their_parameters() {
    init_tracing();
    let transport = MockTransport::new();
    let sent = transport.sent.clone();
    let dispatcher = CommandDispatcher::connect(transport, test_config()).await.unwrap();

    dispatcher.move_instant(Direction::ZoomIn, 0.25);
    dispatcher.goto_preset("home", 0.5);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let sent = sent.lock().unwrap();
    assert!(sent.iter().any(|c| matches!(c, Command::ContinuousMove(v) if v.zoom == 0.25)));
    assert!(sent.iter().any(
        |c| matches!(c, Command::GotoPreset { token, speed } if token == "home" && *speed == 0.5)
    ));
}
