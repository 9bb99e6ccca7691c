//! Cross-thread tests for the guest lifecycle bridge

use nh_bridge::{
    EventKind, GuestRuntimeHandle, HeadlessWindow, HostWindowRef, InputEvent, InputQueue,
    InputQueueRef, LifecycleBridge, LifecycleState, PendingEvent, SymbolTable,
};
use nh_core::BridgeError;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const POLL: Duration = Duration::from_millis(2);

/// Guest that pumps until asked to exit, collecting every event it sees
fn collecting_guest(
    seen: mpsc::Sender<PendingEvent>,
) -> impl FnOnce(nh_bridge::GuestContext) + Send + 'static {
    move |ctx| {
        ctx.set_looper_running(true);
        while !ctx.exit_requested() {
            for event in ctx.drain() {
                let _ = seen.send(event);
            }
            thread::sleep(POLL);
        }
        for event in ctx.drain() {
            let _ = seen.send(event);
        }
        ctx.set_looper_running(false);
    }
}

fn wait_for_state(bridge: &LifecycleBridge, state: LifecycleState) {
    for _ in 0..2000 {
        if bridge.state() == state {
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("bridge never reached {state}, stuck in {}", bridge.state());
}

#[test]
fn test_guest_returning_without_exit_reaches_exited() {
    let bridge = LifecycleBridge::new();
    bridge
        .start(GuestRuntimeHandle::new("noop", |_ctx| {}))
        .unwrap();

    bridge.wait_for_exit();
    assert_eq!(bridge.state(), LifecycleState::Exited);
    assert!(bridge.exit_requested());
}

#[test]
fn test_wait_for_exit_wakes_on_late_request() {
    let bridge = LifecycleBridge::new();
    let (tx, _rx) = mpsc::channel();
    bridge
        .start(GuestRuntimeHandle::new("looper", collecting_guest(tx)))
        .unwrap();
    wait_for_state(&bridge, LifecycleState::Running);

    let requester = Arc::clone(&bridge);
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        requester.request_exit();
    });

    // Blocks before the request is made
    bridge.wait_for_exit();
    assert_eq!(bridge.state(), LifecycleState::Exited);
    handle.join().unwrap();
}

#[test]
fn test_start_twice_fails_without_second_thread() {
    let invocations = Arc::new(AtomicU32::new(0));
    let release = Arc::new(AtomicBool::new(false));
    let bridge = LifecycleBridge::new();

    let make_entry = || {
        let invocations = Arc::clone(&invocations);
        let release = Arc::clone(&release);
        GuestRuntimeHandle::new("counted", move |_ctx| {
            invocations.fetch_add(1, Ordering::SeqCst);
            while !release.load(Ordering::SeqCst) {
                thread::sleep(POLL);
            }
        })
    };

    bridge.start(make_entry()).unwrap();
    let second = bridge.start(make_entry());
    assert!(matches!(second, Err(BridgeError::AlreadyStarted)));

    release.store(true, Ordering::SeqCst);
    bridge.wait_for_exit();
    assert_eq!(invocations.load(Ordering::SeqCst), 1);

    let third = bridge.start(make_entry());
    assert!(matches!(third, Err(BridgeError::AlreadyStarted)));
}

#[test]
fn test_unresolved_entry_point_has_no_side_effects() {
    let mut table = SymbolTable::new();
    let invoked = Arc::new(AtomicBool::new(false));
    let invoked_clone = Arc::clone(&invoked);
    table.register("guest_main", move |_ctx| {
        invoked_clone.store(true, Ordering::SeqCst);
    });

    let bridge = LifecycleBridge::new();
    let result = bridge.start_resolved(&table, "ANativeActivity_onCreate");

    assert!(matches!(result, Err(BridgeError::EntryPointUnavailable(_))));
    assert_eq!(bridge.state(), LifecycleState::Idle);
    assert!(bridge.guest_thread().is_none());
    thread::sleep(Duration::from_millis(20));
    assert!(!invoked.load(Ordering::SeqCst));
}

#[test]
fn test_resolved_entry_point_runs_on_guest_thread() {
    let mut table = SymbolTable::new();
    let (tx, rx) = mpsc::channel();
    table.register("guest_main", move |_ctx| {
        let name = thread::current().name().map(str::to_string);
        let _ = tx.send(name);
    });

    let bridge = LifecycleBridge::new();
    bridge.start_resolved(&table, "guest_main").unwrap();
    bridge.wait_for_exit();

    let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(name.as_deref(), Some(nh_bridge::GUEST_THREAD_NAME));
    let thread = bridge.guest_thread().unwrap();
    assert_eq!(thread.symbol(), "guest_main");
}

#[test]
fn test_request_exit_idempotent_across_threads() {
    let teardowns = Arc::new(AtomicU32::new(0));
    let bridge = LifecycleBridge::new();
    let teardowns_clone = Arc::clone(&teardowns);
    bridge.on_teardown(move || {
        teardowns_clone.fetch_add(1, Ordering::SeqCst);
    });

    let (tx, _rx) = mpsc::channel();
    bridge
        .start(GuestRuntimeHandle::new("looper", collecting_guest(tx)))
        .unwrap();
    wait_for_state(&bridge, LifecycleState::Running);

    let mut handles = vec![];
    for _ in 0..4 {
        let bridge = Arc::clone(&bridge);
        handles.push(thread::spawn(move || {
            for _ in 0..50 {
                bridge.request_exit();
            }
        }));
    }
    bridge.request_exit();
    for handle in handles {
        handle.join().unwrap();
    }

    bridge.wait_for_exit();
    bridge.request_exit();
    assert_eq!(bridge.state(), LifecycleState::Exited);
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
}

#[test]
fn test_window_events_delivered_in_order() {
    let window = Arc::new(HeadlessWindow::new(800, 600));
    let input = Arc::new(InputQueue::new(16));
    let (tx, rx) = mpsc::channel();

    let bridge = LifecycleBridge::new();
    bridge
        .start(GuestRuntimeHandle::new("looper", collecting_guest(tx)))
        .unwrap();
    wait_for_state(&bridge, LifecycleState::Running);

    bridge.on_window_created(HostWindowRef::new(&window), InputQueueRef::new(&input));
    bridge.on_window_resized(800, 600);
    bridge.on_window_closed();

    let kinds: Vec<EventKind> = (0..3)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap().kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::WindowCreated,
            EventKind::WindowResized,
            EventKind::WindowClosed
        ]
    );

    bridge.request_exit();
    bridge.wait_for_exit();
}

#[test]
fn test_events_published_before_start_reach_guest() {
    let window = Arc::new(HeadlessWindow::new(1280, 720));
    let input = Arc::new(InputQueue::new(16));
    let bridge = LifecycleBridge::new();

    bridge.on_window_created(HostWindowRef::new(&window), InputQueueRef::new(&input));
    bridge.on_text_submitted("hello");
    bridge.on_controller_connection_changed(3, true);

    let (tx, rx) = mpsc::channel();
    bridge
        .start(GuestRuntimeHandle::new("looper", collecting_guest(tx)))
        .unwrap();

    let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    match first {
        PendingEvent::WindowCreated { window: window_ref, input: input_ref } => {
            assert_eq!(window_ref.upgrade().unwrap().size(), (1280, 720));
            input.push(InputEvent::Focus(true));
            assert_eq!(input_ref.upgrade().unwrap().pop(), Some(InputEvent::Focus(true)));
        }
        other => panic!("expected WindowCreated, got {other:?}"),
    }
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        PendingEvent::TextSubmitted("hello".into())
    );
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        PendingEvent::ControllerConnectionChanged { device_id: 3, connected: true }
    );

    bridge.request_exit();
    bridge.wait_for_exit();
}

#[test]
fn test_guest_requested_exit_unblocks_host() {
    let bridge = LifecycleBridge::new();
    let (tx, rx) = mpsc::channel();
    bridge.on_teardown(move || {
        let _ = tx.send(());
    });

    bridge
        .start(GuestRuntimeHandle::new("self-exit", |ctx| {
            ctx.set_looper_running(true);
            ctx.request_exit();
            ctx.request_exit();
            ctx.set_looper_running(false);
        }))
        .unwrap();

    bridge.wait_for_exit();
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    assert_eq!(bridge.state(), LifecycleState::Exited);
}

#[test]
fn test_late_events_dropped_after_exit() {
    let bridge = LifecycleBridge::new();
    bridge
        .start(GuestRuntimeHandle::new("noop", |_ctx| {}))
        .unwrap();
    bridge.wait_for_exit();

    let before = bridge.relay_stats().dropped;
    bridge.on_window_resized(10, 10);
    bridge.on_window_closed();
    assert_eq!(bridge.relay_stats().dropped, before + 2);
}

#[test]
fn test_panicking_guest_collapses_to_exited() {
    let bridge = LifecycleBridge::new();
    bridge
        .start(GuestRuntimeHandle::new("faulty", |ctx| {
            ctx.set_looper_running(true);
            panic!("guest fault");
        }))
        .unwrap();

    bridge.wait_for_exit();
    assert_eq!(bridge.state(), LifecycleState::Exited);
    assert!(!bridge.is_looper_running());
}

#[test]
fn test_wait_for_exit_timeout_on_unresponsive_guest() {
    let release = Arc::new(AtomicBool::new(false));
    let release_clone = Arc::clone(&release);
    let bridge = LifecycleBridge::new();
    bridge
        .start(GuestRuntimeHandle::new("stubborn", move |_ctx| {
            while !release_clone.load(Ordering::SeqCst) {
                thread::sleep(POLL);
            }
        }))
        .unwrap();

    bridge.request_exit();
    assert!(!bridge.wait_for_exit_timeout(Duration::from_millis(30)));
    assert_eq!(bridge.state(), LifecycleState::ExitRequested);

    release.store(true, Ordering::SeqCst);
    assert!(bridge.wait_for_exit_timeout(Duration::from_secs(5)));
}

#[test]
fn test_teardown_hook_after_exit_runs_immediately() {
    let bridge = LifecycleBridge::new();
    bridge
        .start(GuestRuntimeHandle::new("noop", |_ctx| {}))
        .unwrap();
    bridge.wait_for_exit();

    let ran = Arc::new(AtomicBool::new(false));
    let ran_clone = Arc::clone(&ran);
    bridge.on_teardown(move || ran_clone.store(true, Ordering::SeqCst));
    assert!(ran.load(Ordering::SeqCst));
}
