use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::thread;
use std::time::Duration;

use cruise_hardware::error::HwError;
use cruise_hardware::util::poll_until;

#[test]
fn poll_until_success_path() {
    let ready = Arc::new(AtomicBool::new(false));
    let ready_bg = ready.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(3));
        ready_bg.store(true, Ordering::Relaxed);
    });

    let res = poll_until(
        || Ok(ready.load(Ordering::Relaxed).then_some(7)),
        Duration::from_millis(200),
        Duration::from_micros(200),
    );
    assert_eq!(res.ok(), Some(7));
}

#[test]
fn poll_until_timeout_path() {
    let err = poll_until::<()>(
        || Ok(None),
        Duration::from_millis(5),
        Duration::from_micros(200),
    )
    .expect_err("expected timeout error");

    match err {
        HwError::Timeout => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn poll_until_propagates_poll_error_without_retrying() {
    let calls = AtomicUsize::new(0);
    let err = poll_until::<()>(
        || {
            calls.fetch_add(1, Ordering::Relaxed);
            Err(HwError::Uart("framing".into()))
        },
        Duration::from_millis(50),
        Duration::from_micros(200),
    )
    .expect_err("expected uart error");
    assert!(matches!(err, HwError::Uart(_)));
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}
