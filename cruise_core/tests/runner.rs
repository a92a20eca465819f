mod common;

use std::sync::atomic::{AtomicBool, Ordering};

use common::Rig;
use cruise_core::{ControlMode, run};
use cruise_traits::Cue;

#[test]
fn run_time_cap_stops_the_loop() {
    let mut rig = Rig::new(60);
    let stop = AtomicBool::new(false);
    let summary = run(&mut rig.sup, &stop, Some(1000), |_| {}).unwrap();
    assert_eq!(summary.ticks, 100);
    assert_eq!(summary.uptime_ms, 1000);
    assert_eq!(summary.tick_errors, 0);
}

#[test]
fn shutdown_flag_stops_the_loop() {
    let mut rig = Rig::new(60);
    let stop = AtomicBool::new(false);
    let mut seen = 0;
    let summary = run(&mut rig.sup, &stop, None, |_| {
        seen += 1;
        if seen == 5 {
            stop.store(true, Ordering::Relaxed);
        }
    })
    .unwrap();
    assert_eq!(summary.ticks, 5);
}

#[test]
fn exit_leaves_the_actuator_released() {
    let mut rig = Rig::new(60);
    rig.send("s=80");
    let stop = AtomicBool::new(false);
    run(&mut rig.sup, &stop, Some(500), |_| {}).unwrap();
    assert_eq!(rig.mode(), ControlMode::Disengaged);
    assert_eq!(rig.target(), 80);
    let servo = rig.servo.borrow();
    assert!(!servo.attached);
    assert_eq!(servo.position, 0);
    assert_eq!(rig.cue_count(Cue::Disengaged), 1);
}

#[test]
fn actuator_errors_are_recovered() {
    let mut rig = Rig::new(60);
    let servo = rig.servo.clone();
    let commands = rig.commands.clone();
    let stop = AtomicBool::new(false);
    let mut n = 0;
    let summary = run(&mut rig.sup, &stop, Some(1000), |_| {
        n += 1;
        if n == 1 {
            servo.borrow_mut().fail_writes = true;
            commands.borrow_mut().push_back("s=80".into());
        }
    })
    .unwrap();
    assert_eq!(summary.tick_errors, 1);
    assert_eq!(summary.ticks, 100);
    assert_eq!(rig.mode(), ControlMode::Disengaged);
    assert!(!rig.servo.borrow().attached);
}

#[test]
fn faults_are_counted() {
    let mut rig = Rig::new(60);
    rig.send("x=1");
    rig.send("nonsense");
    let stop = AtomicBool::new(false);
    let summary = run(&mut rig.sup, &stop, Some(100), |_| {}).unwrap();
    assert_eq!(summary.faults, 2);
}
