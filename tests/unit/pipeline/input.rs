use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::base::environment::Environment;
use crate::foundation::variant::Variant;
use crate::pipeline::output::Output;
use crate::pipeline::slot::AbstractSlot;
use crate::pipeline::stage::StageCore;

fn two_cores() -> (Environment, StageCore, StageCore) {
    let env = Environment::new();
    let producer = StageCore::new(&env, "producer");
    let consumer = StageCore::new(&env, "consumer");
    (env, producer, consumer)
}

fn change_log(input: &Input<i64>) -> Rc<RefCell<Vec<i64>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    input.on_changed(move |v| sink.borrow_mut().push(*v));
    log
}

#[test]
fn local_value_set_and_get() {
    let (_env, _producer, consumer) = two_cores();
    let input = Input::new(&consumer, "count", 1i64);
    assert_eq!(input.get(), 1);
    assert!(input.is_valid());
    assert!(!input.is_connected());

    input.set(5);
    assert_eq!(input.get(), 5);
}

#[test]
fn set_fires_only_on_actual_change() {
    let (_env, _producer, consumer) = two_cores();
    let input = Input::new(&consumer, "count", 1i64);
    let log = change_log(&input);

    input.set(1);
    assert!(log.borrow().is_empty());
    input.set(2);
    assert_eq!(*log.borrow(), vec![2]);
}

#[test]
fn connected_input_reads_source_and_mirrors_validity() {
    let (_env, producer, consumer) = two_cores();
    let output = Output::new(&producer, "value", 0i64);
    let input = Input::new(&consumer, "value", 0i64);

    input.connect_to(&output);
    assert!(input.is_connected());
    assert!(!input.is_valid(), "fresh outputs are stale");

    output.set(9);
    assert_eq!(input.get(), 9);
    assert!(input.is_valid());

    output.invalidate();
    assert!(!input.is_valid());
    assert_eq!(input.get(), 9, "stale reads fall back to the last value");
}

#[test]
fn connect_fires_exactly_once_when_values_differ() {
    let (_env, producer, consumer) = two_cores();
    let output = Output::new(&producer, "value", 0i64);
    output.set(3);
    let input = Input::new(&consumer, "value", 0i64);
    let log = change_log(&input);

    input.connect_to(&output);
    assert_eq!(*log.borrow(), vec![3]);
}

#[test]
fn connect_stays_silent_when_values_match() {
    let (_env, producer, consumer) = two_cores();
    let output = Output::new(&producer, "value", 0i64);
    output.set(4);
    let input = Input::new(&consumer, "value", 4i64);
    let log = change_log(&input);

    input.connect_to(&output);
    assert!(log.borrow().is_empty());
}

#[test]
fn set_on_connected_input_is_ignored() {
    let (_env, producer, consumer) = two_cores();
    let output = Output::new(&producer, "value", 0i64);
    output.set(7);
    let input = Input::new(&consumer, "value", 0i64);
    input.connect_to(&output);

    input.set(100);
    assert_eq!(input.get(), 7, "the bound output stays the point of truth");
}

#[test]
fn rebinding_replaces_the_previous_source() {
    let (_env, producer, consumer) = two_cores();
    let first = Output::new(&producer, "first", 0i64);
    let second = Output::new(&producer, "second", 0i64);
    first.set(1);
    second.set(2);

    let input = Input::new(&consumer, "value", 0i64);
    input.connect_to(&first);
    input.connect_to(&second);
    assert_eq!(input.get(), 2);

    let log = change_log(&input);
    first.set(10);
    assert!(
        log.borrow().is_empty(),
        "the replaced source must not notify"
    );
    second.set(20);
    assert_eq!(*log.borrow(), vec![20]);
}

#[test]
fn disconnect_reverts_to_the_local_value() {
    let (_env, producer, consumer) = two_cores();
    let output = Output::new(&producer, "value", 0i64);
    output.set(8);
    let input = Input::new(&consumer, "value", 3i64);
    input.connect_to(&output);
    assert_eq!(input.get(), 8);

    let log = change_log(&input);
    AbstractSlot::disconnect(&input);
    assert!(!input.is_connected());
    assert_eq!(input.get(), 3);
    assert!(input.is_valid());
    assert_eq!(*log.borrow(), vec![3]);
}

#[test]
fn input_changes_mark_the_owning_stage_dirty() {
    let (_env, _producer, consumer) = two_cores();
    let input = Input::new(&consumer, "value", 0i64);
    consumer.shared.dirty.set(false);

    input.set(1);
    assert!(consumer.shared.dirty.get());
}

#[test]
fn input_changes_cascade_staleness_to_stage_outputs() {
    let (_env, _producer, consumer) = two_cores();
    let input = Input::new(&consumer, "value", 0i64);
    let output = Output::new(&consumer, "result", 0i64);
    output.set(1);
    assert!(output.is_valid());

    input.set(5);
    assert!(!output.is_valid(), "input changes make own outputs stale");
}

#[test]
fn variant_access_reflects_the_effective_value() {
    let (_env, _producer, consumer) = two_cores();
    let input = Input::new(&consumer, "value", 2i64);
    assert_eq!(input.get_variant(), Variant::Int(2));

    input.set_variant(&Variant::Int(6)).unwrap();
    assert_eq!(input.get(), 6);
    assert!(input.set_variant(&Variant::Str("no".into())).is_err());
}
