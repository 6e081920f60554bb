use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::foundation::core::{Color, Viewport};
use crate::foundation::variant::Variant;
use crate::rendering::framebuffer::FramebufferHandle;
use crate::rendering::texture::TextureHandle;

#[test]
fn listeners_fire_in_registration_order() {
    let event: Event<i64> = Event::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let first = Rc::clone(&log);
    event.subscribe(move |v| first.borrow_mut().push(("first", *v)));
    let second = Rc::clone(&log);
    event.subscribe(move |v| second.borrow_mut().push(("second", *v)));

    event.emit(&1);
    assert_eq!(*log.borrow(), vec![("first", 1), ("second", 1)]);
}

#[test]
fn unsubscribed_listener_stops_firing() {
    let event: Event<i64> = Event::new();
    let count = Rc::new(RefCell::new(0));

    let counter = Rc::clone(&count);
    let subscription = event.subscribe(move |_| *counter.borrow_mut() += 1);
    event.emit(&1);
    event.unsubscribe(subscription);
    event.emit(&2);

    assert_eq!(*count.borrow(), 1);
}

#[test]
fn reentrant_emission_is_deferred_to_next_pass() {
    let event: Rc<Event<i64>> = Rc::new(Event::new());
    let log = Rc::new(RefCell::new(Vec::new()));

    // The first listener re-emits once; the nested emission must not
    // interleave with the current pass.
    let reentrant = Rc::clone(&event);
    let first = Rc::clone(&log);
    event.subscribe(move |v| {
        first.borrow_mut().push(("first", *v));
        if *v == 1 {
            reentrant.emit(&2);
        }
    });
    let second = Rc::clone(&log);
    event.subscribe(move |v| second.borrow_mut().push(("second", *v)));

    event.emit(&1);
    assert_eq!(
        *log.borrow(),
        vec![("first", 1), ("second", 1), ("first", 2), ("second", 2)]
    );
}

#[test]
fn listener_registered_mid_dispatch_misses_current_pass() {
    let event: Rc<Event<i64>> = Rc::new(Event::new());
    let log = Rc::new(RefCell::new(Vec::new()));

    let target = Rc::clone(&event);
    let outer_log = Rc::clone(&log);
    event.subscribe(move |v| {
        outer_log.borrow_mut().push(("outer", *v));
        let inner_log = Rc::clone(&outer_log);
        target.subscribe(move |v| inner_log.borrow_mut().push(("inner", *v)));
    });

    event.emit(&1);
    assert_eq!(*log.borrow(), vec![("outer", 1)]);
}

#[test]
fn scalar_values_roundtrip_through_variants() {
    assert_eq!(bool::from_variant(&true.to_variant()), Some(true));
    assert_eq!(i64::from_variant(&42i64.to_variant()), Some(42));
    assert_eq!(u64::from_variant(&7u64.to_variant()), Some(7));
    assert_eq!(f32::from_variant(&1.5f32.to_variant()), Some(1.5));
    assert_eq!(
        String::from_variant(&"name".to_string().to_variant()),
        Some("name".to_string())
    );
    assert_eq!(bool::from_variant(&Variant::Int(1)), None);
}

#[test]
fn geometry_values_roundtrip_through_variants() {
    let vp = Viewport::new(0.0, 0.0, 800.0, 600.0);
    assert_eq!(Viewport::from_variant(&vp.to_variant()), Some(vp));

    let color = Color::new(0.25, 0.5, 1.0);
    assert_eq!(Color::from_variant(&color.to_variant()), Some(color));
    assert_eq!(Color::from_variant(&Variant::List(vec![])), None);
}

#[test]
fn handle_values_have_no_variant_form() {
    let handle = TextureHandle::none();
    assert_eq!(handle.to_variant(), Variant::Null);
    assert_eq!(TextureHandle::from_variant(&Variant::Bool(true)), None);
    assert_eq!(FramebufferHandle::none().to_variant(), Variant::Null);
}
