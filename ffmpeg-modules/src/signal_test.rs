use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::Signal;
use crate::data::{Data, Payload, RawData};
use crate::error::Error;

fn payload(bytes: &[u8]) -> Data {
    Payload::from(RawData::copy(bytes)).share()
}

#[test]
fn test_emit_without_sinks() -> anyhow::Result<()> {
    let mut signal = Signal::new();
    assert!(signal.is_empty());
    assert_eq!(signal.emit(payload(b"x"))?, 0);
    Ok(())
}

#[test]
fn test_delivery_follows_registration_order() -> anyhow::Result<()> {
    let mut signal = Signal::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    for id in 0..3 {
        let order = order.clone();
        let index = signal.register(move |_| {
            order.borrow_mut().push(id);
            Ok(())
        });
        assert_eq!(index, id);
    }

    assert_eq!(signal.emit(payload(b"abc"))?, 3);
    assert_eq!(*order.borrow(), vec![0, 1, 2]);
    Ok(())
}

#[test]
fn test_fan_out_shares_one_instance() -> anyhow::Result<()> {
    let mut signal = Signal::new();
    let seen: Rc<RefCell<Vec<Data>>> = Rc::new(RefCell::new(Vec::new()));

    for _ in 0..2 {
        let seen = seen.clone();
        signal.register(move |data| {
            seen.borrow_mut().push(data);
            Ok(())
        });
    }

    signal.emit(payload(b"first"))?;
    signal.emit(payload(b"second"))?;

    let seen = seen.borrow();
    assert_eq!(seen.len(), 4);
    assert!(Arc::ptr_eq(&seen[0], &seen[1]));
    assert_eq!(seen[0].data(), b"first");
    assert_eq!(seen[2].data(), seen[3].data());
    assert_eq!(seen[3].data(), b"second");
    Ok(())
}

#[test]
fn test_failing_sink_does_not_stop_delivery() {
    let mut signal = Signal::new();
    let received = Rc::new(RefCell::new(0));

    signal.register(|_| Err(Error::decode("boom")));
    let counter = received.clone();
    signal.register(move |_| {
        *counter.borrow_mut() += 1;
        Ok(())
    });

    let err = signal.emit(payload(b"abc")).unwrap_err();
    assert_eq!(*received.borrow(), 1);

    let delivery = err.as_delivery().expect("delivery error");
    assert_eq!(delivery.attempted, 2);
    assert_eq!(delivery.failed_indices(), vec![0]);
    assert!(matches!(delivery.failures[0].error, Error::Decode(_)));
}

#[test]
fn test_panicking_sink_is_isolated() {
    let mut signal = Signal::new();
    let received = Rc::new(RefCell::new(Vec::new()));

    let first = received.clone();
    signal.register(move |_| {
        first.borrow_mut().push("first");
        Ok(())
    });
    signal.register(|_| panic!("sink exploded"));
    let last = received.clone();
    signal.register(move |_| {
        last.borrow_mut().push("last");
        Ok(())
    });

    let err = signal.emit(payload(b"abc")).unwrap_err();
    assert_eq!(*received.borrow(), vec!["first", "last"]);

    let delivery = err.as_delivery().expect("delivery error");
    assert_eq!(delivery.failed_indices(), vec![1]);
    match &delivery.failures[0].error {
        Error::SinkPanicked(msg) => assert_eq!(msg, "sink exploded"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_all_failures_are_aggregated() {
    let mut signal = Signal::new();
    signal.register(|_| Err(Error::SinkGone));
    signal.register(|_| Ok(()));
    signal.register(|_| Err(Error::Reentrant));

    let err = signal.emit(payload(b"abc")).unwrap_err();
    let delivery = err.as_delivery().expect("delivery error");
    assert_eq!(delivery.attempted, 3);
    assert_eq!(delivery.failed_indices(), vec![0, 2]);
}
