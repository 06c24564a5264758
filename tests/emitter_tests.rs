//--------------------------------------------------------------------------------------------------
// TEST MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Integration tests for the public API: mediator dispatch, the error event, the facade and
// migration from a classic emitter.
//--------------------------------------------------------------------------------------------------

use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

use stream_emitter::{
    Arg, Config, EmitterError, EmitterMediator, EventEmitter, FaultPolicy, LegacySource, Listener,
    ObservableEmitter, Payload, SharedError, UnhandledError, listener,
};

#[derive(Debug, thiserror::Error)]
#[error("socket closed")]
struct SocketClosed;

/// Records every payload a listener receives, tagged with the listener name.
#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<(&'static str, Payload)>>>,
}

impl Recorder {
    fn listener(&self, tag: &'static str) -> Listener {
        let calls = Arc::clone(&self.calls);
        listener(move |payload| {
            calls.lock().push((tag, payload.clone()));
            Ok(())
        })
    }

    fn calls(&self) -> Vec<(&'static str, Payload)> {
        self.calls.lock().clone()
    }
}

#[test]
fn test_single_and_empty_payloads() {
    let mediator = EmitterMediator::new();
    let recorder = Recorder::default();
    mediator.register("n", recorder.listener("l")).unwrap();

    mediator.emit("n", vec![Arg::from(json!({"v": 1}))]).unwrap();
    mediator.emit("n", vec![]).unwrap();

    assert_eq!(
        recorder.calls(),
        vec![
            ("l", Payload::Single(Arg::from(json!({"v": 1})))),
            ("l", Payload::Empty),
        ]
    );
}

#[test]
fn test_composite_payload_reaches_listeners_in_order() {
    let mediator = EmitterMediator::new();
    let recorder = Recorder::default();
    mediator
        .register("n", recorder.listener("l1"))
        .unwrap()
        .register("n", recorder.listener("l2"))
        .unwrap();

    assert!(mediator.emit("n", vec![Arg::from("a"), Arg::from("b")]).unwrap());

    let composite = Payload::Multi(vec![Arg::from("a"), Arg::from("b")]);
    assert_eq!(
        recorder.calls(),
        vec![("l1", composite.clone()), ("l2", composite)]
    );
}

#[test]
fn test_unregistered_name_returns_false() {
    let mediator = EmitterMediator::new();
    assert!(!mediator.emit("nobody", vec![Arg::from(1)]).unwrap());
    assert_eq!(mediator.channel_count(), 0);
}

#[test]
fn test_channel_count_only_grows_for_new_names() {
    let mediator = EmitterMediator::new();
    let recorder = Recorder::default();

    for tag in ["x", "y", "z"] {
        mediator.register("same", recorder.listener(tag)).unwrap();
    }
    assert_eq!(mediator.channel_count(), 1);

    mediator.register("other", recorder.listener("w")).unwrap();
    assert_eq!(mediator.channel_count(), 2);
}

#[test]
fn test_error_event_with_error_instance() {
    let mediator = EmitterMediator::new();
    let err: SharedError = Arc::new(SocketClosed);

    match mediator.emit("error", vec![Arg::Error(Arc::clone(&err))]) {
        Err(EmitterError::Unhandled(UnhandledError::Raised(raised))) => {
            assert!(Arc::ptr_eq(&raised, &err));
            assert_eq!(raised.to_string(), "socket closed");
        }
        other => panic!("Expected the emitted error back, got {:?}", other),
    }
}

#[test]
fn test_error_event_with_plain_string() {
    let mediator = EmitterMediator::new();

    match mediator.emit("error", vec![Arg::from("boom")]) {
        Err(EmitterError::Unhandled(err)) => {
            assert!(err.to_string().contains("boom"));
            assert_eq!(err.context(), Some(&json!("boom")));
        }
        other => panic!("Expected an unhandled error, got {:?}", other),
    }
}

#[test]
fn test_migration_scenario() {
    let recorder = Recorder::default();
    let legacy = EventEmitter::new();
    legacy
        .on("tick", recorder.listener("f"))
        .unwrap()
        .on("data", recorder.listener("g"))
        .unwrap()
        .on("data", recorder.listener("h"))
        .unwrap();

    let mediator = Arc::new(EmitterMediator::new());
    let _adapter = ObservableEmitter::new(Arc::clone(&mediator), Some(&legacy));

    mediator.emit("tick", vec![Arg::from(1)]).unwrap();
    mediator
        .emit("data", vec![Arg::from(1), Arg::from(2)])
        .unwrap();

    let pair = Payload::Multi(vec![Arg::from(1), Arg::from(2)]);
    assert_eq!(
        recorder.calls(),
        vec![
            ("f", Payload::Single(Arg::from(1))),
            ("g", pair.clone()),
            ("h", pair),
        ]
    );

    assert!(legacy.event_names().is_empty());
    for name in ["tick", "data"] {
        assert_eq!(legacy.listener_count(name), 0);
    }
}

#[test]
fn test_adapter_chaining() {
    let recorder = Recorder::default();
    let mediator = Arc::new(EmitterMediator::new());
    let adapter = ObservableEmitter::new(Arc::clone(&mediator), None);

    adapter
        .on("a", recorder.listener("fn1"))
        .unwrap()
        .on("b", recorder.listener("fn2"))
        .unwrap();

    adapter.emit("a", vec![]).unwrap();
    adapter.emit("b", vec![]).unwrap();

    assert_eq!(
        recorder.calls(),
        vec![("fn1", Payload::Empty), ("fn2", Payload::Empty)]
    );
}

#[test]
fn test_broken_listener_does_not_starve_siblings() {
    let recorder = Recorder::default();
    let adapter = ObservableEmitter::new(Arc::new(EmitterMediator::new()), None);
    adapter
        .on("job", listener(|_| Err(anyhow::anyhow!("nope"))))
        .unwrap()
        .on("job", recorder.listener("ok"))
        .unwrap();

    let err = adapter.emit("job", vec![Arg::from(true)]).unwrap_err();

    match err {
        EmitterError::ListenerFault(faults) => assert_eq!(faults.positions(), vec![0]),
        other => panic!("Expected listener faults, got {:?}", other),
    }
    assert_eq!(recorder.calls(), vec![("ok", Payload::Single(Arg::from(true)))]);
}

#[test]
fn test_fail_fast_config_from_lookup() {
    let config = Config::from_lookup(|key| {
        (key == "EMITTER_FAULT_POLICY").then(|| "fail-fast".to_string())
    })
    .unwrap();
    assert_eq!(config.fault_policy, FaultPolicy::FailFast);

    let recorder = Recorder::default();
    let mediator = EmitterMediator::with_config(config);
    mediator
        .register("job", listener(|_| Err(anyhow::anyhow!("nope"))))
        .unwrap()
        .register("job", recorder.listener("never"))
        .unwrap();

    assert!(mediator.emit("job", vec![]).is_err());
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_config_from_environment_matches_lookup() {
    let loaded = Config::try_from_env().expect("environment config should parse");
    let expected = Config::from_lookup(|key| std::env::var(key).ok()).unwrap();

    assert_eq!(loaded, expected);
    assert!(!loaded.error_event.is_empty());
}
