//! Integration tests for observer fan-out.

use policy_sync::infrastructure::mocks::MockTransport;
use policy_sync::{
    Broadcaster, Domain, ObserverId, ObserverRegistry, PolicyCommand,
};
use std::sync::Arc;

fn d(s: &str) -> Domain {
    Domain::normalize(s).unwrap()
}

#[test]
fn one_failed_delivery_does_not_prevent_or_alter_the_other() {
    let registry = Arc::new(ObserverRegistry::new());
    let transport = Arc::new(MockTransport::new());
    let broadcaster = Broadcaster::new(Arc::clone(&registry), transport.clone());

    // Two observers both currently on example.com.
    registry.attach(ObserverId::new(1), d("example.com"));
    registry.attach(ObserverId::new(2), d("example.com"));
    transport.fail_observer(ObserverId::new(1));

    broadcaster.broadcast(&d("example.com"), true);

    // Both deliveries were attempted independently.
    assert_eq!(transport.attempts(), 2);
    assert!(transport.deliveries_for(ObserverId::new(1)).is_empty());

    let delivered = transport.deliveries_for(ObserverId::new(2));
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].command, PolicyCommand::Apply);
    assert_eq!(delivered[0].domain, d("example.com"));
}

#[test]
fn failed_observer_receives_again_once_reachable() {
    let registry = Arc::new(ObserverRegistry::new());
    let transport = Arc::new(MockTransport::new());
    let broadcaster = Broadcaster::new(Arc::clone(&registry), transport.clone());

    registry.attach(ObserverId::new(1), d("example.com"));
    transport.fail_observer(ObserverId::new(1));
    broadcaster.broadcast(&d("example.com"), true);
    assert!(transport.deliveries_for(ObserverId::new(1)).is_empty());

    // The registry entry survives the failure; the next broadcast lands.
    transport.restore_observer(ObserverId::new(1));
    broadcaster.broadcast(&d("example.com"), false);

    let delivered = transport.deliveries_for(ObserverId::new(1));
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].command, PolicyCommand::Remove);
}

#[test]
fn broadcast_skips_observers_of_other_domains() {
    let registry = Arc::new(ObserverRegistry::new());
    let transport = Arc::new(MockTransport::new());
    let broadcaster = Broadcaster::new(Arc::clone(&registry), transport.clone());

    registry.attach(ObserverId::new(1), d("example.com"));
    registry.attach(ObserverId::new(2), d("news.example.co.uk"));

    let attempted = broadcaster.broadcast(&d("example.com"), true);
    assert_eq!(attempted, 1);
    assert!(transport.deliveries_for(ObserverId::new(2)).is_empty());
}

#[test]
fn broadcast_with_no_observers_is_a_no_op() {
    let registry = Arc::new(ObserverRegistry::new());
    let transport = Arc::new(MockTransport::new());
    let broadcaster = Broadcaster::new(registry, transport.clone());

    assert_eq!(broadcaster.broadcast(&d("example.com"), true), 0);
    assert_eq!(transport.attempts(), 0);
}
