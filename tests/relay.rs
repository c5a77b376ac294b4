//! Relay connection manager integration tests
//!
//! Drives `RelayManager` through scripted transports to pin down the
//! bounded-retry cycle and the send-failure reconnect path.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_test::assert_ok;

use overlord_gateway::config::RelaySettings;
use overlord_gateway::{
    Error, RelayCommand, RelayManager, RelayState, RelayTransport, RelayWire,
};

fn settings() -> RelaySettings {
    RelaySettings {
        url: "ws://localhost:9999".to_string(),
        max_attempts: 5,
        retry_delay: Duration::ZERO,
    }
}

/// Transport whose connection attempts always fail, counting each one
struct FailingTransport {
    attempts: Arc<AtomicU32>,
}

#[async_trait]
impl RelayTransport for FailingTransport {
    async fn connect(&self, _url: &str) -> overlord_gateway::Result<Box<dyn RelayWire>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::ConnectionLost("connection refused".to_string()))
    }
}

/// Transport that always yields a wire with the given send behavior
struct ScriptedTransport {
    connects: Arc<AtomicU32>,
    wire_fails: bool,
}

#[async_trait]
impl RelayTransport for ScriptedTransport {
    async fn connect(&self, _url: &str) -> overlord_gateway::Result<Box<dyn RelayWire>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedWire {
            fails: self.wire_fails,
        }))
    }
}

struct ScriptedWire {
    fails: bool,
}

#[async_trait]
impl RelayWire for ScriptedWire {
    async fn send_text(&mut self, _text: String) -> overlord_gateway::Result<()> {
        if self.fails {
            Err(Error::ConnectionLost("peer went away".to_string()))
        } else {
            Ok(())
        }
    }
}

fn spoken(text: &str) -> RelayCommand {
    RelayCommand::Overlord {
        text: text.to_string(),
        voice: "default".to_string(),
        speed: 1.2,
        volume: 1.0,
    }
}

#[tokio::test]
async fn connect_stops_after_max_attempts() {
    let attempts = Arc::new(AtomicU32::new(0));
    let mut manager = RelayManager::with_transport(
        settings(),
        Box::new(FailingTransport {
            attempts: Arc::clone(&attempts),
        }),
    );

    manager.connect().await;

    assert_eq!(attempts.load(Ordering::SeqCst), 5);
    assert_eq!(manager.state(), RelayState::Disconnected);
}

#[tokio::test]
async fn exhausted_cycle_does_not_auto_retry() {
    let attempts = Arc::new(AtomicU32::new(0));
    let mut manager = RelayManager::with_transport(
        settings(),
        Box::new(FailingTransport {
            attempts: Arc::clone(&attempts),
        }),
    );

    manager.connect().await;
    let after_first_cycle = attempts.load(Ordering::SeqCst);

    // A send can fail without spending any further attempts
    let err = manager.send(&spoken("hello")).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionLost(_)));
    assert_eq!(attempts.load(Ordering::SeqCst), after_first_cycle);
}

#[tokio::test]
async fn send_before_connect_is_connection_lost() {
    let mut manager = RelayManager::with_transport(
        settings(),
        Box::new(ScriptedTransport {
            connects: Arc::new(AtomicU32::new(0)),
            wire_fails: false,
        }),
    );

    let err = manager.send(&spoken("hello")).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionLost(_)));
}

#[tokio::test]
async fn successful_connect_then_send() {
    let connects = Arc::new(AtomicU32::new(0));
    let mut manager = RelayManager::with_transport(
        settings(),
        Box::new(ScriptedTransport {
            connects: Arc::clone(&connects),
            wire_fails: false,
        }),
    );

    manager.connect().await;
    assert_eq!(manager.state(), RelayState::Connected);
    assert_eq!(connects.load(Ordering::SeqCst), 1);

    assert_ok!(manager.send(&spoken("hello")).await);
}

#[tokio::test]
async fn connect_is_noop_when_connected() {
    let connects = Arc::new(AtomicU32::new(0));
    let mut manager = RelayManager::with_transport(
        settings(),
        Box::new(ScriptedTransport {
            connects: Arc::clone(&connects),
            wire_fails: false,
        }),
    );

    manager.connect().await;
    manager.connect().await;

    assert_eq!(connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn mid_send_drop_triggers_reconnect_cycle() {
    let connects = Arc::new(AtomicU32::new(0));
    let mut manager = RelayManager::with_transport(
        settings(),
        Box::new(ScriptedTransport {
            connects: Arc::clone(&connects),
            wire_fails: true,
        }),
    );

    manager.connect().await;
    assert_eq!(connects.load(Ordering::SeqCst), 1);

    // The failed send surfaces the error after running a fresh cycle
    let err = manager.send(&spoken("hello")).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionLost(_)));
    assert_eq!(connects.load(Ordering::SeqCst), 2);
    assert_eq!(manager.state(), RelayState::Connected);

    // The replacement wire still fails; every send repeats the cycle
    let err = manager.send(&spoken("again")).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionLost(_)));
    assert_eq!(connects.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn empty_url_is_terminal() {
    let attempts = Arc::new(AtomicU32::new(0));
    let mut manager = RelayManager::with_transport(
        RelaySettings {
            url: String::new(),
            max_attempts: 5,
            retry_delay: Duration::ZERO,
        },
        Box::new(FailingTransport {
            attempts: Arc::clone(&attempts),
        }),
    );

    assert_eq!(manager.state(), RelayState::Failed);
    manager.connect().await;
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
    assert_eq!(manager.state(), RelayState::Failed);
}
