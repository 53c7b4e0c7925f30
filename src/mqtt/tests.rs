use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use super::link::{BrokerLink, ConnectivityError};
use super::{ConnectionState, ConnectivityManager};

/// In-memory link double. Scripted connect outcomes, scripted inbound
/// batches, recorded publishes.
#[derive(Default)]
struct FakeLinkState {
    connect_results: VecDeque<Result<(), ConnectivityError>>,
    inbound: VecDeque<Result<Vec<Vec<u8>>, ConnectivityError>>,
    published: Vec<(String, Vec<u8>)>,
    connects: usize,
    disconnects: usize,
}

#[derive(Clone, Default)]
struct FakeLink {
    state: Arc<Mutex<FakeLinkState>>,
}

impl FakeLink {
    fn refuse_next(&self, n: usize) {
        let mut s = self.state.lock().unwrap();
        for _ in 0..n {
            s.connect_results
                .push_back(Err(ConnectivityError::Refused("not authorized".into())));
        }
    }

    fn queue_inbound(&self, batch: Vec<Vec<u8>>) {
        self.state.lock().unwrap().inbound.push_back(Ok(batch));
    }

    fn fail_next_drive(&self) {
        self.state
            .lock()
            .unwrap()
            .inbound
            .push_back(Err(ConnectivityError::NotConnected));
    }

    fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.state.lock().unwrap().published.clone()
    }

    fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }
}

#[async_trait]
impl BrokerLink for FakeLink {
    async fn connect(&mut self) -> Result<(), ConnectivityError> {
        let mut s = self.state.lock().unwrap();
        s.connects += 1;
        s.connect_results.pop_front().unwrap_or(Ok(()))
    }

    async fn drive(&mut self) -> Result<Vec<Vec<u8>>, ConnectivityError> {
        self.state
            .lock()
            .unwrap()
            .inbound
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), ConnectivityError> {
        self.state
            .lock()
            .unwrap()
            .published
            .push((topic.to_string(), payload));
        Ok(())
    }

    fn disconnect(&mut self) {
        self.state.lock().unwrap().disconnects += 1;
    }
}

fn manager() -> (ConnectivityManager, FakeLink) {
    let link = FakeLink::default();
    (ConnectivityManager::new(Box::new(link.clone())), link)
}

#[tokio::test]
async fn successful_attempt_reaches_connected() {
    let (mut manager, link) = manager();
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    assert!(manager.attempt_connect().await);
    assert_eq!(manager.state(), ConnectionState::Connected);
    assert_eq!(link.connects(), 1);
}

#[tokio::test]
async fn failed_attempt_falls_back_to_disconnected() {
    let (mut manager, link) = manager();
    link.refuse_next(1);

    assert!(!manager.attempt_connect().await);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(!manager.is_connected());
}

#[tokio::test]
async fn tick_delivers_buffered_inbound() {
    let (mut manager, link) = manager();
    manager.attempt_connect().await;
    link.queue_inbound(vec![b"one".to_vec(), b"two".to_vec()]);

    assert_eq!(manager.tick().await, vec![b"one".to_vec(), b"two".to_vec()]);
    assert_eq!(manager.status().messages_received, 2);
    // nothing more buffered
    assert!(manager.tick().await.is_empty());
}

#[tokio::test]
async fn tick_is_a_no_op_while_disconnected() {
    let (mut manager, link) = manager();
    link.queue_inbound(vec![b"ignored".to_vec()]);
    assert!(manager.tick().await.is_empty());
    assert_eq!(manager.status().messages_received, 0);
}

#[tokio::test]
async fn session_error_during_tick_disconnects() {
    let (mut manager, link) = manager();
    manager.attempt_connect().await;
    link.fail_next_drive();

    assert!(manager.tick().await.is_empty());
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert_eq!(link.state.lock().unwrap().disconnects, 1);
}

#[tokio::test]
async fn publish_is_silently_skipped_while_disconnected() {
    let (mut manager, link) = manager();
    manager.publish("irblaster/rx", b"dropped".to_vec());
    assert!(link.published().is_empty());
    assert_eq!(manager.status().messages_sent, 0);
}

#[tokio::test]
async fn publish_forwards_while_connected() {
    let (mut manager, link) = manager();
    manager.attempt_connect().await;
    manager.publish("irblaster/rx", b"{\"type\":\"NEC\"}".to_vec());

    assert_eq!(
        link.published(),
        vec![("irblaster/rx".to_string(), b"{\"type\":\"NEC\"}".to_vec())]
    );
    assert_eq!(manager.status().messages_sent, 1);
}
