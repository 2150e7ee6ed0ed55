//! Outbound message fan-out.
//!
//! Each connected client owns a bounded channel; the transport layer
//! drains the receiving end. A slow client drops messages rather than
//! stalling the session, the UI recovers from gaps via full refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::Mutex;

use gridsync_protocol::ServerMessage;

pub type ClientId = String;

pub struct ConnectionManager {
    clients: Mutex<Vec<(ClientId, SyncSender<ServerMessage>)>>,
    queue_depth: usize,
    dropped: AtomicU64,
}

impl ConnectionManager {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            clients: Mutex::new(Vec::new()),
            queue_depth,
            dropped: AtomicU64::new(0),
        }
    }

    /// Register a client and hand back the receiving end of its queue.
    /// Re-registering an id replaces the previous queue (reconnect).
    pub fn register(&self, client_id: &str) -> Receiver<ServerMessage> {
        let (tx, rx) = sync_channel(self.queue_depth);
        let mut clients = self.clients.lock().expect("connection registry poisoned");
        clients.retain(|(id, _)| id != client_id);
        clients.push((client_id.to_string(), tx));
        rx
    }

    pub fn unregister(&self, client_id: &str) {
        let mut clients = self.clients.lock().expect("connection registry poisoned");
        clients.retain(|(id, _)| id != client_id);
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().expect("connection registry poisoned").len()
    }

    /// Queue a message for one client. Missing clients and full queues are
    /// logged, never errors.
    pub fn send_to(&self, client_id: &str, message: ServerMessage) {
        let clients = self.clients.lock().expect("connection registry poisoned");
        match clients.iter().find(|(id, _)| id == client_id) {
            Some((_, tx)) => self.try_send(client_id, tx, message),
            None => log::warn!("no connection registered for client {client_id}"),
        }
    }

    /// Queue a message for every connected client.
    pub fn broadcast(&self, message: &ServerMessage) {
        let clients = self.clients.lock().expect("connection registry poisoned");
        for (id, tx) in clients.iter() {
            self.try_send(id, tx, message.clone());
        }
    }

    /// Messages dropped on full queues since startup.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn try_send(&self, client_id: &str, tx: &SyncSender<ServerMessage>, message: ServerMessage) {
        match tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::debug!("queue full for client {client_id}, dropping message");
            }
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("client {client_id} disconnected, dropping message");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsync_protocol::Notice;

    fn notice(content: &str) -> ServerMessage {
        ServerMessage::ChatMessage(Notice {
            role: "assistant".into(),
            content: content.into(),
            timestamp: "2025-01-01T00:00:00Z".into(),
            error: false,
        })
    }

    #[test]
    fn send_to_reaches_only_the_target() {
        let manager = ConnectionManager::new(8);
        let rx_a = manager.register("a");
        let rx_b = manager.register("b");

        manager.send_to("a", notice("hello"));
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn broadcast_reaches_everyone() {
        let manager = ConnectionManager::new(8);
        let rx_a = manager.register("a");
        let rx_b = manager.register("b");

        manager.broadcast(&notice("all"));
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let manager = ConnectionManager::new(2);
        let rx = manager.register("slow");

        for _ in 0..5 {
            manager.send_to("slow", notice("x"));
        }
        assert_eq!(manager.dropped_count(), 3);
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn reregister_replaces_the_queue() {
        let manager = ConnectionManager::new(8);
        let stale = manager.register("a");
        let fresh = manager.register("a");
        assert_eq!(manager.client_count(), 1);

        manager.send_to("a", notice("after reconnect"));
        assert!(stale.try_recv().is_err());
        assert!(fresh.try_recv().is_ok());
    }

    #[test]
    fn unregister_silences_the_client() {
        let manager = ConnectionManager::new(8);
        let rx = manager.register("a");
        manager.unregister("a");
        manager.send_to("a", notice("gone"));
        assert!(rx.try_recv().is_err());
        drop(rx);
    }
}
