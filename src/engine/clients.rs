//! Clients controlled by the active engine
//!
//! Each interception point holds a [`Client`]. Claiming publishes a new
//! engine to every client at once, so a freshly activated version takes over
//! in place.

use crate::engine::Engine;
use std::sync::Arc;
use tokio::sync::watch;

/// Registry of connected clients
#[derive(Clone)]
pub struct ClientRegistry {
    tx: Arc<watch::Sender<Option<Arc<Engine>>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Register a client; it sees whichever engine is active now or later
    pub fn connect(&self) -> Client {
        Client {
            rx: self.tx.subscribe(),
        }
    }

    /// Make `engine` the controller of every client, returning how many were claimed
    pub fn claim(&self, engine: Arc<Engine>) -> usize {
        self.tx.send_replace(Some(engine));
        self.tx.receiver_count()
    }

    /// Currently active engine
    pub fn controller(&self) -> Option<Arc<Engine>> {
        self.tx.borrow().clone()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A connected client
#[derive(Clone)]
pub struct Client {
    rx: watch::Receiver<Option<Arc<Engine>>>,
}

impl Client {
    /// Engine controlling this client, if one has been activated
    pub fn controller(&self) -> Option<Arc<Engine>> {
        self.rx.borrow().clone()
    }
}
