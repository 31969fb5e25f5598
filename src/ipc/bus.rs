//! In-process message bus.
//!
//! # Responsibilities
//! - Hand out well-known names exclusively
//! - Route method calls to the owner of the destination name
//! - Carry the owner's verdict back to the caller
//!
//! # Design Decisions
//! - Bounded queue per name (backpressure on callers)
//! - A call nobody handles fails as an unknown method
//! - Dropping the endpoint releases the name

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::ipc::message::{Handling, MethodCall, Reply};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    #[error("name {0} is already owned")]
    NameTaken(String),

    #[error("no service owns {0}")]
    ServiceUnknown(String),

    #[error("unknown method {interface}.{member} on {path}")]
    UnknownMethod {
        path: String,
        interface: String,
        member: String,
    },

    #[error("service {0} went away before replying")]
    NoReply(String),
}

/// A call waiting for its owner to answer.
pub struct Incoming {
    pub call: MethodCall,
    reply: oneshot::Sender<Handling>,
}

impl Incoming {
    pub fn respond(self, handling: Handling) {
        // The caller may have given up.
        let _ = self.reply.send(handling);
    }
}

/// Receiving side of an owned name.
pub struct Endpoint {
    name: String,
    rx: mpsc::Receiver<Incoming>,
    bus: Bus,
}

impl Endpoint {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Next inbound call, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Incoming> {
        self.rx.recv().await
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.bus.release(&self.name);
    }
}

/// Name registry shared by services and callers.
#[derive(Clone, Default)]
pub struct Bus {
    names: Arc<Mutex<HashMap<String, mpsc::Sender<Incoming>>>>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take exclusive ownership of `name`.
    pub fn request_name(&self, name: &str, queue_depth: usize) -> Result<Endpoint, BusError> {
        let mut names = self.names.lock().unwrap_or_else(PoisonError::into_inner);
        if names.contains_key(name) {
            return Err(BusError::NameTaken(name.to_string()));
        }

        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        names.insert(name.to_string(), tx);
        tracing::info!(name, "Bus name acquired");

        Ok(Endpoint {
            name: name.to_string(),
            rx,
            bus: self.clone(),
        })
    }

    pub fn has_owner(&self, name: &str) -> bool {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Send a call and wait for the method return.
    pub async fn call(&self, call: MethodCall) -> Result<Reply, BusError> {
        let sender = self
            .names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&call.destination)
            .cloned()
            .ok_or_else(|| BusError::ServiceUnknown(call.destination.clone()))?;

        let destination = call.destination.clone();
        let (reply_tx, reply_rx) = oneshot::channel();
        let (path, interface, member) = (call.path.clone(), call.interface.clone(), call.member.clone());

        sender
            .send(Incoming { call, reply: reply_tx })
            .await
            .map_err(|_| BusError::NoReply(destination.clone()))?;

        match reply_rx.await {
            Ok(Handling::Handled(reply)) => Ok(reply),
            Ok(Handling::NotHandled) => Err(BusError::UnknownMethod { path, interface, member }),
            Err(_) => Err(BusError::NoReply(destination)),
        }
    }

    fn release(&self, name: &str) {
        let removed = self
            .names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        if removed.is_some() {
            tracing::info!(name, "Bus name released");
        }
    }
}
