//! The server-side multiplexer: one [`Jupiter`] proxy per connected client,
//! plus the authoritative document replica.
//!
//! On receiving an edit from client A the hub transforms it through A's proxy
//! into its canonical server-side form, re-generates it through every other
//! client's proxy, and hands each per-recipient [`Activity`] to that client's
//! [`ActivitySink`]. All methods take `&mut self`: the caller keeps one hub
//! per shared document behind a single mutex or actor, so every proxy
//! observes one total order of operations. Interleaving the receive/fan-out
//! sequence for the same document reintroduces exactly the divergence this
//! protocol exists to prevent.

use indexmap::IndexMap;
use thiserror::Error;

use crate::activity::Activity;
use crate::algorithm::{Jupiter, Role};
use crate::error::SyncError;
use crate::operation::{apply, Operation};

/// Where the hub pushes per-recipient activities.
///
/// Implemented by the transport layer. A failed delivery drops the recipient
/// from the hub; it never aborts delivery to the remaining clients.
pub trait ActivitySink {
    fn deliver(&mut self, activity: Activity) -> Result<(), DeliveryError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("recipient unreachable: {0}")]
    Unreachable(String),
}

struct Proxy {
    algorithm: Jupiter,
    sink: Box<dyn ActivitySink>,
}

pub struct Hub {
    target_path: String,
    document: String,
    proxies: IndexMap<String, Proxy>,
}

impl Hub {
    /// A hub for one shared document; `document` is the initial authoritative
    /// content. Relayed activities keep the originating client's site id.
    pub fn new(target_path: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            target_path: target_path.into(),
            document: document.into(),
            proxies: IndexMap::new(),
        }
    }

    /// The authoritative replica, kept canonical for late joiners and
    /// consistency checks.
    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    pub fn contains_client(&self, client_id: &str) -> bool {
        self.proxies.contains_key(client_id)
    }

    pub fn client_ids(&self) -> impl Iterator<Item = &str> {
        self.proxies.keys().map(String::as_str)
    }

    pub fn client_count(&self) -> usize {
        self.proxies.len()
    }

    /// Registers a client with a fresh proxy at `(0, 0)`. Re-adding an id
    /// replaces its proxy wholesale: a rejoin opens a new channel, and the
    /// old channel's queue must not leak into it.
    pub fn add_client(&mut self, client_id: impl Into<String>, sink: Box<dyn ActivitySink>) {
        self.proxies.insert(
            client_id.into(),
            Proxy {
                algorithm: Jupiter::new(Role::Server),
                sink,
            },
        );
    }

    /// Drops a client's proxy. Removing an absent id is a no-op, as is any
    /// fan-out that would have reached it.
    pub fn remove_client(&mut self, client_id: &str) {
        self.proxies.shift_remove(client_id);
    }

    /// Resets one client's proxy to its freshly-joined state. Used by the
    /// external recovery flow after resyncing that client's replica from the
    /// authoritative document.
    pub fn reset_client(&mut self, client_id: &str) -> Result<(), SyncError> {
        let proxy = self
            .proxies
            .get_mut(client_id)
            .ok_or_else(|| SyncError::UnknownClient(client_id.to_string()))?;
        proxy.algorithm.reset();
        Ok(())
    }

    /// Transforms an incoming client edit into its canonical server-side
    /// form, fans it out to every other client, and applies it to the
    /// authoritative replica. Returns the canonical operation.
    ///
    /// A recipient whose sink fails is dropped from the hub; delivery to the
    /// rest continues and the authoritative replica is still updated.
    pub fn on_client_activity(
        &mut self,
        sender_id: &str,
        activity: &Activity,
    ) -> Result<Operation, SyncError> {
        let sender = self
            .proxies
            .get_mut(sender_id)
            .ok_or_else(|| SyncError::UnknownClient(sender_id.to_string()))?;
        let operation = sender.algorithm.receive(activity)?;

        let mut unreachable: Vec<String> = Vec::new();
        for (client_id, proxy) in &mut self.proxies {
            if client_id == sender_id {
                continue;
            }
            let outgoing =
                proxy
                    .algorithm
                    .generate(operation.clone(), &activity.source_site_id, &self.target_path);
            if proxy.sink.deliver(outgoing).is_err() {
                unreachable.push(client_id.clone());
            }
        }
        for client_id in &unreachable {
            self.proxies.shift_remove(client_id);
        }

        self.document = apply(&self.document, &operation)?;
        Ok(operation)
    }
}
