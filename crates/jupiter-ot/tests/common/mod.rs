#![allow(dead_code)]

//! Deterministic discrete-event network simulator for convergence tests.
//!
//! Models a star topology: one [`Hub`] plus N simulated clients, with one
//! FIFO queue per channel direction. Nothing is delivered until a test steps
//! a channel, so any cross-channel interleaving can be produced and
//! reproduced exactly. Schedules are driven either by explicit steps or by a
//! seeded xorshift generator.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use jupiter_ot::{
    apply, Activity, ActivitySink, DeliveryError, Hub, Jupiter, Operation, Role,
};

type Channel = Rc<RefCell<VecDeque<Activity>>>;

struct ChannelSink(Channel);

impl ActivitySink for ChannelSink {
    fn deliver(&mut self, activity: Activity) -> Result<(), DeliveryError> {
        self.0.borrow_mut().push_back(activity);
        Ok(())
    }
}

pub struct SimClient {
    pub id: String,
    pub document: String,
    algorithm: Jupiter,
    from_server: Channel,
    to_server: VecDeque<Activity>,
}

pub struct Session {
    pub hub: Hub,
    pub clients: Vec<SimClient>,
    path: String,
}

impl Session {
    pub fn new(path: &str, initial: &str, client_ids: &[&str]) -> Self {
        let mut hub = Hub::new(path, initial);
        let clients = client_ids
            .iter()
            .map(|id| {
                let channel: Channel = Rc::new(RefCell::new(VecDeque::new()));
                hub.add_client(*id, Box::new(ChannelSink(channel.clone())));
                SimClient {
                    id: (*id).to_string(),
                    document: initial.to_string(),
                    algorithm: Jupiter::new(Role::Client),
                    from_server: channel,
                    to_server: VecDeque::new(),
                }
            })
            .collect();
        Session {
            hub,
            clients,
            path: path.to_string(),
        }
    }

    /// A client joining mid-session: fresh proxy, replica snapshotted from
    /// the authoritative document.
    pub fn join(&mut self, id: &str) {
        let channel: Channel = Rc::new(RefCell::new(VecDeque::new()));
        self.hub.add_client(id, Box::new(ChannelSink(channel.clone())));
        self.clients.push(SimClient {
            id: id.to_string(),
            document: self.hub.document().to_string(),
            algorithm: Jupiter::new(Role::Client),
            from_server: channel,
            to_server: VecDeque::new(),
        });
    }

    fn local_edit(&mut self, client: usize, operation: Operation) {
        let c = &mut self.clients[client];
        c.document = apply(&c.document, &operation).expect("local edit applies");
        let activity = c.algorithm.generate(operation, &c.id, &self.path);
        c.to_server.push_back(activity);
    }

    pub fn insert(&mut self, client: usize, position: usize, text: &str) {
        self.local_edit(client, Operation::insert(position, text));
    }

    /// Deletes `len` characters at `position` of the client's current replica.
    pub fn delete(&mut self, client: usize, position: usize, len: usize) {
        let text: String = self.clients[client]
            .document
            .chars()
            .skip(position)
            .take(len)
            .collect();
        assert_eq!(text.chars().count(), len, "delete range within replica");
        self.local_edit(client, Operation::delete(position, text));
    }

    /// Delivers one pending message from `client` to the server. Returns
    /// `false` if that channel is empty.
    pub fn step_to_server(&mut self, client: usize) -> bool {
        let c = &mut self.clients[client];
        let Some(activity) = c.to_server.pop_front() else {
            return false;
        };
        self.hub
            .on_client_activity(&c.id, &activity)
            .expect("hub accepts in-order client activity");
        true
    }

    /// Delivers one pending message from the server to `client`. Returns
    /// `false` if that channel is empty.
    pub fn step_from_server(&mut self, client: usize) -> bool {
        let c = &mut self.clients[client];
        let Some(activity) = c.from_server.borrow_mut().pop_front() else {
            return false;
        };
        let operation = c
            .algorithm
            .receive(&activity)
            .expect("client accepts in-order server activity");
        c.document = apply(&c.document, &operation).expect("transformed op applies");
        true
    }

    fn pending_channels(&self) -> Vec<(usize, bool)> {
        let mut channels = Vec::new();
        for (i, c) in self.clients.iter().enumerate() {
            if !c.to_server.is_empty() {
                channels.push((i, true));
            }
            if !c.from_server.borrow().is_empty() {
                channels.push((i, false));
            }
        }
        channels
    }

    /// Drains every channel, picking the next delivery with a seeded
    /// generator so the schedule is arbitrary but reproducible.
    pub fn run_to_quiescence(&mut self, seed: u64) {
        let mut rng = XorShift::new(seed);
        loop {
            let channels = self.pending_channels();
            if channels.is_empty() {
                break;
            }
            let (client, to_server) = channels[(rng.next() % channels.len() as u64) as usize];
            if to_server {
                self.step_to_server(client);
            } else {
                self.step_from_server(client);
            }
        }
    }

    /// Every replica in the session: the authoritative document first, then
    /// each client's, in join order.
    pub fn replicas(&self) -> Vec<String> {
        let mut out = vec![self.hub.document().to_string()];
        out.extend(self.clients.iter().map(|c| c.document.clone()));
        out
    }

    pub fn assert_converged(&self, expected: Option<&str>) {
        let replicas = self.replicas();
        let first = &replicas[0];
        for (i, replica) in replicas.iter().enumerate() {
            assert_eq!(
                replica, first,
                "replica {i} diverged: {replica:?} vs {first:?}"
            );
        }
        if let Some(expected) = expected {
            assert_eq!(first, expected);
        }
    }
}

/// Minimal deterministic generator; quality is irrelevant, reproducibility
/// is the point.
pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        XorShift(seed.wrapping_mul(2685821657736338717).max(1))
    }

    pub fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}
