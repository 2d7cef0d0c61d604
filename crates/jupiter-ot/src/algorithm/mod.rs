//! The per-channel Jupiter site algorithm.
//!
//! One [`Jupiter`] instance exists per open document per channel. It holds the
//! channel's [`Timestamp`] and the queue of locally generated operations the
//! peer has not yet acknowledged. `generate` and `receive` form a symmetric
//! API, but the transform tie-break inside `receive` is asymmetric by
//! [`Role`]: the server-serialized operation orders first when two concurrent
//! inserts land at the same position. That asymmetry is the central Jupiter
//! correctness mechanism — with a symmetric rule, two sites can each produce
//! an "equally valid" but divergent result for the same concurrent pair.
//!
//! Concurrency contract: all methods take `&mut self`, and the caller must
//! keep each instance inside a single mutual-exclusion domain (one lock per
//! open document/channel). Interleaved calls corrupt the queue ordering the
//! transforms depend on.

use crate::activity::Activity;
use crate::error::SyncError;
use crate::operation::{transform, Operation};
use crate::timestamp::Timestamp;

/// Which side of a channel this algorithm instance sits on.
///
/// The role selects the tie-break branch: on a `Client`, incoming operations
/// were already serialized by the server and win equal-position insert ties;
/// on a `Server`, the locally queued (server-serialized) operations win.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// A locally generated operation awaiting acknowledgment, tagged with the
/// `local` timestamp component it was generated at.
#[derive(Debug, Clone)]
struct QueuedOperation {
    seq: u32,
    operation: Operation,
}

#[derive(Debug, Clone)]
pub struct Jupiter {
    role: Role,
    time: Timestamp,
    queue: Vec<QueuedOperation>,
}

impl Jupiter {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            time: Timestamp::zero(),
            queue: Vec::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The channel's current vector time.
    pub fn time(&self) -> Timestamp {
        self.time
    }

    /// Number of generated-but-unacknowledged operations.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Stamps a locally generated operation, queues it for acknowledgment
    /// bookkeeping, and returns the [`Activity`] to hand to the transport.
    /// Never blocks, never fails.
    pub fn generate(
        &mut self,
        operation: Operation,
        source_site_id: &str,
        target_path: &str,
    ) -> Activity {
        let activity = Activity::new(operation.clone(), self.time, source_site_id, target_path);
        self.queue.push(QueuedOperation {
            seq: self.time.local,
            operation,
        });
        self.time = self.time.increment_local();
        activity
    }

    /// Accepts an activity from the channel peer and returns the operation,
    /// re-based over every still-unacknowledged local operation, ready to be
    /// applied to the local replica.
    ///
    /// Errors mean the channel is desynchronized; the caller must stop using
    /// it and trigger the external resync/reset flow.
    pub fn receive(&mut self, activity: &Activity) -> Result<Operation, SyncError> {
        let ts = activity.timestamp;
        if ts.remote > self.time.local {
            return Err(SyncError::ProtocolViolation(format!(
                "peer acknowledges operation {} but only {} were generated",
                ts.remote, self.time.local
            )));
        }
        if ts.local != self.time.remote {
            return Err(SyncError::ProtocolViolation(format!(
                "expected peer operation {} but received {}; channel reordered or duplicated",
                self.time.remote, ts.local
            )));
        }

        // Everything the peer has seen no longer needs transforming against.
        self.queue.retain(|entry| entry.seq >= ts.remote);

        // The survivors must be exactly the contiguous run of generation
        // indices from the acknowledged point up to the present.
        let mut expected = ts.remote;
        for entry in &self.queue {
            if entry.seq != expected {
                return Err(SyncError::Transformation(format!(
                    "queue holds generation index {} where {} was expected",
                    entry.seq, expected
                )));
            }
            expected += 1;
        }
        if expected != self.time.local {
            return Err(SyncError::Transformation(format!(
                "queue ends at generation index {} but local time is {}",
                expected, self.time.local
            )));
        }

        // Re-base the incoming operation over each pending local operation in
        // generation order, rewriting each pending operation against it in
        // turn so later acknowledgments see consistent state. The two
        // directions use opposite tie-break flags.
        let incoming_wins = self.role == Role::Client;
        let mut incoming = activity.operation.clone();
        for entry in &mut self.queue {
            let rebased = transform(&incoming, &entry.operation, incoming_wins);
            entry.operation = transform(&entry.operation, &incoming, !incoming_wins);
            incoming = rebased;
        }

        self.time = self.time.increment_remote();
        Ok(incoming)
    }

    /// Clears the queue and resets the timestamp to `(0, 0)`.
    ///
    /// Called by the external recovery flow after a full-document resync.
    /// Afterwards the instance is observationally identical to a freshly
    /// constructed one; nothing from before the reset leaks into later
    /// transforms.
    pub fn reset(&mut self) {
        self.time = Timestamp::zero();
        self.queue.clear();
    }
}
