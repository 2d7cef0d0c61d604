//! jupiter-ot — operational transformation for replicated text documents.
//!
//! Keeps concurrently edited replicas convergent across a star topology (one
//! server, N clients) using the Jupiter protocol: a two-component per-channel
//! timestamp and asymmetric client/server transform roles.
//!
//! The crate is a synchronous state-machine library with no threads, no I/O,
//! and no global state. Editor bindings, transport, session membership, and
//! the checksum watchdog are external collaborators; they drive the three
//! entry points this crate exposes per channel ([`Jupiter::generate`],
//! [`Jupiter::receive`], [`Jupiter::reset`]) and the server-side relay
//! ([`Hub`]).

pub mod activity;
pub mod algorithm;
pub mod codec;
pub mod error;
pub mod hub;
pub mod operation;
pub mod timestamp;

pub use activity::Activity;
pub use algorithm::{Jupiter, Role};
pub use error::SyncError;
pub use hub::{ActivitySink, DeliveryError, Hub};
pub use operation::{apply, compose, normalize, transform, Operation};
pub use timestamp::Timestamp;
