//! The wire envelope exchanged between sites.

use crate::operation::Operation;
use crate::timestamp::Timestamp;

/// One transmitted edit: an [`Operation`] stamped with the sender's channel
/// [`Timestamp`], plus routing metadata.
///
/// `source_site_id` identifies the site that originally produced the edit
/// (not necessarily the channel peer — the server relays client edits under
/// its own channel timestamps but preserves the originator). `target_path`
/// names the shared document the edit belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub operation: Operation,
    pub timestamp: Timestamp,
    pub source_site_id: String,
    pub target_path: String,
}

impl Activity {
    pub fn new(
        operation: Operation,
        timestamp: Timestamp,
        source_site_id: impl Into<String>,
        target_path: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            timestamp,
            source_site_id: source_site_id.into(),
            target_path: target_path.into(),
        }
    }
}
