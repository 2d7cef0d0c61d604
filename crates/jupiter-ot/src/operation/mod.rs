//! The operation model: immutable value types for atomic text edits, with
//! pairwise inclusion transformation and sequential composition.
//!
//! # Operation variants
//!
//! - `Insert { position, text }` — insert `text` at character offset `position`
//! - `Delete { position, text }` — delete `text` starting at `position`; the
//!   deleted text is carried so concurrent overlapping deletes can be clamped
//!   and so application can detect replica divergence
//! - `NoOperation` — the identity edit, produced when a transform cancels an
//!   operation entirely
//! - `Split(parts)` — an ordered sequence of operations; each part's position
//!   is relative to the document state after the previous parts applied
//!
//! All positions are character offsets, not byte offsets, relative to the
//! document state immediately preceding application. Transforms produce new
//! operations; nothing is mutated in place.

use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Insert { position: usize, text: String },
    Delete { position: usize, text: String },
    NoOperation,
    Split(Vec<Operation>),
}

impl Operation {
    pub fn insert(position: usize, text: impl Into<String>) -> Self {
        Operation::Insert {
            position,
            text: text.into(),
        }
    }

    pub fn delete(position: usize, text: impl Into<String>) -> Self {
        Operation::Delete {
            position,
            text: text.into(),
        }
    }

    /// Returns `true` if applying this operation leaves any document unchanged.
    pub fn is_noop(&self) -> bool {
        match self {
            Operation::NoOperation => true,
            Operation::Insert { text, .. } | Operation::Delete { text, .. } => text.is_empty(),
            Operation::Split(parts) => parts.iter().all(Operation::is_noop),
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Characters `[start, end)` of `s`, by char offset.
fn char_slice(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end - start).collect()
}

/// Drop no-op parts and unwrap trivial splits so transforms return the
/// simplest faithful representation.
pub fn normalize(op: Operation) -> Operation {
    match op {
        Operation::Split(parts) => {
            let mut flat = Vec::with_capacity(parts.len());
            for part in parts {
                match normalize(part) {
                    Operation::NoOperation => {}
                    Operation::Split(inner) => flat.extend(inner),
                    other => flat.push(other),
                }
            }
            match flat.len() {
                0 => Operation::NoOperation,
                1 => flat.remove(0),
                _ => Operation::Split(flat),
            }
        }
        Operation::Insert { ref text, .. } | Operation::Delete { ref text, .. }
            if text.is_empty() =>
        {
            Operation::NoOperation
        }
        other => other,
    }
}

// ── Inclusion transformation ────────────────────────────────────────────────

/// Re-bases `op` so it applies correctly after `against` has already been
/// applied to the same document state both were generated against.
///
/// `left_wins` resolves the one genuinely ambiguous case, two concurrent
/// inserts at the same position: when `true`, `op` is ordered first and keeps
/// its position; when `false`, it shifts right past the other insert. The
/// caller must use opposite flags for the two directions of a concurrent pair
/// or the replicas diverge.
pub fn transform(op: &Operation, against: &Operation, left_wins: bool) -> Operation {
    let out = match (op, against) {
        (Operation::NoOperation, _) => Operation::NoOperation,
        (_, Operation::NoOperation) => op.clone(),

        // A split re-bases part by part; every part after the first must see
        // `against` re-based over the parts already emitted.
        (Operation::Split(parts), _) => {
            let mut rebased = Vec::with_capacity(parts.len());
            let mut base = against.clone();
            for part in parts {
                rebased.push(transform(part, &base, left_wins));
                base = transform(&base, part, !left_wins);
            }
            Operation::Split(rebased)
        }

        // Re-basing over a split folds through its parts in order; each part's
        // position already accounts for the previous ones.
        (_, Operation::Split(parts)) => {
            let mut out = op.clone();
            for part in parts {
                out = transform(&out, part, left_wins);
            }
            out
        }

        (
            Operation::Insert { position: pa, text: ta },
            Operation::Insert { position: pb, text: tb },
        ) => {
            if *pa < *pb || (*pa == *pb && left_wins) {
                op.clone()
            } else {
                Operation::insert(pa + char_len(tb), ta.clone())
            }
        }

        (
            Operation::Insert { position: pa, text: ta },
            Operation::Delete { position: pb, text: tb },
        ) => {
            let lb = char_len(tb);
            if *pa <= *pb {
                op.clone()
            } else if *pa >= pb + lb {
                Operation::insert(pa - lb, ta.clone())
            } else {
                // The insertion point vanished with the deleted range; clamp
                // to the deletion start rather than resolve to an invalid
                // offset.
                Operation::insert(*pb, ta.clone())
            }
        }

        (
            Operation::Delete { position: pa, text: ta },
            Operation::Insert { position: pb, text: tb },
        ) => {
            let la = char_len(ta);
            let lb = char_len(tb);
            if *pb >= pa + la {
                op.clone()
            } else if *pb <= *pa {
                Operation::delete(pa + lb, ta.clone())
            } else {
                // The insert landed inside the range being deleted: the range
                // is now two pieces around foreign text that must survive.
                // A single delete cannot express that, so split.
                let first = pb - pa;
                Operation::Split(vec![
                    Operation::delete(*pa, char_slice(ta, 0, first)),
                    Operation::delete(pa + lb, char_slice(ta, first, la)),
                ])
            }
        }

        (
            Operation::Delete { position: pa, text: ta },
            Operation::Delete { position: pb, text: tb },
        ) => {
            let la = char_len(ta);
            let lb = char_len(tb);
            if *pb >= pa + la {
                op.clone()
            } else if *pa >= pb + lb {
                Operation::delete(pa - lb, ta.clone())
            } else if *pb <= *pa && pa + la <= pb + lb {
                // Fully covered by the concurrent delete; deleting again
                // would double-delete.
                Operation::NoOperation
            } else if *pb <= *pa {
                // Concurrent delete removed our prefix; keep the suffix,
                // which now starts where the other delete started.
                Operation::delete(*pb, char_slice(ta, pb + lb - pa, la))
            } else if pb + lb < pa + la {
                // Concurrent delete carved out our middle; the two leftover
                // pieces are adjacent once it has applied.
                let mut text = char_slice(ta, 0, pb - pa);
                text.push_str(&char_slice(ta, pb + lb - pa, la));
                Operation::delete(*pa, text)
            } else {
                // Concurrent delete removed our suffix; keep the prefix.
                Operation::delete(*pa, char_slice(ta, 0, pb - pa))
            }
        }
    };
    normalize(out)
}

// ── Sequential composition ──────────────────────────────────────────────────

/// Merges two sequentially applied operations (`op1` first, then `op2`) into
/// one equivalent operation.
///
/// Needed when several buffered operations must be replayed against one
/// incoming operation. Adjacent edits coalesce into a single insert/delete;
/// anything that cannot be expressed as one component composes as a
/// normalized [`Operation::Split`].
pub fn compose(op1: &Operation, op2: &Operation) -> Operation {
    let out = match (op1, op2) {
        (Operation::NoOperation, _) => op2.clone(),
        (_, Operation::NoOperation) => op1.clone(),

        (
            Operation::Insert { position: p1, text: t1 },
            Operation::Insert { position: p2, text: t2 },
        ) if *p2 >= *p1 && *p2 <= p1 + char_len(t1) => {
            let at = p2 - p1;
            let mut text = char_slice(t1, 0, at);
            text.push_str(t2);
            text.push_str(&char_slice(t1, at, char_len(t1)));
            Operation::insert(*p1, text)
        }

        (
            Operation::Delete { position: p1, text: t1 },
            Operation::Delete { position: p2, text: t2 },
        ) if *p2 == *p1 => {
            // The second delete consumed the text that followed the first.
            let mut text = t1.clone();
            text.push_str(t2);
            Operation::delete(*p1, text)
        }

        (
            Operation::Delete { position: p1, text: t1 },
            Operation::Delete { position: p2, text: t2 },
        ) if p2 + char_len(t2) == *p1 => {
            let mut text = t2.clone();
            text.push_str(t1);
            Operation::delete(*p2, text)
        }

        _ => Operation::Split(vec![op1.clone(), op2.clone()]),
    };
    normalize(out)
}

// ── Application ─────────────────────────────────────────────────────────────

/// Applies `op` to a document replica, returning the new document text.
///
/// Out-of-range positions and delete-text mismatches mean the operation was
/// transformed for a different replica state than the one given; that is a
/// divergence already in progress and is reported, never silently patched.
pub fn apply(document: &str, op: &Operation) -> Result<String, SyncError> {
    match op {
        Operation::NoOperation => Ok(document.to_string()),
        Operation::Insert { position, text } => {
            let len = char_len(document);
            if *position > len {
                return Err(SyncError::Transformation(format!(
                    "insert at {position} exceeds document length {len}"
                )));
            }
            let mut out = char_slice(document, 0, *position);
            out.push_str(text);
            out.push_str(&char_slice(document, *position, len));
            Ok(out)
        }
        Operation::Delete { position, text } => {
            let len = char_len(document);
            let span = char_len(text);
            if position + span > len {
                return Err(SyncError::Transformation(format!(
                    "delete of {span} chars at {position} exceeds document length {len}"
                )));
            }
            let present = char_slice(document, *position, position + span);
            if present != *text {
                return Err(SyncError::Transformation(format!(
                    "delete mismatch at {position}: expected {text:?}, document has {present:?}"
                )));
            }
            let mut out = char_slice(document, 0, *position);
            out.push_str(&char_slice(document, position + span, len));
            Ok(out)
        }
        Operation::Split(parts) => {
            let mut out = document.to_string();
            for part in parts {
                out = apply(&out, part)?;
            }
            Ok(out)
        }
    }
}
