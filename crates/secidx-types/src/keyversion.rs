use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::ids::DefnId;

/// The effect a mutation has on one index's projection of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Upsert,
    Deletion,
    UpsertDeletion,
    Sync,
    DropData,
    StreamBegin,
    StreamEnd,
    Snapshot,
}

/// One `(index, command, key)` tuple carried by a [`KeyVersion`].
///
/// Several projections of the same document mutation share a docid, one
/// per index that has an expression over the mutated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub defn_id: DefnId,
    pub command: Command,
    pub new_key: Option<Bytes>,
    pub old_key: Option<Bytes>,
}

/// One mutation event read from the change stream, carrying one or more
/// per-index projections for the same document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyVersion {
    pub seqno: u64,
    pub docid: Bytes,
    pub projections: Vec<Projection>,
}

impl KeyVersion {
    pub fn new(seqno: u64, docid: Bytes, projections: Vec<Projection>) -> Self {
        Self {
            seqno,
            docid,
            projections,
        }
    }

    /// A control-only key version carrying no per-index projections
    /// (`Sync`, `StreamBegin`, `StreamEnd`, `Snapshot`).
    pub fn control(seqno: u64, command: Command) -> Self {
        Self {
            seqno,
            docid: Bytes::new(),
            projections: vec![Projection {
                defn_id: DefnId::new(0),
                command,
                new_key: None,
                old_key: None,
            }],
        }
    }
}
