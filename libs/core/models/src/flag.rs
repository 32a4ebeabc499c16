// INICIO DEL ARCHIVO [libs/core/models/src/flag.rs]
/*!
 * =================================================================
 * APARATO: VERSIONED STORE ITEMS (V1.0)
 * CLASIFICACIÓN: DOMAIN ENTITIES (L2)
 * RESPONSABILIDAD: REGISTROS OPACOS Y VERSIONADOS DE FLAGS Y SEGMENTOS
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Which side of the data store a write targets. Drives both the SSE path
/// construction and which channels a write is broadcast on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Flags,
    Segments,
}

impl DataKind {
    pub fn path_segment(self) -> &'static str {
        match self {
            DataKind::Flags => "flags",
            DataKind::Segments => "segments",
        }
    }
}

/// An opaque versioned record, or a tombstone once deleted. `payload` is
/// left as an untyped `serde_json::Value` because the evaluation engine
/// that interprets it is out of scope here; the store only needs to compare
/// versions and forward bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionedItem {
    pub key: String,
    pub version: u64,
    pub payload: Option<Value>,
}

impl VersionedItem {
    pub fn is_tombstone(&self) -> bool {
        self.payload.is_none()
    }
}

pub type FlagItem = VersionedItem;
pub type SegmentItem = VersionedItem;

/// The shape returned by `GetAll` / consumed by `Init` — deterministic
/// ordering (BTreeMap, not HashMap) so replay payloads and property tests
/// are reproducible.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AllData {
    pub flags: BTreeMap<String, FlagItem>,
    pub segments: BTreeMap<String, SegmentItem>,
}

impl AllData {
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.segments.is_empty()
    }
}

// FIN DEL ARCHIVO [libs/core/models/src/flag.rs]
