/// Stable identity derivation for graph vertices.
///
/// Vertex identities must survive process restarts: diagnostic output and
/// run-plan artifacts reference them across runs, so a per-process
/// randomized hash is unusable here. Identities are derived as a SHA-256
/// digest of the vertex's natural key, truncated to the first 16 bytes and
/// interpreted as a big-endian `u128`.
///
/// # Natural keys
///
/// - **File** — the file path string. Re-ingesting the same path yields
///   the same identity.
/// - **Entity** — `codeModel ‖ code`. An entity referenced from several
///   RETW files collapses into a single vertex, which is what makes
///   cross-file dependencies observable.
/// - **Mapping** — the owning file's identity (hex form) ‖ the mapping
///   code. Mappings are file-local, so equal mapping codes in different
///   files do not collide.
use std::fmt;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// A stable 128-bit vertex identity.
///
/// Ordered, hashable, and rendered as 32 lowercase hex characters in both
/// `Display` and serialized form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u128);

impl NodeId {
    /// Returns the raw 128-bit value.
    pub fn as_u128(&self) -> u128 {
        self.0
    }

    /// Parses a 32-character lowercase hex string back into an id.
    ///
    /// Returns `None` if the string is not valid hex or does not fit in
    /// 128 bits.
    pub fn from_hex(s: &str) -> Option<Self> {
        u128::from_str_radix(s, 16).ok().map(NodeId)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({:032x})", self.0)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        NodeId::from_hex(&s).ok_or_else(|| D::Error::custom(format!("invalid node id: {s:?}")))
    }
}

/// Natural key of an entity: model code plus entity code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRef<'a> {
    /// The `Code` of the model the entity belongs to.
    pub code_model: &'a str,
    /// The `Code` of the entity itself.
    pub code: &'a str,
}

/// Natural key of a mapping: owning RETW file path plus mapping code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingRef<'a> {
    /// Path of the RETW file that declared the mapping.
    pub file_path: &'a str,
    /// The `Code` of the mapping.
    pub code: &'a str,
}

/// Digests an arbitrary key string into a [`NodeId`].
///
/// SHA-256, truncated to the leading 16 bytes, big-endian. Deterministic
/// across runs, platforms, and Rust versions.
pub fn stable_hash(key: &str) -> NodeId {
    let digest = Sha256::digest(key.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    NodeId(u128::from_be_bytes(bytes))
}

/// Identity of a RETW file vertex.
pub fn file_id(path: &str) -> NodeId {
    stable_hash(path)
}

/// Identity of an entity vertex.
pub fn entity_id(entity: EntityRef<'_>) -> NodeId {
    stable_hash(&format!("{}{}", entity.code_model, entity.code))
}

/// Identity of a mapping vertex.
///
/// The file identity is folded in through its hex rendering, so the key
/// is reproducible from the serialized form of the file id alone.
pub fn mapping_id(mapping: MappingRef<'_>) -> NodeId {
    stable_hash(&format!("{}{}", file_id(mapping.file_path), mapping.code))
}
