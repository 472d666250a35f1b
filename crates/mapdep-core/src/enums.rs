/// Kind tags for vertices and edges of the dependency graph.
///
/// Every vertex and edge in the store carries exactly one of these tags.
/// The tags drive projection (the ETL projection keeps only
/// [`EdgeKind::EntitySource`] / [`EdgeKind::EntityTarget`] edges) and
/// classification in derived reports.
use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of a vertex in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexKind {
    /// A RETW extraction file that was ingested.
    FileRetw,
    /// A table-like data container used as mapping source or target.
    Entity,
    /// A transformation producing one target entity from source entities.
    Mapping,
    /// Reserved for consumers that inject error markers into derived
    /// views; the core never creates a vertex of this kind.
    Error,
}

impl VertexKind {
    /// Returns the canonical lowercase tag string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileRetw => "file_retw",
            Self::Entity => "entity",
            Self::Mapping => "mapping",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of a directed edge in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// File → entity: the file's document model defines the entity.
    FileEntity,
    /// File → mapping: the file declares the mapping.
    FileMapping,
    /// Entity → mapping: the entity is an input of the mapping.
    EntitySource,
    /// Mapping → entity: the entity is the output of the mapping.
    EntityTarget,
}

impl EdgeKind {
    /// Returns the canonical lowercase tag string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileEntity => "file_entity",
            Self::FileMapping => "file_mapping",
            Self::EntitySource => "entity_source",
            Self::EntityTarget => "entity_target",
        }
    }

    /// Returns `true` for the two edge kinds that carry data flow
    /// (source/target edges), i.e. the edges retained by the ETL
    /// projection.
    pub fn is_etl(&self) -> bool {
        matches!(self, Self::EntitySource | Self::EntityTarget)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
