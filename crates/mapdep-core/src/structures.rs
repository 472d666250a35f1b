/// Typed vertex and edge records held by the graph store.
///
/// The store keeps one discriminated record per vertex kind instead of a
/// free-form attribute map; visualization extras that some consumers
/// want (shapes, colors, tooltips) are theirs to derive and do not live
/// here.
use serde::Serialize;

use crate::enums::{EdgeKind, VertexKind};
use crate::identity::NodeId;

/// Creation/modification audit trail carried by entities, mappings, and
/// the edges that declared them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Audit {
    pub creation_date: Option<String>,
    pub creator: Option<String>,
    pub modification_date: Option<String>,
    pub modifier: Option<String>,
}

impl Audit {
    /// Returns `true` when no audit field is set.
    pub fn is_empty(&self) -> bool {
        self.creation_date.is_none()
            && self.creator.is_none()
            && self.modification_date.is_none()
            && self.modifier.is_none()
    }
}

/// A RETW file vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileVertex {
    /// Stable identity (hash of `path`).
    #[serde(rename = "FileId")]
    pub id: NodeId,
    /// The path the file was ingested from.
    #[serde(rename = "Path")]
    pub path: String,
    /// Zero-based position in first-seen ingestion order; stable across
    /// re-ingestion of the same path.
    #[serde(rename = "Order")]
    pub order_added: usize,
    /// Filesystem creation timestamp, `%Y-%m-%d %H:%M:%S`, when known.
    #[serde(rename = "CreationDate")]
    pub created_at: Option<String>,
    /// Filesystem modification timestamp, `%Y-%m-%d %H:%M:%S`, when known.
    #[serde(rename = "ModificationDate")]
    pub modified_at: Option<String>,
}

/// An entity vertex.
///
/// An entity first seen as a bare source/target reference carries only
/// the reference fields; once its defining document model is ingested
/// the record is upgraded with the model-level fields. The upgraded form
/// is never downgraded again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityVertex {
    /// Stable identity (hash of `code_model ‖ code`).
    pub id: NodeId,
    /// File-local object id from the extract (e.g. `"o71"`), the handle
    /// used by the failure simulator.
    pub object_id: String,
    /// Human-readable name.
    pub name: String,
    /// Entity code.
    pub code: String,
    /// Code of the owning model.
    pub code_model: String,
    /// Object id of the owning model; only known once the defining
    /// document model was ingested.
    pub id_model: Option<String>,
    /// Name of the owning model; only known once the defining document
    /// model was ingested.
    pub name_model: Option<String>,
    /// Audit trail; populated from the document model definition.
    pub audit: Audit,
}

impl EntityVertex {
    /// Returns `true` when the record came from a document model (as
    /// opposed to a bare source/target reference).
    pub fn is_model_defined(&self) -> bool {
        self.id_model.is_some()
    }
}

/// A mapping vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingVertex {
    /// Stable identity (hash of file id ‖ mapping code).
    pub id: NodeId,
    /// File-local object id from the extract (e.g. `"o127"`).
    pub object_id: String,
    /// Human-readable name.
    pub name: String,
    /// Mapping code.
    pub code: String,
    /// Declared data source, when present.
    pub data_source: Option<String>,
    /// Audit trail.
    pub audit: Audit,
}

/// Any vertex of the dependency graph; the weight type of derived
/// petgraph views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Vertex {
    File(FileVertex),
    Entity(EntityVertex),
    Mapping(MappingVertex),
}

impl Vertex {
    /// The vertex's stable identity.
    pub fn id(&self) -> NodeId {
        match self {
            Self::File(v) => v.id,
            Self::Entity(v) => v.id,
            Self::Mapping(v) => v.id,
        }
    }

    /// The vertex's kind tag.
    pub fn kind(&self) -> VertexKind {
        match self {
            Self::File(_) => VertexKind::FileRetw,
            Self::Entity(_) => VertexKind::Entity,
            Self::Mapping(_) => VertexKind::Mapping,
        }
    }

    /// The file record, if this is a file vertex.
    pub fn as_file(&self) -> Option<&FileVertex> {
        match self {
            Self::File(v) => Some(v),
            Self::Entity(_) | Self::Mapping(_) => None,
        }
    }

    /// The entity record, if this is an entity vertex.
    pub fn as_entity(&self) -> Option<&EntityVertex> {
        match self {
            Self::Entity(v) => Some(v),
            Self::File(_) | Self::Mapping(_) => None,
        }
    }

    /// The mapping record, if this is a mapping vertex.
    pub fn as_mapping(&self) -> Option<&MappingVertex> {
        match self {
            Self::Mapping(v) => Some(v),
            Self::File(_) | Self::Entity(_) => None,
        }
    }
}

/// A directed edge held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRecord {
    /// Source vertex identity.
    pub source: NodeId,
    /// Target vertex identity.
    pub target: NodeId,
    /// Edge kind tag.
    pub kind: EdgeKind,
    /// Audit of the declaring element, for file → entity and
    /// file → mapping edges; empty for data-flow edges.
    pub audit: Audit,
}

impl EdgeRecord {
    /// The deduplication key: edges are a set over this triple.
    pub fn key(&self) -> (NodeId, NodeId, EdgeKind) {
        (self.source, self.target, self.kind)
    }
}
