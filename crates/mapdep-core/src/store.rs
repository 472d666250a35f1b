/// The in-memory graph store: typed vertex maps plus a deduplicated
/// edge list.
///
/// The store is the single mutable owner of everything the ingestor
/// produces. It holds no derived state — run levels, stages, and
/// subgraphs are computed on demand from projections (see
/// [`crate::graph::DepGraph`] and [`crate::etl::EtlDag`]) so they can
/// never go stale after a structural change.
///
/// # Upsert semantics
///
/// - Files are keyed by path hash; re-ingesting a path replaces the
///   timestamps but keeps the identity and the first-seen
///   `order_added`.
/// - Entities are keyed by `code_model ‖ code`. A record coming from a
///   document model ("defined") wins over one synthesized from a bare
///   source/target reference; the first defined record is never
///   overwritten.
/// - Mappings are keyed by file id ‖ mapping code; re-insertion
///   replaces the record.
/// - Edges are a set over `(source, target, kind)`; duplicate
///   insertions are dropped.
use std::collections::{BTreeMap, HashSet};

use crate::enums::EdgeKind;
use crate::identity::{EntityRef, NodeId, entity_id};
use crate::structures::{EdgeRecord, EntityVertex, FileVertex, MappingVertex};

/// The mutable graph store populated by the ingestor.
#[derive(Debug, Default)]
pub struct GraphStore {
    files: BTreeMap<NodeId, FileVertex>,
    entities: BTreeMap<NodeId, EntityVertex>,
    mappings: BTreeMap<NodeId, MappingVertex>,
    edges: Vec<EdgeRecord>,
    edge_keys: HashSet<(NodeId, NodeId, EdgeKind)>,
}

impl GraphStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of file vertices.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Number of entity vertices.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of mapping vertices.
    pub fn mapping_count(&self) -> usize {
        self.mappings.len()
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Inserts or refreshes a file vertex.
    ///
    /// A new path gets `order_added` equal to the current file count; a
    /// known path keeps its original position and identity while the
    /// timestamps are replaced.
    pub fn upsert_file(&mut self, vertex: FileVertex) -> NodeId {
        let id = vertex.id;
        match self.files.get_mut(&id) {
            Some(existing) => {
                existing.path = vertex.path;
                existing.created_at = vertex.created_at;
                existing.modified_at = vertex.modified_at;
            }
            None => {
                self.files.insert(id, vertex);
            }
        }
        id
    }

    /// Inserts an entity record coming from a document model.
    ///
    /// Replaces a bare-reference record; an already defined record is
    /// kept untouched (first definition wins).
    pub fn upsert_entity_defined(&mut self, vertex: EntityVertex) -> NodeId {
        let id = vertex.id;
        match self.entities.get(&id) {
            Some(existing) if existing.is_model_defined() => {}
            Some(_) | None => {
                self.entities.insert(id, vertex);
            }
        }
        id
    }

    /// Inserts an entity record synthesized from a source/target
    /// reference. Only fills a gap; never overwrites an existing record.
    pub fn upsert_entity_reference(&mut self, vertex: EntityVertex) -> NodeId {
        let id = vertex.id;
        self.entities.entry(id).or_insert(vertex);
        id
    }

    /// Inserts or replaces a mapping vertex.
    pub fn upsert_mapping(&mut self, vertex: MappingVertex) -> NodeId {
        let id = vertex.id;
        self.mappings.insert(id, vertex);
        id
    }

    /// Appends an edge unless an edge with the same
    /// `(source, target, kind)` already exists.
    ///
    /// Returns `true` if the edge was added.
    pub fn add_edge(&mut self, edge: EdgeRecord) -> bool {
        if self.edge_keys.insert(edge.key()) {
            self.edges.push(edge);
            true
        } else {
            false
        }
    }

    /// Looks up a file vertex by identity.
    pub fn file(&self, id: NodeId) -> Option<&FileVertex> {
        self.files.get(&id)
    }

    /// Looks up an entity vertex by identity.
    pub fn entity(&self, id: NodeId) -> Option<&EntityVertex> {
        self.entities.get(&id)
    }

    /// Looks up an entity vertex by its natural key.
    pub fn entity_by_ref(&self, entity: EntityRef<'_>) -> Option<&EntityVertex> {
        self.entities.get(&entity_id(entity))
    }

    /// Looks up a mapping vertex by identity.
    pub fn mapping(&self, id: NodeId) -> Option<&MappingVertex> {
        self.mappings.get(&id)
    }

    /// Looks up a file vertex by its ingestion path.
    pub fn file_by_path(&self, path: &str) -> Option<&FileVertex> {
        self.files.values().find(|f| f.path == path)
    }

    /// All file vertices, ordered by identity.
    pub fn files(&self) -> impl Iterator<Item = &FileVertex> {
        self.files.values()
    }

    /// All entity vertices, ordered by identity.
    pub fn entities(&self) -> impl Iterator<Item = &EntityVertex> {
        self.entities.values()
    }

    /// All mapping vertices, ordered by identity.
    pub fn mappings(&self) -> impl Iterator<Item = &MappingVertex> {
        self.mappings.values()
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }
}
