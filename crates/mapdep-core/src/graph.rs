/// Petgraph projection of the store, plus the subgraph query surface.
///
/// The store itself is plain maps; every traversal happens on a
/// [`DepGraph`]: a `StableDiGraph` view built on demand. Views are
/// private copies — deleting vertices from a view never touches the
/// store, so callers can carve subgraphs freely.
///
/// # Queries
///
/// - [`DepGraph::descendants`] — reachable set in one direction,
///   inclusive of the start vertex.
/// - [`DepGraph::neighborhood`] — bounded `k`-hop variant.
/// - [`DepGraph::predecessors`] / [`DepGraph::successors`] — one hop.
/// - [`DepGraph::induced_subgraph`] — copy restricted to a vertex set,
///   keeping edges with both endpoints inside.
/// - [`DepGraph::file_subgraph`] / [`DepGraph::entity_subgraph`] — the
///   two canned dependency views consumers render.
use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use crate::enums::{EdgeKind, VertexKind};
use crate::identity::NodeId;
use crate::store::GraphStore;
use crate::structures::Vertex;

/// Which edges a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Follow outgoing edges — downstream.
    Out,
    /// Follow incoming edges — upstream.
    In,
}

impl Direction {
    fn petgraph(self) -> petgraph::Direction {
        match self {
            Self::Out => petgraph::Direction::Outgoing,
            Self::In => petgraph::Direction::Incoming,
        }
    }
}

/// Errors raised by subgraph queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// No vertex matches the requested identity or attribute value.
    ///
    /// The contained string names what was looked up.
    NodeNotFound(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::NodeNotFound(what) => write!(f, "node not found: {what}"),
        }
    }
}

impl std::error::Error for QueryError {}

/// A directed multigraph view over the store.
#[derive(Debug, Clone)]
pub struct DepGraph {
    graph: StableDiGraph<Vertex, EdgeKind>,
    id_to_index: HashMap<NodeId, NodeIndex>,
}

impl DepGraph {
    /// Builds the full projection: every vertex and every edge of the
    /// store.
    pub fn from_store(store: &GraphStore) -> Self {
        Self::project(store, |_| true)
    }

    /// Builds a projection keeping only edges accepted by `keep_edge`.
    /// Vertices are always all copied; prune afterwards if needed.
    pub(crate) fn project(store: &GraphStore, keep_edge: impl Fn(EdgeKind) -> bool) -> Self {
        let vertex_count = store.file_count() + store.entity_count() + store.mapping_count();
        let mut graph = StableDiGraph::with_capacity(vertex_count, store.edge_count());
        let mut id_to_index = HashMap::with_capacity(vertex_count);

        for file in store.files() {
            let idx = graph.add_node(Vertex::File(file.clone()));
            id_to_index.insert(file.id, idx);
        }
        for entity in store.entities() {
            let idx = graph.add_node(Vertex::Entity(entity.clone()));
            id_to_index.insert(entity.id, idx);
        }
        for mapping in store.mappings() {
            let idx = graph.add_node(Vertex::Mapping(mapping.clone()));
            id_to_index.insert(mapping.id, idx);
        }

        for edge in store.edges() {
            if !keep_edge(edge.kind) {
                continue;
            }
            if let (Some(&source), Some(&target)) = (
                id_to_index.get(&edge.source),
                id_to_index.get(&edge.target),
            ) {
                graph.add_edge(source, target, edge.kind);
            }
        }

        Self { graph, id_to_index }
    }

    /// Number of vertices in the view.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges in the view.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Resolves a stable identity to this view's petgraph index.
    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_to_index.get(&id).copied()
    }

    /// The vertex record at `idx`, if present.
    pub fn vertex(&self, idx: NodeIndex) -> Option<&Vertex> {
        self.graph.node_weight(idx)
    }

    /// The underlying petgraph structure, for custom traversals.
    pub fn graph(&self) -> &StableDiGraph<Vertex, EdgeKind> {
        &self.graph
    }

    /// All vertex indices of the given kind, in identity order.
    pub fn select_kind(&self, kind: VertexKind) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| self.graph[idx].kind() == kind)
            .collect();
        nodes.sort_by_key(|&idx| self.graph[idx].id());
        nodes
    }

    /// Direct predecessors of `idx`.
    pub fn predecessors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .collect()
    }

    /// Direct successors of `idx`.
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect()
    }

    /// The set of vertices reachable from `start` following edges in
    /// `direction`, inclusive of `start` itself.
    pub fn descendants(&self, start: NodeIndex, direction: Direction) -> HashSet<NodeIndex> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            for neighbour in self.graph.neighbors_directed(current, direction.petgraph()) {
                if visited.insert(neighbour) {
                    queue.push_back(neighbour);
                }
            }
        }
        visited
    }

    /// The set of vertices within `order` hops of `start` in the given
    /// direction, inclusive of `start`.
    pub fn neighborhood(
        &self,
        start: NodeIndex,
        direction: Direction,
        order: usize,
    ) -> HashSet<NodeIndex> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::new();
        visited.insert(start);
        queue.push_back((start, 0));
        while let Some((current, hops)) = queue.pop_front() {
            if hops >= order {
                continue;
            }
            for neighbour in self.graph.neighbors_directed(current, direction.petgraph()) {
                if visited.insert(neighbour) {
                    queue.push_back((neighbour, hops + 1));
                }
            }
        }
        visited
    }

    /// Copies the subgraph induced by `keep`: the given vertices plus
    /// every edge whose endpoints are both in the set.
    pub fn induced_subgraph(&self, keep: &HashSet<NodeIndex>) -> DepGraph {
        let mut graph = StableDiGraph::with_capacity(keep.len(), keep.len());
        let mut id_to_index = HashMap::with_capacity(keep.len());
        let mut old_to_new: HashMap<NodeIndex, NodeIndex> = HashMap::with_capacity(keep.len());

        // Deterministic construction order: by stable identity.
        let mut ordered: Vec<NodeIndex> = keep.iter().copied().collect();
        ordered.sort_by_key(|&idx| self.graph.node_weight(idx).map(Vertex::id));

        for old_idx in ordered {
            if let Some(weight) = self.graph.node_weight(old_idx) {
                let new_idx = graph.add_node(weight.clone());
                id_to_index.insert(weight.id(), new_idx);
                old_to_new.insert(old_idx, new_idx);
            }
        }
        for edge in self.graph.edge_references() {
            if let (Some(&source), Some(&target)) =
                (old_to_new.get(&edge.source()), old_to_new.get(&edge.target()))
            {
                graph.add_edge(source, target, *edge.weight());
            }
        }

        DepGraph { graph, id_to_index }
    }

    /// Removes the given vertices (and their incident edges) from this
    /// view. Only meaningful on views; the store is unaffected.
    pub fn delete_vertices(&mut self, remove: &HashSet<NodeIndex>) {
        for &idx in remove {
            if let Some(weight) = self.graph.remove_node(idx) {
                self.id_to_index.remove(&weight.id());
            }
        }
    }

    /// The subgraph of everything a single RETW file contributes: the
    /// file vertex and its forward-reachable set.
    ///
    /// # Errors
    ///
    /// [`QueryError::NodeNotFound`] when no file with that path was
    /// ingested.
    pub fn file_subgraph(&self, path: &str) -> Result<DepGraph, QueryError> {
        let file_idx = self
            .graph
            .node_indices()
            .find(|&idx| {
                self.graph[idx]
                    .as_file()
                    .is_some_and(|f| f.path == path)
            })
            .ok_or_else(|| QueryError::NodeNotFound(format!("RETW file '{path}'")))?;
        let reach = self.descendants(file_idx, Direction::Out);
        Ok(self.induced_subgraph(&reach))
    }

    /// The subgraph of one entity's journey: everything upstream of it
    /// plus everything downstream of it.
    ///
    /// # Errors
    ///
    /// [`QueryError::NodeNotFound`] when no entity with that
    /// `(code_model, code)` pair exists.
    pub fn entity_subgraph(&self, code_model: &str, code: &str) -> Result<DepGraph, QueryError> {
        let entity_idx = self
            .graph
            .node_indices()
            .find(|&idx| {
                self.graph[idx]
                    .as_entity()
                    .is_some_and(|e| e.code_model == code_model && e.code == code)
            })
            .ok_or_else(|| {
                QueryError::NodeNotFound(format!("entity '{code}' in model '{code_model}'"))
            })?;
        let mut reach = self.descendants(entity_idx, Direction::In);
        reach.extend(self.descendants(entity_idx, Direction::Out));
        Ok(self.induced_subgraph(&reach))
    }
}
