/// ETL projection and run-plan derivation.
///
/// [`EtlDag`] is the data-flow view of the store: mappings and entities
/// connected only by source/target edges. Building it performs, in
/// order:
///
/// 1. projection (drop file vertices and declaration edges),
/// 2. pruning of isolated entities,
/// 3. the no-flow check ([`EtlError::NoFlow`]),
/// 4. cycle detection ([`EtlError::CyclicFlow`], hard failure — the
///    level computation below assumes a DAG and must never run on a
///    cyclic input),
/// 5. run-level assignment ([`levels`]),
/// 6. per-level stage coloring ([`stages`]).
///
/// The derived `run_level` / `run_level_stage` values live on this view
/// only; they are recomputed on every build and never written back to
/// the store, so a structural change can't leave stale derivations
/// behind.
mod cycles;
mod levels;
mod stages;

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::NodeIndex;
use serde::Serialize;
use tracing::info;

use crate::enums::{EdgeKind, VertexKind};
use crate::graph::DepGraph;
use crate::identity::NodeId;
use crate::store::GraphStore;
use crate::structures::{Audit, Vertex};

/// Errors that abort run-plan derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EtlError {
    /// After pruning isolated entities no mappings remain: there is no
    /// data flow to order.
    NoFlow,
    /// The data-flow projection contains one or more cycles. Each inner
    /// vector lists a cycle in traversal order, first vertex repeated
    /// at the end.
    CyclicFlow {
        /// The offending cycles, as stable vertex identities.
        cycles: Vec<Vec<NodeId>>,
    },
}

impl std::fmt::Display for EtlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EtlError::NoFlow => f.write_str("no mappings, so no ETL flow"),
            EtlError::CyclicFlow { cycles } => {
                write!(f, "ETL flow is cyclic ({} cycle(s)):", cycles.len())?;
                for cycle in cycles {
                    let rendered: Vec<String> = cycle.iter().map(ToString::to_string).collect();
                    write!(f, " [{}]", rendered.join(" -> "))?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for EtlError {}

/// One entry of the emitted run plan: a mapping plus its derived
/// ordering attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MappingRun {
    /// Stable mapping identity.
    pub mapping_id: NodeId,
    /// File-local object id from the extract.
    pub id: String,
    pub name: String,
    pub code: String,
    pub data_source: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
    /// Number of mappings that must complete before this one can start.
    pub run_level: i64,
    /// Conflict-free slot within the run level; equal stages share no
    /// source entity and may run in parallel.
    pub run_level_stage: i64,
}

/// The data-flow DAG with derived run ordering.
#[derive(Debug, Clone)]
pub struct EtlDag {
    view: DepGraph,
    run_level: HashMap<NodeId, i64>,
    run_level_stage: HashMap<NodeId, i64>,
}

impl EtlDag {
    /// Builds the ETL projection from the store and derives the run
    /// plan.
    ///
    /// # Errors
    ///
    /// - [`EtlError::NoFlow`] — no mappings in the projection.
    /// - [`EtlError::CyclicFlow`] — the projection is not a DAG.
    pub fn build(store: &GraphStore) -> Result<Self, EtlError> {
        let mut view = DepGraph::project(store, |kind: EdgeKind| kind.is_etl());

        // The projection holds mappings and entities only.
        let files: HashSet<NodeIndex> = view
            .select_kind(VertexKind::FileRetw)
            .into_iter()
            .collect();
        view.delete_vertices(&files);

        // Entities that neither feed nor receive a mapping carry no flow.
        let isolated: HashSet<NodeIndex> = view
            .graph()
            .node_indices()
            .filter(|&idx| {
                view.vertex(idx).map(Vertex::kind) == Some(VertexKind::Entity)
                    && view.graph().neighbors_undirected(idx).next().is_none()
            })
            .collect();
        view.delete_vertices(&isolated);

        if view.select_kind(VertexKind::Mapping).is_empty() {
            return Err(EtlError::NoFlow);
        }

        let cycles = cycles::detect_cycles(&view);
        if !cycles.is_empty() {
            return Err(EtlError::CyclicFlow { cycles });
        }

        let run_level = levels::assign_run_levels(&view);
        let run_level_stage = stages::assign_run_level_stages(&view, &run_level);
        info!(
            mappings = view.select_kind(VertexKind::Mapping).len(),
            "built ETL flow"
        );

        Ok(Self {
            view,
            run_level,
            run_level_stage,
        })
    }

    /// The underlying projection view.
    pub fn view(&self) -> &DepGraph {
        &self.view
    }

    /// Derived run level for a vertex: ≥ 0 for mappings, −1 for
    /// entities, `None` for identities outside the projection.
    pub fn run_level(&self, id: NodeId) -> Option<i64> {
        self.run_level.get(&id).copied()
    }

    /// Derived run-level stage for a mapping; `None` for entities and
    /// unknown identities.
    pub fn run_level_stage(&self, id: NodeId) -> Option<i64> {
        self.run_level_stage.get(&id).copied()
    }

    /// Resolves a file-local object id (e.g. `"o71"`) to the vertex
    /// carrying it. Mappings and entities share the namespace.
    pub fn find_object(&self, object_id: &str) -> Option<NodeIndex> {
        self.view.graph().node_indices().find(|&idx| {
            match self.view.vertex(idx) {
                Some(Vertex::Mapping(m)) => m.object_id == object_id,
                Some(Vertex::Entity(e)) => e.object_id == object_id,
                Some(Vertex::File(_)) | None => false,
            }
        })
    }

    /// Emits the run plan: every mapping with its `RunLevel` and
    /// `RunLevelStage`, sorted ascending by
    /// `(RunLevel, RunLevelStage, Id)`.
    pub fn mapping_order(&self) -> Vec<MappingRun> {
        let mut runs: Vec<MappingRun> = self
            .view
            .select_kind(VertexKind::Mapping)
            .into_iter()
            .filter_map(|idx| self.view.vertex(idx).and_then(Vertex::as_mapping))
            .map(|mapping| MappingRun {
                mapping_id: mapping.id,
                id: mapping.object_id.clone(),
                name: mapping.name.clone(),
                code: mapping.code.clone(),
                data_source: mapping.data_source.clone(),
                audit: mapping.audit.clone(),
                run_level: self.run_level.get(&mapping.id).copied().unwrap_or(0),
                run_level_stage: self.run_level_stage.get(&mapping.id).copied().unwrap_or(0),
            })
            .collect();
        runs.sort_by(|a, b| {
            (a.run_level, a.run_level_stage, &a.id).cmp(&(b.run_level, b.run_level_stage, &b.id))
        });
        runs
    }
}
