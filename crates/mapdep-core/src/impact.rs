/// Failure-impact analysis over the ETL projection.
///
/// Given a set of nodes declared failed (by their file-local object
/// id), the analyzer computes the forward-reachable closure on the
/// data-flow DAG and partitions it per vertex kind into `Failed` (named
/// in the input) and `Affected` (transitively downstream). "Affected"
/// reads as: cannot be trusted to be up to date after the failure.
///
/// Unknown ids raise a [`DiagnosticCode::UnknownFailedNode`] warning
/// each and contribute nothing; the analysis itself never aborts.
use std::collections::HashSet;

use petgraph::stable_graph::NodeIndex;
use serde::Serialize;

use crate::diag::{Component, Diagnostic, DiagnosticCode, DiagnosticSink};
use crate::etl::EtlDag;
use crate::graph::Direction;
use crate::identity::NodeId;
use crate::structures::Vertex;

/// One mapping in the fallout report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MappingFallout {
    /// Stable mapping identity.
    pub mapping_id: NodeId,
    /// File-local object id.
    pub id: String,
    pub name: String,
    pub code: String,
    /// Derived run level, for schedulers replanning around the failure.
    pub run_level: i64,
    pub run_level_stage: i64,
}

/// One entity in the fallout report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntityFallout {
    /// Stable entity identity.
    pub entity_id: NodeId,
    /// File-local object id.
    pub id: String,
    pub name: String,
    pub code: String,
    pub code_model: String,
}

/// Failed/affected split for one vertex kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FalloutGroup<T> {
    /// Vertices named in the failed input set.
    #[serde(rename = "Failed")]
    pub failed: Vec<T>,
    /// Vertices downstream of a failure, not themselves named.
    #[serde(rename = "Affected")]
    pub affected: Vec<T>,
}

impl<T> Default for FalloutGroup<T> {
    fn default() -> Self {
        Self {
            failed: Vec::new(),
            affected: Vec::new(),
        }
    }
}

/// The full fallout report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImpactReport {
    #[serde(rename = "Mappings")]
    pub mappings: FalloutGroup<MappingFallout>,
    #[serde(rename = "Entities")]
    pub entities: FalloutGroup<EntityFallout>,
}

/// Computes the fallout of the given failed nodes on the data-flow DAG.
///
/// `failed_object_ids` name mappings or entities by their file-local
/// object id (e.g. `"o71"`). Ids not present in the projection are
/// reported to `sink` and skipped.
pub fn simulate_failure(
    dag: &EtlDag,
    failed_object_ids: &[String],
    sink: &mut DiagnosticSink,
) -> ImpactReport {
    let view = dag.view();

    let mut failed: HashSet<NodeIndex> = HashSet::with_capacity(failed_object_ids.len());
    for object_id in failed_object_ids {
        match dag.find_object(object_id) {
            Some(idx) => {
                failed.insert(idx);
            }
            None => {
                sink.push(Diagnostic::warning(
                    Component::Impact,
                    DiagnosticCode::UnknownFailedNode,
                    format!("failed node id '{object_id}' not present in the ETL flow"),
                ));
            }
        }
    }

    let mut affected: HashSet<NodeIndex> = HashSet::new();
    for &node in &failed {
        affected.extend(view.descendants(node, Direction::Out));
    }

    let mut report = ImpactReport::default();
    // Deterministic report order: by file-local object id.
    let mut ordered: Vec<NodeIndex> = affected.into_iter().collect();
    ordered.sort_by(|&a, &b| object_id_of(view.vertex(a)).cmp(&object_id_of(view.vertex(b))));

    for idx in ordered {
        match view.vertex(idx) {
            Some(Vertex::Mapping(mapping)) => {
                let record = MappingFallout {
                    mapping_id: mapping.id,
                    id: mapping.object_id.clone(),
                    name: mapping.name.clone(),
                    code: mapping.code.clone(),
                    run_level: dag.run_level(mapping.id).unwrap_or(0),
                    run_level_stage: dag.run_level_stage(mapping.id).unwrap_or(0),
                };
                if failed.contains(&idx) {
                    report.mappings.failed.push(record);
                } else {
                    report.mappings.affected.push(record);
                }
            }
            Some(Vertex::Entity(entity)) => {
                let record = EntityFallout {
                    entity_id: entity.id,
                    id: entity.object_id.clone(),
                    name: entity.name.clone(),
                    code: entity.code.clone(),
                    code_model: entity.code_model.clone(),
                };
                if failed.contains(&idx) {
                    report.entities.failed.push(record);
                } else {
                    report.entities.affected.push(record);
                }
            }
            Some(Vertex::File(_)) | None => {}
        }
    }

    report
}

fn object_id_of(vertex: Option<&Vertex>) -> Option<&str> {
    match vertex {
        Some(Vertex::Mapping(m)) => Some(m.object_id.as_str()),
        Some(Vertex::Entity(e)) => Some(e.object_id.as_str()),
        Some(Vertex::File(_)) | None => None,
    }
}
