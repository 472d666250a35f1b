/// Cross-file dependency view.
///
/// File A depends on file B when A declares a mapping whose source
/// composition references an entity defined by B. The shared entity is
/// what the dependency rides on, so every dependency edge records it:
/// consumers can render the view file-to-file or expand it to
/// file → entity → file.
///
/// Derivation walks the full graph: for each mapping owned by a file,
/// the 2-hop in-neighborhood (source entities, then their defining
/// files) is inspected and every defining file other than the owner
/// yields one edge definer → consumer.
use std::collections::BTreeSet;

use serde::Serialize;

use crate::enums::VertexKind;
use crate::graph::DepGraph;
use crate::identity::NodeId;
use crate::structures::{FileVertex, Vertex};

/// One file-to-file dependency, carried by a shared entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileDependency {
    /// The file whose document model defines the shared entity.
    pub definer: NodeId,
    /// The file whose mapping consumes the shared entity.
    pub consumer: NodeId,
    /// The entity the dependency rides on.
    pub entity: NodeId,
}

/// The file-dependency view: all files plus the dependencies between
/// them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileDependencies {
    /// Every ingested file, in identity order.
    pub files: Vec<FileVertex>,
    /// Deduplicated dependency edges, in `(definer, consumer, entity)`
    /// order.
    pub dependencies: Vec<FileDependency>,
}

impl FileDependencies {
    /// Returns `true` when `consumer` depends on `definer` through at
    /// least one entity.
    pub fn depends_on(&self, consumer: NodeId, definer: NodeId) -> bool {
        self.dependencies
            .iter()
            .any(|d| d.consumer == consumer && d.definer == definer)
    }
}

/// Derives the file-dependency view from the full graph.
pub fn file_dependencies(view: &DepGraph) -> FileDependencies {
    let mut edges: BTreeSet<FileDependency> = BTreeSet::new();

    for file_idx in view.select_kind(VertexKind::FileRetw) {
        let Some(file) = view.vertex(file_idx).and_then(Vertex::as_file) else {
            continue;
        };

        for mapping_idx in view.successors(file_idx) {
            if view.vertex(mapping_idx).and_then(Vertex::as_mapping).is_none() {
                continue;
            }
            // First hop inward: the mapping's source entities.
            for entity_idx in view.predecessors(mapping_idx) {
                let Some(entity) = view.vertex(entity_idx).and_then(Vertex::as_entity) else {
                    continue;
                };
                // Second hop inward: files defining those entities.
                for definer_idx in view.predecessors(entity_idx) {
                    let Some(definer) = view.vertex(definer_idx).and_then(Vertex::as_file) else {
                        continue;
                    };
                    if definer.id == file.id {
                        continue;
                    }
                    edges.insert(FileDependency {
                        definer: definer.id,
                        consumer: file.id,
                        entity: entity.id,
                    });
                }
            }
        }
    }

    let files: Vec<FileVertex> = view
        .select_kind(VertexKind::FileRetw)
        .into_iter()
        .filter_map(|idx| view.vertex(idx).and_then(Vertex::as_file).cloned())
        .collect();

    FileDependencies {
        files,
        dependencies: edges.into_iter().collect(),
    }
}
