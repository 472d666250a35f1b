/// Cycle detection for the ETL projection.
///
/// Kahn's algorithm (BFS-based topological sort) consumes zero-in-degree
/// vertices; anything left unconsumed sits on a cycle. A DFS over the
/// leftover set then extracts the individual cycles so the failure can
/// name the offending vertices.
use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::stable_graph::NodeIndex;

use crate::graph::DepGraph;
use crate::identity::NodeId;
use crate::structures::Vertex;

/// Detects cycles in the projection.
///
/// Returns an empty vector for a DAG. Each detected cycle lists its
/// vertices in traversal order as stable identities, with the first
/// vertex repeated at the end (closed representation).
pub(super) fn detect_cycles(view: &DepGraph) -> Vec<Vec<NodeId>> {
    let g = view.graph();

    let mut in_degree: HashMap<NodeIndex, usize> = g
        .node_indices()
        .map(|idx| {
            (
                idx,
                g.neighbors_directed(idx, petgraph::Direction::Incoming)
                    .count(),
            )
        })
        .collect();

    let mut queue: VecDeque<NodeIndex> = in_degree
        .iter()
        .filter(|&(_, &deg)| deg == 0)
        .map(|(&idx, _)| idx)
        .collect();

    let mut visited = 0usize;
    while let Some(node) = queue.pop_front() {
        visited += 1;
        for successor in g.neighbors_directed(node, petgraph::Direction::Outgoing) {
            if let Some(deg) = in_degree.get_mut(&successor) {
                if *deg > 0 {
                    *deg -= 1;
                }
                if *deg == 0 {
                    queue.push_back(successor);
                }
            }
        }
    }

    if visited == in_degree.len() {
        return Vec::new();
    }

    let cyclic: HashSet<NodeIndex> = in_degree
        .iter()
        .filter(|&(_, &deg)| deg > 0)
        .map(|(&idx, _)| idx)
        .collect();

    extract_cycles(view, &cyclic)
}

/// Walks the cyclic vertex set with an explicit-stack DFS; every
/// back-edge to a vertex on the current path yields one cycle.
fn extract_cycles(view: &DepGraph, cyclic: &HashSet<NodeIndex>) -> Vec<Vec<NodeId>> {
    let g = view.graph();
    let mut all_cycles: Vec<Vec<NodeId>> = Vec::new();
    let mut globally_visited: HashSet<NodeIndex> = HashSet::new();

    // Deterministic starting order: by stable identity.
    let mut starts: Vec<NodeIndex> = cyclic.iter().copied().collect();
    starts.sort_by_key(|&idx| view.vertex(idx).map(Vertex::id));

    for start in starts {
        if globally_visited.contains(&start) {
            continue;
        }

        let mut path: Vec<NodeIndex> = vec![start];
        let mut on_path: HashSet<NodeIndex> = [start].into_iter().collect();
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> =
            vec![(start, cyclic_successors(view, start, cyclic), 0)];

        while let Some(frame) = stack.last_mut() {
            let (node, children, child_pos) = frame;
            let node = *node;

            if *child_pos >= children.len() {
                stack.pop();
                path.pop();
                on_path.remove(&node);
                globally_visited.insert(node);
                continue;
            }

            let child = children[*child_pos];
            *child_pos += 1;

            if on_path.contains(&child) {
                if let Some(pos) = path.iter().position(|&n| n == child) {
                    let mut cycle: Vec<NodeId> = path[pos..]
                        .iter()
                        .filter_map(|&idx| view.vertex(idx).map(Vertex::id))
                        .collect();
                    if let Some(first) = cycle.first().copied() {
                        cycle.push(first);
                    }
                    all_cycles.push(cycle);
                }
                continue;
            }
            if globally_visited.contains(&child) {
                continue;
            }

            path.push(child);
            on_path.insert(child);
            stack.push((child, cyclic_successors(view, child, cyclic), 0));
        }
    }

    all_cycles
}

/// Successors of `node` that also sit on a cycle, in deterministic
/// (identity) order.
fn cyclic_successors(view: &DepGraph, node: NodeIndex, cyclic: &HashSet<NodeIndex>) -> Vec<NodeIndex> {
    let mut successors: Vec<NodeIndex> = view
        .graph()
        .neighbors_directed(node, petgraph::Direction::Outgoing)
        .filter(|idx| cyclic.contains(idx))
        .collect();
    successors.sort_by_key(|&idx| view.vertex(idx).map(Vertex::id));
    successors
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::test_helpers::{entity_json, mapping_json, retw_doc, store_from_docs};

    fn projection(doc: &crate::retw::RetwDocument) -> DepGraph {
        use std::collections::HashSet as Set;

        use crate::enums::{EdgeKind, VertexKind};

        let (store, _) = store_from_docs(&[("a.json", doc)]);
        let mut view = DepGraph::project(&store, |kind: EdgeKind| kind.is_etl());
        let files: Set<NodeIndex> = view
            .select_kind(VertexKind::FileRetw)
            .into_iter()
            .collect();
        view.delete_vertices(&files);
        view
    }

    #[test]
    fn acyclic_chain_yields_nothing() {
        let doc = retw_doc(
            "M",
            &[
                entity_json("o2", "E1"),
                entity_json("o3", "E2"),
                entity_json("o4", "E3"),
            ],
            &[
                mapping_json("o10", "M1", "M", &[("o2", "E1")], ("o3", "E2")),
                mapping_json("o11", "M2", "M", &[("o3", "E2")], ("o4", "E3")),
            ],
        );
        let view = projection(&doc);
        assert!(detect_cycles(&view).is_empty());
    }

    #[test]
    fn two_mapping_cycle_is_found_closed() {
        let doc = retw_doc(
            "M",
            &[entity_json("o2", "E1"), entity_json("o3", "E2")],
            &[
                mapping_json("o10", "M1", "M", &[("o2", "E1")], ("o3", "E2")),
                mapping_json("o11", "M2", "M", &[("o3", "E2")], ("o2", "E1")),
            ],
        );
        let view = projection(&doc);
        let cycles = detect_cycles(&view);
        assert!(!cycles.is_empty());
        for cycle in &cycles {
            assert!(cycle.len() >= 2);
            assert_eq!(cycle.first(), cycle.last());
        }
        // All four projection vertices sit on the cycle.
        let on_cycles: std::collections::HashSet<NodeId> =
            cycles.iter().flatten().copied().collect();
        assert_eq!(on_cycles.len(), 4);
    }

    #[test]
    fn acyclic_branch_is_not_reported() {
        // Cycle between E1/E2 via M1/M2; M3 hangs off E2 acyclically.
        let doc = retw_doc(
            "M",
            &[
                entity_json("o2", "E1"),
                entity_json("o3", "E2"),
                entity_json("o4", "E3"),
            ],
            &[
                mapping_json("o10", "M1", "M", &[("o2", "E1")], ("o3", "E2")),
                mapping_json("o11", "M2", "M", &[("o3", "E2")], ("o2", "E1")),
                mapping_json("o12", "M3", "M", &[("o3", "E2")], ("o4", "E3")),
            ],
        );
        let view = projection(&doc);
        let cycles = detect_cycles(&view);
        assert!(!cycles.is_empty());
        let on_cycles: std::collections::HashSet<NodeId> =
            cycles.iter().flatten().copied().collect();
        let m3 = crate::identity::mapping_id(crate::identity::MappingRef {
            file_path: "a.json",
            code: "M3",
        });
        assert!(!on_cycles.contains(&m3), "M3 is downstream, not cyclic");
    }
}
