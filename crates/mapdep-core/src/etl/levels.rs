/// Run-level assignment: mapping depth in the data-flow DAG.
///
/// A mapping's run level is the length, counted in mappings, of the
/// longest ancestor chain ending at it: level 0 mappings have no
/// mapping upstream of them, and a mapping at level L may start once
/// every level < L has completed. Two mappings with no mapping between
/// them share a level even when one feeds the other's siblings.
/// Entities never run and are pinned at −1.
///
/// Computed as a single dynamic-programming pass over a Kahn
/// topological order: the caller guarantees the projection is acyclic
/// (cycle detection runs first).
use std::collections::{HashMap, VecDeque};

use petgraph::stable_graph::NodeIndex;

use crate::graph::DepGraph;
use crate::identity::NodeId;

/// Computes the run level of every vertex in the projection.
pub(super) fn assign_run_levels(view: &DepGraph) -> HashMap<NodeId, i64> {
    let g = view.graph();

    // Kahn order; on a (guaranteed) DAG this visits every vertex.
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

    // depth(v) = most mappings on any path ending at v, v included.
    let mut depth: HashMap<NodeIndex, i64> = HashMap::with_capacity(in_degree.len());
    let mut levels: HashMap<NodeId, i64> = HashMap::with_capacity(in_degree.len());

    while let Some(idx) = queue.pop_front() {
        let Some(vertex) = view.vertex(idx) else {
            continue;
        };
        let upstream = g
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .filter_map(|pred| depth.get(&pred).copied())
            .max()
            .unwrap_or(0);
        let own = i64::from(vertex.as_mapping().is_some());
        depth.insert(idx, upstream + own);

        let level = if vertex.as_mapping().is_some() {
            upstream + own - 1
        } else {
            -1
        };
        levels.insert(vertex.id(), level);

        for successor in g.neighbors_directed(idx, petgraph::Direction::Outgoing) {
            if let Some(deg) = in_degree.get_mut(&successor) {
                *deg = deg.saturating_sub(1);
                if *deg == 0 {
                    queue.push_back(successor);
                }
            }
        }
    }

    levels
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::collections::HashSet;

    use petgraph::stable_graph::NodeIndex;

    use super::*;
    use crate::enums::{EdgeKind, VertexKind};
    use crate::identity::{MappingRef, mapping_id};
    use crate::test_helpers::{entity_json, mapping_json, retw_doc, store_from_docs};

    fn projection(doc: &crate::retw::RetwDocument) -> DepGraph {
        let (store, _) = store_from_docs(&[("a.json", doc)]);
        let mut view = DepGraph::project(&store, |kind: EdgeKind| kind.is_etl());
        let files: HashSet<NodeIndex> = view
            .select_kind(VertexKind::FileRetw)
            .into_iter()
            .collect();
        view.delete_vertices(&files);
        view
    }

    fn mapping(path: &str, code: &str) -> NodeId {
        mapping_id(MappingRef {
            file_path: path,
            code,
        })
    }

    #[test]
    fn chain_of_three_increments_per_mapping() {
        let doc = retw_doc(
            "M",
            &[
                entity_json("o2", "E1"),
                entity_json("o3", "E2"),
                entity_json("o4", "E3"),
                entity_json("o5", "E4"),
            ],
            &[
                mapping_json("o10", "M1", "M", &[("o2", "E1")], ("o3", "E2")),
                mapping_json("o11", "M2", "M", &[("o3", "E2")], ("o4", "E3")),
                mapping_json("o12", "M3", "M", &[("o4", "E3")], ("o5", "E4")),
            ],
        );
        let levels = assign_run_levels(&projection(&doc));
        assert_eq!(levels.get(&mapping("a.json", "M1")), Some(&0));
        assert_eq!(levels.get(&mapping("a.json", "M2")), Some(&1));
        assert_eq!(levels.get(&mapping("a.json", "M3")), Some(&2));
    }

    #[test]
    fn parallel_ancestors_do_not_stack() {
        // M1 and M2 both feed M3 through different entities. The
        // longest chain ending at M3 still holds a single upstream
        // mapping, so M3 sits at level 1, one wave after M1 and M2.
        let doc = retw_doc(
            "M",
            &[
                entity_json("o2", "E1"),
                entity_json("o3", "E2"),
                entity_json("o4", "E3"),
                entity_json("o6", "E5"),
            ],
            &[
                mapping_json("o10", "M1", "M", &[("o2", "E1")], ("o3", "E2")),
                mapping_json("o11", "M2", "M", &[("o2", "E1")], ("o4", "E3")),
                mapping_json("o12", "M3", "M", &[("o3", "E2"), ("o4", "E3")], ("o6", "E5")),
            ],
        );
        let levels = assign_run_levels(&projection(&doc));
        assert_eq!(levels.get(&mapping("a.json", "M1")), Some(&0));
        assert_eq!(levels.get(&mapping("a.json", "M2")), Some(&0));
        assert_eq!(levels.get(&mapping("a.json", "M3")), Some(&1));
    }

    #[test]
    fn uneven_branches_take_the_longer_chain() {
        // E1 → M1 → E2 → M2 → E3, and M3: (E3, E5) → E4 where E5 is
        // fed by the short branch M4: E1 → E5. Longest chain into M3
        // passes through M1, M2.
        let doc = retw_doc(
            "M",
            &[
                entity_json("o2", "E1"),
                entity_json("o3", "E2"),
                entity_json("o4", "E3"),
                entity_json("o5", "E4"),
                entity_json("o6", "E5"),
            ],
            &[
                mapping_json("o10", "M1", "M", &[("o2", "E1")], ("o3", "E2")),
                mapping_json("o11", "M2", "M", &[("o3", "E2")], ("o4", "E3")),
                mapping_json("o13", "M4", "M", &[("o2", "E1")], ("o6", "E5")),
                mapping_json("o12", "M3", "M", &[("o4", "E3"), ("o6", "E5")], ("o5", "E4")),
            ],
        );
        let levels = assign_run_levels(&projection(&doc));
        assert_eq!(levels.get(&mapping("a.json", "M4")), Some(&0));
        assert_eq!(levels.get(&mapping("a.json", "M3")), Some(&2));
    }

    #[test]
    fn source_only_mapping_is_level_zero() {
        let doc = retw_doc(
            "M",
            &[entity_json("o2", "E1"), entity_json("o3", "E2")],
            &[mapping_json("o10", "M1", "M", &[("o2", "E1")], ("o3", "E2"))],
        );
        let levels = assign_run_levels(&projection(&doc));
        assert_eq!(levels.get(&mapping("a.json", "M1")), Some(&0));
    }

    #[test]
    fn entities_are_minus_one() {
        let doc = retw_doc(
            "M",
            &[entity_json("o2", "E1"), entity_json("o3", "E2")],
            &[mapping_json("o10", "M1", "M", &[("o2", "E1")], ("o3", "E2"))],
        );
        let levels = assign_run_levels(&projection(&doc));
        let e2 = crate::identity::entity_id(crate::identity::EntityRef {
            code_model: "M",
            code: "E2",
        });
        assert_eq!(levels.get(&e2), Some(&-1), "even downstream entities");
    }

    #[test]
    fn run_level_is_monotone_along_mapping_edges() {
        // P4: downstream mappings always sit strictly deeper.
        let doc = retw_doc(
            "M",
            &[
                entity_json("o2", "E1"),
                entity_json("o3", "E2"),
                entity_json("o4", "E3"),
                entity_json("o5", "E4"),
            ],
            &[
                mapping_json("o10", "M1", "M", &[("o2", "E1")], ("o3", "E2")),
                mapping_json("o11", "M2", "M", &[("o2", "E1"), ("o3", "E2")], ("o4", "E3")),
                mapping_json("o12", "M3", "M", &[("o3", "E2"), ("o4", "E3")], ("o5", "E4")),
            ],
        );
        let levels = assign_run_levels(&projection(&doc));
        let l1 = levels[&mapping("a.json", "M1")];
        let l2 = levels[&mapping("a.json", "M2")];
        let l3 = levels[&mapping("a.json", "M3")];
        assert!(l1 < l2 && l2 < l3, "{l1} {l2} {l3}");
    }
}
