/// Per-level stage assignment via conflict coloring.
///
/// Two mappings at the same run level conflict when they read at least
/// one common direct source entity; running them concurrently would
/// contend on that source. Per level, an undirected conflict graph is
/// colored with the DSATUR ("colored neighbors") heuristic; the color
/// becomes the mapping's `run_level_stage`. Equal stages are
/// conflict-free and safe to run in parallel.
///
/// Determinism: downstream deployments pin on concrete stage numbers,
/// so every choice is tie-broken — candidate selection by saturation,
/// then degree, then ascending identity; colors are the smallest
/// non-negative integer unused by any colored neighbor.
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::stable_graph::NodeIndex;

use crate::graph::DepGraph;
use crate::identity::NodeId;
use crate::structures::Vertex;

/// Computes the run-level stage for every mapping in the projection.
pub(super) fn assign_run_level_stages(
    view: &DepGraph,
    run_levels: &HashMap<NodeId, i64>,
) -> HashMap<NodeId, i64> {
    let mut by_level: BTreeMap<i64, Vec<NodeIndex>> = BTreeMap::new();
    for idx in view.graph().node_indices() {
        let Some(mapping) = view.vertex(idx).and_then(Vertex::as_mapping) else {
            continue;
        };
        if let Some(&level) = run_levels.get(&mapping.id) {
            by_level.entry(level).or_default().push(idx);
        }
    }

    let mut stages: HashMap<NodeId, i64> = HashMap::new();
    for mappings in by_level.values() {
        let conflicts = conflict_graph(view, mappings);
        stages.extend(greedy_color(&conflicts));
    }
    stages
}

/// Builds the undirected conflict adjacency for one level: an edge for
/// every pair of mappings sharing ≥ 1 direct source vertex. The
/// `a < b` guard walks each unordered pair exactly once.
fn conflict_graph(view: &DepGraph, mappings: &[NodeIndex]) -> BTreeMap<NodeId, BTreeSet<NodeId>> {
    let sources: Vec<(NodeId, HashSet<NodeIndex>)> = mappings
        .iter()
        .filter_map(|&idx| {
            let id = view.vertex(idx).map(Vertex::id)?;
            let preds: HashSet<NodeIndex> = view.predecessors(idx).into_iter().collect();
            Some((id, preds))
        })
        .collect();

    let mut adjacency: BTreeMap<NodeId, BTreeSet<NodeId>> =
        sources.iter().map(|(id, _)| (*id, BTreeSet::new())).collect();
    for (a, sources_a) in &sources {
        for (b, sources_b) in &sources {
            if a < b && !sources_a.is_disjoint(sources_b) {
                if let Some(neighbours) = adjacency.get_mut(a) {
                    neighbours.insert(*b);
                }
                if let Some(neighbours) = adjacency.get_mut(b) {
                    neighbours.insert(*a);
                }
            }
        }
    }
    adjacency
}

/// DSATUR greedy coloring.
///
/// Repeatedly picks the uncolored vertex with the most distinctly
/// colored neighbors (saturation), breaking ties by larger degree and
/// then by smaller identity, and assigns the smallest color absent
/// from its neighborhood. Isolated vertices end up with color 0.
fn greedy_color(adjacency: &BTreeMap<NodeId, BTreeSet<NodeId>>) -> HashMap<NodeId, i64> {
    let mut colors: HashMap<NodeId, i64> = HashMap::with_capacity(adjacency.len());
    let mut uncolored: BTreeSet<NodeId> = adjacency.keys().copied().collect();

    while !uncolored.is_empty() {
        let mut best: Option<(usize, usize, NodeId)> = None;
        for &candidate in &uncolored {
            let neighbours = adjacency.get(&candidate).map_or(0, BTreeSet::len);
            let saturation = adjacency
                .get(&candidate)
                .map_or(0, |n| {
                    n.iter()
                        .filter_map(|id| colors.get(id))
                        .collect::<HashSet<_>>()
                        .len()
                });
            // Strict improvement keeps the smallest id among ties,
            // because candidates are visited in ascending id order.
            let improves = match best {
                None => true,
                Some((s, d, _)) => (saturation, neighbours) > (s, d),
            };
            if improves {
                best = Some((saturation, neighbours, candidate));
            }
        }
        let Some((_, _, chosen)) = best else {
            break;
        };

        let used: HashSet<i64> = adjacency
            .get(&chosen)
            .map_or_else(HashSet::new, |n| {
                n.iter().filter_map(|id| colors.get(id).copied()).collect()
            });
        let mut color = 0i64;
        while used.contains(&color) {
            color += 1;
        }
        colors.insert(chosen, color);
        uncolored.remove(&chosen);
    }

    colors
}
