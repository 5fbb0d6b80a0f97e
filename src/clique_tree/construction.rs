//! Triangulation of a moral graph and assembly of its cliques into a junction tree.

use super::CliqueId;
use crate::model::MoralGraph;
use crate::variable::Variable;

use indexmap::IndexSet;


/// Eliminate the variables of `graph` one at a time by the min-fill heuristic, returning the
/// maximal cliques induced by the elimination.
///
/// At each step the remaining variable whose elimination adds the fewest fill-in edges is chosen;
/// ties go to the smaller clique (by joint cardinality), then to the earlier variable.
pub(super) fn eliminate(graph: &MoralGraph) -> Vec<Vec<Variable>> {
    let mut graph = graph.clone();
    let mut cliques: Vec<Vec<Variable>> = Vec::new();

    while ! graph.is_empty() {
        let mut best: Option<(Variable, usize, f64)> = None;

        for (var, neighbors) in graph.iter() {
            let fill = fill_in(&graph, neighbors);
            // log of the clique's joint cardinality; wide cliques overflow the plain product
            let weight: f64 = neighbors.iter()
                                       .chain(Some(var))
                                       .map(|v| (v.cardinality() as f64).ln())
                                       .sum();

            let better = match best {
                None => true,
                Some((_, f, w)) => fill < f || (fill == f && weight < w)
            };

            if better {
                best = Some((*var, fill, weight));
            }
        }

        let var = match best {
            Some((v, _, _)) => v,
            None => break
        };

        let neighbors = graph.shift_remove(&var).unwrap_or_default();

        // connect the neighbors pairwise, and forget the eliminated variable
        for n in neighbors.iter() {
            if let Some(adj) = graph.get_mut(n) {
                adj.shift_remove(&var);
                adj.extend(neighbors.iter().filter(|m| *m != n).cloned());
            }
        }

        let mut clique = vec![var];
        clique.extend(neighbors.iter().cloned());

        // a later clique can only be subsumed by an earlier one, never the reverse, since every
        // earlier clique holds a variable that is already gone
        let subsumed = cliques.iter().any(|c| clique.iter().all(|v| c.contains(v)));
        if ! subsumed {
            cliques.push(clique);
        }
    }

    cliques
}


/// Number of edges missing between `neighbors`
fn fill_in(graph: &MoralGraph, neighbors: &IndexSet<Variable>) -> usize {
    let mut fill = 0;

    for (i, a) in neighbors.iter().enumerate() {
        for b in neighbors.iter().skip(i + 1) {
            if ! graph.get(a).map_or(false, |adj| adj.contains(b)) {
                fill += 1;
            }
        }
    }

    fill
}


/// Join `cliques` by a maximum weight spanning tree (Prim), weighting each pair by the size of
/// their separator.
///
/// Pairs with an empty separator are valid edges, so cliques of disconnected components are
/// joined into a single tree.
pub(super) fn spanning_tree(cliques: &[Vec<Variable>]) -> Vec<(CliqueId, CliqueId)> {
    let n = cliques.len();
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    if n == 0 {
        return edges;
    }

    let weight = |a: usize, b: usize| cliques[a].iter().filter(|v| cliques[b].contains(v)).count();

    let mut in_tree = vec![false; n];
    // best (weight, attachment) for each clique outside the tree
    let mut best: Vec<Option<(usize, CliqueId)>> = vec![None; n];

    in_tree[0] = true;
    for j in 1..n {
        best[j] = Some((weight(0, j), 0));
    }

    for _ in 1..n {
        let mut next: Option<(CliqueId, usize, CliqueId)> = None;

        for j in (0..n).filter(|&j| ! in_tree[j]) {
            if let Some((w, from)) = best[j] {
                if next.map_or(true, |(_, nw, _)| w > nw) {
                    next = Some((j, w, from));
                }
            }
        }

        let (j, _, from) = match next {
            Some(e) => e,
            None => break
        };

        in_tree[j] = true;
        edges.push((from, j));

        for k in (0..n).filter(|&k| ! in_tree[k]) {
            let w = weight(j, k);
            if best[k].map_or(true, |(bw, _)| w > bw) {
                best[k] = Some((w, j));
            }
        }
    }

    edges
}
