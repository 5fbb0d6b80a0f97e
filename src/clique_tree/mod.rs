//! Defines the `CliqueTree` (junction tree) over which evidence is propagated.
//!
//! A `CliqueTree` is an undirected tree whose nodes are groups of `Variable`s (cliques). Adjacent
//! cliques communicate through their shared variables (the separator). The tree satisfies the
//! running intersection property: the cliques containing any one `Variable` form a connected
//! subtree. Every `Variable` of the network has a family-covering clique containing the
//! `Variable` together with all of its parents, which is where its CPD is attached during
//! inference.
//!
//! The tree itself only holds structure. Attached tables and the messages passed along its
//! edges are owned by the inference engines, so that one tree can back several engines.

mod construction;

use crate::model::DiscreteBayesNet;
use crate::util::{CtpError, Result};
use crate::variable::Variable;

use std::collections::{HashMap, HashSet, VecDeque};

/// Index of a clique within its `CliqueTree`
pub type CliqueId = usize;


/// A node of the `CliqueTree`
#[derive(Clone, Debug)]
pub struct CliqueNode {
    id: CliqueId,

    /// The variables grouped in this clique
    variables: Vec<Variable>,

    /// Adjacent cliques
    neighbors: Vec<CliqueId>
}

impl CliqueNode {

    pub fn id(&self) -> CliqueId {
        self.id
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn neighbors(&self) -> &[CliqueId] {
        &self.neighbors
    }

    /// The number of joint states of the clique
    pub fn cardinality(&self) -> usize {
        self.variables.iter().fold(1usize, |acc, v| acc.saturating_mul(v.cardinality()))
    }

    pub fn contains(&self, var: &Variable) -> bool {
        self.variables.contains(var)
    }

    pub fn contains_all(&self, vars: &[Variable]) -> bool {
        vars.iter().all(|v| self.contains(v))
    }
}


/// A junction tree over the `Variable`s of a `DiscreteBayesNet`
#[derive(Clone, Debug)]
pub struct CliqueTree {

    /// Arena of cliques, indexed by `CliqueId`
    nodes: Vec<CliqueNode>,

    /// The family-covering clique of each `Variable`
    families: HashMap<Variable, CliqueId>,

    /// Default root for message passing
    pivot: CliqueId

}

impl CliqueTree {

    /// Build a clique tree for `network`.
    ///
    /// The moral graph of the network is triangulated by greedy min-fill elimination; the maximal
    /// cliques of the elimination are joined by a maximum weight spanning tree, weighting each edge
    /// by the size of its separator.
    pub fn new(network: &DiscreteBayesNet) -> Result<Self> {
        let mut cliques = construction::eliminate(&network.moral_graph());

        // an empty network still needs somewhere to compute its (unit) likelihood
        if cliques.is_empty() {
            cliques.push(Vec::new());
        }

        let edges = construction::spanning_tree(&cliques);
        let tree = CliqueTree::from_cliques(network, cliques, &edges)?;

        tracing::debug!(
            cliques = tree.len(),
            max_cardinality = tree.nodes.iter().map(|n| n.cardinality()).max().unwrap_or(1),
            "built clique tree"
        );

        Ok(tree)
    }

    /// Assemble a clique tree from explicit cliques and edges.
    ///
    /// # Errors
    /// `CtpError::InvalidCliqueTree` if the edges do not form a tree over the cliques, if the
    /// running intersection property is violated, or if some `Variable`'s family is not contained
    /// in any clique.
    pub fn from_cliques(
        network: &DiscreteBayesNet,
        cliques: Vec<Vec<Variable>>,
        edges: &[(CliqueId, CliqueId)]
    ) -> Result<Self> {
        if cliques.is_empty() {
            return Err(CtpError::InvalidCliqueTree(String::from("no cliques")));
        }

        let mut nodes: Vec<CliqueNode> = cliques.into_iter()
                                                .enumerate()
                                                .map(|(id, variables)| CliqueNode {
                                                    id,
                                                    variables,
                                                    neighbors: Vec::new()
                                                })
                                                .collect();

        if edges.len() != nodes.len() - 1 {
            return Err(CtpError::InvalidCliqueTree(
                format!("{} cliques need {} edges, got {}", nodes.len(), nodes.len() - 1, edges.len())
            ));
        }

        for &(a, b) in edges {
            if a >= nodes.len() || b >= nodes.len() || a == b || nodes[a].neighbors.contains(&b) {
                return Err(CtpError::InvalidCliqueTree(format!("invalid edge ({}, {})", a, b)));
            }
            nodes[a].neighbors.push(b);
            nodes[b].neighbors.push(a);
        }

        // n - 1 edges and connected means acyclic
        if reachable(&nodes, 0, |_| true).len() != nodes.len() {
            return Err(CtpError::InvalidCliqueTree(String::from("cliques are not connected")));
        }

        for var in nodes.iter().flat_map(|n| n.variables.iter()).collect::<HashSet<_>>() {
            let holders: HashSet<CliqueId> = nodes.iter()
                                                  .filter(|n| n.contains(var))
                                                  .map(|n| n.id)
                                                  .collect();
            let start = *holders.iter().next().unwrap_or(&0);
            if reachable(&nodes, start, |id| holders.contains(&id)).len() != holders.len() {
                return Err(CtpError::InvalidCliqueTree(
                    format!("cliques containing {} are not connected", var)
                ));
            }
        }

        let mut families = HashMap::new();
        for var in network.variables() {
            let family = network.family(&var)?;
            let clique = smallest(&nodes, &family).ok_or_else(|| CtpError::InvalidCliqueTree(
                format!("no clique covers the family of {}", network.name_of(&var))
            ))?;
            families.insert(var, clique);
        }

        let pivot = smallest(&nodes, &[]).unwrap_or(0);

        Ok(CliqueTree { nodes, families, pivot })
    }

    /// All cliques of the tree
    pub fn nodes(&self) -> &[CliqueNode] {
        &self.nodes
    }

    pub fn node(&self, id: CliqueId) -> &CliqueNode {
        &self.nodes[id]
    }

    /// Number of cliques
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn neighbors(&self, id: CliqueId) -> &[CliqueId] {
        &self.nodes[id].neighbors
    }

    /// The clique covering `var` and all of its parents
    pub fn family_clique(&self, var: &Variable) -> Result<CliqueId> {
        self.families.get(var).cloned().ok_or_else(|| CtpError::UnknownVariable(var.to_string()))
    }

    /// The default root of message passing
    pub fn pivot(&self) -> CliqueId {
        self.pivot
    }

    pub fn set_pivot(&mut self, id: CliqueId) -> Result<()> {
        if id >= self.nodes.len() {
            return Err(CtpError::InvalidCliqueTree(format!("no clique {}", id)));
        }

        self.pivot = id;
        Ok(())
    }

    /// Variables of `source` that are not shared with `destination`
    pub fn difference(&self, source: CliqueId, destination: CliqueId) -> Vec<Variable> {
        let dst = &self.nodes[destination];

        self.nodes[source].variables
                          .iter()
                          .filter(|v| ! dst.contains(v))
                          .cloned()
                          .collect()
    }

    /// Variables shared by two cliques
    pub fn separator(&self, a: CliqueId, b: CliqueId) -> Vec<Variable> {
        let other = &self.nodes[b];

        self.nodes[a].variables.iter().filter(|v| other.contains(v)).cloned().collect()
    }

    /// The clique of least cardinality containing every variable of `vars`
    pub fn smallest_covering_clique(&self, vars: &[Variable]) -> Option<CliqueId> {
        smallest(&self.nodes, vars)
    }
}


/// The first clique of minimum cardinality that contains `vars`
fn smallest(nodes: &[CliqueNode], vars: &[Variable]) -> Option<CliqueId> {
    let mut best: Option<(CliqueId, usize)> = None;

    for node in nodes.iter().filter(|n| n.contains_all(vars)) {
        let card = node.cardinality();
        match best {
            Some((_, c)) if c <= card => (),
            _ => best = Some((node.id, card))
        }
    }

    best.map(|(id, _)| id)
}


/// Cliques reachable from `start` through cliques accepted by `allowed`
fn reachable<F: Fn(CliqueId) -> bool>(nodes: &[CliqueNode], start: CliqueId, allowed: F) -> HashSet<CliqueId> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();

    seen.insert(start);
    queue.push_back(start);

    while let Some(id) = queue.pop_front() {
        for &n in nodes[id].neighbors.iter() {
            if allowed(n) && seen.insert(n) {
                queue.push_back(n);
            }
        }
    }

    seen
}
