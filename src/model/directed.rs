//! Defines a `DiscreteBayesNet`, a Bayesian model that represents the factorization of
//! a probability distribution P over discrete variables

use crate::factor::Factor;
use crate::init::Initialization;
use crate::util::{Result, CtpError};
use crate::variable::{Assignment, Variable};

use bidir_map::BidirMap;
use indexmap::{IndexMap, IndexSet};
use rand::Rng;

use std::collections::{HashMap, HashSet};


/// Undirected adjacency over the `Variable`s of a network, in insertion order
pub type MoralGraph = IndexMap<Variable, IndexSet<Variable>>;


/// Represents a Bayesian Network - a Directed Probabilistic Graphical Model.
///
/// # Representation
/// The network is represented as a Directed Acyclic Graph (DAG). A traditional graph data
/// structure is not used; instead, the Conditional Probability Distribution (CPD) of each
/// `Variable` implicitly defines the edges of the graph. The `Variable`s are held in their
/// topological order to faciliate efficient computations over the graph.
#[derive(Clone)]
pub struct DiscreteBayesNet {

    /// The `Variable`s comprising the network and their associated CPDs. The `Factor`
    /// associated with a `Variable` ```X``` has scope ```Pa(X) ++ [X]```.
    graph: IndexMap<Variable, Factor>,

    /// The parents of each `Variable`, in the order of the CPD's scope
    parents: HashMap<Variable, Vec<Variable>>,

    /// `Variable`s that are never observed
    latent: HashSet<Variable>,

    /// The user-defined names of each `Variable`. This is a two way lookup ```(`Variable`->Name)```
    /// and ```(Name->`Variable`)```
    names: BidirMap<Variable, String>

}

impl DiscreteBayesNet {

    /// Get the `Factor` for the given variable in this network.
    pub fn cpd(&self, v: &Variable) -> Option<&Factor> {
        self.graph.get(v)
    }

    /// Replace the CPD of `var`.
    ///
    /// The new `Factor` must be a conditional distribution of `var` over exactly the family of
    /// `var`. Its scope may be in any order; it is stored in the network's family order.
    pub fn set_cpd(&mut self, var: &Variable, cpd: Factor) -> Result<()> {
        let family = self.family(var)?;

        if ! cpd.is_conditional_of(var) {
            return Err(CtpError::NotACPD);
        }

        let cpd = cpd.permute(&family)?;
        self.graph.insert(*var, cpd);

        Ok(())
    }

    /// Get a topological order of the `DiscreteBayesNet`
    pub fn topological_order(&self) -> Vec<Variable> {
        self.graph.keys().cloned().collect()
    }

    /// All `Variable`s of the network, in topological order
    pub fn variables(&self) -> Vec<Variable> {
        self.topological_order()
    }

    /// Get the number of `Variable`s in the the `DiscreteBayesNet`
    pub fn num_variables(&self) -> usize {
        self.graph.len()
    }

    pub fn contains(&self, var: &Variable) -> bool {
        self.graph.contains_key(var)
    }

    /// Check that `var` belongs to this network
    pub fn check_contains(&self, var: &Variable) -> Result<()> {
        if self.contains(var) {
            Ok(())
        } else {
            Err(CtpError::UnknownVariable(var.to_string()))
        }
    }

    /// Lookup a `Variable` in the `DiscreteBayesNet` based on the name
    pub fn lookup_variable(&self, name: &str) -> Option<&Variable> {
        self.names.get_by_second(&String::from(name))
    }

    /// Lookup a `Variable`'s name in the `DiscreteBayesNet`.
    pub fn lookup_name(&self, var: &Variable) -> Option<&String> {
        self.names.get_by_first(var)
    }

    /// The display name of `var`: its registered name, or its generated one
    pub fn name_of(&self, var: &Variable) -> String {
        self.lookup_name(var).cloned().unwrap_or_else(|| var.to_string())
    }

    /// The parents of `var`
    pub fn parents(&self, var: &Variable) -> Result<&[Variable]> {
        self.parents.get(var)
                    .map(|p| p.as_slice())
                    .ok_or_else(|| CtpError::UnknownVariable(var.to_string()))
    }

    /// The children of `var`, in topological order
    pub fn children(&self, var: &Variable) -> Result<Vec<Variable>> {
        self.check_contains(var)?;

        Ok(self.graph.keys()
                     .filter(|c| self.parents[*c].contains(var))
                     .cloned()
                     .collect())
    }

    /// The family of `var`: its parents followed by `var` itself. This is the scope of its CPD.
    pub fn family(&self, var: &Variable) -> Result<Vec<Variable>> {
        let mut family = self.parents(var)?.to_vec();
        family.push(*var);

        Ok(family)
    }

    pub fn is_latent(&self, var: &Variable) -> bool {
        self.latent.contains(var)
    }

    /// The `Variable`s that are never observed, in topological order
    pub fn latent_variables(&self) -> Vec<Variable> {
        self.graph.keys().filter(|v| self.latent.contains(v)).cloned().collect()
    }

    /// The observable `Variable`s, in topological order
    pub fn manifest_variables(&self) -> Vec<Variable> {
        self.graph.keys().filter(|v| ! self.latent.contains(v)).cloned().collect()
    }

    /// Moralize the network: connect every `Variable` to its parents and marry co-parents.
    pub fn moral_graph(&self) -> MoralGraph {
        let mut graph: MoralGraph = self.graph.keys()
                                              .map(|v| (*v, IndexSet::new()))
                                              .collect();

        for (var, parents) in self.graph.keys().map(|v| (v, &self.parents[v])) {
            for (i, p) in parents.iter().enumerate() {
                connect(&mut graph, var, p);
                for q in parents.iter().skip(i + 1) {
                    connect(&mut graph, p, q);
                }
            }
        }

        graph
    }

    /// The number of free parameters of the network
    pub fn compute_dimension(&self) -> usize {
        self.graph.keys()
                  .map(|v| {
                      let configs: usize = self.parents[v].iter().map(|p| p.cardinality()).product();
                      (v.cardinality() - 1) * configs
                  })
                  .sum()
    }

    /// Determine the probability of a full `Assignment` to the `Variable`s in the network.
    ///
    /// Specifically, this computes ```P(zeta)```, where ```zeta``` is a full assignment.
    pub fn probability(&self, assignment: &Assignment) -> Result<f64> {
        // for every variable in the graph
        self.graph.values()
                  // get the probability of the assignment
                  .map(|cpt| cpt.value(assignment))
                  // and multiply those probability by the chain rule
                  // but if there are any errors, just return the error
                  .fold(Ok(1.0), |acc, val| acc.and_then(|p| val.map(|v| p * v)))
    }

    /// Replace the CPDs of `vars` with randomly drawn conditional distributions
    pub fn randomly_parameterize<R: Rng>(&mut self, rng: &mut R, vars: &[Variable]) -> Result<()> {
        for var in vars {
            let parents = self.parents(var)?.to_vec();
            let cpd = Initialization::Random.build_cpd_using(*var, parents, rng)?;
            self.graph.insert(*var, cpd);
        }

        Ok(())
    }
}

fn connect(graph: &mut MoralGraph, a: &Variable, b: &Variable) {
    if let Some(n) = graph.get_mut(a) {
        n.insert(*b);
    }
    if let Some(n) = graph.get_mut(b) {
        n.insert(*a);
    }
}


/// An implementation of the [builder pattern] for creating a `DiscreteBayesNet`.
///
/// At the moment, models must be assembled in topological order.
///
/// [builder pattern]: https://en.wikipedia.org/wiki/Builder_pattern
pub struct DiscreteBayesNetBuilder {

    /// The `Variable`s and their associated CPDs
    factors: IndexMap<Variable, Factor>,

    /// The parents of each `Variable`
    parents: HashMap<Variable, Vec<Variable>>,

    /// `Variable`s marked as latent
    latent: HashSet<Variable>,

    /// The names of each `Variable`
    names: BidirMap<Variable, String>,

    /// The error state of the builder
    err: Option<CtpError>

}


impl DiscreteBayesNetBuilder {

    /// Construct a new `DiscreteBayesNetBuilder` representing an empty `DiscreteBayesNet`
    pub fn new() -> Self {
        DiscreteBayesNetBuilder {
            factors: IndexMap::new(),
            parents: HashMap::new(),
            latent: HashSet::new(),
            names: BidirMap::new(),
            err: None
        }
    }


    /// Add an anonymous `Variable` to the `DiscreteBayesNet`.
    ///
    /// # Args
    /// * `var`: the variable to add to the model
    /// * `parents`: the parent variables. The parents must already be in the model.
    /// * `init`: the initialization mechanism for the CPD of `var` in the model.
    pub fn with_variable(
        self,
        var: &Variable,
        parents: Vec<Variable>,
        init: Initialization,
    ) -> Self {
        self.add_variable(var, var.to_string(), parents, init)
    }


    /// Add a named `Variable` to the `DiscreteBayesNet`.
    pub fn with_named_variable(
        self,
        var: &Variable,
        name: &str,
        parents: Vec<Variable>,
        init: Initialization,
    ) -> Self {
        self.add_variable(var, String::from(name), parents, init)
    }


    /// Mark a previously added `Variable` as latent (never observed)
    pub fn with_latent(mut self, var: &Variable) -> Self {
        if self.err.is_none() && ! self.factors.contains_key(var) {
            self.err = Some(CtpError::UnknownVariable(var.to_string()));
        }

        self.latent.insert(*var);
        self
    }


    /// Complete building the model.
    ///
    /// # Returns
    /// the `DiscreteBayesNet`, or an error if one was generated during the building process
    pub fn build(self) -> Result<DiscreteBayesNet> {
        if let Some(e) = self.err {
            Err(e)
        } else {
            Ok(DiscreteBayesNet {
                graph: self.factors,
                parents: self.parents,
                latent: self.latent,
                names: self.names
            })
        }
    }

    /// Internal function that acutally does the variable addition to the model
    fn add_variable(
        mut self,
        var: &Variable,
        name: String,
        parents: Vec<Variable>,
        init: Initialization,
    ) -> Self {
        ///////////////////////////////////////////////////////////////////////
        // 1) if we are in an error state, do nothing
        if self.err.is_some() {
            return self;
        }

        ///////////////////////////////////////////////////////////////////////
        // 2) Check for error conditions
        if parents.iter().any(|v| ! self.factors.contains_key(v)) {
            self.err = Some(CtpError::MissingParent);
            return self;
        }

        if self.factors.contains_key(var) || self.names.get_by_second(&name).is_some() {
            self.err = Some(CtpError::DuplicateVariable);
            return self;
        }

        ///////////////////////////////////////////////////////////////////////
        // 3) Build the factor based on the initialization
        let factor = match init.build_cpd(*var, parents.clone()) {
            Ok(f) => f,
            Err(e) => {
                self.err = Some(e);
                return self;
            }
        };

        // user supplied tables may order the family differently
        let mut family = parents.clone();
        family.push(*var);
        let factor = match factor.permute(&family) {
            Ok(f) => f,
            Err(e) => {
                self.err = Some(e);
                return self;
            }
        };

        ///////////////////////////////////////////////////////////////////////
        // 4) Add to current model
        self.factors.insert(*var, factor);
        self.parents.insert(*var, parents);
        self.names.insert(*var, name);

        self
    }
}

impl Default for DiscreteBayesNetBuilder {
    fn default() -> Self {
        DiscreteBayesNetBuilder::new()
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::variable::all_assignments;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn build_empty() {
        let model = DiscreteBayesNetBuilder::new().build().unwrap();

        assert_eq!(model.num_variables(), 0);
        assert!(model.variables().is_empty());
    }


    #[test]
    /// Tests building a model with a single, named binary variable
    fn build_named_simple() {
        let v = Variable::binary();
        let model = DiscreteBayesNetBuilder::new()
                        .with_named_variable(&v, "foo", vec![], Initialization::Uniform)
                        .build()
                        .unwrap();

        assert_eq!(vec![v], model.variables());
        assert_eq!("foo", model.lookup_name(&v).unwrap());
        assert_eq!(&v, model.lookup_variable("foo").unwrap());

        let f = model.cpd(&v).unwrap();
        assert_eq!(&[v], f.scope());
        assert_eq!(vec![0.5, 0.5], f.cells());
    }


    #[test]
    fn build_errors() {
        let a = Variable::binary();
        let b = Variable::binary();

        // parent not yet in the model
        let model = DiscreteBayesNetBuilder::new()
                        .with_variable(&b, vec![a], Initialization::Uniform)
                        .build();
        assert_eq!(CtpError::MissingParent, model.err().unwrap());

        // variable added twice
        let model = DiscreteBayesNetBuilder::new()
                        .with_variable(&a, vec![], Initialization::Uniform)
                        .with_variable(&a, vec![], Initialization::Uniform)
                        .build();
        assert_eq!(CtpError::DuplicateVariable, model.err().unwrap());

        // latent variable not in the model
        let model = DiscreteBayesNetBuilder::new()
                        .with_variable(&a, vec![], Initialization::Uniform)
                        .with_latent(&b)
                        .build();
        assert!(model.is_err());
    }


    #[test]
    /// Example taken from Koller & Friedman Section 3.1.2
    fn intelligence() {
        let intelligence = Variable::binary();
        let sat = Variable::binary();

        let sfactor = Factor::cpd(sat, vec![intelligence], array![[0.95, 0.05], [0.2, 0.8]].into_dyn()).unwrap();

        let model = DiscreteBayesNetBuilder::new()
                        .with_named_variable(
                            &intelligence,
                            "I",
                            vec![],
                            Initialization::Multinomial(&[0.7, 0.3])
                        ).with_named_variable(
                            &sat,
                            "S",
                            vec![intelligence],
                            Initialization::Table(sfactor)
                        ).with_latent(&intelligence)
                        .build()
                        .unwrap();

        assert_eq!(2, model.num_variables());
        assert_eq!(vec![intelligence], model.latent_variables());
        assert_eq!(vec![sat], model.manifest_variables());
        assert_eq!(vec![sat], model.children(&intelligence).unwrap());
        assert_eq!(&[intelligence], model.parents(&sat).unwrap());
        assert_eq!(3, model.compute_dimension());

        let mut a = Assignment::new();
        a.set(&intelligence, 1);
        a.set(&sat, 0);
        assert!((model.probability(&a).unwrap() - 0.3 * 0.2).abs() < 1e-12);

        // partial assignment
        let mut a = Assignment::new();
        a.set(&intelligence, 1);
        assert!(model.probability(&a).is_err());

        let total: f64 = all_assignments(&model.variables())
                            .map(|a| model.probability(&a).unwrap())
                            .sum();
        assert!((total - 1.0).abs() < 1e-12);
    }


    #[test]
    fn moral_graph_marries_parents() {
        let a = Variable::binary();
        let b = Variable::binary();
        let c = Variable::binary();
        let d = Variable::binary();

        let model = DiscreteBayesNetBuilder::new()
                        .with_variable(&a, vec![], Initialization::Uniform)
                        .with_variable(&b, vec![], Initialization::Uniform)
                        .with_variable(&c, vec![a, b], Initialization::Uniform)
                        .with_variable(&d, vec![c], Initialization::Uniform)
                        .build()
                        .unwrap();

        let moral = model.moral_graph();
        assert!(moral[&a].contains(&b));
        assert!(moral[&a].contains(&c));
        assert!(moral[&d].contains(&c));
        assert!(! moral[&d].contains(&a));
    }


    #[test]
    fn replace_cpd() {
        let a = Variable::binary();
        let b = Variable::binary();

        let mut model = DiscreteBayesNetBuilder::new()
                            .with_variable(&a, vec![], Initialization::Uniform)
                            .with_variable(&b, vec![a], Initialization::Uniform)
                            .build()
                            .unwrap();

        // supplied with the child first
        let cpd = Factor::new(vec![b, a], array![[0.9, 0.2], [0.1, 0.8]].into_dyn()).unwrap();
        model.set_cpd(&b, cpd).unwrap();
        assert_eq!(&[a, b], model.cpd(&b).unwrap().scope());
        assert_eq!(vec![0.9, 0.1, 0.2, 0.8], model.cpd(&b).unwrap().cells());

        let wrong = Factor::new(vec![a], array![0.5, 0.5].into_dyn()).unwrap();
        assert!(model.set_cpd(&b, wrong).is_err());

        let mut rng = StdRng::seed_from_u64(3);
        model.randomly_parameterize(&mut rng, &[a, b]).unwrap();
        assert!(model.cpd(&b).unwrap().is_conditional_of(&b));
    }
}
