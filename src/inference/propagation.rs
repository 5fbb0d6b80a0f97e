//! Defines `CliqueTreePropagation`, exact inference by full two-pass message passing over a
//! `CliqueTree`.

use super::beliefs::Calibration;
use super::evidence::Evidence;
use super::messages::Focus;
use super::Propagation;
use crate::clique_tree::CliqueTree;
use crate::factor::Factor;
use crate::model::DiscreteBayesNet;
use crate::util::{CtpError, Result};
use crate::variable::{Assignment, Variable};

use std::rc::Rc;


/// Exact inference engine for a `DiscreteBayesNet`.
///
/// Every call to `propagate` absorbs the current evidence and recomputes every message of the
/// tree, collecting towards the tree's pivot and distributing back out. Afterwards the likelihood
/// of the evidence and the posterior of any family (or any set of variables sharing a clique) are
/// available until the evidence or the network changes.
pub struct CliqueTreePropagation {
    network: DiscreteBayesNet,
    tree: Rc<CliqueTree>,
    calibration: Calibration
}

impl CliqueTreePropagation {

    /// Create an engine for `network`, building its `CliqueTree`
    pub fn new(network: DiscreteBayesNet) -> Result<Self> {
        let tree = CliqueTree::new(&network)?;
        Ok(CliqueTreePropagation::from_parts(network, Rc::new(tree)))
    }

    /// Create an engine for `network` over an existing `CliqueTree`.
    ///
    /// # Errors
    /// `CtpError::InvalidCliqueTree` if some `Variable` of `network` has no family clique in `tree`
    pub fn with_clique_tree(network: DiscreteBayesNet, tree: Rc<CliqueTree>) -> Result<Self> {
        check_coverage(&network, &tree)?;
        Ok(CliqueTreePropagation::from_parts(network, tree))
    }

    fn from_parts(network: DiscreteBayesNet, tree: Rc<CliqueTree>) -> Self {
        CliqueTreePropagation { network, tree, calibration: Calibration::new() }
    }

    pub fn clique_tree(&self) -> &Rc<CliqueTree> {
        &self.tree
    }

    /// The likelihood of the propagated evidence, if it is current
    pub fn likelihood(&self) -> Option<f64> {
        self.calibration.likelihood()
    }
}

impl Propagation for CliqueTreePropagation {

    fn network(&self) -> &DiscreteBayesNet {
        &self.network
    }

    fn network_mut(&mut self) -> &mut DiscreteBayesNet {
        self.calibration.invalidate();
        &mut self.network
    }

    fn set_evidence(&mut self, evidence: &Evidence) -> Result<()> {
        self.calibration.set_evidence(&self.network, evidence)
    }

    fn clear_evidence(&mut self) {
        self.calibration.clear_evidence();
    }

    fn evidence(&self) -> &Assignment {
        self.calibration.evidence()
    }

    fn propagate(&mut self) -> Result<f64> {
        let pivot = self.tree.pivot();
        self.calibration.propagate(&self.network, &self.tree, &Focus::All, pivot)
    }

    fn log_likelihood(&self) -> Option<f64> {
        self.calibration.log_likelihood()
    }

    fn compute_family_belief(&self, var: &Variable) -> Result<Factor> {
        self.calibration.family_belief(&self.network, &self.tree, var)
    }

    fn compute_belief(&self, vars: &[Variable]) -> Result<Factor> {
        self.calibration.belief(&self.network, &self.tree, vars)
    }
}


/// Every `Variable` of `network` must have a family clique in `tree`
pub(crate) fn check_coverage(network: &DiscreteBayesNet, tree: &CliqueTree) -> Result<()> {
    for var in network.variables() {
        let clique = tree.family_clique(&var).map_err(|_| CtpError::InvalidCliqueTree(
            format!("no family clique for {}", network.name_of(&var))
        ))?;

        if ! tree.node(clique).contains_all(network.parents(&var)?) {
            return Err(CtpError::InvalidCliqueTree(
                format!("clique {} does not cover the family of {}", clique, network.name_of(&var))
            ));
        }
    }

    Ok(())
}
