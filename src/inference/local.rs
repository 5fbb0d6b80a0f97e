//! Defines `LocalCliqueTreePropagation`, which only recomputes the messages of a focused subtree.
//!
//! This is intended for local search over structures or parameters, where repeated
//! propagations only ever change the tables of a few variables. Messages that leave cliques
//! outside of the focused subtree are kept from earlier propagations and are NOT refreshed, even
//! if the evidence has changed since they were computed. Call `invalidate_messages` to drop them.

use super::beliefs::Calibration;
use super::evidence::Evidence;
use super::messages::Focus;
use super::propagation::check_coverage;
use super::Propagation;
use crate::clique_tree::{CliqueId, CliqueTree};
use crate::factor::Factor;
use crate::model::DiscreteBayesNet;
use crate::util::{CtpError, Result};
use crate::variable::{Assignment, Variable};

use indexmap::IndexSet;
use std::rc::Rc;


pub struct LocalCliqueTreePropagation {
    network: DiscreteBayesNet,
    tree: Rc<CliqueTree>,
    calibration: Calibration,

    /// The family cliques of the focused variables
    focus: Focus,

    /// Root of message passing, chosen within the focus
    pivot: CliqueId,

    focused_variables: Vec<Variable>
}

impl LocalCliqueTreePropagation {

    /// Create an engine for `network` focused on `vars`, building its `CliqueTree`
    pub fn new(network: DiscreteBayesNet, vars: &[Variable]) -> Result<Self> {
        let tree = CliqueTree::new(&network)?;
        LocalCliqueTreePropagation::with_clique_tree(network, Rc::new(tree), vars)
    }

    /// Create an engine for `network`, focused on `vars`, over an existing `CliqueTree`
    pub fn with_clique_tree(network: DiscreteBayesNet, tree: Rc<CliqueTree>, vars: &[Variable]) -> Result<Self> {
        check_coverage(&network, &tree)?;

        let pivot = tree.pivot();
        let mut engine = LocalCliqueTreePropagation {
            network,
            tree,
            calibration: Calibration::new(),
            focus: Focus::All,
            pivot,
            focused_variables: Vec::new()
        };

        engine.set_focused_subtree(vars)?;
        Ok(engine)
    }

    /// Focus propagation on the family cliques of `vars`.
    ///
    /// The pivot becomes the focused clique of least cardinality, the first one in the order of
    /// `vars` on ties.
    ///
    /// # Errors
    /// * `CtpError::EmptyFocus` if `vars` is empty
    /// * `CtpError::UnknownVariable` if some `Variable` is not part of the network
    pub fn set_focused_subtree(&mut self, vars: &[Variable]) -> Result<()> {
        if vars.is_empty() {
            return Err(CtpError::EmptyFocus);
        }

        let mut cliques = IndexSet::new();
        for var in vars {
            self.network.check_contains(var)?;
            cliques.insert(self.tree.family_clique(var)?);
        }

        let mut pivot = None;
        for &id in cliques.iter() {
            let card = self.tree.node(id).cardinality();
            match pivot {
                Some((_, c)) if c <= card => (),
                _ => pivot = Some((id, card))
            }
        }

        // cliques holds at least one id
        if let Some((id, _)) = pivot {
            self.pivot = id;
        }

        tracing::debug!(cliques = cliques.len(), pivot = self.pivot, "focused subtree");

        self.focus = Focus::Subtree(cliques);
        self.focused_variables = vars.to_vec();
        self.calibration.invalidate();

        Ok(())
    }

    /// The variables whose family cliques form the focus
    pub fn focused_variables(&self) -> &[Variable] {
        &self.focused_variables
    }

    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    pub fn pivot(&self) -> CliqueId {
        self.pivot
    }

    pub fn clique_tree(&self) -> &Rc<CliqueTree> {
        &self.tree
    }

    /// Drop every cached message, so the next propagation recomputes the whole tree
    pub fn invalidate_messages(&mut self) {
        self.calibration.clear_messages();
    }

    pub fn likelihood(&self) -> Option<f64> {
        self.calibration.likelihood()
    }

    /// Number of messages currently cached
    pub fn cached_messages(&self) -> usize {
        self.calibration.messages().len()
    }
}

impl Propagation for LocalCliqueTreePropagation {

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

    /// Propagate the evidence, recomputing only the messages sent from focused cliques
    fn propagate(&mut self) -> Result<f64> {
        self.calibration.propagate(&self.network, &self.tree, &self.focus, self.pivot)
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
