//! State shared by the propagation engines: the current evidence, the tables attached to each
//! clique, the message cache, and the beliefs read off of them.

use super::evidence::{absorb, Evidence};
use super::messages::{likelihood, potential, Focus, MessageCache, MessagePassing};
use crate::clique_tree::{CliqueId, CliqueTree};
use crate::factor::Factor;
use crate::model::DiscreteBayesNet;
use crate::util::{CtpError, Result};
use crate::variable::{Assignment, Variable};


#[derive(Clone, Debug, Default)]
pub(crate) struct Calibration {
    evidence: Assignment,

    /// Evidence-absorbed CPDs, indexed by `CliqueId`
    attached: Vec<Vec<Factor>>,

    messages: MessageCache,

    /// ```(likelihood, log likelihood)``` of the evidence, present only after a successful
    /// propagation of the current evidence
    likelihood: Option<(f64, f64)>
}

impl Calibration {

    pub(crate) fn new() -> Self {
        Calibration::default()
    }

    pub(crate) fn evidence(&self) -> &Assignment {
        &self.evidence
    }

    pub(crate) fn messages(&self) -> &MessageCache {
        &self.messages
    }

    /// Validate `evidence` against `network` and, only if it is valid, replace the current
    /// evidence with it.
    pub(crate) fn set_evidence(&mut self, network: &DiscreteBayesNet, evidence: &Evidence) -> Result<()> {
        let observed = evidence.validate(network)?;

        self.evidence = observed;
        self.likelihood = None;
        Ok(())
    }

    pub(crate) fn clear_evidence(&mut self) {
        self.evidence = Assignment::new();
        self.likelihood = None;
    }

    /// Forget the last propagation. Cached messages are kept.
    pub(crate) fn invalidate(&mut self) {
        self.likelihood = None;
    }

    pub(crate) fn clear_messages(&mut self) {
        self.messages.clear();
        self.likelihood = None;
    }

    pub(crate) fn likelihood(&self) -> Option<f64> {
        self.likelihood.map(|(l, _)| l)
    }

    pub(crate) fn log_likelihood(&self) -> Option<f64> {
        self.likelihood.map(|(_, ll)| ll)
    }

    /// Absorb the evidence, recompute the messages leaving the focused cliques, and compute the
    /// likelihood of the evidence at `pivot`.
    pub(crate) fn propagate(
        &mut self,
        network: &DiscreteBayesNet,
        tree: &CliqueTree,
        focus: &Focus,
        pivot: CliqueId
    ) -> Result<f64> {
        self.likelihood = None;

        tracing::debug!(pivot, observed = self.evidence.len(), "propagating evidence");

        self.attached = absorb(network, tree, &self.evidence)?;
        self.messages.invalidate(focus);

        MessagePassing::new(tree, &self.attached, &self.evidence, focus, &mut self.messages).run(pivot)?;

        let (l, ll) = likelihood(tree, &self.attached, &self.messages, pivot)?;
        self.likelihood = Some((l, ll));

        tracing::debug!(likelihood = l, log_likelihood = ll, "propagation finished");
        Ok(l)
    }

    /// The posterior over the family of `var`: ```P(var, parents(var) | evidence)```.
    ///
    /// Observed members of the family appear in the result as an indicator on their observed
    /// state.
    pub(crate) fn family_belief(
        &self,
        network: &DiscreteBayesNet,
        tree: &CliqueTree,
        var: &Variable
    ) -> Result<Factor> {
        network.check_contains(var)?;

        let mut family = vec![*var];
        family.extend(network.parents(var)?.iter().cloned());

        let clique = tree.family_clique(var)?;
        self.belief_at(tree, clique, &family)
    }

    /// The joint posterior over `vars`, read from the smallest clique covering the unobserved
    /// members of `vars`.
    pub(crate) fn belief(
        &self,
        network: &DiscreteBayesNet,
        tree: &CliqueTree,
        vars: &[Variable]
    ) -> Result<Factor> {
        let mut scope: Vec<Variable> = Vec::with_capacity(vars.len());
        for var in vars {
            network.check_contains(var)?;
            if scope.contains(var) {
                return Err(CtpError::DuplicateVariable);
            }
            scope.push(*var);
        }

        if self.likelihood.is_none() {
            return Err(CtpError::NotPropagated);
        }

        let hidden: Vec<Variable> = scope.iter().filter(|v| ! self.evidence.contains(v)).cloned().collect();
        let clique = tree.smallest_covering_clique(&hidden).ok_or(CtpError::NoCoveringClique)?;

        self.belief_at(tree, clique, &scope)
    }

    fn belief_at(&self, tree: &CliqueTree, clique: CliqueId, scope: &[Variable]) -> Result<Factor> {
        if self.likelihood.is_none() {
            return Err(CtpError::NotPropagated);
        }

        let mut hidden = Vec::new();
        let mut observed = Vec::new();
        let mut states = Vec::new();

        for var in scope {
            match self.evidence.get(var) {
                Some(&s) => {
                    observed.push(*var);
                    states.push(s);
                },
                None => hidden.push(*var)
            }
        }

        let indicator = Factor::indicator(&observed, &states)?;
        if hidden.is_empty() {
            return Ok(indicator);
        }

        let (potential, _, _) = potential(tree, &self.attached, &self.messages, clique)?;

        let mut belief = if potential.dimension() != hidden.len() {
            potential.marginalize_to(&hidden)
        } else {
            potential
        };

        if belief.normalize() <= 0.0 {
            tracing::warn!(clique, "belief has no probability mass");
        }

        Ok(belief.product(&indicator))
    }
}
