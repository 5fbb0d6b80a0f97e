//! Defines the interface to the clique tree inference engines

use crate::factor::Factor;
use crate::model::DiscreteBayesNet;
use crate::util::Result;
use crate::variable::{Assignment, Variable};

use std::collections::HashSet;

mod beliefs;
mod evidence;
mod local;
mod messages;
mod propagation;

pub use self::evidence::Evidence;
pub use self::local::LocalCliqueTreePropagation;
pub use self::messages::{Focus, Message, MessageCache};
pub use self::propagation::CliqueTreePropagation;


/// A `Propagation` engine computes exact posteriors of a `DiscreteBayesNet` given evidence, by
/// passing messages over a `CliqueTree`.
///
/// Engines are stateful: evidence is set first, then `propagate` computes the messages, after which
/// the likelihood and beliefs may be queried. Changing the evidence or the network invalidates the
/// beliefs until the next call to `propagate`.
pub trait Propagation {

    /// The network inference is performed over
    fn network(&self) -> &DiscreteBayesNet;

    /// Mutable access to the network, e.g. to update CPDs between propagations. Invalidates the
    /// current beliefs.
    fn network_mut(&mut self) -> &mut DiscreteBayesNet;

    /// Replace the current evidence.
    ///
    /// The evidence is validated first; on error the engine is left untouched.
    ///
    /// # Errors
    /// * `CtpError::UnknownVariable` if an observed `Variable` is not in the network
    /// * `CtpError::InvalidState` if an observed state is not permitted for its `Variable`
    fn set_evidence(&mut self, evidence: &Evidence) -> Result<()>;

    fn clear_evidence(&mut self);

    /// The observations currently in effect
    fn evidence(&self) -> &Assignment;

    /// Absorb the evidence and pass messages.
    ///
    /// # Returns
    /// the likelihood of the evidence, ```P(e)```. With no evidence this is one; evidence of
    /// probability zero yields zero.
    fn propagate(&mut self) -> Result<f64>;

    /// ```ln P(e)``` for the last propagation, if it is current
    fn log_likelihood(&self) -> Option<f64>;

    /// The posterior over `var` and its parents, ```P(var, parents(var) | e)```
    ///
    /// # Errors
    /// * `CtpError::UnknownVariable` if `var` is not in the network
    /// * `CtpError::NotPropagated` if the current evidence has not been propagated
    fn compute_family_belief(&self, var: &Variable) -> Result<Factor>;

    /// The joint posterior ```P(vars | e)```. The unobserved members of `vars` must share a clique.
    ///
    /// # Errors
    /// * `CtpError::NoCoveringClique` if no clique contains every unobserved member of `vars`
    /// * as `compute_family_belief`
    fn compute_belief(&self, vars: &[Variable]) -> Result<Factor>;
}


/// A `ConditionalInferenceEngine` is capable of answering Conditional Probability Queries of the form:
///     ```P(Y | E = e)```
///
/// `ConditionalInferenceEngine`s are stateful and answer queries against whatever evidence they
/// currently hold.
pub trait ConditionalInferenceEngine {

    /// Infer the joint distribution ```P(variables | evidence)```
    fn infer(&mut self, variables: &HashSet<Variable>) -> Result<Factor>;

}

impl<P: Propagation> ConditionalInferenceEngine for P {

    /// Propagates the evidence if needed, then reads the belief off of the tree
    fn infer(&mut self, variables: &HashSet<Variable>) -> Result<Factor> {
        if self.log_likelihood().is_none() {
            self.propagate()?;
        }

        let vars: Vec<Variable> = variables.iter().cloned().collect();
        self.compute_belief(&vars)
    }
}
